use chrono::Utc;
use std::fmt;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

mod comment;
pub use comment::{BookComment, BookDetail, Envelope, NewComment, ENVELOPE_CREATED, ENVELOPE_NO_CONTENT};

mod endpoint;
pub use endpoint::Endpoint;

mod error;
pub use error::Error;

mod service;
pub use service::CommentService;

mod user;
pub use user::{UserId, Viewer};

/// Maximum length of a comment, counted in characters of the raw input
pub const MAX_COMMENT_LEN: usize = 200;

/// Every placeholder identifier starts with this
pub const PENDING_PREFIX: &str = "temp-";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct BookId(pub i64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the remote service assigned to a comment
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize)]
#[serde(try_from = "RawServerId")]
pub enum ServerId {
    Num(i64),
    Str(String),
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawServerId {
    Num(i64),
    Str(String),
}

impl TryFrom<RawServerId> for ServerId {
    type Error = String;

    fn try_from(raw: RawServerId) -> Result<ServerId, String> {
        match raw {
            RawServerId::Num(n) => Ok(ServerId::Num(n)),
            RawServerId::Str(s) => {
                ServerId::from_text(&s).ok_or_else(|| String::from("empty comment identifier"))
            }
        }
    }
}

impl serde::Serialize for ServerId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            ServerId::Num(n) => s.serialize_i64(*n),
            ServerId::Str(v) => s.serialize_str(v),
        }
    }
}

impl ServerId {
    /// Returns None for blank strings. Numeric strings become `Num` only when
    /// they render back to the exact same text, so `"05"` stays a string.
    pub fn from_text(s: &str) -> Option<ServerId> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Some(ServerId::Num(n)),
            _ => Some(ServerId::Str(String::from(s))),
        }
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerId::Num(n) => write!(f, "{n}"),
            ServerId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ServerId {
    fn from(n: i64) -> ServerId {
        ServerId::Num(n)
    }
}

/// Local stand-in identity for a comment the server has not confirmed yet
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PendingId(pub Uuid);

impl PendingId {
    pub fn allocate() -> PendingId {
        PendingId(Uuid::new_v4())
    }

    /// Only recognizes strings produced by formatting a `PendingId`
    pub fn parse(s: &str) -> Option<PendingId> {
        s.strip_prefix(PENDING_PREFIX)
            .and_then(|u| Uuid::try_parse(u).ok())
            .map(PendingId)
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PENDING_PREFIX}{}", self.0.hyphenated())
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CommentId {
    Confirmed(ServerId),
    Pending(PendingId),
}

impl CommentId {
    pub fn parse(s: &str) -> Option<CommentId> {
        match PendingId::parse(s) {
            Some(p) => Some(CommentId::Pending(p)),
            None => ServerId::from_text(s).map(CommentId::Confirmed),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, CommentId::Pending(_))
    }

    pub fn confirmed(&self) -> Option<&ServerId> {
        match self {
            CommentId::Confirmed(id) => Some(id),
            CommentId::Pending(_) => None,
        }
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentId::Confirmed(id) => id.fmt(f),
            CommentId::Pending(id) => id.fmt(f),
        }
    }
}

impl From<ServerId> for CommentId {
    fn from(id: ServerId) -> CommentId {
        CommentId::Confirmed(id)
    }
}

impl From<PendingId> for CommentId {
    fn from(id: PendingId) -> CommentId {
        CommentId::Pending(id)
    }
}
