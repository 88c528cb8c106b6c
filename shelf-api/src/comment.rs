use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::{BookId, ServerId, Time, UserId};

pub const ENVELOPE_CREATED: &str = "CREATED";
pub const ENVELOPE_NO_CONTENT: &str = "NO_CONTENT";

/// Body of a write request
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub chat: String,
}

/// Wrapper around every answer of the book API
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn has_status(&self, status: &str) -> bool {
        self.status == status
    }
}

/// A comment as listed in a book's detail page
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookComment {
    pub id: ServerId,
    pub user: String,
    pub text: String,
    #[serde(deserialize_with = "lenient_time")]
    pub date: Time,
    #[serde(default)]
    pub profile_img: Option<String>,
    #[serde(default)]
    pub likes: u64,
    pub user_id: UserId,
}

/// RFC 3339, or a date without offset which is then taken as UTC
fn lenient_time<'de, D: Deserializer<'de>>(d: D) -> Result<Time, D::Error> {
    let s = String::deserialize(d)?;
    if let Ok(t) = DateTime::parse_from_rfc3339(&s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|t| Utc.from_utc_datetime(&t))
        .map_err(|e| serde::de::Error::custom(format!("invalid date {s:?}: {e}")))
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BookDetail {
    #[serde(rename = "bookId")]
    pub book_id: BookId,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub review_response_dtos: Vec<BookComment>,
}
