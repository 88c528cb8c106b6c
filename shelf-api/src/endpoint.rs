use std::fmt;

/// The three remote calls the comment section depends on
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    Write,
    Like,
    Delete,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Write => "/api/book/comment/write",
            Endpoint::Like => "/api/book/comment/like",
            Endpoint::Delete => "/api/book/comment/delete",
        }
    }

    pub fn method(&self) -> http::Method {
        match self {
            Endpoint::Write | Endpoint::Like => http::Method::POST,
            Endpoint::Delete => http::Method::PATCH,
        }
    }

    /// Status code of a successful answer
    pub fn success_status(&self) -> http::StatusCode {
        match self {
            Endpoint::Write | Endpoint::Like => http::StatusCode::CREATED,
            Endpoint::Delete => http::StatusCode::NO_CONTENT,
        }
    }

    /// Shown to the user when a failure carries no message of its own
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Endpoint::Write => "an error occurred while writing the comment",
            Endpoint::Like => "an error occurred while liking the comment",
            Endpoint::Delete => "an error occurred while deleting the comment",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Write => "write",
            Endpoint::Like => "like",
            Endpoint::Delete => "delete",
        })
    }
}
