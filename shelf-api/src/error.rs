use http::StatusCode;

use crate::Endpoint;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Book not found")]
    BookNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Member info does not match")]
    InvalidMember,

    #[error("Unknown error: {}", .0.as_deref().unwrap_or("no details"))]
    Unknown(Option<String>),
}

impl Error {
    /// Classifies a non-successful answer from `endpoint`
    pub fn from_response(endpoint: Endpoint, status: StatusCode, body: &[u8]) -> Error {
        match (endpoint, status) {
            (Endpoint::Write, StatusCode::NOT_FOUND) => Error::BookNotFound,
            (Endpoint::Like | Endpoint::Delete, StatusCode::BAD_REQUEST) => Error::InvalidMember,
            (Endpoint::Like | Endpoint::Delete, StatusCode::NOT_FOUND) => Error::CommentNotFound,
            _ => Error::Unknown(Error::message_of(body)),
        }
    }

    /// Extracts the human-readable `message` field of a response body, if any
    pub fn message_of(body: &[u8]) -> Option<String> {
        let data: serde_json::Value = serde_json::from_slice(body).ok()?;
        data.get("message")
            .and_then(|m| m.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguished_failures() {
        assert_eq!(
            Error::from_response(Endpoint::Write, StatusCode::NOT_FOUND, b""),
            Error::BookNotFound
        );
        for e in [Endpoint::Like, Endpoint::Delete] {
            assert_eq!(
                Error::from_response(e, StatusCode::BAD_REQUEST, b"{}"),
                Error::InvalidMember
            );
            assert_eq!(
                Error::from_response(e, StatusCode::NOT_FOUND, b"{}"),
                Error::CommentNotFound
            );
        }
    }

    #[test]
    fn generic_failures_keep_message() {
        assert_eq!(
            Error::from_response(
                Endpoint::Write,
                StatusCode::BAD_REQUEST,
                br#"{"status":"BAD_REQUEST","message":"chat is too long"}"#
            ),
            Error::Unknown(Some(String::from("chat is too long")))
        );
        assert_eq!(
            Error::from_response(Endpoint::Like, StatusCode::INTERNAL_SERVER_ERROR, b"oops"),
            Error::Unknown(None)
        );
        assert_eq!(
            Error::from_response(
                Endpoint::Delete,
                StatusCode::FORBIDDEN,
                br#"{"message":"   "}"#
            ),
            Error::Unknown(None)
        );
    }
}
