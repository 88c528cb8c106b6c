use crate::api::{self, BookId, Endpoint, PendingId, ServerId};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("Comment is empty")]
    EmptyText,

    #[error("Comment is {len} characters long, the limit is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("You need to be logged in")]
    NotAuthenticated,

    #[error("Comment {0} was just written and is not synchronized with the server yet")]
    NotSynchronized(PendingId),

    #[error("Only the author of comment {0} can delete it")]
    NotAuthor(ServerId),

    #[error("Comment {0} is not listed on this page")]
    UnknownComment(ServerId),

    #[error("Book {0} could not be found")]
    BookNotFound(BookId),

    #[error("Comment {0} does not exist")]
    CommentNotFound(ServerId),

    #[error("Member info does not match")]
    InvalidMember,

    #[error("The like on comment {0} could not be confirmed")]
    LikeUnconfirmed(ServerId),

    #[error("{message}")]
    Failed { endpoint: Endpoint, message: String },
}

impl MutationError {
    /// Maps a failure of the comment service. `target` is the comment the
    /// request was about, if any.
    pub(crate) fn remote(
        endpoint: Endpoint,
        book: BookId,
        target: Option<&ServerId>,
        err: api::Error,
    ) -> MutationError {
        match (err, target) {
            (api::Error::BookNotFound, _) => MutationError::BookNotFound(book),
            (api::Error::CommentNotFound, Some(id)) => MutationError::CommentNotFound(id.clone()),
            (api::Error::InvalidMember, _) => MutationError::InvalidMember,
            (api::Error::Unknown(Some(message)), _) => MutationError::Failed { endpoint, message },
            (api::Error::CommentNotFound, None) | (api::Error::Unknown(None), _) => {
                MutationError::Failed {
                    endpoint,
                    message: String::from(endpoint.fallback_message()),
                }
            }
        }
    }

    /// Whether the failure was detected without talking to the server
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            MutationError::EmptyText
                | MutationError::TextTooLong { .. }
                | MutationError::NotAuthenticated
                | MutationError::NotSynchronized(_)
                | MutationError::NotAuthor(_)
                | MutationError::UnknownComment(_)
        )
    }
}
