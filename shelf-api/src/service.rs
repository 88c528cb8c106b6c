use async_trait::async_trait;

use crate::{BookId, Error, ServerId};

/// The remote comment service. Implementations own transport concerns such as
/// authentication, timeouts and retries.
#[async_trait]
pub trait CommentService {
    /// Returns the raw success body, which may or may not carry the new id
    async fn write_comment(&self, book: BookId, text: &str) -> Result<serde_json::Value, Error>;

    /// `Ok(true)` is the only answer that counts as a confirmed like
    async fn like_comment(&self, comment: &ServerId) -> Result<bool, Error>;

    async fn delete_comment(&self, comment: &ServerId) -> Result<(), Error>;
}

#[async_trait]
impl<T: CommentService + Send + Sync + ?Sized> CommentService for &T {
    async fn write_comment(&self, book: BookId, text: &str) -> Result<serde_json::Value, Error> {
        (**self).write_comment(book, text).await
    }

    async fn like_comment(&self, comment: &ServerId) -> Result<bool, Error> {
        (**self).like_comment(comment).await
    }

    async fn delete_comment(&self, comment: &ServerId) -> Result<(), Error> {
        (**self).delete_comment(comment).await
    }
}
