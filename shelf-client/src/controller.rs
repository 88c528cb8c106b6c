use chrono::Utc;
use parking_lot::Mutex;

use crate::{
    api::{
        BookComment, BookId, CommentId, CommentService, Endpoint, PendingId, ServerId, Viewer,
        MAX_COMMENT_LEN,
    },
    extract::extract_id,
    store::Mutation,
    Comment, CommentStore, MutationError, Snapshot,
};

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum CreateOutcome {
    /// The comment is now at the head of the list
    Inserted(ServerId),

    /// The server stored the comment but its answer did not say under which
    /// id, so it was not listed. The page should be refreshed.
    Unresolved { response: serde_json::Value },
}

#[must_use]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

#[must_use]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    /// The comment was not listed anymore, nothing was sent
    AlreadyGone,
    /// The confirmation gate said no, nothing was sent
    Cancelled,
}

/// Applies comment writes, likes and deletes for one book page.
///
/// The store only changes once the server confirmed an operation, so a failed
/// request never needs a rollback. Calls on different comments may be in
/// flight at the same time; the store lock is never held across a request.
pub struct MutationController<S> {
    book: BookId,
    service: S,
    store: Mutex<CommentStore>,
}

impl<S: CommentService> MutationController<S> {
    pub fn new(book: BookId, service: S) -> MutationController<S> {
        MutationController::with_store(book, service, CommentStore::new())
    }

    pub fn with_store(book: BookId, service: S, store: CommentStore) -> MutationController<S> {
        MutationController {
            book,
            service,
            store: Mutex::new(store),
        }
    }

    pub fn book(&self) -> BookId {
        self.book
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.lock().snapshot()
    }

    /// Replaces the listed comments with those of a freshly fetched book page
    pub fn load(&self, comments: Vec<BookComment>, liked: impl IntoIterator<Item = ServerId>) {
        let num_comments = comments.len();
        self.store
            .lock()
            .load(comments.into_iter().map(Comment::from), liked);
        tracing::debug!(book = %self.book, num_comments, "loaded comments");
    }

    fn apply(&self, m: Mutation) -> bool {
        self.store.lock().apply(m)
    }

    pub async fn create(
        &self,
        viewer: Option<&Viewer>,
        text: &str,
    ) -> Result<CreateOutcome, MutationError> {
        let len = text.chars().count();
        if len > MAX_COMMENT_LEN {
            return Err(MutationError::TextTooLong {
                len,
                max: MAX_COMMENT_LEN,
            });
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(MutationError::EmptyText);
        }
        let viewer = viewer.ok_or(MutationError::NotAuthenticated)?;

        let draft_id = PendingId::allocate();
        let draft = Comment::draft(draft_id, viewer, String::from(text), Utc::now());
        let guard = DraftGuard::add(&self.store, draft_id, draft.clone());

        let response = match self.service.write_comment(self.book, text).await {
            Ok(r) => r,
            Err(err) => {
                drop(guard);
                tracing::info!(book = %self.book, ?err, "failed writing comment");
                return Err(MutationError::remote(Endpoint::Write, self.book, None, err));
            }
        };

        match extract_id(&response) {
            Some(id) => {
                self.apply(Mutation::Confirm {
                    draft: guard.disarm(),
                    comment: draft.confirmed(id.clone()),
                });
                tracing::info!(book = %self.book, comment = %id, "comment written");
                Ok(CreateOutcome::Inserted(id))
            }
            None => {
                drop(guard);
                tracing::warn!(
                    book = %self.book,
                    %response,
                    "comment written but the response carries no id, refresh needed"
                );
                Ok(CreateOutcome::Unresolved { response })
            }
        }
    }

    /// Likes the comment, or un-likes it if the viewer already liked it
    pub async fn toggle_like(
        &self,
        viewer: Option<&Viewer>,
        id: &CommentId,
    ) -> Result<LikeOutcome, MutationError> {
        viewer.ok_or(MutationError::NotAuthenticated)?;
        let id = confirmed(id)?;
        let was_liked = {
            let snapshot = self.snapshot();
            if snapshot.get(id).is_none() {
                return Err(MutationError::UnknownComment(id.clone()));
            }
            snapshot.is_liked(id)
        };

        match self.service.like_comment(id).await {
            Ok(true) => (),
            Ok(false) => {
                tracing::info!(comment = %id, "like request was not confirmed");
                return Err(MutationError::LikeUnconfirmed(id.clone()));
            }
            Err(err) => {
                tracing::info!(comment = %id, ?err, "failed liking comment");
                return Err(MutationError::remote(Endpoint::Like, self.book, Some(id), err));
            }
        }

        let liked = !was_liked;
        if !self.apply(Mutation::SetLiked {
            id: id.clone(),
            liked,
        }) {
            tracing::warn!(comment = %id, liked, "like confirmed but the store did not change");
        }
        tracing::info!(comment = %id, liked, "like toggled");
        Ok(match liked {
            true => LikeOutcome::Liked,
            false => LikeOutcome::Unliked,
        })
    }

    /// `confirm` is asked right before the request is sent, and only once all
    /// local checks passed
    pub async fn delete<F>(
        &self,
        viewer: Option<&Viewer>,
        id: &CommentId,
        confirm: F,
    ) -> Result<DeleteOutcome, MutationError>
    where
        F: FnOnce(&Comment) -> bool,
    {
        let viewer = viewer.ok_or(MutationError::NotAuthenticated)?;
        let id = confirmed(id)?;
        let Some(comment) = self.snapshot().get(id).cloned() else {
            tracing::debug!(comment = %id, "deleting a comment that is not listed");
            return Ok(DeleteOutcome::AlreadyGone);
        };
        if !comment.is_authored_by(&viewer.id) {
            return Err(MutationError::NotAuthor(id.clone()));
        }
        if !confirm(&comment) {
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(err) = self.service.delete_comment(id).await {
            tracing::info!(comment = %id, ?err, "failed deleting comment");
            return Err(MutationError::remote(Endpoint::Delete, self.book, Some(id), err));
        }

        if !self.apply(Mutation::Remove(id.clone())) {
            tracing::debug!(comment = %id, "comment was already gone");
        }
        tracing::info!(comment = %id, "comment deleted");
        Ok(DeleteOutcome::Deleted)
    }
}

/// Keeps a draft listed for as long as it lives. Unless disarmed, dropping it
/// drops the draft, also when the create future itself is dropped mid-flight.
struct DraftGuard<'a> {
    store: &'a Mutex<CommentStore>,
    id: PendingId,
    armed: bool,
}

impl<'a> DraftGuard<'a> {
    fn add(store: &'a Mutex<CommentStore>, id: PendingId, draft: Comment) -> DraftGuard<'a> {
        store.lock().apply(Mutation::AddDraft(draft));
        DraftGuard {
            store,
            id,
            armed: true,
        }
    }

    /// Hands the draft over to whoever resolves it next
    fn disarm(mut self) -> PendingId {
        self.armed = false;
        self.id
    }
}

impl Drop for DraftGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.lock().apply(Mutation::DropDraft(self.id));
        }
    }
}

fn confirmed(id: &CommentId) -> Result<&ServerId, MutationError> {
    match id {
        CommentId::Confirmed(id) => Ok(id),
        CommentId::Pending(p) => Err(MutationError::NotSynchronized(*p)),
    }
}
