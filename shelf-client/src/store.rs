use std::cmp::Reverse;

use crate::{
    api::{CommentId, PendingId, ServerId, Viewer},
    Comment,
};

/// Immutable view of a page's comments, cheap to clone
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    /// Confirmed comments, most recent first
    comments: im::Vector<Comment>,

    /// Comments whose write request is still in flight, most recent first
    drafts: im::Vector<Comment>,

    /// Comments the viewer liked during this session
    liked: im::HashSet<ServerId>,
}

impl Snapshot {
    pub fn comments(&self) -> &im::Vector<Comment> {
        &self.comments
    }

    pub fn drafts(&self) -> &im::Vector<Comment> {
        &self.drafts
    }

    pub fn liked(&self) -> &im::HashSet<ServerId> {
        &self.liked
    }

    /// Drafts first, then confirmed comments
    pub fn rendered(&self) -> impl Iterator<Item = &Comment> {
        self.drafts.iter().chain(self.comments.iter())
    }

    pub fn get(&self, id: &ServerId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.server_id() == Some(id))
    }

    pub fn is_liked(&self, id: &ServerId) -> bool {
        self.liked.contains(id)
    }

    pub fn can_delete(&self, viewer: &Viewer, comment: &Comment) -> bool {
        !comment.is_temporary() && comment.is_authored_by(&viewer.id)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    fn position(&self, id: &ServerId) -> Option<usize> {
        self.comments.iter().position(|c| c.server_id() == Some(id))
    }
}

/// Everything that can happen to a store. Only the mutation controller builds
/// these, once the corresponding request has been answered.
#[derive(Clone, Debug)]
pub(crate) enum Mutation {
    AddDraft(Comment),
    DropDraft(PendingId),

    /// Drops the draft and puts `comment` at the head of the list
    Confirm { draft: PendingId, comment: Comment },

    SetLiked { id: ServerId, liked: bool },

    /// Removes the comment and forgets the viewer liked it
    Remove(ServerId),
}

#[derive(Clone, Debug, Default)]
pub struct CommentStore {
    snapshot: Snapshot,
}

impl CommentStore {
    pub fn new() -> CommentStore {
        CommentStore::default()
    }

    /// Replaces the whole content of the store, eg. with the review list of a
    /// freshly fetched book page. Duplicate ids keep their first occurrence,
    /// and likes on comments that are not in `comments` are dropped.
    pub fn load(
        &mut self,
        comments: impl IntoIterator<Item = Comment>,
        liked: impl IntoIterator<Item = ServerId>,
    ) {
        let mut list = Vec::new();
        for c in comments {
            let Some(id) = c.server_id() else {
                tracing::warn!(id = %c.id, "ignoring unconfirmed comment in loaded list");
                continue;
            };
            if list.iter().any(|o: &Comment| o.server_id() == Some(id)) {
                tracing::warn!(%id, "ignoring duplicate comment in loaded list");
                continue;
            }
            list.push(c);
        }
        list.sort_by_key(|c| Reverse(c.created_at));
        let comments: im::Vector<Comment> = list.into_iter().collect();
        let liked = liked
            .into_iter()
            .filter(|id| comments.iter().any(|c| c.server_id() == Some(id)))
            .collect();
        self.snapshot = Snapshot {
            comments,
            drafts: im::Vector::new(),
            liked,
        };
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    /// Returns whether the store changed. Mutations that target comments that
    /// are no longer there are ignored.
    pub(crate) fn apply(&mut self, m: Mutation) -> bool {
        let s = &mut self.snapshot;
        match m {
            Mutation::AddDraft(c) => {
                s.drafts.push_front(c);
                true
            }
            Mutation::DropDraft(draft) => drop_draft(&mut s.drafts, draft),
            Mutation::Confirm { draft, comment } => {
                drop_draft(&mut s.drafts, draft);
                let Some(id) = comment.server_id().cloned() else {
                    tracing::warn!(id = %comment.id, "refusing to confirm comment without server id");
                    return false;
                };
                if let Some(pos) = s.position(&id) {
                    tracing::warn!(%id, "server reused the id of a listed comment, replacing it");
                    s.comments.remove(pos);
                    s.liked.remove(&id);
                }
                s.comments.push_front(comment);
                true
            }
            Mutation::SetLiked { id, liked } => {
                let Some(pos) = s.position(&id) else {
                    tracing::warn!(%id, "ignoring like on a comment that is not listed");
                    return false;
                };
                if s.liked.contains(&id) == liked {
                    return false;
                }
                let Some(c) = s.comments.get_mut(pos) else {
                    return false;
                };
                if liked {
                    c.like_count = c.like_count.saturating_add(1);
                    s.liked.insert(id);
                } else {
                    c.like_count = c.like_count.saturating_sub(1);
                    s.liked.remove(&id);
                }
                true
            }
            Mutation::Remove(id) => {
                let was_liked = s.liked.remove(&id).is_some();
                match s.position(&id) {
                    Some(pos) => {
                        s.comments.remove(pos);
                        true
                    }
                    None => was_liked,
                }
            }
        }
    }
}

fn drop_draft(drafts: &mut im::Vector<Comment>, draft: PendingId) -> bool {
    let target = CommentId::Pending(draft);
    match drafts.iter().position(|c| c.id == target) {
        Some(pos) => {
            drafts.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::api::{Time, UserId};

    fn at(minutes: i64) -> Time {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn comment(id: i64, author: &str, created: i64, likes: u64) -> Comment {
        Comment {
            id: CommentId::Confirmed(ServerId::Num(id)),
            author_id: UserId(String::from(author)),
            author_name: String::from(author),
            author_avatar: None,
            text: format!("comment {id}"),
            created_at: at(created),
            like_count: likes,
        }
    }

    fn ids(s: &Snapshot) -> Vec<ServerId> {
        s.comments().iter().filter_map(|c| c.server_id().cloned()).collect()
    }

    fn loaded() -> CommentStore {
        let mut store = CommentStore::new();
        store.load(
            vec![comment(1, "ann", 0, 3), comment(2, "bob", 10, 0), comment(3, "ann", 5, 1)],
            vec![ServerId::Num(1), ServerId::Num(99)],
        );
        store
    }

    #[test]
    fn load_orders_newest_first_and_prunes_likes() {
        let s = loaded().snapshot();
        assert_eq!(ids(&s), vec![ServerId::Num(2), ServerId::Num(3), ServerId::Num(1)]);
        assert!(s.is_liked(&ServerId::Num(1)));
        assert!(!s.is_liked(&ServerId::Num(99)));
        assert_eq!(s.liked().len(), 1);
    }

    #[test]
    fn load_drops_duplicates_and_placeholders() {
        let mut store = CommentStore::new();
        let mut draft = comment(5, "ann", 0, 0);
        draft.id = CommentId::Pending(PendingId::allocate());
        store.load(
            vec![comment(1, "ann", 0, 0), comment(1, "bob", 3, 0), draft],
            Vec::new(),
        );
        let s = store.snapshot();
        assert_eq!(s.len(), 1);
        assert_eq!(s.comments()[0].author_name, "ann");
    }

    #[test]
    fn confirm_inserts_at_head() {
        let mut store = loaded();
        let draft = PendingId::allocate();
        let mut c = comment(0, "ann", 20, 0);
        c.id = CommentId::Pending(draft);
        assert!(store.apply(Mutation::AddDraft(c.clone())));
        assert_eq!(store.snapshot().drafts().len(), 1);
        assert_eq!(store.snapshot().len(), 3);

        assert!(store.apply(Mutation::Confirm {
            draft,
            comment: c.confirmed(ServerId::Num(42)),
        }));
        let s = store.snapshot();
        assert!(s.drafts().is_empty());
        assert_eq!(ids(&s)[0], ServerId::Num(42));
        assert_eq!(s.comments()[0].like_count, 0);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn confirm_never_duplicates_ids() {
        let mut store = loaded();
        let draft = PendingId::allocate();
        let mut c = comment(0, "ann", 20, 0);
        c.id = CommentId::Pending(draft);
        store.apply(Mutation::AddDraft(c.clone()));
        store.apply(Mutation::Confirm {
            draft,
            comment: c.confirmed(ServerId::Num(1)),
        });
        let s = store.snapshot();
        assert_eq!(ids(&s), vec![ServerId::Num(1), ServerId::Num(2), ServerId::Num(3)]);
        assert!(!s.is_liked(&ServerId::Num(1)));
    }

    #[test]
    fn drop_draft_leaves_comments_alone() {
        let mut store = loaded();
        let before = store.snapshot();
        let draft = PendingId::allocate();
        let mut c = comment(0, "ann", 20, 0);
        c.id = CommentId::Pending(draft);
        store.apply(Mutation::AddDraft(c));
        assert!(store.apply(Mutation::DropDraft(draft)));
        assert_eq!(store.snapshot(), before);
        assert!(!store.apply(Mutation::DropDraft(draft)));
    }

    #[test]
    fn like_and_unlike_in_place() {
        let mut store = loaded();
        assert!(store.apply(Mutation::SetLiked {
            id: ServerId::Num(3),
            liked: true,
        }));
        let s = store.snapshot();
        assert_eq!(s.get(&ServerId::Num(3)).unwrap().like_count, 2);
        assert!(s.is_liked(&ServerId::Num(3)));
        assert_eq!(ids(&s), vec![ServerId::Num(2), ServerId::Num(3), ServerId::Num(1)]);

        // already liked: nothing moves
        assert!(!store.apply(Mutation::SetLiked {
            id: ServerId::Num(3),
            liked: true,
        }));
        assert_eq!(store.snapshot().get(&ServerId::Num(3)).unwrap().like_count, 2);

        assert!(store.apply(Mutation::SetLiked {
            id: ServerId::Num(3),
            liked: false,
        }));
        let s = store.snapshot();
        assert_eq!(s.get(&ServerId::Num(3)).unwrap().like_count, 1);
        assert!(!s.is_liked(&ServerId::Num(3)));
    }

    #[test]
    fn unlike_clamps_at_zero() {
        let mut store = CommentStore::new();
        store.load(vec![comment(1, "ann", 0, 0)], vec![ServerId::Num(1)]);
        assert!(store.apply(Mutation::SetLiked {
            id: ServerId::Num(1),
            liked: false,
        }));
        let s = store.snapshot();
        assert_eq!(s.get(&ServerId::Num(1)).unwrap().like_count, 0);
        assert!(!s.is_liked(&ServerId::Num(1)));
    }

    #[test]
    fn like_on_missing_comment_is_ignored() {
        let mut store = loaded();
        let before = store.snapshot();
        assert!(!store.apply(Mutation::SetLiked {
            id: ServerId::Num(7),
            liked: true,
        }));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn remove_prunes_likes_and_is_idempotent() {
        let mut store = loaded();
        assert!(store.apply(Mutation::Remove(ServerId::Num(1))));
        let once = store.snapshot();
        assert_eq!(ids(&once), vec![ServerId::Num(2), ServerId::Num(3)]);
        assert!(once.liked().is_empty());

        assert!(!store.apply(Mutation::Remove(ServerId::Num(1))));
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn snapshots_are_isolated() {
        let mut store = loaded();
        let before = store.snapshot();
        store.apply(Mutation::Remove(ServerId::Num(2)));
        assert_eq!(before.len(), 3);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn delete_rights() {
        let s = loaded().snapshot();
        let ann = Viewer::new(UserId(String::from("ann")));
        let c1 = s.get(&ServerId::Num(1)).unwrap();
        let c2 = s.get(&ServerId::Num(2)).unwrap();
        assert!(s.can_delete(&ann, c1));
        assert!(!s.can_delete(&ann, c2));
    }
}
