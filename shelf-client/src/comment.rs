use crate::api::{BookComment, CommentId, PendingId, ServerId, Time, UserId, Viewer};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,

    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: Option<String>,

    pub text: String,

    /// Assigned locally when the comment is written from this page
    pub created_at: Time,

    pub like_count: u64,
}

impl Comment {
    pub(crate) fn draft(id: PendingId, author: &Viewer, text: String, now: Time) -> Comment {
        Comment {
            id: CommentId::Pending(id),
            author_id: author.id.clone(),
            author_name: String::from(author.display_name()),
            author_avatar: author.avatar_url.clone(),
            text,
            created_at: now,
            like_count: 0,
        }
    }

    /// Same comment, now carrying the identifier the server assigned
    pub(crate) fn confirmed(self, id: ServerId) -> Comment {
        Comment {
            id: CommentId::Confirmed(id),
            ..self
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.id.is_placeholder()
    }

    pub fn server_id(&self) -> Option<&ServerId> {
        self.id.confirmed()
    }

    pub fn is_authored_by(&self, user: &UserId) -> bool {
        self.author_id == *user
    }
}

impl From<BookComment> for Comment {
    fn from(c: BookComment) -> Comment {
        Comment {
            id: CommentId::Confirmed(c.id),
            author_id: c.user_id,
            author_name: c.user,
            author_avatar: c.profile_img,
            text: c.text,
            created_at: c.date,
            like_count: c.likes,
        }
    }
}
