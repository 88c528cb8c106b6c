mod comment;
pub use comment::Comment;

mod controller;
pub use controller::{CreateOutcome, DeleteOutcome, LikeOutcome, MutationController};

mod error;
pub use error::MutationError;

pub mod extract;

mod store;
pub use store::{CommentStore, Snapshot};

pub mod time;

mod fuzz;

pub mod api {
    pub use shelf_api::*;
}
