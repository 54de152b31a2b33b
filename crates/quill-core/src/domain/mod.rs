//! Domain entities - the core business objects.

mod author;
mod comment;
mod post;
mod user;

pub use author::Author;
pub(crate) use comment::invalid_post;
pub use comment::{Comment, CommentInput, CommentView, NewComment};
pub use post::{NewPost, Post, PostChanges, PostDetail, PostInput, PostListing, PostPatch, PostStatus};
pub use user::{Registration, User};
