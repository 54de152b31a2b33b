//! SeaORM entities, one per table.

pub mod author;
pub mod comment;
pub mod post;
pub mod user;
