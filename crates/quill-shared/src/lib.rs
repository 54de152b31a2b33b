//! # Quill Shared
//!
//! Wire types of the blog API: request bodies, response payloads and the
//! RFC 7807 error document. Kept free of domain logic so clients can depend
//! on it directly.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, PaginatedResponse};
