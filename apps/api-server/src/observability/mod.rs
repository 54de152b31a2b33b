//! Request IDs.

mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, tag_request};
