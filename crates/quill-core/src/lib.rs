//! # Quill Core
//!
//! The domain layer of the Quill blog back-end.
//! Entities, validation rules, the post listing contract and the use cases
//! live here, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod filter;
pub mod ports;
pub mod service;
pub mod validation;

pub use error::{DomainError, RepoError};
pub use service::{BlogService, Caller};
