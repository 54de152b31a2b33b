//! Error handling middleware - RFC 7807 compliant responses.

use std::collections::BTreeMap;
use std::fmt;

use actix_web::{
    HttpMessage, HttpRequest, HttpResponse, ResponseError, error, http::StatusCode, web,
};
use quill_core::error::{DomainError, RepoError};
use quill_core::validation::ValidationErrors;
use quill_shared::ErrorResponse;

use crate::observability::RequestId;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Field name to messages.
    Validation(BTreeMap<String, Vec<String>>),
    InactivePost(String),
    Unauthorized(String),
    Forbidden,
    Conflict(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation errors: {:?}", errors),
            AppError::InactivePost(msg) => write!(f, "Inactive post: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::InactivePost(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => bad_request(detail.clone()),
            AppError::Validation(errors) => ErrorResponse::validation_failed(errors.clone()),
            AppError::InactivePost(detail) => {
                ErrorResponse::new(400, "Inactive Post").with_detail(detail)
            }
            AppError::Unauthorized(detail) => {
                ErrorResponse::unauthorized("Unauthorized").with_detail(detail)
            }
            AppError::Forbidden => ErrorResponse::forbidden(),
            AppError::Conflict(detail) => ErrorResponse::new(409, "Conflict").with_detail(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors.into_fields())
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(errors) => errors.into(),
            DomainError::InactivePost(_) => AppError::InactivePost(err.to_string()),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::Repository(err) => err.into(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

fn bad_request(detail: String) -> ErrorResponse {
    ErrorResponse::new(400, "Bad Request").with_detail(detail)
}

/// Render an extractor failure as a problem document tagged with the request ID.
fn extractor_error(
    err: impl ResponseError + 'static,
    req: &HttpRequest,
    problem: ErrorResponse,
) -> actix_web::Error {
    let problem = match req.extensions().get::<RequestId>() {
        Some(id) => problem.with_request_id(id.as_str()),
        None => problem,
    };
    let status = StatusCode::from_u16(problem.status).unwrap_or(StatusCode::BAD_REQUEST);
    let response = HttpResponse::build(status).json(problem);

    error::InternalError::from_response(err, response).into()
}

/// Malformed JSON bodies are 400 with the parser message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        let problem = bad_request(err.to_string());
        extractor_error(err, req, problem)
    })
}

/// Malformed query strings are 400 with the parser message.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        let problem = bad_request(err.to_string());
        extractor_error(err, req, problem)
    })
}

/// Path segments that do not parse (such as a non-UUID id) name no resource.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        let problem = ErrorResponse::not_found(format!("No resource at {}", req.path()));
        extractor_error(err, req, problem)
    })
}
