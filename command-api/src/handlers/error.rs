//! API error types for the command endpoints
//!
//! Every failure a command handler can produce is an [`ApiError`]; its
//! [`ApiErrorKind`] decides the status code and the shape of the body.
//!
//! # Example
//!
//! ```rust
//! use command_api::handlers::{ApiError, ApiErrorKind, ApiOperation};
//!
//! let error = ApiError::not_found(ApiOperation::Get, 42);
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.entity_id, Some("42".to_string()));
//! ```

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use crate::responses::ValidationError;

/// Endpoint being served when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// `GET /commands`
    List,
    /// `GET /commands/{id}`
    Get,
    /// `POST /commands`
    Create,
    /// `PUT /commands/{id}`
    Update,
    /// `PATCH /commands/{id}`
    Patch,
    /// `DELETE /commands/{id}`
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Patch => write!(f, "patch"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// No command has the requested id
    NotFound,
    /// The resulting shape breaks a field constraint, or a patch could not be applied
    ValidationFailed,
    /// Malformed body, wrong content type or non-numeric id
    BadRequest,
    /// The store failed
    InternalError,
    /// The store is unreachable
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> String {
        self.to_string().to_uppercase()
    }
}

/// Structured API error with operation context
///
/// Not-found errors render with an empty body, validation failures with the
/// grouped field errors, everything else with a small JSON error object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The endpoint being served when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The id of the command involved, when known
    pub entity_id: Option<String>,
    /// Field errors for [`ApiErrorKind::ValidationFailed`]
    pub validation: Option<ValidationError>,
}

impl ApiError {
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_id: None,
            validation: None,
        }
    }

    /// No command with `id`
    pub fn not_found(operation: ApiOperation, id: impl ToString) -> Self {
        Self::new(operation, ApiErrorKind::NotFound, "Command not found").with_entity_id(id)
    }

    /// Field-level validation failure
    pub fn validation_failed(operation: ApiOperation, errors: ValidationError) -> Self {
        Self {
            operation,
            kind: ApiErrorKind::ValidationFailed,
            message: errors.message().to_string(),
            entity_id: None,
            validation: Some(errors),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::BadRequest, message)
    }

    #[must_use]
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Transient errors that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::ServiceUnavailable)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity_id) = self.entity_id {
            write!(f, " [Command: {}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors other than 404 and 422
#[derive(Debug, Serialize, Deserialize)]
struct ApiErrorResponse {
    error: String,
    code: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        match self.kind {
            ApiErrorKind::NotFound => {
                tracing::debug!(
                    operation = %self.operation,
                    command_id = ?self.entity_id,
                    "Command not found"
                );
                return status.into_response();
            }
            ApiErrorKind::ValidationFailed => {
                let errors = self
                    .validation
                    .unwrap_or_else(|| ValidationError::new(self.message));
                tracing::warn!(
                    operation = %self.operation,
                    command_id = ?self.entity_id,
                    violations = errors.error_count(),
                    "Validation failed"
                );
                return errors.into_response();
            }
            ApiErrorKind::BadRequest => {
                tracing::warn!(operation = %self.operation, "Bad request: {}", self.message);
            }
            ApiErrorKind::InternalError | ApiErrorKind::ServiceUnavailable => {
                tracing::error!(
                    operation = %self.operation,
                    kind = %self.kind,
                    command_id = ?self.entity_id,
                    retriable = self.is_retriable(),
                    "API error: {}", self.message
                );
            }
        }

        let response = ApiErrorResponse {
            error: self.message,
            code: self.kind.error_code(),
            status: status.as_u16(),
            operation: Some(self.operation.to_string()),
        };

        (status, Json(response)).into_response()
    }
}

fn repository_operation_to_api_operation(op: RepositoryOperation) -> ApiOperation {
    match op {
        RepositoryOperation::ListAll => ApiOperation::List,
        RepositoryOperation::Insert => ApiOperation::Create,
        RepositoryOperation::Update => ApiOperation::Update,
        RepositoryOperation::Remove => ApiOperation::Delete,
        RepositoryOperation::GetById
        | RepositoryOperation::Begin
        | RepositoryOperation::Commit
        | RepositoryOperation::Ping
        | RepositoryOperation::Connect => ApiOperation::Get,
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        // The client only sees a generic message, so keep the detail in the log.
        tracing::error!(
            operation = %err.operation,
            kind = %err.kind,
            command_id = ?err.entity_id,
            retriable = err.is_retriable(),
            "Repository error: {}", err.message
        );

        let kind = match err.kind {
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout => {
                ApiErrorKind::ServiceUnavailable
            }
            RepositoryErrorKind::ConstraintViolation
            | RepositoryErrorKind::DatabaseError
            | RepositoryErrorKind::SerializationError
            | RepositoryErrorKind::Other => ApiErrorKind::InternalError,
        };

        let message = match kind {
            ApiErrorKind::ServiceUnavailable => "Service temporarily unavailable",
            _ => "An internal error occurred",
        };

        Self {
            operation: repository_operation_to_api_operation(err.operation),
            kind,
            message: message.to_string(),
            entity_id: err.entity_id,
            validation: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
