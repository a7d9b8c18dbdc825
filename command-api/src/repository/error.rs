//! Repository error types
//!
//! # Example
//!
//! ```rust
//! use command_api::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::commit_failed("serialization failure");
//! assert_eq!(error.operation, RepositoryOperation::Commit);
//! assert!(matches!(error.kind, RepositoryErrorKind::DatabaseError));
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Opening a session
    Begin,
    /// Loading every command
    ListAll,
    /// Loading one command by id
    GetById,
    /// Staging a new command
    Insert,
    /// Staging changes to an existing command
    Update,
    /// Staging a removal
    Remove,
    /// Making staged changes durable
    Commit,
    /// Checking the store is reachable
    Ping,
    /// Connecting to the backing store
    Connect,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "begin"),
            Self::ListAll => write!(f, "list_all"),
            Self::GetById => write!(f, "get_by_id"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Remove => write!(f, "remove"),
            Self::Commit => write!(f, "commit"),
            Self::Ping => write!(f, "ping"),
            Self::Connect => write!(f, "connect"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Database constraint violation
    ConstraintViolation,
    /// Failed to connect to the store
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// Row could not be decoded into a command
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The id of the command involved, when known
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_id: None,
        }
    }

    /// The store refused to make staged changes durable
    pub fn commit_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Commit,
            RepositoryErrorKind::DatabaseError,
            message,
        )
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Connect,
            RepositoryErrorKind::ConnectionFailed,
            message,
        )
    }

    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Attach the id of the command involved
    #[must_use]
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Transient errors that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity_id) = self.entity_id {
            write!(f, " [Command: {}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "database")]
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::PoolTimedOut => Self::timeout(
                RepositoryOperation::Connect,
                "Connection pool timed out",
            ),
            E::PoolClosed => Self::connection_failed("Connection pool is closed"),
            E::WorkerCrashed => Self::connection_failed("Database worker crashed"),
            E::Io(e) => Self::connection_failed(e.to_string()),
            E::Tls(e) => Self::connection_failed(format!("TLS error: {}", e)),
            E::ColumnDecode { index, source } => Self::new(
                RepositoryOperation::GetById,
                RepositoryErrorKind::SerializationError,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::Decode(e) => Self::new(
                RepositoryOperation::GetById,
                RepositoryErrorKind::SerializationError,
                e.to_string(),
            ),
            E::Database(db_err) => {
                let kind = if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                {
                    RepositoryErrorKind::ConstraintViolation
                } else {
                    RepositoryErrorKind::DatabaseError
                };
                Self::new(RepositoryOperation::GetById, kind, db_err.to_string())
            }
            other => Self::new(
                RepositoryOperation::GetById,
                RepositoryErrorKind::Other,
                other.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(RepositoryOperation::ListAll.to_string(), "list_all");
        assert_eq!(RepositoryOperation::GetById.to_string(), "get_by_id");
        assert_eq!(RepositoryOperation::Commit.to_string(), "commit");
        assert_eq!(RepositoryOperation::Remove.to_string(), "remove");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            RepositoryErrorKind::ConnectionFailed.to_string(),
            "connection_failed"
        );
        assert_eq!(RepositoryErrorKind::DatabaseError.to_string(), "database_error");
    }

    #[test]
    fn test_commit_failed() {
        let error = RepositoryError::commit_failed("disk full");
        assert_eq!(error.operation, RepositoryOperation::Commit);
        assert_eq!(error.kind, RepositoryErrorKind::DatabaseError);
        assert!(!error.is_retriable());
    }

    #[test]
    fn test_retriable_kinds() {
        assert!(RepositoryError::connection_failed("refused").is_retriable());
        assert!(RepositoryError::timeout(RepositoryOperation::ListAll, "slow").is_retriable());
        assert!(
            !RepositoryError::database_error(RepositoryOperation::Insert, "syntax").is_retriable()
        );
    }

    #[test]
    fn test_display_with_entity() {
        let error = RepositoryError::database_error(RepositoryOperation::Update, "boom")
            .with_entity_id(7);
        let display = error.to_string();
        assert!(display.contains("database_error"));
        assert!(display.contains("update"));
        assert!(display.contains("[Command: 7]"));
    }

    #[test]
    fn test_with_operation() {
        let error = RepositoryError::connection_failed("refused")
            .with_operation(RepositoryOperation::Begin);
        assert_eq!(error.operation, RepositoryOperation::Begin);
    }
}
