//! Command persistence
//!
//! The handlers depend only on the [`CommandRepository`] and
//! [`CommandSession`] traits. Two stores implement them:
//!
//! - [`InMemoryCommandRepository`]: process-local, used without a database
//!   and as the test double
//! - [`PgCommandRepository`]: PostgreSQL via sqlx (feature `database`)
//!
//! # Example
//!
//! ```rust
//! use command_api::models::Command;
//! use command_api::repository::{CommandRepository, CommandSession, InMemoryCommandRepository};
//!
//! # async fn demo() -> command_api::repository::RepositoryResult<()> {
//! let repo = InMemoryCommandRepository::new();
//! let mut session = repo.begin().await?;
//! let mut command = Command::new("List files", "Linux", "ls -la");
//! session.insert(&mut command).await?;
//! session.commit().await?;
//! assert_eq!(command.id, 1);
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
#[cfg(feature = "database")]
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::{InMemoryCommandRepository, InMemorySession};
#[cfg(feature = "database")]
pub use postgres::{PgCommandRepository, PgSession};
pub use traits::{CommandRepository, CommandSession, RepositoryResult};
