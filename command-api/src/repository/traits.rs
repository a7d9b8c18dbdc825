//! Repository trait definitions
//!
//! Persistence is modelled as a unit of work. A [`CommandRepository`] opens
//! a [`CommandSession`]; the session loads commands, stages at most the
//! mutations one request needs, and makes them durable with a single
//! [`CommandSession::commit`]. Dropping a session without committing
//! discards everything it staged.
//!
//! Both traits use RPITIT (Return Position Impl Trait In Traits), so
//! implementations are written with plain `async fn`.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut session = repo.begin().await?;
//! if let Some(mut command) = session.get_by_id(1).await? {
//!     command.how_to = "updated".to_string();
//!     session.mark_updated(&command).await?;
//!     session.commit().await?;
//! }
//! ```

use std::future::Future;

use super::error::RepositoryError;
use crate::models::{Command, CommandId};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A store of commands
pub trait CommandRepository: Send + Sync + 'static {
    /// Unit of work type handed out by [`begin`](Self::begin)
    type Session: CommandSession;

    /// Open a new unit of work
    fn begin(&self) -> impl Future<Output = RepositoryResult<Self::Session>> + Send;

    /// Check the store is reachable
    fn ping(&self) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// One unit of work against a [`CommandRepository`]
pub trait CommandSession: Send {
    /// Every stored command, in the store's iteration order
    fn list_all(&mut self) -> impl Future<Output = RepositoryResult<Vec<Command>>> + Send;

    /// Load a command by id; `Ok(None)` when it does not exist
    fn get_by_id(
        &mut self,
        id: CommandId,
    ) -> impl Future<Output = RepositoryResult<Option<Command>>> + Send;

    /// Stage a new command and assign its id
    fn insert(&mut self, command: &mut Command)
        -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Stage in-place changes made to a loaded command
    ///
    /// If the command was removed since it was loaded, the update fails with
    /// [`Update`](super::RepositoryOperation::Update) instead of bringing it
    /// back. Depending on the store, the error surfaces here or at
    /// [`CommandSession::commit`].
    fn mark_updated(&mut self, command: &Command)
        -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Stage removal of a loaded command
    fn remove(&mut self, command: &Command) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Make every staged change durable, all or nothing
    fn commit(self) -> impl Future<Output = RepositoryResult<()>> + Send;
}
