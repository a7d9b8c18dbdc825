//! In-memory command store
//!
//! Used when no database is configured, and as the repository test double.
//! Commands are kept in an ordered map keyed by id, so listing returns them
//! in insertion order. Sessions stage their changes locally and apply them
//! under a single write lock on commit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{CommandRepository, CommandSession, RepositoryResult};
use crate::models::{Command, CommandId};

#[derive(Debug)]
struct Inner {
    commands: RwLock<BTreeMap<CommandId, Command>>,
    // Wider than `CommandId` so the counter can run past the last id
    // without wrapping.
    next_id: AtomicI64,
    fail_commits: AtomicBool,
}

/// Process-local [`CommandRepository`]
///
/// Cloning is cheap and every clone shares the same store.
///
/// # Example
///
/// ```rust
/// use command_api::models::Command;
/// use command_api::repository::InMemoryCommandRepository;
///
/// let repo = InMemoryCommandRepository::with_commands([
///     Command::new("List files", "Linux", "ls -la"),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryCommandRepository {
    inner: Arc<Inner>,
}

impl Default for InMemoryCommandRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCommandRepository {
    /// Create an empty store; the first id handed out is 1
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                commands: RwLock::new(BTreeMap::new()),
                next_id: AtomicI64::new(1),
                fail_commits: AtomicBool::new(false),
            }),
        }
    }

    /// Create a store seeded with `commands`
    ///
    /// Commands with a positive id keep it; the rest are assigned fresh ids.
    /// Once the id range is used up, unnumbered commands are dropped and
    /// later inserts fail.
    pub fn with_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        let repo = Self::new();
        let mut map = BTreeMap::new();
        let mut next_id: i64 = 1;

        for mut command in commands {
            if command.id <= 0 {
                match CommandId::try_from(next_id) {
                    Ok(id) => command.id = id,
                    Err(_) => {
                        tracing::warn!("Id range exhausted; dropping seeded command");
                        continue;
                    }
                }
            }
            next_id = next_id.max(i64::from(command.id) + 1);
            map.insert(command.id, command);
        }

        repo.inner.next_id.store(next_id, Ordering::SeqCst);
        // The lock was just created and nothing else holds it.
        if let Ok(mut guard) = repo.inner.commands.try_write() {
            *guard = map;
        }
        repo
    }

    /// Make every subsequent commit fail (or succeed again)
    pub fn set_fail_commits(&self, fail: bool) {
        self.inner.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the committed state
    pub async fn snapshot(&self) -> Vec<Command> {
        self.inner.commands.read().await.values().cloned().collect()
    }

    /// Number of committed commands
    pub async fn len(&self) -> usize {
        self.inner.commands.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.commands.read().await.is_empty()
    }
}

impl CommandRepository for InMemoryCommandRepository {
    type Session = InMemorySession;

    async fn begin(&self) -> RepositoryResult<InMemorySession> {
        Ok(InMemorySession {
            inner: Arc::clone(&self.inner),
            staged: Vec::new(),
        })
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Change {
    Insert(Command),
    Update(Command),
    Remove(CommandId),
}

/// Unit of work over an [`InMemoryCommandRepository`]
#[derive(Debug)]
pub struct InMemorySession {
    inner: Arc<Inner>,
    staged: Vec<Change>,
}

impl InMemorySession {
    /// Overlay the staged changes on `map`
    ///
    /// An update whose command is no longer in `map` fails, the same way an
    /// `UPDATE` matching no rows does in PostgreSQL. `map` may be left
    /// partially changed on error, so callers pass a copy.
    fn apply_staged(&self, map: &mut BTreeMap<CommandId, Command>) -> RepositoryResult<()> {
        for change in &self.staged {
            match change {
                Change::Insert(command) => {
                    map.insert(command.id, command.clone());
                }
                Change::Update(command) => match map.get_mut(&command.id) {
                    Some(slot) => *slot = command.clone(),
                    None => return Err(missing_on_update(command.id)),
                },
                Change::Remove(id) => {
                    map.remove(id);
                }
            }
        }
        Ok(())
    }
}

fn missing_on_update(id: CommandId) -> RepositoryError {
    RepositoryError::database_error(RepositoryOperation::Update, "Update matched no command")
        .with_entity_id(id)
}

impl CommandSession for InMemorySession {
    async fn list_all(&mut self) -> RepositoryResult<Vec<Command>> {
        let mut view = self.inner.commands.read().await.clone();
        self.apply_staged(&mut view)?;
        Ok(view.into_values().collect())
    }

    async fn get_by_id(&mut self, id: CommandId) -> RepositoryResult<Option<Command>> {
        for change in self.staged.iter().rev() {
            match change {
                Change::Insert(command) | Change::Update(command) if command.id == id => {
                    return Ok(Some(command.clone()))
                }
                Change::Remove(removed) if *removed == id => return Ok(None),
                _ => {}
            }
        }
        Ok(self.inner.commands.read().await.get(&id).cloned())
    }

    async fn insert(&mut self, command: &mut Command) -> RepositoryResult<()> {
        let next = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        command.id = CommandId::try_from(next).map_err(|_| {
            RepositoryError::database_error(RepositoryOperation::Insert, "Command ids exhausted")
        })?;
        self.staged.push(Change::Insert(command.clone()));
        Ok(())
    }

    async fn mark_updated(&mut self, command: &Command) -> RepositoryResult<()> {
        self.staged.push(Change::Update(command.clone()));
        Ok(())
    }

    async fn remove(&mut self, command: &Command) -> RepositoryResult<()> {
        self.staged.push(Change::Remove(command.id));
        Ok(())
    }

    async fn commit(self) -> RepositoryResult<()> {
        if self.inner.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::commit_failed("in-memory store rejected the commit"));
        }

        let mut commands = self.inner.commands.write().await;
        let mut updated = commands.clone();
        self.apply_staged(&mut updated)?;
        *commands = updated;
        tracing::debug!(
            operation = %RepositoryOperation::Commit,
            changes = self.staged.len(),
            "Committed in-memory session"
        );
        Ok(())
    }
}
