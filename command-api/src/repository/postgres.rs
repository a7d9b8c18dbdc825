//! PostgreSQL command store
//!
//! Each [`PgSession`] owns one transaction. Staged statements run inside it
//! immediately and become visible to other sessions only on commit; dropping
//! the session rolls the transaction back.

use sqlx::{PgPool, Postgres, Transaction};

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{CommandRepository, CommandSession, RepositoryResult};
use crate::config::DatabaseConfig;
use crate::database;
use crate::models::{Command, CommandId};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS commands (
    id SERIAL PRIMARY KEY,
    how_to TEXT NOT NULL,
    platform TEXT NOT NULL,
    command_line TEXT NOT NULL
)
"#;

/// [`CommandRepository`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgCommandRepository {
    pool: PgPool,
}

impl PgCommandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `config`, creating the schema when `run_migrations` is set
    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let pool = database::create_pool(config).await?;
        let repo = Self::new(pool);
        if config.run_migrations {
            repo.ensure_schema().await?;
        }
        Ok(repo)
    }

    /// Create the `commands` table if it does not exist
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Connect))?;
        tracing::debug!("Ensured commands table exists");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CommandRepository for PgCommandRepository {
    type Session = PgSession;

    async fn begin(&self) -> RepositoryResult<PgSession> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Begin))?;
        Ok(PgSession { tx })
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Ping))?;
        Ok(())
    }
}

/// Unit of work over one PostgreSQL transaction
#[derive(Debug)]
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl CommandSession for PgSession {
    async fn list_all(&mut self) -> RepositoryResult<Vec<Command>> {
        sqlx::query_as::<_, Command>(
            "SELECT id, how_to, platform, command_line FROM commands ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::ListAll))
    }

    async fn get_by_id(&mut self, id: CommandId) -> RepositoryResult<Option<Command>> {
        sqlx::query_as::<_, Command>(
            "SELECT id, how_to, platform, command_line FROM commands WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            RepositoryError::from(e)
                .with_operation(RepositoryOperation::GetById)
                .with_entity_id(id)
        })
    }

    async fn insert(&mut self, command: &mut Command) -> RepositoryResult<()> {
        let id: CommandId = sqlx::query_scalar(
            "INSERT INTO commands (how_to, platform, command_line) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&command.how_to)
        .bind(&command.platform)
        .bind(&command.command_line)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Insert))?;

        command.id = id;
        Ok(())
    }

    async fn mark_updated(&mut self, command: &Command) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE commands SET how_to = $1, platform = $2, command_line = $3 WHERE id = $4",
        )
        .bind(&command.how_to)
        .bind(&command.platform)
        .bind(&command.command_line)
        .bind(command.id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            RepositoryError::from(e)
                .with_operation(RepositoryOperation::Update)
                .with_entity_id(command.id)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::database_error(
                RepositoryOperation::Update,
                "Update matched no command",
            )
            .with_entity_id(command.id));
        }
        Ok(())
    }

    async fn remove(&mut self, command: &Command) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM commands WHERE id = $1")
            .bind(command.id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation(RepositoryOperation::Remove)
                    .with_entity_id(command.id)
            })?;
        Ok(())
    }

    async fn commit(self) -> RepositoryResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Commit))
    }
}
