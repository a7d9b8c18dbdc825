//! # command-api
//!
//! REST service for storing command-line how-to entries. Each command has a
//! description (`howTo`), a `platform` and the `commandLine` itself, and is
//! addressed by a numeric id.
//!
//! ## Endpoints
//!
//! - `GET /commands`, `GET /commands/{id}`
//! - `POST /commands` (201 with `Location`)
//! - `PUT /commands/{id}` full replacement
//! - `PATCH /commands/{id}` JSON patch (add, remove, replace, move, copy, test)
//! - `DELETE /commands/{id}`
//! - `GET /health`, `GET /ready`
//!
//! Commands live in PostgreSQL when `[database]` is configured, otherwise in
//! an in-memory store.
//!
//! ## Example
//!
//! ```rust,no_run
//! use command_api::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), InMemoryCommandRepository::new());
//!     Server::new(config).serve(build_router(state)).await
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod patch;
pub mod repository;
pub mod responses;
pub mod server;
pub mod state;

/// Commonly used types
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, MiddlewareConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{MakeTypedRequestId, RequestId};
    pub use crate::models::{Command, CommandCreateDto, CommandId, CommandReadDto, CommandUpdateDto};
    pub use crate::observability::init_tracing;
    pub use crate::patch::{PatchDocument, PatchError, PatchOperation};
    pub use crate::repository::{
        CommandRepository, CommandSession, InMemoryCommandRepository, RepositoryError,
        RepositoryErrorKind, RepositoryOperation, RepositoryResult,
    };
    #[cfg(feature = "database")]
    pub use crate::repository::PgCommandRepository;
    pub use crate::responses::{Created, FieldError, NoContent, ValidationError};
    pub use crate::server::{build_router, Server};
    pub use crate::state::AppState;

    pub use axum::{
        extract::{Path, State},
        routing::get,
        Json, Router,
    };
    pub use tokio;
}
