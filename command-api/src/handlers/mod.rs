//! HTTP handlers for the command resource
//!
//! The handlers are generic over [`CommandRepository`](crate::repository::CommandRepository)
//! and take their store from [`AppState`](crate::state::AppState).
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | `/commands` | 200, array of commands |
//! | GET | `/commands/{id}` | 200, one command |
//! | POST | `/commands` | 201 with `Location` |
//! | PUT | `/commands/{id}` | 204 |
//! | PATCH | `/commands/{id}` | 204 |
//! | DELETE | `/commands/{id}` | 204 |
//!
//! Failures are reported through [`ApiError`].

mod commands;
mod error;

pub use commands::{
    create_command, delete_command, get_command, list_commands, patch_command, routes,
    update_command,
};
pub use error::{ApiError, ApiErrorKind, ApiOperation};
