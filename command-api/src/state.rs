//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::repository::CommandRepository;

/// Application state shared across handlers
///
/// Generic over the command store so handlers run unchanged against
/// PostgreSQL or the in-memory repository.
pub struct AppState<R> {
    config: Arc<Config>,
    repository: Arc<R>,
    base_path: Arc<str>,
}

// Derived Clone would require `R: Clone`.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            repository: Arc::clone(&self.repository),
            base_path: Arc::clone(&self.base_path),
        }
    }
}

impl<R: CommandRepository> AppState<R> {
    pub fn new(config: Config, repository: R) -> Self {
        let base_path = config.service.normalized_base_path();
        Self {
            config: Arc::new(config),
            repository: Arc::new(repository),
            base_path: base_path.into(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Normalized route prefix, empty when commands are served at the root
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// URL of the endpoint that retrieves command `id`
    pub fn command_location(&self, id: impl std::fmt::Display) -> String {
        format!("{}/commands/{}", self.base_path, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCommandRepository;

    #[test]
    fn test_location_without_base_path() {
        let state = AppState::new(Config::default(), InMemoryCommandRepository::new());
        assert_eq!(state.base_path(), "");
        assert_eq!(state.command_location(3), "/commands/3");
    }

    #[test]
    fn test_location_with_base_path() {
        let mut config = Config::default();
        config.service.base_path = "/api/".to_string();
        let state = AppState::new(config, InMemoryCommandRepository::new());
        assert_eq!(state.command_location(3), "/api/commands/3");
    }

    #[test]
    fn test_clone_shares_repository() {
        let state = AppState::new(Config::default(), InMemoryCommandRepository::new());
        let cloned = state.clone();
        assert!(std::ptr::eq(state.repository(), cloned.repository()));
    }
}
