//! Core domain logic for the survivor prediction game.
//! This crate is the single source of truth for game invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, GameConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::game_match::{Match, MatchDraft, MatchId, MatchStatus};
pub use model::pick::{Pick, PickOutcome};
pub use model::user::{User, UserId};
pub use model::validation::ValidationError;
pub use repo::error::{RepoError, RepoResult};
pub use repo::match_repo::{MatchCompletion, MatchListQuery, MatchRepository};
pub use repo::pick_repo::{PickListQuery, PickRepository};
pub use repo::sqlite::SqliteGameRepository;
pub use repo::user_repo::UserRepository;
pub use repo::GameRepository;
pub use service::survivor_service::{
    CompletionReport, ServiceResult, SurvivorService, SurvivorServiceError, UserStats,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
