//! User domain model.
//!
//! # Responsibility
//! - Carry identity, survival status, counters and rank for one player.
//! - Normalize email input so lookups are case-insensitive.
//!
//! # Invariants
//! - `id` is stable and never reused for another user.
//! - `eliminated_at` is `Some` exactly when `is_alive == false`.
//! - `current_match_id` is the only active match reference a user holds.

use crate::model::game_match::MatchId;
use crate::model::validation::{require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Stable identifier for a player.
pub type UserId = Uuid;

/// One player of the survivor game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name derived from the email local part.
    pub name: String,
    /// Normalized (trimmed, lowercase) email; unique across users.
    pub email: String,
    pub is_alive: bool,
    /// Unix epoch milliseconds of the losing match completion.
    pub eliminated_at: Option<i64>,
    /// Stage label of the match that eliminated this user.
    pub eliminated_stage: Option<String>,
    pub wins: u32,
    pub losses: u32,
    /// 1-based leaderboard position. `0` until the first ranking pass.
    pub rank: u32,
    pub current_match_id: Option<MatchId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Creates a fresh, alive user from raw email input.
    pub fn new(email: &str, created_at: i64) -> Self {
        let email = normalize_email(email);
        let name = display_name_from_email(&email);
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            is_alive: true,
            eliminated_at: None,
            eliminated_stage: None,
            wins: 0,
            losses: 0,
            rank: 0,
            current_match_id: None,
            created_at,
        }
    }

    /// Marks the user eliminated by a match of `stage` at `at_epoch_ms`.
    pub fn eliminate(&mut self, stage: &str, at_epoch_ms: i64) {
        self.is_alive = false;
        self.eliminated_at = Some(at_epoch_ms);
        self.eliminated_stage = Some(format!("Stage {stage}"));
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.is_alive == self.eliminated_at.is_some() {
            return Err(ValidationError::EliminationMismatch);
        }
        Ok(())
    }
}

/// Trims and lowercases an email so lookups do not depend on user casing.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, User};
    use crate::model::validation::ValidationError;

    #[test]
    fn new_user_normalizes_email_and_derives_name() {
        let user = User::new("  Sushant@Example.COM ", 10);
        assert_eq!(user.email, "sushant@example.com");
        assert_eq!(user.name, "sushant");
        assert!(user.is_alive);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_email() {
        let user = User::new("no-at-sign", 10);
        assert!(matches!(
            user.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn eliminate_sets_timestamp_and_stage() {
        let mut user = User::new("a@b.c", 10);
        user.eliminate("Upper Final", 99);
        assert!(!user.is_alive);
        assert_eq!(user.eliminated_at, Some(99));
        assert_eq!(user.eliminated_stage.as_deref(), Some("Stage Upper Final"));
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_alive_user_with_elimination_time() {
        let mut user = User::new("a@b.c", 10);
        user.eliminated_at = Some(5);
        assert_eq!(user.validate(), Err(ValidationError::EliminationMismatch));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" X@Y.Z\n"), "x@y.z");
    }
}
