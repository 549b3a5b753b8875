//! Match domain model.
//!
//! # Responsibility
//! - Describe one scheduled fixture between two teams.
//! - Track its two-value lifecycle and the declared winner.
//!
//! # Invariants
//! - `team_a != team_b`.
//! - `winner` is `Some` exactly when `status == MatchStatus::Completed`.
//! - A declared winner is always `team_a` or `team_b`.

use crate::model::validation::{require_text, ValidationError};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Schedule-provided match identifier (for example `UF-1-A`).
pub type MatchId = String;

const MS_PER_MINUTE: i64 = 60_000;

/// Match lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Scheduled, open for assignment.
    Upcoming,
    /// Winner declared; picks scored.
    Completed,
}

/// One fixture of the tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub team_a: String,
    pub team_b: String,
    /// Free-form stage label (`Upper Final`, `Grand Final`, ...).
    pub stage: String,
    /// Scheduled start, Unix epoch milliseconds.
    pub start_time: i64,
    pub status: MatchStatus,
    pub winner: Option<String>,
}

impl Match {
    /// Creates an upcoming match with no winner.
    pub fn new(
        id: impl Into<MatchId>,
        team_a: impl Into<String>,
        team_b: impl Into<String>,
        stage: impl Into<String>,
        start_time: i64,
    ) -> Self {
        Self {
            id: id.into(),
            team_a: team_a.into(),
            team_b: team_b.into(),
            stage: stage.into(),
            start_time,
            status: MatchStatus::Upcoming,
            winner: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Returns whether `team` is one of the two sides, compared exactly.
    pub fn has_team(&self, team: &str) -> bool {
        self.team_a == team || self.team_b == team
    }

    /// Epoch ms from which picks are no longer accepted.
    pub fn pick_lock_at(&self, lock_minutes_before: u32) -> i64 {
        self.start_time - i64::from(lock_minutes_before) * MS_PER_MINUTE
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("id", &self.id)?;
        require_text("team_a", &self.team_a)?;
        require_text("team_b", &self.team_b)?;
        require_text("stage", &self.stage)?;
        if self.team_a == self.team_b {
            return Err(ValidationError::SameTeams(self.team_a.clone()));
        }
        match (&self.status, &self.winner) {
            (MatchStatus::Upcoming, None) => Ok(()),
            (MatchStatus::Completed, Some(winner)) if self.has_team(winner) => Ok(()),
            (MatchStatus::Completed, Some(winner)) => Err(ValidationError::WinnerNotInMatch {
                winner: winner.clone(),
            }),
            _ => Err(ValidationError::WinnerStatusMismatch),
        }
    }
}

/// Schedule-import row. `start_time` is an RFC 3339 timestamp such as
/// `2025-08-29T18:00:00Z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDraft {
    pub id: MatchId,
    pub team_a: String,
    pub team_b: String,
    pub stage: String,
    pub start_time: String,
}

impl MatchDraft {
    /// Converts the draft into a validated upcoming match.
    pub fn into_match(self) -> Result<Match, ValidationError> {
        let start_time = DateTime::parse_from_rfc3339(self.start_time.trim())
            .map_err(|_| ValidationError::InvalidStartTime(self.start_time.clone()))?
            .timestamp_millis();
        let game = Match::new(
            self.id.trim(),
            self.team_a.trim(),
            self.team_b.trim(),
            self.stage.trim(),
            start_time,
        );
        game.validate()?;
        Ok(game)
    }
}
