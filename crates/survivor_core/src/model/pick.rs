//! Pick domain model.
//!
//! # Invariants
//! - One pick per `(user_id, match_id)` pair.
//! - `is_correct` stays `None` until the match completes and is set once.

use crate::model::game_match::MatchId;
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// A user's predicted winner for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub user_id: UserId,
    pub match_id: MatchId,
    pub picked_team: String,
    /// Unix epoch milliseconds.
    pub pick_time: i64,
    pub is_correct: Option<bool>,
}

/// Scoring projection of a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickOutcome {
    Pending,
    Win,
    Loss,
}

impl Pick {
    pub fn new(
        user_id: UserId,
        match_id: impl Into<MatchId>,
        picked_team: impl Into<String>,
        pick_time: i64,
    ) -> Self {
        Self {
            user_id,
            match_id: match_id.into(),
            picked_team: picked_team.into(),
            pick_time,
            is_correct: None,
        }
    }

    pub fn outcome(&self) -> PickOutcome {
        match self.is_correct {
            None => PickOutcome::Pending,
            Some(true) => PickOutcome::Win,
            Some(false) => PickOutcome::Loss,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("match_id", &self.match_id)?;
        require_text("picked_team", &self.picked_team)
    }
}

#[cfg(test)]
mod tests {
    use super::{Pick, PickOutcome};
    use uuid::Uuid;

    #[test]
    fn outcome_follows_correctness_flag() {
        let mut pick = Pick::new(Uuid::new_v4(), "UF-1-A", "G2", 1);
        assert_eq!(pick.outcome(), PickOutcome::Pending);
        pick.is_correct = Some(true);
        assert_eq!(pick.outcome(), PickOutcome::Win);
        pick.is_correct = Some(false);
        assert_eq!(pick.outcome(), PickOutcome::Loss);
    }

    #[test]
    fn validate_rejects_blank_team() {
        let pick = Pick::new(Uuid::new_v4(), "UF-1-A", "  ", 1);
        assert!(pick.validate().is_err());
    }
}
