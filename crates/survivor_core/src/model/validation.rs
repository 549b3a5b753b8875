//! Validation errors shared by all domain records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rule violation detected by a record `validate()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank after trim.
    BlankField(&'static str),
    /// Email does not look like `local@domain`.
    InvalidEmail(String),
    /// Both sides of a match carry the same team name.
    SameTeams(String),
    /// Winner is not one of the two teams of the match.
    WinnerNotInMatch { winner: String },
    /// Completed match without winner, or upcoming match with one.
    WinnerStatusMismatch,
    /// Alive flag and elimination timestamp disagree.
    EliminationMismatch,
    /// Start time text could not be parsed as RFC 3339.
    InvalidStartTime(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::SameTeams(team) => write!(f, "match cannot oppose `{team}` to itself"),
            Self::WinnerNotInMatch { winner } => {
                write!(f, "winner `{winner}` is not a team of this match")
            }
            Self::WinnerStatusMismatch => {
                write!(f, "winner must be set exactly when the match is completed")
            }
            Self::EliminationMismatch => {
                write!(f, "eliminated_at must be set exactly when the user is eliminated")
            }
            Self::InvalidStartTime(value) => write!(f, "invalid RFC 3339 start time `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
