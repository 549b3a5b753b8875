//! Game configuration.
//!
//! # Invariants
//! - Every field has a default, so an empty TOML document is a valid config.
//! - `max_users_per_match` is at least 1.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_USERS_PER_MATCH: u32 = 100;
pub const DEFAULT_LOCK_MINUTES_BEFORE: u32 = 5;
pub const DEFAULT_ASSIGNMENT_SALT: &str = "survivor";

/// Tunables of the survivor game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Upper bound of users ever assigned to one match.
    pub max_users_per_match: u32,
    /// Picks lock this many minutes before a match starts.
    pub lock_minutes_before: u32,
    /// Mixed into the deterministic assignment hash.
    pub assignment_salt: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_users_per_match: DEFAULT_MAX_USERS_PER_MATCH,
            lock_minutes_before: DEFAULT_LOCK_MINUTES_BEFORE,
            assignment_salt: DEFAULT_ASSIGNMENT_SALT.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_users_per_match == 0 {
            return Err(ConfigError::Invalid("max_users_per_match must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GameConfig};

    #[test]
    fn empty_document_yields_defaults() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.max_users_per_match, 100);
        assert_eq!(config.lock_minutes_before, 5);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = GameConfig::from_toml_str("lock_minutes_before = 15\n").unwrap();
        assert_eq!(config.lock_minutes_before, 15);
        assert_eq!(config.max_users_per_match, 100);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = GameConfig::from_toml_str("max_users_per_match = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = GameConfig::from_toml_str("lock_minutes = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survivor.toml");
        std::fs::write(&path, "assignment_salt = \"vct\"").unwrap();
        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.assignment_salt, "vct");
    }
}
