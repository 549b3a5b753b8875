//! SQLite-backed game repository shared by user, match and pick contracts.
//!
//! # Responsibility
//! - Hold the borrowed connection used by every repository trait impl.
//! - Convert between SQLite rows and domain records.
//!
//! # Invariants
//! - Only connections migrated to `latest_version()` are accepted.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::model::game_match::{Match, MatchStatus};
use crate::model::pick::Pick;
use crate::model::user::{User, UserId};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub(crate) const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    is_alive,
    eliminated_at,
    eliminated_stage,
    wins,
    losses,
    rank,
    current_match_id,
    created_at
FROM users";

pub(crate) const MATCH_SELECT_SQL: &str = "SELECT
    m.id AS id,
    m.team_a AS team_a,
    m.team_b AS team_b,
    m.stage AS stage,
    m.start_time AS start_time,
    m.status AS status,
    m.winner AS winner
FROM matches m";

pub(crate) const PICK_SELECT_SQL: &str = "SELECT
    user_id,
    match_id,
    picked_team,
    pick_time,
    is_correct
FROM picks";

/// SQLite implementation of `UserRepository`, `MatchRepository` and
/// `PickRepository`.
pub struct SqliteGameRepository<'conn> {
    pub(crate) conn: &'conn Connection,
}

impl<'conn> SqliteGameRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

/// Overwrites every mutable column of one user row.
pub(crate) fn write_user(conn: &Connection, user: &User) -> RepoResult<()> {
    user.validate()?;
    let changed = conn.execute(
        "UPDATE users
         SET
            name = ?2,
            email = ?3,
            is_alive = ?4,
            eliminated_at = ?5,
            eliminated_stage = ?6,
            wins = ?7,
            losses = ?8,
            rank = ?9,
            current_match_id = ?10
         WHERE id = ?1;",
        params![
            user.id.to_string(),
            user.name.as_str(),
            user.email.as_str(),
            bool_to_int(user.is_alive),
            user.eliminated_at,
            user.eliminated_stage.as_deref(),
            user.wins,
            user.losses,
            user.rank,
            user.current_match_id.as_deref(),
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(format!("user:{}", user.id)));
    }
    Ok(())
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let user = User {
        id: parse_uuid(&id_text, "users.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        is_alive: parse_flag(row.get("is_alive")?, "users.is_alive")?,
        eliminated_at: row.get("eliminated_at")?,
        eliminated_stage: row.get("eliminated_stage")?,
        wins: row.get("wins")?,
        losses: row.get("losses")?,
        rank: row.get("rank")?,
        current_match_id: row.get("current_match_id")?,
        created_at: row.get("created_at")?,
    };
    user.validate()?;
    Ok(user)
}

pub(crate) fn parse_match_row(row: &Row<'_>) -> RepoResult<Match> {
    let status_text: String = row.get("status")?;
    let status = parse_match_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid match status `{status_text}` in matches.status"))
    })?;
    let game = Match {
        id: row.get("id")?,
        team_a: row.get("team_a")?,
        team_b: row.get("team_b")?,
        stage: row.get("stage")?,
        start_time: row.get("start_time")?,
        status,
        winner: row.get("winner")?,
    };
    game.validate()?;
    Ok(game)
}

pub(crate) fn parse_pick_row(row: &Row<'_>) -> RepoResult<Pick> {
    let user_text: String = row.get("user_id")?;
    let is_correct = match row.get::<_, Option<i64>>("is_correct")? {
        Some(value) => Some(parse_flag(value, "picks.is_correct")?),
        None => None,
    };
    Ok(Pick {
        user_id: parse_uuid(&user_text, "picks.user_id")?,
        match_id: row.get("match_id")?,
        picked_team: row.get("picked_team")?,
        pick_time: row.get("pick_time")?,
        is_correct,
    })
}

pub(crate) fn match_status_to_db(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Upcoming => "upcoming",
        MatchStatus::Completed => "completed",
    }
}

fn parse_match_status(value: &str) -> Option<MatchStatus> {
    match value {
        "upcoming" => Some(MatchStatus::Upcoming),
        "completed" => Some(MatchStatus::Completed),
        _ => None,
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<UserId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
