//! Match repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the schedule and per-user match assignments.
//! - Apply a scored match completion atomically.
//!
//! # Invariants
//! - A completion only applies to a match still `upcoming`; it is never replayed.
//! - A pick's `is_correct` is written once, from `NULL` only.
//! - Assignment writes the user reference and the assignment row together.

use crate::model::game_match::{Match, MatchId, MatchStatus};
use crate::model::pick::Pick;
use crate::model::user::{User, UserId};
use crate::repo::error::{conflict_or, RepoError, RepoResult};
use crate::repo::sqlite::{
    bool_to_int, match_status_to_db, parse_match_row, write_user, SqliteGameRepository,
    MATCH_SELECT_SQL,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};

/// Query options for listing matches.
#[derive(Debug, Clone, Default)]
pub struct MatchListQuery {
    pub status: Option<MatchStatus>,
    pub stage: Option<String>,
}

/// Fully scored result of one match, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCompletion {
    /// Completed match record carrying the winner.
    pub completed: Match,
    /// Every pick of the match with `is_correct` set.
    pub scored_picks: Vec<Pick>,
    /// User rows whose counters, status, reference or rank changed.
    pub users: Vec<User>,
}

/// Repository interface for schedule and assignment persistence.
pub trait MatchRepository {
    fn create_match(&self, game: &Match) -> RepoResult<MatchId>;
    /// Inserts all matches or none.
    fn create_matches(&self, games: &[Match]) -> RepoResult<usize>;
    fn get_match(&self, id: &str) -> RepoResult<Option<Match>>;
    /// Lists matches ordered by `start_time ASC, id ASC`.
    fn list_matches(&self, query: &MatchListQuery) -> RepoResult<Vec<Match>>;
    /// Upcoming matches the user has neither picked nor been assigned, with
    /// fewer than `capacity` assignments, ordered by `start_time ASC, id ASC`.
    fn list_assignable_matches(&self, user_id: UserId, capacity: u32) -> RepoResult<Vec<Match>>;
    /// Number of matches ever assigned to the user.
    fn count_assignments(&self, user_id: UserId) -> RepoResult<u32>;
    /// Sets the user's active match and records the assignment.
    fn assign_match(&self, user_id: UserId, match_id: &str, assigned_at: i64) -> RepoResult<()>;
    fn record_completion(&self, completion: &MatchCompletion) -> RepoResult<()>;
}

impl MatchRepository for SqliteGameRepository<'_> {
    fn create_match(&self, game: &Match) -> RepoResult<MatchId> {
        insert_match(self.conn, game)?;
        Ok(game.id.clone())
    }

    fn create_matches(&self, games: &[Match]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for game in games {
            insert_match(&tx, game)?;
        }
        tx.commit()?;
        Ok(games.len())
    }

    fn get_match(&self, id: &str) -> RepoResult<Option<Match>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MATCH_SELECT_SQL} WHERE m.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_match_row(row)?));
        }
        Ok(None)
    }

    fn list_matches(&self, query: &MatchListQuery) -> RepoResult<Vec<Match>> {
        let mut sql = format!("{MATCH_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND m.status = ?");
            bind_values.push(Value::Text(match_status_to_db(status).to_string()));
        }
        if let Some(stage) = &query.stage {
            sql.push_str(" AND m.stage = ?");
            bind_values.push(Value::Text(stage.clone()));
        }
        sql.push_str(" ORDER BY m.start_time ASC, m.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut games = Vec::new();
        while let Some(row) = rows.next()? {
            games.push(parse_match_row(row)?);
        }
        Ok(games)
    }

    fn list_assignable_matches(&self, user_id: UserId, capacity: u32) -> RepoResult<Vec<Match>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MATCH_SELECT_SQL}
             WHERE m.status = 'upcoming'
               AND NOT EXISTS (
                 SELECT 1 FROM picks p WHERE p.match_id = m.id AND p.user_id = ?1
               )
               AND NOT EXISTS (
                 SELECT 1 FROM match_assignments a WHERE a.match_id = m.id AND a.user_id = ?1
               )
               AND (
                 SELECT COUNT(*) FROM match_assignments a WHERE a.match_id = m.id
               ) < ?2
             ORDER BY m.start_time ASC, m.id ASC;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), capacity])?;
        let mut games = Vec::new();
        while let Some(row) = rows.next()? {
            games.push(parse_match_row(row)?);
        }
        Ok(games)
    }

    fn count_assignments(&self, user_id: UserId) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM match_assignments WHERE user_id = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn assign_match(&self, user_id: UserId, match_id: &str, assigned_at: i64) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE users SET current_match_id = ?2 WHERE id = ?1;",
            params![user_id.to_string(), match_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(format!("user:{user_id}")));
        }
        tx.execute(
            "INSERT INTO match_assignments (user_id, match_id, assigned_at)
             VALUES (?1, ?2, ?3);",
            params![user_id.to_string(), match_id, assigned_at],
        )
        .map_err(|err| conflict_or(err, || format!("assignment:{user_id}:{match_id}")))?;
        tx.commit()?;
        Ok(())
    }

    fn record_completion(&self, completion: &MatchCompletion) -> RepoResult<()> {
        let game = &completion.completed;
        game.validate()?;
        if !game.is_completed() {
            return Err(RepoError::InvalidData(format!(
                "completion for `{}` carries an upcoming match",
                game.id
            )));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE matches
             SET status = 'completed', winner = ?2
             WHERE id = ?1
               AND status = 'upcoming';",
            params![game.id.as_str(), game.winner.as_deref()],
        )?;
        if changed == 0 {
            return Err(RepoError::Conflict(format!("completion:{}", game.id)));
        }

        for pick in &completion.scored_picks {
            let Some(is_correct) = pick.is_correct else {
                return Err(RepoError::InvalidData(format!(
                    "unscored pick for user {} in completion of `{}`",
                    pick.user_id, game.id
                )));
            };
            let changed = tx.execute(
                "UPDATE picks
                 SET is_correct = ?3
                 WHERE user_id = ?1
                   AND match_id = ?2
                   AND is_correct IS NULL;",
                params![
                    pick.user_id.to_string(),
                    pick.match_id.as_str(),
                    bool_to_int(is_correct),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::Conflict(format!(
                    "pick:{}:{}",
                    pick.user_id, pick.match_id
                )));
            }
        }

        for user in &completion.users {
            write_user(&tx, user)?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn insert_match(conn: &Connection, game: &Match) -> RepoResult<()> {
    game.validate()?;
    conn.execute(
        "INSERT INTO matches (
            id,
            team_a,
            team_b,
            stage,
            start_time,
            status,
            winner
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            game.id.as_str(),
            game.team_a.as_str(),
            game.team_b.as_str(),
            game.stage.as_str(),
            game.start_time,
            match_status_to_db(game.status),
            game.winner.as_deref(),
        ],
    )
    .map_err(|err| conflict_or(err, || format!("match:{}", game.id)))?;
    Ok(())
}
