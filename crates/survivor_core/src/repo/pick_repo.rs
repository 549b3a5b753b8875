//! Pick repository contract and SQLite implementation.
//!
//! # Invariants
//! - `(user_id, match_id)` is the primary key; a second insert is a `Conflict`.

use crate::model::game_match::MatchId;
use crate::model::pick::Pick;
use crate::model::user::UserId;
use crate::repo::error::{conflict_or, RepoResult};
use crate::repo::sqlite::{parse_pick_row, SqliteGameRepository, PICK_SELECT_SQL};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

/// Query options for listing picks. Empty query lists every pick.
#[derive(Debug, Clone, Default)]
pub struct PickListQuery {
    pub user_id: Option<UserId>,
    pub match_id: Option<MatchId>,
}

/// Repository interface for pick persistence.
pub trait PickRepository {
    fn create_pick(&self, pick: &Pick) -> RepoResult<()>;
    fn get_pick(&self, user_id: UserId, match_id: &str) -> RepoResult<Option<Pick>>;
    /// Lists picks ordered by `pick_time ASC, user_id ASC`.
    fn list_picks(&self, query: &PickListQuery) -> RepoResult<Vec<Pick>>;
}

impl PickRepository for SqliteGameRepository<'_> {
    fn create_pick(&self, pick: &Pick) -> RepoResult<()> {
        pick.validate()?;
        self.conn
            .execute(
                "INSERT INTO picks (user_id, match_id, picked_team, pick_time, is_correct)
                 VALUES (?1, ?2, ?3, ?4, NULL);",
                params![
                    pick.user_id.to_string(),
                    pick.match_id.as_str(),
                    pick.picked_team.as_str(),
                    pick.pick_time,
                ],
            )
            .map_err(|err| conflict_or(err, || format!("pick:{}:{}", pick.user_id, pick.match_id)))?;
        Ok(())
    }

    fn get_pick(&self, user_id: UserId, match_id: &str) -> RepoResult<Option<Pick>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PICK_SELECT_SQL} WHERE user_id = ?1 AND match_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), match_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_pick_row(row)?));
        }
        Ok(None)
    }

    fn list_picks(&self, query: &PickListQuery) -> RepoResult<Vec<Pick>> {
        let mut sql = format!("{PICK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Text(user_id.to_string()));
        }
        if let Some(match_id) = &query.match_id {
            sql.push_str(" AND match_id = ?");
            bind_values.push(Value::Text(match_id.clone()));
        }
        sql.push_str(" ORDER BY pick_time ASC, user_id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut picks = Vec::new();
        while let Some(row) = rows.next()? {
            picks.push(parse_pick_row(row)?);
        }
        Ok(picks)
    }
}
