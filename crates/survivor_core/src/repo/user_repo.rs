//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Emails are unique; a duplicate insert yields `RepoError::Conflict`.
//! - `list_users` returns insertion order, the rank tie-breaker.

use crate::model::user::{normalize_email, User, UserId};
use crate::repo::error::{conflict_or, RepoError, RepoResult};
use crate::repo::sqlite::{
    bool_to_int, parse_user_row, write_user, SqliteGameRepository, USER_SELECT_SQL,
};
use rusqlite::{params, Transaction, TransactionBehavior};

/// Repository interface for player records.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Looks up by email after normalization.
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// All users in insertion order.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// All users ordered by `rank ASC`, insertion order for unranked rows.
    fn list_users_ranked(&self) -> RepoResult<Vec<User>>;
    fn update_user(&self, user: &User) -> RepoResult<()>;
    /// Rewrites `rank` for every listed user in one transaction.
    fn update_ranks(&self, ranks: &[(UserId, u32)]) -> RepoResult<()>;
}

impl UserRepository for SqliteGameRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;
        self.conn
            .execute(
                "INSERT INTO users (
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
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
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
                    user.created_at,
                ],
            )
            .map_err(|err| conflict_or(err, || format!("user:{}", user.email)))?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([normalize_email(email)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        self.collect_users(&format!("{USER_SELECT_SQL} ORDER BY seq ASC;"))
    }

    fn list_users_ranked(&self) -> RepoResult<Vec<User>> {
        self.collect_users(&format!(
            "{USER_SELECT_SQL} ORDER BY rank = 0 ASC, rank ASC, seq ASC;"
        ))
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        write_user(self.conn, user)
    }

    fn update_ranks(&self, ranks: &[(UserId, u32)]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (id, rank) in ranks {
            let changed = tx.execute(
                "UPDATE users SET rank = ?2 WHERE id = ?1;",
                params![id.to_string(), rank],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(format!("user:{id}")));
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl SqliteGameRepository<'_> {
    fn collect_users(&self, sql: &str) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}
