//! Survivor game use-case service.
//!
//! # Responsibility
//! - Expose the four game operations: login, current match, submit pick,
//!   complete match.
//! - Provide read models for leaderboard, pick history and user stats.
//! - Import and extend the match schedule.
//!
//! # Invariants
//! - An eliminated user is never handed a new match.
//! - A user holds at most one pick per match.
//! - A completed match is never scored again.
//! - Ranks are recomputed after every user creation and match completion.

use crate::clock::{now_epoch_ms, Clock};
use crate::config::GameConfig;
use crate::model::game_match::{Match, MatchDraft, MatchId, MatchStatus};
use crate::model::pick::{Pick, PickOutcome};
use crate::model::user::{normalize_email, User, UserId};
use crate::model::validation::ValidationError;
use crate::repo::error::RepoError;
use crate::repo::match_repo::{MatchCompletion, MatchListQuery};
use crate::repo::pick_repo::PickListQuery;
use crate::repo::GameRepository;
use crate::service::assignment::choose_match;
use crate::service::ranking::{apply_completion, assign_ranks, changed_users, score_picks};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from survivor game operations.
#[derive(Debug)]
pub enum SurvivorServiceError {
    /// Email input is not a usable address.
    InvalidEmail(String),
    UserNotFound(UserId),
    MatchNotFound(MatchId),
    /// User lost a pick earlier and may not play on.
    UserEliminated(UserId),
    /// Pick targets a match that is not the user's active assignment.
    NotAssigned { user_id: UserId, match_id: MatchId },
    /// A pick already exists for this user and match.
    DuplicatePick { user_id: UserId, match_id: MatchId },
    /// Team is not one of the two sides of the match.
    InvalidTeam { match_id: MatchId, team: String },
    /// Pick window closed at `lock_at` (epoch ms).
    PickLocked { match_id: MatchId, lock_at: i64 },
    MatchAlreadyCompleted(MatchId),
    /// Match record rejected by validation.
    InvalidMatch(ValidationError),
    /// Schedule row at `index` rejected by validation.
    InvalidSchedule {
        index: usize,
        source: ValidationError,
    },
    /// Match id already present in storage or repeated in one import.
    DuplicateMatch(MatchId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for SurvivorServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::MatchNotFound(id) => write!(f, "match not found: {id}"),
            Self::UserEliminated(id) => write!(f, "user has been eliminated: {id}"),
            Self::NotAssigned { user_id, match_id } => {
                write!(f, "user {user_id} is not assigned to match {match_id}")
            }
            Self::DuplicatePick { user_id, match_id } => {
                write!(f, "user {user_id} already picked for match {match_id}")
            }
            Self::InvalidTeam { match_id, team } => {
                write!(f, "`{team}` does not play in match {match_id}")
            }
            Self::PickLocked { match_id, lock_at } => {
                write!(f, "picks for match {match_id} locked at {lock_at}")
            }
            Self::MatchAlreadyCompleted(id) => write!(f, "match already completed: {id}"),
            Self::InvalidMatch(err) => write!(f, "invalid match: {err}"),
            Self::InvalidSchedule { index, source } => {
                write!(f, "invalid schedule row {index}: {source}")
            }
            Self::DuplicateMatch(id) => write!(f, "duplicate match id: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SurvivorServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMatch(err) => Some(err),
            Self::InvalidSchedule { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SurvivorServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ServiceResult<T> = Result<T, SurvivorServiceError>;

/// Summary of one match completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub match_id: MatchId,
    pub winner: String,
    pub winners: Vec<UserId>,
    pub eliminated: Vec<UserId>,
    /// Count of users whose active match reference was cleared.
    pub cleared: usize,
}

/// Per-user pick statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub user: User,
    pub total_picks: usize,
    pub wins: usize,
    pub losses: usize,
    pub pending: usize,
}

/// Survivor game facade over a repository implementation.
pub struct SurvivorService<R: GameRepository> {
    repo: R,
    config: GameConfig,
    clock: Clock,
}

impl<R: GameRepository> SurvivorService<R> {
    /// Creates a service using the wall clock.
    pub fn new(repo: R, config: GameConfig) -> Self {
        Self {
            repo,
            config,
            clock: now_epoch_ms,
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the user registered under `email`, creating one when absent.
    pub fn login(&self, email: &str) -> ServiceResult<User> {
        let normalized = normalize_email(email);
        if let Some(user) = self.repo.find_user_by_email(&normalized)? {
            return Ok(user);
        }

        let user = User::new(&normalized, (self.clock)());
        if user.validate().is_err() {
            return Err(SurvivorServiceError::InvalidEmail(email.trim().to_string()));
        }

        match self.repo.create_user(&user) {
            Ok(_) => {}
            Err(RepoError::Conflict(what)) => {
                // Created concurrently by another session; return that row.
                let existing = self.repo.find_user_by_email(&normalized)?;
                return concurrent_login(existing, what);
            }
            Err(err) => return Err(err.into()),
        }
        self.refresh_ranks()?;
        info!("event=user_create module=service status=ok user_id={}", user.id);

        self.repo
            .get_user(user.id)?
            .ok_or(SurvivorServiceError::UserNotFound(user.id))
    }

    /// Looks a user up by email without creating one.
    pub fn find_user(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_user_by_email(email)?)
    }

    /// Returns the user's active match, assigning one when none is active.
    ///
    /// Matches still open for picks are assigned first; a locked match is
    /// handed out only when no open one remains. A user holding a locked
    /// match without a pick on it is moved to an open match when one exists.
    ///
    /// Returns `Ok(None)` for eliminated users and when no match is
    /// assignable.
    pub fn current_match(&self, user_id: UserId) -> ServiceResult<Option<Match>> {
        let mut user = self.require_user(user_id)?;
        if !user.is_alive {
            return Ok(None);
        }
        let now = (self.clock)();

        let mut stuck = None;
        if let Some(match_id) = user.current_match_id.clone() {
            if let Some(game) = self.repo.get_match(&match_id)? {
                if !game.is_completed() {
                    if self.is_open(&game, now)
                        || self.repo.get_pick(user_id, &game.id)?.is_some()
                    {
                        return Ok(Some(game));
                    }
                    stuck = Some(game);
                }
            }
        }

        let pool = self
            .repo
            .list_assignable_matches(user_id, self.config.max_users_per_match)?;
        let open: Vec<Match> = pool
            .iter()
            .filter(|game| self.is_open(game, now))
            .cloned()
            .collect();
        let candidates = if !open.is_empty() {
            open
        } else if let Some(game) = stuck {
            return Ok(Some(game));
        } else {
            pool
        };

        let prior = self.repo.count_assignments(user_id)?;
        let Some(chosen) = choose_match(&candidates, user_id, &self.config.assignment_salt, prior)
        else {
            if user.current_match_id.take().is_some() {
                self.repo.update_user(&user)?;
            }
            info!(
                "event=match_assign module=service status=empty user_id={user_id} pool_size=0"
            );
            return Ok(None);
        };

        self.repo.assign_match(user_id, &chosen.id, now)?;
        info!(
            "event=match_assign module=service status=ok user_id={user_id} match_id={} pool_size={}",
            chosen.id,
            candidates.len()
        );
        Ok(Some(chosen.clone()))
    }

    /// Records the user's pick for their active match.
    pub fn submit_pick(&self, user_id: UserId, match_id: &str, team: &str) -> ServiceResult<Pick> {
        let user = self.require_user(user_id)?;
        let game = self.require_match(match_id)?;

        let result = self.check_pick(&user, &game, team).and_then(|()| {
            let pick = Pick::new(user_id, game.id.clone(), team.trim(), (self.clock)());
            match self.repo.create_pick(&pick) {
                Ok(()) => Ok(pick),
                Err(RepoError::Conflict(_)) => Err(SurvivorServiceError::DuplicatePick {
                    user_id,
                    match_id: game.id.clone(),
                }),
                Err(err) => Err(err.into()),
            }
        });

        match &result {
            Ok(_) => info!(
                "event=pick_submit module=service status=ok user_id={user_id} match_id={}",
                game.id
            ),
            Err(err) => warn!(
                "event=pick_submit module=service status=rejected user_id={user_id} match_id={} error={err}",
                game.id
            ),
        }
        result
    }

    /// Declares the winner of a match and scores every pick on it.
    pub fn complete_match(&self, match_id: &str, winner: &str) -> ServiceResult<CompletionReport> {
        let game = self.require_match(match_id)?;
        if game.is_completed() {
            return Err(SurvivorServiceError::MatchAlreadyCompleted(game.id));
        }
        let winner = winner.trim();
        if !game.has_team(winner) {
            return Err(SurvivorServiceError::InvalidTeam {
                match_id: game.id,
                team: winner.to_string(),
            });
        }

        let picks = self.repo.list_picks(&PickListQuery {
            user_id: None,
            match_id: Some(game.id.clone()),
        })?;
        let scored_picks = score_picks(picks, winner);
        let users = self.repo.list_users()?;
        let outcome = apply_completion(users.clone(), &game, &scored_picks, (self.clock)());

        let mut completed = game;
        completed.status = MatchStatus::Completed;
        completed.winner = Some(winner.to_string());

        let completion = MatchCompletion {
            completed,
            scored_picks,
            users: changed_users(&users, outcome.users),
        };
        match self.repo.record_completion(&completion) {
            Ok(()) => {}
            Err(RepoError::Conflict(_)) => {
                return Err(SurvivorServiceError::MatchAlreadyCompleted(
                    completion.completed.id,
                ));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=match_complete module=service status=ok match_id={} picks={} winners={} eliminated={} cleared={}",
            completion.completed.id,
            completion.scored_picks.len(),
            outcome.winners.len(),
            outcome.eliminated.len(),
            outcome.cleared.len()
        );
        Ok(CompletionReport {
            match_id: completion.completed.id,
            winner: winner.to_string(),
            winners: outcome.winners,
            eliminated: outcome.eliminated,
            cleared: outcome.cleared.len(),
        })
    }

    /// Users ordered by rank.
    pub fn leaderboard(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.list_users_ranked()?)
    }

    /// Pick history of one user, oldest first.
    pub fn user_picks(&self, user_id: UserId) -> ServiceResult<Vec<Pick>> {
        self.require_user(user_id)?;
        Ok(self.repo.list_picks(&PickListQuery {
            user_id: Some(user_id),
            match_id: None,
        })?)
    }

    pub fn user_stats(&self, user_id: UserId) -> ServiceResult<UserStats> {
        let user = self.require_user(user_id)?;
        let picks = self.repo.list_picks(&PickListQuery {
            user_id: Some(user_id),
            match_id: None,
        })?;
        let count = |outcome: PickOutcome| picks.iter().filter(|p| p.outcome() == outcome).count();
        Ok(UserStats {
            total_picks: picks.len(),
            wins: count(PickOutcome::Win),
            losses: count(PickOutcome::Loss),
            pending: count(PickOutcome::Pending),
            user,
        })
    }

    pub fn list_matches(&self, query: &MatchListQuery) -> ServiceResult<Vec<Match>> {
        Ok(self.repo.list_matches(query)?)
    }

    /// Adds one upcoming match to the schedule.
    pub fn add_match(&self, game: Match) -> ServiceResult<Match> {
        game.validate().map_err(SurvivorServiceError::InvalidMatch)?;
        if game.is_completed() {
            return Err(SurvivorServiceError::InvalidMatch(
                ValidationError::WinnerStatusMismatch,
            ));
        }
        match self.repo.create_match(&game) {
            Ok(_) => Ok(game),
            Err(RepoError::Conflict(_)) => Err(SurvivorServiceError::DuplicateMatch(game.id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Validates every draft, then inserts them all or none.
    pub fn import_schedule(&self, drafts: Vec<MatchDraft>) -> ServiceResult<usize> {
        let mut games = Vec::with_capacity(drafts.len());
        let mut seen = HashSet::new();
        for (index, draft) in drafts.into_iter().enumerate() {
            let game = draft
                .into_match()
                .map_err(|source| SurvivorServiceError::InvalidSchedule { index, source })?;
            if !seen.insert(game.id.clone()) {
                return Err(SurvivorServiceError::DuplicateMatch(game.id));
            }
            games.push(game);
        }

        let inserted = match self.repo.create_matches(&games) {
            Ok(count) => count,
            Err(RepoError::Conflict(what)) => {
                let id = what.strip_prefix("match:").unwrap_or(&what).to_string();
                return Err(SurvivorServiceError::DuplicateMatch(id));
            }
            Err(err) => return Err(err.into()),
        };
        info!("event=schedule_import module=service status=ok matches={inserted}");
        Ok(inserted)
    }

    fn check_pick(&self, user: &User, game: &Match, team: &str) -> ServiceResult<()> {
        if !user.is_alive {
            return Err(SurvivorServiceError::UserEliminated(user.id));
        }
        if game.is_completed() {
            return Err(SurvivorServiceError::MatchAlreadyCompleted(game.id.clone()));
        }
        if self.repo.get_pick(user.id, &game.id)?.is_some() {
            return Err(SurvivorServiceError::DuplicatePick {
                user_id: user.id,
                match_id: game.id.clone(),
            });
        }
        if user.current_match_id.as_deref() != Some(game.id.as_str()) {
            return Err(SurvivorServiceError::NotAssigned {
                user_id: user.id,
                match_id: game.id.clone(),
            });
        }
        if !game.has_team(team.trim()) {
            return Err(SurvivorServiceError::InvalidTeam {
                match_id: game.id.clone(),
                team: team.trim().to_string(),
            });
        }
        if !self.is_open(game, (self.clock)()) {
            let lock_at = game.pick_lock_at(self.config.lock_minutes_before);
            return Err(SurvivorServiceError::PickLocked {
                match_id: game.id.clone(),
                lock_at,
            });
        }
        Ok(())
    }

    fn is_open(&self, game: &Match, now: i64) -> bool {
        now < game.pick_lock_at(self.config.lock_minutes_before)
    }

    fn refresh_ranks(&self) -> ServiceResult<()> {
        let mut users = self.repo.list_users()?;
        let before: Vec<u32> = users.iter().map(|user| user.rank).collect();
        assign_ranks(&mut users);
        let changed: Vec<(UserId, u32)> = users
            .iter()
            .zip(before)
            .filter(|(user, old)| user.rank != *old)
            .map(|(user, _)| (user.id, user.rank))
            .collect();
        if !changed.is_empty() {
            self.repo.update_ranks(&changed)?;
        }
        Ok(())
    }

    fn require_user(&self, user_id: UserId) -> ServiceResult<User> {
        self.repo
            .get_user(user_id)?
            .ok_or(SurvivorServiceError::UserNotFound(user_id))
    }

    fn require_match(&self, match_id: &str) -> ServiceResult<Match> {
        let match_id = match_id.trim();
        self.repo
            .get_match(match_id)?
            .ok_or_else(|| SurvivorServiceError::MatchNotFound(match_id.to_string()))
    }
}

/// Resolves a login that lost the insert race; a conflict with no visible
/// row stays a conflict.
fn concurrent_login(existing: Option<User>, conflict: String) -> ServiceResult<User> {
    existing.ok_or(SurvivorServiceError::Repo(RepoError::Conflict(conflict)))
}

#[cfg(test)]
mod tests {
    use super::{concurrent_login, SurvivorServiceError};
    use crate::model::user::User;
    use crate::repo::error::RepoError;

    #[test]
    fn lost_login_race_returns_the_winning_row() {
        let user = User::new("a@x.io", 1);
        let resolved = concurrent_login(Some(user.clone()), "user:a@x.io".to_string()).unwrap();
        assert_eq!(resolved, user);
    }

    #[test]
    fn lost_login_race_without_row_reports_conflict() {
        let err = concurrent_login(None, "user:a@x.io".to_string()).unwrap_err();
        match err {
            SurvivorServiceError::Repo(RepoError::Conflict(what)) => {
                assert_eq!(what, "user:a@x.io")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
