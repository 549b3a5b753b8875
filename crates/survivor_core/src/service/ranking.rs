//! Pick scoring and leaderboard ranking.
//!
//! # Invariants
//! - Ranks form a strict total order `1..=n`.
//! - Higher win count always ranks better; equal wins keep insertion order.

use crate::model::game_match::Match;
use crate::model::pick::Pick;
use crate::model::user::{User, UserId};

/// Result of applying one completed match to the user set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Every user, re-ranked, in the input order.
    pub users: Vec<User>,
    pub winners: Vec<UserId>,
    pub eliminated: Vec<UserId>,
    /// Users whose active match reference was cleared.
    pub cleared: Vec<UserId>,
}

/// Sets `is_correct` on every pick against the declared winner.
pub fn score_picks(picks: Vec<Pick>, winner: &str) -> Vec<Pick> {
    picks
        .into_iter()
        .map(|mut pick| {
            pick.is_correct = Some(pick.picked_team == winner);
            pick
        })
        .collect()
}

/// Applies scored picks of `game` to `users` (insertion order) and re-ranks.
pub fn apply_completion(
    mut users: Vec<User>,
    game: &Match,
    scored_picks: &[Pick],
    completed_at: i64,
) -> CompletionOutcome {
    let mut winners = Vec::new();
    let mut eliminated = Vec::new();
    let mut cleared = Vec::new();

    for user in &mut users {
        let pick = scored_picks.iter().find(|pick| pick.user_id == user.id);
        match pick.and_then(|pick| pick.is_correct) {
            Some(true) => {
                user.wins += 1;
                winners.push(user.id);
            }
            Some(false) => {
                user.losses += 1;
                if user.is_alive {
                    user.eliminate(&game.stage, completed_at);
                    eliminated.push(user.id);
                }
            }
            None => {}
        }
        if user.current_match_id.as_deref() == Some(game.id.as_str()) {
            user.current_match_id = None;
            cleared.push(user.id);
        }
    }

    assign_ranks(&mut users);
    CompletionOutcome {
        users,
        winners,
        eliminated,
        cleared,
    }
}

/// Keeps the rows of `after` that differ from the same position in `before`.
pub fn changed_users(before: &[User], after: Vec<User>) -> Vec<User> {
    after
        .into_iter()
        .zip(before)
        .filter(|(updated, original)| updated != *original)
        .map(|(updated, _)| updated)
        .collect()
}

/// Assigns ranks by descending wins. `users` must be in insertion order.
pub fn assign_ranks(users: &mut [User]) {
    let mut order: Vec<usize> = (0..users.len()).collect();
    order.sort_by(|&left, &right| users[right].wins.cmp(&users[left].wins));
    for (position, index) in order.into_iter().enumerate() {
        users[index].rank = position as u32 + 1;
    }
}
