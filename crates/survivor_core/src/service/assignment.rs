//! Deterministic match assignment.
//!
//! The same user, salt and assignment count always land on the same match,
//! so refreshing cannot be used to reroll a match-up.

use crate::model::game_match::Match;
use crate::model::user::UserId;

/// Picks one match from `pool`, or `None` when the pool is empty.
///
/// `pool` must already be in a stable order (`start_time, id`).
pub fn choose_match<'a>(
    pool: &'a [Match],
    user_id: UserId,
    salt: &str,
    prior_assignments: u32,
) -> Option<&'a Match> {
    if pool.is_empty() {
        return None;
    }
    let seed = format!("{user_id}|{salt}|{prior_assignments}");
    let digest = blake3::hash(seed.as_bytes());
    let mut head = [0_u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    let index = u64::from_le_bytes(head) % pool.len() as u64;
    pool.get(index as usize)
}

#[cfg(test)]
mod tests {
    use super::choose_match;
    use crate::model::game_match::Match;
    use uuid::Uuid;

    fn pool() -> Vec<Match> {
        (0..5)
            .map(|i| Match::new(format!("M-{i}"), "A", "B", "Groups", i64::from(i)))
            .collect()
    }

    #[test]
    fn empty_pool_yields_none() {
        assert!(choose_match(&[], Uuid::new_v4(), "salt", 0).is_none());
    }

    #[test]
    fn choice_is_reproducible() {
        let pool = pool();
        let user = Uuid::new_v4();
        let first = choose_match(&pool, user, "salt", 0).unwrap();
        let second = choose_match(&pool, user, "salt", 0).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn single_match_pool_always_yields_it() {
        let pool = vec![Match::new("only", "A", "B", "Final", 0)];
        for _ in 0..10 {
            let chosen = choose_match(&pool, Uuid::new_v4(), "salt", 3).unwrap();
            assert_eq!(chosen.id, "only");
        }
    }
}
