//! Domain model for the survivor game.
//!
//! # Responsibility
//! - Define the three record kinds the game is built on: users, matches and picks.
//! - Keep validation rules next to the records they protect.
//!
//! # Invariants
//! - Users are identified by a stable `UserId`; matches by a schedule-provided `MatchId`.
//! - A user holds at most one active match reference.
//! - A user holds at most one pick per match.

pub mod game_match;
pub mod pick;
pub mod user;
pub mod validation;
