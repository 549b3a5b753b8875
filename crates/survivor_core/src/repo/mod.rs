//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for users, matches and picks.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Multi-row writes commit atomically or not at all.

pub mod error;
pub mod match_repo;
pub mod pick_repo;
pub mod sqlite;
pub mod user_repo;

use match_repo::MatchRepository;
use pick_repo::PickRepository;
use user_repo::UserRepository;

/// Combined storage contract consumed by the game service.
pub trait GameRepository: UserRepository + MatchRepository + PickRepository {}

impl<T: UserRepository + MatchRepository + PickRepository> GameRepository for T {}
