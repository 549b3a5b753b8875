//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the game's four operations.
//! - Keep assignment and scoring rules in pure, storage-free functions.

pub mod assignment;
pub mod ranking;
pub mod survivor_service;
