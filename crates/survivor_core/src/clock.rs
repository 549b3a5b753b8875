//! Wall-clock source used by the game service.

use chrono::Utc;

/// Signature of a clock returning Unix epoch milliseconds.
pub type Clock = fn() -> i64;

/// Current UTC time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
