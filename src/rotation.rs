//! # Archive Rotation
//!
//! Decides when the current archive's hour bucket is over.
//!
//! The first deadline is the start of the hour following startup. Every
//! later deadline is exactly one hour after the previous one, so a stalled
//! device delays a rotation but never shifts the schedule.

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Length of one archive bucket
pub fn rotation_interval() -> Duration {
    Duration::hours(1)
}

/// Hourly rotation deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationScheduler {
    checkpoint: DateTime<Utc>,
}

impl RotationScheduler {
    /// Create a scheduler whose first deadline is the next full hour after `now`
    ///
    /// A start exactly on the hour still waits a full hour.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            checkpoint: truncate_to_hour(now) + rotation_interval(),
        }
    }

    /// Whether the current bucket has elapsed at `now`
    pub fn should_rotate(&self, now: DateTime<Utc>) -> bool {
        now >= self.checkpoint
    }

    /// Move the deadline forward by one bucket
    pub fn advance(&mut self) {
        self.checkpoint = self.checkpoint + rotation_interval();
    }

    /// Current deadline
    pub fn checkpoint(&self) -> DateTime<Utc> {
        self.checkpoint
    }
}

fn truncate_to_hour(time: DateTime<Utc>) -> DateTime<Utc> {
    // Only fails for timestamps outside the i64 nanosecond range (after 2262)
    time.duration_trunc(Duration::hours(1)).unwrap_or(time)
}
