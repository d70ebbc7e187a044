//! Wall clock abstraction so timestamps and rotation can be tested

use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

/// Source of the current UTC time
#[cfg_attr(test, automock)]
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
