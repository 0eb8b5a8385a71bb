// warden-core/src/infrastructure/clock.rs

use crate::domain::ports::clock::Clock;
use chrono::{DateTime, Utc};

pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Wall clock, unless `SOURCE_DATE_EPOCH` pins the time for reproducible reports.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    pinned: Option<DateTime<Utc>>,
}

impl SystemClock {
    pub fn from_env() -> Self {
        Self::from_epoch_var(std::env::var(SOURCE_DATE_EPOCH).ok().as_deref())
    }

    /// An unparsable value is ignored and the wall clock is used.
    pub fn from_epoch_var(value: Option<&str>) -> Self {
        let pinned = value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        Self { pinned }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        self.pinned.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_pins_the_clock() {
        let clock = SystemClock::from_epoch_var(Some("1700000000"));
        assert_eq!(clock.now().timestamp(), 1_700_000_000);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_garbage_epoch_falls_back_to_wall_clock() {
        let before = Utc::now();
        let clock = SystemClock::from_epoch_var(Some("yesterday"));
        assert!(clock.now() >= before);
    }
}
