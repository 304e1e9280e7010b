use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" for the `now()` builtin. A trait rather than a direct
/// `std::time` call so interpreter tests can assert on a fixed tick
/// sequence instead of the wall clock.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The default clock, backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(i64);
    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn fixed_clock_returns_configured_value() {
        let c = FixedClock(12345);
        assert_eq!(c.now_millis(), 12345);
    }

    #[test]
    fn system_clock_returns_positive_value() {
        let c = SystemClock;
        assert!(c.now_millis() > 0);
    }
}
