//! Clock port: source of record timestamps.

use chrono::{DateTime, FixedOffset, Utc};

/// Wall clock in a fixed, configured offset.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// System time viewed in the configured offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<FixedOffset>,
}

impl FixedClock {
    #[must_use]
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_uses_offset() {
        let offset = FixedOffset::east_opt(8 * 3600).expect("valid offset");
        let clock = SystemClock::new(offset);
        assert_eq!(clock.now().offset().local_minus_utc(), 8 * 3600);
    }
}
