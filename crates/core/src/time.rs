use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Returns today's calendar date according to the clock (UTC).
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Midnight at the start of `date`, as a UTC instant.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Midnight at the start of the Monday-based week containing `date`.
#[must_use]
pub fn start_of_week(date: NaiveDate) -> DateTime<Utc> {
    let days_since_monday = i64::from(date.weekday().num_days_from_monday());
    start_of_day(date - Duration::days(days_since_monday))
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn fixed_clock_is_deterministic() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), fixed_now());
        assert!(clock.is_fixed());
    }

    #[test]
    fn advance_moves_fixed_clock_only() {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), fixed_now() + Duration::days(1));

        let mut real = Clock::default_clock();
        real.advance(Duration::days(1));
        assert!(!real.is_fixed());
    }

    #[test]
    fn start_of_week_lands_on_monday() {
        // 2023-11-14 is a Tuesday.
        let date = fixed_now().date_naive();
        assert_eq!(date.weekday(), Weekday::Tue);

        let monday = start_of_week(date);
        assert_eq!(monday.date_naive().weekday(), Weekday::Mon);
        assert_eq!(monday.date_naive(), date - Duration::days(1));
    }

    #[test]
    fn start_of_week_is_identity_on_monday() {
        let monday = NaiveDate::from_ymd_opt(2023, 11, 13).unwrap();
        assert_eq!(start_of_week(monday).date_naive(), monday);
    }
}
