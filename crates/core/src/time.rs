use chrono::{DateTime, Utc};

/// Timestamp source for `created_at` and session start/finish times.
///
/// A pinned clock always reports the same instant; an unpinned one reads the
/// system time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pinned: Option<DateTime<Utc>>,
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self { pinned: None }
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self { pinned: Some(at) }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.pinned.unwrap_or_else(Utc::now)
    }
}

/// 2023-11-14T22:13:20Z, the instant every test clock reports.
///
/// # Panics
///
/// Never for this constant timestamp.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("constant timestamp is in range")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
