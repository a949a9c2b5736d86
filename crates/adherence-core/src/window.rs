use crate::DayKey;
use chrono::{DateTime, Utc};

/// The trailing "last N days including today" window.
///
/// A dose belongs to the window when its day key is no older than the first
/// window day and it was not taken after `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    now: DateTime<Utc>,
    start: DayKey,
    end: DayKey,
    len: u32,
}

impl DayWindow {
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        let end = DayKey::from_instant(&now);
        Self {
            now,
            start: end.days_before(days.saturating_sub(1)),
            end,
            len: days,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> DayKey {
        self.end
    }

    /// Day key of `instant` if it falls inside the window.
    pub fn key_of(&self, instant: &DateTime<Utc>) -> Option<DayKey> {
        if self.is_empty() || *instant > self.now {
            return None;
        }
        let key = DayKey::from_instant(instant);
        (key >= self.start).then_some(key)
    }

    /// Every day of the window, oldest first.
    pub fn days(&self) -> impl Iterator<Item = DayKey> + '_ {
        (0..self.len).rev().map(move |back| self.end.days_before(back))
    }
}
