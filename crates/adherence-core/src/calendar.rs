use crate::window::DayWindow;
use crate::{DayKey, DoseLogEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub day_key: DayKey,
    pub label: String,
    pub taken: bool,
}

/// One entry per day for the last `days_to_show` days, oldest first.
pub fn build_calendar(
    logs: &[DoseLogEntry],
    days_to_show: u32,
    now: DateTime<Utc>,
) -> Vec<CalendarDay> {
    let window = DayWindow::ending_at(now, days_to_show);
    let taken_days: HashSet<DayKey> = logs
        .iter()
        .filter_map(|log| window.key_of(&log.taken_at))
        .collect();

    window
        .days()
        .map(|day| CalendarDay {
            day_key: day,
            label: day.label(),
            taken: taken_days.contains(&day),
        })
        .collect()
}
