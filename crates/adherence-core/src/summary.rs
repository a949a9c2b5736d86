//! Rolling-window summary of a single medication's dose log

use crate::window::DayWindow;
use crate::{DayKey, DoseLogEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub total_doses: u32,
    pub days_with_dose: u32,
    pub adherence_percent: u8,
    /// Consecutive dosed days ending today.
    pub streak: u32,
    pub longest_streak: u32,
    pub doses_per_day: BTreeMap<DayKey, u32>,
}

/// Summarize `logs` over the last `window_days` days ending at `now`.
///
/// A zero-length window yields an all-zero summary.
pub fn summarize(logs: &[DoseLogEntry], window_days: u32, now: DateTime<Utc>) -> WindowSummary {
    let window = DayWindow::ending_at(now, window_days);
    if window.is_empty() {
        return WindowSummary::default();
    }

    summary_from_counts(count_doses_per_day(logs, &window), &window)
}

/// `round(days_with_dose / window_days * 100)`, rounding halves up.
pub fn adherence_percent(days_with_dose: u32, window_days: u32) -> u8 {
    if window_days == 0 {
        return 0;
    }
    let days = u64::from(days_with_dose.min(window_days));
    let window = u64::from(window_days);
    ((days * 200 + window) / (2 * window)) as u8
}

pub(crate) fn count_doses_per_day(
    logs: &[DoseLogEntry],
    window: &DayWindow,
) -> BTreeMap<DayKey, u32> {
    let mut counts = BTreeMap::new();
    for log in logs {
        if let Some(day) = window.key_of(&log.taken_at) {
            let count: &mut u32 = counts.entry(day).or_default();
            *count = count.saturating_add(1);
        }
    }
    counts
}

fn summary_from_counts(doses_per_day: BTreeMap<DayKey, u32>, window: &DayWindow) -> WindowSummary {
    let total_doses = doses_per_day
        .values()
        .fold(0u32, |acc, n| acc.saturating_add(*n));
    let days_with_dose = doses_per_day.len() as u32;

    WindowSummary {
        total_doses,
        days_with_dose,
        adherence_percent: adherence_percent(days_with_dose, window.len()),
        streak: current_streak(&doses_per_day, window),
        longest_streak: longest_streak(&doses_per_day, window),
        doses_per_day,
    }
}

fn current_streak(doses_per_day: &BTreeMap<DayKey, u32>, window: &DayWindow) -> u32 {
    let mut streak = 0u32;
    let mut check_day = window.end();

    while streak < window.len() && doses_per_day.contains_key(&check_day) {
        streak += 1;
        check_day = check_day.previous();
    }

    streak
}

fn longest_streak(doses_per_day: &BTreeMap<DayKey, u32>, window: &DayWindow) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;

    for day in window.days() {
        if doses_per_day.contains_key(&day) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    longest
}
