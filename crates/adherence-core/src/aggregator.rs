//! Parallel aggregation across medications
//!
//! Uses rayon for parallel map-reduce over per-medication log sets. Only
//! sums and maxima are combined, so results do not depend on scheduling.

use crate::summary::{adherence_percent, summarize, WindowSummary};
use crate::window::DayWindow;
use crate::{AdherenceError, DayKey, DoseLogEntry, MedicationId};
use chrono::{DateTime, Datelike, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub type LogsByMedication = BTreeMap<MedicationId, Vec<DoseLogEntry>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRollup {
    pub total_doses: u32,
    pub active_medication_count: u32,
    pub best_streak: u32,
    pub adherence_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSummary {
    pub medication_id: MedicationId,
    pub summary: WindowSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub day_key: DayKey,
    pub label: String,
    pub doses: u32,
}

pub type ChartSeries = Vec<ChartPoint>;

/// Which medications a chart series covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChartFilter {
    #[default]
    All,
    Medication(MedicationId),
}

impl ChartFilter {
    pub fn matches(&self, medication_id: &MedicationId) -> bool {
        match self {
            ChartFilter::All => true,
            ChartFilter::Medication(id) => id == medication_id,
        }
    }
}

impl FromStr for ChartFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(ChartFilter::All);
        }
        Ok(ChartFilter::Medication(s.parse()?))
    }
}

impl fmt::Display for ChartFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartFilter::All => f.write_str("all"),
            ChartFilter::Medication(id) => write!(f, "{}", id),
        }
    }
}

/// Chart windows offered to dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChartWindow {
    #[default]
    Week,
    Month,
}

impl ChartWindow {
    pub fn days(&self) -> u32 {
        match self {
            ChartWindow::Week => 7,
            ChartWindow::Month => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartWindow::Week => "week",
            ChartWindow::Month => "month",
        }
    }

    /// Weekday names for a week, numeric month/day for a month.
    pub fn label(&self, day: DayKey) -> String {
        let date = day.date();
        match self {
            ChartWindow::Week => date.format("%a").to_string(),
            ChartWindow::Month => format!("{}/{}", date.month(), date.day()),
        }
    }
}

impl TryFrom<u32> for ChartWindow {
    type Error = AdherenceError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(ChartWindow::Week),
            30 => Ok(ChartWindow::Month),
            other => Err(AdherenceError::UnsupportedChartWindow(other)),
        }
    }
}

impl FromStr for ChartWindow {
    type Err = AdherenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" | "7" => Ok(ChartWindow::Week),
            "month" | "30" => Ok(ChartWindow::Month),
            other => Err(AdherenceError::UnsupportedChartWindow(
                other.parse().unwrap_or(0),
            )),
        }
    }
}

/// Window summary for every medication, ordered by medication id.
pub fn summarize_each(
    logs_by_medication: &LogsByMedication,
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<MedicationSummary> {
    let mut summaries: Vec<MedicationSummary> = logs_by_medication
        .par_iter()
        .map(|(medication_id, logs)| MedicationSummary {
            medication_id: medication_id.clone(),
            summary: summarize(logs, window_days, now),
        })
        .collect();

    summaries.sort_by(|a, b| a.medication_id.cmp(&b.medication_id));
    summaries
}

/// Cross-medication rollup over the last `window_days` days ending at `now`.
///
/// Days are counted over the union of all medications: a day with doses of
/// two different medications counts once toward adherence.
pub fn aggregate(
    logs_by_medication: &LogsByMedication,
    window_days: u32,
    now: DateTime<Utc>,
) -> AggregateRollup {
    let active_medication_count = logs_by_medication
        .values()
        .filter(|logs| !logs.is_empty())
        .count() as u32;

    let window = DayWindow::ending_at(now, window_days);
    if window.is_empty() {
        return AggregateRollup {
            active_medication_count,
            ..AggregateRollup::default()
        };
    }

    let best_streak = summarize_each(logs_by_medication, window_days, now)
        .iter()
        .map(|m| m.summary.streak)
        .max()
        .unwrap_or(0);

    let union_counts = doses_per_day(logs_by_medication.par_iter().map(|(_, logs)| logs), &window);
    let days_with_any_dose = union_counts.len() as u32;
    let total_doses = union_counts.values().fold(0u32, |acc, n| acc.saturating_add(*n));

    debug!(
        medications = logs_by_medication.len(),
        active_medication_count,
        days_with_any_dose,
        total_doses,
        "aggregated dose logs"
    );

    AggregateRollup {
        total_doses,
        active_medication_count,
        best_streak,
        adherence_percent: adherence_percent(days_with_any_dose, window.len()),
    }
}

/// Per-day dose counts for charting, oldest first, one point per day.
pub fn chart_series(
    logs_by_medication: &LogsByMedication,
    filter: &ChartFilter,
    chart_window: ChartWindow,
    now: DateTime<Utc>,
) -> ChartSeries {
    let window = DayWindow::ending_at(now, chart_window.days());
    let counts = doses_per_day(
        logs_by_medication
            .par_iter()
            .filter(|(medication_id, _)| filter.matches(medication_id))
            .map(|(_, logs)| logs),
        &window,
    );

    debug!(
        filter = %filter,
        window = chart_window.as_str(),
        dosed_days = counts.len(),
        "built chart series"
    );

    window
        .days()
        .map(|day| ChartPoint {
            day_key: day,
            label: chart_window.label(day),
            doses: counts.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

fn doses_per_day<'a, I>(log_sets: I, window: &DayWindow) -> HashMap<DayKey, u32>
where
    I: ParallelIterator<Item = &'a Vec<DoseLogEntry>>,
{
    let capacity = window.len() as usize;

    log_sets
        .fold(
            || HashMap::with_capacity(capacity),
            |mut acc: HashMap<DayKey, u32>, logs| {
                for log in logs {
                    if let Some(day) = window.key_of(&log.taken_at) {
                        let count = acc.entry(day).or_default();
                        *count = count.saturating_add(1);
                    }
                }
                acc
            },
        )
        .reduce(
            || HashMap::with_capacity(capacity),
            |mut a, b| {
                for (day, n) in b {
                    let count = a.entry(day).or_default();
                    *count = count.saturating_add(n);
                }
                a
            },
        )
}
