#![deny(clippy::all)]

mod aggregator;
mod calendar;
mod day_key;
mod error;
mod history;
mod summary;
mod window;

pub use aggregator::*;
pub use calendar::*;
pub use day_key::*;
pub use error::*;
pub use history::*;
pub use summary::*;
pub use window::DayWindow;

use chrono::{DateTime, Utc};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Opaque identifier as handed out by the backing store: either an integer
/// row id or a string key.
///
/// Integers order before strings so that maps keyed by identifiers iterate
/// deterministically.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Text(String),
}

pub type MedicationId = Identifier;
pub type LogId = Identifier;

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

/// Numeric strings become `Int` so that `"12"` typed on a command line
/// matches a record stored with id `12`.
impl FromStr for Identifier {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => Identifier::Int(n),
            Err(_) => Identifier::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Int(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

/// A single "dose taken" event. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseLogEntry {
    pub id: LogId,
    pub medication_id: MedicationId,
    pub taken_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DoseLogEntry {
    pub fn new(
        id: impl Into<LogId>,
        medication_id: impl Into<MedicationId>,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            medication_id: medication_id.into(),
            taken_at,
            note: None,
        }
    }

    pub fn day_key(&self) -> DayKey {
        DayKey::from_instant(&self.taken_at)
    }
}
