use thiserror::Error;

/// Longest window or calendar the engine accepts from callers (ten years).
pub const MAX_WINDOW_DAYS: i64 = 3660;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdherenceError {
    #[error("window size must be between 1 and {MAX_WINDOW_DAYS} days, got {0}")]
    InvalidWindowSize(i64),

    #[error("chart window must be 7 or 30 days, got {0}")]
    UnsupportedChartWindow(u32),
}

pub type Result<T> = std::result::Result<T, AdherenceError>;

/// Check a caller-supplied window or calendar length before invoking the engine.
pub fn validate_window_days(days: i64) -> Result<u32> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AdherenceError::InvalidWindowSize(days));
    }
    Ok(days as u32)
}
