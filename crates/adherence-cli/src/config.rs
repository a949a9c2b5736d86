use adherence_core::{validate_window_days, ChartWindow};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_ENV: &str = "ADHERENCE_CONFIG";
pub const LOGS_ENV: &str = "ADHERENCE_LOGS";
pub const WINDOW_DAYS_ENV: &str = "ADHERENCE_WINDOW_DAYS";
pub const CALENDAR_DAYS_ENV: &str = "ADHERENCE_CALENDAR_DAYS";

/// Settings read from `config.toml`.
///
/// Every value resolves as: command-line flag, then environment variable,
/// then config file, then built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdherenceConfig {
    pub window_days: i64,
    pub calendar_days: i64,
    pub chart_window: String,
    pub logs: Option<PathBuf>,
}

impl Default for AdherenceConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            calendar_days: 14,
            chart_window: ChartWindow::Week.as_str().to_string(),
            logs: None,
        }
    }
}

impl AdherenceConfig {
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("adherence").join("config.toml"))
    }

    /// Load the user's config, falling back to defaults when it is missing.
    /// A config file that exists but cannot be parsed is reported and ignored.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Err(err) => {
                warn!("ignoring invalid config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn window_days(&self, flag: Option<i64>) -> Result<u32> {
        let days = resolve_days(flag, WINDOW_DAYS_ENV, self.window_days);
        Ok(validate_window_days(days)?)
    }

    pub fn calendar_days(&self, flag: Option<i64>) -> Result<u32> {
        let days = resolve_days(flag, CALENDAR_DAYS_ENV, self.calendar_days);
        Ok(validate_window_days(days)?)
    }

    pub fn chart_window(&self, flag: Option<&str>) -> Result<ChartWindow> {
        let raw = flag.unwrap_or(&self.chart_window);
        Ok(raw.parse::<ChartWindow>()?)
    }

    pub fn logs_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| std::env::var_os(LOGS_ENV).map(PathBuf::from))
            .or_else(|| self.logs.clone())
            .ok_or_else(|| {
                anyhow!("no dose log source given; pass --logs, set {LOGS_ENV}, or set `logs` in config.toml")
            })
    }
}

fn resolve_days(flag: Option<i64>, env_var: &str, configured: i64) -> i64 {
    if let Some(days) = flag {
        return days;
    }

    match std::env::var(env_var) {
        Ok(value) => match value.trim().parse() {
            Ok(days) => days,
            Err(_) => {
                warn!("ignoring {}={:?}: not a number", env_var, value);
                configured
            }
        },
        Err(_) => configured,
    }
}
