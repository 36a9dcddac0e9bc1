use chrono::NaiveDate;
use dashflow_eval::EvalConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::BoardResult;

/// Slider, date picker, and checkbox settings for the dashboard, plus the
/// engine configuration. Every field has a default, so a JSON file only
/// needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub temperature_default: f64,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub show_chart: bool,
    /// Pins the "Current Date" box. Unset means the host supplies it, or
    /// the local clock with the `system-clock` feature.
    pub today: Option<NaiveDate>,
    pub eval: EvalConfig,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Custom Dashboard App".to_string(),
            temperature_min: 0.0,
            temperature_max: 100.0,
            temperature_default: 50.0,
            date_min: ymd(2023, 1, 1),
            date_max: ymd(2024, 12, 31),
            date_start: ymd(2023, 1, 1),
            date_end: ymd(2024, 12, 31),
            show_chart: true,
            today: None,
            eval: EvalConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> BoardResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> BoardResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
