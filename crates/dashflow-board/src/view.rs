//! Serializable view models handed to the rendering layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::Reading;

pub const CHART_TITLE: &str = "Temperature Over Time";
pub const TABLE_COLUMNS: [&str; 3] = ["date", "temperature", "category"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Reading>,
}

impl TableView {
    pub fn new(rows: &[Reading]) -> Self {
        Self {
            columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub date: NaiveDate,
    pub temperature: f64,
}

/// Points sharing one category, and therefore one color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub category: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
}

/// Scatter plot of temperature against date, one series per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: String,
    pub y: String,
    pub color: String,
    pub series: Vec<Series>,
}

impl ChartSpec {
    /// Series are ordered by category name; points keep dataset order.
    pub fn scatter(rows: &[Reading]) -> Self {
        let mut by_category: BTreeMap<&str, Vec<Point>> = BTreeMap::new();
        for r in rows {
            by_category.entry(r.category.as_str()).or_default().push(Point {
                date: r.date,
                temperature: r.temperature,
            });
        }
        Self {
            kind: ChartKind::Scatter,
            title: CHART_TITLE.to_string(),
            x: "date".to_string(),
            y: "temperature".to_string(),
            color: "category".to_string(),
            series: by_category
                .into_iter()
                .map(|(category, points)| Series {
                    category: category.to_string(),
                    points,
                })
                .collect(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

/// Everything the page shows for one set of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    pub title: String,
    pub current_date: String,
    pub mean_temperature: String,
    pub table: TableView,
    /// `None` when the chart panel is hidden.
    pub chart: Option<ChartSpec>,
}
