//! Immutable temperature readings, loaded once before a dashboard starts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use crate::error::BoardResult;

/// One CSV row: `date,temperature,category`. Dates are `%Y-%m-%d`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub date: NaiveDate,
    pub temperature: f64,
    pub category: String,
}

/// Shared handle to the readings. Cloning is a reference-count bump; the
/// rows are never mutated after loading.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Arc<[Reading]>,
}

impl Dataset {
    pub fn new(rows: Vec<Reading>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> BoardResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse CSV with a header row. Extra columns are ignored; a malformed
    /// row fails the whole load.
    pub fn from_reader<R: Read>(reader: R) -> BoardResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let rows = rdr
            .deserialize::<Reading>()
            .collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "tracing")]
        tracing::info!(rows = rows.len(), "dataset loaded");

        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    /// Earliest and latest reading date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.date).min()?;
        let max = self.rows.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.category.as_str()).collect()
    }
}

impl Deref for Dataset {
    type Target = [Reading];

    fn deref(&self) -> &[Reading] {
        &self.rows
    }
}
