//! Declared domains for parameters.
//!
//! A domain is checked on registration and on every write. A value of the
//! wrong kind is rejected the same way as an out-of-range one.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::{DashError, DashResult, ParamValue};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const STEP_TOLERANCE: f64 = 1e-9;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Domain {
    /// Accept any value of any kind.
    #[default]
    Any,
    /// Slider: finite number within `[min, max]`, optionally on a step grid
    /// anchored at `min`.
    Number {
        min: f64,
        max: f64,
        step: Option<f64>,
    },
    /// Two-handle slider: finite `lo <= hi`, both ends inside `[min, max]`
    /// and on the optional step grid.
    Range {
        min: f64,
        max: f64,
        step: Option<f64>,
    },
    Int {
        min: i64,
        max: i64,
    },
    Date {
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
    /// Ordered pair of dates, both inside the optional bounds.
    DateRange {
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
    Bool,
    /// Single selection: a `Text` value that must be one of the choices.
    Choice(BTreeSet<String>),
    /// Multi selection: a `Set` value that must be a subset of the choices.
    MultiChoice(BTreeSet<String>),
}

impl Domain {
    pub fn number(min: f64, max: f64) -> Self {
        Self::Number {
            min,
            max,
            step: None,
        }
    }

    pub fn stepped(min: f64, max: f64, step: f64) -> Self {
        Self::Number {
            min,
            max,
            step: Some(step),
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::Range {
            min,
            max,
            step: None,
        }
    }

    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice(choices.into_iter().map(Into::into).collect())
    }

    pub fn multi_choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiChoice(choices.into_iter().map(Into::into).collect())
    }

    /// Check `value` against this domain; `parameter` names the error.
    pub fn validate(&self, parameter: &str, value: &ParamValue) -> DashResult<()> {
        let reject = |reason: String| Err(DashError::invalid_value(parameter, reason));

        match (self, value) {
            (Self::Any, _) => Ok(()),

            (Self::Number { min, max, step }, ParamValue::Number(n)) => {
                check_number(*n, *min, *max, *step)
                    .map_err(|reason| DashError::invalid_value(parameter, reason))
            }

            (Self::Range { min, max, step }, ParamValue::Range(lo, hi)) => {
                check_number(*lo, *min, *max, *step)
                    .and_then(|_| check_number(*hi, *min, *max, *step))
                    .map_err(|reason| DashError::invalid_value(parameter, reason))?;
                if lo > hi {
                    return reject(format!("range start {lo} is after end {hi}"));
                }
                Ok(())
            }

            (Self::Int { min, max }, ParamValue::Int(i)) => {
                if i < min || i > max {
                    return reject(format!("{i} is outside [{min}, {max}]"));
                }
                Ok(())
            }

            (Self::Date { min, max }, ParamValue::Date(d)) => check_date_bounds(*d, *min, *max)
                .map_err(|reason| DashError::invalid_value(parameter, reason)),

            (Self::DateRange { min, max }, ParamValue::DateRange(start, end)) => {
                if start > end {
                    return reject(format!("range start {start} is after end {end}"));
                }
                check_date_bounds(*start, *min, *max)
                    .and_then(|_| check_date_bounds(*end, *min, *max))
                    .map_err(|reason| DashError::invalid_value(parameter, reason))
            }

            (Self::Bool, ParamValue::Bool(_)) => Ok(()),

            (Self::Choice(choices), ParamValue::Text(s)) => {
                if choices.contains(s) {
                    Ok(())
                } else {
                    reject(format!("unknown category {s:?}"))
                }
            }

            (Self::MultiChoice(choices), ParamValue::Set(items)) => {
                match items.iter().find(|item| !choices.contains(*item)) {
                    Some(unknown) => reject(format!("unknown category {unknown:?}")),
                    None => Ok(()),
                }
            }

            (domain, value) => reject(format!(
                "expected a {} but got a {}",
                domain.expected_kind(),
                value.kind_name()
            )),
        }
    }

    fn expected_kind(&self) -> &'static str {
        match self {
            Self::Any => "value",
            Self::Number { .. } => "number",
            Self::Range { .. } => "range",
            Self::Int { .. } => "integer",
            Self::Date { .. } => "date",
            Self::DateRange { .. } => "date range",
            Self::Bool => "boolean",
            Self::Choice(_) => "text",
            Self::MultiChoice(_) => "set",
        }
    }
}

fn check_number(n: f64, min: f64, max: f64, step: Option<f64>) -> Result<(), String> {
    if !n.is_finite() {
        return Err(format!("{n} is not a finite number"));
    }
    if n < min || n > max {
        return Err(format!("{n} is outside [{min}, {max}]"));
    }
    if let Some(step) = step.filter(|s| *s > 0.0) {
        let steps = (n - min) / step;
        if (steps - steps.round()).abs() > STEP_TOLERANCE {
            return Err(format!("{n} is not on the {step} step grid from {min}"));
        }
    }
    Ok(())
}

fn check_date_bounds(
    d: NaiveDate,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
) -> Result<(), String> {
    if let Some(min) = min
        && d < min
    {
        return Err(format!("{d} is before {min}"));
    }
    if let Some(max) = max
        && d > max
    {
        return Err(format!("{d} is after {max}"));
    }
    Ok(())
}
