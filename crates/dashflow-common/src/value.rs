use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The value held by a parameter.
///
/// Parameters are leaves of the reactive graph, so the set of kinds is
/// closed: whatever a filter control can produce.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Int(i64),
    Range(f64, f64),
    Date(NaiveDate),
    DateRange(NaiveDate, NaiveDate),
    Bool(bool),
    Text(String),
    Set(BTreeSet<String>),
}

impl ParamValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Int(_) => "integer",
            Self::Range(..) => "range",
            Self::Date(_) => "date",
            Self::DateRange(..) => "date range",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
            Self::Set(_) => "set",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::DateRange(start, end) => Some((*start, *end)),
            _ => None,
        }
    }

    /// Equality for change detection: NaN matches NaN, so rewriting a NaN
    /// is not a change.
    pub fn same_as(&self, other: &ParamValue) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => same(*a, *b),
            (Self::Range(a0, a1), Self::Range(b0, b1)) => same(*a0, *b0) && same(*a1, *b1),
            _ => self == other,
        }
    }

    /// Build a `Set` from anything yielding strings.
    pub fn set_of<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Range(lo, hi) => write!(f, "{lo}..={hi}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateRange(start, end) => write!(f, "{start}..={end}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Set(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/* ───────────────────── Conversions into ParamValue ─────────────────── */

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<(f64, f64)> for ParamValue {
    fn from((lo, hi): (f64, f64)) -> Self {
        Self::Range(lo, hi)
    }
}

impl From<(NaiveDate, NaiveDate)> for ParamValue {
    fn from((start, end): (NaiveDate, NaiveDate)) -> Self {
        Self::DateRange(start, end)
    }
}

impl From<BTreeSet<String>> for ParamValue {
    fn from(items: BTreeSet<String>) -> Self {
        Self::Set(items)
    }
}

/* ───────────────────── Typed reads out of ParamValue ───────────────── */

/// Types a parameter value can be read back as.
///
/// `from_param` returns `None` on a kind mismatch; callers turn that into
/// a `TypeMismatch` naming the parameter and `EXPECTED`.
pub trait FromParam: Sized {
    const EXPECTED: &'static str;

    fn from_param(value: &ParamValue) -> Option<Self>;
}

impl FromParam for ParamValue {
    const EXPECTED: &'static str = "value";

    fn from_param(value: &ParamValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromParam for f64 {
    const EXPECTED: &'static str = "number";

    fn from_param(value: &ParamValue) -> Option<Self> {
        value.as_number()
    }
}

impl FromParam for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromParam for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_param(value: &ParamValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromParam for String {
    const EXPECTED: &'static str = "text";

    fn from_param(value: &ParamValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromParam for NaiveDate {
    const EXPECTED: &'static str = "date";

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromParam for (f64, f64) {
    const EXPECTED: &'static str = "range";

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Range(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }
}

impl FromParam for (NaiveDate, NaiveDate) {
    const EXPECTED: &'static str = "date range";

    fn from_param(value: &ParamValue) -> Option<Self> {
        value.as_date_range()
    }
}

impl FromParam for BTreeSet<String> {
    const EXPECTED: &'static str = "set";

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Set(items) => Some(items.clone()),
            _ => None,
        }
    }
}
