//! Input data model and the per-series values derived from it.
//!
//! A [`Series`] is one tracked metric: an ordered list of dated entries whose
//! first element is a zero-valued start anchor. From it we derive
//! [`SeriesStats`] (normalization maxima), one [`ChartPoint`] per recorded
//! set plus the anchor, and one [`DaySpan`] per entry that contributes at
//! least one point.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One day of recorded sub-measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Entry {
    #[serde(default)]
    pub sets: Vec<f64>,
    #[serde(default)]
    pub date: String,
}

impl Entry {
    #[must_use]
    pub fn new(date: impl Into<String>, sets: Vec<f64>) -> Self {
        Self {
            sets,
            date: date.into(),
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.sets.iter().sum()
    }
}

/// One tracked metric's ordered history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Series {
    #[must_use]
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DataError {
    #[error("data set contains no series")]
    Empty,
    #[error("series `{series}` entry {entry}: set value {value} must be finite and >= 0")]
    InvalidSetValue {
        series: String,
        entry: usize,
        value: f64,
    },
    #[error("failed to parse data set: {0}")]
    Parse(String),
}

/// Parse a JSON array of series.
pub fn parse_series_json(json: &str) -> Result<Vec<Series>, DataError> {
    let series: Vec<Series> =
        serde_json::from_str(json).map_err(|err| DataError::Parse(err.to_string()))?;
    validate_series(&series)?;
    Ok(series)
}

/// Reject data the layout cannot floor its way around.
pub fn validate_series(series: &[Series]) -> Result<(), DataError> {
    if series.is_empty() {
        return Err(DataError::Empty);
    }

    for s in series {
        for (entry_idx, entry) in s.entries.iter().enumerate().skip(1) {
            if let Some(&value) = entry.sets.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(DataError::InvalidSetValue {
                    series: s.name.clone(),
                    entry: entry_idx,
                    value,
                });
            }
        }
    }

    Ok(())
}

/// Normalization maxima for one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    /// Largest running total, floored at [`SeriesStats::FLOOR`].
    pub max_cumulative: f64,
    /// Largest single set value, floored at [`SeriesStats::FLOOR`].
    pub max_set: f64,
    /// Number of day slots along X, at least 1.
    pub max_days: usize,
}

impl SeriesStats {
    pub const FLOOR: f64 = 0.0001;

    /// Stats over `entries[1..]`; the start anchor's sets are ignored.
    #[must_use]
    pub fn from_series(series: &Series) -> Self {
        let mut max_cumulative = Self::FLOOR;
        let mut max_set = Self::FLOOR;
        let mut cumulative = 0.0;

        for entry in series.entries.iter().skip(1) {
            for &value in &entry.sets {
                cumulative += value;
                max_set = f64::max(max_set, value);
            }
            max_cumulative = f64::max(max_cumulative, cumulative);
        }

        Self {
            max_cumulative,
            max_set,
            max_days: series.entries.len().saturating_sub(1).max(1),
        }
    }
}

/// A set value placed in day/fraction/running-total space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub day_index: usize,
    /// Position within the day slot, `(k + 1) / n` for set `k` of `n`.
    pub fraction: f64,
    pub cumulative: f64,
    pub set_value: f64,
    /// +1 for even set indices, -1 for odd ones.
    pub direction: f64,
    /// Start anchor, or the last (only) set of a day.
    pub is_anchor_node: bool,
}

impl ChartPoint {
    /// The series start point.
    #[must_use]
    pub const fn anchor() -> Self {
        Self {
            day_index: 0,
            fraction: 0.0,
            cumulative: 0.0,
            set_value: 0.0,
            direction: 1.0,
            is_anchor_node: true,
        }
    }
}

/// Points belonging to one entry, together with its tooltip numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySpan {
    pub entry_index: usize,
    /// The preceding point followed by this day's points.
    pub points: Range<usize>,
    pub date: String,
    pub sets: Vec<f64>,
    pub day_total: f64,
    pub running_total: f64,
}

/// Everything derived from a series except its spatial mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoints {
    pub stats: SeriesStats,
    pub points: Vec<ChartPoint>,
    pub days: Vec<DaySpan>,
}

impl SeriesPoints {
    #[must_use]
    pub fn derive(series: &Series) -> Self {
        let stats = SeriesStats::from_series(series);
        let mut points = vec![ChartPoint::anchor()];
        let mut days = Vec::new();
        let mut cumulative = 0.0;

        for (day_index, entry) in series.entries.iter().enumerate().skip(1) {
            let count = entry.sets.len();
            let span_start = points.len() - 1;

            for (k, &value) in entry.sets.iter().enumerate() {
                cumulative += value;
                points.push(ChartPoint {
                    day_index,
                    fraction: (k + 1) as f64 / count as f64,
                    cumulative,
                    set_value: value,
                    direction: if k % 2 == 0 { 1.0 } else { -1.0 },
                    is_anchor_node: count == 1 || k == count - 1,
                });
            }

            let span = span_start..points.len();
            if span.len() > 1 {
                days.push(DaySpan {
                    entry_index: day_index,
                    points: span,
                    date: entry.date.clone(),
                    sets: entry.sets.clone(),
                    day_total: entry.total(),
                    running_total: cumulative,
                });
            }
        }

        Self {
            stats,
            points,
            days,
        }
    }

    /// A curve needs at least two points.
    #[must_use]
    pub fn has_curve(&self) -> bool {
        self.points.len() > 1
    }
}
