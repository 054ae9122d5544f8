use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// An ordered time series of float observations (prices or returns).
///
/// The index is strictly increasing with no duplicate timestamps; the
/// constructor rejects anything else. The evaluation engine only ever holds
/// borrowed [`TimeSlice`] views of a series and never mutates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    index: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(index: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, EvalError> {
        if index.len() != values.len() {
            return Err(EvalError::InvalidInput(format!(
                "index length {} does not match value length {}",
                index.len(),
                values.len()
            )));
        }
        if let Some(w) = index.windows(2).find(|w| w[0] >= w[1]) {
            return Err(EvalError::InvalidInput(format!(
                "time index must be strictly increasing, found {} followed by {}",
                w[0], w[1]
            )));
        }
        Ok(Self { index, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Positional slice. Panics if the range is out of bounds, like slice
    /// indexing; the window splitter only produces in-bounds ranges.
    pub fn slice(&self, range: Range<usize>) -> TimeSlice<'_> {
        TimeSlice {
            index: &self.index[range.clone()],
            values: &self.values[range],
        }
    }

    pub fn as_slice(&self) -> TimeSlice<'_> {
        self.slice(0..self.len())
    }
}

/// A borrowed view into a contiguous region of a [`TimeSeries`].
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice<'a> {
    pub index: &'a [DateTime<Utc>],
    pub values: &'a [f64],
}

impl TimeSlice<'_> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.index.first().copied()
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.index.last().copied()
    }
}

/// One executed trade. A slice of these forms the trade ledger that the
/// strategy owns and the cost model reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    /// Traded volume, >= 0.
    pub volume: f64,
    /// Quoted spread at execution, >= 0.
    pub spread: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(days: &[i64], values: Vec<f64>) -> Result<TimeSeries, EvalError> {
        let index = days
            .iter()
            .map(|d| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(*d))
            .collect();
        TimeSeries::new(index, values)
    }

    #[test]
    fn accepts_strictly_increasing_index() {
        let series = ts(&[0, 1, 2], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        let slice = series.slice(1..3);
        assert_eq!(slice.values, &[2.0, 3.0]);
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = ts(&[0, 1, 1], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = ts(&[0, 1], vec![1.0]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput(_)));
    }
}
