//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Sampling frequency of a metric series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// The date `periods` steps after `anchor`.
    ///
    /// Month-based frequencies clamp to the end of shorter months, so always
    /// advance from the same anchor rather than chaining single steps.
    pub fn advance(self, anchor: NaiveDate, periods: usize) -> Option<NaiveDate> {
        let n = u32::try_from(periods).ok()?;
        match self {
            Frequency::Daily => anchor.checked_add_days(Days::new(u64::from(n))),
            Frequency::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(n))),
            Frequency::Monthly => anchor.checked_add_months(Months::new(n)),
            Frequency::Quarterly => anchor.checked_add_months(Months::new(n.checked_mul(3)?)),
            Frequency::Yearly => anchor.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    /// Infer the frequency from the spacing of the first two timestamps
    pub fn infer(timestamps: &[NaiveDate]) -> Result<Self> {
        if timestamps.len() < 2 {
            return Err(ForecastError::DataError(
                "At least two timestamps are needed to infer a frequency".to_string(),
            ));
        }

        let gap = (timestamps[1] - timestamps[0]).num_days();
        match gap {
            1 => Ok(Frequency::Daily),
            7 => Ok(Frequency::Weekly),
            28..=31 => Ok(Frequency::Monthly),
            89..=92 => Ok(Frequency::Quarterly),
            365 | 366 => Ok(Frequency::Yearly),
            _ => Err(ForecastError::DataError(format!(
                "Cannot infer frequency from a spacing of {} days",
                gap
            ))),
        }
    }

    /// Number of periods in one seasonal cycle
    pub fn season_length(self) -> usize {
        match self {
            Frequency::Daily => 7,
            Frequency::Weekly => 52,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Yearly => 1,
        }
    }

    /// Position of `date` within the seasonal cycle (weekday, week of year,
    /// month, quarter).
    ///
    /// ISO week 53 shares the last weekly slot with week 52.
    pub fn season_index(self, date: NaiveDate) -> usize {
        match self {
            Frequency::Daily => date.weekday().num_days_from_monday() as usize,
            Frequency::Weekly => (date.iso_week().week0() as usize).min(51),
            Frequency::Monthly => date.month0() as usize,
            Frequency::Quarterly => (date.month0() / 3) as usize,
            Frequency::Yearly => 0,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

/// How missing periods are treated when regularizing raw observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFill {
    /// Any missing period is an error
    Reject,
    /// Repeat the last observed value
    ForwardFill,
    /// Interpolate linearly between the surrounding observations
    Linear,
}

/// A gap-free, evenly spaced series for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
    frequency: Frequency,
}

impl TimeSeries {
    /// Create a validated series.
    ///
    /// Every timestamp must sit exactly on the frequency grid anchored at the
    /// first timestamp and every value must be finite.
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<NaiveDate>,
        values: Vec<f64>,
        frequency: Frequency,
    ) -> Result<Self> {
        let name = name.into();
        if timestamps.is_empty() {
            return Err(ForecastError::DataError(format!(
                "Series '{}' is empty",
                name
            )));
        }
        if timestamps.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Series '{}' has {} timestamps but {} values",
                name,
                timestamps.len(),
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Series '{}' has a non-finite value at {}",
                name, timestamps[pos]
            )));
        }
        validate_grid(&timestamps, frequency)?;

        Ok(Self {
            name,
            timestamps,
            values,
            frequency,
        })
    }

    /// Create a series, inferring its frequency from the timestamps
    pub fn infer(
        name: impl Into<String>,
        timestamps: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let frequency = Frequency::infer(&timestamps)?;
        Self::new(name, timestamps, values, frequency)
    }

    /// Build a gap-free series from raw observations that may skip periods
    pub fn regularize(
        name: impl Into<String>,
        mut observations: Vec<(NaiveDate, f64)>,
        frequency: Frequency,
        policy: GapFill,
    ) -> Result<Self> {
        let name = name.into();
        observations.sort_by_key(|(date, _)| *date);
        if observations.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(ForecastError::DataError(format!(
                "Series '{}' has duplicate timestamps",
                name
            )));
        }
        let Some(&(start, _)) = observations.first() else {
            return Err(ForecastError::DataError(format!(
                "Series '{}' is empty",
                name
            )));
        };

        // Map every observation onto its grid slot
        let mut slots: Vec<Option<f64>> = Vec::new();
        let mut timestamps = Vec::new();
        let mut next = 0usize;
        for (date, value) in observations {
            loop {
                let grid_date = frequency.advance(start, next).ok_or_else(|| {
                    ForecastError::DataError("Date arithmetic overflow".to_string())
                })?;
                if grid_date > date {
                    return Err(ForecastError::DataError(format!(
                        "Observation {} of '{}' is not on the {} grid starting {}",
                        date, name, frequency, start
                    )));
                }
                timestamps.push(grid_date);
                next += 1;
                if grid_date == date {
                    slots.push(Some(value));
                    break;
                }
                slots.push(None);
            }
        }

        let missing = slots.iter().filter(|v| v.is_none()).count();
        if missing > 0 && policy == GapFill::Reject {
            return Err(ForecastError::DataError(format!(
                "Series '{}' is missing {} period(s)",
                name, missing
            )));
        }

        let values = fill_slots(&slots, policy);
        Self::new(name, timestamps, values, frequency)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_timestamp(&self) -> NaiveDate {
        self.timestamps[0]
    }

    pub fn last_timestamp(&self) -> NaiveDate {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// Split chronologically into the first `train_len` periods and the rest
    pub fn split_at(&self, train_len: usize) -> Result<(TimeSeries, TimeSeries)> {
        if train_len == 0 || train_len >= self.len() {
            return Err(ForecastError::ValidationError(format!(
                "Split point {} must leave both sides of '{}' non-empty (length {})",
                train_len,
                self.name,
                self.len()
            )));
        }

        let head = TimeSeries {
            name: self.name.clone(),
            timestamps: self.timestamps[..train_len].to_vec(),
            values: self.values[..train_len].to_vec(),
            frequency: self.frequency,
        };
        let tail = TimeSeries {
            name: self.name.clone(),
            timestamps: self.timestamps[train_len..].to_vec(),
            values: self.values[train_len..].to_vec(),
            frequency: self.frequency,
        };
        Ok((head, tail))
    }

    /// The `horizon` timestamps following the last observation
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<NaiveDate>> {
        future_timestamps(self.first_timestamp(), self.len(), horizon, self.frequency)
    }
}

/// Timestamps for `horizon` periods after a grid of `observed` periods anchored at `anchor`
pub fn future_timestamps(
    anchor: NaiveDate,
    observed: usize,
    horizon: usize,
    frequency: Frequency,
) -> Result<Vec<NaiveDate>> {
    (observed..observed + horizon)
        .map(|k| {
            frequency
                .advance(anchor, k)
                .ok_or_else(|| ForecastError::DataError("Date arithmetic overflow".to_string()))
        })
        .collect()
}

fn validate_grid(timestamps: &[NaiveDate], frequency: Frequency) -> Result<()> {
    let anchor = timestamps[0];
    for (k, &date) in timestamps.iter().enumerate().skip(1) {
        let expected = frequency.advance(anchor, k);
        if expected != Some(date) {
            return Err(ForecastError::DataError(format!(
                "Timestamp {} at position {} breaks the {} grid (expected {})",
                date,
                k,
                frequency,
                expected.map_or_else(|| "overflow".to_string(), |d| d.to_string())
            )));
        }
    }
    Ok(())
}

fn fill_slots(slots: &[Option<f64>], policy: GapFill) -> Vec<f64> {
    let mut values: Vec<f64> = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        let value = match *slot {
            Some(v) => v,
            None => {
                let before = values.last().copied().unwrap_or(0.0);
                let next_observed = slots[i..]
                    .iter()
                    .enumerate()
                    .find_map(|(offset, s)| s.map(|v| (offset, v)));
                match (policy, next_observed) {
                    // Offsets are relative to `i`, and `before` sits one period behind it
                    (GapFill::Linear, Some((offset, after))) => {
                        before + (after - before) / (offset + 1) as f64
                    }
                    _ => before,
                }
            }
        };
        values.push(value);
    }
    values
}

/// Encode a date as epoch milliseconds at midnight UTC
pub fn date_to_millis(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    date.signed_duration_since(epoch).num_days() * MILLIS_PER_DAY
}

/// Decode epoch milliseconds into a calendar date
pub fn millis_to_date(millis: i64) -> Result<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    epoch
        .checked_add_signed(chrono::Duration::days(millis.div_euclid(MILLIS_PER_DAY)))
        .ok_or_else(|| ForecastError::DataError(format!("Timestamp {} is out of range", millis)))
}
