//! Versioned, append-only store of historical metric columns
//!
//! Base metrics come from the data collaborator; derived metrics are new
//! columns computed from existing ones and tagged with their provenance so a
//! forecast of the derived metric can be recomposed from its components.

use crate::data::{date_to_millis, millis_to_date, Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the timestamp column in the backing frame
pub const DATE_COLUMN: &str = "date";

/// Arithmetic relationship that produced a derived metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    Sum(Vec<String>),
    Difference { minuend: String, subtrahend: String },
    Ratio { numerator: String, denominator: String },
}

impl Derivation {
    pub fn sum<S: AsRef<str>>(components: &[S]) -> Self {
        Derivation::Sum(components.iter().map(|c| c.as_ref().to_string()).collect())
    }

    pub fn difference(minuend: &str, subtrahend: &str) -> Self {
        Derivation::Difference {
            minuend: minuend.to_string(),
            subtrahend: subtrahend.to_string(),
        }
    }

    pub fn ratio(numerator: &str, denominator: &str) -> Self {
        Derivation::Ratio {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }

    /// Source metrics in the order `combine` expects them
    pub fn components(&self) -> Vec<&str> {
        match self {
            Derivation::Sum(parts) => parts.iter().map(String::as_str).collect(),
            Derivation::Difference {
                minuend,
                subtrahend,
            } => vec![minuend, subtrahend],
            Derivation::Ratio {
                numerator,
                denominator,
            } => vec![numerator, denominator],
        }
    }

    /// Apply the relationship period by period to component columns given in
    /// `components()` order.
    pub fn combine(&self, columns: &[&[f64]]) -> Result<Vec<f64>> {
        let expected = self.components().len();
        if columns.len() != expected || expected == 0 {
            return Err(ForecastError::ValidationError(format!(
                "{} expects {} component column(s), got {}",
                self,
                expected,
                columns.len()
            )));
        }
        let len = columns[0].len();
        if columns.iter().any(|c| c.len() != len) {
            return Err(ForecastError::ValidationError(
                "Component columns have different lengths".to_string(),
            ));
        }

        match self {
            Derivation::Sum(_) => Ok((0..len)
                .map(|t| columns.iter().map(|c| c[t]).sum())
                .collect()),
            Derivation::Difference { .. } => Ok(columns[0]
                .iter()
                .zip(columns[1])
                .map(|(a, b)| a - b)
                .collect()),
            Derivation::Ratio { denominator, .. } => columns[0]
                .iter()
                .zip(columns[1])
                .map(|(a, b)| {
                    if *b == 0.0 {
                        Err(ForecastError::DataError(format!(
                            "Ratio denominator '{}' is zero",
                            denominator
                        )))
                    } else {
                        Ok(a / b)
                    }
                })
                .collect(),
        }
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derivation::Sum(parts) => write!(f, "sum({})", parts.join(", ")),
            Derivation::Difference {
                minuend,
                subtrahend,
            } => write!(f, "difference({}, {})", minuend, subtrahend),
            Derivation::Ratio {
                numerator,
                denominator,
            } => write!(f, "ratio({}, {})", numerator, denominator),
        }
    }
}

/// Where a stored column came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Base,
    Derived(Derivation),
}

/// Historical table: one date column plus one f64 column per metric
#[derive(Debug, Clone)]
pub struct SeriesStore {
    frame: DataFrame,
    timestamps: Vec<NaiveDate>,
    frequency: Frequency,
    provenance: BTreeMap<String, Provenance>,
    version: u64,
}

impl SeriesStore {
    /// Create an empty store over a fixed time index
    pub fn new(timestamps: Vec<NaiveDate>, frequency: Frequency) -> Result<Self> {
        // Validate the index through a placeholder series
        TimeSeries::new(
            DATE_COLUMN,
            timestamps.clone(),
            vec![0.0; timestamps.len()],
            frequency,
        )?;

        let millis: Vec<i64> = timestamps.iter().map(|d| date_to_millis(*d)).collect();
        let frame = DataFrame::new(vec![Series::new(DATE_COLUMN, millis)])?;

        Ok(Self {
            frame,
            timestamps,
            frequency,
            provenance: BTreeMap::new(),
            version: 0,
        })
    }

    /// Create an empty store, inferring the frequency from the index
    pub fn with_index(timestamps: Vec<NaiveDate>) -> Result<Self> {
        let frequency = Frequency::infer(&timestamps)?;
        Self::new(timestamps, frequency)
    }

    /// Ingest a collaborator's table. The time column holds epoch
    /// milliseconds; every other numeric column becomes a base metric.
    pub fn from_dataframe(df: &DataFrame, time_column: &str) -> Result<Self> {
        let time = df.column(time_column).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", time_column, e))
        })?;
        let millis = column_as_i64(time)?;
        let timestamps = millis
            .into_iter()
            .map(millis_to_date)
            .collect::<Result<Vec<_>>>()?;

        let mut store = Self::with_index(timestamps)?;
        for series in df.get_columns() {
            if series.name() == time_column {
                continue;
            }
            let values = column_as_f64(series)?;
            store.insert_metric(series.name(), values)?;
        }
        Ok(store)
    }

    /// Append a base metric column
    pub fn insert_metric(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.append(name, values, Provenance::Base)
    }

    /// Append a derived metric computed from columns already in the store
    pub fn derive(&mut self, name: &str, derivation: Derivation) -> Result<()> {
        let sources = derivation
            .components()
            .into_iter()
            .map(|c| self.values(c))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&[f64]> = sources.iter().map(Vec::as_slice).collect();
        let values = derivation.combine(&refs)?;
        self.append(name, values, Provenance::Derived(derivation))
    }

    fn append(&mut self, name: &str, values: Vec<f64>, provenance: Provenance) -> Result<()> {
        if name == DATE_COLUMN || self.provenance.contains_key(name) {
            return Err(ForecastError::ValidationError(format!(
                "Column '{}' already exists; stored columns are never overwritten",
                name
            )));
        }
        if values.len() != self.timestamps.len() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} values but the index has {} periods",
                name,
                values.len(),
                self.timestamps.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Column '{}' contains non-finite values",
                name
            )));
        }

        self.frame.with_column(Series::new(name, values))?;
        self.provenance.insert(name.to_string(), provenance);
        self.version += 1;
        log::debug!("series store v{}: added column '{}'", self.version, name);
        Ok(())
    }

    /// Values of a stored metric
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        if !self.provenance.contains_key(name) {
            return Err(ForecastError::UnknownMetric(name.to_string()));
        }
        let column = self.frame.column(name)?;
        column_as_f64(column)
    }

    /// The metric as a validated time series
    pub fn series(&self, name: &str) -> Result<TimeSeries> {
        TimeSeries::new(
            name,
            self.timestamps.clone(),
            self.values(name)?,
            self.frequency,
        )
    }

    pub fn provenance(&self, name: &str) -> Option<&Provenance> {
        self.provenance.get(name)
    }

    /// The derivation behind a derived metric, if any
    pub fn derivation(&self, name: &str) -> Option<&Derivation> {
        match self.provenance.get(name) {
            Some(Provenance::Derived(derivation)) => Some(derivation),
            _ => None,
        }
    }

    /// Metric names in insertion-independent (sorted) order
    pub fn metrics(&self) -> Vec<&str> {
        self.provenance.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.provenance.contains_key(name)
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Incremented on every appended column
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.frame
    }
}

fn column_as_f64(col: &Series) -> Result<Vec<f64>> {
    let values: Vec<Option<f64>> = match col.dtype() {
        DataType::Float64 => col.f64()?.into_iter().collect(),
        DataType::Float32 => col.f32()?.into_iter().map(|v| v.map(f64::from)).collect(),
        DataType::Int64 => col.i64()?.into_iter().map(|v| v.map(|x| x as f64)).collect(),
        DataType::Int32 => col.i32()?.into_iter().map(|v| v.map(f64::from)).collect(),
        DataType::UInt64 => col.u64()?.into_iter().map(|v| v.map(|x| x as f64)).collect(),
        DataType::UInt32 => col.u32()?.into_iter().map(|v| v.map(f64::from)).collect(),
        other => {
            return Err(ForecastError::DataError(format!(
                "Column '{}' of type {} cannot be converted to f64",
                col.name(),
                other
            )))
        }
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                ForecastError::DataError(format!("Column '{}' has a null at row {}", col.name(), i))
            })
        })
        .collect()
}

fn column_as_i64(col: &Series) -> Result<Vec<i64>> {
    let values: Vec<Option<i64>> = match col.dtype() {
        DataType::Int64 => col.i64()?.into_iter().collect(),
        DataType::Int32 => col.i32()?.into_iter().map(|v| v.map(i64::from)).collect(),
        other => {
            return Err(ForecastError::DataError(format!(
                "Time column '{}' must hold epoch milliseconds, found {}",
                col.name(),
                other
            )))
        }
    };

    values
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                ForecastError::DataError(format!("Time column '{}' has nulls", col.name()))
            })
        })
        .collect()
}
