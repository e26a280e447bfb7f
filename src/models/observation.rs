//! Observation rows
//!
//! One row per (domain, variable, year, municipality, facet combination).
//! Municipality code `0` is the national aggregate.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::measure::Statistic;

/// Column names of the observation table
pub mod columns {
    pub const MUNICIPALITY_CODE: &str = "KOMKODE";
    pub const MUNICIPALITY: &str = "municipality";
    pub const YEAR: &str = "year";
    pub const VARIABLE: &str = "variable";
    pub const OBSERVATIONS: &str = "observations";
}

/// Municipality code of the national aggregate row
pub const NATIONAL_CODE: i32 = 0;

/// A single observation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Municipality code; [`NATIONAL_CODE`] for all of Denmark
    #[serde(rename = "KOMKODE")]
    pub municipality_code: i32,
    /// Municipality display name
    pub municipality: Option<String>,
    pub year: i32,
    pub variable: String,
    pub gender: String,
    pub age: String,
    pub heritage: String,
    pub education: String,
    pub labor: String,
    /// Number of individuals behind the row. Used for annotation only.
    pub observations: Option<u64>,
    #[serde(rename = "Gini")]
    pub gini: Option<f64>,
    #[serde(rename = "Theil_L")]
    pub theil_l: Option<f64>,
    #[serde(rename = "Theil_T")]
    pub theil_t: Option<f64>,
    pub mean: Option<f64>,
    pub p90p10: Option<f64>,
    pub p90p50: Option<f64>,
    pub p50p10: Option<f64>,
}

impl Observation {
    /// Value of a stored statistic
    #[must_use]
    pub const fn value(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Gini => self.gini,
            Statistic::TheilL => self.theil_l,
            Statistic::TheilT => self.theil_t,
            Statistic::Mean => self.mean,
            Statistic::P90P10 => self.p90p10,
            Statistic::P90P50 => self.p90p50,
            Statistic::P50P10 => self.p50p10,
        }
    }

    /// Observation count, zero when unknown
    #[must_use]
    pub fn observation_count(&self) -> u64 {
        self.observations.unwrap_or(0)
    }

    /// Whether this is the national aggregate row
    #[must_use]
    pub const fn is_national(&self) -> bool {
        self.municipality_code == NATIONAL_CODE
    }

    /// The canonical Arrow schema of an observation table
    #[must_use]
    pub fn schema() -> Schema {
        let mut fields = vec![
            Field::new(columns::MUNICIPALITY_CODE, DataType::Int32, false),
            Field::new(columns::MUNICIPALITY, DataType::Utf8, true),
            Field::new(columns::YEAR, DataType::Int32, false),
            Field::new(columns::VARIABLE, DataType::Utf8, false),
        ];
        fields.extend(
            crate::models::facets::FacetAxis::ALL
                .into_iter()
                .map(|axis| Field::new(axis.column(), DataType::Utf8, false)),
        );
        fields.push(Field::new(columns::OBSERVATIONS, DataType::UInt64, true));
        fields.extend(
            Statistic::ALL
                .into_iter()
                .map(|stat| Field::new(stat.column(), DataType::Float64, true)),
        );
        Schema::new(fields)
    }

    /// Shared reference to the canonical schema
    #[must_use]
    pub fn schema_ref() -> SchemaRef {
        Arc::new(Self::schema())
    }

    /// Convert a conformed `RecordBatch` into rows using `serde_arrow`
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        Ok(serde_arrow::from_record_batch::<Vec<Self>>(batch)?)
    }

    /// Convert rows into a `RecordBatch` with the canonical schema
    pub fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let fields: Vec<FieldRef> = Self::schema().fields().iter().cloned().collect();
        Ok(serde_arrow::to_record_batch(&fields, &rows)?)
    }
}
