//! Observation store
//!
//! Holds the conformed observation table of every domain and answers
//! filter queries against it. The store is immutable once built and shared
//! between sessions behind an `Arc`; queries take `&self` only.

pub mod loader;
pub mod schema;

use std::collections::BTreeSet;

use arrow::array::{AsArray, PrimitiveArray, StringArray};
use arrow::datatypes::Int32Type;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::EngineConfig;
use crate::error::{DashboardError, Result};
use crate::filter::{BatchFilter, Expr, ExpressionFilter, cross_section_filter, observation_filter};
use crate::models::facets::FacetAxis;
use crate::models::observation::columns;
use crate::models::{Domain, FacetSelection, Observation, Statistic};

use self::schema::conform_batch;

/// (municipality code, year, variable, facet values in `FacetAxis::ALL` order)
type RowKey = (i32, i32, String, Vec<String>);

#[derive(Debug, Default)]
struct DomainTable {
    batches: Vec<RecordBatch>,
    rows: usize,
    years: BTreeSet<i32>,
    keys: FxHashSet<RowKey>,
}

impl DomainTable {
    /// Record the row keys of a conformed batch
    ///
    /// A municipality may appear only once per (variable, year, facets).
    fn claim_keys(&mut self, domain: Domain, batch: &RecordBatch) -> Result<()> {
        let codes = int_column(batch, columns::MUNICIPALITY_CODE)?;
        let years = int_column(batch, columns::YEAR)?;
        let variables = string_column(batch, columns::VARIABLE)?;
        let facets = FacetAxis::ALL
            .iter()
            .map(|axis| string_column(batch, axis.column()))
            .collect::<Result<Vec<_>>>()?;

        for i in 0..batch.num_rows() {
            let key: RowKey = (
                codes.value(i),
                years.value(i),
                variables.value(i).to_string(),
                facets.iter().map(|f| f.value(i).to_string()).collect(),
            );
            if self.keys.contains(&key) {
                let (code, year, variable, facets) = key;
                return Err(DashboardError::ReferenceData(format!(
                    "{domain} table has more than one row for municipality {code} in {variable} {year} ({})",
                    facets.iter().join(", ")
                )));
            }
            self.keys.insert(key);
        }
        Ok(())
    }
}

fn int_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b PrimitiveArray<Int32Type>> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_primitive_opt::<Int32Type>())
        .ok_or_else(|| DashboardError::schema_error(format!("column '{name}' is missing or not Int32")))
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_string_opt::<i32>())
        .ok_or_else(|| DashboardError::schema_error(format!("column '{name}' is missing or not Utf8")))
}

/// Read-only observation tables of all domains
#[derive(Debug, Default)]
pub struct ObservationStore {
    tables: FxHashMap<Domain, DomainTable>,
}

impl ObservationStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every domain table named by the configuration
    pub async fn load(config: &EngineConfig) -> Result<Self> {
        let mut store = Self::new();
        for (domain, batches) in loader::load_domain_tables(config).await? {
            store.insert(domain, batches)?;
        }
        Ok(store)
    }

    /// Build a store from batches that may still need conforming
    pub fn from_batches(
        tables: impl IntoIterator<Item = (Domain, Vec<RecordBatch>)>,
    ) -> Result<Self> {
        let mut store = Self::new();
        for (domain, batches) in tables {
            store.insert(domain, batches)?;
        }
        Ok(store)
    }

    /// Add batches to a domain's table, conforming them first
    ///
    /// # Errors
    /// `ReferenceData` when a row repeats the (municipality, variable, year,
    /// facets) key of a row already in the table.
    pub fn insert(&mut self, domain: Domain, batches: Vec<RecordBatch>) -> Result<()> {
        let table = self.tables.entry(domain).or_default();
        for batch in batches {
            let batch = if batch.schema() == Observation::schema_ref() {
                batch
            } else {
                conform_batch(&batch)?
            };
            table.claim_keys(domain, &batch)?;
            table.rows += batch.num_rows();
            if let Some(years) = batch.column_by_name(columns::YEAR) {
                table
                    .years
                    .extend(years.as_primitive::<Int32Type>().iter().flatten());
            }
            table.batches.push(batch);
        }
        info!(
            "{domain} table holds {} rows over {} years",
            table.rows,
            table.years.len()
        );
        Ok(())
    }

    /// Filter a domain's table
    ///
    /// Without `year` the result is the full series over all years and
    /// municipalities (the national row included); with `year` it is the
    /// single-year cross-section. An empty result is valid.
    pub fn query(
        &self,
        domain: Domain,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
    ) -> Result<Vec<Observation>> {
        self.execute(domain, observation_filter(variable, year, facets))
    }

    /// Single-year cross-section with rows lacking `statistic` dropped
    pub fn cross_section(
        &self,
        domain: Domain,
        variable: &str,
        year: i32,
        facets: &FacetSelection,
        statistic: Statistic,
    ) -> Result<Vec<Observation>> {
        self.execute(domain, cross_section_filter(variable, year, facets, statistic))
    }

    /// Run a filter expression and materialise the matching rows, ordered
    /// by (municipality code, year)
    pub fn execute(&self, domain: Domain, expr: Expr) -> Result<Vec<Observation>> {
        let Some(table) = self.tables.get(&domain) else {
            debug!("No {domain} table loaded, returning no rows");
            return Ok(Vec::new());
        };

        let filter = ExpressionFilter::new(expr);
        let mut rows = table
            .batches
            .par_iter()
            .map(|batch| {
                let filtered = filter.filter(batch)?;
                if filtered.num_rows() == 0 {
                    Ok(Vec::new())
                } else {
                    Observation::from_batch(&filtered)
                }
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        rows.sort_by_key(|row| (row.municipality_code, row.year));
        debug!("{domain} query {:?} matched {} rows", filter.expr(), rows.len());
        Ok(rows)
    }

    /// Years present in a domain's table, ascending
    #[must_use]
    pub fn years(&self, domain: Domain) -> Vec<i32> {
        self.tables
            .get(&domain)
            .map(|t| t.years.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of rows in a domain's table
    #[must_use]
    pub fn row_count(&self, domain: Domain) -> usize {
        self.tables.get(&domain).map_or(0, |t| t.rows)
    }

    /// Domains with a loaded table
    #[must_use]
    pub fn domains(&self) -> Vec<Domain> {
        let mut domains: Vec<_> = self.tables.keys().copied().collect();
        domains.sort();
        domains
    }
}
