//! Core filtering functionality for observation tables
//!
//! Defines the batch filter trait and the mask application shared by every
//! filter.

use std::collections::HashSet;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, BooleanArray};
use arrow::compute::filter as arrow_filter;
use arrow::record_batch::RecordBatch;

use crate::error::{DashboardError, Result};
use crate::filter::expr::{Expr, evaluate_expr};

/// Filter a record batch based on a boolean mask
///
/// # Errors
/// Returns an error if the mask length does not match or filtering fails
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(DashboardError::filter_error(format!(
            "Mask length ({}) doesn't match batch row count ({})",
            mask.len(),
            batch.num_rows()
        )));
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, mask))
        .collect::<arrow::error::Result<_>>()
        .context("Failed to apply boolean filter to columns")?;

    Ok(RecordBatch::try_new(batch.schema(), filtered_columns)
        .context("Failed to create filtered record batch")?)
}

/// Trait for objects that can filter record batches
pub trait BatchFilter: std::fmt::Debug {
    /// Filter a record batch
    ///
    /// # Errors
    /// Returns an error if filtering fails
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch>;

    /// Returns the set of column names required by this filter
    fn required_columns(&self) -> HashSet<String>;
}

/// A filter that evaluates an expression against a record batch
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

impl ExpressionFilter {
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr }
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        if self.expr == Expr::AlwaysTrue {
            return Ok(batch.clone());
        }
        let mask = evaluate_expr(batch, &self.expr)?;
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        self.expr.required_columns()
    }
}
