//! Expression-based filtering for observation tables
//!
//! Expressions are evaluated column-at-a-time against Arrow record batches
//! using the vectorized comparison kernels.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef, BooleanArray, Int32Array, Int64Array, Scalar, StringArray};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{and, is_not_null};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{DashboardError, Result};

/// A filter expression over the columns of a record batch
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column equals a literal value
    Eq(String, LiteralValue),

    /// Column is not null
    IsNotNull(String),

    /// Logical AND of expressions
    And(Vec<Expr>),

    /// Always evaluates to true
    AlwaysTrue,
}

/// A literal value in a filter expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Int(i64),
    String(String),
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl Expr {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<LiteralValue>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    /// Conjunction; collapses to the single operand or to `AlwaysTrue`
    #[must_use]
    pub fn all(mut exprs: Vec<Self>) -> Self {
        exprs.retain(|e| *e != Self::AlwaysTrue);
        match exprs.len() {
            0 => Self::AlwaysTrue,
            1 => exprs.remove(0),
            _ => Self::And(exprs),
        }
    }

    /// Returns a set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        self.collect_required_columns(&mut columns);
        columns
    }

    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Self::Eq(col, _) | Self::IsNotNull(col) => {
                columns.insert(col.clone());
            }
            Self::And(exprs) => {
                for expr in exprs {
                    expr.collect_required_columns(columns);
                }
            }
            Self::AlwaysTrue => {}
        }
    }
}

/// Evaluates a filter expression against a record batch
///
/// # Returns
/// A boolean array indicating which rows match the filter. Null entries
/// (comparisons against null cells) are treated as non-matching by
/// [`crate::filter::filter_record_batch`].
///
/// # Errors
/// Returns an error if a column is missing or has an unsupported type
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr) -> Result<BooleanArray> {
    match expr {
        Expr::AlwaysTrue => Ok(BooleanArray::from(vec![true; batch.num_rows()])),
        Expr::And(exprs) => {
            let mut result = BooleanArray::from(vec![true; batch.num_rows()]);
            for expr in exprs {
                let mask = evaluate_expr(batch, expr)?;
                result =
                    and(&result, &mask).map_err(|e| DashboardError::filter_error(e.to_string()))?;
            }
            Ok(result)
        }
        Expr::Eq(col_name, literal) => evaluate_eq(column(batch, col_name)?, col_name, literal),
        Expr::IsNotNull(col_name) => {
            is_not_null(column(batch, col_name)?.as_ref()).map_err(DashboardError::from)
        }
    }
}

fn column<'a>(batch: &'a RecordBatch, col_name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(col_name)
        .ok_or_else(|| DashboardError::filter_error(format!("Column {col_name} not found in batch")))
}

fn evaluate_eq(column: &ArrayRef, col_name: &str, literal: &LiteralValue) -> Result<BooleanArray> {
    let result = match (column.data_type(), literal) {
        (DataType::Utf8, LiteralValue::String(s)) => {
            eq(column, &Scalar::new(StringArray::from(vec![s.as_str()])))
        }
        (DataType::Int32, LiteralValue::Int(n)) => match i32::try_from(*n) {
            Ok(n) => eq(column, &Scalar::new(Int32Array::from(vec![n]))),
            // A value outside the i32 range matches nothing
            Err(_) => return Ok(BooleanArray::from(vec![false; column.len()])),
        },
        (DataType::Int64, LiteralValue::Int(n)) => {
            eq(column, &Scalar::new(Int64Array::from(vec![*n])))
        }
        (data_type, literal) => {
            return Err(DashboardError::filter_error(format!(
                "Cannot compare column {col_name} of type {data_type} with {literal:?}"
            )));
        }
    };
    result.map_err(|e| DashboardError::filter_error(e.to_string()))
}
