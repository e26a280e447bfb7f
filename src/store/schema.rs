//! Conforming loaded tables to the canonical observation schema
//!
//! Tables exported from different tools disagree on integer widths and on
//! which statistic columns they carry. Every batch is cast to the canonical
//! layout of [`Observation::schema`] before it enters the store.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray, new_null_array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, SchemaRef};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{DashboardError, Result};
use crate::models::facets::FacetAxis;
use crate::models::observation::Observation;

/// Columns a table cannot be used without
pub const REQUIRED_COLUMNS: [&str; 3] = ["KOMKODE", "year", "variable"];

/// Cast and complete a batch to the canonical observation schema
///
/// - required key columns must be present and free of nulls
/// - a missing facet column means the table has no breakdown on that axis
///   and is filled with `all`
/// - missing optional columns become all-null columns
pub fn conform_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    conform_to(batch, &Observation::schema_ref())
}

fn conform_to(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let columns = target
        .fields()
        .iter()
        .map(|field| conform_column(batch, field, rows))
        .collect::<Result<Vec<ArrayRef>>>()?;
    Ok(RecordBatch::try_new(Arc::clone(target), columns)?)
}

fn conform_column(batch: &RecordBatch, field: &Field, rows: usize) -> Result<ArrayRef> {
    let name = field.name().as_str();
    let Some(column) = batch.column_by_name(name) else {
        if REQUIRED_COLUMNS.contains(&name) {
            return Err(DashboardError::schema_error(format!(
                "observation table is missing required column '{name}'"
            )));
        }
        if FacetAxis::ALL.iter().any(|axis| axis.column() == name) {
            debug!("Column '{name}' absent, treating every row as 'all'");
            return Ok(Arc::new(StringArray::from(vec!["all"; rows])));
        }
        debug!("Column '{name}' absent, filling with nulls");
        return Ok(new_null_array(field.data_type(), rows));
    };

    let conformed = if column.data_type() == field.data_type() {
        Arc::clone(column)
    } else if matches!(column.data_type(), DataType::Null) {
        new_null_array(field.data_type(), rows)
    } else {
        cast(column, field.data_type()).map_err(|e| {
            DashboardError::schema_error(format!(
                "column '{name}' of type {} cannot be read as {}: {e}",
                column.data_type(),
                field.data_type()
            ))
        })?
    };

    if !field.is_nullable() && conformed.null_count() > 0 {
        return Err(DashboardError::schema_error(format!(
            "column '{name}' has {} missing or unconvertible values",
            conformed.null_count()
        )));
    }
    Ok(conformed)
}
