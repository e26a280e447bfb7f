//! Reading observation tables from disk
//!
//! A domain's table is either a single Parquet/CSV file or a directory of
//! such files. Directory files are read in parallel with rayon; the three
//! domain tables are loaded concurrently on tokio's blocking pool.

use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::record_batch::RecordBatch;
use futures::stream::{self, StreamExt, TryStreamExt};
use itertools::Itertools;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rayon::prelude::*;

use crate::config::{EngineConfig, TableFormat};
use crate::error::util::{safe_open_file, validate_directory};
use crate::error::{DashboardError, Result};
use crate::models::Domain;
use crate::store::schema::conform_batch;
use crate::utils::logging::{
    create_load_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
    log_warning,
};

/// Rows sampled when inferring the schema of a CSV table
const CSV_INFERENCE_ROWS: usize = 1000;

/// Read a Parquet file into record batches
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid Parquet
pub fn read_parquet(path: &Path, batch_size: usize) -> Result<Vec<RecordBatch>> {
    let file = safe_open_file(path, "observation table")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file {}", path.display()))?
        .with_batch_size(batch_size)
        .build()
        .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?;

    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Read a CSV file with a header row into record batches
///
/// Column types are inferred from the first rows and conformed afterwards.
pub fn read_csv(path: &Path, batch_size: usize) -> Result<Vec<RecordBatch>> {
    let mut file = safe_open_file(path, "observation table")?;
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(&mut file, Some(CSV_INFERENCE_ROWS))
        .with_context(|| format!("Failed to infer CSV schema of {}", path.display()))?;
    file.rewind()?;

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_batch_size(batch_size)
        .build(file)?;
    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Read one table file in the given format and conform its batches
pub fn read_table_file(path: &Path, format: TableFormat, batch_size: usize) -> Result<Vec<RecordBatch>> {
    let batches = match format {
        TableFormat::Parquet => read_parquet(path, batch_size)?,
        TableFormat::Csv => read_csv(path, batch_size)?,
    };
    batches
        .iter()
        .filter(|batch| batch.num_rows() > 0)
        .map(conform_batch)
        .collect()
}

/// Find the table files of one format in a directory, sorted by name
pub fn find_table_files(dir: &Path, format: TableFormat) -> Result<Vec<PathBuf>> {
    validate_directory(dir, "observation table directory")?;

    let files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .filter_ok(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == format.extension())
        })
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .sorted()
        .collect_vec();

    if files.is_empty() {
        log_warning(
            &format!("No {format} files found in table directory"),
            Some(dir),
        );
    }
    Ok(files)
}

/// Load a table from a single file or a directory of files
pub fn load_table(path: &Path, format: TableFormat, batch_size: usize) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Loading observation table", path);

    let batches = if path.is_dir() {
        find_table_files(path, format)?
            .par_iter()
            .map(|file| read_table_file(file, format, batch_size))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect_vec()
    } else {
        read_table_file(path, format, batch_size)?
    };

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("loaded", path, rows, Some(start.elapsed()));
    Ok(batches)
}

/// Load the tables of every domain concurrently
///
/// A domain whose table does not exist is skipped with a warning; any other
/// failure aborts the whole load.
pub async fn load_domain_tables(config: &EngineConfig) -> Result<Vec<(Domain, Vec<RecordBatch>)>> {
    let pb = create_load_progress_bar(Domain::ALL.len() as u64, Some("Loading domain tables"));
    let format = config.table_format;
    let batch_size = config.batch_size;

    let tasks = Domain::ALL.into_iter().filter_map(|domain| {
        let path = config.table_path(domain);
        if path.exists() {
            Some((domain, path))
        } else {
            log_warning(&format!("No table for the {domain} domain"), Some(&path));
            pb.inc(1);
            None
        }
    });

    let tables = stream::iter(tasks)
        .map(|(domain, path)| {
            let pb = pb.clone();
            async move {
                let batches =
                    tokio::task::spawn_blocking(move || load_table(&path, format, batch_size))
                        .await
                        .map_err(|e| {
                            DashboardError::Other(anyhow::anyhow!(
                                "loading the {domain} table panicked: {e}"
                            ))
                        })??;
                pb.inc(1);
                Ok::<_, DashboardError>((domain, batches))
            }
        })
        .buffer_unordered(config.load_parallelism.max(1))
        .try_collect::<Vec<_>>()
        .await?;

    finish_progress_bar(&pb, Some("Domain tables loaded"));
    Ok(tables)
}
