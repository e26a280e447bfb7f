//! Configuration for the inequality engine.

pub mod domain;

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::warn;
use serde::Deserialize;

use crate::error::util::safe_read_to_string;
use crate::error::{DashboardError, Result};

pub use domain::{DomainConfig, DomainConfigBuilder, VariableKind, VariableSpec};

/// On-disk format of the observation tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Parquet,
    Csv,
}

impl TableFormat {
    /// File extension of tables in this format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for TableFormat {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            other => Err(DashboardError::unknown_key("table format", other)),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration for loading the engine's reference data
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one table (file or directory) per domain,
    /// e.g. `data/income.parquet` or `data/health/`
    pub data_dir: PathBuf,
    /// Municipality code lookup (`{"101": "København", ...}`)
    pub municipality_lookup: PathBuf,
    /// Format of the observation tables
    pub table_format: TableFormat,
    /// Rows per record batch when reading
    pub batch_size: usize,
    /// Number of domain tables loaded at once; files inside a table
    /// directory are read on the rayon pool
    pub load_parallelism: usize,
    /// Year shown on the map when a session starts
    pub default_year: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            municipality_lookup: PathBuf::from("data/kommune_koder.json"),
            table_format: TableFormat::Parquet,
            batch_size: 16384,
            load_parallelism: num_cpus::get(),
            default_year: 2018,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `INEQ_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Read configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "engine configuration")?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Path of a domain's table: `<data_dir>/<domain>.<ext>`, or the
    /// `<data_dir>/<domain>` directory when no single file exists
    #[must_use]
    pub fn table_path(&self, domain: crate::models::Domain) -> PathBuf {
        let file = self
            .data_dir
            .join(format!("{}.{}", domain.key(), self.table_format.extension()));
        if file.is_file() {
            file
        } else {
            self.data_dir.join(domain.key())
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("INEQ_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("INEQ_MUNICIPALITY_LOOKUP") {
            self.municipality_lookup = PathBuf::from(path);
        }
        if let Some(format) = lookup("INEQ_TABLE_FORMAT") {
            self.table_format = format.parse()?;
        }
        if let Some(size) = lookup("INEQ_BATCH_SIZE") {
            match size.parse::<usize>() {
                Ok(size) if size > 0 => self.batch_size = size,
                _ => warn!("Ignoring invalid INEQ_BATCH_SIZE '{size}'"),
            }
        }
        if let Some(year) = lookup("INEQ_DEFAULT_YEAR") {
            self.default_year = year.parse().map_err(|_| {
                DashboardError::InvalidRequest(format!("INEQ_DEFAULT_YEAR '{year}' is not a year"))
            })?;
        }
        Ok(())
    }
}
