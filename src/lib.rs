//! Query and aggregation engine for municipality-level inequality indicators.
//!
//! Observation tables of pre-computed statistics (Gini, Theil, means,
//! percentile ratios) broken down by demographic facets are loaded once into
//! an immutable [`ObservationStore`]. Selections are normalised by the
//! [`SelectionPolicy`], resolved into cross-sections or series by the
//! [`MeasureResolver`], and shaped into map, chart and export views by the
//! [`Dashboard`].

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod memory;
pub mod models;
pub mod reference;
pub mod resolver;
pub mod selection;
pub mod store;
pub mod utils;

// Core types
pub use config::{DomainConfig, DomainConfigBuilder, EngineConfig, TableFormat, VariableSpec};
pub use engine::{Dashboard, MapCell, MapView, SeriesView, Session, Trace};
pub use error::{DashboardError, Result};
pub use models::{
    Contrast, Domain, FacetAxis, FacetSelection, FacetValue, MeasureKind, Observation,
    Selection, SelectionChange, Statistic,
};

// Components
pub use export::{CsvEncoder, ExportAdapter, ExportRequest, ExportTable, ImageRenderer};
pub use memory::SeriesMemory;
pub use reference::MunicipalityLookup;
pub use resolver::{MeasureResolver, NullCells, Resolution};
pub use selection::{NormalizedSelection, SelectionPolicy, SelectorOptions};
pub use store::ObservationStore;

// Arrow types
pub use arrow::record_batch::RecordBatch;
