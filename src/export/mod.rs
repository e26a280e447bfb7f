//! Export boundary
//!
//! Projects resolved measures onto the fixed four-column download table and
//! wraps rendered figures for download. No values are computed here beyond
//! what the resolver returns.

use std::collections::BTreeSet;

use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::models::facets::{FacetAxis, FacetSelection, FacetValue};
use crate::models::{MeasureKind, NATIONAL_CODE};
use crate::resolver::{MeasureResolver, NullCells};

/// Header labels of the export table, in column order
pub const EXPORT_COLUMNS: [&str; 4] = ["municipality_code", "observation_count", "year", "value"];

/// Which view an export belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportView {
    /// Cross-section shown on the map
    Map,
    /// Time series chart
    Series,
}

impl ExportView {
    const fn stem(self) -> &'static str {
        match self {
            Self::Map => "RFF-kort",
            Self::Series => "RFF-serie",
        }
    }

    /// Download file name of the data table
    #[must_use]
    pub fn csv_filename(self) -> String {
        format!("{}.csv", self.stem())
    }

    /// Download file name of the rendered figure
    #[must_use]
    pub fn png_filename(self) -> String {
        format!("{}.png", self.stem())
    }
}

/// Rows an export covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    /// Every municipality in one year
    CrossSection { year: i32 },
    /// The given municipalities across all years; the national row is
    /// always included
    Series { municipalities: BTreeSet<i32> },
}

impl ExportScope {
    #[must_use]
    pub const fn view(&self) -> ExportView {
        match self {
            Self::CrossSection { .. } => ExportView::Map,
            Self::Series { .. } => ExportView::Series,
        }
    }
}

/// A parsed export request
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub variable: String,
    pub measure: MeasureKind,
    pub facets: FacetSelection,
    pub scope: ExportScope,
}

impl ExportRequest {
    /// Series export of `codes` plus the national row
    #[must_use]
    pub fn series(
        variable: impl Into<String>,
        measure: MeasureKind,
        facets: FacetSelection,
        codes: impl IntoIterator<Item = i32>,
    ) -> Self {
        let mut municipalities: BTreeSet<i32> = codes.into_iter().collect();
        municipalities.insert(NATIONAL_CODE);
        Self {
            variable: variable.into(),
            measure,
            facets,
            scope: ExportScope::Series { municipalities },
        }
    }

    /// Parse URL query pairs
    ///
    /// `municipalities` may repeat and may hold comma separated codes.
    /// A `year` makes this a cross-section export, otherwise a series export.
    ///
    /// # Errors
    /// `InvalidRequest` for missing or malformed parameters, `UnknownKey`
    /// for unknown measure or facet keys
    pub fn from_query_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut variable = None;
        let mut measure = None;
        let mut year = None;
        let mut facets = FacetSelection::default();
        let mut municipalities = BTreeSet::new();

        for (key, value) in pairs {
            match key {
                "variable" => variable = Some(value.to_string()),
                "measure" => measure = Some(value.parse::<MeasureKind>()?),
                "year" => {
                    let parsed = value.trim().parse::<i32>().map_err(|_| {
                        DashboardError::InvalidRequest(format!("year '{value}' is not an integer"))
                    })?;
                    year = Some(parsed);
                }
                "municipalities" => {
                    for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                        let code = code.parse::<i32>().map_err(|_| {
                            DashboardError::InvalidRequest(format!(
                                "municipality code '{code}' is not an integer"
                            ))
                        })?;
                        municipalities.insert(code);
                    }
                }
                other => match FacetAxis::ALL.into_iter().find(|a| a.column() == other) {
                    Some(axis) => facets.set(FacetValue::parse(axis, value)?),
                    None => debug!("Ignoring export parameter {other}"),
                },
            }
        }

        let variable = variable
            .ok_or_else(|| DashboardError::InvalidRequest("missing 'variable' parameter".into()))?;
        let measure = measure
            .ok_or_else(|| DashboardError::InvalidRequest("missing 'measure' parameter".into()))?;

        Ok(match year {
            Some(year) => {
                if !municipalities.is_empty() {
                    warn!("Cross-section export ignores the municipalities parameter");
                }
                Self {
                    variable,
                    measure,
                    facets,
                    scope: ExportScope::CrossSection { year },
                }
            }
            None => Self::series(variable, measure, facets, municipalities),
        })
    }
}

/// One row of the download table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub municipality_code: i32,
    /// Individuals behind the value; both groups summed for differences
    pub observation_count: u64,
    pub year: i32,
    pub value: Option<f64>,
}

/// The download table of one export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub view: ExportView,
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    /// Arrow schema of the table, columns in [`EXPORT_COLUMNS`] order
    #[must_use]
    pub fn schema() -> Schema {
        Schema::new(vec![
            Field::new(EXPORT_COLUMNS[0], DataType::Int32, false),
            Field::new(EXPORT_COLUMNS[1], DataType::UInt64, false),
            Field::new(EXPORT_COLUMNS[2], DataType::Int32, false),
            Field::new(EXPORT_COLUMNS[3], DataType::Float64, true),
        ])
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<FieldRef> = Self::schema().fields().iter().cloned().collect();
        Ok(serde_arrow::to_record_batch(&fields, &self.rows)?)
    }

    /// Codes present in the table, ascending
    #[must_use]
    pub fn codes(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.municipality_code).collect()
    }
}

/// Encodes an export table into a downloadable file
pub trait TableEncoder {
    /// MIME type of the encoded bytes
    fn mime(&self) -> &'static str;

    fn encode(&self, batch: &RecordBatch) -> Result<Vec<u8>>;
}

/// CSV with a header row
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvEncoder;

impl TableEncoder for CsvEncoder {
    fn mime(&self) -> &'static str {
        "text/csv"
    }

    fn encode(&self, batch: &RecordBatch) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut writer = WriterBuilder::new().with_header(true).build(&mut buffer);
            writer.write(batch)?;
        }
        Ok(buffer)
    }
}

/// Renders a figure handle into PNG bytes; implemented outside the engine
pub trait ImageRenderer {
    type Figure;

    fn render_png(&self, figure: &Self::Figure) -> anyhow::Result<Vec<u8>>;
}

/// A file ready for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Builds downloads from resolved measures
#[derive(Debug, Clone, Copy)]
pub struct ExportAdapter<'a> {
    resolver: MeasureResolver<'a>,
}

impl<'a> ExportAdapter<'a> {
    #[must_use]
    pub const fn new(resolver: MeasureResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Rows of the requested slice, ordered by (municipality, year)
    ///
    /// Rows whose value is null are exported with an empty value.
    pub fn export_table(&self, request: &ExportRequest) -> Result<ExportTable> {
        let year = match &request.scope {
            ExportScope::CrossSection { year } => Some(*year),
            ExportScope::Series { .. } => None,
        };
        let resolution = self.resolver.resolve_with(
            request.measure,
            &request.variable,
            year,
            &request.facets,
            NullCells::Keep,
        )?;

        let rows: Vec<ExportRow> = resolution
            .points
            .into_iter()
            .filter(|p| match &request.scope {
                ExportScope::CrossSection { .. } => true,
                ExportScope::Series { municipalities } => {
                    municipalities.contains(&p.municipality_code)
                }
            })
            .map(|p| ExportRow {
                municipality_code: p.municipality_code,
                observation_count: p.counts.total(),
                year: p.year,
                value: p.value,
            })
            .collect();

        debug!(
            "Export of {} {} has {} rows",
            request.variable,
            request.measure,
            rows.len()
        );
        Ok(ExportTable {
            view: request.scope.view(),
            rows,
        })
    }

    /// Encoded download of the requested slice
    pub fn export_file<E: TableEncoder>(
        &self,
        request: &ExportRequest,
        encoder: &E,
    ) -> Result<ExportPayload> {
        let table = self.export_table(request)?;
        let bytes = encoder.encode(&table.to_record_batch()?)?;
        Ok(ExportPayload {
            filename: table.view.csv_filename(),
            mime: encoder.mime(),
            bytes,
        })
    }

    /// Wrap a rendered figure for download
    pub fn export_image<R: ImageRenderer>(
        &self,
        renderer: &R,
        figure: &R::Figure,
        view: ExportView,
    ) -> Result<ExportPayload> {
        let bytes = renderer
            .render_png(figure)
            .map_err(|e| DashboardError::Export(format!("{} rendering failed: {e:#}", view.png_filename())))?;
        Ok(ExportPayload {
            filename: view.png_filename(),
            mime: "image/png",
            bytes,
        })
    }
}
