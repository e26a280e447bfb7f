use std::collections::BTreeSet;

use crate::utils::{SCENARIO_VARIABLE, scenario_dashboard};
use ineq_engine::export::{EXPORT_COLUMNS, ExportView, TableEncoder};
use ineq_engine::{CsvEncoder, Domain, ExportRequest, ImageRenderer, Result};

/// Cross-section export covers every code in the filtered table plus the
/// national row, with the fixed four columns
#[test]
fn test_cross_section_export_has_fixed_columns() -> Result<()> {
    let dashboard = scenario_dashboard();
    let adapter = dashboard.export_adapter(Domain::Income)?;
    let request = ExportRequest::from_query_pairs([
        ("variable", SCENARIO_VARIABLE),
        ("measure", "mean"),
        ("year", "2018"),
    ])?;

    let table = adapter.export_table(&request)?;
    assert_eq!(table.view, ExportView::Map);
    assert_eq!(table.codes(), BTreeSet::from([0, 101, 147]));

    let batch = table.to_record_batch()?;
    assert_eq!(batch.num_columns(), 4);
    let names: Vec<_> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, EXPORT_COLUMNS);
    Ok(())
}

#[test]
fn test_difference_export_sums_group_counts() -> Result<()> {
    let dashboard = scenario_dashboard();
    let adapter = dashboard.export_adapter(Domain::Income)?;
    let request = ExportRequest::from_query_pairs([
        ("variable", SCENARIO_VARIABLE),
        ("measure", "diff_gender"),
        ("year", "2018"),
    ])?;

    let table = adapter.export_table(&request)?;
    let row = table
        .rows
        .iter()
        .find(|r| r.municipality_code == 101)
        .expect("101 is exported");
    assert_eq!(row.observation_count, 2_000);
    assert_eq!(row.value, Some(40_000.0));
    Ok(())
}

#[test]
fn test_series_export_always_includes_national_row() -> Result<()> {
    let dashboard = scenario_dashboard();
    let mut session = dashboard.session(Domain::Income)?;
    session.select(ineq_engine::SelectionChange::Measure(
        ineq_engine::MeasureKind::Direct(ineq_engine::Statistic::Mean),
    ))?;
    session.pin("Frederiksberg");

    let request = dashboard.series_export_request(&session);
    let payload = dashboard
        .export_adapter(Domain::Income)?
        .export_file(&request, &CsvEncoder)?;
    assert_eq!(payload.filename, "RFF-serie.csv");
    assert_eq!(payload.mime, CsvEncoder.mime());

    let text = String::from_utf8(payload.bytes).expect("csv is utf-8");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "municipality_code,observation_count,year,value");
    // two years each for the national row and Frederiksberg
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("0,"));
    assert!(lines[3].starts_with("147,"));
    Ok(())
}

struct StaticRenderer;

impl ImageRenderer for StaticRenderer {
    type Figure = &'static [u8];

    fn render_png(&self, figure: &Self::Figure) -> anyhow::Result<Vec<u8>> {
        Ok(figure.to_vec())
    }
}

#[test]
fn test_image_export_wraps_rendered_bytes() -> Result<()> {
    let dashboard = scenario_dashboard();
    let adapter = dashboard.export_adapter(Domain::Income)?;
    let png: &'static [u8] = b"\x89PNG";
    let payload = adapter.export_image(&StaticRenderer, &png, ExportView::Map)?;
    assert_eq!(payload.filename, "RFF-kort.png");
    assert_eq!(payload.mime, "image/png");
    assert_eq!(payload.bytes, png);
    Ok(())
}
