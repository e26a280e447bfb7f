use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use ineq_engine::config::VariableSpec;
use ineq_engine::models::facets::{FacetValue, Gender};
use ineq_engine::utils::test::{TableBuilder, sample_lookup, write_lookup_file};
use ineq_engine::{
    Dashboard, Domain, DomainConfig, EngineConfig, MeasureKind, MunicipalityLookup,
    ObservationStore, Statistic, TableFormat,
};

/// Variable key of the gender scenario table
pub const SCENARIO_VARIABLE: &str = "income";

/// Mean income by gender for 2018 and 2019
///
/// Municipality 147 has no male row in 2018 and 555 has no rows at all.
#[must_use]
pub fn scenario_batches() -> Vec<RecordBatch> {
    let mut batches = Vec::new();
    for year in [2018, 2019] {
        let bump = f64::from(year - 2018) * 5_000.0;
        let all = TableBuilder::new(SCENARIO_VARIABLE)
            .year(year)
            .statistic(Statistic::Mean)
            .observations(2_000)
            .row(0, 220_000.0 + bump)
            .row(101, 220_000.0 + bump)
            .row(147, 250_000.0 + bump)
            .build();
        let women = TableBuilder::new(SCENARIO_VARIABLE)
            .year(year)
            .statistic(Statistic::Mean)
            .facet(FacetValue::Gender(Gender::Woman))
            .observations(900)
            .row(0, 205_000.0 + bump)
            .row(101, 200_000.0 + bump)
            .row(147, 240_000.0 + bump)
            .build();
        let mut men = TableBuilder::new(SCENARIO_VARIABLE)
            .year(year)
            .statistic(Statistic::Mean)
            .facet(FacetValue::Gender(Gender::Man))
            .observations(1_100)
            .row(0, 235_000.0 + bump)
            .row(101, 240_000.0 + bump);
        if year == 2019 {
            men = men.row(147, 262_000.0);
        }
        batches.extend([all, women, men.build()]);
    }
    batches
}

/// Income descriptor with the single scenario variable
#[must_use]
pub fn scenario_config() -> DomainConfig {
    DomainConfig::builder(Domain::Income)
        .variable(VariableSpec::continuous(SCENARIO_VARIABLE))
        .statistics(&[Statistic::Gini, Statistic::Mean])
        .differences(&[MeasureKind::GenderDifference, MeasureKind::HeritageDifference])
        .difference_statistic(Statistic::Mean)
        .fallback(MeasureKind::Direct(Statistic::Mean))
        .build()
        .expect("scenario descriptor is valid")
}

/// Lookup with a municipality the scenario table never mentions
#[must_use]
pub fn scenario_lookup() -> MunicipalityLookup {
    MunicipalityLookup::from_entries([(101, "København"), (147, "Frederiksberg"), (555, "Testrup")])
        .expect("scenario lookup is valid")
}

#[must_use]
pub fn scenario_store() -> ObservationStore {
    ObservationStore::from_batches([(Domain::Income, scenario_batches())])
        .expect("scenario batches conform")
}

#[must_use]
pub fn scenario_dashboard() -> Dashboard {
    Dashboard::new(
        Arc::new(scenario_store()),
        Arc::new(scenario_lookup()),
        2018,
    )
    .with_domain_config(scenario_config())
}

/// Write a data directory with an income table and the sample lookup
///
/// Returns the configuration pointing at it.
#[must_use]
pub fn write_data_dir(dir: &Path) -> EngineConfig {
    let income = TableBuilder::new("dispon")
        .row(0, 0.27)
        .row(101, 0.34)
        .row(751, 0.29)
        .year(2019)
        .row(0, 0.28)
        .row(101, 0.35)
        .build();
    TableBuilder::write_parquet(&income, &dir.join("income.parquet"));

    let lookup_path = dir.join("kommune_koder.json");
    write_lookup_file(&sample_lookup(), &lookup_path);

    EngineConfig {
        data_dir: dir.to_path_buf(),
        municipality_lookup: lookup_path,
        table_format: TableFormat::Parquet,
        batch_size: 1024,
        load_parallelism: 2,
        default_year: 2018,
    }
}
