use crate::utils::{SCENARIO_VARIABLE, scenario_config, scenario_store};
use ineq_engine::models::facets::{FacetValue, Gender};
use ineq_engine::resolver::PointCounts;
use ineq_engine::{DashboardError, FacetSelection, MeasureKind, MeasureResolver, Result, Statistic};

/// Man minus woman at municipality 101 in 2018
#[test]
fn test_gender_difference_end_to_end() -> Result<()> {
    let store = scenario_store();
    let config = scenario_config();
    let resolver = MeasureResolver::new(&store, &config);

    let resolution = resolver.resolve(
        MeasureKind::GenderDifference,
        SCENARIO_VARIABLE,
        Some(2018),
        &FacetSelection::default(),
    )?;

    assert_eq!(resolution.value_at(101, 2018), Some(40_000.0));
    assert_eq!(resolution.value_at(0, 2018), Some(30_000.0));
    let point = resolution
        .points
        .iter()
        .find(|p| p.municipality_code == 101)
        .expect("101 is resolved");
    assert_eq!(
        point.counts,
        PointCounts::Contrast {
            reference: 900,
            comparison: 1_100
        }
    );
    Ok(())
}

/// A municipality present on one side of the contrast only is dropped
#[test]
fn test_missing_contrast_group_is_inner_join() -> Result<()> {
    let store = scenario_store();
    let config = scenario_config();
    let resolver = MeasureResolver::new(&store, &config);

    let cross_section = resolver.resolve(
        MeasureKind::GenderDifference,
        SCENARIO_VARIABLE,
        Some(2018),
        &FacetSelection::default(),
    )?;
    let codes: Vec<_> = cross_section
        .points
        .iter()
        .map(|p| p.municipality_code)
        .collect();
    assert_eq!(codes, vec![0, 101]);

    // The 2019 male row for 147 exists, so the series keeps that year only
    let series = resolver.resolve(
        MeasureKind::GenderDifference,
        SCENARIO_VARIABLE,
        None,
        &FacetSelection::default(),
    )?;
    let years: Vec<_> = series.series_of(147).map(|p| p.year).collect();
    assert_eq!(years, vec![2019]);
    assert_eq!(series.value_at(147, 2019), Some(17_000.0));
    Ok(())
}

#[test]
fn test_direct_statistic_series_includes_national_row() -> Result<()> {
    let store = scenario_store();
    let config = scenario_config();
    let resolver = MeasureResolver::new(&store, &config);
    let women = FacetSelection::default().with(FacetValue::Gender(Gender::Woman));

    let series = resolver.resolve(
        MeasureKind::Direct(Statistic::Mean),
        SCENARIO_VARIABLE,
        None,
        &women,
    )?;
    let national: Vec<_> = series.series_of(0).map(|p| (p.year, p.value)).collect();
    assert_eq!(
        national,
        vec![(2018, Some(205_000.0)), (2019, Some(210_000.0))]
    );
    assert!(series.contrast.is_none());
    Ok(())
}

#[test]
fn test_empty_result_is_not_an_error() -> Result<()> {
    let store = scenario_store();
    let config = scenario_config();
    let resolver = MeasureResolver::new(&store, &config);

    let resolution = resolver.resolve(
        MeasureKind::Direct(Statistic::Mean),
        SCENARIO_VARIABLE,
        Some(1999),
        &FacetSelection::default(),
    )?;
    assert!(resolution.is_empty());
    Ok(())
}

#[test]
fn test_unoffered_measure_is_rejected() {
    let store = scenario_store();
    let config = scenario_config();
    let resolver = MeasureResolver::new(&store, &config);

    let result = resolver.resolve(
        MeasureKind::Direct(Statistic::TheilT),
        SCENARIO_VARIABLE,
        Some(2018),
        &FacetSelection::default(),
    );
    assert!(matches!(
        result,
        Err(DashboardError::InvalidFacetCombination { .. })
    ));
}
