use crate::utils::{SCENARIO_VARIABLE, scenario_dashboard};
use ineq_engine::memory::{NATIONAL_COLOR, PaletteColor};
use ineq_engine::models::ScaleKind;
use ineq_engine::models::facets::{FacetValue, Gender};
use ineq_engine::{Domain, MapCell, MeasureKind, Result, SelectionChange, Statistic};

/// A lookup municipality without rows is a missing record, not a value
#[test]
fn test_missing_municipality_gets_sentinel() -> Result<()> {
    let dashboard = scenario_dashboard();
    let mut session = dashboard.session(Domain::Income)?;
    session.select(SelectionChange::Measure(MeasureKind::Direct(Statistic::Mean)))?;

    let view = dashboard.map_view(Domain::Income, session.selection())?;
    assert_eq!(view.year, 2018);
    assert_eq!(view.entries.len(), 3);
    assert_eq!(view.cell(555), Some(&MapCell::Missing));
    assert_eq!(view.cell(101).and_then(MapCell::value), Some(220_000.0));
    assert_eq!(view.national.value(), Some(220_000.0));
    assert_eq!((view.mapped_count(), view.missing_count()), (2, 1));
    Ok(())
}

#[test]
fn test_difference_map_is_diverging() -> Result<()> {
    let dashboard = scenario_dashboard();
    let mut session = dashboard.session(Domain::Income)?;
    session.select(SelectionChange::Facet(FacetValue::Gender(Gender::Woman)))?;
    session.select(SelectionChange::Measure(MeasureKind::GenderDifference))?;
    assert_eq!(session.selection().facets.gender, Gender::All);

    let view = dashboard.map_view(Domain::Income, session.selection())?;
    assert_eq!(view.scale, ScaleKind::Diverging);
    assert!(view.contrast.is_some());
    // 147 lacks a male row in 2018
    assert!(view.cell(147).is_some_and(MapCell::is_missing));
    assert_eq!(view.value_range(), Some((-40_000.0, 40_000.0)));
    Ok(())
}

#[test]
fn test_series_view_follows_pins() -> Result<()> {
    let dashboard = scenario_dashboard();
    let mut session = dashboard.session(Domain::Income)?;
    session.select(SelectionChange::Variable(SCENARIO_VARIABLE.into()))?;
    session.select(SelectionChange::Measure(MeasureKind::Direct(Statistic::Mean)))?;
    session.pin("København");
    session.pin("Testrup");

    let view = dashboard.series_view(Domain::Income, session.selection(), session.memory())?;
    let names: Vec<_> = view.traces.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Hele Danmark", "København", "Testrup"]);
    assert_eq!(view.traces[0].color, NATIONAL_COLOR);
    assert_eq!(view.traces[1].color, PaletteColor::TEAL);
    assert_eq!(view.traces[1].points.len(), 2);
    // Stale pin: in the lookup but without data
    assert_eq!(view.traces[2].code, Some(555));
    assert!(view.traces[2].points.is_empty());

    session.clear_pins();
    let view = dashboard.series_view(Domain::Income, session.selection(), session.memory())?;
    assert_eq!(view.traces.len(), 1);
    Ok(())
}

#[test]
fn test_session_starts_on_latest_year_when_default_is_absent() -> Result<()> {
    let dashboard = ineq_engine::Dashboard::new(
        std::sync::Arc::new(crate::utils::scenario_store()),
        std::sync::Arc::new(crate::utils::scenario_lookup()),
        2030,
    );
    assert_eq!(dashboard.initial_year(Domain::Income), 2019);
    assert_eq!(dashboard.initial_year(Domain::Health), 2030);
    Ok(())
}
