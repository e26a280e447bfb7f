use ineq_engine::models::facets::{Education, FacetAxis, Gender, Heritage, Labor};
use ineq_engine::{
    DomainConfig, FacetValue, MeasureKind, Result, SelectionChange, SelectionPolicy, Statistic,
};

fn change(
    policy: &SelectionPolicy<'_>,
    selection: &ineq_engine::Selection,
    change: SelectionChange,
) -> Result<ineq_engine::NormalizedSelection> {
    let mut next = selection.clone();
    let field = next.apply(change);
    policy.normalize(&next, field)
}

#[test]
fn test_gender_difference_disables_gender_options() -> Result<()> {
    let config = DomainConfig::health();
    let policy = SelectionPolicy::new(&config);
    let start = policy.initial(2018)?;

    let result = change(
        &policy,
        &start.selection,
        SelectionChange::Measure(MeasureKind::GenderDifference),
    )?;

    assert_eq!(result.selection.facets.gender, Gender::All);
    assert!(result.options.facet_enabled(FacetValue::Gender(Gender::All)));
    assert!(!result.options.facet_enabled(FacetValue::Gender(Gender::Woman)));
    assert!(!result.options.facet_enabled(FacetValue::Gender(Gender::Man)));
    Ok(())
}

#[test]
fn test_switching_back_to_direct_measure_reenables_axis() -> Result<()> {
    let config = DomainConfig::income();
    let policy = SelectionPolicy::new(&config);
    let start = policy.initial(2018)?;

    let diff = change(
        &policy,
        &start.selection,
        SelectionChange::Measure(MeasureKind::HeritageDifference),
    )?;
    assert!(!diff.options.facet_enabled(FacetValue::Heritage(Heritage::Danish)));

    let direct = change(
        &policy,
        &diff.selection,
        SelectionChange::Measure(MeasureKind::Direct(Statistic::Mean)),
    )?;
    assert!(direct.options.facet_enabled(FacetValue::Heritage(Heritage::Danish)));
    Ok(())
}

/// Unskilled forces low; choosing high afterwards forces skilled
#[test]
fn test_labor_education_coupling_is_consistent() -> Result<()> {
    let config = DomainConfig::health();
    let policy = SelectionPolicy::new(&config);
    let start = policy.initial(2018)?;

    let unskilled = change(
        &policy,
        &start.selection,
        SelectionChange::Facet(FacetValue::Labor(Labor::Unskilled)),
    )?;
    assert_eq!(unskilled.selection.facets.labor, Labor::Unskilled);
    assert_eq!(unskilled.selection.facets.education, Education::Low);

    let high = change(
        &policy,
        &unskilled.selection,
        SelectionChange::Facet(FacetValue::Education(Education::High)),
    )?;
    assert_eq!(high.selection.facets.education, Education::High);
    assert_eq!(high.selection.facets.labor, Labor::Skilled);

    // No contradictory state: the selected values are always enabled
    for axis in FacetAxis::ALL {
        let value = high.selection.facets.get(axis);
        assert!(high.options.facet_enabled(value), "{axis} value {value} is disabled");
    }
    Ok(())
}

#[test]
fn test_binary_variable_hides_theil_and_ratios() -> Result<()> {
    let config = DomainConfig::education();
    let policy = SelectionPolicy::new(&config);
    let start = policy.initial(2018)?;

    let result = change(
        &policy,
        &start.selection,
        SelectionChange::Variable("education".into()),
    )?;
    for stat in [Statistic::TheilL, Statistic::TheilT, Statistic::P90P10] {
        assert!(!result.options.measure_enabled(MeasureKind::Direct(stat)));
    }
    assert!(result.options.measure_enabled(MeasureKind::Direct(Statistic::Mean)));
    assert!(!result.options.measure_enabled(MeasureKind::LaborDifference));
    Ok(())
}

#[test]
fn test_normalize_is_a_pure_function() -> Result<()> {
    let config = DomainConfig::income();
    let policy = SelectionPolicy::new(&config);
    let start = policy.initial(2018)?;
    let first = change(
        &policy,
        &start.selection,
        SelectionChange::Facet(FacetValue::Labor(Labor::Unskilled)),
    )?;
    let second = change(
        &policy,
        &start.selection,
        SelectionChange::Facet(FacetValue::Labor(Labor::Unskilled)),
    )?;
    assert_eq!(first, second);
    Ok(())
}
