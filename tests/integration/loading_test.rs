use crate::utils::write_data_dir;
use ineq_engine::{
    Dashboard, DashboardError, Domain, FacetSelection, MunicipalityLookup, ObservationStore,
    Result, SelectionChange,
};

/// Load a data directory from disk and resolve the default view
#[tokio::test]
async fn test_dashboard_loads_from_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_data_dir(dir.path());

    let dashboard = Dashboard::load(&config).await?;
    assert_eq!(dashboard.store().domains(), vec![Domain::Income]);
    assert_eq!(dashboard.store().years(Domain::Income), vec![2018, 2019]);
    assert_eq!(dashboard.store().row_count(Domain::Income), 5);
    assert_eq!(dashboard.lookup().len(), 5);

    let mut session = dashboard.session(Domain::Income)?;
    session.select(SelectionChange::Variable("dispon".into()))?;
    let view = dashboard.map_view(Domain::Income, session.selection())?;
    assert_eq!(view.mapped_count(), 2);
    assert_eq!(view.national.value(), Some(0.27));
    Ok(())
}

/// Identical queries return identical rows
#[tokio::test]
async fn test_query_is_idempotent() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_data_dir(dir.path());
    let store = ObservationStore::load(&config).await?;

    let facets = FacetSelection::default();
    let first = store.query(Domain::Income, "dispon", None, &facets)?;
    let second = store.query(Domain::Income, "dispon", None, &facets)?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_missing_lookup_aborts_loading() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = write_data_dir(dir.path());
    config.municipality_lookup = dir.path().join("absent.json");

    let result = Dashboard::load(&config).await;
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_malformed_lookup_is_reference_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("kommune_koder.json");
    std::fs::write(&path, r#"{"101": "København", "0101": "Kbh"}"#)?;
    let result = MunicipalityLookup::load(&path);
    assert!(matches!(result, Err(DashboardError::ReferenceData(_))));
    Ok(())
}
