//! Measure resolution
//!
//! A direct statistic is read straight off the observation rows. A
//! difference measure runs two otherwise identical queries that differ only
//! on the contrasted axis and subtracts them pointwise, joined on
//! (municipality, year). Points present on only one side are dropped.

use std::collections::hash_map::Entry;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::config::DomainConfig;
use crate::error::{DashboardError, Result};
use crate::models::{Contrast, FacetSelection, MeasureKind, Observation, Statistic};
use crate::store::ObservationStore;

/// Observation counts behind a resolved value, for annotation only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointCounts {
    /// Count of the single row a direct statistic was read from
    Single(u64),
    /// Counts of the two contrasted groups
    Contrast { reference: u64, comparison: u64 },
}

impl PointCounts {
    /// Total number of individuals behind the value
    #[must_use]
    pub const fn total(self) -> u64 {
        match self {
            Self::Single(n) => n,
            Self::Contrast {
                reference,
                comparison,
            } => reference.saturating_add(comparison),
        }
    }
}

/// Treatment of rows whose statistic is null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullCells {
    /// Leave them out; what the map draws
    #[default]
    Drop,
    /// Keep them with an empty value; what a download contains
    Keep,
}

/// One resolved (municipality, year) value
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    pub municipality_code: i32,
    pub municipality: Option<String>,
    pub year: i32,
    /// `None` for a null cell kept by [`NullCells::Keep`] or in a series
    pub value: Option<f64>,
    pub counts: PointCounts,
}

/// The values of one resolved measure, ordered by (municipality, year)
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Contrast groups when the measure is a difference
    pub contrast: Option<Contrast>,
    pub points: Vec<ResolvedPoint>,
}

impl Resolution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value at a municipality and year
    #[must_use]
    pub fn value_at(&self, code: i32, year: i32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.municipality_code == code && p.year == year)
            .and_then(|p| p.value)
    }

    /// Points of one municipality, ascending by year
    pub fn series_of(&self, code: i32) -> impl Iterator<Item = &ResolvedPoint> + '_ {
        self.points
            .iter()
            .filter(move |p| p.municipality_code == code)
    }

    /// The two group counts of every point; empty for direct statistics
    pub fn supporting_counts(&self) -> impl Iterator<Item = (i32, i32, u64, u64)> + '_ {
        self.points.iter().filter_map(|p| match p.counts {
            PointCounts::Contrast {
                reference,
                comparison,
            } => Some((p.municipality_code, p.year, reference, comparison)),
            PointCounts::Single(_) => None,
        })
    }
}

/// Resolves measures of one domain against the shared store
#[derive(Debug, Clone, Copy)]
pub struct MeasureResolver<'a> {
    store: &'a ObservationStore,
    config: &'a DomainConfig,
}

impl<'a> MeasureResolver<'a> {
    #[must_use]
    pub const fn new(store: &'a ObservationStore, config: &'a DomainConfig) -> Self {
        Self { store, config }
    }

    /// Resolve a measure for a cross-section (`year`) or a full series
    ///
    /// # Errors
    /// `InvalidFacetCombination` when the domain does not offer `measure` for
    /// `variable`; `UnknownKey` for an unknown variable.
    pub fn resolve(
        &self,
        measure: MeasureKind,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
    ) -> Result<Resolution> {
        self.resolve_with(measure, variable, year, facets, NullCells::Drop)
    }

    /// [`resolve`](Self::resolve) with an explicit treatment of null cells
    pub fn resolve_with(
        &self,
        measure: MeasureKind,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
        nulls: NullCells,
    ) -> Result<Resolution> {
        self.config.check(variable, measure)?;
        match (measure.statistic(), self.config.contrast(measure)) {
            (Some(statistic), _) => self.resolve_direct(statistic, variable, year, facets, nulls),
            (None, Some(contrast)) => self.join_contrast(contrast, variable, year, facets, nulls),
            (None, None) => Err(DashboardError::InvalidFacetCombination {
                domain: self.config.domain().key().to_string(),
                variable: variable.to_string(),
                measure: measure.key().to_string(),
            }),
        }
    }

    /// Resolve an explicit contrast: `comparison - reference` of the
    /// domain's difference statistic
    pub fn resolve_contrast(
        &self,
        contrast: Contrast,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
    ) -> Result<Resolution> {
        self.join_contrast(contrast, variable, year, facets, NullCells::Drop)
    }

    fn join_contrast(
        &self,
        contrast: Contrast,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
        nulls: NullCells,
    ) -> Result<Resolution> {
        let statistic = self.config.difference_statistic();
        let (reference_facets, comparison_facets) = contrast.split(*facets);
        let reference = self.fetch(statistic, variable, year, &reference_facets, nulls)?;
        let comparison = self.fetch(statistic, variable, year, &comparison_facets, nulls)?;
        let joinable =
            |row: &&Observation| nulls == NullCells::Keep || row.value(statistic).is_some();

        let mut by_key: FxHashMap<(i32, i32), &Observation> = FxHashMap::default();
        for row in reference.iter().filter(joinable) {
            by_key.insert((row.municipality_code, row.year), row);
        }

        let mut points = Vec::with_capacity(by_key.len().min(comparison.len()));
        for row in comparison.iter().filter(joinable) {
            let Entry::Occupied(slot) = by_key.entry((row.municipality_code, row.year)) else {
                continue;
            };
            let base = slot.remove();
            let value = row
                .value(statistic)
                .zip(base.value(statistic))
                .map(|(comparison, reference)| comparison - reference);
            points.push(ResolvedPoint {
                municipality_code: row.municipality_code,
                municipality: row.municipality.clone().or_else(|| base.municipality.clone()),
                year: row.year,
                value,
                counts: PointCounts::Contrast {
                    reference: base.observation_count(),
                    comparison: row.observation_count(),
                },
            });
        }
        points.sort_by_key(|p| (p.municipality_code, p.year));

        let widest = reference.len().max(comparison.len());
        if points.len() < widest {
            warn!(
                "Missing contrast group: {} {} {}/{} keeps {} of {} (municipality, year) points",
                self.config.domain(),
                variable,
                contrast.reference,
                contrast.comparison,
                points.len(),
                widest
            );
        }

        Ok(Resolution {
            contrast: Some(contrast),
            points,
        })
    }

    fn resolve_direct(
        &self,
        statistic: Statistic,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
        nulls: NullCells,
    ) -> Result<Resolution> {
        let rows = self.fetch(statistic, variable, year, facets, nulls)?;
        debug!(
            "Resolved {statistic} of {variable} to {} rows",
            rows.len()
        );
        let points = rows
            .into_iter()
            .map(|row| ResolvedPoint {
                value: row.value(statistic),
                counts: PointCounts::Single(row.observation_count()),
                municipality_code: row.municipality_code,
                year: row.year,
                municipality: row.municipality,
            })
            .collect();
        Ok(Resolution {
            contrast: None,
            points,
        })
    }

    fn fetch(
        &self,
        statistic: Statistic,
        variable: &str,
        year: Option<i32>,
        facets: &FacetSelection,
        nulls: NullCells,
    ) -> Result<Vec<Observation>> {
        let domain = self.config.domain();
        match (year, nulls) {
            (Some(year), NullCells::Drop) => self
                .store
                .cross_section(domain, variable, year, facets, statistic),
            (year, _) => self.store.query(domain, variable, year, facets),
        }
    }
}
