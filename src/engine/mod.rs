//! Dashboard engine
//!
//! Ties the shared, read-only store and reference data to the per-domain
//! descriptors and hands out session-scoped state. A [`Dashboard`] is built
//! once at startup and shared; each user gets a [`Session`].

use std::sync::Arc;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::config::{DomainConfig, EngineConfig};
use crate::error::{DashboardError, Result};
use crate::export::{ExportAdapter, ExportRequest};
use crate::memory::{NATIONAL_COLOR, PaletteColor, SeriesMemory};
use crate::models::{
    Contrast, Domain, MeasureKind, NATIONAL_CODE, ScaleKind, Selection, SelectionChange,
};
use crate::reference::{MunicipalityLookup, NATIONAL_NAME};
use crate::resolver::{MeasureResolver, PointCounts, ResolvedPoint};
use crate::selection::{NormalizedSelection, SelectionPolicy, SelectorOptions};
use crate::store::ObservationStore;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Shared engine state of all domain pages
#[derive(Debug, Clone)]
pub struct Dashboard {
    store: Arc<ObservationStore>,
    lookup: Arc<MunicipalityLookup>,
    domains: FxHashMap<Domain, Arc<DomainConfig>>,
    default_year: i32,
}

impl Dashboard {
    /// Dashboard with the built-in descriptor of every domain
    #[must_use]
    pub fn new(
        store: Arc<ObservationStore>,
        lookup: Arc<MunicipalityLookup>,
        default_year: i32,
    ) -> Self {
        let domains = Domain::ALL
            .into_iter()
            .map(|d| (d, Arc::new(DomainConfig::builtin(d))))
            .collect();
        Self {
            store,
            lookup,
            domains,
            default_year,
        }
    }

    /// Load the store and lookup described by `config`
    pub async fn load(config: &EngineConfig) -> Result<Self> {
        let start = std::time::Instant::now();
        log_operation_start("Loading dashboard data from", &config.data_dir);
        let store = ObservationStore::load(config).await?;
        let lookup_path = config.municipality_lookup.clone();
        let lookup = tokio::task::spawn_blocking(move || MunicipalityLookup::load(&lookup_path))
            .await
            .map_err(|e| anyhow::anyhow!("lookup loading task failed: {e}"))??;
        let rows = store.domains().into_iter().map(|d| store.row_count(d)).sum();
        log_operation_complete("loaded", &config.data_dir, rows, Some(start.elapsed()));
        Ok(Self::new(
            Arc::new(store),
            Arc::new(lookup),
            config.default_year,
        ))
    }

    /// Replace the descriptor of one domain
    #[must_use]
    pub fn with_domain_config(mut self, config: DomainConfig) -> Self {
        self.domains.insert(config.domain(), Arc::new(config));
        self
    }

    #[must_use]
    pub fn store(&self) -> &ObservationStore {
        &self.store
    }

    #[must_use]
    pub fn lookup(&self) -> &MunicipalityLookup {
        &self.lookup
    }

    /// Descriptor of a domain
    pub fn config(&self, domain: Domain) -> Result<&DomainConfig> {
        self.domains
            .get(&domain)
            .map(AsRef::as_ref)
            .ok_or_else(|| DashboardError::unknown_key("domain", domain.key()))
    }

    pub fn resolver(&self, domain: Domain) -> Result<MeasureResolver<'_>> {
        Ok(MeasureResolver::new(&self.store, self.config(domain)?))
    }

    pub fn export_adapter(&self, domain: Domain) -> Result<ExportAdapter<'_>> {
        Ok(ExportAdapter::new(self.resolver(domain)?))
    }

    /// Year a new session starts on: the configured default when the domain
    /// has data for it, otherwise the domain's latest year
    #[must_use]
    pub fn initial_year(&self, domain: Domain) -> i32 {
        let years = self.store.years(domain);
        if years.is_empty() || years.contains(&self.default_year) {
            self.default_year
        } else {
            years.last().copied().unwrap_or(self.default_year)
        }
    }

    /// Start a session on a domain page
    pub fn session(&self, domain: Domain) -> Result<Session> {
        let config = self
            .domains
            .get(&domain)
            .cloned()
            .ok_or_else(|| DashboardError::unknown_key("domain", domain.key()))?;
        let state = SelectionPolicy::new(&config).initial(self.initial_year(domain))?;
        debug!("New {domain} session on {}", state.selection.year);
        Ok(Session {
            config,
            state,
            memory: SeriesMemory::new(),
        })
    }

    /// Cross-section of the selection for the map
    ///
    /// Every municipality of the lookup gets an entry; those without a
    /// resolved value are marked missing.
    pub fn map_view(&self, domain: Domain, selection: &Selection) -> Result<MapView> {
        let resolution = self.resolver(domain)?.resolve(
            selection.measure,
            &selection.variable,
            Some(selection.year),
            &selection.facets,
        )?;

        let mut by_code: FxHashMap<i32, &ResolvedPoint> = resolution
            .points
            .iter()
            .map(|p| (p.municipality_code, p))
            .collect();
        let national = by_code.remove(&NATIONAL_CODE).map_or(MapCell::Missing, MapCell::from);

        let entries: Vec<MapEntry> = self
            .lookup
            .iter()
            .map(|(code, name)| MapEntry {
                code,
                name: name.to_string(),
                cell: by_code.remove(&code).map_or(MapCell::Missing, MapCell::from),
            })
            .collect();
        if !by_code.is_empty() {
            debug!(
                "{} resolved municipality codes are not in the lookup",
                by_code.len()
            );
        }

        Ok(MapView {
            year: selection.year,
            measure: selection.measure,
            scale: selection.measure.scale(),
            contrast: resolution.contrast,
            national,
            entries,
        })
    }

    /// National trace plus one trace per pinned municipality
    pub fn series_view(
        &self,
        domain: Domain,
        selection: &Selection,
        memory: &SeriesMemory,
    ) -> Result<SeriesView> {
        let resolution = self.resolver(domain)?.resolve(
            selection.measure,
            &selection.variable,
            None,
            &selection.facets,
        )?;
        let trace_of = |code: i32| -> Vec<SeriesPoint> {
            resolution
                .series_of(code)
                .map(|p| SeriesPoint {
                    year: p.year,
                    value: p.value,
                })
                .collect()
        };

        let mut traces = Vec::with_capacity(memory.len() + 1);
        traces.push(Trace {
            name: NATIONAL_NAME.to_string(),
            code: Some(NATIONAL_CODE),
            color: NATIONAL_COLOR,
            points: trace_of(NATIONAL_CODE),
        });
        for (name, color) in memory.iter() {
            let code = self.lookup.code(name);
            let points = code.map(&trace_of).unwrap_or_default();
            if points.is_empty() {
                debug!("Pinned municipality {name} has no data for the current selection");
            }
            traces.push(Trace {
                name: name.to_string(),
                code,
                color,
                points,
            });
        }

        Ok(SeriesView {
            measure: selection.measure,
            contrast: resolution.contrast,
            traces,
        })
    }

    /// Series export of a session's pins
    #[must_use]
    pub fn series_export_request(&self, session: &Session) -> ExportRequest {
        let selection = session.selection();
        let codes = session
            .memory()
            .names()
            .iter()
            .filter_map(|name| self.lookup.code(name));
        ExportRequest::series(
            selection.variable.clone(),
            selection.measure,
            selection.facets,
            codes,
        )
    }

    /// Log a per-domain summary of the loaded data
    pub fn log_summary(&self) {
        info!("{} municipalities in lookup", self.lookup.len());
        for domain in self.store.domains() {
            let years = self.store.years(domain);
            info!(
                "{domain}: {} rows, years {:?}..{:?}",
                self.store.row_count(domain),
                years.first(),
                years.last()
            );
        }
    }
}

/// Selector state and pins of one user on one domain page
#[derive(Debug, Clone)]
pub struct Session {
    config: Arc<DomainConfig>,
    state: NormalizedSelection,
    memory: SeriesMemory,
}

impl Session {
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.config.domain()
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.state.selection
    }

    #[must_use]
    pub const fn options(&self) -> &SelectorOptions {
        &self.state.options
    }

    #[must_use]
    pub const fn memory(&self) -> &SeriesMemory {
        &self.memory
    }

    /// Apply one selector change and normalise the result
    ///
    /// On error the previous selection is kept.
    pub fn select(&mut self, change: SelectionChange) -> Result<&NormalizedSelection> {
        let mut next = self.state.selection.clone();
        let field = next.apply(change);
        self.state = SelectionPolicy::new(&self.config).normalize(&next, field)?;
        Ok(&self.state)
    }

    /// Pin a municipality clicked on the map
    pub fn pin(&mut self, name: impl Into<String>) {
        self.memory.pin(name);
    }

    pub fn clear_pins(&mut self) {
        self.memory.clear();
    }
}

/// Value of one map region
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapCell {
    Value { value: f64, counts: PointCounts },
    /// No row for the selection, or a null statistic
    Missing,
}

impl MapCell {
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => Some(*value),
            Self::Missing => None,
        }
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<&ResolvedPoint> for MapCell {
    fn from(point: &ResolvedPoint) -> Self {
        point.value.map_or(Self::Missing, |value| Self::Value {
            value,
            counts: point.counts,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub code: i32,
    pub name: String,
    pub cell: MapCell,
}

/// Cross-section shown on the map
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub year: i32,
    pub measure: MeasureKind,
    pub scale: ScaleKind,
    pub contrast: Option<Contrast>,
    /// National aggregate, shown beside the map
    pub national: MapCell,
    /// One entry per lookup municipality, ascending by code
    pub entries: Vec<MapEntry>,
}

impl MapView {
    #[must_use]
    pub fn cell(&self, code: i32) -> Option<&MapCell> {
        if code == NATIONAL_CODE {
            return Some(&self.national);
        }
        self.entries.iter().find(|e| e.code == code).map(|e| &e.cell)
    }

    #[must_use]
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.cell.is_missing()).count()
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.entries.len() - self.mapped_count()
    }

    /// Colour scale bounds; symmetric around zero for diverging scales
    #[must_use]
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values = self.entries.iter().filter_map(|e| e.cell.value());
        let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
        Some(match self.scale {
            ScaleKind::Sequential => (min, max),
            ScaleKind::Diverging => {
                let bound = min.abs().max(max.abs());
                (-bound, bound)
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
}

/// One line of the time series chart
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    /// `None` for a pinned name missing from the lookup
    pub code: Option<i32>,
    pub color: PaletteColor,
    /// Ascending by year; empty for a stale pin
    pub points: Vec<SeriesPoint>,
}

/// Time series chart: the national trace first, then pins oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView {
    pub measure: MeasureKind,
    pub contrast: Option<Contrast>,
    pub traces: Vec<Trace>,
}
