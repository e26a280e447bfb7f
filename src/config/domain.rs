//! Per-domain descriptors
//!
//! The income, health and education pages run the same engine. What differs
//! between them is captured here: the variables offered, which statistics
//! and differences they support, which facet axes are selectable, and the
//! contrast groups of each difference measure.

use std::fmt;

use crate::error::{DashboardError, Result};
use crate::models::facets::{AgeBand, FacetAxis, FacetValue, Heritage};
use crate::models::measure::{Contrast, MeasureKind, Statistic};
use crate::models::{Domain, FacetSelection, Selection};

/// Distribution type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Amounts such as income
    Continuous,
    /// Event counts such as hospital admissions
    Count,
    /// 0/1 indicators such as tertiary education completed
    Binary,
}

/// A variable offered by a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    /// Key in the `variable` column
    pub key: String,
    pub kind: VariableKind,
    /// Whether percentile ratios are stored for this variable
    pub percentile_ratios: bool,
}

impl VariableSpec {
    /// Continuous variable with percentile ratios
    pub fn continuous(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: VariableKind::Continuous,
            percentile_ratios: true,
        }
    }

    /// Count variable
    pub fn count(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: VariableKind::Count,
            percentile_ratios: false,
        }
    }

    /// Binary indicator variable
    pub fn binary(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: VariableKind::Binary,
            percentile_ratios: false,
        }
    }

    /// Drop percentile ratios for this variable
    #[must_use]
    pub fn without_percentile_ratios(mut self) -> Self {
        self.percentile_ratios = false;
        self
    }

    /// Whether a stored statistic is defined for this variable
    #[must_use]
    pub fn supports(&self, statistic: Statistic) -> bool {
        if statistic.is_theil() {
            return self.kind == VariableKind::Continuous;
        }
        if statistic.is_percentile_ratio() {
            return self.kind == VariableKind::Continuous && self.percentile_ratios;
        }
        true
    }
}

/// Descriptor of one domain page
#[derive(Debug, Clone)]
pub struct DomainConfig {
    domain: Domain,
    variables: Vec<VariableSpec>,
    age_bands: Vec<AgeBand>,
    statistics: Vec<Statistic>,
    differences: Vec<MeasureKind>,
    locked_axes: Vec<FacetAxis>,
    fallback: MeasureKind,
    heritage_reference: Heritage,
    difference_statistic: Statistic,
}

impl DomainConfig {
    /// Start building a descriptor
    #[must_use]
    pub fn builder(domain: Domain) -> DomainConfigBuilder {
        DomainConfigBuilder::new(domain)
    }

    /// Built-in descriptor of a domain
    #[must_use]
    pub fn builtin(domain: Domain) -> Self {
        match domain {
            Domain::Income => Self::income(),
            Domain::Health => Self::health(),
            Domain::Education => Self::education(),
        }
    }

    /// Income: disposable, equivalised and gross income plus wages
    #[must_use]
    pub fn income() -> Self {
        Self::builder(Domain::Income)
            .variable(VariableSpec::continuous("aekvivadisp"))
            .variable(VariableSpec::continuous("dispon"))
            .variable(VariableSpec::continuous("perindkialt"))
            .variable(VariableSpec::continuous("loenmv").without_percentile_ratios())
            .age_bands(&AgeBand::VALUES[1..5])
            .statistics(&Statistic::ALL)
            .differences(&[
                MeasureKind::GenderDifference,
                MeasureKind::HeritageDifference,
                MeasureKind::LaborDifference,
                MeasureKind::EducationDifference,
            ])
            .fallback(MeasureKind::Direct(Statistic::Gini))
            .build_unchecked()
    }

    /// Health: hospital admissions, bed days and GP contacts
    #[must_use]
    pub fn health() -> Self {
        Self::builder(Domain::Health)
            .variable(VariableSpec::count("admissions"))
            .variable(VariableSpec::count("nights"))
            .variable(VariableSpec::count("gp"))
            .age_bands(&AgeBand::VALUES[1..])
            .statistics(&[
                Statistic::Gini,
                Statistic::TheilL,
                Statistic::TheilT,
                Statistic::Mean,
            ])
            .differences(&[
                MeasureKind::GenderDifference,
                MeasureKind::HeritageDifference,
                MeasureKind::LaborDifference,
                MeasureKind::EducationDifference,
            ])
            .fallback(MeasureKind::Direct(Statistic::Gini))
            .build_unchecked()
    }

    /// Education: distance to upper secondary school plus the two
    /// attainment indicators
    #[must_use]
    pub fn education() -> Self {
        Self::builder(Domain::Education)
            .variable(VariableSpec::continuous("hfpria"))
            .variable(VariableSpec::binary("labor"))
            .variable(VariableSpec::binary("education"))
            .age_bands(&AgeBand::VALUES[1..5])
            .statistics(&Statistic::ALL)
            .differences(&[MeasureKind::GenderDifference, MeasureKind::HeritageDifference])
            .lock_axis(FacetAxis::Labor)
            .lock_axis(FacetAxis::Education)
            .fallback(MeasureKind::Direct(Statistic::Mean))
            .build_unchecked()
    }

    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    /// Look up a variable by key
    pub fn variable(&self, key: &str) -> Result<&VariableSpec> {
        self.variables
            .iter()
            .find(|v| v.key == key)
            .ok_or_else(|| DashboardError::unknown_key("variable", key))
    }

    /// Age bands offered besides `all`
    #[must_use]
    pub fn age_bands(&self) -> &[AgeBand] {
        &self.age_bands
    }

    /// Every measure the domain offers, in selector order
    #[must_use]
    pub fn measures(&self) -> Vec<MeasureKind> {
        MeasureKind::ALL
            .into_iter()
            .filter(|m| self.offers(*m))
            .collect()
    }

    /// Whether the domain offers a measure for at least some variable
    #[must_use]
    pub fn offers(&self, measure: MeasureKind) -> bool {
        match measure {
            MeasureKind::Direct(stat) => self.statistics.contains(&stat),
            diff => self.differences.contains(&diff),
        }
    }

    /// Whether `measure` can be resolved for `variable`
    #[must_use]
    pub fn measure_available(&self, variable: &VariableSpec, measure: MeasureKind) -> bool {
        self.offers(measure) && measure.statistic().is_none_or(|stat| variable.supports(stat))
    }

    /// Fail with `InvalidFacetCombination` unless `measure` is available
    /// for `variable`
    pub fn check(&self, variable: &str, measure: MeasureKind) -> Result<&VariableSpec> {
        let spec = self.variable(variable)?;
        if self.measure_available(spec, measure) {
            Ok(spec)
        } else {
            Err(DashboardError::InvalidFacetCombination {
                domain: self.domain.key().to_string(),
                variable: variable.to_string(),
                measure: measure.key().to_string(),
            })
        }
    }

    /// Measure selected when the current one becomes unavailable
    #[must_use]
    pub const fn fallback_measure(&self) -> MeasureKind {
        self.fallback
    }

    /// Contrast groups of a difference measure in this domain
    #[must_use]
    pub fn contrast(&self, measure: MeasureKind) -> Option<Contrast> {
        let mut contrast = measure.default_contrast()?;
        if measure == MeasureKind::HeritageDifference {
            contrast.reference = FacetValue::Heritage(self.heritage_reference);
        }
        Some(contrast)
    }

    /// Statistic whose between-group difference the difference measures show
    #[must_use]
    pub const fn difference_statistic(&self) -> Statistic {
        self.difference_statistic
    }

    /// Whether the axis can be changed away from `all` at all
    #[must_use]
    pub fn axis_enabled(&self, axis: FacetAxis) -> bool {
        !self.locked_axes.contains(&axis)
    }

    /// Whether the labor/education coupling rules apply
    #[must_use]
    pub fn couples_labor_education(&self) -> bool {
        self.axis_enabled(FacetAxis::Labor) && self.axis_enabled(FacetAxis::Education)
    }

    /// Values offered on an axis, `all` first
    #[must_use]
    pub fn facet_values(&self, axis: FacetAxis) -> Vec<FacetValue> {
        match axis {
            FacetAxis::Age => std::iter::once(FacetValue::Age(AgeBand::All))
                .chain(self.age_bands.iter().copied().map(FacetValue::Age))
                .collect(),
            other => FacetValue::values_of(other),
        }
    }

    /// Selection a new session starts with
    #[must_use]
    pub fn default_selection(&self, year: i32) -> Selection {
        let variable = self
            .variables
            .first()
            .map(|v| v.key.clone())
            .unwrap_or_default();
        Selection {
            variable,
            measure: MeasureKind::Direct(Statistic::Gini),
            facets: FacetSelection::default(),
            year,
        }
    }
}

impl fmt::Display for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} variables, {} measures)",
            self.domain,
            self.variables.len(),
            self.measures().len()
        )
    }
}

/// Builder for [`DomainConfig`]
#[derive(Debug, Clone)]
pub struct DomainConfigBuilder {
    config: DomainConfig,
}

impl DomainConfigBuilder {
    fn new(domain: Domain) -> Self {
        Self {
            config: DomainConfig {
                domain,
                variables: Vec::new(),
                age_bands: AgeBand::VALUES[1..5].to_vec(),
                statistics: vec![Statistic::Gini, Statistic::Mean],
                differences: Vec::new(),
                locked_axes: Vec::new(),
                fallback: MeasureKind::Direct(Statistic::Gini),
                heritage_reference: Heritage::NonWestern,
                difference_statistic: Statistic::Mean,
            },
        }
    }

    /// Add a variable; the first one added is the default selection
    #[must_use]
    pub fn variable(mut self, spec: VariableSpec) -> Self {
        self.config.variables.push(spec);
        self
    }

    #[must_use]
    pub fn age_bands(mut self, bands: &[AgeBand]) -> Self {
        self.config.age_bands = bands.iter().copied().filter(|b| !b.is_all()).collect();
        self
    }

    /// Stored statistics offered in the measure selector
    #[must_use]
    pub fn statistics(mut self, statistics: &[Statistic]) -> Self {
        self.config.statistics = statistics.to_vec();
        self
    }

    /// Difference measures offered in the measure selector
    #[must_use]
    pub fn differences(mut self, differences: &[MeasureKind]) -> Self {
        self.config.differences = differences
            .iter()
            .copied()
            .filter(|m| m.is_difference())
            .collect();
        self
    }

    /// Keep an axis at `all` with every other option disabled
    #[must_use]
    pub fn lock_axis(mut self, axis: FacetAxis) -> Self {
        if !self.config.locked_axes.contains(&axis) {
            self.config.locked_axes.push(axis);
        }
        self
    }

    #[must_use]
    pub const fn fallback(mut self, measure: MeasureKind) -> Self {
        self.config.fallback = measure;
        self
    }

    /// Reference group of the heritage difference
    #[must_use]
    pub const fn heritage_reference(mut self, heritage: Heritage) -> Self {
        self.config.heritage_reference = heritage;
        self
    }

    /// Statistic the difference measures subtract; `mean` by default
    #[must_use]
    pub const fn difference_statistic(mut self, statistic: Statistic) -> Self {
        self.config.difference_statistic = statistic;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<DomainConfig> {
        let config = self.config;
        if config.variables.is_empty() {
            return Err(DashboardError::ReferenceData(format!(
                "domain {} has no variables",
                config.domain
            )));
        }
        if matches!(config.heritage_reference, Heritage::All | Heritage::Danish) {
            return Err(DashboardError::ReferenceData(format!(
                "heritage reference group of {} must be a non-Danish group",
                config.domain
            )));
        }
        if let Some(var) = config
            .variables
            .iter()
            .find(|v| !config.measure_available(v, config.fallback))
        {
            return Err(DashboardError::ReferenceData(format!(
                "fallback measure {} of {} is unavailable for variable {}",
                config.fallback, config.domain, var.key
            )));
        }
        Ok(config)
    }

    // The built-in descriptors are covered by tests, so they skip validation.
    fn build_unchecked(self) -> DomainConfig {
        self.config
    }
}
