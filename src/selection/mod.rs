//! Selection policy
//!
//! Normalises a selection after one of its fields changed and computes which
//! selector options stay enabled. Rules fire once each, in a fixed order:
//!
//! 1. a difference measure forces the axes it locks to `all`
//! 2. a measure the variable does not support falls back to the domain's
//!    default measure
//! 3. labor and education are coupled: `unskilled` implies `low` and `high`
//!    implies `skilled`
//!
//! There is no fixed-point iteration; a rule never re-triggers an earlier
//! one.

use log::debug;

use crate::config::DomainConfig;
use crate::error::Result;
use crate::models::facets::{Education, FacetAxis, FacetValue, Labor};
use crate::models::{MeasureKind, Selection, SelectionField};

/// A selector option and whether the user may pick it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionState<T> {
    pub value: T,
    pub enabled: bool,
}

impl<T> OptionState<T> {
    const fn new(value: T, enabled: bool) -> Self {
        Self { value, enabled }
    }
}

/// The options of every selector for the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOptions {
    pub variables: Vec<OptionState<String>>,
    pub measures: Vec<OptionState<MeasureKind>>,
    /// One entry per axis, in [`FacetAxis::ALL`] order
    pub facets: Vec<(FacetAxis, Vec<OptionState<FacetValue>>)>,
}

impl SelectorOptions {
    /// Options of one facet axis
    #[must_use]
    pub fn facet(&self, axis: FacetAxis) -> &[OptionState<FacetValue>] {
        self.facets
            .iter()
            .find(|(a, _)| *a == axis)
            .map_or(&[], |(_, options)| options.as_slice())
    }

    /// Whether a facet value can be selected
    #[must_use]
    pub fn facet_enabled(&self, value: FacetValue) -> bool {
        self.facet(value.axis())
            .iter()
            .any(|o| o.value == value && o.enabled)
    }

    /// Whether a measure can be selected
    #[must_use]
    pub fn measure_enabled(&self, measure: MeasureKind) -> bool {
        self.measures
            .iter()
            .any(|o| o.value == measure && o.enabled)
    }
}

/// A corrected selection with its selector options
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSelection {
    pub selection: Selection,
    pub options: SelectorOptions,
}

/// Cross-field constraints of one domain's selectors
#[derive(Debug, Clone, Copy)]
pub struct SelectionPolicy<'a> {
    config: &'a DomainConfig,
}

impl<'a> SelectionPolicy<'a> {
    #[must_use]
    pub const fn new(config: &'a DomainConfig) -> Self {
        Self { config }
    }

    /// Normalised default selection of a new session
    pub fn initial(&self, year: i32) -> Result<NormalizedSelection> {
        self.normalize(&self.config.default_selection(year), SelectionField::Variable)
    }

    /// Correct `current` after `changed` was modified
    ///
    /// # Errors
    /// `UnknownKey` if the selected variable does not belong to the domain
    pub fn normalize(
        &self,
        current: &Selection,
        changed: SelectionField,
    ) -> Result<NormalizedSelection> {
        let mut selection = current.clone();
        let mut disabled: Vec<FacetValue> = Vec::new();

        // Axes the domain never breaks down by
        let mut locked: Vec<FacetAxis> = FacetAxis::ALL
            .into_iter()
            .filter(|axis| !self.config.axis_enabled(*axis))
            .collect();
        if !selection.facets.age.is_all() && !self.config.age_bands().contains(&selection.facets.age) {
            selection.facets.reset(FacetAxis::Age);
        }

        // Rule 1
        locked.extend(selection.measure.locked_axes());
        for axis in &locked {
            selection.facets.reset(*axis);
        }

        // Rule 2
        let variable = self.config.variable(&selection.variable)?;
        if !self.config.measure_available(variable, selection.measure) {
            let fallback = self.config.fallback_measure();
            debug!(
                "{} is unavailable for {}, falling back to {fallback}",
                selection.measure, variable.key
            );
            selection.measure = fallback;
        }

        // Rule 3
        let coupled = self.config.couples_labor_education()
            && !locked.contains(&FacetAxis::Labor)
            && !locked.contains(&FacetAxis::Education);
        if coupled {
            let facets = &mut selection.facets;
            let education_changed = changed == SelectionField::Facet(FacetAxis::Education);
            if facets.education == Education::High
                && (education_changed || facets.labor != Labor::Unskilled)
            {
                facets.labor = Labor::Skilled;
            } else if facets.labor == Labor::Unskilled {
                facets.education = Education::Low;
            }

            if facets.labor == Labor::Unskilled {
                disabled.extend([
                    FacetValue::Education(Education::All),
                    FacetValue::Education(Education::High),
                ]);
            }
            if facets.education == Education::High {
                disabled.extend([
                    FacetValue::Labor(Labor::All),
                    FacetValue::Labor(Labor::Unskilled),
                ]);
            }
        }

        let options = self.options(&selection, &locked, &disabled)?;
        Ok(NormalizedSelection { selection, options })
    }

    fn options(
        &self,
        selection: &Selection,
        locked: &[FacetAxis],
        disabled: &[FacetValue],
    ) -> Result<SelectorOptions> {
        let variable = self.config.variable(&selection.variable)?;
        let variables = self
            .config
            .variables()
            .iter()
            .map(|v| OptionState::new(v.key.clone(), true))
            .collect();
        let measures = self
            .config
            .measures()
            .into_iter()
            .map(|m| OptionState::new(m, self.config.measure_available(variable, m)))
            .collect();
        let facets = FacetAxis::ALL
            .into_iter()
            .map(|axis| {
                let axis_locked = locked.contains(&axis);
                let options = self
                    .config
                    .facet_values(axis)
                    .into_iter()
                    .map(|value| {
                        let enabled = if axis_locked {
                            value.is_all()
                        } else {
                            !disabled.contains(&value)
                        };
                        OptionState::new(value, enabled)
                    })
                    .collect();
                (axis, options)
            })
            .collect();
        Ok(SelectorOptions {
            variables,
            measures,
            facets,
        })
    }
}
