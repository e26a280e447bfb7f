//! User selection state

use crate::models::facets::{FacetAxis, FacetSelection, FacetValue};
use crate::models::measure::MeasureKind;

/// The complete selector state of one domain page
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Variable key, e.g. `dispon`
    pub variable: String,
    pub measure: MeasureKind,
    pub facets: FacetSelection,
    /// Year shown on the map
    pub year: i32,
}

impl Selection {
    /// Apply a change and report which field it touched
    pub fn apply(&mut self, change: SelectionChange) -> SelectionField {
        let field = change.field();
        match change {
            SelectionChange::Variable(variable) => self.variable = variable,
            SelectionChange::Measure(measure) => self.measure = measure,
            SelectionChange::Facet(value) => self.facets.set(value),
            SelectionChange::Year(year) => self.year = year,
        }
        field
    }
}

/// A selector field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionField {
    Variable,
    Measure,
    Facet(FacetAxis),
    Year,
}

/// A single selector change event
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    Variable(String),
    Measure(MeasureKind),
    Facet(FacetValue),
    Year(i32),
}

impl SelectionChange {
    /// The field this change touches
    #[must_use]
    pub const fn field(&self) -> SelectionField {
        match self {
            Self::Variable(_) => SelectionField::Variable,
            Self::Measure(_) => SelectionField::Measure,
            Self::Facet(value) => SelectionField::Facet(value.axis()),
            Self::Year(_) => SelectionField::Year,
        }
    }
}
