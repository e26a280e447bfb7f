//! Domain models
//!
//! Facets, measures, observation rows and the user selection that ties them
//! together into a query.

pub mod domain;
pub mod facets;
pub mod measure;
pub mod observation;
pub mod selection;

pub use domain::Domain;
pub use facets::{
    AgeBand, Education, FacetAxis, FacetSelection, FacetValue, Gender, Heritage, Labor,
};
pub use measure::{Contrast, MeasureKind, ScaleKind, Statistic};
pub use observation::{NATIONAL_CODE, Observation};
pub use selection::{Selection, SelectionChange, SelectionField};
