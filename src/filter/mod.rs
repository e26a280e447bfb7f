//! Filtering of observation tables
//!
//! A query is a pure conjunction of equality predicates: the variable, the
//! year when one is given, and every facet axis. The table stores
//! pre-aggregated `all` rows of its own, so `all` is matched like any other
//! key and never expands into a sum over the axis.

pub mod core;
pub mod expr;

pub use self::core::{BatchFilter, ExpressionFilter, filter_record_batch};
pub use self::expr::{Expr, LiteralValue, evaluate_expr};

use crate::models::facets::FacetSelection;
use crate::models::measure::Statistic;
use crate::models::observation::columns;

/// Build the filter expression of an observation query
#[must_use]
pub fn observation_filter(variable: &str, year: Option<i32>, facets: &FacetSelection) -> Expr {
    let mut predicates = vec![Expr::eq(columns::VARIABLE, variable)];
    if let Some(year) = year {
        predicates.push(Expr::eq(columns::YEAR, year));
    }
    predicates.extend(
        facets
            .columns()
            .map(|(column, key)| Expr::eq(column, key)),
    );
    Expr::all(predicates)
}

/// Observation query restricted to rows where `statistic` is present
#[must_use]
pub fn cross_section_filter(
    variable: &str,
    year: i32,
    facets: &FacetSelection,
    statistic: Statistic,
) -> Expr {
    Expr::all(vec![
        observation_filter(variable, Some(year), facets),
        Expr::IsNotNull(statistic.column().to_string()),
    ])
}
