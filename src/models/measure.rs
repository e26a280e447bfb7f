//! Inequality measures
//!
//! A measure is either a statistic stored as its own column in the
//! observation table, or a between-group difference derived on demand from
//! two filtered sub-selections.

use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::models::facets::{
    Education, FacetAxis, FacetSelection, FacetValue, Gender, Heritage, Labor,
};

/// A statistic stored directly on each observation row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Statistic {
    /// Gini coefficient
    Gini,
    /// Theil's L (mean log deviation)
    TheilL,
    /// Theil's T
    TheilT,
    /// Arithmetic mean
    Mean,
    /// 90th over 10th percentile
    P90P10,
    /// 90th over 50th percentile
    P90P50,
    /// 50th over 10th percentile
    P50P10,
}

impl Statistic {
    /// Every statistic in display order
    pub const ALL: [Self; 7] = [
        Self::Gini,
        Self::TheilL,
        Self::TheilT,
        Self::Mean,
        Self::P90P10,
        Self::P90P50,
        Self::P50P10,
    ];

    /// Column name in the observation table, also the measure key
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Gini => "Gini",
            Self::TheilL => "Theil_L",
            Self::TheilT => "Theil_T",
            Self::Mean => "mean",
            Self::P90P10 => "p90p10",
            Self::P90P50 => "p90p50",
            Self::P50P10 => "p50p10",
        }
    }

    /// Theil indices are undefined for binary distributions
    #[must_use]
    pub const fn is_theil(self) -> bool {
        matches!(self, Self::TheilL | Self::TheilT)
    }

    /// Percentile ratios
    #[must_use]
    pub const fn is_percentile_ratio(self) -> bool {
        matches!(self, Self::P90P10 | Self::P90P50 | Self::P50P10)
    }

    /// Dimensionless index (as opposed to a level in the variable's unit)
    #[must_use]
    pub const fn is_index(self) -> bool {
        !matches!(self, Self::Mean)
    }
}

impl FromStr for Statistic {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.column() == s)
            .ok_or_else(|| DashboardError::unknown_key("statistic", s))
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// The measure requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    /// A stored column
    Direct(Statistic),
    /// man - woman
    GenderDifference,
    /// danish - non-western heritage
    HeritageDifference,
    /// skilled - unskilled
    LaborDifference,
    /// high - low tertiary education
    EducationDifference,
}

/// Which facet a difference measure splits on, and the two contrasted groups
///
/// The derived value is always `comparison - reference`, so a positive value
/// means the comparison (second-named) group has the higher value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contrast {
    /// Reference group, subtracted
    pub reference: FacetValue,
    /// Comparison group
    pub comparison: FacetValue,
}

impl Contrast {
    /// Axis the contrast splits on
    #[must_use]
    pub const fn axis(&self) -> FacetAxis {
        self.reference.axis()
    }

    /// The two facet selections to query: `(reference, comparison)`
    #[must_use]
    pub fn split(&self, facets: FacetSelection) -> (FacetSelection, FacetSelection) {
        (facets.with(self.reference), facets.with(self.comparison))
    }

    /// Contrast with the two groups swapped
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            reference: self.comparison,
            comparison: self.reference,
        }
    }
}

/// How a rendered value scale should be laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    /// Levels and indices: low to high
    Sequential,
    /// Differences: centred on zero
    Diverging,
}

impl MeasureKind {
    /// Default direct measures plus every difference, in display order
    pub const ALL: [Self; 11] = [
        Self::Direct(Statistic::Gini),
        Self::Direct(Statistic::TheilL),
        Self::Direct(Statistic::TheilT),
        Self::Direct(Statistic::Mean),
        Self::GenderDifference,
        Self::HeritageDifference,
        Self::LaborDifference,
        Self::EducationDifference,
        Self::Direct(Statistic::P90P10),
        Self::Direct(Statistic::P90P50),
        Self::Direct(Statistic::P50P10),
    ];

    /// Key used by selectors and export query parameters
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Direct(stat) => stat.column(),
            Self::GenderDifference => "diff_gender",
            Self::HeritageDifference => "diff_heritage",
            Self::LaborDifference => "diff_labor",
            Self::EducationDifference => "diff_education",
        }
    }

    /// Whether this is a derived difference measure
    #[must_use]
    pub const fn is_difference(self) -> bool {
        !matches!(self, Self::Direct(_))
    }

    /// The stored statistic, if any
    #[must_use]
    pub const fn statistic(self) -> Option<Statistic> {
        match self {
            Self::Direct(stat) => Some(stat),
            _ => None,
        }
    }

    /// Axis a difference measure splits on
    #[must_use]
    pub const fn difference_axis(self) -> Option<FacetAxis> {
        match self {
            Self::Direct(_) => None,
            Self::GenderDifference => Some(FacetAxis::Gender),
            Self::HeritageDifference => Some(FacetAxis::Heritage),
            Self::LaborDifference => Some(FacetAxis::Labor),
            Self::EducationDifference => Some(FacetAxis::Education),
        }
    }

    /// Default contrast for a difference measure
    ///
    /// Domains may override the heritage reference group, see
    /// [`crate::config::DomainConfig::contrast`].
    #[must_use]
    pub const fn default_contrast(self) -> Option<Contrast> {
        let (reference, comparison) = match self {
            Self::Direct(_) => return None,
            Self::GenderDifference => (
                FacetValue::Gender(Gender::Woman),
                FacetValue::Gender(Gender::Man),
            ),
            Self::HeritageDifference => (
                FacetValue::Heritage(Heritage::NonWestern),
                FacetValue::Heritage(Heritage::Danish),
            ),
            Self::LaborDifference => (
                FacetValue::Labor(Labor::Unskilled),
                FacetValue::Labor(Labor::Skilled),
            ),
            Self::EducationDifference => (
                FacetValue::Education(Education::Low),
                FacetValue::Education(Education::High),
            ),
        };
        Some(Contrast {
            reference,
            comparison,
        })
    }

    /// Facet axes a selected difference measure locks to `all`
    ///
    /// Labor and education are coupled, so either of their differences locks
    /// both axes.
    #[must_use]
    pub fn locked_axes(self) -> &'static [FacetAxis] {
        match self {
            Self::Direct(_) => &[],
            Self::GenderDifference => &[FacetAxis::Gender],
            Self::HeritageDifference => &[FacetAxis::Heritage],
            Self::LaborDifference | Self::EducationDifference => {
                &[FacetAxis::Labor, FacetAxis::Education]
            }
        }
    }

    /// Colour scale layout for this measure
    #[must_use]
    pub const fn scale(self) -> ScaleKind {
        if self.is_difference() {
            ScaleKind::Diverging
        } else {
            ScaleKind::Sequential
        }
    }
}

impl FromStr for MeasureKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|measure| measure.key() == s)
            .ok_or_else(|| DashboardError::unknown_key("measure", s))
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
