//! Demographic facets
//!
//! The observation table is broken down along five independent categorical
//! axes. Every axis has an `all` value which is the unfiltered default; rows
//! tagged `all` are pre-aggregated upstream and stored as their own rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Defines a facet enum with its table keys and parsing.
///
/// The first variant listed must be the `all` value.
macro_rules! facet_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $key:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $key)] $variant, )+
        }

        impl $name {
            /// Every value of this axis in display order, `all` first
            pub const VALUES: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// Key used in the observation table and in query parameters
            #[must_use]
            pub const fn key(self) -> &'static str {
                match self {
                    $( Self::$variant => $key, )+
                }
            }

            /// Whether this is the unfiltered `all` value
            #[must_use]
            pub fn is_all(self) -> bool {
                self == Self::VALUES[0]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::VALUES[0]
            }
        }

        impl FromStr for $name {
            type Err = DashboardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $key => Ok(Self::$variant), )+
                    other => Err(DashboardError::unknown_key($kind, other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

facet_enum! {
    /// Gender facet
    Gender, "gender" {
        All => "all",
        Woman => "woman",
        Man => "man",
    }
}

facet_enum! {
    /// Age band facet. Income and education use `age1..age4` (30-65 years),
    /// health uses `age1..age5` (18 years and older).
    AgeBand, "age" {
        All => "all",
        Age1 => "age1",
        Age2 => "age2",
        Age3 => "age3",
        Age4 => "age4",
        Age5 => "age5",
    }
}

facet_enum! {
    /// Heritage facet
    Heritage, "heritage" {
        All => "all",
        Danish => "danish",
        /// Immigrants and descendants
        NonDanishNonWestern => "nondanishnonwestern",
        /// Non-western immigrants and descendants
        NonWestern => "nonwestern",
    }
}

facet_enum! {
    /// Tertiary education facet
    Education, "education" {
        All => "all",
        /// No tertiary education
        Low => "low",
        /// Completed tertiary education
        High => "high",
    }
}

facet_enum! {
    /// Labor facet: education beyond primary school
    Labor, "labor" {
        All => "all",
        /// Primary school is the highest completed education
        Unskilled => "unskilled",
        /// Education beyond primary school
        Skilled => "skilled",
    }
}

/// One of the five facet axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FacetAxis {
    Gender,
    Age,
    Heritage,
    Education,
    Labor,
}

impl FacetAxis {
    /// All axes in table column order
    pub const ALL: [Self; 5] = [
        Self::Gender,
        Self::Age,
        Self::Heritage,
        Self::Education,
        Self::Labor,
    ];

    /// Column name of this axis in the observation table
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Age => "age",
            Self::Heritage => "heritage",
            Self::Education => "education",
            Self::Labor => "labor",
        }
    }
}

impl fmt::Display for FacetAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A value on one specific facet axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetValue {
    Gender(Gender),
    Age(AgeBand),
    Heritage(Heritage),
    Education(Education),
    Labor(Labor),
}

impl FacetValue {
    /// The axis this value belongs to
    #[must_use]
    pub const fn axis(self) -> FacetAxis {
        match self {
            Self::Gender(_) => FacetAxis::Gender,
            Self::Age(_) => FacetAxis::Age,
            Self::Heritage(_) => FacetAxis::Heritage,
            Self::Education(_) => FacetAxis::Education,
            Self::Labor(_) => FacetAxis::Labor,
        }
    }

    /// Table key of the value
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Gender(v) => v.key(),
            Self::Age(v) => v.key(),
            Self::Heritage(v) => v.key(),
            Self::Education(v) => v.key(),
            Self::Labor(v) => v.key(),
        }
    }

    /// Whether the value is `all` on its axis
    #[must_use]
    pub fn is_all(self) -> bool {
        match self {
            Self::Gender(v) => v.is_all(),
            Self::Age(v) => v.is_all(),
            Self::Heritage(v) => v.is_all(),
            Self::Education(v) => v.is_all(),
            Self::Labor(v) => v.is_all(),
        }
    }

    /// Parse a key on a given axis
    pub fn parse(axis: FacetAxis, key: &str) -> Result<Self, DashboardError> {
        Ok(match axis {
            FacetAxis::Gender => Self::Gender(key.parse()?),
            FacetAxis::Age => Self::Age(key.parse()?),
            FacetAxis::Heritage => Self::Heritage(key.parse()?),
            FacetAxis::Education => Self::Education(key.parse()?),
            FacetAxis::Labor => Self::Labor(key.parse()?),
        })
    }

    /// All values of an axis, `all` first
    #[must_use]
    pub fn values_of(axis: FacetAxis) -> Vec<Self> {
        match axis {
            FacetAxis::Gender => Gender::VALUES.iter().copied().map(Self::Gender).collect(),
            FacetAxis::Age => AgeBand::VALUES.iter().copied().map(Self::Age).collect(),
            FacetAxis::Heritage => Heritage::VALUES
                .iter()
                .copied()
                .map(Self::Heritage)
                .collect(),
            FacetAxis::Education => Education::VALUES
                .iter()
                .copied()
                .map(Self::Education)
                .collect(),
            FacetAxis::Labor => Labor::VALUES.iter().copied().map(Self::Labor).collect(),
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The five facet values of a query. `Default` is `all` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FacetSelection {
    pub gender: Gender,
    pub age: AgeBand,
    pub heritage: Heritage,
    pub education: Education,
    pub labor: Labor,
}

impl FacetSelection {
    /// Current value on one axis
    #[must_use]
    pub const fn get(&self, axis: FacetAxis) -> FacetValue {
        match axis {
            FacetAxis::Gender => FacetValue::Gender(self.gender),
            FacetAxis::Age => FacetValue::Age(self.age),
            FacetAxis::Heritage => FacetValue::Heritage(self.heritage),
            FacetAxis::Education => FacetValue::Education(self.education),
            FacetAxis::Labor => FacetValue::Labor(self.labor),
        }
    }

    /// Set one axis
    pub fn set(&mut self, value: FacetValue) {
        match value {
            FacetValue::Gender(v) => self.gender = v,
            FacetValue::Age(v) => self.age = v,
            FacetValue::Heritage(v) => self.heritage = v,
            FacetValue::Education(v) => self.education = v,
            FacetValue::Labor(v) => self.labor = v,
        }
    }

    /// Copy with one axis replaced
    #[must_use]
    pub fn with(mut self, value: FacetValue) -> Self {
        self.set(value);
        self
    }

    /// Reset one axis to `all`
    pub fn reset(&mut self, axis: FacetAxis) {
        match axis {
            FacetAxis::Gender => self.gender = Gender::All,
            FacetAxis::Age => self.age = AgeBand::All,
            FacetAxis::Heritage => self.heritage = Heritage::All,
            FacetAxis::Education => self.education = Education::All,
            FacetAxis::Labor => self.labor = Labor::All,
        }
    }

    /// `(column, key)` pairs for every axis, including the `all` ones
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        FacetAxis::ALL
            .into_iter()
            .map(|axis| (axis.column(), self.get(axis).key()))
    }
}
