//! Indicator domains

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// The three indicator domains, each with its own observation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Income,
    Health,
    Education,
}

impl Domain {
    pub const ALL: [Self; 3] = [Self::Income, Self::Health, Self::Education];

    /// Key of the domain; also the stem of its table file
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Health => "health",
            Self::Education => "education",
        }
    }
}

impl FromStr for Domain {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.key() == s)
            .ok_or_else(|| DashboardError::unknown_key("domain", s))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
