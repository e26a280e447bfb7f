//! Municipality reference data
//!
//! The lookup maps municipality codes to display names and back. It defines
//! the full geographic extent of the map: every code in the lookup appears
//! in a map view, with a value or as a missing record.

use std::collections::{BTreeMap, btree_map};
use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;

use crate::error::util::safe_read_to_string;
use crate::error::{DashboardError, Result};
use crate::models::NATIONAL_CODE;

/// Display name of the national aggregate
pub const NATIONAL_NAME: &str = "Hele Danmark";

/// Bidirectional municipality code/name lookup
#[derive(Debug, Clone, Default)]
pub struct MunicipalityLookup {
    by_code: BTreeMap<i32, String>,
    by_name: FxHashMap<String, i32>,
}

impl MunicipalityLookup {
    /// Build a lookup from `(code, name)` pairs
    ///
    /// # Errors
    /// Duplicate codes or names, and the reserved national code, are
    /// reference data errors.
    pub fn from_entries<S: Into<String>>(
        entries: impl IntoIterator<Item = (i32, S)>,
    ) -> Result<Self> {
        let mut lookup = Self::default();
        for (code, name) in entries {
            let name = name.into();
            if code == NATIONAL_CODE {
                return Err(DashboardError::ReferenceData(format!(
                    "municipality lookup uses the reserved national code {NATIONAL_CODE} for '{name}'"
                )));
            }
            if let Some(existing) = lookup.by_name.get(&name) {
                return Err(DashboardError::ReferenceData(format!(
                    "municipality name '{name}' is used by both {existing} and {code}"
                )));
            }
            match lookup.by_code.entry(code) {
                btree_map::Entry::Occupied(_) => {
                    return Err(DashboardError::ReferenceData(format!(
                        "municipality code {code} appears more than once"
                    )));
                }
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(name.clone());
                }
            }
            lookup.by_name.insert(name, code);
        }
        Ok(lookup)
    }

    /// Parse a JSON object of `{"<code>": "<name>"}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(code, name)| {
                code.trim()
                    .parse::<i32>()
                    .map(|code| (code, name))
                    .map_err(|_| {
                        DashboardError::ReferenceData(format!(
                            "municipality code '{code}' is not an integer"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    /// Load the lookup file
    pub fn load(path: &Path) -> Result<Self> {
        let json = safe_read_to_string(path, "municipality lookup")?;
        let lookup = Self::from_json_str(&json)?;
        info!(
            "Loaded {} municipalities from {}",
            lookup.len(),
            path.display()
        );
        Ok(lookup)
    }

    /// Name of a code; the national code maps to [`NATIONAL_NAME`]
    #[must_use]
    pub fn name(&self, code: i32) -> Option<&str> {
        if code == NATIONAL_CODE {
            return Some(NATIONAL_NAME);
        }
        self.by_code.get(&code).map(String::as_str)
    }

    /// Code of a municipality name
    #[must_use]
    pub fn code(&self, name: &str) -> Option<i32> {
        if name == NATIONAL_NAME {
            return Some(NATIONAL_CODE);
        }
        self.by_name.get(name).copied()
    }

    /// Every municipality code, ascending, without the national code
    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_code.keys().copied()
    }

    /// `(code, name)` pairs, ascending by code
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> + '_ {
        self.by_code.iter().map(|(code, name)| (*code, name.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
