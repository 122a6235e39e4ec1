#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative region types and the regional reference table.
//!
//! A [`RegionTable`] maps a canonical region name (e.g. `"Los Angeles"`)
//! to the economic output and population used as the apportionment base
//! for nearby settlements. The built-in table covers California counties
//! and is embedded at compile time from `data/california.toml`; alternate
//! tables can be parsed from any TOML document with the same shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Administrative-unit suffixes stripped from resolver output.
const ADMIN_SUFFIXES: &[&str] = &["County", "Parish", "Borough"];

const CALIFORNIA_TOML: &str = include_str!("../data/california.toml");

/// An administrative region with its tabulated aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Canonical name, without any administrative-unit suffix.
    pub name: String,
    /// Annual economic output in currency units.
    pub economic_output: f64,
    /// Resident population the economic output is spread across.
    pub reference_population: u64,
}

/// Errors from loading a region table.
#[derive(Debug, Error)]
pub enum RegionTableError {
    /// The TOML document could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A region has a non-positive aggregate.
    #[error("Region '{name}' has invalid {field}")]
    InvalidAggregate {
        /// Region name.
        name: String,
        /// Which field is invalid.
        field: &'static str,
    },

    /// The same normalized name appears twice.
    #[error("Duplicate region '{name}'")]
    Duplicate {
        /// Region name.
        name: String,
    },
}

#[derive(Deserialize)]
struct RegionTableFile {
    regions: Vec<Region>,
}

/// Immutable lookup from canonical region name to [`Region`].
///
/// Loaded once at startup and passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    regions: BTreeMap<String, Region>,
}

impl RegionTable {
    /// Builds a table from a list of regions.
    ///
    /// Names are normalized with [`normalize_region_name`] before
    /// insertion.
    ///
    /// # Errors
    ///
    /// Returns [`RegionTableError`] if any aggregate is not positive or a
    /// name appears twice.
    pub fn from_regions(
        regions: impl IntoIterator<Item = Region>,
    ) -> Result<Self, RegionTableError> {
        let mut map = BTreeMap::new();

        for mut region in regions {
            region.name = normalize_region_name(&region.name);

            if !(region.economic_output.is_finite() && region.economic_output > 0.0) {
                return Err(RegionTableError::InvalidAggregate {
                    name: region.name,
                    field: "economic_output",
                });
            }
            if region.reference_population == 0 {
                return Err(RegionTableError::InvalidAggregate {
                    name: region.name,
                    field: "reference_population",
                });
            }
            if map.contains_key(&region.name) {
                return Err(RegionTableError::Duplicate { name: region.name });
            }

            map.insert(region.name.clone(), region);
        }

        Ok(Self { regions: map })
    }

    /// Parses a table from a TOML document containing `[[regions]]`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`RegionTableError`] if the document is malformed or fails
    /// validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, RegionTableError> {
        let file: RegionTableFile = toml::de::from_str(toml_str)?;
        Self::from_regions(file.regions)
    }

    /// The built-in California county table.
    ///
    /// # Errors
    ///
    /// Returns [`RegionTableError`] if the embedded data is malformed.
    pub fn california() -> Result<Self, RegionTableError> {
        Self::from_toml_str(CALIFORNIA_TOML)
    }

    /// Looks up a region by canonical name (exact match).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Iterates over all regions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Number of regions in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the table has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Reduces a resolver-provided region name to its table key.
///
/// Trims surrounding whitespace and a trailing administrative-unit
/// suffix, so `"Kern County"` and `" Kern County "` both become `"Kern"`.
#[must_use]
pub fn normalize_region_name(raw: &str) -> String {
    let trimmed = raw.trim();

    for suffix in ADMIN_SUFFIXES {
        match trimmed.strip_suffix(suffix) {
            Some(stem) if stem.ends_with(char::is_whitespace) => {
                return stem.trim_end().to_string();
            }
            _ => {}
        }
    }

    trimmed.to_string()
}
