//! Candidate burn sites loaded from TOML.
//!
//! ```toml
//! [[sites]]
//! lat = 39.997488
//! lng = -122.705376
//! threat_rating = 0.0523
//!
//! [sites.statistics]
//! safety = 0.2
//! fire-behavior = 0.6
//! # ... all 11 categories
//! ```

use std::path::Path;

use fire_threat_scoring::FireStatistics;
use serde::Deserialize;

use crate::AssessError;

/// A candidate burn site with its externally supplied scores.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Site {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Hazard probability in `[0, 1]`.
    pub threat_rating: f64,
    /// Feasibility category scores from the classifier.
    pub statistics: FireStatistics,
}

impl Site {
    /// Checks coordinates and scores are in range.
    ///
    /// # Errors
    ///
    /// Returns [`AssessError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), AssessError> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(AssessError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if !(0.0..=1.0).contains(&self.threat_rating) {
            return Err(AssessError::InvalidThreatRating {
                value: self.threat_rating,
            });
        }
        self.statistics.validate()?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct SitesFile {
    sites: Vec<Site>,
}

/// Parses and validates a sites document.
///
/// # Errors
///
/// Returns [`AssessError`] if the document is malformed or any site is
/// invalid.
pub fn parse_sites(toml_str: &str) -> Result<Vec<Site>, AssessError> {
    let file: SitesFile = toml::de::from_str(toml_str)?;
    for site in &file.sites {
        site.validate()?;
    }
    Ok(file.sites)
}

/// Reads, parses and validates a sites file.
///
/// # Errors
///
/// Returns [`AssessError`] if the file cannot be read or is invalid.
pub fn load_sites(path: &Path) -> Result<Vec<Site>, AssessError> {
    let contents = std::fs::read_to_string(path)?;
    let sites = parse_sites(&contents)?;
    log::info!("Loaded {} sites from {}", sites.len(), path.display());
    Ok(sites)
}
