//! Data models for PHIVOLCS earthquake API responses.
//!
//! Every endpoint wraps its payload in the same `{meta, data}` envelope.

use serde::{Deserialize, Serialize};

/// A single earthquake as reported by the API.
///
/// Coordinates, depth and magnitude arrive as display text; only
/// `magnitude_numeric` is used for comparisons.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Earthquake {
    /// Calendar date string
    pub date: String,

    /// Local time string
    pub time: String,

    /// Latitude text, e.g. "13.80" or "10.50°N"
    pub latitude: String,

    /// Longitude text, e.g. "120.25" or "120.25°E"
    pub longitude: String,

    /// Human-readable depth, e.g. "10 km"
    pub depth: String,

    /// Magnitude as text
    pub magnitude: String,

    /// Free-text location description
    pub location: String,

    /// Parsed magnitude
    #[serde(rename = "magnitudeNumeric")]
    pub magnitude_numeric: f64,
}

impl Earthquake {
    /// Display-only key for a row at `index`.
    ///
    /// The source does not guarantee unique events, so the position is
    /// part of the key. Never use this as an identity.
    #[must_use]
    pub fn display_key(&self, index: usize) -> String {
        format!("{}-{}-{}", self.date, self.time, index)
    }
}

/// Min/max/average triple used by the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Range {
    pub max: f64,
    pub min: f64,
    pub average: f64,
}

/// Aggregate snapshot from `/earthquakes/stats`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EarthquakeStats {
    pub total_count: u64,
    pub magnitude: Range,
    pub depth: Range,
    /// Absent when the dataset is empty
    #[serde(default)]
    pub most_recent: Option<Earthquake>,
    /// Absent when the dataset is empty
    #[serde(default)]
    pub strongest: Option<Earthquake>,
}

/// Filters echoed back by `/earthquakes/filter`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct AppliedFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_magnitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_magnitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Response metadata.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Meta {
    /// "Data as of" time shown to the user
    pub timestamp: String,

    /// Number of records in `data`
    pub count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_available: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AppliedFilters>,
}

/// The `{meta, data}` envelope around every API response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub meta: Meta,
    pub data: T,
}
