#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the geodash dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types so the API contract can evolve independently.

use geodash_boundary_models::{AdminLevel, BoundaryCollection, BoundaryFeature};
use geodash_heat_models::{DateRange, LayerStats, MapLayer, Region};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Whether Earth Engine credentials are configured.
    pub heat_enabled: bool,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// A selectable admin level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAdminLevel {
    /// `admin_level` tag value.
    pub value: u8,
    /// Human-readable label.
    pub label: String,
}

impl From<AdminLevel> for ApiAdminLevel {
    fn from(level: AdminLevel) -> Self {
        Self {
            value: level.value(),
            label: level.label().to_string(),
        }
    }
}

/// Query parameters for the boundary endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryQueryParams {
    /// Place name, matched exactly.
    pub name: String,
    /// Admin level (4, 6 or 8). Defaults to 8.
    pub admin_level: Option<u8>,
}

/// Response from `GET /api/boundary`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBoundaryResponse {
    /// Queried place name.
    pub name: String,
    /// Queried admin level.
    pub admin_level: u8,
    /// Matched boundaries as a `GeoJSON` `FeatureCollection`.
    pub collection: FeatureCollection,
    /// Set when nothing matched.
    pub warning: Option<String>,
}

/// One row of the boundary table (a feature without its geometry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBoundaryRow {
    pub name: String,
    pub admin_level: Option<String>,
    /// Number of ring vertices, closing vertex included.
    pub vertex_count: usize,
    /// `[lon, lat]`.
    pub centroid: Option<[f64; 2]>,
    /// `[west, south, east, north]`.
    pub bbox: Option<[f64; 4]>,
}

impl From<&BoundaryFeature> for ApiBoundaryRow {
    fn from(feature: &BoundaryFeature) -> Self {
        Self {
            name: feature.name.clone(),
            admin_level: feature.admin_level.clone(),
            vertex_count: feature.vertex_count(),
            centroid: feature.centroid().map(|(lon, lat)| [lon, lat]),
            bbox: feature.bounding_box(),
        }
    }
}

/// Response from `GET /api/boundary/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBoundarySummary {
    pub rows: Vec<ApiBoundaryRow>,
    /// Extent of all rows, `[west, south, east, north]`.
    pub bbox: Option<[f64; 4]>,
    /// Set when nothing matched.
    pub warning: Option<String>,
}

impl ApiBoundarySummary {
    #[must_use]
    pub fn new(collection: &BoundaryCollection, warning: Option<String>) -> Self {
        Self {
            rows: collection.iter().map(ApiBoundaryRow::from).collect(),
            bbox: collection.bounding_box(),
            warning,
        }
    }
}

/// Query parameters for the heat endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatQueryParams {
    /// Region id. Defaults to the registry default.
    pub region: Option<String>,
    /// Start date (`YYYY-MM-DD`).
    pub start: Option<String>,
    /// End date (`YYYY-MM-DD`).
    pub end: Option<String>,
}

/// Response from `GET /api/heat/layers`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHeatLayers {
    pub region: Region,
    pub range: DateRange,
    pub layers: Vec<MapLayer>,
}

/// Response from `GET /api/heat/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHeatStats {
    pub region_id: String,
    pub range: DateRange,
    pub stats: Vec<LayerStats>,
}
