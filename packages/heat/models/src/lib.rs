#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types for land-surface temperature and vegetation index composites.
//!
//! A composite is requested for a [`Region`] (a fixed bounding box) over a
//! [`DateRange`]. It exposes two [`HeatLayer`]s, each rendered with its own
//! [`VisParams`], and optional per-band [`LayerStats`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Date format accepted from users and sent to the imagery service.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while building composite requests.
#[derive(Debug, Error)]
pub enum HeatModelError {
    /// The end date precedes the start date.
    #[error("End date must be after start date ({start} > {end})")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// A date string was not `YYYY-MM-DD`.
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// Bounding box corners are out of range or inverted.
    #[error("Invalid bounding box: {message}")]
    InvalidBoundingBox {
        /// Description of what went wrong.
        message: String,
    },
}

/// Inclusive-start date range used to filter source imagery.
///
/// The end date is passed to the imagery service as an exclusive bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`HeatModelError::InvalidDateRange`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, HeatModelError> {
        if start > end {
            return Err(HeatModelError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Returns [`HeatModelError::InvalidDate`] for malformed dates and
    /// [`HeatModelError::InvalidDateRange`] if `start > end`.
    pub fn parse(start: &str, end: &str) -> Result<Self, HeatModelError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Parses optional `YYYY-MM-DD` strings, taking each missing bound from
    /// [`DateRange::default`].
    ///
    /// # Errors
    ///
    /// Same as [`DateRange::parse`].
    pub fn with_defaults(start: Option<&str>, end: Option<&str>) -> Result<Self, HeatModelError> {
        let defaults = Self::default();
        let start = start.map(parse_date).transpose()?.unwrap_or(defaults.start);
        let end = end.map(parse_date).transpose()?.unwrap_or(defaults.end);
        Self::new(start, end)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

impl Default for DateRange {
    /// The 2023 monsoon season, June through September.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 9, 30).unwrap_or_default(),
        }
    }
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`HeatModelError::InvalidDate`] if the input is malformed.
pub fn parse_date(value: &str) -> Result<NaiveDate, HeatModelError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| HeatModelError::InvalidDate {
        value: value.to_string(),
    })
}

/// Axis-aligned `EPSG:4326` rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude.
    pub west: f64,
    /// Southern latitude.
    pub south: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Northern latitude.
    pub north: f64,
}

impl BoundingBox {
    /// # Errors
    ///
    /// Returns [`HeatModelError::InvalidBoundingBox`] if a coordinate is out
    /// of range or the box is empty.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, HeatModelError> {
        let bbox = Self {
            west,
            south,
            east,
            north,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Checks coordinate ranges and corner ordering.
    ///
    /// # Errors
    ///
    /// Returns [`HeatModelError::InvalidBoundingBox`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), HeatModelError> {
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);

        if !(lon_ok(self.west) && lon_ok(self.east) && lat_ok(self.south) && lat_ok(self.north)) {
            return Err(HeatModelError::InvalidBoundingBox {
                message: format!("coordinates out of range: {:?}", self.coordinates()),
            });
        }
        if self.west >= self.east || self.south >= self.north {
            return Err(HeatModelError::InvalidBoundingBox {
                message: format!("corners are inverted or equal: {:?}", self.coordinates()),
            });
        }
        Ok(())
    }

    /// `[west, south, east, north]`.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Center as `(lat, lon)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::midpoint(self.south, self.north),
            f64::midpoint(self.west, self.east),
        )
    }
}

/// Map viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

/// A named area of interest for composites, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique identifier (e.g., `"kathmandu"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Composite extent; imagery is filtered by and clipped to this box.
    pub bbox: BoundingBox,
    /// Initial map center.
    pub center: MapCenter,
    /// Initial map zoom.
    pub zoom: u8,
    /// Reduction scale for statistics, in meters.
    #[serde(default = "default_scale")]
    pub stats_scale: f64,
}

const fn default_scale() -> f64 {
    30.0
}

/// Derived composite band rendered as a map layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HeatLayer {
    /// Land surface temperature from the thermal band.
    LandSurfaceTemperature,
    /// Normalized difference vegetation index.
    Ndvi,
}

impl HeatLayer {
    pub const ALL: &[Self] = &[Self::LandSurfaceTemperature, Self::Ndvi];

    /// Band name in the composite image.
    #[must_use]
    pub const fn band(self) -> &'static str {
        match self {
            Self::LandSurfaceTemperature => "LST",
            Self::Ndvi => "NDVI",
        }
    }

    /// Layer title shown in the map legend.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::LandSurfaceTemperature => "Land Surface Temperature",
            Self::Ndvi => "NDVI",
        }
    }

    /// Default rendering: 25-45 blue/white/red for temperature, -1..1
    /// brown/yellow/green for NDVI.
    #[must_use]
    pub fn default_vis(self) -> VisParams {
        match self {
            Self::LandSurfaceTemperature => VisParams {
                min: 25.0,
                max: 45.0,
                palette: vec!["0000ff".into(), "ffffff".into(), "ff0000".into()],
            },
            Self::Ndvi => VisParams {
                min: -1.0,
                max: 1.0,
                palette: vec!["a52a2a".into(), "ffff00".into(), "008000".into()],
            },
        }
    }
}

/// Linear stretch and color ramp for a single-band layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisParams {
    /// Value mapped to the first palette color.
    pub min: f64,
    /// Value mapped to the last palette color.
    pub max: f64,
    /// Hex colors without `#`.
    pub palette: Vec<String>,
}

/// A rendered composite layer ready for a slippy-map client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLayer {
    pub layer: HeatLayer,
    pub title: String,
    /// Map resource name returned by the imagery service.
    pub map_id: String,
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    pub vis: VisParams,
}

/// Region mean and standard deviation of one composite band.
///
/// Both values are `None` when no imagery matched the date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStats {
    pub layer: HeatLayer,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}
