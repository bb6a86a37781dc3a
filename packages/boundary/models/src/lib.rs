#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary query and polygon collection types.
//!
//! A [`BoundaryQuery`] names a place and an [`AdminLevel`]. Resolving it
//! against `OpenStreetMap` yields a [`BoundaryCollection`]: an ordered list
//! of named single-ring polygons in unprojected longitude/latitude
//! (`EPSG:4326`). The collection can be written to and read back from a
//! `GeoJSON` `FeatureCollection` (see [`export`]).

pub mod export;

use geo::{BoundingRect, Centroid, LineString, Polygon};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Coordinate reference shared by every [`BoundaryCollection`].
pub const CRS: &str = "EPSG:4326";

/// Errors produced while building or reading boundary models.
#[derive(Debug, Error)]
pub enum BoundaryModelError {
    /// The place name was empty after trimming.
    #[error("Place name must not be empty")]
    EmptyPlaceName,

    /// The admin level is not one of the supported granularities.
    #[error("Invalid admin level {value}: expected one of 4, 6, 8")]
    InvalidAdminLevel {
        /// The rejected value.
        value: u8,
    },

    /// A `GeoJSON` document could not be read as a boundary collection.
    #[error("GeoJSON error: {message}")]
    GeoJson {
        /// Description of what went wrong.
        message: String,
    },
}

/// `OpenStreetMap` administrative granularity supported by the resolver.
///
/// The discriminant is the value of the `admin_level` tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminLevel {
    /// Level 4: province or state.
    Province = 4,
    /// Level 6: district.
    District = 6,
    /// Level 8: city or municipality.
    #[default]
    City = 8,
}

impl AdminLevel {
    /// All supported levels, coarsest first.
    pub const ALL: &[Self] = &[Self::Province, Self::District, Self::City];

    /// Returns the `admin_level` tag value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a level from its `admin_level` tag value.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryModelError::InvalidAdminLevel`] if the value is
    /// not 4, 6 or 8.
    pub const fn from_value(value: u8) -> Result<Self, BoundaryModelError> {
        match value {
            4 => Ok(Self::Province),
            6 => Ok(Self::District),
            8 => Ok(Self::City),
            _ => Err(BoundaryModelError::InvalidAdminLevel { value }),
        }
    }

    /// Human-readable label, e.g. `"8 (city)"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Province => "4 (province/state)",
            Self::District => "6 (district)",
            Self::City => "8 (city)",
        }
    }
}

/// A request for the boundary of a named place at a given level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryQuery {
    place_name: String,
    admin_level: AdminLevel,
}

impl BoundaryQuery {
    /// Builds a query, trimming surrounding whitespace from the name.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryModelError::EmptyPlaceName`] if the name is blank.
    pub fn new(
        place_name: impl AsRef<str>,
        admin_level: AdminLevel,
    ) -> Result<Self, BoundaryModelError> {
        let place_name = place_name.as_ref().trim();
        if place_name.is_empty() {
            return Err(BoundaryModelError::EmptyPlaceName);
        }

        Ok(Self {
            place_name: place_name.to_string(),
            admin_level,
        })
    }

    #[must_use]
    pub fn place_name(&self) -> &str {
        &self.place_name
    }

    #[must_use]
    pub const fn admin_level(&self) -> AdminLevel {
        self.admin_level
    }
}

/// One matched boundary relation as a single-ring polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// Relation name, or the queried place name when the relation is
    /// untagged.
    pub name: String,
    /// `admin_level` tag as reported by the service.
    pub admin_level: Option<String>,
    /// Polygon with a closed exterior ring and no holes.
    pub geometry: Polygon<f64>,
}

impl BoundaryFeature {
    /// Builds a feature from an ordered `(lon, lat)` ring.
    ///
    /// The ring is closed if its first and last coordinates differ.
    /// Returns `None` for an empty ring.
    #[must_use]
    pub fn from_ring(
        name: impl Into<String>,
        admin_level: Option<String>,
        ring: Vec<(f64, f64)>,
    ) -> Option<Self> {
        if ring.is_empty() {
            return None;
        }

        // `Polygon::new` closes the exterior ring.
        let geometry = Polygon::new(LineString::from(ring), vec![]);

        Some(Self {
            name: name.into(),
            admin_level,
            geometry,
        })
    }

    /// The exterior ring.
    #[must_use]
    pub fn ring(&self) -> &LineString<f64> {
        self.geometry.exterior()
    }

    /// The exterior ring as `(lon, lat)` pairs, first equal to last.
    #[must_use]
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.ring().coords().map(|c| (c.x, c.y)).collect()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.ring().0.len()
    }

    /// Centroid as `(lon, lat)`.
    #[must_use]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.geometry.centroid().map(|p| (p.x(), p.y()))
    }

    /// Bounding box as `[west, south, east, north]`.
    #[must_use]
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        self.geometry
            .bounding_rect()
            .map(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y])
    }
}

/// Ordered boundary features sharing the [`CRS`] reference.
///
/// An empty collection means "no boundary matched", not a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCollection {
    features: Vec<BoundaryFeature>,
}

impl BoundaryCollection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn push(&mut self, feature: BoundaryFeature) {
        self.features.push(feature);
    }

    #[must_use]
    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    #[must_use]
    pub fn into_features(self) -> Vec<BoundaryFeature> {
        self.features
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundaryFeature> {
        self.features.iter()
    }

    /// Bounding box enclosing every feature as `[west, south, east, north]`.
    #[must_use]
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        self.features
            .iter()
            .filter_map(BoundaryFeature::bounding_box)
            .reduce(|a, b| {
                [
                    a[0].min(b[0]),
                    a[1].min(b[1]),
                    a[2].max(b[2]),
                    a[3].max(b[3]),
                ]
            })
    }
}

impl FromIterator<BoundaryFeature> for BoundaryCollection {
    fn from_iter<I: IntoIterator<Item = BoundaryFeature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BoundaryCollection {
    type Item = &'a BoundaryFeature;
    type IntoIter = std::slice::Iter<'a, BoundaryFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_level_round_trips_through_value() {
        for level in AdminLevel::ALL {
            assert_eq!(AdminLevel::from_value(level.value()).unwrap(), *level);
        }
        assert!(matches!(
            AdminLevel::from_value(5),
            Err(BoundaryModelError::InvalidAdminLevel { value: 5 })
        ));
    }

    #[test]
    fn admin_level_defaults_to_city() {
        assert_eq!(AdminLevel::default(), AdminLevel::City);
        assert_eq!(AdminLevel::City.to_string(), "CITY");
    }

    #[test]
    fn query_rejects_blank_name() {
        assert!(matches!(
            BoundaryQuery::new("   ", AdminLevel::City),
            Err(BoundaryModelError::EmptyPlaceName)
        ));
    }

    #[test]
    fn query_trims_name() {
        let query = BoundaryQuery::new("  Kathmandu ", AdminLevel::District).unwrap();
        assert_eq!(query.place_name(), "Kathmandu");
        assert_eq!(query.admin_level(), AdminLevel::District);
    }

    #[test]
    fn empty_ring_produces_no_feature() {
        assert!(BoundaryFeature::from_ring("x", None, vec![]).is_none());
    }

    #[test]
    fn open_ring_is_closed() {
        let feature = BoundaryFeature::from_ring(
            "Patan",
            None,
            vec![(85.3, 27.6), (85.4, 27.6), (85.4, 27.7)],
        )
        .unwrap();

        let coords = feature.coordinates();
        assert_eq!(coords.len(), 4);
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn closed_ring_is_kept_verbatim() {
        let ring = vec![(85.3, 27.7), (85.31, 27.7), (85.31, 27.71), (85.3, 27.7)];
        let feature = BoundaryFeature::from_ring("Kathmandu", None, ring.clone()).unwrap();
        assert_eq!(feature.coordinates(), ring);
        assert_eq!(feature.vertex_count(), 4);
    }

    #[test]
    fn collection_bounding_box_spans_all_features() {
        let collection: BoundaryCollection = [
            BoundaryFeature::from_ring("a", None, vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)]),
            BoundaryFeature::from_ring("b", None, vec![(-1.0, 0.5), (0.0, 0.5), (0.0, 3.0)]),
        ]
        .into_iter()
        .flatten()
        .collect();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.bounding_box(), Some([-1.0, 0.5, 2.0, 3.0]));
        assert!(BoundaryCollection::new().bounding_box().is_none());
    }
}
