//! `GeoJSON` reading and writing for [`BoundaryCollection`].
//!
//! Each [`BoundaryFeature`] becomes one `Feature` with a `Polygon`
//! geometry and `name` / `admin_level` properties.

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};

use crate::{BoundaryCollection, BoundaryFeature, BoundaryModelError};

/// MIME type used when offering the collection as a download.
pub const GEOJSON_MIME: &str = "application/json";

/// File name offered when downloading the boundary of `place_name`.
///
/// Control characters, quotes and path separators are replaced with `_`
/// so the name is safe both on disk and inside a `Content-Disposition`
/// header. Non-ASCII letters are kept.
#[must_use]
pub fn download_file_name(place_name: &str) -> String {
    let stem: String = place_name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '"' | '\\' | '/') {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{stem}_boundary.geojson")
}

impl BoundaryFeature {
    /// Converts this feature into a `GeoJSON` `Feature`.
    #[must_use]
    pub fn to_geojson_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("name".to_string(), JsonValue::from(self.name.clone()));
        if let Some(level) = &self.admin_level {
            properties.insert("admin_level".to_string(), JsonValue::from(level.clone()));
        }

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&self.geometry))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Reads a feature written by [`Self::to_geojson_feature`].
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryModelError::GeoJson`] if the feature has no
    /// polygon geometry or no `name` property.
    pub fn from_geojson_feature(feature: Feature) -> Result<Self, BoundaryModelError> {
        let name = feature
            .property("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| BoundaryModelError::GeoJson {
                message: "Feature has no name property".to_string(),
            })?;

        // Accept numeric admin levels written by other tools.
        let admin_level = feature.property("admin_level").and_then(|v| match v {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let geometry = feature
            .geometry
            .ok_or_else(|| BoundaryModelError::GeoJson {
                message: format!("Feature '{name}' has no geometry"),
            })?;

        let geometry: geo::Geometry<f64> =
            geometry
                .try_into()
                .map_err(|e: geojson::Error| BoundaryModelError::GeoJson {
                    message: format!("Feature '{name}' has invalid geometry: {e}"),
                })?;

        let geo::Geometry::Polygon(geometry) = geometry else {
            return Err(BoundaryModelError::GeoJson {
                message: format!("Feature '{name}' is not a Polygon"),
            });
        };

        if geometry.exterior().0.is_empty() {
            return Err(BoundaryModelError::GeoJson {
                message: format!("Feature '{name}' has an empty ring"),
            });
        }

        Ok(Self {
            name,
            admin_level,
            geometry,
        })
    }
}

impl BoundaryCollection {
    /// Converts the collection into a `GeoJSON` `FeatureCollection`.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .iter()
                .map(BoundaryFeature::to_geojson_feature)
                .collect(),
            foreign_members: None,
        }
    }

    /// Serializes the collection as a `GeoJSON` string.
    #[must_use]
    pub fn to_geojson_string(&self) -> String {
        GeoJson::FeatureCollection(self.to_feature_collection()).to_string()
    }

    /// Parses a `GeoJSON` `FeatureCollection` of named polygons.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryModelError::GeoJson`] if the input is not valid
    /// `GeoJSON`, is not a `FeatureCollection`, or any feature is not a
    /// named polygon.
    pub fn from_geojson_str(input: &str) -> Result<Self, BoundaryModelError> {
        let geojson: GeoJson = input.parse().map_err(|e: geojson::Error| {
            BoundaryModelError::GeoJson {
                message: e.to_string(),
            }
        })?;

        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(BoundaryModelError::GeoJson {
                message: "Expected a FeatureCollection".to_string(),
            });
        };

        collection
            .features
            .into_iter()
            .map(BoundaryFeature::from_geojson_feature)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BoundaryCollection {
        [
            BoundaryFeature::from_ring(
                "Kathmandu",
                Some("8".to_string()),
                vec![(85.3, 27.7), (85.31, 27.7), (85.31, 27.71), (85.3, 27.7)],
            ),
            BoundaryFeature::from_ring(
                "Lalitpur",
                None,
                vec![(85.29, 27.65), (85.35, 27.65), (85.33, 27.68)],
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn assert_coords_close(a: &[(f64, f64)], b: &[(f64, f64)]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x.0 - y.0).abs() < 1e-9, "{x:?} != {y:?}");
            assert!((x.1 - y.1).abs() < 1e-9, "{x:?} != {y:?}");
        }
    }

    #[test]
    fn writes_feature_collection_with_polygon_features() {
        let json: serde_json::Value =
            serde_json::from_str(&sample().to_geojson_string()).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["type"], "Polygon");
        assert_eq!(features[0]["properties"]["name"], "Kathmandu");
        assert_eq!(features[0]["properties"]["admin_level"], "8");
        assert!(features[1]["properties"].get("admin_level").is_none());
    }

    #[test]
    fn geojson_round_trip_preserves_names_and_rings() {
        let original = sample();
        let parsed = BoundaryCollection::from_geojson_str(&original.to_geojson_string()).unwrap();

        assert_eq!(parsed.len(), original.len());
        for (a, b) in original.iter().zip(parsed.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.admin_level, b.admin_level);
            assert_coords_close(&a.coordinates(), &b.coordinates());
        }
    }

    #[test]
    fn reads_numeric_admin_level() {
        let input = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "Bagmati", "admin_level": 4 },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[85.0, 27.0], [86.0, 27.0], [86.0, 28.0], [85.0, 27.0]]]
                }
            }]
        }"#;

        let parsed = BoundaryCollection::from_geojson_str(input).unwrap();
        assert_eq!(parsed.features()[0].admin_level.as_deref(), Some("4"));
    }

    #[test]
    fn rejects_non_polygon_features() {
        let input = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "Point" },
                "geometry": { "type": "Point", "coordinates": [85.0, 27.0] }
            }]
        }"#;

        assert!(matches!(
            BoundaryCollection::from_geojson_str(input),
            Err(BoundaryModelError::GeoJson { .. })
        ));
    }

    #[test]
    fn empty_collection_round_trips() {
        let parsed =
            BoundaryCollection::from_geojson_str(&BoundaryCollection::new().to_geojson_string())
                .unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn download_name_uses_place() {
        assert_eq!(
            download_file_name("Kathmandu"),
            "Kathmandu_boundary.geojson"
        );
    }

    #[test]
    fn download_name_replaces_unsafe_characters() {
        assert_eq!(
            download_file_name("Say\"hi\".txt\"; x=\""),
            "Say_hi_.txt_; x=__boundary.geojson"
        );
        assert_eq!(
            download_file_name("Kath\nmandu/..\\x"),
            "Kath_mandu_.._x_boundary.geojson"
        );
        assert_eq!(
            download_file_name("काठमाडौं"),
            "काठमाडौं_boundary.geojson"
        );
    }
}
