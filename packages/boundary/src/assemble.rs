//! Reshapes Overpass JSON responses into [`BoundaryCollection`] values.
//!
//! Only `relation` elements are considered. Each relation's `way` members
//! contribute their `geometry` points, in member order, to one ring.

use geodash_boundary_models::{BoundaryCollection, BoundaryFeature, BoundaryQuery};
use reqwest::StatusCode;

use crate::BoundaryError;

/// Turns a raw service response into a collection.
///
/// A non-success `status` fails with [`BoundaryError::Service`] before the
/// body is looked at.
///
/// # Errors
///
/// Returns [`BoundaryError::Service`] for non-success statuses and
/// [`BoundaryError::Parse`] if the body is not a valid Overpass document.
pub fn interpret_response(
    status: StatusCode,
    body: &str,
    query: &BoundaryQuery,
) -> Result<BoundaryCollection, BoundaryError> {
    if !status.is_success() {
        return Err(BoundaryError::Service {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| BoundaryError::Parse {
            message: format!("Failed to parse Overpass response: {e}"),
        })?;

    assemble(&json, query)
}

/// Builds one feature per relation that has way geometry.
///
/// # Errors
///
/// Returns [`BoundaryError::Parse`] if the document has no `elements`
/// array or a way geometry point lacks numeric `lon`/`lat`.
pub fn assemble(
    json: &serde_json::Value,
    query: &BoundaryQuery,
) -> Result<BoundaryCollection, BoundaryError> {
    // Overpass reports runtime errors (timeouts, memory limits) as a
    // `remark` on an otherwise successful response.
    if let Some(remark) = json.get("remark").and_then(serde_json::Value::as_str) {
        log::warn!("Overpass remark: {remark}");
    }

    let elements = json["elements"]
        .as_array()
        .ok_or_else(|| BoundaryError::Parse {
            message: "No elements array in Overpass response".to_string(),
        })?;

    let mut collection = BoundaryCollection::new();

    for element in elements
        .iter()
        .filter(|e| e["type"].as_str() == Some("relation"))
    {
        let ring = relation_ring(element)?;
        let tags = &element["tags"];

        let name = tags["name"].as_str().unwrap_or_else(|| query.place_name());
        let admin_level = match &tags["admin_level"] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        };

        match BoundaryFeature::from_ring(name, admin_level, ring) {
            Some(feature) => collection.push(feature),
            None => log::debug!(
                "Skipping relation {} ({name}): no way geometry",
                element["id"]
            ),
        }
    }

    Ok(collection)
}

/// Concatenates the geometry of every `way` member of a relation.
fn relation_ring(relation: &serde_json::Value) -> Result<Vec<(f64, f64)>, BoundaryError> {
    let Some(members) = relation["members"].as_array() else {
        return Ok(Vec::new());
    };

    let mut ring = Vec::new();

    for member in members.iter().filter(|m| m["type"].as_str() == Some("way")) {
        let Some(points) = member["geometry"].as_array() else {
            continue;
        };

        for point in points {
            let lon = point["lon"].as_f64();
            let lat = point["lat"].as_f64();
            let (Some(lon), Some(lat)) = (lon, lat) else {
                return Err(BoundaryError::Parse {
                    message: format!(
                        "Way {} in relation {} has a point without lon/lat: {point}",
                        member["ref"], relation["id"]
                    ),
                });
            };
            ring.push((lon, lat));
        }
    }

    Ok(ring)
}
