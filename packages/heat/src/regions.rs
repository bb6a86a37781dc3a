//! Compile-time registry of composite regions.
//!
//! Each region is a TOML file under `regions/` embedded via
//! `include_str!`. Adding a region means adding a file and an entry here.

use geodash_heat_models::Region;

use crate::HeatError;

/// Region used when none is requested.
pub const DEFAULT_REGION_ID: &str = "kathmandu";

#[cfg(test)]
const EXPECTED_REGION_COUNT: usize = 1;

const REGION_TOMLS: &[(&str, &str)] = &[("kathmandu", include_str!("../regions/kathmandu.toml"))];

/// Returns all registered regions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are compile-time
/// constants, so a failure is a development error caught by the tests.
#[must_use]
pub fn all_regions() -> Vec<Region> {
    REGION_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse region '{name}': {e}"))
        })
        .collect()
}

/// Looks up a region by id, or the default region when `id` is `None`.
///
/// # Errors
///
/// Returns [`HeatError::UnknownRegion`] if no region has that id.
pub fn find_region(id: Option<&str>) -> Result<Region, HeatError> {
    let id = id.unwrap_or(DEFAULT_REGION_ID);
    all_regions()
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| HeatError::UnknownRegion { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_regions() {
        assert_eq!(all_regions().len(), EXPECTED_REGION_COUNT);
    }

    #[test]
    fn region_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for region in &all_regions() {
            assert!(seen.insert(region.id.clone()), "Duplicate region ID: {}", region.id);
        }
    }

    #[test]
    fn all_regions_have_valid_bounds() {
        for region in &all_regions() {
            assert!(!region.name.is_empty(), "Region {} has empty name", region.id);
            assert!(
                region.bbox.validate().is_ok(),
                "Region {} has invalid bbox",
                region.id
            );
            assert!(region.stats_scale > 0.0, "Region {} has bad scale", region.id);
        }
    }

    #[test]
    fn default_region_is_kathmandu_box() {
        let region = find_region(None).unwrap();
        assert_eq!(region.bbox.coordinates(), [85.25, 27.65, 85.45, 27.75]);
        assert!((region.center.lat - 27.7).abs() < 1e-9);
        assert!((region.center.lon - 85.3).abs() < 1e-9);
        assert_eq!(region.zoom, 11);
    }

    #[test]
    fn unknown_region_is_an_error() {
        assert!(matches!(
            find_region(Some("atlantis")),
            Err(HeatError::UnknownRegion { .. })
        ));
    }
}
