//! View-model for the interactive boundary dashboard.
//!
//! Holds the most recent query and its result so that the table and
//! download actions work on what was last fetched, without re-querying.

use std::fmt::Write as _;

use geodash_boundary::no_match_warning;
use geodash_boundary_models::export::download_file_name;
use geodash_boundary_models::{BoundaryCollection, BoundaryQuery};

/// Last fetched boundary result.
#[derive(Debug, Default)]
pub struct DashboardState {
    last: Option<(BoundaryQuery, BoundaryCollection)>,
}

impl DashboardState {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Replaces the current result. Returns the warning to show when the
    /// query matched nothing.
    pub fn record(&mut self, query: BoundaryQuery, collection: BoundaryCollection) -> Option<String> {
        let warning = collection.is_empty().then(|| no_match_warning(&query));
        self.last = Some((query, collection));
        warning
    }

    #[must_use]
    pub fn query(&self) -> Option<&BoundaryQuery> {
        self.last.as_ref().map(|(q, _)| q)
    }

    #[must_use]
    pub fn collection(&self) -> Option<&BoundaryCollection> {
        self.last.as_ref().map(|(_, c)| c)
    }

    /// Whether there is a non-empty result to show or download.
    #[must_use]
    pub fn has_features(&self) -> bool {
        self.collection().is_some_and(|c| !c.is_empty())
    }

    /// Default file name and `GeoJSON` body for the current result.
    #[must_use]
    pub fn download(&self) -> Option<(String, String)> {
        let (query, collection) = self.last.as_ref()?;
        if collection.is_empty() {
            return None;
        }
        Some((
            download_file_name(query.place_name()),
            collection.to_geojson_string(),
        ))
    }
}

/// Renders the boundary table: one row per feature, without geometry.
///
/// # Panics
///
/// Never; writing into a `String` cannot fail.
#[must_use]
pub fn format_table(collection: &BoundaryCollection) -> String {
    let mut out = String::new();

    writeln!(
        out,
        "{:<30} {:<6} {:>8} {:<24} BBOX",
        "NAME", "LEVEL", "VERTICES", "CENTROID"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(110)).unwrap();

    for feature in collection {
        let centroid = feature
            .centroid()
            .map_or_else(|| "-".to_string(), |(lon, lat)| format!("{lon:.5}, {lat:.5}"));
        let bbox = feature.bounding_box().map_or_else(
            || "-".to_string(),
            |[w, s, e, n]| format!("{w:.4}, {s:.4}, {e:.4}, {n:.4}"),
        );
        writeln!(
            out,
            "{:<30} {:<6} {:>8} {:<24} {}",
            feature.name,
            feature.admin_level.as_deref().unwrap_or("-"),
            feature.vertex_count(),
            centroid,
            bbox
        )
        .unwrap();
    }

    writeln!(out, "\n{} boundary(s)", collection.len()).unwrap();

    out
}

#[cfg(test)]
mod tests {
    use geodash_boundary_models::{AdminLevel, BoundaryFeature};

    use super::*;

    fn square(name: &str) -> BoundaryFeature {
        BoundaryFeature::from_ring(
            name,
            Some("8".to_string()),
            vec![(85.0, 27.0), (85.2, 27.0), (85.2, 27.2), (85.0, 27.2)],
        )
        .unwrap()
    }

    fn query() -> BoundaryQuery {
        BoundaryQuery::new("Kathmandu", AdminLevel::City).unwrap()
    }

    #[test]
    fn starts_empty() {
        let state = DashboardState::new();
        assert!(state.query().is_none());
        assert!(!state.has_features());
        assert!(state.download().is_none());
    }

    #[test]
    fn empty_result_warns_and_has_nothing_to_download() {
        let mut state = DashboardState::new();
        let warning = state.record(query(), BoundaryCollection::new());

        assert_eq!(
            warning.as_deref(),
            Some("No boundary found for 'Kathmandu'. Try a different admin level.")
        );
        assert_eq!(state.query().map(BoundaryQuery::place_name), Some("Kathmandu"));
        assert!(!state.has_features());
        assert!(state.download().is_none());
    }

    #[test]
    fn download_uses_place_name() {
        let mut state = DashboardState::new();
        let collection: BoundaryCollection = std::iter::once(square("Kathmandu")).collect();
        assert!(state.record(query(), collection).is_none());

        let (file_name, body) = state.download().unwrap();
        assert_eq!(file_name, "Kathmandu_boundary.geojson");
        assert!(body.contains("FeatureCollection"));
        assert!(body.contains("Kathmandu"));
    }

    #[test]
    fn record_replaces_previous_result() {
        let mut state = DashboardState::new();
        state.record(query(), std::iter::once(square("Kathmandu")).collect());
        state.record(
            BoundaryQuery::new("Lalitpur", AdminLevel::District).unwrap(),
            BoundaryCollection::new(),
        );

        assert_eq!(state.query().map(BoundaryQuery::place_name), Some("Lalitpur"));
        assert!(!state.has_features());
    }

    #[test]
    fn table_lists_each_feature_without_coordinates() {
        let collection: BoundaryCollection =
            [square("Kathmandu"), square("Lalitpur")].into_iter().collect();
        let table = format_table(&collection);

        assert!(table.starts_with("NAME"));
        assert!(table.contains("Kathmandu"));
        assert!(table.contains("Lalitpur"));
        assert!(table.contains("85.10000, 27.10000"));
        assert!(table.trim_end().ends_with("2 boundary(s)"));
    }
}
