#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary resolution against `OpenStreetMap`.
//!
//! Looks up boundary relations by exact name and `admin_level` through the
//! Overpass API and reshapes each relation's member ways into a single
//! polygon ring. Way segments are concatenated in the order the service
//! returns them; they are not stitched into a topologically correct ring,
//! so multi-way outlines that arrive out of order produce self-intersecting
//! polygons.
//!
//! A query that matches nothing yields an empty [`BoundaryCollection`]
//! rather than an error. Callers decide how to present that.

pub mod assemble;
pub mod overpass;

pub use geodash_boundary_models::{
    AdminLevel, BoundaryCollection, BoundaryFeature, BoundaryModelError, BoundaryQuery,
};
pub use overpass::{BoundaryResolver, OverpassConfig};

use thiserror::Error;

/// Errors that can occur while resolving a boundary.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Overpass request failed with status {status}: {body}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The response body was not the expected JSON document.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Resolver configuration was invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the invalid setting.
        message: String,
    },
}

/// Message shown to the user when a query matched no boundary.
#[must_use]
pub fn no_match_warning(query: &BoundaryQuery) -> String {
    format!(
        "No boundary found for '{}'. Try a different admin level.",
        query.place_name()
    )
}
