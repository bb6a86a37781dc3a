#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Land-surface temperature and NDVI composites from Earth Engine.
//!
//! All processing happens server-side. This crate builds the expression
//! graph for a Landsat 8 median composite ([`composite`]), asks the REST
//! API for map tiles of each derived band, and optionally evaluates
//! region-wide mean / standard deviation statistics ([`client`]).
//!
//! Authentication is a single bearer token read from the environment.

pub mod client;
pub mod composite;
pub mod expression;
pub mod regions;

pub use client::{EarthEngineConfig, HeatClient};

use geodash_heat_models::HeatModelError;
use thiserror::Error;

/// Errors from composite requests.
#[derive(Debug, Error)]
pub enum HeatError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Earth Engine request failed with status {status}: {body}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// A required environment variable is not set.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },

    /// Client configuration was invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the invalid setting.
        message: String,
    },

    /// Invalid request parameters.
    #[error(transparent)]
    Model(#[from] HeatModelError),

    /// No region is registered under the requested id.
    #[error("Unknown region: {id}")]
    UnknownRegion {
        /// The requested id.
        id: String,
    },
}
