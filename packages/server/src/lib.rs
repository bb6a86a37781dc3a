#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the geodash dashboards.
//!
//! Serves two dashboards' worth of JSON endpoints under `/api`:
//!
//! - **Boundaries**: resolves administrative boundaries from
//!   `OpenStreetMap`, as `GeoJSON`, a geometry-free summary table, or a
//!   `GeoJSON` file download.
//! - **Heat**: land-surface temperature and NDVI composite tile layers and
//!   region statistics from Earth Engine. Disabled (503) when credentials
//!   are not configured.
//!
//! The server holds no per-user state; every request resolves its inputs
//! from scratch.

mod handlers;
pub mod interactive;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use geodash_boundary::{BoundaryError, BoundaryResolver};
use geodash_heat::HeatClient;

/// Shared application state.
pub struct AppState {
    /// Overpass boundary resolver.
    pub resolver: BoundaryResolver,
    /// Earth Engine client, when credentials are configured.
    pub heat: Option<HeatClient>,
}

impl AppState {
    /// Builds the state from environment configuration.
    ///
    /// A missing Earth Engine configuration only disables the heat
    /// endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the Overpass configuration is invalid.
    pub fn from_env() -> Result<Self, BoundaryError> {
        let resolver = BoundaryResolver::from_env()?;
        log::info!("Using Overpass endpoint {}", resolver.endpoint());

        let heat = match HeatClient::from_env() {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("Heat dashboard disabled: {e}");
                None
            }
        };

        Ok(Self { resolver, heat })
    }
}

/// Bind address and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT`, falling back to `127.0.0.1:8080`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        Self { bind_addr, port }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/admin-levels", web::get().to(handlers::admin_levels))
            .route("/boundary", web::get().to(handlers::boundary))
            .route("/boundary/summary", web::get().to(handlers::boundary_summary))
            .route(
                "/boundary/download",
                web::get().to(handlers::boundary_download),
            )
            .route("/heat/layers", web::get().to(handlers::heat_layers))
            .route("/heat/stats", web::get().to(handlers::heat_stats)),
    );
}

/// Starts the dashboard API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`) and initialises logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the state cannot be built, the
/// server fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_env().map_err(std::io::Error::other)?;
    let state = web::Data::new(state);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
