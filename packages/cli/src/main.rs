#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the geodash dashboards.
//!
//! ```text
//! geodash boundary --name Kathmandu [--admin-level 8] [--output out.geojson]
//! geodash summary --name Kathmandu [--admin-level 8]
//! geodash heat-layers [--start 2023-06-01] [--end 2023-09-30] [--region kathmandu]
//! geodash heat-stats [--start ...] [--end ...] [--region ...]
//! geodash regions
//! geodash serve [--bind 127.0.0.1] [--port 8080]
//! ```
//!
//! Running `geodash` with no subcommand enters the interactive dashboard.
//!
//! Uses `indicatif-log-bridge` (via [`geodash_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and spinners never fight for the terminal.

mod commands;
mod dashboard;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use geodash_boundary::{AdminLevel, BoundaryQuery, BoundaryResolver, no_match_warning};
use geodash_heat::HeatClient;
use geodash_heat::regions::{all_regions, find_region};
use geodash_heat_models::DateRange;
use geodash_server::ServerConfig;

use crate::dashboard::DashboardState;

#[derive(Parser)]
#[command(
    name = "geodash",
    about = "Administrative boundaries and urban heat composites"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a boundary as GeoJSON
    Boundary {
        /// Place name, matched exactly
        #[arg(long)]
        name: String,
        /// Admin level (4, 6 or 8)
        #[arg(long, default_value = "8")]
        admin_level: u8,
        /// Write the GeoJSON to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the boundary table (no geometry)
    Summary {
        /// Place name, matched exactly
        #[arg(long)]
        name: String,
        /// Admin level (4, 6 or 8)
        #[arg(long, default_value = "8")]
        admin_level: u8,
    },
    /// Build LST and NDVI composite tile layers
    HeatLayers {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Region id
        #[arg(long)]
        region: Option<String>,
    },
    /// Compute region mean and standard deviation of the composite
    HeatStats {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Region id
        #[arg(long)]
        region: Option<String>,
    },
    /// List the registered composite regions
    Regions,
    /// Start the dashboard API server
    Serve {
        /// Bind address (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn boundary_query(
    name: &str,
    admin_level: u8,
) -> Result<BoundaryQuery, Box<dyn std::error::Error>> {
    Ok(BoundaryQuery::new(name, AdminLevel::from_value(admin_level)?)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = geodash_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Boundary {
            name,
            admin_level,
            output,
        } => {
            let query = boundary_query(&name, admin_level)?;
            let resolver = BoundaryResolver::from_env()?;
            let collection = commands::fetch_boundary(&multi, &resolver, &query).await?;

            let mut state = DashboardState::new();
            if let Some(warning) = state.record(query, collection) {
                eprintln!("{warning}");
                return Ok(());
            }

            if let Some((file_name, body)) = state.download() {
                match output {
                    Some(path) => commands::write_file(&path, &body)?,
                    None => {
                        log::debug!("Writing {file_name} to stdout");
                        println!("{body}");
                    }
                }
            }
        }
        Commands::Summary { name, admin_level } => {
            let query = boundary_query(&name, admin_level)?;
            let resolver = BoundaryResolver::from_env()?;
            let collection = commands::fetch_boundary(&multi, &resolver, &query).await?;

            if collection.is_empty() {
                eprintln!("{}", no_match_warning(&query));
            } else {
                print!("{}", dashboard::format_table(&collection));
            }
        }
        Commands::HeatLayers { start, end, region } => {
            let region = find_region(region.as_deref())?;
            let range = DateRange::with_defaults(start.as_deref(), end.as_deref())?;
            let client = HeatClient::from_env()?;

            let layers = commands::fetch_layers(&multi, &client, &region, &range).await?;
            commands::print_layers(&region, &layers);
        }
        Commands::HeatStats { start, end, region } => {
            let region = find_region(region.as_deref())?;
            let range = DateRange::with_defaults(start.as_deref(), end.as_deref())?;
            let client = HeatClient::from_env()?;

            let stats = commands::fetch_stats(&multi, &client, &region, &range).await?;
            commands::print_stats(&region, &range, &stats);
        }
        Commands::Regions => commands::print_regions(&all_regions()),
        Commands::Serve { bind, port } => {
            let defaults = ServerConfig::from_env();
            let config = ServerConfig {
                bind_addr: bind.unwrap_or(defaults.bind_addr),
                port: port.unwrap_or(defaults.port),
            };

            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(geodash_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}
