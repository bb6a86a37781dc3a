//! Interactive dashboard.
//!
//! A menu loop over a single [`DashboardState`]. Boundary lookups replace
//! the state; the table and download actions read from it. Heat actions
//! build the Earth Engine client on first use so that the boundary side
//! works without credentials.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use geodash_boundary::{AdminLevel, BoundaryQuery, BoundaryResolver};
use geodash_cli_utils::MultiProgress;
use geodash_heat::HeatClient;
use geodash_heat::regions::{DEFAULT_REGION_ID, all_regions};
use geodash_heat_models::{DATE_FORMAT, DateRange, Region};

use crate::commands;
use crate::dashboard::{DashboardState, format_table};

enum Action {
    FetchBoundary,
    ShowTable,
    DownloadGeoJson,
    HeatLayers,
    HeatStats,
    StartServer,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::FetchBoundary,
        Self::ShowTable,
        Self::DownloadGeoJson,
        Self::HeatLayers,
        Self::HeatStats,
        Self::StartServer,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::FetchBoundary => "Fetch boundary",
            Self::ShowTable => "Show boundary table",
            Self::DownloadGeoJson => "Download GeoJSON",
            Self::HeatLayers => "Heat map layers",
            Self::HeatStats => "Heat statistics",
            Self::StartServer => "Start API server",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive dashboard until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or the resolver cannot be configured.
/// Service failures are reported and the loop continues.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("geodash");
    println!();

    let resolver = BoundaryResolver::from_env()?;
    let mut heat: Option<HeatClient> = None;
    let mut state = DashboardState::new();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::FetchBoundary => fetch(multi, &resolver, &mut state).await?,
            Action::ShowTable => match state.collection() {
                Some(collection) if state.has_features() => {
                    print!("{}", format_table(collection));
                }
                _ => println!("Nothing fetched yet."),
            },
            Action::DownloadGeoJson => download(&state)?,
            Action::HeatLayers | Action::HeatStats => {
                let Some(client) = heat_client(&mut heat) else {
                    continue;
                };
                let (region, range) = prompt_heat_request()?;

                if matches!(Action::ALL[idx], Action::HeatLayers) {
                    match commands::fetch_layers(multi, client, &region, &range).await {
                        Ok(layers) => commands::print_layers(&region, &layers),
                        Err(e) => log::error!("Failed to build heat layers: {e}"),
                    }
                } else {
                    match commands::fetch_stats(multi, client, &region, &range).await {
                        Ok(stats) => commands::print_stats(&region, &range, &stats),
                        Err(e) => log::error!("Failed to compute heat statistics: {e}"),
                    }
                }
            }
            Action::StartServer => {
                tokio::task::spawn_blocking(|| {
                    actix_web::rt::System::new().block_on(geodash_server::interactive::run())
                })
                .await??;
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

async fn fetch(
    multi: &MultiProgress,
    resolver: &BoundaryResolver,
    state: &mut DashboardState,
) -> Result<(), Box<dyn std::error::Error>> {
    let default_name = state
        .query()
        .map_or_else(|| "Kathmandu".to_string(), |q| q.place_name().to_string());

    let name: String = Input::new()
        .with_prompt("Place name")
        .default(default_name)
        .interact_text()?;

    let level_labels: Vec<&str> = AdminLevel::ALL.iter().map(|l| l.label()).collect();
    let default_level = AdminLevel::ALL
        .iter()
        .position(|l| *l == AdminLevel::default())
        .unwrap_or(0);
    let level_idx = Select::new()
        .with_prompt("Admin level")
        .items(&level_labels)
        .default(default_level)
        .interact()?;

    let query = match BoundaryQuery::new(&name, AdminLevel::ALL[level_idx]) {
        Ok(query) => query,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    match commands::fetch_boundary(multi, resolver, &query).await {
        Ok(collection) => {
            if let Some(warning) = state.record(query, collection) {
                println!("{warning}");
            } else if let Some(collection) = state.collection() {
                print!("{}", format_table(collection));
            }
        }
        Err(e) => log::error!("Boundary lookup failed: {e}"),
    }

    Ok(())
}

fn download(state: &DashboardState) -> Result<(), Box<dyn std::error::Error>> {
    let Some((file_name, body)) = state.download() else {
        println!("Nothing to download. Fetch a boundary first.");
        return Ok(());
    };

    let path: String = Input::new()
        .with_prompt("Save to")
        .default(file_name)
        .interact_text()?;
    let path = PathBuf::from(path);

    if path.exists()
        && !Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    commands::write_file(&path, &body)?;
    println!("Saved {}", path.display());
    Ok(())
}

fn heat_client(slot: &mut Option<HeatClient>) -> Option<&HeatClient> {
    if slot.is_none() {
        match HeatClient::from_env() {
            Ok(client) => *slot = Some(client),
            Err(e) => {
                println!("Heat dashboard unavailable: {e}");
                return None;
            }
        }
    }
    slot.as_ref()
}

fn prompt_heat_request() -> Result<(Region, DateRange), Box<dyn std::error::Error>> {
    let regions = all_regions();
    let region = if regions.len() == 1 {
        regions.into_iter().next()
    } else {
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        let default = regions
            .iter()
            .position(|r| r.id == DEFAULT_REGION_ID)
            .unwrap_or(0);
        let idx = Select::new()
            .with_prompt("Region")
            .items(&names)
            .default(default)
            .interact()?;
        regions.into_iter().nth(idx)
    }
    .ok_or("No regions registered")?;

    let defaults = DateRange::default();
    loop {
        let start: String = Input::new()
            .with_prompt("Start date (YYYY-MM-DD)")
            .default(defaults.start().format(DATE_FORMAT).to_string())
            .interact_text()?;
        let end: String = Input::new()
            .with_prompt("End date (YYYY-MM-DD)")
            .default(defaults.end().format(DATE_FORMAT).to_string())
            .interact_text()?;

        match DateRange::parse(&start, &end) {
            Ok(range) => return Ok((region, range)),
            Err(e) => println!("{e}"),
        }
    }
}
