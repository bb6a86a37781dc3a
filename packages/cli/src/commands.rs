//! Actions shared by the subcommands and the interactive dashboard.

use std::path::Path;

use geodash_boundary::{BoundaryCollection, BoundaryError, BoundaryQuery, BoundaryResolver};
use geodash_cli_utils::{MultiProgress, Spinner};
use geodash_heat::{HeatClient, HeatError};
use geodash_heat_models::{DateRange, LayerStats, MapLayer, Region};

/// Resolves `query` behind a spinner.
///
/// # Errors
///
/// Returns [`BoundaryError`] if the lookup fails.
pub async fn fetch_boundary(
    multi: &MultiProgress,
    resolver: &BoundaryResolver,
    query: &BoundaryQuery,
) -> Result<BoundaryCollection, BoundaryError> {
    let spinner = Spinner::start(
        multi,
        &format!(
            "Fetching boundary for {} (admin level {})",
            query.place_name(),
            query.admin_level().value()
        ),
    );

    match resolver.resolve(query).await {
        Ok(collection) => {
            spinner.finish(format!("Found {} boundary(s)", collection.len()));
            Ok(collection)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e)
        }
    }
}

/// Writes `body` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_file(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    log::info!("Wrote {} ({} bytes)", path.display(), body.len());
    Ok(())
}

/// Registers composite layers behind a spinner.
///
/// # Errors
///
/// Returns [`HeatError`] if any layer request fails.
pub async fn fetch_layers(
    multi: &MultiProgress,
    client: &HeatClient,
    region: &Region,
    range: &DateRange,
) -> Result<Vec<MapLayer>, HeatError> {
    let spinner = Spinner::start(
        multi,
        &format!(
            "Building composite for {} ({} to {})",
            region.name,
            range.start(),
            range.end()
        ),
    );
    let result = client.layers(region, range).await;
    spinner.finish_and_clear();
    result
}

/// Computes composite statistics behind a spinner.
///
/// # Errors
///
/// Returns [`HeatError`] if the computation fails.
pub async fn fetch_stats(
    multi: &MultiProgress,
    client: &HeatClient,
    region: &Region,
    range: &DateRange,
) -> Result<Vec<LayerStats>, HeatError> {
    let spinner = Spinner::start(multi, &format!("Computing statistics for {}", region.name));
    let result = client.stats(region, range).await;
    spinner.finish_and_clear();
    result
}

pub fn print_layers(region: &Region, layers: &[MapLayer]) {
    println!(
        "{} (center {:.4}, {:.4}, zoom {})",
        region.name, region.center.lat, region.center.lon, region.zoom
    );
    for layer in layers {
        println!();
        println!("{}", layer.title);
        println!(
            "  range:   {} .. {} ({})",
            layer.vis.min,
            layer.vis.max,
            layer.vis.palette.join(" -> ")
        );
        println!("  tiles:   {}", layer.tile_url);
    }
}

fn format_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

pub fn print_stats(region: &Region, range: &DateRange, stats: &[LayerStats]) {
    println!("{} ({} to {})", region.name, range.start(), range.end());
    println!("{:<28} {:>10} {:>10}", "LAYER", "MEAN", "STD DEV");
    for stat in stats {
        println!(
            "{:<28} {:>10} {:>10}",
            stat.layer.title(),
            format_stat(stat.mean),
            format_stat(stat.std_dev)
        );
    }
}

pub fn print_regions(regions: &[Region]) {
    println!("{:<16} {:<24} BBOX", "ID", "NAME");
    for region in regions {
        let [w, s, e, n] = region.bbox.coordinates();
        println!(
            "{:<16} {:<24} {w}, {s}, {e}, {n}",
            region.id, region.name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_stats_render_as_na() {
        assert_eq!(format_stat(None), "n/a");
        assert_eq!(format_stat(Some(31.4159)), "31.416");
    }

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("geodash-cli-{}", std::process::id()));
        let path = dir.join("nested").join("Kathmandu_boundary.geojson");

        write_file(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
