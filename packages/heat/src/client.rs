//! Earth Engine REST client.
//!
//! Uses two endpoints:
//!
//! - `projects/{project}/maps` to register a rendered layer and obtain a
//!   tile URL template.
//! - `projects/{project}/value:compute` to evaluate region statistics.
//!
//! See <https://developers.google.com/earth-engine/reference/rest>

use std::time::Duration;

use geodash_heat_models::{DateRange, HeatLayer, LayerStats, MapLayer, Region, VisParams};
use serde_json::json;

use crate::HeatError;
use crate::composite::{layer_expression, stats_expression};

/// REST root used when `EE_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com/v1";

/// Request timeout used when `EE_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Credentials and endpoint for the Earth Engine REST API.
#[derive(Clone)]
pub struct EarthEngineConfig {
    /// REST root, e.g. `https://earthengine.googleapis.com/v1`.
    pub api_url: String,
    /// Cloud project the requests are billed to.
    pub project: String,
    /// OAuth2 bearer token.
    pub access_token: String,
    /// Total timeout for each request.
    pub timeout: Duration,
}

impl std::fmt::Debug for EarthEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarthEngineConfig")
            .field("api_url", &self.api_url)
            .field("project", &self.project)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EarthEngineConfig {
    /// Reads `EE_ACCESS_TOKEN`, `EE_PROJECT` and optionally `EE_API_URL`
    /// and `EE_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::MissingEnv`] if the token or project is unset
    /// and [`HeatError::Config`] if the timeout is not a positive integer.
    pub fn from_env() -> Result<Self, HeatError> {
        let timeout = match std::env::var("EE_TIMEOUT_SECS") {
            Ok(value) => parse_timeout(&value)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url: std::env::var("EE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            project: require_env("EE_PROJECT")?,
            access_token: require_env("EE_ACCESS_TOKEN")?,
            timeout,
        })
    }
}

fn parse_timeout(value: &str) -> Result<Duration, HeatError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(HeatError::Config {
            message: format!("EE_TIMEOUT_SECS must be a positive integer, got '{value}'"),
        }),
    }
}

fn require_env(name: &'static str) -> Result<String, HeatError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(HeatError::MissingEnv { name })
}

/// Client for composite layers and statistics.
#[derive(Debug, Clone)]
pub struct HeatClient {
    client: reqwest::Client,
    config: EarthEngineConfig,
}

impl HeatClient {
    #[must_use]
    pub const fn new(client: reqwest::Client, config: EarthEngineConfig) -> Self {
        Self { client, config }
    }

    /// Builds a client from [`EarthEngineConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`HeatError`] if credentials are missing or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, HeatError> {
        let config = EarthEngineConfig::from_env()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("geodash/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self::new(client, config))
    }

    fn project_url(&self, suffix: &str) -> String {
        format!(
            "{}/projects/{}/{suffix}",
            self.config.api_url.trim_end_matches('/'),
            self.config.project
        )
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HeatError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();

        if !status.is_success() {
            log::error!("Earth Engine request to {url} failed with status {status}");
            return Err(HeatError::Service {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let text = resp.text().await?;

        serde_json::from_str(&text).map_err(|e| HeatError::Parse {
            message: format!("Failed to parse Earth Engine response: {e}"),
        })
    }

    /// Registers one rendered layer of the composite.
    ///
    /// # Errors
    ///
    /// Returns [`HeatError`] if the request fails or the response has no
    /// map name.
    pub async fn layer(
        &self,
        region: &Region,
        range: &DateRange,
        layer: HeatLayer,
    ) -> Result<MapLayer, HeatError> {
        let vis = layer.default_vis();
        let body = map_request(region, range, layer, &vis);

        log::info!(
            "Requesting {} layer for {} ({} to {})",
            layer.title(),
            region.name,
            range.start(),
            range.end()
        );

        let resp = self.post_json(&self.project_url("maps"), &body).await?;
        parse_map_response(&self.config.api_url, &resp, layer, vis)
    }

    /// Registers every [`HeatLayer`] of the composite, in display order.
    ///
    /// # Errors
    ///
    /// Returns the first [`HeatError`] encountered.
    pub async fn layers(
        &self,
        region: &Region,
        range: &DateRange,
    ) -> Result<Vec<MapLayer>, HeatError> {
        let mut layers = Vec::with_capacity(HeatLayer::ALL.len());
        for layer in HeatLayer::ALL {
            layers.push(self.layer(region, range, *layer).await?);
        }
        Ok(layers)
    }

    /// Computes region mean and standard deviation for every layer.
    ///
    /// # Errors
    ///
    /// Returns [`HeatError`] if the request fails or the response is not a
    /// statistics dictionary.
    pub async fn stats(
        &self,
        region: &Region,
        range: &DateRange,
    ) -> Result<Vec<LayerStats>, HeatError> {
        let expression = stats_expression(&region.bbox, range, region.stats_scale);
        let body = json!({ "expression": expression.to_json() });

        log::info!("Computing statistics for {}", region.name);

        let resp = self
            .post_json(&self.project_url("value:compute"), &body)
            .await?;
        parse_stats_response(&resp)
    }
}

/// Request body for `projects.maps.create`.
#[must_use]
pub fn map_request(
    region: &Region,
    range: &DateRange,
    layer: HeatLayer,
    vis: &VisParams,
) -> serde_json::Value {
    json!({
        "expression": layer_expression(&region.bbox, range, layer).to_json(),
        "fileFormat": "AUTO_JPEG_PNG",
        "bandIds": [layer.band()],
        "visualizationOptions": {
            "ranges": [{ "min": vis.min, "max": vis.max }],
            "paletteColors": vis.palette,
        },
    })
}

/// Turns a `maps.create` response into a [`MapLayer`].
///
/// # Errors
///
/// Returns [`HeatError::Parse`] if the response has no `name`.
pub fn parse_map_response(
    api_url: &str,
    resp: &serde_json::Value,
    layer: HeatLayer,
    vis: VisParams,
) -> Result<MapLayer, HeatError> {
    let name = resp["name"].as_str().ok_or_else(|| HeatError::Parse {
        message: "No map name in Earth Engine response".to_string(),
    })?;

    Ok(MapLayer {
        layer,
        title: layer.title().to_string(),
        map_id: name.to_string(),
        tile_url: format!(
            "{}/{name}/tiles/{{z}}/{{x}}/{{y}}",
            api_url.trim_end_matches('/')
        ),
        vis,
    })
}

/// Reads `<band>_mean` / `<band>_stdDev` from a `value:compute` response.
///
/// Missing or null values mean no imagery matched and are kept as `None`.
///
/// # Errors
///
/// Returns [`HeatError::Parse`] if the response has no `result` object.
pub fn parse_stats_response(resp: &serde_json::Value) -> Result<Vec<LayerStats>, HeatError> {
    let result = resp["result"]
        .as_object()
        .ok_or_else(|| HeatError::Parse {
            message: "No result object in Earth Engine response".to_string(),
        })?;

    Ok(HeatLayer::ALL
        .iter()
        .map(|layer| {
            let band = layer.band();
            LayerStats {
                layer: *layer,
                mean: result
                    .get(&format!("{band}_mean"))
                    .and_then(serde_json::Value::as_f64),
                std_dev: result
                    .get(&format!("{band}_stdDev"))
                    .and_then(serde_json::Value::as_f64),
            }
        })
        .collect())
}
