//! Overpass API client.
//!
//! Sends one Overpass QL query per [`BoundaryQuery`] and hands the response
//! to [`crate::assemble`]. There is no retry: a failed request surfaces
//! immediately as a [`BoundaryError`].
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use std::time::Duration;

use geodash_boundary_models::{BoundaryCollection, BoundaryQuery};

use crate::BoundaryError;
use crate::assemble::interpret_response;

/// Public Overpass instance used when `OVERPASS_URL` is not set.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Client-side timeout used when `OVERPASS_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Overpass asks clients to identify themselves.
const USER_AGENT: &str = concat!("geodash/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the Overpass service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassConfig {
    /// Interpreter endpoint URL.
    pub endpoint: String,
    /// Total request timeout.
    pub timeout: Duration,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OVERPASS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OverpassConfig {
    /// Reads `OVERPASS_URL` and `OVERPASS_TIMEOUT_SECS`, falling back to
    /// the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Config`] if `OVERPASS_TIMEOUT_SECS` is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, BoundaryError> {
        let endpoint =
            std::env::var("OVERPASS_URL").unwrap_or_else(|_| DEFAULT_OVERPASS_URL.to_string());

        let timeout = match std::env::var("OVERPASS_TIMEOUT_SECS") {
            Ok(value) => parse_timeout(&value)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self { endpoint, timeout })
    }
}

fn parse_timeout(value: &str) -> Result<Duration, BoundaryError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(BoundaryError::Config {
            message: format!("OVERPASS_TIMEOUT_SECS must be a positive integer, got '{value}'"),
        }),
    }
}

/// Escapes a value for use inside a double-quoted Overpass QL string.
fn escape_ql(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builds the Overpass QL query selecting relations by exact `name` and
/// `admin_level`, with full member geometry.
#[must_use]
pub fn build_query(query: &BoundaryQuery) -> String {
    format!(
        "[out:json];\nrelation[\"name\"=\"{}\"][\"admin_level\"=\"{}\"];\nout geom;",
        escape_ql(query.place_name()),
        query.admin_level().value(),
    )
}

/// Resolves [`BoundaryQuery`] values into [`BoundaryCollection`] values.
///
/// Holds only a reusable HTTP client and the endpoint; no state is kept
/// between calls.
#[derive(Debug, Clone)]
pub struct BoundaryResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl BoundaryResolver {
    /// Builds a resolver with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Http`] if the client cannot be built.
    pub fn new(config: OverpassConfig) -> Result<Self, BoundaryError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self::with_client(client, config.endpoint))
    }

    /// Builds a resolver from [`OverpassConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the configuration is invalid or the
    /// client cannot be built.
    pub fn from_env() -> Result<Self, BoundaryError> {
        Self::new(OverpassConfig::from_env()?)
    }

    /// Builds a resolver around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches and assembles the boundary for `query`.
    ///
    /// An empty collection means no relation matched; see
    /// [`crate::no_match_warning`].
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Http`] on transport failure,
    /// [`BoundaryError::Service`] on a non-success status and
    /// [`BoundaryError::Parse`] on a malformed body.
    pub async fn resolve(&self, query: &BoundaryQuery) -> Result<BoundaryCollection, BoundaryError> {
        log::info!(
            "Fetching boundary for '{}' at admin level {}",
            query.place_name(),
            query.admin_level().value()
        );

        let ql = build_query(query);
        log::debug!("Overpass query: {ql}");

        let resp = self
            .client
            .post(&self.endpoint)
            .form(&[("data", ql.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = if status.is_success() {
            resp.text().await?
        } else {
            log::error!("Overpass request failed with status {status}");
            resp.text().await.unwrap_or_default()
        };

        let collection = interpret_response(status, &body, query)?;

        if collection.is_empty() {
            log::warn!("{}", crate::no_match_warning(query));
        } else {
            log::info!(
                "Resolved {} boundary feature(s) for '{}'",
                collection.len(),
                query.place_name()
            );
        }

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use geodash_boundary_models::AdminLevel;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn builds_exact_match_query() {
        let query = BoundaryQuery::new("Kathmandu", AdminLevel::City).unwrap();
        assert_eq!(
            build_query(&query),
            "[out:json];\nrelation[\"name\"=\"Kathmandu\"][\"admin_level\"=\"8\"];\nout geom;"
        );
    }

    #[test]
    fn escapes_quotes_in_place_names() {
        let query = BoundaryQuery::new(r#"Say "hi"\"#, AdminLevel::Province).unwrap();
        let ql = build_query(&query);
        assert!(ql.contains(r#"relation["name"="Say \"hi\"\\"]["admin_level"="4"];"#));
    }

    #[test]
    fn rejects_invalid_timeouts() {
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
        assert_eq!(parse_timeout(" 30 ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn default_config_points_at_public_instance() {
        let config = OverpassConfig::default();
        assert_eq!(config.endpoint, DEFAULT_OVERPASS_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    /// Serves a single canned HTTP response and returns the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        serve_raw(format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await
    }

    /// Writes `response` verbatim to the first connection.
    async fn serve_raw(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}/api/interpreter"), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn resolve_posts_query_and_assembles_response() {
        let body = serde_json::json!({
            "elements": [{
                "type": "relation",
                "id": 1,
                "tags": { "name": "Kathmandu", "admin_level": "8" },
                "members": [{
                    "type": "way",
                    "ref": 2,
                    "geometry": [
                        { "lon": 85.3, "lat": 27.7 },
                        { "lon": 85.31, "lat": 27.7 },
                        { "lon": 85.31, "lat": 27.71 },
                        { "lon": 85.3, "lat": 27.7 }
                    ]
                }]
            }]
        });
        let (url, server) = serve_once("200 OK", body.to_string()).await;

        let resolver = BoundaryResolver::with_client(reqwest::Client::new(), url);
        let query = BoundaryQuery::new("Kathmandu", AdminLevel::City).unwrap();
        let collection = resolver.resolve(&query).await.unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.features()[0].name, "Kathmandu");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/interpreter"));
        assert!(request.contains("data="));
        assert!(request.contains("Kathmandu"));
    }

    #[tokio::test]
    async fn resolve_surfaces_service_errors() {
        let (url, server) = serve_once(
            "504 Gateway Timeout",
            "{\"error\": \"too busy\"}".to_string(),
        )
        .await;

        let resolver = BoundaryResolver::with_client(reqwest::Client::new(), url);
        let query = BoundaryQuery::new("Kathmandu", AdminLevel::City).unwrap();

        match resolver.resolve(&query).await {
            Err(BoundaryError::Service { status, body }) => {
                assert_eq!(status, 504);
                assert!(body.contains("too busy"));
            }
            other => panic!("expected service error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreadable_error_body_is_still_a_service_error() {
        // Announces more body than it sends, so reading the body fails.
        let (url, server) = serve_raw(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"error\""
                .to_string(),
        )
        .await;

        let resolver = BoundaryResolver::with_client(reqwest::Client::new(), url);
        let query = BoundaryQuery::new("Kathmandu", AdminLevel::City).unwrap();

        match resolver.resolve(&query).await {
            Err(BoundaryError::Service { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.is_empty());
            }
            other => panic!("expected service error, got {other:?}"),
        }
        server.await.unwrap();
    }
}
