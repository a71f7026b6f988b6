//! etcd v2 keys API client.
//!
//! Reads go through `GET /v2/keys/<key>?recursive=..&sorted=..`, writes
//! through `PUT /v2/keys/<key>` with a form-encoded body. Endpoints are tried
//! in the configured order; a connection failure moves on to the next one.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{MutationClient, Node, QueryClient, Response, StoreError};
use crate::constants;
use crate::error::{Error, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// etcd client configuration file.
///
/// ```json
/// { "cluster": { "machines": ["http://127.0.0.1:2379"] }, "config": { "timeout": 1000000000 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtcdConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub config: ClientOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub machines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Per-request timeout in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl EtcdConfig {
    /// Configuration pointing at a single endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            cluster: ClusterConfig {
                machines: vec![endpoint.into()],
            },
            config: ClientOptions::default(),
        }
    }

    /// Load the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse etcd configuration {}: {e}",
                path.display()
            ))
        })
    }

    /// Configured machines, or the local default endpoint when none are set.
    pub fn endpoints(&self) -> Vec<String> {
        if self.cluster.machines.is_empty() {
            vec![constants::DEFAULT_ETCD_ENDPOINT.to_string()]
        } else {
            self.cluster.machines.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        self.config
            .timeout
            .filter(|nanos| *nanos > 0)
            .map_or(
                Duration::from_secs(constants::DEFAULT_ETCD_TIMEOUT_SECS),
                Duration::from_nanos,
            )
    }
}

/// Error body returned by etcd on failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: u32,
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

/// HTTP client for the etcd v2 keys API.
#[derive(Debug, Clone)]
pub struct EtcdClient {
    client: reqwest::Client,
    endpoints: Vec<Url>,
}

impl EtcdClient {
    /// Build a client from an etcd configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is not a valid `http`/`https` URL or
    /// the HTTP client cannot be created.
    pub fn new(config: &EtcdConfig) -> Result<Self> {
        let endpoints = config
            .endpoints()
            .iter()
            .map(|endpoint| parse_endpoint(endpoint))
            .collect::<Result<Vec<_>>>()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        debug!(endpoints = ?config.endpoints(), "etcd client ready");
        Ok(Self { client, endpoints })
    }

    /// Endpoints in the order they are tried.
    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    /// Send a request built for each endpoint until one is reachable.
    async fn send<F>(&self, build: F) -> std::result::Result<reqwest::Response, StoreError>
    where
        F: Fn(&Url) -> std::result::Result<reqwest::RequestBuilder, StoreError>,
    {
        let mut last_error = StoreError::Connection("no endpoint configured".to_string());

        for endpoint in &self.endpoints {
            match build(endpoint)?.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() => return Err(StoreError::Timeout(e.to_string())),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "etcd endpoint unreachable");
                    last_error = StoreError::Connection(format!("{endpoint}: {e}"));
                },
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl QueryClient for EtcdClient {
    async fn get(
        &self,
        key: &str,
        sorted: bool,
        recursive: bool,
    ) -> std::result::Result<Node, StoreError> {
        let response = self
            .send(|endpoint| {
                let mut url = keys_url(endpoint, key)?;
                url.query_pairs_mut()
                    .append_pair("recursive", bool_param(recursive))
                    .append_pair("sorted", bool_param(sorted));
                Ok(self.client.get(url))
            })
            .await?;

        decode(key, response).await
    }
}

#[async_trait]
impl MutationClient for EtcdClient {
    async fn set(&self, key: &str, value: &str, ttl: u64) -> std::result::Result<(), StoreError> {
        self.put(key, form_body(("value", value), ttl)).await
    }

    async fn set_dir(&self, key: &str, ttl: u64) -> std::result::Result<(), StoreError> {
        self.put(key, form_body(("dir", "true"), ttl)).await
    }
}

impl EtcdClient {
    async fn put(&self, key: &str, body: String) -> std::result::Result<(), StoreError> {
        let response = self
            .send(|endpoint| {
                let url = keys_url(endpoint, key)?;
                Ok(self
                    .client
                    .put(url)
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(body.clone()))
            })
            .await?;

        decode(key, response).await.map(|_| ())
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("invalid etcd endpoint '{endpoint}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "invalid etcd endpoint '{endpoint}': scheme must be http or https"
        )));
    }

    Ok(url)
}

/// Build `<endpoint>/v2/keys/<key>`, percent-encoding each key segment.
fn keys_url(endpoint: &Url, key: &str) -> std::result::Result<Url, StoreError> {
    let mut url = endpoint.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| StoreError::Connection(format!("invalid endpoint: {endpoint}")))?;
        segments.pop_if_empty().push("v2").push("keys");

        let parts: Vec<&str> = key.split('/').filter(|part| !part.is_empty()).collect();
        if parts.is_empty() {
            segments.push("");
        } else {
            segments.extend(parts);
        }
    }
    Ok(url)
}

const fn bool_param(flag: bool) -> &'static str {
    if flag { "true" } else { "false" }
}

/// Form body for a write; `ttl` is omitted when zero.
fn form_body((name, value): (&str, &str), ttl: u64) -> String {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    form.append_pair(name, value);
    if ttl > 0 {
        form.append_pair("ttl", &ttl.to_string());
    }
    form.finish()
}

async fn decode(key: &str, response: reqwest::Response) -> std::result::Result<Node, StoreError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| StoreError::Decode(format!("failed to read response body: {e}")))?;

    if status.is_success() {
        let parsed: Response = serde_json::from_slice(&body)
            .map_err(|e| StoreError::Decode(format!("unexpected response for {key}: {e}")))?;
        return Ok(parsed.node);
    }

    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(error) => Err(error_from_body(key, status.as_u16(), error)),
        Err(_) => Err(StoreError::Status {
            status: status.as_u16(),
            error_code: 0,
            message: String::from_utf8_lossy(&body).trim().to_string(),
        }),
    }
}

fn error_from_body(key: &str, status: u16, body: ErrorBody) -> StoreError {
    let key = body.cause.unwrap_or_else(|| key.to_string());
    match body.error_code {
        100 => StoreError::NotFound { key },
        102 => StoreError::NotAFile { key },
        104 => StoreError::NotADirectory { key },
        error_code => StoreError::Status {
            status,
            error_code,
            message: body.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_url() {
        let endpoint = Url::parse("http://127.0.0.1:2379").unwrap();
        assert_eq!(
            keys_url(&endpoint, "/app/name").unwrap().as_str(),
            "http://127.0.0.1:2379/v2/keys/app/name"
        );
        assert_eq!(
            keys_url(&endpoint, "/").unwrap().as_str(),
            "http://127.0.0.1:2379/v2/keys/"
        );
    }

    #[test]
    fn test_keys_url_encodes_segments() {
        let endpoint = Url::parse("http://etcd:2379/").unwrap();
        assert_eq!(
            keys_url(&endpoint, "/a b/c?d").unwrap().as_str(),
            "http://etcd:2379/v2/keys/a%20b/c%3Fd"
        );
    }

    #[test]
    fn test_form_body() {
        assert_eq!(form_body(("value", "a b&c"), 0), "value=a+b%26c");
        assert_eq!(form_body(("dir", "true"), 30), "dir=true&ttl=30");
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        assert!(parse_endpoint("http://127.0.0.1:2379").is_ok());
        assert!(parse_endpoint("https://etcd.internal").is_ok());
        assert!(parse_endpoint("unix:///var/run/etcd.sock").is_err());
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = EtcdConfig::default();
        assert_eq!(config.endpoints(), vec![constants::DEFAULT_ETCD_ENDPOINT]);
        assert_eq!(
            config.timeout(),
            Duration::from_secs(constants::DEFAULT_ETCD_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_config_parse() {
        let config: EtcdConfig = serde_json::from_str(
            r#"{"cluster": {"machines": ["http://a:2379", "http://b:2379"]}, "config": {"timeout": 2000000000, "consistency": "STRONG"}}"#,
        )
        .unwrap();
        assert_eq!(config.endpoints(), vec!["http://a:2379", "http://b:2379"]);
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EtcdConfig::load_from(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_error_from_body() {
        let not_found = error_from_body(
            "/a",
            404,
            ErrorBody {
                error_code: 100,
                message: "Key not found".into(),
                cause: Some("/a".into()),
            },
        );
        assert!(matches!(not_found, StoreError::NotFound { key } if key == "/a"));

        let raft = error_from_body(
            "/a",
            500,
            ErrorBody {
                error_code: 300,
                message: "Raft Internal Error".into(),
                cause: None,
            },
        );
        assert!(raft.is_transient());
    }

    #[test]
    fn test_client_new_rejects_bad_endpoint() {
        let config = EtcdConfig::with_endpoint("ftp://etcd");
        assert!(EtcdClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        // Port 9 (discard) is closed on test machines; the connection is refused.
        let config = EtcdConfig::with_endpoint("http://127.0.0.1:9");
        let client = EtcdClient::new(&config).unwrap();
        let err = client.get("/", true, true).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
    }
}
