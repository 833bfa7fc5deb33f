//! IBM Quantum REST client
//!
//! Gantree: L3_Ibm → Client
//!
//! Thin async wrapper over the Qiskit Runtime REST API: default headers,
//! status-code mapping, retry on rate limits, and the backend queries the
//! transpiler and least-busy selection need.

use crate::auth::{AuthError, IbmCredentials};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Runtime API root
pub const DEFAULT_BASE_URL: &str = "https://quantum.cloud.ibm.com/api/v1/";

/// API version pinned in every request
pub const API_VERSION: &str = "2025-01-01";

const USER_AGENT_VALUE: &str = concat!("qdemo/", env!("CARGO_PKG_VERSION"), " (Rust)");

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status with body
    #[error("API error ({code}): {message}")]
    ApiError {
        /// HTTP status code
        code: u16,
        /// Response body
        message: String,
    },

    /// Body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Malformed URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// 429 Too Many Requests
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after: u64,
    },

    /// 503 Service Unavailable
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

impl ClientError {
    fn is_transient(&self) -> bool {
        matches!(self, ClientError::RateLimited { .. } | ClientError::ServiceUnavailable)
    }

    fn backoff(&self) -> Duration {
        match self {
            ClientError::RateLimited { retry_after } => Duration::from_secs(*retry_after),
            _ => Duration::from_secs(5),
        }
    }
}

/// IBM Quantum API client
/// Gantree: IbmClient // REST 클라이언트
#[derive(Clone)]
pub struct IbmClient {
    http: reqwest::Client,
    credentials: IbmCredentials,
    base_url: Url,
}

impl IbmClient {
    /// Create a client against the default endpoint
    pub fn new(credentials: IbmCredentials) -> Result<Self, ClientError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint
    pub fn with_base_url(credentials: IbmCredentials, base_url: &str) -> Result<Self, ClientError> {
        credentials.validate()?;

        // Url::join drops the last segment unless the base ends with '/'
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        let http = reqwest::Client::builder()
            .default_headers(Self::default_headers(&credentials)?)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            credentials,
            base_url,
        })
    }

    /// Create from auto-detected credentials
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(IbmCredentials::auto_load()?)
    }

    fn default_headers(credentials: &IbmCredentials) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            HeaderName::from_static("ibm-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        if let Some(crn) = credentials.instance() {
            headers.insert(
                HeaderName::from_static("service-crn"),
                HeaderValue::from_str(crn).map_err(|_| AuthError::InvalidTokenFormat)?,
            );
        }
        Ok(headers)
    }

    // ========================================================================
    // Low-level HTTP
    // ========================================================================

    /// Absolute URL for an API path such as `jobs/abc`
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.url(path)?;
        log::debug!("{} {}", method, url);
        let auth = self.credentials.auth_header().await?;
        Ok(self.http.request(method, url).header(AUTHORIZATION, auth))
    }

    /// GET and decode JSON
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).await?.send().await?;
        Self::decode(response).await
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .request(Method::POST, path)
            .await?
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// DELETE, ignoring the reply body
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.request(Method::DELETE, path).await?.send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status.as_u16() {
            401 => Err(ClientError::Auth(AuthError::AuthFailed(
                "invalid or expired token".to_string(),
            ))),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                Err(ClientError::RateLimited { retry_after })
            }
            503 => Err(ClientError::ServiceUnavailable),
            code => Err(ClientError::ApiError {
                code,
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let body = Self::check_status(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET with retry on rate limits and unavailability
    pub async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        max_retries: usize,
    ) -> Result<T, ClientError> {
        let mut attempt = 0;
        loop {
            match self.get(path).await {
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    log::warn!("GET {} failed ({}), retry {}/{}", path, e, attempt, max_retries);
                    tokio::time::sleep(e.backoff()).await;
                }
                other => return other,
            }
        }
    }

    /// POST with retry on rate limits and unavailability
    pub async fn post_with_retry<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        max_retries: usize,
    ) -> Result<T, ClientError> {
        let mut attempt = 0;
        loop {
            match self.post(path, body).await {
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    log::warn!("POST {} failed ({}), retry {}/{}", path, e, attempt, max_retries);
                    tokio::time::sleep(e.backoff()).await;
                }
                other => return other,
            }
        }
    }

    // ========================================================================
    // Backend APIs
    // ========================================================================

    /// List backends visible to the account
    /// Gantree: list_backends() -> Vec<BackendInfo> // 백엔드 목록
    pub async fn list_backends(&self) -> Result<Vec<BackendInfo>, ClientError> {
        let body: serde_json::Value = self.get_with_retry("backends", 3).await?;
        parse_backend_list(body)
    }

    /// Backend status
    pub async fn get_backend_status(&self, name: &str) -> Result<BackendStatus, ClientError> {
        self.get_with_retry(&format!("backends/{}/status", name), 3).await
    }

    /// Backend configuration (qubit count, basis gates, coupling map)
    pub async fn get_backend_config(&self, name: &str) -> Result<BackendConfig, ClientError> {
        self.get_with_retry(&format!("backends/{}/configuration", name), 3).await
    }

    /// Credentials in use
    pub fn credentials(&self) -> &IbmCredentials {
        &self.credentials
    }

    /// API root
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Accepts `{"devices": [..]}`, `{"backends": [..]}` or a bare array
fn parse_backend_list(body: serde_json::Value) -> Result<Vec<BackendInfo>, ClientError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Listing {
        Devices { devices: Vec<DeviceInfo> },
        Backends { backends: Vec<BackendInfo> },
        Bare(Vec<BackendInfo>),
    }

    Ok(match serde_json::from_value(body)? {
        Listing::Devices { devices } => devices.into_iter().map(BackendInfo::from).collect(),
        Listing::Backends { backends } => backends,
        Listing::Bare(backends) => backends,
    })
}

// ============================================================================
// Response Types
// ============================================================================

/// Device entry of the 2025 listing format
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    /// Backend name
    pub name: String,

    /// Number of qubits
    #[serde(default)]
    pub qubits: usize,

    /// Pending jobs
    #[serde(default)]
    pub queue_length: u64,

    /// Status block
    pub status: Option<DeviceStatus>,

    /// Processor family and revision
    pub processor_type: Option<ProcessorType>,

    /// CLOPS block, whose type tells simulators apart
    pub clops: Option<ClopsInfo>,
}

/// Device status (`online`, `offline`, `paused`)
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatus {
    /// Status name
    pub name: Option<String>,
    /// Status reason
    pub reason: Option<String>,
}

/// CLOPS info
#[derive(Debug, Clone, Deserialize)]
pub struct ClopsInfo {
    /// `hardware` or `simulator`
    #[serde(rename = "type")]
    pub clops_type: Option<String>,
    /// Value
    pub value: Option<u64>,
}

/// Processor type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorType {
    /// Family (e.g. "Eagle", "Heron")
    pub family: Option<String>,
    /// Revision
    pub revision: Option<String>,
}

impl From<DeviceInfo> for BackendInfo {
    fn from(device: DeviceInfo) -> Self {
        let operational = device
            .status
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .map(|n| n.eq_ignore_ascii_case("online"))
            .unwrap_or(false);
        let simulator = device
            .clops
            .as_ref()
            .and_then(|c| c.clops_type.as_deref())
            .map(|t| t == "simulator")
            .unwrap_or(false);

        BackendInfo {
            name: device.name,
            num_qubits: Some(device.qubits),
            simulator,
            operational,
            queue_length: Some(device.queue_length),
            processor_type: device.processor_type,
        }
    }
}

/// Backend summary used for selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend name
    pub name: String,

    /// Number of qubits
    #[serde(rename = "n_qubits", alias = "num_qubits", alias = "qubits", default)]
    pub num_qubits: Option<usize>,

    /// Whether the backend is a simulator
    #[serde(default)]
    pub simulator: bool,

    /// Whether the backend accepts jobs
    #[serde(default)]
    pub operational: bool,

    /// Pending jobs
    #[serde(default, alias = "pending_jobs")]
    pub queue_length: Option<u64>,

    /// Processor type
    #[serde(default)]
    pub processor_type: Option<ProcessorType>,
}

/// Backend status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Backend name
    pub backend_name: Option<String>,

    /// Operational status
    #[serde(default)]
    pub operational: bool,

    /// Pending jobs
    pub pending_jobs: Option<u64>,

    /// Status message
    pub status_msg: Option<String>,
}

/// Backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend name
    pub backend_name: Option<String>,

    /// Number of qubits
    pub n_qubits: Option<usize>,

    /// Native gate names
    pub basis_gates: Option<Vec<String>>,

    /// Directed two-qubit couplings
    pub coupling_map: Option<Vec<Vec<usize>>>,

    /// Max shots
    pub max_shots: Option<u64>,

    /// Whether the backend is a simulator
    #[serde(default)]
    pub simulator: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef0123";

    #[test]
    fn test_url_join() {
        let client = IbmClient::new(IbmCredentials::new(TOKEN)).unwrap();
        assert_eq!(
            client.url("jobs/abc/results").unwrap().as_str(),
            "https://quantum.cloud.ibm.com/api/v1/jobs/abc/results"
        );
        assert_eq!(
            client.url("/backends").unwrap().as_str(),
            "https://quantum.cloud.ibm.com/api/v1/backends"
        );

        let custom =
            IbmClient::with_base_url(IbmCredentials::new(TOKEN), "http://localhost:8080/api").unwrap();
        assert_eq!(custom.url("jobs").unwrap().as_str(), "http://localhost:8080/api/jobs");
    }

    #[test]
    fn test_rejects_invalid_credentials() {
        assert!(matches!(
            IbmClient::new(IbmCredentials::new("short")),
            Err(ClientError::Auth(AuthError::InvalidTokenFormat))
        ));
    }

    #[test]
    fn test_parse_devices_listing() {
        let body = serde_json::json!({
            "devices": [
                {
                    "name": "ibm_fez",
                    "qubits": 156,
                    "queue_length": 12,
                    "status": {"name": "online"},
                    "processor_type": {"family": "Heron", "revision": "2"},
                    "clops": {"type": "hardware", "value": 195000}
                },
                {"name": "ibm_sim", "qubits": 32, "status": {"name": "offline"},
                 "clops": {"type": "simulator"}}
            ]
        });
        let list = parse_backend_list(body).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "ibm_fez");
        assert_eq!(list[0].num_qubits, Some(156));
        assert!(list[0].operational);
        assert!(!list[0].simulator);
        assert!(list[1].simulator);
        assert!(!list[1].operational);
    }

    #[test]
    fn test_parse_legacy_and_bare_listing() {
        let legacy = serde_json::json!({
            "backends": [{"name": "ibm_brisbane", "n_qubits": 127, "operational": true}]
        });
        let list = parse_backend_list(legacy).unwrap();
        assert_eq!(list[0].num_qubits, Some(127));

        let bare = serde_json::json!([{"name": "ibm_kyiv", "num_qubits": 127, "pending_jobs": 3}]);
        let list = parse_backend_list(bare).unwrap();
        assert_eq!(list[0].queue_length, Some(3));

        assert!(parse_backend_list(serde_json::json!({"unexpected": 1})).is_err());
    }

    #[test]
    fn test_backend_config_deserialize() {
        let json = r#"{
            "backend_name": "ibm_torino",
            "n_qubits": 133,
            "basis_gates": ["cz", "id", "rz", "sx", "x"],
            "coupling_map": [[0, 1], [1, 0], [1, 2]],
            "max_shots": 100000
        }"#;
        let config: BackendConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.n_qubits, Some(133));
        assert_eq!(config.coupling_map.as_ref().map(Vec::len), Some(3));
        assert!(!config.simulator);
    }

    #[test]
    fn test_backend_status_deserialize() {
        let json = r#"{"backend_name": "ibm_fez", "operational": true, "pending_jobs": 42}"#;
        let status: BackendStatus = serde_json::from_str(json).unwrap();
        assert!(status.operational);
        assert_eq!(status.pending_jobs, Some(42));
    }

    #[test]
    fn test_transient_errors() {
        assert!(ClientError::ServiceUnavailable.is_transient());
        let limited = ClientError::RateLimited { retry_after: 7 };
        assert!(limited.is_transient());
        assert_eq!(limited.backoff(), Duration::from_secs(7));
        assert!(!ClientError::ApiError { code: 400, message: String::new() }.is_transient());
    }
}
