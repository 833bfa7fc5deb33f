//! IBM Quantum credentials
//!
//! Gantree: L3_Ibm → Auth
//!
//! Credential lookup order:
//! 1. Environment: `IBM_QUANTUM_TOKEN` (or `QISKIT_IBM_TOKEN`,
//!    `IBM_CLOUD_API_KEY`) with `IBM_QUANTUM_INSTANCE` as the instance CRN
//! 2. The Qiskit account file `~/.qiskit/qiskit-ibm.json`
//!
//! Plain platform tokens are sent as bearer tokens. IBM Cloud API keys are
//! first exchanged for an IAM access token, which is cached until shortly
//! before it expires.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Token environment variables, highest priority first
pub const TOKEN_ENV_VARS: &[&str] = &["IBM_QUANTUM_TOKEN", "QISKIT_IBM_TOKEN", "IBM_CLOUD_API_KEY"];

/// Instance (CRN) environment variable
pub const INSTANCE_ENV_VAR: &str = "IBM_QUANTUM_INSTANCE";

/// IAM token endpoint
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Refresh IAM tokens this long before they expire
const IAM_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials in any source
    #[error("IBM Quantum token not found. Set IBM_QUANTUM_TOKEN and IBM_QUANTUM_INSTANCE (e.g. in a .env file)")]
    MissingToken,

    /// Token present but malformed
    #[error("Invalid API token format")]
    InvalidTokenFormat,

    /// Rejected by the service
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Account file unreadable
    #[error("Failed to read Qiskit account file: {0}")]
    ConfigFileError(String),

    /// Account file not valid JSON or missing the entry
    #[error("Failed to parse Qiskit account file: {0}")]
    ConfigParseError(String),

    /// IAM exchange rejected
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchangeFailed(String),

    /// Transport failure during the exchange
    #[error("HTTP request failed: {0}")]
    HttpError(String),
}

/// Kind of secret held by the credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Platform token, used directly as the bearer token
    IqpToken,
    /// IBM Cloud API key, exchanged for an IAM token
    ApiKey,
}

impl TokenType {
    /// Detect token type from its prefix
    pub fn detect(token: &str) -> Self {
        if token.starts_with("ApiKey-") || token.starts_with("apikey-") {
            TokenType::ApiKey
        } else {
            TokenType::IqpToken
        }
    }
}

/// Where the credentials were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed explicitly
    Explicit,
    /// Named environment variable
    Env(String),
    /// Named entry of the Qiskit account file
    QiskitConfig(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Explicit => write!(f, "explicit"),
            CredentialSource::Env(var) => write!(f, "${}", var),
            CredentialSource::QiskitConfig(name) => write!(f, "qiskit-ibm.json [{}]", name),
        }
    }
}

/// One entry of `~/.qiskit/qiskit-ibm.json`
#[derive(Debug, Clone, Deserialize)]
struct AccountEntry {
    token: String,

    #[serde(default)]
    instance: Option<String>,

    #[serde(default)]
    channel: Option<String>,
}

/// IAM token endpoint response
#[derive(Debug, Clone, Deserialize)]
struct IamTokenResponse {
    access_token: String,

    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// IBM Quantum credentials
/// Gantree: IbmCredentials // 인증 정보
#[derive(Debug, Clone)]
pub struct IbmCredentials {
    /// API token or API key
    token: String,

    /// Token type
    token_type: TokenType,

    /// Instance CRN, sent as the `Service-CRN` header
    instance: Option<String>,

    /// Where the token came from
    source: CredentialSource,

    /// IAM access token for API keys
    iam_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl IbmCredentials {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create credentials from a token or API key
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token_type: TokenType::detect(&token),
            token,
            instance: None,
            source: CredentialSource::Explicit,
            iam_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the instance CRN
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    fn with_source(mut self, source: CredentialSource) -> Self {
        self.source = source;
        self
    }

    /// Load from environment variables
    /// Gantree: from_env() -> Result<Self> // 환경 변수
    pub fn from_env() -> Result<Self, AuthError> {
        let (var, token) = TOKEN_ENV_VARS
            .iter()
            .find_map(|var| {
                std::env::var(var)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*var, v))
            })
            .ok_or(AuthError::MissingToken)?;

        let mut creds =
            Self::new(token.trim()).with_source(CredentialSource::Env(var.to_string()));
        if let Ok(instance) = std::env::var(INSTANCE_ENV_VAR) {
            if !instance.trim().is_empty() {
                creds = creds.with_instance(instance.trim());
            }
        }
        Ok(creds)
    }

    fn account_file() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".qiskit").join("qiskit-ibm.json"))
    }

    /// Load from the Qiskit account file. Without a name, the first entry
    /// whose name starts with `default` wins, else any entry.
    /// Gantree: from_qiskit_config(name) -> Result<Self> // 계정 파일
    pub fn from_qiskit_config(name: Option<&str>) -> Result<Self, AuthError> {
        let path = Self::account_file()
            .ok_or_else(|| AuthError::ConfigFileError("no home directory".into()))?;
        let content = std::fs::read_to_string(&path)
            .map_err(|e| AuthError::ConfigFileError(format!("{}: {}", path.display(), e)))?;
        let creds = Self::parse_account_file(&content, name)?;
        log::info!("Loaded IBM Quantum credentials from {}", path.display());
        Ok(creds)
    }

    fn parse_account_file(content: &str, name: Option<&str>) -> Result<Self, AuthError> {
        let accounts: HashMap<String, AccountEntry> = serde_json::from_str(content)
            .map_err(|e| AuthError::ConfigParseError(e.to_string()))?;

        // Sorted so the fallback choice is stable
        let mut names: Vec<&String> = accounts.keys().collect();
        names.sort();

        let chosen = match name {
            Some(wanted) => names
                .into_iter()
                .find(|n| n.as_str() == wanted)
                .ok_or_else(|| {
                    AuthError::ConfigParseError(format!("account '{}' not found", wanted))
                })?,
            None => names
                .iter()
                .find(|n| n.starts_with("default"))
                .or_else(|| names.first())
                .copied()
                .ok_or_else(|| AuthError::ConfigParseError("no accounts saved".into()))?,
        };

        let entry = &accounts[chosen];
        if let Some(channel) = &entry.channel {
            log::debug!("Account '{}' uses channel {}", chosen, channel);
        }
        let mut creds =
            Self::new(entry.token.clone()).with_source(CredentialSource::QiskitConfig(chosen.clone()));
        creds.instance = entry.instance.clone();
        Ok(creds)
    }

    /// Environment first, then the Qiskit account file
    /// Gantree: auto_load() -> Result<Self> // 자동 탐색
    pub fn auto_load() -> Result<Self, AuthError> {
        match Self::from_env() {
            Ok(creds) => {
                log::info!("Loaded IBM Quantum credentials from {}", creds.source);
                Ok(creds)
            }
            Err(AuthError::MissingToken) => {
                Self::from_qiskit_config(None).map_err(|e| {
                    log::debug!("No usable Qiskit account file: {}", e);
                    AuthError::MissingToken
                })
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Raw token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Instance CRN
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Token type
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Credential source
    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// True for API keys
    pub fn requires_iam_exchange(&self) -> bool {
        self.token_type == TokenType::ApiKey
    }

    /// Basic shape check
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if self.token.len() < 32 || self.token.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidTokenFormat);
        }
        Ok(())
    }

    // ========================================================================
    // Authorization header
    // ========================================================================

    /// `Authorization` header value, exchanging API keys when needed
    /// Gantree: auth_header() -> Result<String> // 헤더
    pub async fn auth_header(&self) -> Result<String, AuthError> {
        match self.token_type {
            TokenType::IqpToken => Ok(format!("Bearer {}", self.token)),
            TokenType::ApiKey => Ok(format!("Bearer {}", self.iam_token().await?)),
        }
    }

    async fn iam_token(&self) -> Result<String, AuthError> {
        if let Some(cached) = self.iam_cache.read().await.as_ref() {
            if cached.expires_at > Instant::now() + IAM_REFRESH_MARGIN {
                return Ok(cached.access_token.clone());
            }
        }

        let api_key = self
            .token
            .strip_prefix("ApiKey-")
            .or_else(|| self.token.strip_prefix("apikey-"))
            .unwrap_or(&self.token);

        let response = reqwest::Client::new()
            .post(IAM_TOKEN_URL)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::IamTokenExchangeFailed(format!("HTTP {}: {}", status, body)));
        }

        let token: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::IamTokenExchangeFailed(e.to_string()))?;

        log::info!("IAM token obtained, expires in {}s", token.expires_in);
        *self.iam_cache.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef0123";

    #[test]
    fn test_token_type_detection() {
        assert_eq!(TokenType::detect("ApiKey-abc123"), TokenType::ApiKey);
        assert_eq!(TokenType::detect("apikey-abc123"), TokenType::ApiKey);
        assert_eq!(TokenType::detect(TOKEN), TokenType::IqpToken);
    }

    #[test]
    fn test_new_and_instance() {
        let creds = IbmCredentials::new(TOKEN).with_instance("crn:v1:bluemix:public:quantum");
        assert_eq!(creds.token(), TOKEN);
        assert_eq!(creds.instance(), Some("crn:v1:bluemix:public:quantum"));
        assert_eq!(creds.source(), &CredentialSource::Explicit);
        assert!(!creds.requires_iam_exchange());
    }

    #[test]
    fn test_validate() {
        assert!(IbmCredentials::new(TOKEN).validate().is_ok());
        assert!(matches!(
            IbmCredentials::new("").validate(),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            IbmCredentials::new("short").validate(),
            Err(AuthError::InvalidTokenFormat)
        ));
        let spaced = format!("{} x", TOKEN);
        assert!(IbmCredentials::new(spaced).validate().is_err());
    }

    #[test]
    fn test_auth_header_plain_token() {
        let creds = IbmCredentials::new("my_token");
        let header = tokio_test::block_on(creds.auth_header()).unwrap();
        assert_eq!(header, "Bearer my_token");
    }

    #[test]
    fn test_parse_account_file_default() {
        let json = r#"{
            "premium": {"token": "premium_token", "instance": "crn:premium"},
            "default-ibm-quantum-platform": {
                "channel": "ibm_quantum_platform",
                "token": "default_token",
                "instance": "crn:default"
            }
        }"#;
        let creds = IbmCredentials::parse_account_file(json, None).unwrap();
        assert_eq!(creds.token(), "default_token");
        assert_eq!(creds.instance(), Some("crn:default"));
        assert_eq!(
            creds.source(),
            &CredentialSource::QiskitConfig("default-ibm-quantum-platform".into())
        );

        let named = IbmCredentials::parse_account_file(json, Some("premium")).unwrap();
        assert_eq!(named.token(), "premium_token");
    }

    #[test]
    fn test_parse_account_file_errors() {
        assert!(matches!(
            IbmCredentials::parse_account_file("{}", None),
            Err(AuthError::ConfigParseError(_))
        ));
        assert!(matches!(
            IbmCredentials::parse_account_file("not json", None),
            Err(AuthError::ConfigParseError(_))
        ));
        let json = r#"{"a": {"token": "t"}}"#;
        assert!(IbmCredentials::parse_account_file(json, Some("b")).is_err());
        // single non-default entry is still used
        assert_eq!(IbmCredentials::parse_account_file(json, None).unwrap().token(), "t");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(
            CredentialSource::Env("IBM_QUANTUM_TOKEN".into()).to_string(),
            "$IBM_QUANTUM_TOKEN"
        );
    }

    #[test]
    fn test_missing_token_hint() {
        let msg = AuthError::MissingToken.to_string();
        assert!(msg.contains("IBM_QUANTUM_TOKEN"));
        assert!(msg.contains("IBM_QUANTUM_INSTANCE"));
    }
}
