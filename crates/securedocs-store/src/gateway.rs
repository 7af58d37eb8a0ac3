//! HTTP blob store: uploads through a pinning service, downloads through a
//! list of public content gateways.
//!
//! Uploads are a multipart `POST` with a bearer token. Downloads try each
//! gateway in order; the first success wins, and if every gateway fails the
//! individual failures are returned together.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use securedocs_core::BlobLocator;
use url::Url;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// Environment variable holding the pinning service bearer token.
pub const PINNING_TOKEN_ENV: &str = "SECUREDOCS_PINNING_JWT";

/// Placeholder replaced by the locator in gateway templates.
pub const LOCATOR_PLACEHOLDER: &str = "{cid}";

/// Default cap on a gateway response body (256 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 256 * 1024 * 1024;

/// Configuration for [`HttpBlobStore`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Multipart upload endpoint.
    pub pinning_endpoint: String,

    /// Download URL templates, tried in order.
    pub gateways: Vec<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Bearer token for uploads. Never serialized.
    #[serde(skip_serializing)]
    pub bearer_token: Option<String>,

    /// Tag attached to uploads in the pinning metadata.
    pub app_tag: String,

    /// Largest response body accepted from a gateway, in bytes.
    pub max_response_bytes: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            pinning_endpoint: "https://api.pinata.cloud/pinning/pinFileToIPFS".to_string(),
            gateways: vec![
                "https://{cid}.ipfs.dweb.link".to_string(),
                "https://ipfs.io/ipfs/{cid}".to_string(),
                "https://w3s.link/ipfs/{cid}".to_string(),
                "https://cloudflare-ipfs.com/ipfs/{cid}".to_string(),
                "https://gateway.pinata.cloud/ipfs/{cid}".to_string(),
            ],
            request_timeout_secs: 30,
            bearer_token: None,
            app_tag: "securedocs".to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl GatewayConfig {
    /// Defaults, with the bearer token read from [`PINNING_TOKEN_ENV`].
    pub fn from_env() -> Self {
        let bearer_token = std::env::var(PINNING_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            bearer_token,
            ..Self::default()
        }
    }

    /// Expand every gateway template for `locator`.
    pub fn gateway_urls(&self, locator: &BlobLocator) -> Vec<String> {
        self.gateways
            .iter()
            .map(|template| template.replace(LOCATOR_PLACEHOLDER, locator.as_str()))
            .collect()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("pinning_endpoint", &self.pinning_endpoint)
            .field("gateways", &self.gateways)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("app_tag", &self.app_tag)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

/// Blob store backed by a pinning service and public gateways.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    config: GatewayConfig,
    client: Client,
}

impl HttpBlobStore {
    pub fn new(config: GatewayConfig) -> BlobResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn fetch_one(&self, url: &str) -> BlobResult<Bytes> {
        let url = Url::parse(url)?;
        let mut response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Rejected {
                status,
                body: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        // The declared length may be absent or wrong; count while streaming.
        let limit = self.config.max_response_bytes;
        if let Some(declared) = response.content_length() {
            within_limit(declared, limit)?;
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            within_limit((body.len() + chunk.len()) as u64, limit)?;
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

fn within_limit(len: u64, limit: u64) -> BlobResult<()> {
    if len > limit {
        return Err(BlobError::TooLarge { limit });
    }
    Ok(())
}

/// Pull the content identifier out of a pinning response.
///
/// Services disagree on the field name; `IpfsHash`, `cid` and `value.cid`
/// are accepted in that order.
pub fn extract_locator(body: &serde_json::Value) -> Option<&str> {
    body.get("IpfsHash")
        .and_then(|v| v.as_str())
        .or_else(|| body.get("cid").and_then(|v| v.as_str()))
        .or_else(|| body.pointer("/value/cid").and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, bytes: Bytes, name: &str) -> BlobResult<BlobLocator> {
        let token = self
            .config
            .bearer_token
            .as_deref()
            .ok_or(BlobError::MissingCredentials(PINNING_TOKEN_ENV))?;
        let endpoint = Url::parse(&self.config.pinning_endpoint)?;

        let metadata = serde_json::json!({
            "name": name,
            "keyvalues": { "app": self.config.app_tag },
        });

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes.to_vec())
                    .file_name(name.to_string())
                    .mime_str("application/octet-stream")?,
            )
            .text("pinataMetadata", metadata.to_string());

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(BlobError::Rejected { status, body: text });
        }

        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|_| BlobError::MissingLocator(text.clone()))?;
        let cid = extract_locator(&body).ok_or_else(|| BlobError::MissingLocator(text.clone()))?;

        tracing::debug!(file = name, cid, "blob pinned");
        Ok(BlobLocator::new(cid)?)
    }

    async fn get(&self, locator: &BlobLocator) -> BlobResult<Bytes> {
        let mut errors = Vec::new();

        for url in self.config.gateway_urls(locator) {
            match self.fetch_one(&url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::warn!(gateway = %url, error = %e, "gateway fetch failed");
                    errors.push(format!("{} -> {}", url, e));
                }
            }
        }

        Err(BlobError::AllGatewaysFailed(errors))
    }
}
