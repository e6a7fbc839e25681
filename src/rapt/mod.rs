//! Client for the RAPT telemetry cloud.
//!
//! Authentication is an OAuth password grant against the RAPT identity
//! server; the resulting bearer token is cached in a [`TokenCache`] owned by
//! the client and reused until five minutes before it expires.

pub mod clock;
pub mod models;
pub mod token_cache;

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{RaptCredentials, RaptSettings};

use self::{
    clock::Clock,
    models::{Device, DeviceType, TokenRequest, TokenResponse, BONDED_DEVICES_PATH, CLIENT_ID},
    token_cache::TokenCache,
};

#[derive(Debug, thiserror::Error)]
pub enum RaptError {
    #[error("RAPT authentication failed: {0}")]
    Authentication(String),

    #[error("no bonded devices on the RAPT account")]
    NoDevices,

    #[error("no bonded device matches the target address or a known category")]
    NoMatchingDevice,

    #[error("RAPT rejected the access token on {path}")]
    TokenRejected { path: String },

    #[error("RAPT request to {path} failed: {reason}")]
    Request { path: String, reason: String },

    #[error("unexpected RAPT response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct RaptClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
    auth_url: String,
    tokens: TokenCache,
}

impl RaptClient {
    pub fn new(settings: &RaptSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                base_url: settings.base_url.trim_end_matches('/').to_owned(),
                auth_url: settings.auth_url.clone(),
                tokens: TokenCache::new(clock),
            }),
        }
    }

    /// Returns a valid access token, performing the password grant if the
    /// cache is empty or the cached token is within the refresh margin.
    pub async fn access_token(&self, credentials: &RaptCredentials) -> Result<String, RaptError> {
        if let Some(token) = self.inner.tokens.get().await {
            return Ok(token);
        }

        info!("Fetching new RAPT access token");
        let token = self.fetch_token(credentials).await?;
        let stored = match chrono::Duration::try_seconds(token.expires_in) {
            Some(lifetime) => {
                self.inner
                    .tokens
                    .store(token.access_token.clone(), lifetime)
                    .await
            }
            None => None,
        };
        if stored.is_none() {
            return Err(RaptError::Authentication(format!(
                "token lifetime out of range: {}s",
                token.expires_in
            )));
        }

        Ok(token.access_token)
    }

    async fn fetch_token(&self, credentials: &RaptCredentials) -> Result<TokenResponse, RaptError> {
        debug!(url = %self.inner.auth_url, "Requesting RAPT token");

        let form = TokenRequest {
            client_id: CLIENT_ID,
            grant_type: "password",
            username: &credentials.username,
            password: &credentials.api_secret,
        };

        let resp = self
            .inner
            .http
            .post(&self.inner.auth_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| RaptError::Authentication(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RaptError::Authentication(format!(
                "identity endpoint returned {status}"
            )));
        }

        resp.json::<TokenResponse>()
            .await
            .map_err(|e| RaptError::Authentication(format!("invalid token response: {e}")))
    }

    /// List every device bonded to the account.
    ///
    /// Records that cannot be parsed are skipped with a warning rather than
    /// failing the whole listing.
    pub async fn list_devices(&self, token: &str) -> Result<Vec<Device>, RaptError> {
        let body = self.get_json(BONDED_DEVICES_PATH, token).await?;

        let records = match body {
            Value::Array(records) => records,
            other => {
                return Err(RaptError::Decode {
                    path: BONDED_DEVICES_PATH.to_owned(),
                    reason: format!("expected an array, got {}", json_kind(&other)),
                })
            }
        };

        Ok(records
            .into_iter()
            .filter_map(|record| match Device::try_from(record) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable RAPT device record");
                    None
                }
            })
            .collect())
    }

    /// Fetch the raw telemetry payload for `device`.
    ///
    /// BLE temperature probes that already report a temperature in the
    /// listing are returned as-is, without a second request.
    pub async fn fetch_telemetry(&self, device: &Device, token: &str) -> Result<Value, RaptError> {
        if device.device_type == DeviceType::BleTemperature && device.temperature.is_some() {
            debug!(device_id = %device.id, "Using inline temperature from device listing");
            return Ok(device.raw.clone());
        }

        let path = device.device_type.telemetry_path(&device.id);
        debug!(device_id = %device.id, device_type = %device.device_type, path = %path, "Fetching RAPT telemetry");
        self.get_json(&path, token).await
    }

    async fn get_json(&self, path: &str, token: &str) -> Result<Value, RaptError> {
        let url = format!("{}{}", self.inner.base_url, path);

        let resp = self
            .inner
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RaptError::Request {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            // Force a new grant next time.
            self.inner.tokens.clear().await;
            return Err(RaptError::TokenRejected {
                path: path.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(RaptError::Request {
                path: path.to_owned(),
                reason: format!("status {status}"),
            });
        }

        resp.json::<Value>().await.map_err(|e| RaptError::Decode {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Fake upstream used by tests in this crate
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
