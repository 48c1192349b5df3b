//! Tenant access token acquisition.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::LarkClient;
use super::transport::ApiRequest;
use crate::error::LarkError;

/// Tenant access token for one workflow run.
///
/// Never cached or refreshed; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_in: Option<Duration>,
}

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_in: None,
        }
    }

    /// Lifetime reported by the token endpoint.
    #[must_use]
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// Raw token for the `Authorization` header.
    pub(crate) fn secret(&self) -> &str {
        &self.token
    }

    /// First characters of the token, safe to print.
    #[must_use]
    pub fn masked(&self) -> String {
        let prefix: String = self.token.chars().take(6).collect();
        format!("{prefix}…")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
    #[serde(default)]
    expire: Option<u64>,
}

impl LarkClient {
    /// Obtain a tenant access token.
    ///
    /// Makes exactly one attempt; token acquisition is not retried.
    ///
    /// # Errors
    ///
    /// Returns [`LarkError::Auth`] for any failure, including transport errors.
    pub fn acquire_token(&self) -> Result<Credential, LarkError> {
        let url = format!("{}/auth/v3/tenant_access_token/internal/", self.base_url);
        let request = ApiRequest::post(url).json(json!({
            "app_id": self.app_id,
            "app_secret": self.app_secret,
        }));

        debug!(app_id = %self.app_id, "Requesting tenant access token");

        let response = self
            .executor
            .transport()
            .send(&request)
            .map_err(|e| LarkError::Auth(format!("request failed: {e}")))?;

        if response.status != 200 {
            return Err(LarkError::Auth(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| LarkError::Auth(format!("unreadable response: {e}")))?;

        if parsed.code != 0 {
            return Err(LarkError::Auth(format!(
                "code {}: {}",
                parsed.code, parsed.msg
            )));
        }

        let token = parsed
            .tenant_access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LarkError::Auth("response carried no token".to_owned()))?;

        info!(expires_in_secs = ?parsed.expire, "Acquired tenant access token");

        Ok(Credential {
            token,
            expires_in: parsed.expire.map(Duration::from_secs),
        })
    }
}
