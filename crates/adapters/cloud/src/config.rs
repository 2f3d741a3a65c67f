//! Cloud adapter configuration.

use serde::Deserialize;

/// Configuration for the vendor cloud connection.
///
/// `client_id` and `refresh_token` have no sensible defaults; the daemon
/// validates them before building a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Base URL of the vendor IoT API.
    pub api_url: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// OAuth client id of the registered API application.
    pub client_id: String,
    /// Long-lived OAuth refresh token.
    pub refresh_token: String,
    /// Interval between full feature polls, in seconds.
    pub poll_interval_secs: u64,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.viessmann.com/iot/v1".to_string(),
            token_url: "https://iam.viessmann.com/idp/v2/token".to_string(),
            client_id: String::new(),
            refresh_token: String::new(),
            poll_interval_secs: 120,
            request_timeout_secs: 30,
        }
    }
}

impl CloudConfig {
    /// Whether the credentials required for a token refresh are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.refresh_token.is_empty()
    }
}
