//! # heatlink-adapter-cloud
//!
//! Vendor cloud adapter. Talks to the heating vendor's IoT API over HTTPS:
//! refreshes the OAuth access token on demand, enumerates installations,
//! gateways, and devices, fetches feature lists, and executes commands.
//!
//! ## Dependency rule
//!
//! Depends on `heatlink-app` (ports) and `heatlink-domain` only; nothing in
//! the engine knows this crate exists.

mod config;
mod error;
pub mod model;

pub use config::CloudConfig;
pub use error::CloudError;

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use heatlink_app::ports::{CommandExecutor, CommandRequest, DeviceDescriptor, FeatureSource};
use heatlink_domain::device::DeviceAddress;
use heatlink_domain::error::HeatlinkError;
use heatlink_domain::feature::Feature;

use model::{DeviceDto, Envelope, FeatureDto, GatewayDto, InstallationDto, TokenResponse};

/// Slack subtracted from the advertised token lifetime so a token is never
/// used within a minute of its expiry.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

struct AccessToken {
    token: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// HTTPS client for the vendor cloud, implementing the feature-source and
/// command-executor ports.
pub struct CloudClient {
    http: reqwest::Client,
    config: CloudConfig,
    token: Mutex<Option<AccessToken>>,
}

impl CloudClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: CloudConfig) -> Result<Self, CloudError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    fn features_url(&self, address: &DeviceAddress) -> String {
        format!(
            "{}/features/installations/{}/gateways/{}/devices/{}/features",
            self.config.api_url,
            address.installation_id,
            address.gateway_id,
            address.device_id
        )
    }

    /// Return a fresh access token, refreshing through the token endpoint
    /// when the cached one is absent, stale, or explicitly invalidated.
    async fn access_token(&self, force_refresh: bool) -> Result<String, CloudError> {
        let mut slot = self.token.lock().await;
        if !force_refresh {
            if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.token.clone());
            }
        }
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::TokenRefresh(format!("{status}: {body}")));
        }
        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "access token refreshed");
        *slot = Some(AccessToken {
            token: token.access_token.clone(),
            expires_at: Instant::now()
                + Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK),
        });
        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CloudError> {
        match self.get_json_once(url, false).await {
            Err(err) if err.is_unauthorized() => {
                tracing::debug!(url, "access token rejected, refreshing once");
                self.get_json_once(url, true).await
            }
            other => other,
        }
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &str,
        force_refresh: bool,
    ) -> Result<T, CloudError> {
        let token = self.access_token(force_refresh).await?;
        let response = self.http.get(url).bearer_auth(&token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CloudError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    async fn post_command(&self, request: &CommandRequest) -> Result<(), CloudError> {
        let url = format!(
            "{}/{}/commands/{}",
            self.features_url(&request.address),
            request.feature_path,
            request.command
        );
        let token = self.access_token(false).await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&request.params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CloudError::Status {
                status: status.as_u16(),
                url,
            });
        }
        tracing::info!(
            feature = request.feature_path,
            command = request.command,
            "command executed"
        );
        Ok(())
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CloudError> {
        let api = &self.config.api_url;
        let installations: Envelope<Vec<InstallationDto>> = self
            .get_json(&format!("{api}/equipment/installations"))
            .await?;
        let mut devices = Vec::new();
        for installation in installations.data {
            let gateways: Envelope<Vec<GatewayDto>> = self
                .get_json(&format!(
                    "{api}/equipment/installations/{}/gateways",
                    installation.id
                ))
                .await?;
            for gateway in gateways.data {
                let listed: Envelope<Vec<DeviceDto>> = self
                    .get_json(&format!(
                        "{api}/equipment/installations/{}/gateways/{}/devices",
                        installation.id, gateway.serial
                    ))
                    .await?;
                for device in listed.data {
                    if device.model_id.is_empty() {
                        // Gateway pseudo-devices expose no features.
                        continue;
                    }
                    devices.push(DeviceDescriptor {
                        address: DeviceAddress {
                            installation_id: installation.id.to_string(),
                            gateway_id: gateway.serial.clone(),
                            device_id: device.id,
                        },
                        model_id: device.model_id,
                        roles: device.roles,
                    });
                }
            }
        }
        tracing::info!(count = devices.len(), "device enumeration complete");
        Ok(devices)
    }
}

impl FeatureSource for CloudClient {
    async fn get_devices(&self) -> Result<Vec<DeviceDescriptor>, HeatlinkError> {
        Ok(self.enumerate().await?)
    }

    async fn get_features(&self, address: &DeviceAddress) -> Result<Vec<Feature>, HeatlinkError> {
        let url = self.features_url(address);
        let features: Envelope<Vec<FeatureDto>> = self.get_json(&url).await?;
        Ok(features
            .data
            .into_iter()
            .map(FeatureDto::into_domain)
            .collect())
    }
}

impl CommandExecutor for CloudClient {
    async fn execute_command(&self, request: &CommandRequest) -> Result<(), HeatlinkError> {
        Ok(self.post_command(request).await?)
    }
}
