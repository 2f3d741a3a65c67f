//! Wire DTOs for the vendor IoT API.
//!
//! The API wraps every collection in a `{"data": [...]}` envelope. Features
//! carry their property tree verbatim; commands arrive keyed by name with
//! the name repeated nowhere else, so the conversion into the domain
//! [`Feature`] re-injects it.

use std::collections::BTreeMap;

use heatlink_domain::feature::{Command, CommandParam, Feature};
use serde::Deserialize;
use serde_json::Value;

/// Collection envelope used by every list endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct InstallationDto {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct GatewayDto {
    pub serial: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub id: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDto {
    /// Dotted feature path; the API calls this field `feature`.
    pub feature: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDto {
    #[serde(default)]
    pub is_executable: bool,
    #[serde(default)]
    pub params: BTreeMap<String, CommandParam>,
}

impl FeatureDto {
    /// Convert into the domain feature, naming each command after its map
    /// key.
    #[must_use]
    pub fn into_domain(self) -> Feature {
        let commands = self
            .commands
            .into_iter()
            .map(|(name, command)| {
                (
                    name.clone(),
                    Command {
                        name,
                        is_executable: command.is_executable,
                        params: command.params,
                    },
                )
            })
            .collect();
        Feature {
            path: self.feature,
            is_enabled: self.is_enabled,
            is_ready: self.is_ready,
            properties: self.properties,
            commands,
        }
    }
}

/// OAuth token-endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the access token, in seconds.
    pub expires_in: u64,
}
