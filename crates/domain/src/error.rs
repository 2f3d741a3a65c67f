//! Common error types used across the workspace.
//!
//! The mapping engine itself treats every lookup miss as a normal value
//! (`Option::None`), so the variants here cover the IO boundaries only.
//! Each adapter defines its own typed error and converts via `#[from]`.

/// Top-level error for the heatlink workspace.
#[derive(Debug, thiserror::Error)]
pub enum HeatlinkError {
    /// The vendor cloud adapter failed (HTTP, auth, decode).
    #[error("cloud adapter error")]
    Cloud(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The MQTT adapter failed (connection, publish, subscribe).
    #[error("mqtt adapter error")]
    Mqtt(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A configuration value was missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
