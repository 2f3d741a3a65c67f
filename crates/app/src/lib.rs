//! # heatlink-app
//!
//! Application layer — the feature-to-component mapping engine plus
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `FeatureSource` — device enumeration and feature fetch
//!   - `CommandExecutor` — vendor command execution
//!   - `DiscoveryPublisher` — discovery/state publishing
//! - Hold the **declarative metadata registry**: per-variant, read-only
//!   tables associating member names with structured metadata, built once
//!   at process start
//! - Evaluate **property accessors** (plain and dependent retrieval)
//!   against a device's feature store
//! - Run the **component synthesizer**: the multi-pass pipeline that turns
//!   a classified device plus its feature list into one discovery document
//!
//! ## Dependency rule
//! Depends on `heatlink-domain` only. Never imports adapter crates;
//! adapters depend on *this* crate, not the reverse. The mapping engine is
//! synchronous and performs no IO — ports are the only async surface.

pub mod accessor;
pub mod ports;
pub mod registry;
pub mod synth;
pub mod topics;
