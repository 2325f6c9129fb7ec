//! Engine facade and background scheduling for the argus alerting system.
//!
//! Hosts construct one [`engine::ArgusEngine`] at startup, inject the
//! metric source and stores, and call [`engine::ArgusEngine::start`]. The
//! engine drives the pipeline tick and the lifecycle sweep on background
//! tasks and exposes the operational API (active alerts, acknowledge,
//! resolve, threshold updates, statistics).

pub mod config;
pub mod engine;
pub mod scheduler;

pub use argus_common::types::{Alert, AlertStats, AlertType, ChannelType, Severity};
pub use config::EngineConfig;
pub use engine::ArgusEngine;
