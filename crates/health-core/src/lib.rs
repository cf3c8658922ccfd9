//! Shared types, errors, thresholds and store contracts for the strategy
//! health monitoring engine.

pub mod error;
pub mod thresholds;
pub mod traits;
pub mod types;

pub use error::HealthError;
pub use thresholds::{HealthThresholds, MetricBand};
pub use traits::{BaselineStore, EventStore, SnapshotStore};
pub use types::*;
