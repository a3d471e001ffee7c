//! trip-metrics - Financial reconciliation and metrics engine for road trips
//!
//! Computes everything a trip planner shows from a read-only snapshot of the
//! trip through a deterministic pipeline: fuel estimation → expense
//! normalization → aggregation → settlement → planning quality → chart series.
//!
//! ## Surfaces
//!
//! - **Library**: `compute_metrics` and the caching `MetricsProcessor`
//! - **C ABI**: `tripm_*` functions in [`ffi`]
//! - **CLI**: the `tripmetrics` binary (feature `cli`)

pub mod aggregator;
pub mod charts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod fuel;
pub mod normalizer;
pub mod pipeline;
pub mod quality;
pub mod settlement;
pub mod types;
pub mod validation;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::MetricsConfig;
pub use encoder::{MetricsEncoder, MetricsReport};
pub use error::MetricsError;
pub use pipeline::{
    compute_metrics, compute_metrics_with, parse_snapshot, snapshot_fingerprint,
    snapshot_json_to_metrics, MetricsProcessor,
};
pub use types::{MetricsResult, TripSnapshot};
pub use validation::{validate_snapshot, ValidationIssue};

/// Library version embedded in all reports
pub const TRIP_METRICS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "trip-metrics";
