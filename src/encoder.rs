//! Report encoding
//!
//! This module wraps a metrics result in a self-describing report envelope.
//! The envelope carries producer metadata, the snapshot fingerprint and the
//! computation time, so stored reports can be matched to the snapshot they
//! were computed from.

use crate::error::MetricsError;
use crate::types::MetricsResult;
use crate::{PRODUCER_NAME, TRIP_METRICS_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// A metrics result with its envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub report_version: String,
    pub producer: ReportProducer,
    /// Hex-encoded XxHash64 of the snapshot
    pub snapshot_fingerprint: String,
    pub computed_at_utc: String,
    pub metrics: MetricsResult,
}

/// Encoder for metrics reports
pub struct MetricsEncoder {
    instance_id: String,
}

impl Default for MetricsEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a metrics result in a report
    pub fn encode(&self, metrics: &MetricsResult, fingerprint: u64) -> MetricsReport {
        MetricsReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: TRIP_METRICS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            snapshot_fingerprint: format!("{fingerprint:016x}"),
            computed_at_utc: Utc::now().to_rfc3339(),
            metrics: metrics.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        metrics: &MetricsResult,
        fingerprint: u64,
    ) -> Result<String, MetricsError> {
        let report = self.encode(metrics, fingerprint);
        serde_json::to_string_pretty(&report).map_err(MetricsError::JsonError)
    }
}
