//! Report encoding
//!
//! Wraps a `SleepReport` in a transport envelope with producer metadata and
//! a computed-at stamp for the CLI/FFI boundary. The core engine stays
//! deterministic; only this layer stamps wall-clock time and an instance id.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::SleepReport;
use crate::error::EngineError;
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Producer metadata attached to every envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// A sleep report ready for transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub report: SleepReport,
}

/// Encoder producing transport envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create an encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Wrap a report in an envelope
    pub fn encode(&self, report: SleepReport) -> ReportEnvelope {
        ReportEnvelope {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            report,
        }
    }

    /// Wrap and serialize to pretty JSON
    pub fn encode_to_json(&self, report: SleepReport) -> Result<String, EngineError> {
        let envelope = self.encode(report);
        serde_json::to_string_pretty(&envelope).map_err(EngineError::JsonError)
    }
}
