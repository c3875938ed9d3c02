//! Error types for Circadia
//!
//! Only the ingest/transport boundary can fail; the analysis functions
//! model missing data as `Option`/low-confidence defaults instead of errors.

use thiserror::Error;

/// Errors that can occur at the engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse vitals history: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
