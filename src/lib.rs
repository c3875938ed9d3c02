//! Circadia - Deterministic sleep-science compute engine
//!
//! Circadia transforms a user's historical sleep-vitals records into
//! personalized circadian intelligence through a set of stateless, pure
//! computations:
//!
//! - **Chronotype**: median sleep timing, circadian nadir/acrophase,
//!   melatonin window, early/intermediate/late classification
//! - **Schedule**: workday/freeday inference from wake-time variance
//! - **Sleep need**: personal baseline from free-day sleep or the
//!   recovery satiation point
//! - **Sleep debt**: exponentially-weighted rolling deficit
//! - **Energy curve**: two-process model (homeostatic pressure +
//!   circadian oscillator) predicting energy across the day
//!
//! Same input always yields the same output; there is no I/O and no shared
//! mutable state, so independent invocations are trivially parallelizable.

pub mod chronotype;
pub mod config;
pub mod debt;
pub mod energy;
pub mod engine;
pub mod error;
pub mod extract;
pub mod need;
pub mod report;
pub mod schedule;
pub mod stats;
pub mod two_process;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use engine::{ReportOptions, SleepEngine, SleepReport};
pub use error::EngineError;
pub use types::{
    ChronotypeProfile, DailyVitalsRecord, DayClassificationMap, EnergyCurve, SleepDebtResult,
    SleepNeedProfile,
};

/// Engine version embedded in all report envelopes
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report envelopes
pub const PRODUCER_NAME: &str = "circadia";
