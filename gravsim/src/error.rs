//! Error taxonomy for the simulation core.
//!
//! Nothing in the core retries: a step either succeeds or the run is
//! aborted with one of these.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Rejected before the run starts.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("invalid body {index}: {reason}")]
    InvalidBody { index: usize, reason: String },

    /// A solver produced NaN or infinity. Fatal for the run.
    #[error("non-finite acceleration computed for body {body}")]
    NonFiniteAcceleration { body: usize },

    #[error("no frames were recorded")]
    NoFrames,

    #[error("no diagnostics were recorded")]
    NoDiagnostics,

    #[error("simulation has already run to completion")]
    AlreadyRun,
}

impl SimError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
