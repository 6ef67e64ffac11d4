use thiserror::Error;

use crate::codec::CodecError;
use crate::schema::Phase;

/// Fatal outcome of a trial. Every variant names the codec, phase and
/// iteration where the trial stopped.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("{codec}: encode failed in {phase} at iteration {iteration}: {source}")]
    EncodeFailure {
        codec: String,
        phase: Phase,
        iteration: u64,
        #[source]
        source: CodecError,
    },

    #[error("{codec}: decode failed in {phase} at iteration {iteration}: {source}")]
    DecodeFailure {
        codec: String,
        phase: Phase,
        iteration: u64,
        #[source]
        source: CodecError,
    },

    #[error("{codec}: round-trip mismatch in {phase} at iteration {iteration}: {detail}")]
    CorrectnessViolation {
        codec: String,
        phase: Phase,
        iteration: u64,
        detail: String,
    },
}

/// A run parameter outside its accepted range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

impl BenchError {
    pub fn phase(&self) -> Phase {
        match self {
            BenchError::EncodeFailure { phase, .. }
            | BenchError::DecodeFailure { phase, .. }
            | BenchError::CorrectnessViolation { phase, .. } => *phase,
        }
    }

    pub fn iteration(&self) -> u64 {
        match self {
            BenchError::EncodeFailure { iteration, .. }
            | BenchError::DecodeFailure { iteration, .. }
            | BenchError::CorrectnessViolation { iteration, .. } => *iteration,
        }
    }
}
