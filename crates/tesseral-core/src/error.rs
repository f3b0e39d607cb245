//! Error types shared across the Tesseral workspace.
//!
//! Codec errors are local and fail fast: they indicate out-of-range input
//! and are not recoverable except by correcting the caller. Field errors
//! wrap failures of user-supplied field functions and propagate
//! unmodified through fills and sweeps.

use std::error::Error;
use std::fmt;

use crate::id::{CellId, Level, MultiIndex};

/// Errors from the index/level codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// A multi-index component is outside `[0, resolution(level))`.
    InvalidIndex {
        /// The offending index.
        index: MultiIndex,
        /// The level it was interpreted at.
        level: Level,
    },
    /// The requested level exceeds the maximum refinement level.
    LevelOutOfRange {
        /// The offending level.
        level: Level,
        /// The codec's maximum refinement level.
        max: Level,
    },
    /// The id is zero or beyond the last addressable cell.
    InvalidId {
        /// The offending id.
        id: CellId,
    },
    /// A base resolution axis is zero.
    ZeroResolution {
        /// Index of the zero axis (0 = x, 1 = y, 2 = z).
        axis: usize,
    },
    /// The base resolution cannot address even level 0 within the id's
    /// 64-bit range. This is a construction-time failure; a codec that
    /// was built successfully never raises it.
    BaseTooLarge,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex { index, level } => {
                write!(
                    f,
                    "index ({}, {}, {}) out of range at level {level}",
                    index[0], index[1], index[2]
                )
            }
            Self::LevelOutOfRange { level, max } => {
                write!(f, "level {level} exceeds maximum refinement level {max}")
            }
            Self::InvalidId { id } => write!(f, "cell id {id} is not addressable"),
            Self::ZeroResolution { axis } => {
                write!(f, "base resolution axis {axis} is zero")
            }
            Self::BaseTooLarge => {
                write!(f, "base resolution exceeds 64-bit id capacity at level 0")
            }
        }
    }
}

impl Error for CodecError {}

/// Failure of a caller-supplied field function.
///
/// Field functions are assumed pure and total over the bounding box; a
/// failure indicates a caller contract violation. The sampler and the
/// adapter abort the current fill or sweep and propagate this unmodified,
/// with no retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The field function failed to evaluate at a point.
    EvaluationFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvaluationFailed { reason } => {
                write!(f, "field evaluation failed: {reason}")
            }
        }
    }
}

impl Error for FieldError {}
