//! Error types for sampling and adaptation.

use std::error::Error;
use std::fmt;

use tesseral_core::{CellId, CodecError, FieldError, Level};
use tesseral_mesh::MeshError;

/// Errors from fills and adaptation sweeps.
///
/// Per-cell refinement limits are recoverable (the sweep skips the cell
/// and continues); invariant violations and field failures abort the
/// whole sweep.
#[derive(Clone, Debug, PartialEq)]
pub enum AdaptError {
    /// An id or index failed codec validation.
    Codec(CodecError),
    /// A mesh storage operation failed.
    Mesh(MeshError),
    /// The caller-supplied field function failed; propagated unmodified.
    Field(FieldError),
    /// A refine was attempted past the maximum refinement level.
    ///
    /// Recoverable: the sweep skips the cell and reports it in
    /// [`SweepReport::skipped_at_limit`](crate::SweepReport).
    RefinementLimitExceeded {
        /// The cell whose children would exceed the limit.
        id: CellId,
        /// The level its children would occupy.
        level: Level,
    },
    /// A sibling octet was partially present during unrefine.
    ///
    /// Sibling completeness is maintained atomically by refine, so a
    /// partial octet signals a broken invariant. Fatal for the sweep,
    /// never retried.
    UnrefineInconsistency {
        /// Parent of the broken octet.
        parent: CellId,
        /// How many of the 8 children were present.
        present: usize,
    },
}

impl fmt::Display for AdaptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Mesh(e) => write!(f, "mesh: {e}"),
            Self::Field(e) => write!(f, "field: {e}"),
            Self::RefinementLimitExceeded { id, level } => {
                write!(f, "refining cell {id} would exceed maximum level at {level}")
            }
            Self::UnrefineInconsistency { parent, present } => {
                write!(
                    f,
                    "octet under parent {parent} is partial: {present} of 8 children present"
                )
            }
        }
    }
}

impl Error for AdaptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::Mesh(e) => Some(e),
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for AdaptError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<MeshError> for AdaptError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<FieldError> for AdaptError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}
