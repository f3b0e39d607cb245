//! Error types for mesh construction and storage access.

use std::error::Error;
use std::fmt;

use tesseral_core::{CellId, CodecError};

/// Errors from mesh construction and cell storage operations.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    /// An id or index failed codec validation.
    Codec(CodecError),
    /// A bounding box axis is non-finite or inverted.
    InvalidBounds {
        /// Index of the offending axis (0 = x, 1 = y, 2 = z).
        axis: usize,
        /// Lower corner component.
        min: f64,
        /// Upper corner component.
        max: f64,
    },
    /// Strict-mode removal or lookup of an absent cell.
    NotFound {
        /// The absent id.
        id: CellId,
    },
    /// Elementwise combination of meshes with different bounds or base
    /// resolutions.
    GeometryMismatch,
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::InvalidBounds { axis, min, max } => {
                write!(f, "invalid bounds on axis {axis}: [{min}, {max}]")
            }
            Self::NotFound { id } => write!(f, "cell {id} not present"),
            Self::GeometryMismatch => {
                write!(f, "meshes differ in bounds or base resolution")
            }
        }
    }
}

impl Error for MeshError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for MeshError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}
