//! The axis-aligned bounding box a mesh samples over.

use crate::error::MeshError;

/// Axis-aligned box with per-axis `(min, max)` corners.
///
/// Fixed for the mesh's lifetime and identical across all refinement
/// levels; only the per-level spacing inside it changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: [f64; 3],
    max: [f64; 3],
}

impl BoundingBox {
    /// Construct a bounding box from its corners.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidBounds`] if any component is non-finite or
    /// `min >= max` on some axis.
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Result<Self, MeshError> {
        for axis in 0..3 {
            if !min[axis].is_finite() || !max[axis].is_finite() || min[axis] >= max[axis] {
                return Err(MeshError::InvalidBounds {
                    axis,
                    min: min[axis],
                    max: max[axis],
                });
            }
        }
        Ok(Self { min, max })
    }

    /// The lower corner.
    pub fn min(&self) -> [f64; 3] {
        self.min
    }

    /// The upper corner.
    pub fn max(&self) -> [f64; 3] {
        self.max
    }

    /// Per-axis extent `max - min`.
    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Whether a point lies inside the box (inclusive on both corners).
    pub fn contains(&self, point: [f64; 3]) -> bool {
        (0..3).all(|a| point[a] >= self.min[a] && point[a] <= self.max[a])
    }
}
