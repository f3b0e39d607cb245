//! Strongly-typed identifiers and the [`MultiIndex`] type alias.

use std::fmt;

/// Dense identifier for a `(multi-index, level)` pair within one mesh.
///
/// Ids are 1-based: `CellId(0)` is never produced by the codec. Ids
/// `1..=n0` cover level 0 in row-major order, followed by the eight times
/// larger level-1 block, and so on. The mapping is a total bijection over
/// valid `(index, level)` pairs up to the codec's maximum refinement
/// level; see [`Codec`](crate::Codec).
///
/// A `CellId` is only meaningful relative to the
/// [`BaseResolution`](crate::BaseResolution) it was encoded against. Two
/// meshes with the
/// same base resolution share an id space; meshes with different bases do
/// not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CellId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Refinement depth in the mesh hierarchy.
///
/// Level 0 is the base grid; each subsequent level doubles the per-axis
/// resolution (octree refinement, 8 children per parent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(pub u32);

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Level {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A per-axis cell index `(i, j, k)` at some refinement level.
///
/// Valid range is `[0, resolution(level))` per axis; validity is always
/// relative to a level and checked by the codec, not by the type.
pub type MultiIndex = [u64; 3];
