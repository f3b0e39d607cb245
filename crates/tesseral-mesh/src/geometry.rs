//! Mapping from cell indices to physical coordinates.

use tesseral_core::{BaseResolution, CellId, Codec, CodecError, Level, MultiIndex};

use crate::bounds::BoundingBox;
use crate::error::MeshError;

/// Fixed mesh geometry: bounding box, base resolution, and the codec
/// derived from them.
///
/// All coordinate math follows two laws:
///
/// - `spacing(L) = extent / (base * 2^L)` per axis, so
///   `spacing(L) == spacing(0) / 2^L` exactly (powers of two divide
///   floats losslessly away from the subnormal range);
/// - `center(index, L) = min + (index + 0.5) * spacing(L)` element-wise.
#[derive(Clone, Debug)]
pub struct Geometry {
    bounds: BoundingBox,
    codec: Codec,
}

impl Geometry {
    /// Build a geometry, deriving the codec (and with it the maximum
    /// refinement level) from the base resolution.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidBounds`] via [`BoundingBox`] construction
    /// upstream, or [`MeshError::Codec`] if the base resolution is zero
    /// on some axis or too large to address.
    pub fn new(bounds: BoundingBox, base: BaseResolution) -> Result<Self, MeshError> {
        let codec = Codec::new(base)?;
        Ok(Self { bounds, codec })
    }

    /// The bounding box.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// The index/level codec.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Per-axis cell counts at `level`.
    ///
    /// # Errors
    ///
    /// [`CodecError::LevelOutOfRange`] past the maximum level.
    pub fn resolution(&self, level: Level) -> Result<[u64; 3], CodecError> {
        self.codec.resolution(level)
    }

    /// Per-axis cell spacing at `level`.
    ///
    /// # Errors
    ///
    /// [`CodecError::LevelOutOfRange`] past the maximum level.
    pub fn spacing(&self, level: Level) -> Result<[f64; 3], CodecError> {
        let res = self.codec.resolution(level)?;
        let extent = self.bounds.extent();
        Ok([
            extent[0] / res[0] as f64,
            extent[1] / res[1] as f64,
            extent[2] / res[2] as f64,
        ])
    }

    /// Center of the cell at `(index, level)`.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidIndex`] or [`CodecError::LevelOutOfRange`]
    /// for out-of-range input.
    pub fn center(&self, index: MultiIndex, level: Level) -> Result<[f64; 3], CodecError> {
        // encode performs the full range validation for us
        self.codec.encode(index, level)?;
        let spacing = self.spacing(level)?;
        let min = self.bounds.min();
        Ok([
            min[0] + (index[0] as f64 + 0.5) * spacing[0],
            min[1] + (index[1] as f64 + 0.5) * spacing[1],
            min[2] + (index[2] as f64 + 0.5) * spacing[2],
        ])
    }

    /// Center of the cell identified by `id`.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for a non-addressable id.
    pub fn center_of(&self, id: CellId) -> Result<[f64; 3], CodecError> {
        let (index, level) = self.codec.decode(id)?;
        self.center(index, level)
    }
}
