//! The adaptive mesh: geometry plus one sparse store per level in use.

use std::ops::{AddAssign, SubAssign};

use smallvec::SmallVec;
use tesseral_core::{BaseResolution, CellId, Codec, CodecError, Level};

use crate::bounds::BoundingBox;
use crate::error::MeshError;
use crate::geometry::Geometry;
use crate::store::LevelStore;

/// A sparse hierarchical mesh over a fixed bounding box.
///
/// Level 0 is expected to be fully populated by a sampler fill; higher
/// levels hold only refined cells. The geometry is immutable for the
/// mesh's lifetime; only cell presence and values change. Each mesh is
/// exclusively owned by its constructing task — building many meshes in
/// parallel needs no synchronization as long as each task owns its own.
///
/// Hierarchy invariants maintained by the refinement engine:
///
/// - a cell at level `L > 0` exists only if its parent exists;
/// - refinement creates or removes whole sibling octets, never partial
///   ones.
#[derive(Clone, Debug)]
pub struct AdaptiveMesh {
    geometry: Geometry,
    levels: Vec<LevelStore>,
}

impl AdaptiveMesh {
    /// Create an empty mesh over `bounds` with the given base resolution.
    ///
    /// # Errors
    ///
    /// Propagates [`BoundingBox`]/codec construction failures.
    pub fn new(bounds: BoundingBox, base: BaseResolution) -> Result<Self, MeshError> {
        let geometry = Geometry::new(bounds, base)?;
        Ok(Self {
            geometry,
            levels: Vec::new(),
        })
    }

    /// The mesh geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The index/level codec.
    pub fn codec(&self) -> &Codec {
        self.geometry.codec()
    }

    /// Number of levels with at least one allocated store.
    pub fn levels_in_use(&self) -> usize {
        self.levels.len()
    }

    /// Value of a cell, or `None` if absent.
    pub fn get(&self, id: CellId) -> Option<f64> {
        let level = self.codec().level_of(id).ok()?;
        self.levels.get(level.0 as usize)?.get(id)
    }

    /// Whether a cell is present.
    pub fn exists(&self, id: CellId) -> bool {
        self.get(id).is_some()
    }

    /// Insert or overwrite a cell value, growing the level table on
    /// demand.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for a non-addressable id.
    pub fn set(&mut self, id: CellId, value: f64) -> Result<(), CodecError> {
        let level = self.codec().level_of(id)?;
        let slot = level.0 as usize;
        if slot >= self.levels.len() {
            self.levels.resize_with(slot + 1, LevelStore::new);
        }
        self.levels[slot].set(id, value);
        Ok(())
    }

    /// Remove a cell, returning its value if present.
    ///
    /// # Errors
    ///
    /// [`MeshError::Codec`] for a non-addressable id;
    /// [`MeshError::NotFound`] in strict mode when the cell is absent.
    pub fn remove(&mut self, id: CellId, strict: bool) -> Result<Option<f64>, MeshError> {
        let level = self.codec().level_of(id)?;
        match self.levels.get_mut(level.0 as usize) {
            Some(store) => store.remove(id, strict),
            None if strict => Err(MeshError::NotFound { id }),
            None => Ok(None),
        }
    }

    /// Whether a cell has no present children (cells at the maximum
    /// refinement level are always leaves).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for a non-addressable id.
    pub fn is_leaf(&self, id: CellId) -> Result<bool, CodecError> {
        let level = self.codec().level_of(id)?;
        if level == self.codec().max_refinement_level() {
            return Ok(true);
        }
        let children = self.codec().children(id)?;
        Ok(!children.iter().any(|&c| self.exists(c)))
    }

    /// The subset of a cell's children that are present, in child order.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for a non-addressable id.
    pub fn present_children(&self, id: CellId) -> Result<SmallVec<[CellId; 8]>, CodecError> {
        let level = self.codec().level_of(id)?;
        if level == self.codec().max_refinement_level() {
            return Ok(SmallVec::new());
        }
        let children = self.codec().children(id)?;
        Ok(children.into_iter().filter(|&c| self.exists(c)).collect())
    }

    /// Present cells at one level, in storage order.
    ///
    /// With `leaves_only`, returns only cells with no present children
    /// anywhere in the mesh. Order is stable between mutations but
    /// otherwise implementation-defined.
    pub fn cells(&self, level: Level, leaves_only: bool) -> Vec<CellId> {
        let Some(store) = self.levels.get(level.0 as usize) else {
            return Vec::new();
        };
        if !leaves_only {
            return store.ids().collect();
        }
        store
            .ids()
            .filter(|&id| self.is_leaf(id).unwrap_or(false))
            .collect()
    }

    /// Present cells across all levels, coarse to fine, storage order
    /// within each level.
    pub fn all_cells(&self, leaves_only: bool) -> Vec<CellId> {
        (0..self.levels.len() as u32)
            .flat_map(|l| self.cells(Level(l), leaves_only))
            .collect()
    }

    /// All present cells sorted by id (deterministic reporting order).
    pub fn cells_sorted(&self) -> Vec<CellId> {
        let mut ids = self.all_cells(false);
        ids.sort_unstable();
        ids
    }

    /// Number of present cells at one level.
    pub fn level_len(&self, level: Level) -> usize {
        self.levels
            .get(level.0 as usize)
            .map_or(0, LevelStore::len)
    }

    /// Total number of present cells across all levels.
    pub fn cell_count(&self) -> usize {
        self.levels.iter().map(LevelStore::len).sum()
    }

    /// Walk from `id` toward the root and return the first present
    /// ancestor's value and level; `None` if no ancestor (including `id`
    /// itself) is present.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for a non-addressable id.
    pub fn resolve(&self, id: CellId) -> Result<Option<(f64, Level)>, CodecError> {
        let own_level = self.codec().level_of(id)?;
        for l in (0..=own_level.0).rev() {
            let ancestor = self.codec().ancestor_at(id, Level(l))?;
            if let Some(v) = self.get(ancestor) {
                return Ok(Some((v, Level(l))));
            }
        }
        Ok(None)
    }

    /// Largest `|value|` over all present cells, `0.0` for an empty mesh.
    pub fn max_abs_value(&self) -> f64 {
        self.levels
            .iter()
            .flat_map(|s| s.iter())
            .map(|(_, v)| v.abs())
            .fold(0.0, f64::max)
    }

    /// Rough in-memory size of the cell storage.
    pub fn storage_bytes(&self) -> usize {
        let per_cell = std::mem::size_of::<CellId>() + std::mem::size_of::<f64>();
        self.cell_count() * per_cell
    }

    /// Combine with `rhs` cell by cell, storing `op(self, rhs)` here.
    ///
    /// Cells present in `rhs` but absent here are created. For a created
    /// cell above level 0 the destination's prior value for that region
    /// is recovered from the already-combined parent by applying `op`
    /// with the parent's incoming value negated; the recovery is exact
    /// only when `op(x, -y)` inverts `op(x, y)`, which holds for
    /// addition and subtraction. `rhs` cells are visited coarse to fine
    /// so every parent is combined before its children.
    ///
    /// # Errors
    ///
    /// [`MeshError::GeometryMismatch`] if the meshes differ in bounds or
    /// base resolution.
    pub fn apply_elementwise<F>(&mut self, rhs: &AdaptiveMesh, op: F) -> Result<(), MeshError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.geometry.bounds() != rhs.geometry.bounds()
            || self.codec().base() != rhs.codec().base()
        {
            return Err(MeshError::GeometryMismatch);
        }
        for id in rhs.cells_sorted() {
            let incoming = rhs.get(id).unwrap_or(0.0);
            if let Some(current) = self.get(id) {
                self.set(id, op(current, incoming))?;
                continue;
            }
            let level = self.codec().level_of(id)?;
            if level == Level(0) {
                self.set(id, op(0.0, incoming))?;
                continue;
            }
            // The region's value lives at a coarser cell; strip the
            // parent's incoming contribution (already applied on the
            // coarser pass) to recover the prior value first.
            let parent = self.codec().ancestor_at(id, Level(level.0 - 1))?;
            let parent_incoming = rhs.get(parent).unwrap_or(0.0);
            let combined = self.get(parent).unwrap_or(0.0);
            let prior = op(combined, -parent_incoming);
            self.set(id, op(prior, incoming))?;
        }
        Ok(())
    }
}

impl AddAssign<&AdaptiveMesh> for AdaptiveMesh {
    /// In-place elementwise addition.
    ///
    /// # Panics
    ///
    /// If the meshes differ in bounds or base resolution; use
    /// [`AdaptiveMesh::apply_elementwise`] to handle that as an error.
    fn add_assign(&mut self, rhs: &AdaptiveMesh) {
        if let Err(e) = self.apply_elementwise(rhs, |a, b| a + b) {
            panic!("mesh += mesh: {e}");
        }
    }
}

impl SubAssign<&AdaptiveMesh> for AdaptiveMesh {
    /// In-place elementwise subtraction.
    ///
    /// # Panics
    ///
    /// If the meshes differ in bounds or base resolution; use
    /// [`AdaptiveMesh::apply_elementwise`] to handle that as an error.
    fn sub_assign(&mut self, rhs: &AdaptiveMesh) {
        if let Err(e) = self.apply_elementwise(rhs, |a, b| a - b) {
            panic!("mesh -= mesh: {e}");
        }
    }
}
