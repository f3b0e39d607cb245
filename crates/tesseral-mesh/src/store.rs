//! Sparse per-level cell storage.

use indexmap::IndexMap;
use tesseral_core::CellId;

use crate::error::MeshError;

/// Sparse mapping from [`CellId`] to scalar value for one refinement
/// level.
///
/// Backed by an insertion-ordered map: iteration order is
/// implementation-defined but stable between mutations, which is all the
/// listing contract promises. There is no implicit zero-fill — `get` on
/// an absent id is `None`, not `0.0`.
#[derive(Clone, Debug, Default)]
pub struct LevelStore {
    cells: IndexMap<CellId, f64>,
}

impl LevelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a cell, or `None` if absent.
    pub fn get(&self, id: CellId) -> Option<f64> {
        self.cells.get(&id).copied()
    }

    /// Whether a cell is present.
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    /// Insert or overwrite a cell value. No ordering constraint on
    /// insertion.
    pub fn set(&mut self, id: CellId, value: f64) {
        self.cells.insert(id, value);
    }

    /// Remove a cell, returning its value if it was present.
    ///
    /// # Errors
    ///
    /// With `strict` set, removing an absent cell is
    /// [`MeshError::NotFound`]; otherwise it is an idempotent no-op.
    pub fn remove(&mut self, id: CellId, strict: bool) -> Result<Option<f64>, MeshError> {
        // shift_remove keeps the remaining iteration order stable
        match self.cells.shift_remove(&id) {
            Some(v) => Ok(Some(v)),
            None if strict => Err(MeshError::NotFound { id }),
            None => Ok(None),
        }
    }

    /// Number of present cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over `(id, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, f64)> + '_ {
        self.cells.iter().map(|(&id, &v)| (id, v))
    }

    /// Iterate over present ids in storage order.
    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }
}
