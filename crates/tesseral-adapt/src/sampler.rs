//! Populating mesh cells from a field function.

use tesseral_core::{CellId, Level};
use tesseral_mesh::AdaptiveMesh;

use crate::error::AdaptError;
use crate::field::FieldFn;

/// Fill one complete level of the mesh.
///
/// Evaluates the field at the center of every cell in the level's full
/// index range — exactly `nx * ny * nz` evaluations, each exactly once —
/// and stores the results. Existing values at that level are
/// overwritten; no other level is touched. Returns the evaluation count.
///
/// # Errors
///
/// [`AdaptError::Codec`] for a level past the maximum;
/// [`AdaptError::Field`] aborts the fill mid-way, leaving already
/// written cells in place.
pub fn fill_level(
    mesh: &mut AdaptiveMesh,
    level: Level,
    field: &dyn FieldFn,
) -> Result<usize, AdaptError> {
    let [nx, ny, nz] = mesh.geometry().resolution(level)?;
    let mut evaluations = 0;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let index = [i, j, k];
                let center = mesh.geometry().center(index, level)?;
                let value = field.eval(center)?;
                let id = mesh.codec().encode(index, level)?;
                mesh.set(id, value)?;
                evaluations += 1;
            }
        }
    }
    Ok(evaluations)
}

/// Fill an explicit set of cells with the same evaluation rule.
///
/// Used to populate newly created children after a refine step. Returns
/// the evaluation count.
///
/// # Errors
///
/// [`AdaptError::Codec`] for a non-addressable id;
/// [`AdaptError::Field`] aborts mid-way as in [`fill_level`].
pub fn fill_cells<I>(
    mesh: &mut AdaptiveMesh,
    ids: I,
    field: &dyn FieldFn,
) -> Result<usize, AdaptError>
where
    I: IntoIterator<Item = CellId>,
{
    let mut evaluations = 0;
    for id in ids {
        let center = mesh.geometry().center_of(id)?;
        let value = field.eval(center)?;
        mesh.set(id, value)?;
        evaluations += 1;
    }
    Ok(evaluations)
}
