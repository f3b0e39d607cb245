//! The refinement engine: bounded check/refine/evaluate/unrefine sweeps.

use indexmap::IndexSet;
use tesseral_core::{CellId, Level};
use tesseral_mesh::AdaptiveMesh;

use crate::error::AdaptError;
use crate::field::FieldFn;
use crate::policy::{CheckContext, RefinementPolicy};
use crate::sampler::fill_cells;

/// Aggregate counts from one [`Adapter::adapt`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sweeps executed, including the terminating no-op sweep.
    pub sweeps: usize,
    /// Parent cells split into octets.
    pub refined: usize,
    /// Child cells created by refinement.
    pub created: usize,
    /// Child cells removed by unrefinement.
    pub removed: usize,
    /// Refine candidates skipped because their children would exceed the
    /// level cap.
    pub skipped_at_limit: usize,
}

/// Runs refine/unrefine sweeps over one mesh.
///
/// One sweep is CHECK, REFINE, EVALUATE_NEW, UNREFINE. The scratch sets
/// below are reset at the start of each sweep and left holding that
/// sweep's outcome, so callers can inspect exactly what the last sweep
/// did. Not reentrant: one adapter drives one mesh at a time, and the
/// scratch state must not be shared across concurrent invocations.
///
/// There is no oscillation guard. A policy that refines a region one
/// sweep and collapses it the next will bounce until the sweep bound
/// stops it, and the mesh is returned in its last-computed state. The
/// bound is the only safety net; the predicates are external and the
/// engine does not second-guess them.
#[derive(Clone, Debug, Default)]
pub struct Adapter {
    level_cap: Option<Level>,
    /// Leaf cells the policy marked for refinement in the last CHECK.
    pub cells_to_refine: IndexSet<CellId>,
    /// Children created by the last REFINE.
    pub cells_created: IndexSet<CellId>,
    /// Children removed by the last UNREFINE.
    pub cells_removed: IndexSet<CellId>,
}

impl Adapter {
    /// Adapter refining up to the codec's maximum level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter refining no deeper than `cap`, even if the codec could
    /// address finer levels.
    pub fn with_level_cap(cap: Level) -> Self {
        Self {
            level_cap: Some(cap),
            ..Self::default()
        }
    }

    /// The deepest level this adapter will create cells at.
    pub fn level_cap(&self, mesh: &AdaptiveMesh) -> Level {
        let max = mesh.codec().max_refinement_level();
        match self.level_cap {
            Some(cap) => cap.min(max),
            None => max,
        }
    }

    /// CHECK: scan leaf cells below the level cap and collect the ones
    /// the policy wants refined into [`cells_to_refine`](Self::cells_to_refine).
    ///
    /// Returns the number of candidates.
    ///
    /// # Errors
    ///
    /// [`AdaptError::Codec`] if storage holds a non-addressable id.
    pub fn check(
        &mut self,
        mesh: &AdaptiveMesh,
        policy: &dyn RefinementPolicy,
    ) -> Result<usize, AdaptError> {
        self.cells_to_refine.clear();
        let cap = self.level_cap(mesh);
        for id in mesh.all_cells(true) {
            let level = mesh.codec().level_of(id)?;
            if level >= cap {
                continue;
            }
            let Some(value) = mesh.get(id) else {
                continue;
            };
            let ctx = CheckContext { mesh, id, level };
            if policy.needs_refine(value, &ctx) {
                self.cells_to_refine.insert(id);
            }
        }
        Ok(self.cells_to_refine.len())
    }

    /// Split one cell into its eight children.
    ///
    /// The children are inserted as `NaN` placeholders and recorded in
    /// [`cells_created`](Self::cells_created); evaluation happens in
    /// [`evaluate_new`](Self::evaluate_new). Placeholder insertion is
    /// all-or-nothing per parent, so sibling completeness holds at every
    /// step.
    ///
    /// # Errors
    ///
    /// [`AdaptError::RefinementLimitExceeded`] when the children would
    /// sit past the level cap; the mesh is untouched in that case.
    pub fn refine_cell(&mut self, mesh: &mut AdaptiveMesh, id: CellId) -> Result<(), AdaptError> {
        let level = mesh.codec().level_of(id)?;
        let child_level = Level(level.0 + 1);
        if child_level > self.level_cap(mesh) {
            return Err(AdaptError::RefinementLimitExceeded {
                id,
                level: child_level,
            });
        }
        let children = mesh.codec().children(id)?;
        for child in children {
            mesh.set(child, f64::NAN)?;
            self.cells_created.insert(child);
        }
        Ok(())
    }

    /// REFINE: split every cell in [`cells_to_refine`](Self::cells_to_refine).
    ///
    /// Cells that would exceed the level cap are skipped; the skip count
    /// is returned so the sweep can report it. Other failures abort.
    ///
    /// # Errors
    ///
    /// [`AdaptError::Codec`] for non-addressable ids.
    pub fn refine(&mut self, mesh: &mut AdaptiveMesh) -> Result<usize, AdaptError> {
        let ids: Vec<CellId> = self.cells_to_refine.iter().copied().collect();
        let mut skipped = 0;
        for id in ids {
            match self.refine_cell(mesh, id) {
                Ok(()) => {}
                Err(AdaptError::RefinementLimitExceeded { .. }) => skipped += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(skipped)
    }

    /// EVALUATE_NEW: sample the field at the centers of
    /// [`cells_created`](Self::cells_created), replacing the placeholders.
    ///
    /// # Errors
    ///
    /// Field failures abort mid-way and leave the remaining placeholders
    /// in place; see [`crate::fill_cells`].
    pub fn evaluate_new(
        &mut self,
        mesh: &mut AdaptiveMesh,
        field: &dyn FieldFn,
    ) -> Result<usize, AdaptError> {
        fill_cells(mesh, self.cells_created.iter().copied(), field)
    }

    /// UNREFINE: collapse complete leaf octets the policy releases.
    ///
    /// Walks parents fine to coarse so a collapse at a deep level can
    /// expose its parent's octet to a collapse in the same pass. Removed
    /// children land in [`cells_removed`](Self::cells_removed); the
    /// parent's own value is never touched. Returns the removal count.
    ///
    /// # Errors
    ///
    /// [`AdaptError::UnrefineInconsistency`] on a partially present
    /// octet. Refinement only ever inserts whole octets, so a partial
    /// one means the mesh was corrupted outside the engine; the sweep
    /// aborts rather than guessing.
    pub fn unrefine(
        &mut self,
        mesh: &mut AdaptiveMesh,
        policy: &dyn RefinementPolicy,
    ) -> Result<usize, AdaptError> {
        let deepest = mesh.levels_in_use() as u32;
        if deepest < 2 {
            return Ok(0);
        }
        let mut removed = 0;
        for parent_level in (0..deepest - 1).rev() {
            for parent in mesh.cells(Level(parent_level), false) {
                let present = mesh.present_children(parent)?;
                if present.is_empty() {
                    continue;
                }
                if present.len() != 8 {
                    return Err(AdaptError::UnrefineInconsistency {
                        parent,
                        present: present.len(),
                    });
                }
                let mut all_leaves = true;
                let mut values = [0.0f64; 8];
                for (slot, &child) in present.iter().enumerate() {
                    if !mesh.is_leaf(child)? {
                        all_leaves = false;
                        break;
                    }
                    values[slot] = mesh.get(child).unwrap_or(f64::NAN);
                }
                if !all_leaves || !policy.can_collapse(&values) {
                    continue;
                }
                for &child in &present {
                    mesh.remove(child, true)?;
                    self.cells_removed.insert(child);
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Run one full sweep, resetting the scratch sets first.
    ///
    /// An empty CHECK makes the sweep a no-op: refine, evaluate, and
    /// unrefine are all skipped and the mesh is untouched. Returns the
    /// number of candidates skipped at the level cap.
    ///
    /// # Errors
    ///
    /// Propagates phase errors; see the individual phase methods.
    pub fn sweep(
        &mut self,
        mesh: &mut AdaptiveMesh,
        field: &dyn FieldFn,
        policy: &dyn RefinementPolicy,
    ) -> Result<usize, AdaptError> {
        self.cells_created.clear();
        self.cells_removed.clear();
        if self.check(mesh, policy)? == 0 {
            return Ok(0);
        }
        let skipped = self.refine(mesh)?;
        self.evaluate_new(mesh, field)?;
        self.unrefine(mesh, policy)?;
        Ok(skipped)
    }

    /// Sweep until CHECK finds nothing or `max_sweeps` is reached.
    ///
    /// With `max_sweeps == 0` the mesh is untouched and the report is
    /// empty.
    ///
    /// # Errors
    ///
    /// The first phase error aborts the run; the mesh keeps whatever the
    /// completed phases produced.
    pub fn adapt(
        &mut self,
        mesh: &mut AdaptiveMesh,
        field: &dyn FieldFn,
        policy: &dyn RefinementPolicy,
        max_sweeps: usize,
    ) -> Result<SweepReport, AdaptError> {
        let mut report = SweepReport::default();
        for _ in 0..max_sweeps {
            let skipped = self.sweep(mesh, field, policy)?;
            report.sweeps += 1;
            report.refined += self.cells_created.len() / 8;
            report.created += self.cells_created.len();
            report.removed += self.cells_removed.len();
            report.skipped_at_limit += skipped;
            if self.cells_to_refine.is_empty() {
                break;
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MagnitudePolicy;
    use crate::sampler::fill_level;
    use tesseral_core::BaseResolution;
    use tesseral_mesh::BoundingBox;

    /// Refuses to refine and always releases octets.
    struct NeverRefine;

    impl RefinementPolicy for NeverRefine {
        fn needs_refine(&self, _: f64, _: &CheckContext<'_>) -> bool {
            false
        }

        fn can_collapse(&self, _: &[f64; 8]) -> bool {
            true
        }
    }

    /// Refines exactly one cell, once.
    struct RefineOnly(CellId);

    impl RefinementPolicy for RefineOnly {
        fn needs_refine(&self, _: f64, ctx: &CheckContext<'_>) -> bool {
            ctx.id == self.0
        }

        fn can_collapse(&self, _: &[f64; 8]) -> bool {
            false
        }
    }

    fn filled_mesh() -> AdaptiveMesh {
        let bounds = BoundingBox::new([-1.0; 3], [1.0; 3]).unwrap();
        let mut mesh = AdaptiveMesh::new(bounds, BaseResolution::new(2, 2, 2)).unwrap();
        fill_level(&mut mesh, Level(0), &|_: [f64; 3]| 1.0).unwrap();
        mesh
    }

    #[test]
    fn passive_policy_leaves_mesh_unchanged() {
        let mut mesh = filled_mesh();
        let mut adapter = Adapter::new();
        let report = adapter
            .adapt(&mut mesh, &|_: [f64; 3]| 1.0, &NeverRefine, 5)
            .unwrap();

        assert_eq!(report.sweeps, 1, "empty CHECK must end the loop");
        assert_eq!(report.created, 0);
        assert_eq!(report.removed, 0);
        assert!(adapter.cells_to_refine.is_empty());
        assert_eq!(mesh.cell_count(), 8);
        assert_eq!(mesh.all_cells(true).len(), 8);
    }

    #[test]
    fn refine_creates_a_complete_octet() {
        let mut mesh = filled_mesh();
        let mut adapter = Adapter::new();
        let report = adapter
            .adapt(&mut mesh, &|_: [f64; 3]| 0.25, &RefineOnly(CellId(3)), 3)
            .unwrap();

        assert_eq!(report.refined, 1);
        assert_eq!(report.created, 8);
        assert_eq!(mesh.cell_count(), 16);
        assert_eq!(mesh.level_len(Level(1)), 8);

        let children = mesh.codec().children(CellId(3)).unwrap();
        for child in children {
            assert!(child.0 > 8, "child ids must sit past the level 0 block");
            assert_eq!(mesh.get(child), Some(0.25), "placeholder not evaluated");
        }
        assert!(!mesh.is_leaf(CellId(3)).unwrap());
        assert_eq!(mesh.get(CellId(3)), Some(1.0), "parent value disturbed");
    }

    #[test]
    fn refine_then_collapse_restores_the_mesh() {
        let mut mesh = filled_mesh();
        let mut adapter = Adapter::new();
        adapter
            .adapt(&mut mesh, &|_: [f64; 3]| 0.25, &RefineOnly(CellId(3)), 1)
            .unwrap();
        assert_eq!(mesh.cell_count(), 16);

        // A fresh run with a collapse-everything policy undoes the split.
        let report = adapter
            .adapt(&mut mesh, &|_: [f64; 3]| 0.25, &NeverRefine, 1)
            .unwrap();
        assert_eq!(report.removed, 0, "no-op sweep must skip unrefine");

        // Collapse needs a sweep that actually runs; drive the phases
        // directly as a caller with scratch access would.
        adapter.cells_removed.clear();
        let removed = adapter.unrefine(&mut mesh, &NeverRefine).unwrap();
        assert_eq!(removed, 8);
        assert_eq!(mesh.cell_count(), 8);
        assert_eq!(mesh.get(CellId(3)), Some(1.0), "parent value disturbed");
        assert!(mesh.is_leaf(CellId(3)).unwrap());
    }

    #[test]
    fn oscillating_policy_is_stopped_by_the_sweep_bound() {
        // Refines everything below 0.5 and collapses everything below
        // 0.5: each sweep splits the quiet cells and immediately merges
        // them again, forever.
        let policy = MagnitudePolicy {
            refine_above: 0.0,
            collapse_below: 0.5,
        };
        let mut mesh = filled_mesh();
        let mut adapter = Adapter::new();
        let report = adapter
            .adapt(&mut mesh, &|_: [f64; 3]| 0.1, &policy, 4)
            .unwrap();

        assert_eq!(report.sweeps, 4, "bound must cut the oscillation");
        assert_eq!(report.created, report.removed);
        assert_eq!(mesh.cell_count(), 8, "each sweep must net to zero");
    }

    #[test]
    fn level_cap_skips_and_reports() {
        let mut mesh = filled_mesh();
        // Cap at level 0: nothing may ever be refined.
        let mut adapter = Adapter::with_level_cap(Level(0));
        let report = adapter
            .adapt(
                &mut mesh,
                &|_: [f64; 3]| 1.0,
                &MagnitudePolicy {
                    refine_above: 0.5,
                    collapse_below: 0.0,
                },
                3,
            )
            .unwrap();
        // CHECK already filters capped cells, so nothing is even queued.
        assert_eq!(report.created, 0);
        assert_eq!(mesh.cell_count(), 8);

        // Forcing the phase directly reports the limit per cell.
        adapter.cells_to_refine.insert(CellId(1));
        let err = adapter.refine_cell(&mut mesh, CellId(1)).unwrap_err();
        assert!(matches!(
            err,
            AdaptError::RefinementLimitExceeded {
                id: CellId(1),
                level: Level(1),
            }
        ));
        let skipped = adapter.refine(&mut mesh).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(mesh.cell_count(), 8, "skipped refine must not mutate");
    }

    #[test]
    fn partial_octet_is_fatal() {
        let mut mesh = filled_mesh();
        let children = mesh.codec().children(CellId(2)).unwrap();
        for &child in &children[..3] {
            mesh.set(child, 0.0).unwrap();
        }

        let mut adapter = Adapter::new();
        let err = adapter.unrefine(&mut mesh, &NeverRefine).unwrap_err();
        assert_eq!(
            err,
            AdaptError::UnrefineInconsistency {
                parent: CellId(2),
                present: 3,
            }
        );
    }

    #[test]
    fn deep_refinement_collapses_bottom_up() {
        let mut mesh = filled_mesh();
        let mut adapter = Adapter::new();

        // Split cell 1, then split its first child.
        adapter.refine_cell(&mut mesh, CellId(1)).unwrap();
        adapter
            .evaluate_new(&mut mesh, &|_: [f64; 3]| 0.1)
            .unwrap();
        let grandparent_child = mesh.codec().children(CellId(1)).unwrap()[0];
        adapter.refine_cell(&mut mesh, grandparent_child).unwrap();
        adapter
            .evaluate_new(&mut mesh, &|_: [f64; 3]| 0.1)
            .unwrap();
        assert_eq!(mesh.cell_count(), 24);

        // One fine-to-coarse pass collapses both generations.
        let removed = adapter.unrefine(&mut mesh, &NeverRefine).unwrap();
        assert_eq!(removed, 16);
        assert_eq!(mesh.cell_count(), 8);
        assert!(mesh.is_leaf(CellId(1)).unwrap());
    }

    #[test]
    fn zero_sweeps_is_a_no_op() {
        let mut mesh = filled_mesh();
        let mut adapter = Adapter::new();
        let report = adapter
            .adapt(
                &mut mesh,
                &|_: [f64; 3]| 1.0,
                &MagnitudePolicy {
                    refine_above: 0.5,
                    collapse_below: 0.0,
                },
                0,
            )
            .unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(mesh.cell_count(), 8);
    }
}
