//! Post-processing pass that drops cells below a magnitude threshold.

use indexmap::IndexSet;
use tesseral_core::{CellId, CodecError, Level};

use crate::mesh::AdaptiveMesh;

/// How the clip threshold is interpreted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipThreshold {
    /// Remove cells with `|value| < t`.
    Absolute(f64),
    /// Remove cells with `|value| / max_abs < f`, where `max_abs` is the
    /// mesh-wide absolute maximum at clip time. On an empty or all-zero
    /// mesh this resolves to an absolute threshold of zero, which removes
    /// nothing.
    RelativeToPeak(f64),
}

/// What happens to the subtree of a removed cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipPolicy {
    /// Removing a cell removes its entire subtree, so no child is ever
    /// orphaned. The default.
    Cascade,
    /// A below-threshold cell with surviving children is kept: hierarchy
    /// consistency is preserved by refusing the removal instead of
    /// cascading it.
    KeepParents,
}

/// Outcome of a [`clip`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipReport {
    /// Cells removed because their own magnitude was below threshold.
    pub removed: usize,
    /// Cells removed only because an ancestor was removed
    /// (always zero under [`ClipPolicy::KeepParents`]).
    pub cascaded: usize,
    /// Below-threshold cells retained to protect surviving children
    /// (always zero under [`ClipPolicy::Cascade`]).
    pub retained: usize,
}

/// Remove every present cell whose magnitude falls below the threshold.
///
/// A pure filter: surviving cells keep their values, and the cell count
/// never increases. Orphan handling is controlled by `policy`.
///
/// # Errors
///
/// [`CodecError`] only if storage holds a non-addressable id, which
/// indicates memory corruption rather than user error.
pub fn clip(
    mesh: &mut AdaptiveMesh,
    threshold: ClipThreshold,
    policy: ClipPolicy,
) -> Result<ClipReport, CodecError> {
    let cut = match threshold {
        ClipThreshold::Absolute(t) => t,
        ClipThreshold::RelativeToPeak(f) => f * mesh.max_abs_value(),
    };

    let mut report = ClipReport::default();
    match policy {
        ClipPolicy::Cascade => clip_cascade(mesh, cut, &mut report)?,
        ClipPolicy::KeepParents => clip_keep_parents(mesh, cut, &mut report)?,
    }
    Ok(report)
}

/// Coarse-to-fine sweep: a cell goes if it is below threshold or its
/// parent went.
fn clip_cascade(
    mesh: &mut AdaptiveMesh,
    cut: f64,
    report: &mut ClipReport,
) -> Result<(), CodecError> {
    let mut doomed: IndexSet<CellId> = IndexSet::new();
    for level in 0..mesh.levels_in_use() as u32 {
        for id in mesh.cells(Level(level), false) {
            let below = mesh.get(id).is_some_and(|v| v.abs() < cut);
            let orphaned = match mesh.codec().parent(id)? {
                Some(parent) => doomed.contains(&parent),
                None => false,
            };
            if below || orphaned {
                doomed.insert(id);
                if below {
                    report.removed += 1;
                } else {
                    report.cascaded += 1;
                }
            }
        }
    }
    for id in doomed {
        mesh.remove(id, false).map_err(|_| CodecError::InvalidId { id })?;
    }
    Ok(())
}

/// Fine-to-coarse sweep: a below-threshold cell is removed only once it
/// has no surviving children.
fn clip_keep_parents(
    mesh: &mut AdaptiveMesh,
    cut: f64,
    report: &mut ClipReport,
) -> Result<(), CodecError> {
    for level in (0..mesh.levels_in_use() as u32).rev() {
        for id in mesh.cells(Level(level), false) {
            let below = mesh.get(id).is_some_and(|v| v.abs() < cut);
            if !below {
                continue;
            }
            if mesh.present_children(id)?.is_empty() {
                mesh.remove(id, false).map_err(|_| CodecError::InvalidId { id })?;
                report.removed += 1;
            } else {
                report.retained += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;
    use tesseral_core::BaseResolution;

    fn filled_mesh() -> AdaptiveMesh {
        let bounds = BoundingBox::new([-1.0; 3], [1.0; 3]).unwrap();
        let mut mesh = AdaptiveMesh::new(bounds, BaseResolution::new(2, 2, 2)).unwrap();
        for id in 1..=8u64 {
            mesh.set(CellId(id), id as f64).unwrap();
        }
        mesh
    }

    #[test]
    fn absolute_clip_removes_exactly_below_threshold() {
        let mut mesh = filled_mesh();
        let report = clip(&mut mesh, ClipThreshold::Absolute(3.5), ClipPolicy::Cascade).unwrap();
        assert_eq!(report.removed, 3); // values 1, 2, 3
        assert_eq!(report.cascaded, 0);
        assert_eq!(mesh.cell_count(), 5);
        for id in 4..=8u64 {
            assert_eq!(mesh.get(CellId(id)), Some(id as f64), "survivor changed");
        }
    }

    #[test]
    fn clip_boundary_is_strict_less_than() {
        let mut mesh = filled_mesh();
        clip(&mut mesh, ClipThreshold::Absolute(4.0), ClipPolicy::Cascade).unwrap();
        // |4.0| < 4.0 is false, so cell 4 survives.
        assert!(mesh.exists(CellId(4)));
        assert!(!mesh.exists(CellId(3)));
    }

    #[test]
    fn clip_uses_magnitude() {
        let mut mesh = filled_mesh();
        mesh.set(CellId(1), -10.0).unwrap();
        clip(&mut mesh, ClipThreshold::Absolute(5.0), ClipPolicy::Cascade).unwrap();
        assert!(mesh.exists(CellId(1)));
    }

    #[test]
    fn relative_clip_resolves_against_peak() {
        let mut mesh = filled_mesh(); // peak 8
        let report = clip(
            &mut mesh,
            ClipThreshold::RelativeToPeak(0.5),
            ClipPolicy::Cascade,
        )
        .unwrap();
        // cut = 4.0: removes 1, 2, 3
        assert_eq!(report.removed, 3);
        assert!(mesh.exists(CellId(4)));
    }

    #[test]
    fn relative_clip_on_empty_mesh_is_noop() {
        let bounds = BoundingBox::new([-1.0; 3], [1.0; 3]).unwrap();
        let mut mesh = AdaptiveMesh::new(bounds, BaseResolution::new(2, 2, 2)).unwrap();
        let report = clip(
            &mut mesh,
            ClipThreshold::RelativeToPeak(0.1),
            ClipPolicy::Cascade,
        )
        .unwrap();
        assert_eq!(report, ClipReport::default());
    }

    #[test]
    fn cascade_removes_children_of_clipped_parent() {
        let mut mesh = filled_mesh();
        // Refine cell 1 with children well above the threshold.
        let children = mesh.codec().children(CellId(1)).unwrap();
        for child in children {
            mesh.set(child, 100.0).unwrap();
        }
        mesh.set(CellId(1), 0.5).unwrap();

        let report = clip(&mut mesh, ClipThreshold::Absolute(1.5), ClipPolicy::Cascade).unwrap();
        // Parent below threshold, its whole subtree goes with it.
        assert_eq!(report.removed, 1);
        assert_eq!(report.cascaded, 8);
        assert!(!mesh.exists(CellId(1)));
        for child in children {
            assert!(!mesh.exists(child), "orphan survived cascade");
        }
    }

    #[test]
    fn keep_parents_retains_parent_with_surviving_children() {
        let mut mesh = filled_mesh();
        let children = mesh.codec().children(CellId(1)).unwrap();
        for child in children {
            mesh.set(child, 100.0).unwrap();
        }
        mesh.set(CellId(1), 0.5).unwrap();

        let report = clip(
            &mut mesh,
            ClipThreshold::Absolute(1.5),
            ClipPolicy::KeepParents,
        )
        .unwrap();
        assert!(mesh.exists(CellId(1)), "parent with children was removed");
        assert_eq!(report.retained, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(report.cascaded, 0);
        for child in children {
            assert!(mesh.exists(child));
        }
    }

    #[test]
    fn keep_parents_removes_childless_below_threshold() {
        let mut mesh = filled_mesh();
        // A whole below-threshold octet under cell 8: children removed
        // first (fine-to-coarse), then the parent follows.
        let children = mesh.codec().children(CellId(8)).unwrap();
        for child in children {
            mesh.set(child, 0.1).unwrap();
        }
        mesh.set(CellId(8), 0.2).unwrap();

        clip(
            &mut mesh,
            ClipThreshold::Absolute(0.5),
            ClipPolicy::KeepParents,
        )
        .unwrap();
        assert!(!mesh.exists(CellId(8)));
        for child in children {
            assert!(!mesh.exists(child));
        }
    }

    #[test]
    fn clip_count_is_non_increasing() {
        let mut mesh = filled_mesh();
        let before = mesh.cell_count();
        clip(&mut mesh, ClipThreshold::Absolute(100.0), ClipPolicy::Cascade).unwrap();
        assert!(mesh.cell_count() <= before);
        assert_eq!(mesh.cell_count(), 0);
    }
}
