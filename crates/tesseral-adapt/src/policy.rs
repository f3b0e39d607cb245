//! Pluggable refine/coarsen predicates.
//!
//! The adapter never hardcodes threshold math: what "has structure" means
//! is a property of the field being sampled, so the predicates are
//! injected. Two reference policies ship with the crate; production
//! callers are expected to bring their own.

use tesseral_core::{CellId, Level};
use tesseral_mesh::AdaptiveMesh;

/// Read-only context handed to [`RefinementPolicy::needs_refine`].
///
/// Exposes the mesh so predicates can consult neighbors, siblings, or
/// ancestors of the cell under consideration.
pub struct CheckContext<'a> {
    /// The mesh being adapted.
    pub mesh: &'a AdaptiveMesh,
    /// The leaf cell under consideration.
    pub id: CellId,
    /// Its refinement level.
    pub level: Level,
}

/// Decides where the mesh refines and where it collapses.
///
/// # Contract
///
/// Both methods MUST be pure functions of their arguments and the mesh
/// state; the adapter may call them in any order over the candidate
/// cells. Nothing prevents a policy from refining a region one sweep and
/// collapsing it the next — the sweep bound is the only safety net
/// against oscillation, by design.
pub trait RefinementPolicy {
    /// Whether a leaf cell should be split into its eight children.
    ///
    /// Only called for cells that can still be refined (level below the
    /// maximum).
    fn needs_refine(&self, value: f64, ctx: &CheckContext<'_>) -> bool;

    /// Whether a complete leaf octet should collapse into its parent.
    ///
    /// `child_values` holds the eight children's values in child order.
    fn can_collapse(&self, child_values: &[f64; 8]) -> bool;
}

/// Magnitude-threshold reference policy.
///
/// Refines wherever `|value| >= refine_above` and collapses octets whose
/// children are all below `collapse_below` in magnitude — the "resolve
/// the peak, drop the tails" behavior typical for sharply peaked
/// distributions.
#[derive(Clone, Copy, Debug)]
pub struct MagnitudePolicy {
    /// Leaf cells at or above this magnitude are refined.
    pub refine_above: f64,
    /// Octets entirely below this magnitude are collapsed.
    pub collapse_below: f64,
}

impl RefinementPolicy for MagnitudePolicy {
    fn needs_refine(&self, value: f64, _ctx: &CheckContext<'_>) -> bool {
        value.abs() >= self.refine_above
    }

    fn can_collapse(&self, child_values: &[f64; 8]) -> bool {
        child_values.iter().all(|v| v.abs() < self.collapse_below)
    }
}

/// Local-contrast reference policy.
///
/// Refines a cell when its value differs from some same-level face
/// neighbor by more than `min_contrast` (absent neighbors resolve
/// through their nearest present ancestor), and collapses octets whose
/// value spread is within `flatness` of uniform, relative to the octet
/// peak.
#[derive(Clone, Copy, Debug)]
pub struct DeviationPolicy {
    /// Minimum face-neighbor contrast that triggers refinement.
    pub min_contrast: f64,
    /// Relative spread below which an octet counts as uniform.
    pub flatness: f64,
}

impl RefinementPolicy for DeviationPolicy {
    fn needs_refine(&self, value: f64, ctx: &CheckContext<'_>) -> bool {
        let codec = ctx.mesh.codec();
        let Ok((index, level)) = codec.decode(ctx.id) else {
            return false;
        };
        let Ok(res) = codec.resolution(level) else {
            return false;
        };

        let mut contrast: f64 = 0.0;
        for axis in 0..3 {
            for dir in [-1i64, 1] {
                let component = index[axis] as i64 + dir;
                if component < 0 || component as u64 >= res[axis] {
                    continue;
                }
                let mut neighbor = index;
                neighbor[axis] = component as u64;
                let Ok(id) = codec.encode(neighbor, level) else {
                    continue;
                };
                if let Ok(Some((v, _))) = ctx.mesh.resolve(id) {
                    contrast = contrast.max((value - v).abs());
                }
            }
        }
        contrast > self.min_contrast
    }

    fn can_collapse(&self, child_values: &[f64; 8]) -> bool {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        let mut peak: f64 = 0.0;
        for &v in child_values {
            lo = lo.min(v);
            hi = hi.max(v);
            peak = peak.max(v.abs());
        }
        if peak == 0.0 {
            return true;
        }
        (hi - lo) / peak <= self.flatness
    }
}
