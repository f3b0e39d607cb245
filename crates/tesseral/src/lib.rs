//! Tesseral: adaptive hierarchical octree meshes for sampled scalar fields.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tesseral sub-crates. For most users, adding `tesseral` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tesseral::prelude::*;
//!
//! // A sharp peak at the origin of velocity space.
//! let field = |p: [f64; 3]| (-5.0 * (p[0] * p[0] + p[1] * p[1] + p[2] * p[2])).exp();
//!
//! // Refine where the field is significant, collapse the quiet tails.
//! let policy = MagnitudePolicy {
//!     refine_above: 0.1,
//!     collapse_below: 0.01,
//! };
//!
//! let bounds = BoundingBox::new([-1.0; 3], [1.0; 3]).unwrap();
//! let mut mesh = AdaptiveMesh::new(bounds, BaseResolution::new(4, 4, 4)).unwrap();
//! fill_level(&mut mesh, Level(0), &field).unwrap();
//!
//! let mut adapter = Adapter::new();
//! let report = adapter.adapt(&mut mesh, &field, &policy, 3).unwrap();
//! assert!(report.created > 0, "the peak must attract refinement");
//! assert!(mesh.levels_in_use() > 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tesseral-core` | Ids, the index/level codec, error taxonomy |
//! | [`mesh`] | `tesseral-mesh` | Bounding box, geometry, sparse storage, clipping |
//! | [`adapt`] | `tesseral-adapt` | Field sampling and the refine/unrefine engine |
//! | [`build`] | `tesseral-build` | Configuration surface and the parallel builder |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids, the index/level codec, and the core error taxonomy
/// (`tesseral-core`).
///
/// [`types::Codec`] is the arithmetic heart of the crate: a bijection
/// between `(multi-index, level)` pairs and dense [`types::CellId`]s,
/// with the parent/child hierarchy derived from it.
pub use tesseral_core as types;

/// Mesh geometry, sparse per-level storage, and clipping
/// (`tesseral-mesh`).
///
/// [`mesh::AdaptiveMesh`] owns the bounding box and one sparse store per
/// refinement level in use; [`mesh::clip`] drops negligible cells.
pub use tesseral_mesh as mesh;

/// Field sampling and the refinement engine (`tesseral-adapt`).
///
/// The [`adapt::FieldFn`] and [`adapt::RefinementPolicy`] traits are the
/// main extension points; [`adapt::Adapter`] runs the bounded
/// refine/unrefine sweeps.
pub use tesseral_adapt as adapt;

/// Configuration surface and parallel mesh construction
/// (`tesseral-build`).
///
/// [`build::build_all`] fans one mesh build per (spatial cell, species)
/// request over a worker pool.
pub use tesseral_build as build;

/// Common imports for typical Tesseral usage.
///
/// ```rust
/// use tesseral::prelude::*;
/// ```
///
/// This imports the most frequently used types: ids and the codec, the
/// mesh and its geometry, the sampler entry points, the adapter with its
/// reference policies, and the builder configuration.
pub mod prelude {
    // Ids and the codec
    pub use tesseral_core::{BaseResolution, CellId, Codec, Level, MultiIndex};

    // Errors
    pub use tesseral_core::{CodecError, FieldError};

    // Mesh
    pub use tesseral_mesh::{
        clip, AdaptiveMesh, BoundingBox, ClipPolicy, ClipReport, ClipThreshold, Geometry,
        MeshError,
    };

    // Sampling and adaptation
    pub use tesseral_adapt::{
        fill_cells, fill_level, AdaptError, Adapter, CheckContext, DeviationPolicy, FieldFn,
        MagnitudePolicy, RefinementPolicy, SweepReport,
    };

    // Builder
    pub use tesseral_build::{
        build_all, build_mesh, BuildError, BuildOutcome, BuildRequest, ClipConfig, ConfigError,
        MeshConfig, PhaseSpaceField, PoolConfig,
    };
}
