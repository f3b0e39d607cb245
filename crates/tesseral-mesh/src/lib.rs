//! Sparse hierarchical mesh storage for Tesseral.
//!
//! This crate defines the [`AdaptiveMesh`] — a bounding box, a base
//! resolution, and one sparse value store per refinement level in use —
//! together with the [`Geometry`] that maps cell indices to physical
//! centers and the [`clip`] pass that drops negligible cells.
//!
//! Absence of a cell id in storage means "not sampled / not part of the
//! active set", never an implicit zero.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bounds;
pub mod clip;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod store;

pub use bounds::BoundingBox;
pub use clip::{clip, ClipPolicy, ClipReport, ClipThreshold};
pub use error::MeshError;
pub use geometry::Geometry;
pub use mesh::AdaptiveMesh;
pub use store::LevelStore;
