//! Test fixtures and mock fields for Tesseral development.
//!
//! Provides standard field functions ([`GaussianField`], [`BumpField`],
//! [`FailingField`], [`CountingField`]), trivial refinement policies
//! ([`AlwaysRefine`], [`NeverRefine`]), and mesh construction helpers
//! shared across crate tests and benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    AlwaysRefine, BumpField, CountingField, FailingField, GaussianField, NeverRefine,
};

use tesseral_core::BaseResolution;
use tesseral_mesh::{AdaptiveMesh, BoundingBox};

/// An empty mesh over `[-1, 1]^3` with an `n`-cubed base resolution.
pub fn unit_mesh(n: u64) -> AdaptiveMesh {
    let bounds = BoundingBox::new([-1.0; 3], [1.0; 3]).expect("unit bounds are valid");
    AdaptiveMesh::new(bounds, BaseResolution::new(n, n, n)).expect("unit mesh base is valid")
}
