//! Configuration and parallel construction of Tesseral meshes.
//!
//! [`MeshConfig`] is the validated configuration surface for one mesh
//! family; [`build_mesh`] turns a single [`BuildRequest`] into a
//! populated [`BuildOutcome`]; [`build_all`] fans many requests out over
//! a worker pool, one exclusively owned mesh per task.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod config;

pub use builder::{build_all, build_mesh, BuildError, BuildOutcome, BuildRequest, PhaseSpaceField};
pub use config::{ClipConfig, ConfigError, MeshConfig, PoolConfig};
