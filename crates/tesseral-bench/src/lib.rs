//! Benchmark profiles for the Tesseral adaptive mesh.
//!
//! Provides pre-built [`MeshConfig`] profiles shared by the benchmarks:
//!
//! - [`reference_config`]: 8x8x8 base with adaptation and a relative clip,
//!   the typical velocity-mesh shape.
//! - [`flat_config`]: 16x16x16 base with adaptivity disabled, for
//!   measuring the raw fill path.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tesseral_build::{ClipConfig, MeshConfig};
use tesseral_core::BaseResolution;

/// Reference adaptive profile: 8x8x8 base over `[-4, 4]^3`, three sweeps,
/// relative clip at 1e-3 of the peak.
pub fn reference_config() -> MeshConfig {
    MeshConfig {
        base: BaseResolution::new(8, 8, 8),
        bounds_min: [-4.0; 3],
        bounds_max: [4.0; 3],
        adaptivity: true,
        max_sweeps: 3,
        level_cap: None,
        clip: Some(ClipConfig::relative(1e-3)),
    }
}

/// Uniform-fill profile: 16x16x16 base, no adaptation, no clip.
pub fn flat_config() -> MeshConfig {
    MeshConfig {
        base: BaseResolution::new(16, 16, 16),
        bounds_min: [-4.0; 3],
        bounds_max: [4.0; 3],
        adaptivity: false,
        max_sweeps: 0,
        level_cap: None,
        clip: None,
    }
}
