//! Mesh construction configuration and validation.
//!
//! [`MeshConfig`] is the builder-input for constructing one adaptive
//! mesh. [`validate()`](MeshConfig::validate) checks structural
//! invariants up front so the per-request build path never revalidates.

use std::error::Error;
use std::fmt;

use tesseral_core::{BaseResolution, Codec, CodecError, Level};
use tesseral_mesh::{ClipPolicy, ClipThreshold};

// ── MeshConfig ─────────────────────────────────────────────────────

/// Complete configuration for constructing adaptive meshes.
///
/// One config typically drives many meshes (one per spatial cell and
/// species); it is passed by reference and never mutated by the builder.
#[derive(Clone, Debug)]
pub struct MeshConfig {
    /// Per-axis cell counts at level 0.
    pub base: BaseResolution,
    /// Lower bounding box corner.
    pub bounds_min: [f64; 3],
    /// Upper bounding box corner.
    pub bounds_max: [f64; 3],
    /// Whether adaptation sweeps run after the level-0 fill.
    pub adaptivity: bool,
    /// Sweep bound when adaptivity is enabled. Default: 4.
    pub max_sweeps: usize,
    /// Optional refinement cap below the codec's structural maximum.
    /// `None` refines as deep as the id space allows.
    pub level_cap: Option<Level>,
    /// Optional clip pass applied after adaptation.
    pub clip: Option<ClipConfig>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            base: BaseResolution::new(4, 4, 4),
            bounds_min: [-1.0; 3],
            bounds_max: [1.0; 3],
            adaptivity: true,
            max_sweeps: 4,
            level_cap: None,
            clip: None,
        }
    }
}

/// Clip settings for [`MeshConfig`].
#[derive(Clone, Copy, Debug)]
pub struct ClipConfig {
    /// The removal threshold.
    pub threshold: ClipThreshold,
    /// How orphaned subtrees are handled.
    pub policy: ClipPolicy,
}

impl ClipConfig {
    /// Cascade-clip everything below an absolute magnitude.
    pub fn absolute(threshold: f64) -> Self {
        Self {
            threshold: ClipThreshold::Absolute(threshold),
            policy: ClipPolicy::Cascade,
        }
    }

    /// Cascade-clip everything below a fraction of the mesh peak.
    pub fn relative(fraction: f64) -> Self {
        Self {
            threshold: ClipThreshold::RelativeToPeak(fraction),
            policy: ClipPolicy::Cascade,
        }
    }
}

impl MeshConfig {
    /// Validate all structural invariants.
    ///
    /// # Errors
    ///
    /// The first violated invariant, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Bounds must be finite and ordered per axis.
        for axis in 0..3 {
            let (min, max) = (self.bounds_min[axis], self.bounds_max[axis]);
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::InvalidBounds { axis, min, max });
            }
        }
        // 2. The base resolution must build a codec (non-zero axes, level
        //    0 addressable).
        let codec = Codec::new(self.base)?;
        // 3. A level cap, if set, must be within the codec's capacity.
        if let Some(cap) = self.level_cap {
            let max = codec.max_refinement_level();
            if cap > max {
                return Err(ConfigError::LevelCapTooDeep { cap, max });
            }
        }
        // 4. Enabled adaptivity with a zero sweep budget can never run.
        if self.adaptivity && self.max_sweeps == 0 {
            return Err(ConfigError::ZeroSweepBudget);
        }
        // 5. Clip thresholds must be finite and non-negative; a relative
        //    fraction above 1 would clip the peak itself.
        if let Some(clip) = &self.clip {
            let valid = match clip.threshold {
                ClipThreshold::Absolute(t) => t.is_finite() && t >= 0.0,
                ClipThreshold::RelativeToPeak(f) => f.is_finite() && (0.0..=1.0).contains(&f),
            };
            if !valid {
                return Err(ConfigError::InvalidClipThreshold {
                    threshold: clip.threshold,
                });
            }
        }
        Ok(())
    }
}

// ── PoolConfig ─────────────────────────────────────────────────────

/// Worker pool sizing for [`build_all`](crate::build_all).
#[derive(Clone, Copy, Debug, Default)]
pub struct PoolConfig {
    /// Number of builder threads. `None` = auto-detect
    /// (`available_parallelism / 2`, clamped to `[2, 16]`).
    pub worker_count: Option<usize>,
}

impl PoolConfig {
    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                (cpus / 2).clamp(2, 16)
            }
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`MeshConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A bounding box axis is non-finite or inverted.
    InvalidBounds {
        /// Index of the offending axis (0 = x, 1 = y, 2 = z).
        axis: usize,
        /// Lower corner component.
        min: f64,
        /// Upper corner component.
        max: f64,
    },
    /// The base resolution cannot build a codec.
    Codec(CodecError),
    /// The configured level cap exceeds the codec's capacity.
    LevelCapTooDeep {
        /// The configured cap.
        cap: Level,
        /// The codec's maximum refinement level.
        max: Level,
    },
    /// Adaptivity is enabled but `max_sweeps` is zero.
    ZeroSweepBudget,
    /// A clip threshold is non-finite, negative, or a relative fraction
    /// above 1.
    InvalidClipThreshold {
        /// The offending threshold.
        threshold: ClipThreshold,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBounds { axis, min, max } => {
                write!(f, "invalid bounds on axis {axis}: [{min}, {max}]")
            }
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::LevelCapTooDeep { cap, max } => {
                write!(f, "level cap {cap} exceeds codec maximum {max}")
            }
            Self::ZeroSweepBudget => {
                write!(f, "adaptivity is enabled but max_sweeps is 0")
            }
            Self::InvalidClipThreshold { threshold } => {
                write!(f, "invalid clip threshold: {threshold:?}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for ConfigError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_succeeds() {
        assert_eq!(MeshConfig::default().validate(), Ok(()));
    }

    #[test]
    fn validate_inverted_bounds_fails() {
        let config = MeshConfig {
            bounds_min: [-1.0, 1.0, -1.0],
            bounds_max: [1.0, -1.0, 1.0],
            ..MeshConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBounds {
                axis: 1,
                min: 1.0,
                max: -1.0,
            })
        );
    }

    #[test]
    fn validate_nan_bounds_fails() {
        let config = MeshConfig {
            bounds_max: [1.0, 1.0, f64::NAN],
            ..MeshConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBounds { axis: 2, .. })
        ));
    }

    #[test]
    fn validate_zero_resolution_fails() {
        let config = MeshConfig {
            base: BaseResolution::new(4, 0, 4),
            ..MeshConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Codec(CodecError::ZeroResolution { axis: 1 }))
        ));
    }

    #[test]
    fn validate_deep_level_cap_fails() {
        let config = MeshConfig {
            level_cap: Some(Level(60)),
            ..MeshConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LevelCapTooDeep { cap: Level(60), .. })
        ));
    }

    #[test]
    fn validate_zero_sweeps_with_adaptivity_fails() {
        let config = MeshConfig {
            max_sweeps: 0,
            ..MeshConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSweepBudget));

        // Without adaptivity the budget is unused and may be zero.
        let config = MeshConfig {
            adaptivity: false,
            max_sweeps: 0,
            ..MeshConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_bad_clip_threshold_fails() {
        for clip in [
            ClipConfig::absolute(-1.0),
            ClipConfig::absolute(f64::NAN),
            ClipConfig::relative(1.5),
        ] {
            let config = MeshConfig {
                clip: Some(clip),
                ..MeshConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidClipThreshold { .. })
            ));
        }
        let config = MeshConfig {
            clip: Some(ClipConfig::relative(0.01)),
            ..MeshConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn worker_count_resolution_clamps() {
        let explicit = PoolConfig {
            worker_count: Some(200),
        };
        assert_eq!(explicit.resolved_worker_count(), 64);
        let zero = PoolConfig {
            worker_count: Some(0),
        };
        assert_eq!(zero.resolved_worker_count(), 1);

        let auto = PoolConfig::default().resolved_worker_count();
        assert!((2..=16).contains(&auto));
    }
}
