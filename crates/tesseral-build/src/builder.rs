//! Mesh construction: single builds and the worker pool.
//!
//! One mesh is built per [`BuildRequest`] (a spatial location and a
//! species index). Each build owns its mesh exclusively, so
//! [`build_all`] fans requests out over a thread pool with no shared
//! mutable state: a task channel feeds workers, a reply channel carries
//! finished meshes back, and results are reassembled in request order.

use std::error::Error;
use std::fmt;

use tesseral_adapt::{fill_level, AdaptError, Adapter, FieldFn, RefinementPolicy, SweepReport};
use tesseral_core::{CodecError, FieldError, Level};
use tesseral_mesh::{clip, AdaptiveMesh, BoundingBox, ClipReport, MeshError};

use crate::config::{ConfigError, MeshConfig, PoolConfig};

// ── PhaseSpaceField ────────────────────────────────────────────────

/// The external field interface: a scalar over (spatial location,
/// velocity location, species).
///
/// The builder closes over the spatial location and species of each
/// request, leaving a velocity-space [`FieldFn`] for the mesh core.
///
/// # Contract
///
/// Pure and total over the mesh bounds, like [`FieldFn`]; failures
/// abort the build of the requesting mesh only.
pub trait PhaseSpaceField {
    /// Evaluate the field at one phase-space point.
    fn eval(&self, spatial: [f64; 3], velocity: [f64; 3], species: usize)
        -> Result<f64, FieldError>;
}

impl<F> PhaseSpaceField for F
where
    F: Fn([f64; 3], [f64; 3], usize) -> f64,
{
    fn eval(
        &self,
        spatial: [f64; 3],
        velocity: [f64; 3],
        species: usize,
    ) -> Result<f64, FieldError> {
        Ok(self(spatial, velocity, species))
    }
}

/// A [`PhaseSpaceField`] pinned to one request's spatial location and
/// species.
struct PointField<'a, F: ?Sized> {
    field: &'a F,
    spatial: [f64; 3],
    species: usize,
}

impl<F: PhaseSpaceField + ?Sized> FieldFn for PointField<'_, F> {
    fn eval(&self, velocity: [f64; 3]) -> Result<f64, FieldError> {
        self.field.eval(self.spatial, velocity, self.species)
    }
}

// ── Requests and outcomes ──────────────────────────────────────────

/// One mesh to build: a spatial location and a species index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildRequest {
    /// Spatial location the velocity mesh belongs to.
    pub spatial: [f64; 3],
    /// Species index passed through to the field.
    pub species: usize,
}

/// A finished mesh with the reports its build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The request this mesh answers.
    pub request: BuildRequest,
    /// The populated mesh.
    pub mesh: AdaptiveMesh,
    /// Adaptation report, when adaptivity was enabled.
    pub sweep: Option<SweepReport>,
    /// Clip report, when a clip pass was configured.
    pub clip: Option<ClipReport>,
}

// ── BuildError ─────────────────────────────────────────────────────

/// Errors from mesh construction.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// Mesh construction or storage failed.
    Mesh(MeshError),
    /// A fill or adaptation sweep failed.
    Adapt(AdaptError),
    /// A builder thread exited without reporting a result.
    WorkerLost,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Mesh(e) => write!(f, "mesh: {e}"),
            Self::Adapt(e) => write!(f, "adapt: {e}"),
            Self::WorkerLost => write!(f, "builder worker exited without a result"),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Mesh(e) => Some(e),
            Self::Adapt(e) => Some(e),
            Self::WorkerLost => None,
        }
    }
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<MeshError> for BuildError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<AdaptError> for BuildError {
    fn from(e: AdaptError) -> Self {
        Self::Adapt(e)
    }
}

impl From<CodecError> for BuildError {
    fn from(e: CodecError) -> Self {
        Self::Mesh(MeshError::Codec(e))
    }
}

// ── Building ───────────────────────────────────────────────────────

/// Build one mesh: level-0 fill, optional adaptation, optional clip.
///
/// # Errors
///
/// Validation failures as [`BuildError::Config`]; fill and sweep
/// failures as [`BuildError::Adapt`].
pub fn build_mesh<F>(
    config: &MeshConfig,
    request: BuildRequest,
    field: &F,
    policy: &dyn RefinementPolicy,
) -> Result<BuildOutcome, BuildError>
where
    F: PhaseSpaceField + ?Sized,
{
    config.validate()?;
    let bounds = BoundingBox::new(config.bounds_min, config.bounds_max)?;
    let mut mesh = AdaptiveMesh::new(bounds, config.base)?;
    let point_field = PointField {
        field,
        spatial: request.spatial,
        species: request.species,
    };

    fill_level(&mut mesh, Level(0), &point_field)?;

    let sweep = if config.adaptivity {
        let mut adapter = match config.level_cap {
            Some(cap) => Adapter::with_level_cap(cap),
            None => Adapter::new(),
        };
        Some(adapter.adapt(&mut mesh, &point_field, policy, config.max_sweeps)?)
    } else {
        None
    };

    let clip_report = match &config.clip {
        Some(c) => Some(clip(&mut mesh, c.threshold, c.policy)?),
        None => None,
    };

    Ok(BuildOutcome {
        request,
        mesh,
        sweep,
        clip: clip_report,
    })
}

/// Build many meshes on a worker pool, one task per request.
///
/// Each worker pulls requests off a shared channel and runs
/// [`build_mesh`]; meshes are exclusively owned per task, so the pool
/// needs no locking. Results come back in request order. The first
/// build failure is returned; remaining in-flight builds finish and are
/// discarded.
///
/// # Errors
///
/// Validation failures before any thread is spawned; otherwise the
/// first per-build error.
pub fn build_all<F>(
    config: &MeshConfig,
    requests: Vec<BuildRequest>,
    field: &F,
    policy: &(dyn RefinementPolicy + Sync),
    pool: &PoolConfig,
) -> Result<Vec<BuildOutcome>, BuildError>
where
    F: PhaseSpaceField + Sync + ?Sized,
{
    config.validate()?;
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let total = requests.len();
    let worker_count = pool.resolved_worker_count().min(total);

    let (task_tx, task_rx) = crossbeam_channel::unbounded::<(usize, BuildRequest)>();
    for task in requests.into_iter().enumerate() {
        let _ = task_tx.send(task);
    }
    drop(task_tx);

    let (reply_tx, reply_rx) =
        crossbeam_channel::unbounded::<(usize, Result<BuildOutcome, BuildError>)>();

    std::thread::scope(|s| {
        for _ in 0..worker_count {
            let task_rx = task_rx.clone();
            let reply_tx = reply_tx.clone();
            s.spawn(move || {
                while let Ok((slot, request)) = task_rx.recv() {
                    let _ = reply_tx.send((slot, build_mesh(config, request, field, policy)));
                }
            });
        }
    });
    drop(reply_tx);

    let mut slots: Vec<Option<BuildOutcome>> = (0..total).map(|_| None).collect();
    while let Ok((slot, result)) = reply_rx.recv() {
        slots[slot] = Some(result?);
    }

    let mut outcomes = Vec::with_capacity(total);
    for slot in slots {
        outcomes.push(slot.ok_or(BuildError::WorkerLost)?);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClipConfig;
    use tesseral_core::BaseResolution;
    use tesseral_test_utils::{FailingField, NeverRefine};

    fn base_config() -> MeshConfig {
        MeshConfig {
            base: BaseResolution::new(2, 2, 2),
            adaptivity: false,
            ..MeshConfig::default()
        }
    }

    fn flat(_: [f64; 3], _: [f64; 3], _: usize) -> f64 {
        1.0
    }

    #[test]
    fn plain_build_fills_level_zero() {
        let request = BuildRequest {
            spatial: [0.0; 3],
            species: 0,
        };
        let outcome = build_mesh(&base_config(), request, &flat, &NeverRefine).unwrap();
        assert_eq!(outcome.mesh.cell_count(), 8);
        assert_eq!(outcome.mesh.all_cells(true).len(), 8);
        assert!(outcome.sweep.is_none());
        assert!(outcome.clip.is_none());
        for id in outcome.mesh.all_cells(false) {
            assert_eq!(outcome.mesh.get(id), Some(1.0));
        }
    }

    #[test]
    fn adaptivity_produces_a_sweep_report() {
        let config = MeshConfig {
            adaptivity: true,
            max_sweeps: 2,
            ..base_config()
        };
        let request = BuildRequest {
            spatial: [0.0; 3],
            species: 0,
        };
        let outcome = build_mesh(&config, request, &flat, &NeverRefine).unwrap();
        let report = outcome.sweep.expect("adaptivity must report");
        assert_eq!(report.sweeps, 1);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn clip_pass_runs_after_fill() {
        let config = MeshConfig {
            clip: Some(ClipConfig::absolute(0.5)),
            ..base_config()
        };
        // Value depends on the velocity octant: half the cells are quiet.
        let field =
            |_: [f64; 3], v: [f64; 3], _: usize| if v[0] < 0.0 { 0.1 } else { 1.0 };
        let request = BuildRequest {
            spatial: [0.0; 3],
            species: 0,
        };
        let outcome = build_mesh(&config, request, &field, &NeverRefine).unwrap();
        let report = outcome.clip.expect("clip must report");
        assert_eq!(report.removed, 4);
        assert_eq!(outcome.mesh.cell_count(), 4);
    }

    #[test]
    fn field_failure_aborts_the_build() {
        struct Failing(FailingField);
        impl PhaseSpaceField for Failing {
            fn eval(
                &self,
                _: [f64; 3],
                velocity: [f64; 3],
                _: usize,
            ) -> Result<f64, FieldError> {
                FieldFn::eval(&self.0, velocity)
            }
        }

        let field = Failing(FailingField::new(3));
        let request = BuildRequest {
            spatial: [0.0; 3],
            species: 0,
        };
        let err = build_mesh(&base_config(), request, &field, &NeverRefine).unwrap_err();
        assert!(matches!(err, BuildError::Adapt(AdaptError::Field(_))));
    }

    #[test]
    fn invalid_config_fails_before_building() {
        let config = MeshConfig {
            bounds_min: [1.0; 3],
            bounds_max: [-1.0; 3],
            ..base_config()
        };
        let request = BuildRequest {
            spatial: [0.0; 3],
            species: 0,
        };
        let err = build_mesh(&config, request, &flat, &NeverRefine).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn pool_preserves_request_order() {
        // Species index drives the stored value, so each outcome is
        // attributable to its request.
        let field = |_: [f64; 3], _: [f64; 3], species: usize| species as f64 + 1.0;
        let requests: Vec<BuildRequest> = (0..12)
            .map(|s| BuildRequest {
                spatial: [s as f64, 0.0, 0.0],
                species: s,
            })
            .collect();
        let pool = PoolConfig {
            worker_count: Some(4),
        };
        let outcomes =
            build_all(&base_config(), requests.clone(), &field, &NeverRefine, &pool).unwrap();

        assert_eq!(outcomes.len(), 12);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.request, requests[i]);
            let first = outcome.mesh.all_cells(false)[0];
            assert_eq!(outcome.mesh.get(first), Some(i as f64 + 1.0));
        }
    }

    #[test]
    fn pool_with_empty_requests_is_a_no_op() {
        let outcomes = build_all(
            &base_config(),
            Vec::new(),
            &flat,
            &NeverRefine,
            &PoolConfig::default(),
        )
        .unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn pool_reports_the_first_failing_build() {
        // Species 5 hits a poisoned region of the field.
        struct Poisoned;
        impl PhaseSpaceField for Poisoned {
            fn eval(&self, _: [f64; 3], _: [f64; 3], species: usize) -> Result<f64, FieldError> {
                if species == 5 {
                    return Err(FieldError::EvaluationFailed {
                        reason: "species 5 table missing".into(),
                    });
                }
                Ok(1.0)
            }
        }

        let requests: Vec<BuildRequest> = (0..8)
            .map(|s| BuildRequest {
                spatial: [0.0; 3],
                species: s,
            })
            .collect();
        let err = build_all(
            &base_config(),
            requests,
            &Poisoned,
            &NeverRefine,
            &PoolConfig {
                worker_count: Some(2),
            },
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Adapt(AdaptError::Field(_))));
    }
}
