//! Reusable field and policy fixtures.
//!
//! Standard ingredients for adaptation tests:
//!
//! - [`GaussianField`] — a single smooth peak, the canonical "sharp
//!   structure on quiet tails" shape.
//! - [`BumpField`] — a seeded sum of random Gaussian bumps for
//!   deterministic randomized scenarios.
//! - [`FailingField`] — fails deterministically after N evaluations.
//! - [`CountingField`] — wraps another field and counts evaluations.
//! - [`AlwaysRefine`] / [`NeverRefine`] — degenerate policies for
//!   exercising the sweep loop itself.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tesseral_adapt::{CheckContext, FieldFn, RefinementPolicy};
use tesseral_core::FieldError;

/// An isotropic Gaussian peak.
///
/// `amplitude * exp(-|p - center|^2 / (2 * width^2))`.
#[derive(Clone, Copy, Debug)]
pub struct GaussianField {
    pub center: [f64; 3],
    pub width: f64,
    pub amplitude: f64,
}

impl GaussianField {
    /// Unit-amplitude peak at the origin with the given width.
    pub fn centered(width: f64) -> Self {
        Self {
            center: [0.0; 3],
            width,
            amplitude: 1.0,
        }
    }
}

impl FieldFn for GaussianField {
    fn eval(&self, p: [f64; 3]) -> Result<f64, FieldError> {
        let r2: f64 = (0..3).map(|a| (p[a] - self.center[a]).powi(2)).sum();
        Ok(self.amplitude * (-r2 / (2.0 * self.width * self.width)).exp())
    }
}

/// A deterministic sum of random Gaussian bumps inside `[-1, 1]^3`.
///
/// Bump centers and amplitudes are drawn once at construction from a
/// ChaCha8 RNG seeded by the caller, so the field itself is pure and
/// identical for identical seeds.
#[derive(Clone, Debug)]
pub struct BumpField {
    bumps: Vec<GaussianField>,
}

impl BumpField {
    pub fn new(seed: u64, count: usize, width: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bumps = (0..count)
            .map(|_| GaussianField {
                center: [
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                ],
                width,
                amplitude: rng.random_range(0.5..2.0),
            })
            .collect();
        Self { bumps }
    }
}

impl FieldFn for BumpField {
    fn eval(&self, p: [f64; 3]) -> Result<f64, FieldError> {
        let mut sum = 0.0;
        for bump in &self.bumps {
            sum += bump.eval(p)?;
        }
        Ok(sum)
    }
}

/// Fails deterministically after a configurable number of evaluations.
///
/// Useful for testing that field failures abort fills and sweeps at the
/// right point. Uses `AtomicUsize` for the counter so it satisfies
/// `Send`.
pub struct FailingField {
    pub succeed_count: usize,
    calls: AtomicUsize,
}

impl FailingField {
    /// A field that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `eval` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl FieldFn for FailingField {
    fn eval(&self, _: [f64; 3]) -> Result<f64, FieldError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(FieldError::EvaluationFailed {
                reason: format!(
                    "deliberate failure after {} successful evaluations",
                    self.succeed_count
                ),
            });
        }
        Ok(1.0)
    }
}

/// Wraps another field and counts evaluations.
pub struct CountingField<F> {
    pub inner: F,
    calls: AtomicUsize,
}

impl<F: FieldFn> CountingField<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `eval` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl<F: FieldFn> FieldFn for CountingField<F> {
    fn eval(&self, p: [f64; 3]) -> Result<f64, FieldError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.eval(p)
    }
}

/// Refines every candidate and never collapses.
pub struct AlwaysRefine;

impl RefinementPolicy for AlwaysRefine {
    fn needs_refine(&self, _: f64, _: &CheckContext<'_>) -> bool {
        true
    }

    fn can_collapse(&self, _: &[f64; 8]) -> bool {
        false
    }
}

/// Never refines and releases every octet.
pub struct NeverRefine;

impl RefinementPolicy for NeverRefine {
    fn needs_refine(&self, _: f64, _: &CheckContext<'_>) -> bool {
        false
    }

    fn can_collapse(&self, _: &[f64; 8]) -> bool {
        true
    }
}
