//! The field evaluation strategy.

use tesseral_core::FieldError;

/// A scalar field evaluated at arbitrary points inside the mesh bounds.
///
/// # Contract
///
/// - MUST be pure: deterministic for a given point, no observable side
///   effects. The sampler does not detect violations; a violation is a
///   caller error.
/// - SHOULD be total over the bounding box. A returned [`FieldError`]
///   aborts the current fill or sweep and propagates unmodified.
///
/// Any `Fn([f64; 3]) -> f64` closure is a `FieldFn` via the blanket
/// impl; fallible evaluators implement the trait directly.
pub trait FieldFn {
    /// Evaluate the field at a point.
    fn eval(&self, point: [f64; 3]) -> Result<f64, FieldError>;
}

impl<F> FieldFn for F
where
    F: Fn([f64; 3]) -> f64,
{
    fn eval(&self, point: [f64; 3]) -> Result<f64, FieldError> {
        Ok(self(point))
    }
}
