//! Field sampling and error-driven mesh adaptation.
//!
//! Two pieces live here. The [`sampler`] populates mesh cells by
//! evaluating a caller-supplied [`FieldFn`] at cell centers — a pure
//! point-sample at the center, not an average over the cell volume. The
//! [`Adapter`] runs bounded refine/unrefine sweeps over a populated mesh,
//! driven by a pluggable [`RefinementPolicy`], re-sampling newly created
//! cells through the same field function.
//!
//! Both predicates and the field function are injected strategies; the
//! engine hardcodes no threshold math.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod field;
pub mod policy;
pub mod sampler;

pub use adapter::{Adapter, SweepReport};
pub use error::AdaptError;
pub use field::FieldFn;
pub use policy::{CheckContext, DeviationPolicy, MagnitudePolicy, RefinementPolicy};
pub use sampler::{fill_cells, fill_level};
