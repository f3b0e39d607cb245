//! Core types for Tesseral adaptive meshes.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifier types ([`CellId`], [`Level`], [`MultiIndex`]), the base
//! resolution descriptor, the dense index/level [`Codec`], and the error
//! taxonomy shared across the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod id;

pub use codec::{BaseResolution, Codec};
pub use error::{CodecError, FieldError};
pub use id::{CellId, Level, MultiIndex};
