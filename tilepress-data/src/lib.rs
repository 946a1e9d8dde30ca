//! Input decoding and output persistence for tilepress.
//!
//! Responsibilities:
//! - Frame, inflate and decode OSM PBF extracts ([`pbf`]).
//! - Write tile pyramids and their metadata into MBTiles files ([`mbtiles`]).
//! - Drive a full conversion from one to the other ([`convert`]).
//!
//! Boundaries:
//! - Tile math, feature resolution and vector tile encoding live in
//!   `tilepress-core`; this crate only feeds and drains that pipeline.
//! - Paths are UTF-8 ([`camino`]) and file helpers come from `tilepress-fs`.
//!
//! Invariants:
//! - Every error type exposes an [`ErrorKind`]; any error aborts the run.
//! - No global mutable state.
#![forbid(unsafe_code)]

mod convert;
mod format;
mod kind;
pub mod mbtiles;
pub mod pbf;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use convert::{ConvertError, ConvertOptions, ConvertReport, convert, default_output_path};
pub use format::SourceFormat;
pub use kind::ErrorKind;
