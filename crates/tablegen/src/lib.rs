//! Boundary collaborators for the SM83 lowering core: the flat-file row
//! codec and the Rust-module packaging of lowered routines.

/// Rust module packaging of a lowered routine set.
pub mod package;
/// Flat-file (CSV) codec for opcode table rows.
pub mod rows;

pub use package::{render_listing, render_module};
pub use rows::{parse_rows, render_rows, RowParseError, BYTE_LENGTH_OVERRIDES};

#[cfg(test)]
use tempfile as _;
