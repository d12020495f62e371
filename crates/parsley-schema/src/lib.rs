//! # parsley-schema
//!
//! The Schema/Record/Table validation engine (spec §4.5): type coercion,
//! format checks, constraint checks, metadata lookup, and typed-table
//! projection. Operates on the value shapes declared in `parsley-core`;
//! `parsley-core` itself only carries the data and the bookkeeping
//! operations (`update`, `withError`) that don't need a format-predicate
//! table.

pub mod construct;
pub mod format;
pub mod metadata;
pub mod validate;

pub use construct::{apply_array, apply_dict};
pub use format::FormatKind;
pub use validate::{partition_rows, validate_record, validate_table, FieldValue};
