//! # parsley-io
//!
//! The I/O operator suite (spec §4.4): remote-write (`=/=>`, `=/=>>`), fetch
//! (`<=/=`), and SQL exec/query (`<=!=>`, `<=?=>`, `<=??=>`). All four block
//! the calling script until a response or an error value is produced;
//! suspension never crosses the evaluator's own boundary.

mod json;
mod remote;
mod sql;

pub use remote::{fetch, remote_append, remote_write};
pub use sql::{sql_exec, sql_query_many, sql_query_one};
