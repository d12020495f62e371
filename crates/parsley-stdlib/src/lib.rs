//! # parsley-stdlib
//!
//! `@std/api` (spec §4.7): the surface a program reaches via
//! `import @std/api` — auth-gating wrappers (`public`, `auth`, `adminOnly`,
//! `roles`) and HTTP error builders (`notFound`, `forbidden`, `badRequest`,
//! `unauthorized`, `conflict`, `serverError`).
//!
//! Building the exports dict itself, and wrapping a handler `Function` so
//! that calling it runs the gate first, is the evaluator's job (it alone
//! holds an [`Evaluate`](parsley_core::value::function::Evaluate) capable of
//! calling a user-defined function). This crate only supplies the gate
//! checks and the error values they produce.

pub mod api;

pub use api::{
    bad_request, check_admin_only, check_auth, check_public, check_roles, conflict, forbidden,
    http_status, not_found, server_error, unauthorized,
};
