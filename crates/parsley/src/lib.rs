//! # parsley
//!
//! The evaluator facade: the host-language AST boundary (spec §4.1), the
//! recursive [`evaluator::Evaluator`], the DSL statement lowering that backs
//! `@query`/`@insert`/`@update`/`@delete`/`@transaction` (spec §4.6), the
//! four I/O operators (spec §4.4), template-tag rendering (spec §4.2, §4.3),
//! and the builtin method tables every value kind exposes (spec §4.8).
//!
//! Lexing and parsing are out of scope (spec §1): this crate's AST is the
//! shape a parser would build, and its tests construct that shape by hand.
//! `parsley-core` carries the value model and the `AstNode`/`Evaluate`
//! traits that let a `Function` or a lazy `Dict` slot hold one of this
//! crate's expressions without a dependency cycle back into it.

pub mod ast;
pub mod dsl;
pub mod evaluator;
pub mod io_ops;
pub mod methods;
pub mod stdlib_loader;
pub mod template_eval;

pub use ast::{not_callable_error, BinOp, DictEntry, Expr, TagNode, UnOp};
pub use dsl::DslStatement;
pub use evaluator::Evaluator;
pub use io_ops::IoOp;
