//! # parsley-template
//!
//! The template writer (spec §4.2) and form binding (spec §4.3): tag-casing
//! dispatch, attribute escaping, the `<SQL>` and `<basil.cache.Cache>`
//! special tags, and the `@record`/`@field` reserved-attribute system that
//! backs `<input @field>`, `<Label>`, `<Error>`, `<Meta>`, and `<Select>`.
//!
//! This crate renders HTML from already-evaluated values (`Record`,
//! `Value`, tag attribute lists); walking a template's own AST and calling
//! into these functions per tag is the evaluator's job.

pub mod asset_tags;
pub mod attrs;
pub mod cache;
pub mod components;
pub mod escape;
pub mod formbind;
pub mod sql_tag;
pub mod tag;

pub use attrs::{AttrValue, TagAttrs};
pub use components::{render_error, render_label, render_meta, render_select};
pub use escape::html_escape;
pub use formbind::{auto_hidden_fields_html, form_close_hidden_id, render_field_input, FormStack};
pub use sql_tag::build_sql_tag;
pub use tag::{is_component_tag, is_passthrough_attr, is_void_element, render_close_tag, render_open_tag};
