//! Schema, Record, and Table value shapes (spec §3, §4.5).
//!
//! This module carries the data shapes and the operations that are pure
//! bookkeeping (`update`, `withError`, title-casing, default application).
//! The multi-step validation *algorithm* (spec §4.5) lives in `parsley-schema`,
//! which is free to walk these public fields without `parsley-core` needing
//! to know about format predicates or regex constraints.

use std::rc::Rc;

use crate::value::dict::Dict;
use crate::value::function::Evaluate;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    String,
    Integer,
    Float,
    Boolean,
    Email,
    Url,
    Phone,
    Slug,
    Uuid,
    Ulid,
    Date,
    Time,
    DateTime,
    Money,
    Array,
    /// References another declared schema by name (spec §9: "Implement as
    /// name-based references resolved at query-compile time").
    Schema(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(String),
    Enum(Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub base_type: BaseType,
    pub constraints: Vec<Constraint>,
    /// Default value. Schema declaration evaluates the default expression
    /// once against the schema's defining environment at declaration time
    /// (spec §3: "default expression"); what's carried here is the result.
    pub default: Option<Value>,
    pub metadata: Dict,
    pub auto: bool,
    pub optional: bool,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, base_type: BaseType) -> Self {
        Self {
            name: name.into(),
            base_type,
            constraints: Vec::new(),
            default: None,
            metadata: Dict::new(),
            auto: false,
            optional: false,
        }
    }

    /// `record.title(field)` fallback: snake_case / camelCase / kebab-case
    /// all split on word boundaries, each word initial-capitalised.
    #[must_use]
    pub fn title_fallback(&self) -> String {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut prev_lower = false;
        for ch in self.name.chars() {
            if ch == '_' || ch == '-' {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                prev_lower = false;
                continue;
            }
            if ch.is_uppercase() && prev_lower {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(ch);
            prev_lower = ch.is_lowercase();
        }
        if !current.is_empty() {
            words.push(current);
        }
        words
            .into_iter()
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Schema: name, ordered list of field descriptors. Declaration order is the
/// authoritative column order (spec §3 invariant).
#[derive(Debug)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self { name: name.into(), fields }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields excluding auto fields (spec §4.3: "Auto-flagged schema fields
    /// never appear in `schema.visibleFields()`").
    #[must_use]
    pub fn visible_fields(&self) -> Vec<&FieldDescriptor> {
        self.fields.iter().filter(|f| !f.auto).collect()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Unvalidated,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub code: String,
    pub message: String,
}

struct RecordInner {
    schema: Rc<Schema>,
    data: Dict,
    state: ValidationState,
    errors: Vec<(String, FieldError)>,
}

/// Reference to schema + data dict + validation state + per-field error map
/// (spec §3). Immutable by contract: every mutating-looking operation
/// returns a new `Record`.
#[derive(Clone)]
pub struct Record(Rc<RecordInner>);

impl Record {
    #[must_use]
    pub fn new(schema: Rc<Schema>, data: Dict) -> Self {
        Self(Rc::new(RecordInner {
            schema,
            data,
            state: ValidationState::Unvalidated,
            errors: Vec::new(),
        }))
    }

    #[must_use]
    pub fn schema(&self) -> &Rc<Schema> {
        &self.0.schema
    }

    #[must_use]
    pub fn data(&self) -> &Dict {
        &self.0.data
    }

    #[must_use]
    pub fn state(&self) -> ValidationState {
        self.0.state
    }

    #[must_use]
    pub fn errors(&self) -> &[(String, FieldError)] {
        &self.0.errors
    }

    #[must_use]
    pub fn error(&self, field: &str) -> Option<&FieldError> {
        self.0.errors.iter().find(|(f, _)| f == field).map(|(_, e)| e)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.state == ValidationState::Valid
    }

    /// Produced by the validation algorithm in `parsley-schema`: a new
    /// record sharing the same schema/data but with a settled state and
    /// error map.
    #[must_use]
    pub fn with_validation(&self, state: ValidationState, errors: Vec<(String, FieldError)>) -> Self {
        Self(Rc::new(RecordInner {
            schema: Rc::clone(&self.0.schema),
            data: self.0.data.clone(),
            state,
            errors,
        }))
    }

    /// `record.withError(field, [code,] message)`: returns a new record
    /// with an added error (code defaults to `CUSTOM`).
    #[must_use]
    pub fn with_error(&self, field: impl Into<String>, code: Option<&str>, message: impl Into<String>) -> Self {
        let mut errors = self.0.errors.clone();
        errors.push((
            field.into(),
            FieldError {
                code: code.unwrap_or("CUSTOM").to_string(),
                message: message.into(),
            },
        ));
        Self(Rc::new(RecordInner {
            schema: Rc::clone(&self.0.schema),
            data: self.0.data.clone(),
            state: self.0.state,
            errors,
        }))
    }

    /// `record.update(dict)`: merges fields and resets validation state
    /// (spec §3 invariant: "`.update()` resets state to unvalidated").
    #[must_use]
    pub fn update(&self, patch: &Dict, evaluator: &dyn Evaluate) -> Result<Self, crate::errorvalue::ErrorValue> {
        let merged = Dict::new();
        for (k, v) in self.0.data.entries(evaluator)? {
            merged.insert(k, v);
        }
        for (k, v) in patch.entries(evaluator)? {
            merged.insert(k, v);
        }
        Ok(Self(Rc::new(RecordInner {
            schema: Rc::clone(&self.0.schema),
            data: merged,
            state: ValidationState::Unvalidated,
            errors: Vec::new(),
        })))
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("schema", &self.0.schema.name)
            .field("state", &self.0.state)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || (self.0.schema == other.0.schema && self.0.data.shallow_eq(&other.0.data))
    }
}

struct TableInner {
    schema: Option<Rc<Schema>>,
    rows: Vec<Dict>,
    states: Vec<ValidationState>,
    errors: Vec<Vec<(String, FieldError)>>,
}

/// Reference to schema (optional) + ordered rows + per-row validation state
/// (spec §3).
#[derive(Clone)]
pub struct Table(Rc<TableInner>);

impl Table {
    #[must_use]
    pub fn new(schema: Option<Rc<Schema>>, rows: Vec<Dict>) -> Self {
        let len = rows.len();
        Self(Rc::new(TableInner {
            schema,
            rows,
            states: vec![ValidationState::Unvalidated; len],
            errors: vec![Vec::new(); len],
        }))
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Rc<Schema>> {
        self.0.schema.as_ref()
    }

    #[must_use]
    pub fn rows(&self) -> &[Dict] {
        &self.0.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.rows.is_empty()
    }

    /// `table[i]` yields a `Record` bound to the schema, not a bare dict
    /// (spec §4.5).
    #[must_use]
    pub fn row_record(&self, index: usize) -> Option<Record> {
        let schema = self.0.schema.clone()?;
        let dict = self.0.rows.get(index)?.clone();
        let record = Record::new(schema, dict);
        Some(record.with_validation(
            self.0.states.get(index).copied().unwrap_or(ValidationState::Unvalidated),
            self.0.errors.get(index).cloned().unwrap_or_default(),
        ))
    }

    #[must_use]
    pub fn with_validation(&self, states: Vec<ValidationState>, errors: Vec<Vec<(String, FieldError)>>) -> Self {
        Self(Rc::new(TableInner {
            schema: self.0.schema.clone(),
            rows: self.0.rows.clone(),
            states,
            errors,
        }))
    }

    #[must_use]
    pub fn states(&self) -> &[ValidationState] {
        &self.0.states
    }

    #[must_use]
    pub fn row_errors(&self) -> &[Vec<(String, FieldError)>] {
        &self.0.errors
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.0.schema.as_ref().map(|s| &s.name))
            .field("rows", &self.0.rows.len())
            .finish()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_fallback_splits_snake_case() {
        let f = FieldDescriptor::new("first_name", BaseType::String);
        assert_eq!(f.title_fallback(), "First Name");
    }

    #[test]
    fn title_fallback_splits_camel_case() {
        let f = FieldDescriptor::new("firstName", BaseType::String);
        assert_eq!(f.title_fallback(), "First Name");
    }

    #[test]
    fn title_fallback_splits_kebab_case() {
        let f = FieldDescriptor::new("first-name", BaseType::String);
        assert_eq!(f.title_fallback(), "First Name");
    }

    #[test]
    fn visible_fields_excludes_auto() {
        let mut id = FieldDescriptor::new("id", BaseType::Integer);
        id.auto = true;
        let name = FieldDescriptor::new("name", BaseType::String);
        let schema = Schema::new("User", vec![id, name]);
        assert_eq!(schema.visible_fields().len(), 1);
    }
}
