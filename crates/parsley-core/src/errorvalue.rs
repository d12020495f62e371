//! The `error` value kind (spec §3 Errors, §7 Error Handling Design).
//!
//! Distinct from [`crate::error::CoreError`]: this is a first-class runtime
//! value that flows through the value model and is produced deliberately by
//! validation and I/O operators.

use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Type,
    Name,
    Validation,
    Io,
    Sql,
    Cache,
    Schema,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Type => "type",
            Self::Name => "name",
            Self::Validation => "validation",
            Self::Io => "io",
            Self::Sql => "sql",
            Self::Cache => "cache",
            Self::Schema => "schema",
        }
    }
}

/// `{kind, code, message, hints[], field?, row?, origin?}` (spec §3, §6, §7).
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub hints: Vec<String>,
    pub field: Option<String>,
    pub row: Option<usize>,
    pub origin: Option<String>,
}

impl ErrorValue {
    #[must_use]
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hints: Vec::new(),
            field: None,
            row: None,
            origin: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, "ARITY-0001", message)
    }

    pub fn name_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, "NAME-0001", message)
    }

    pub fn type_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, code, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Io, "CANCELLED", "operation was cancelled")
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Io, "TIMEOUT", "operation timed out")
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, "NETWORK", message)
    }

    /// Error JSON shape per spec §6: `{code, message, hints?, field?, row?}`.
    /// `kind` and `origin` are Rust-side bookkeeping, not part of the wire shape.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = json!({
            "code": self.code,
            "message": self.message,
        });
        let map = obj.as_object_mut().expect("object literal");
        if !self.hints.is_empty() {
            map.insert("hints".into(), json!(self.hints));
        }
        if let Some(field) = &self.field {
            map.insert("field".into(), json!(field));
        }
        if let Some(row) = self.row {
            map.insert("row".into(), json!(row));
        }
        obj
    }
}

impl std::fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.kind.as_str(), self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_omits_absent_optionals() {
        let err = ErrorValue::new(ErrorKind::Validation, "REQUIRED", "Name is required");
        let json = err.to_json();
        assert_eq!(json["code"], "REQUIRED");
        assert!(json.get("hints").is_none());
        assert!(json.get("field").is_none());
    }

    #[test]
    fn to_json_includes_hints_and_field() {
        let err = ErrorValue::new(ErrorKind::Type, "TYPE-0001", "cannot call null")
            .with_hint("null may not be exported")
            .with_field("handler");
        let json = err.to_json();
        assert_eq!(json["hints"][0], "null may not be exported");
        assert_eq!(json["field"], "handler");
    }
}
