//! The tagged variant set for every runtime datum (spec §2 Value Model,
//! §3 Data Model), with the uniform `type()`/`inspect()`/`truthy()` contract.

pub mod datetime;
pub mod dict;
pub mod endpoint;
pub mod function;
pub mod literal;
pub mod money;
pub mod schema;
pub mod sql;

use std::rc::Rc;

pub use datetime::{DateTime, DateTimeKind, Duration};
pub use dict::Dict;
pub use endpoint::{Endpoint, HttpMethod};
pub use function::{Builtin, Function};
pub use literal::{PathLit, Range, RegexLit, Url};
pub use money::Money;
pub use schema::{BaseType, Constraint, FieldDescriptor, FieldError, Record, Schema, Table, ValidationState};

use crate::dbconn::DbConnectionHandle;
use crate::errorvalue::ErrorValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Array,
    Dictionary,
    Function,
    Builtin,
    Record,
    Table,
    Schema,
    Url,
    Regex,
    DateTime,
    Duration,
    Money,
    Path,
    Range,
    DbConnection,
    Endpoint,
    Error,
}

impl ValueType {
    /// The closed set `.type()` ranges over (spec §4.8).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Dictionary => "dictionary",
            Self::Function => "function",
            Self::Builtin => "builtin",
            Self::Record => "record",
            Self::Table => "table",
            Self::Schema => "schema",
            Self::Url => "url",
            Self::Regex => "regex",
            Self::DateTime => "datetime",
            Self::Duration => "duration",
            Self::Money => "money",
            Self::Path => "path",
            Self::Range => "range",
            Self::DbConnection => "db_connection",
            Self::Endpoint => "endpoint",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Boolean(bool),
    Null,
    Array(Rc<Vec<Value>>),
    Dict(Dict),
    DateTime(DateTime),
    Duration(Duration),
    Money(Money),
    Url(Url),
    Path(PathLit),
    Regex(RegexLit),
    Range(Range),
    Schema(Rc<Schema>),
    Record(Record),
    Table(Table),
    Function(Rc<Function>),
    Builtin(Builtin),
    DbConnection(DbConnectionHandle),
    Endpoint(Endpoint),
    Error(Rc<ErrorValue>),
}

impl Value {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(Rc::from(s.into()))
    }

    #[must_use]
    pub fn array(values: Vec<Value>) -> Self {
        Self::Array(Rc::new(values))
    }

    #[must_use]
    pub fn error(err: ErrorValue) -> Self {
        Self::Error(Rc::new(err))
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Null => ValueType::Null,
            Self::Array(_) => ValueType::Array,
            Self::Dict(_) => ValueType::Dictionary,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Duration(_) => ValueType::Duration,
            Self::Money(_) => ValueType::Money,
            Self::Url(_) => ValueType::Url,
            Self::Path(_) => ValueType::Path,
            Self::Regex(_) => ValueType::Regex,
            Self::Range(_) => ValueType::Range,
            Self::Schema(_) => ValueType::Schema,
            Self::Record(_) => ValueType::Record,
            Self::Table(_) => ValueType::Table,
            Self::Function(_) => ValueType::Function,
            Self::Builtin(_) => ValueType::Builtin,
            Self::DbConnection(_) => ValueType::DbConnection,
            Self::Endpoint(_) => ValueType::Endpoint,
            Self::Error(_) => ValueType::Error,
        }
    }

    /// Truthiness used by `if`/`while`/`&&`/`||` short-circuiting. Not
    /// specified exhaustively by the source spec; follows the common
    /// scripting-language convention also implied by `??` being a distinct,
    /// narrower "nullish" operator: only `false`, `null`, and empty
    /// string/array/dict/integer-zero/float-zero are falsy.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Null => false,
            Self::Integer(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(a) => !a.is_empty(),
            Self::Dict(d) => !d.is_empty(),
            _ => true,
        }
    }

    /// Human-readable diagnostic form, distinct from the escaped HTML string
    /// conversion the template writer applies (spec §4.2).
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("{s:?}"),
            Self::Boolean(b) => b.to_string(),
            Self::Null => "null".to_string(),
            Self::Array(a) => {
                let items: Vec<String> = a.iter().map(Value::inspect).collect();
                format!("[{}]", items.join(", "))
            }
            Self::Dict(d) => {
                let keys: Vec<String> = d
                    .keys()
                    .into_iter()
                    .map(|k| match d.peek(&k) {
                        Some(v) => format!("{k}: {}", v.inspect()),
                        None => format!("{k}: <thunk>"),
                    })
                    .collect();
                format!("{{{}}}", keys.join(", "))
            }
            Self::DateTime(dt) => dt.iso().unwrap_or_else(|| "<invalid-datetime>".to_string()),
            Self::Duration(d) => format!("{}mo{}s", d.months, d.seconds),
            Self::Money(m) => format!("{} {}", m.amount(), m.currency_code()),
            Self::Url(u) => u.raw.clone(),
            Self::Path(p) => p.raw.clone(),
            Self::Regex(r) => format!("/{}/", r.pattern),
            Self::Range(r) => format!("{}..{}{}", r.start, if r.inclusive { "=" } else { "" }, r.end),
            Self::Schema(s) => format!("<schema {}>", s.name),
            Self::Record(r) => format!("<record {}>", r.schema().name),
            Self::Table(t) => format!("<table {} rows>", t.len()),
            Self::Function(f) => format!("<function {}>", f.name.as_deref().unwrap_or("anonymous")),
            Self::Builtin(b) => format!("<builtin {}>", b.name),
            Self::DbConnection(c) => format!("<db_connection {}>", c.driver),
            Self::Endpoint(e) => format!("<endpoint {} {}>", e.method.as_str(), e.url.raw),
            Self::Error(e) => format!("<error {}>", e.code),
        }
    }

    /// String conversion rule used by template attribute interpolation
    /// (spec §4.2: "evaluated, converted to string, and HTML-escaped").
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::String(s) => s.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Null => String::new(),
            Self::DateTime(dt) => dt.iso().unwrap_or_default(),
            Self::Money(m) => format!("{:.*}", usize::from(m.scale), m.amount()),
            Self::Url(u) => u.raw.clone(),
            Self::Path(p) => p.raw.clone(),
            other => other.inspect(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => (*a as f64) == *b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a.shallow_eq(b),
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Money(a), Self::Money(b)) => a == b,
            (Self::Url(a), Self::Url(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a == b,
            (Self::Range(a), Self::Range(b)) => a == b,
            (Self::Schema(a), Self::Schema(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::DbConnection(a), Self::DbConnection(b)) => a == b,
            (Self::Endpoint(a), Self::Endpoint(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_matches_spec_closed_set() {
        assert_eq!(Value::Integer(1).value_type().as_str(), "integer");
        assert_eq!(Value::Null.value_type().as_str(), "null");
        assert_eq!(Value::string("x").value_type().as_str(), "string");
    }

    #[test]
    fn truthy_rules() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Integer(0).truthy());
        assert!(Value::Integer(1).truthy());
        assert!(!Value::string("").truthy());
        assert!(Value::string("x").truthy());
        assert!(!Value::array(vec![]).truthy());
    }

    #[test]
    fn mixed_int_float_equality_promotes() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
    }

    #[test]
    fn money_display_respects_scale() {
        let m = Value::Money(Money::new(1234, "USD", 2));
        assert_eq!(m.to_display_string(), "12.34");
    }
}
