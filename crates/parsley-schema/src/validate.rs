//! The record/table validation algorithm (spec §4.5): per-field required
//! checks, type coercion, format predicates, and constraint checks, run in
//! schema declaration order.

use parsley_core::value::dict::Dict;
use parsley_core::value::function::Evaluate;
use parsley_core::value::schema::{BaseType, Constraint, FieldDescriptor, FieldError, ValidationState};
use parsley_core::value::{Record, Table, Value};
use parsley_core::ErrorValue;

use crate::format::FormatKind;

/// Outcome of resolving one field against its descriptor before constraint
/// checking: either a (possibly type-coerced) value, or legitimately absent.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Present(Value),
    Absent,
}

fn coerce_numeric_string(raw: &str) -> Option<Value> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    raw.parse::<f64>().ok().map(Value::Float)
}

/// Applies the base-type check, coercing numeric-looking strings for
/// `integer`/`float` fields (spec §4.5: "Integer/Float fields accept
/// numeric-looking strings, coerced on validation"). Booleans are checked
/// strictly; no string-to-bool coercion.
fn check_base_type(field: &FieldDescriptor, value: Value, evaluator: &dyn Evaluate) -> Result<Value, FieldError> {
    match &field.base_type {
        BaseType::String => match value {
            Value::String(_) => Ok(value),
            _ => Err(type_error(field, "string", evaluator)),
        },
        BaseType::Integer => match value {
            Value::Integer(_) => Ok(value),
            Value::String(ref s) => match coerce_numeric_string(s) {
                Some(Value::Integer(i)) => Ok(Value::Integer(i)),
                Some(Value::Float(f)) if f.fract() == 0.0 => Ok(Value::Integer(f as i64)),
                _ => Err(type_error(field, "integer", evaluator)),
            },
            _ => Err(type_error(field, "integer", evaluator)),
        },
        BaseType::Float => match value {
            Value::Float(_) | Value::Integer(_) => Ok(value),
            Value::String(ref s) => match coerce_numeric_string(s) {
                Some(v) => Ok(v),
                None => Err(type_error(field, "float", evaluator)),
            },
            _ => Err(type_error(field, "float", evaluator)),
        },
        BaseType::Boolean => match value {
            Value::Boolean(_) => Ok(value),
            _ => Err(type_error(field, "boolean", evaluator)),
        },
        BaseType::Money => match value {
            Value::Money(_) => Ok(value),
            _ => Err(type_error(field, "money", evaluator)),
        },
        BaseType::Date | BaseType::Time | BaseType::DateTime => match value {
            Value::DateTime(_) => Ok(value),
            _ => Err(type_error(field, "datetime", evaluator)),
        },
        BaseType::Array => match value {
            Value::Array(_) => Ok(value),
            _ => Err(type_error(field, "array", evaluator)),
        },
        BaseType::Schema(_) => match value {
            Value::Record(_) | Value::Dict(_) => Ok(value),
            _ => Err(type_error(field, "record", evaluator)),
        },
        BaseType::Email | BaseType::Url | BaseType::Phone | BaseType::Slug | BaseType::Uuid | BaseType::Ulid => {
            match value {
                Value::String(ref s) => {
                    let kind = format_kind(&field.base_type);
                    if kind.matches(s) {
                        Ok(value)
                    } else {
                        Err(FieldError {
                            code: "FORMAT".to_string(),
                            message: format!("{} must be a valid {}", field_title(field, evaluator), format_name(&field.base_type)),
                        })
                    }
                }
                _ => Err(type_error(field, "string", evaluator)),
            }
        }
    }
}

/// The field's declared `title` metadata, or a title-cased fallback derived
/// from its name (spec §4.5: REQUIRED/FORMAT messages read "`<Title> is
/// required`", not the raw field name). Mirrors `metadata::title`, but
/// works from a bare `FieldDescriptor` since validation runs before a
/// `Record` wraps the coerced data.
fn field_title(field: &FieldDescriptor, evaluator: &dyn Evaluate) -> String {
    match field.metadata.get("title", evaluator) {
        Ok(Some(Value::String(s))) => s.to_string(),
        _ => field.title_fallback(),
    }
}

fn format_kind(base_type: &BaseType) -> FormatKind {
    FormatKind::from_name(format_name(base_type)).expect("format base types map to a FormatKind")
}

fn format_name(base_type: &BaseType) -> &'static str {
    match base_type {
        BaseType::Email => "email",
        BaseType::Url => "url",
        BaseType::Phone => "phone",
        BaseType::Slug => "slug",
        BaseType::Uuid => "uuid",
        BaseType::Ulid => "ulid",
        _ => unreachable!("format_name called on a non-format base type"),
    }
}

fn type_error(field: &FieldDescriptor, expected: &str, evaluator: &dyn Evaluate) -> FieldError {
    FieldError {
        code: "TYPE".to_string(),
        message: format!("{} must be a {expected}", field_title(field, evaluator)),
    }
}

fn numeric_of(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn check_constraints(field: &FieldDescriptor, value: &Value) -> Option<FieldError> {
    for constraint in &field.constraints {
        let failure = match constraint {
            Constraint::Min(min) => numeric_of(value).filter(|n| n < min).map(|_| ("MIN_VALUE", format!("'{}' must be >= {min}", field.name))),
            Constraint::Max(max) => numeric_of(value).filter(|n| n > max).map(|_| ("MAX_VALUE", format!("'{}' must be <= {max}", field.name))),
            Constraint::MinLength(min) => string_len(value).filter(|len| len < min).map(|_| {
                ("MIN_LENGTH", format!("'{}' must be at least {min} characters", field.name))
            }),
            Constraint::MaxLength(max) => string_len(value).filter(|len| len > max).map(|_| {
                ("MAX_LENGTH", format!("'{}' must be at most {max} characters", field.name))
            }),
            Constraint::Pattern(pattern) => match (value, regex::Regex::new(pattern)) {
                (Value::String(s), Ok(re)) if !re.is_match(s) => {
                    Some(("PATTERN", format!("'{}' does not match the required pattern", field.name)))
                }
                _ => None,
            },
            Constraint::Enum(allowed) => {
                if allowed.contains(value) {
                    None
                } else {
                    Some(("ENUM", format!("'{}' is not one of the allowed values", field.name)))
                }
            }
        };
        if let Some((code, message)) = failure {
            return Some(FieldError { code: code.to_string(), message });
        }
    }
    None
}

fn string_len(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    }
}

fn resolve_field(
    field: &FieldDescriptor,
    data: &Dict,
    evaluator: &dyn Evaluate,
) -> Result<(FieldValue, Option<FieldError>), ErrorValue> {
    if field.auto {
        return Ok((FieldValue::Absent, None));
    }
    let raw = data.get(&field.name, evaluator)?;
    let raw = match raw {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    };
    let Some(raw) = raw else {
        if let Some(default) = &field.default {
            return Ok((FieldValue::Present(default.clone()), None));
        }
        if field.optional {
            return Ok((FieldValue::Absent, None));
        }
        return Ok((
            FieldValue::Absent,
            Some(FieldError {
                code: "REQUIRED".to_string(),
                message: format!("{} is required", field_title(field, evaluator)),
            }),
        ));
    };
    match check_base_type(field, raw, evaluator) {
        Ok(coerced) => {
            let error = check_constraints(field, &coerced);
            Ok((FieldValue::Present(coerced), error))
        }
        Err(e) => Ok((FieldValue::Absent, Some(e))),
    }
}

/// Validates a record against its own schema, returning a new record with
/// coerced field values, settled validation state, and a field error list
/// (spec §4.5, §3 invariant: "`.validate()` always returns a record").
pub fn validate_record(record: &Record, evaluator: &dyn Evaluate) -> Result<Record, ErrorValue> {
    let schema = record.schema();
    let coerced = Dict::new();
    let mut errors = Vec::new();
    for field in &schema.fields {
        let (resolved, error) = resolve_field(field, record.data(), evaluator)?;
        if let FieldValue::Present(value) = resolved {
            coerced.insert(field.name.clone(), value);
        }
        if let Some(error) = error {
            errors.push((field.name.clone(), error));
        }
    }
    let state = if errors.is_empty() { ValidationState::Valid } else { ValidationState::Invalid };
    let validated = Record::new(schema.clone(), coerced).with_validation(state, errors);
    Ok(validated)
}

/// Validates every row of a table against its schema (spec §4.5). A
/// schema-less table (no declared schema) validates as all-valid with no
/// per-row errors, since there is nothing to check against.
pub fn validate_table(table: &Table, evaluator: &dyn Evaluate) -> Result<Table, ErrorValue> {
    let Some(schema) = table.schema().cloned() else {
        let len = table.len();
        return Ok(table.with_validation(vec![ValidationState::Valid; len], vec![Vec::new(); len]));
    };
    let mut states = Vec::with_capacity(table.len());
    let mut all_errors = Vec::with_capacity(table.len());
    for row in table.rows() {
        let mut row_errors = Vec::new();
        for field in &schema.fields {
            let (_, error) = resolve_field(field, row, evaluator)?;
            if let Some(error) = error {
                row_errors.push((field.name.clone(), error));
            }
        }
        states.push(if row_errors.is_empty() { ValidationState::Valid } else { ValidationState::Invalid });
        all_errors.push(row_errors);
    }
    Ok(table.with_validation(states, all_errors))
}

/// `table.validRows()` / `table.invalidRows()` (spec §4.5): row indices
/// partitioned by settled validation state. Returns `None` if the table has
/// not been validated (every state still `Unvalidated`).
#[must_use]
pub fn partition_rows(table: &Table) -> Option<(Vec<usize>, Vec<usize>)> {
    if table.states().iter().all(|s| *s == ValidationState::Unvalidated) && !table.is_empty() {
        return None;
    }
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for (i, state) in table.states().iter().enumerate() {
        match state {
            ValidationState::Valid | ValidationState::Unvalidated => valid.push(i),
            ValidationState::Invalid => invalid.push(i),
        }
    }
    Some((valid, invalid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::value::schema::Schema;
    use parsley_core::value::{Function, Value};
    use parsley_core::Environment;
    use std::rc::Rc;

    struct NoopEvaluator;
    impl Evaluate for NoopEvaluator {
        fn eval_node(&self, _n: &dyn parsley_core::value::function::AstNode, _e: &Environment) -> Result<Value, ErrorValue> {
            unreachable!()
        }
        fn call_function(&self, _f: &Function, _a: &[Value]) -> Result<Value, ErrorValue> {
            unreachable!()
        }
    }

    fn signup_schema() -> Rc<Schema> {
        let mut email = FieldDescriptor::new("email", BaseType::Email);
        email.optional = false;
        let mut age = FieldDescriptor::new("age", BaseType::Integer);
        age.constraints.push(Constraint::Min(0.0));
        age.constraints.push(Constraint::Max(150.0));
        Rc::new(Schema::new("Signup", vec![email, age]))
    }

    #[test]
    fn valid_record_passes() {
        let schema = signup_schema();
        let data = Dict::from_values(vec![
            ("email".into(), Value::string("a@b.com")),
            ("age".into(), Value::Integer(30)),
        ]);
        let record = Record::new(schema, data);
        let validated = validate_record(&record, &NoopEvaluator).unwrap();
        assert!(validated.is_valid());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let schema = signup_schema();
        let data = Dict::from_values(vec![("age".into(), Value::Integer(30))]);
        let record = Record::new(schema, data);
        let validated = validate_record(&record, &NoopEvaluator).unwrap();
        assert!(!validated.is_valid());
        assert_eq!(validated.error("email").unwrap().code, "REQUIRED");
    }

    #[test]
    fn numeric_string_coerces_for_integer_field() {
        let schema = signup_schema();
        let data = Dict::from_values(vec![
            ("email".into(), Value::string("a@b.com")),
            ("age".into(), Value::string("42")),
        ]);
        let record = Record::new(schema, data);
        let validated = validate_record(&record, &NoopEvaluator).unwrap();
        assert!(validated.is_valid());
        assert_eq!(validated.data().peek("age"), Some(Value::Integer(42)));
    }

    #[test]
    fn out_of_range_constraint_fails() {
        let schema = signup_schema();
        let data = Dict::from_values(vec![
            ("email".into(), Value::string("a@b.com")),
            ("age".into(), Value::Integer(200)),
        ]);
        let record = Record::new(schema, data);
        let validated = validate_record(&record, &NoopEvaluator).unwrap();
        assert_eq!(validated.error("age").unwrap().code, "MAX_VALUE");
    }

    #[test]
    fn table_validation_partitions_rows() {
        let schema = signup_schema();
        let rows = vec![
            Dict::from_values(vec![("email".into(), Value::string("a@b.com")), ("age".into(), Value::Integer(10))]),
            Dict::from_values(vec![("age".into(), Value::Integer(10))]),
        ];
        let table = Table::new(Some(schema), rows);
        let validated = validate_table(&table, &NoopEvaluator).unwrap();
        let (valid, invalid) = partition_rows(&validated).unwrap();
        assert_eq!(valid, vec![0]);
        assert_eq!(invalid, vec![1]);
    }
}
