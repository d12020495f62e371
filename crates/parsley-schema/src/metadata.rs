//! `record.title(field)` / `.placeholder(field)` / `.meta(field, key)` /
//! `.format(field)` lookups (spec §4.5), layered over the plain field
//! descriptor metadata dict that `parsley-core` carries.

use parsley_core::value::function::Evaluate;
use parsley_core::value::schema::FieldDescriptor;
use parsley_core::value::{Record, Value};
use parsley_core::ErrorValue;

use crate::format::apply_format_hint;

fn field_or_error<'a>(record: &'a Record, field: &str) -> Result<&'a FieldDescriptor, ErrorValue> {
    record
        .schema()
        .field(field)
        .ok_or_else(|| ErrorValue::type_error("FIELD-0001", format!("no such field '{field}'")))
}

/// `record.title(field)`: the field's declared `title` metadata, or a
/// title-cased fallback derived from its name.
pub fn title(record: &Record, field: &str, evaluator: &dyn Evaluate) -> Result<String, ErrorValue> {
    let descriptor = field_or_error(record, field)?;
    match descriptor.metadata.get("title", evaluator)? {
        Some(Value::String(s)) => Ok(s.to_string()),
        _ => Ok(descriptor.title_fallback()),
    }
}

/// `record.placeholder(field)`: the declared `placeholder` metadata, or an
/// empty string when none was declared.
pub fn placeholder(record: &Record, field: &str, evaluator: &dyn Evaluate) -> Result<String, ErrorValue> {
    let descriptor = field_or_error(record, field)?;
    match descriptor.metadata.get("placeholder", evaluator)? {
        Some(Value::String(s)) => Ok(s.to_string()),
        _ => Ok(String::new()),
    }
}

/// `record.meta(field, key)`: arbitrary metadata lookup, `null` if absent.
pub fn meta(record: &Record, field: &str, key: &str, evaluator: &dyn Evaluate) -> Result<Value, ErrorValue> {
    let descriptor = field_or_error(record, field)?;
    Ok(descriptor.metadata.get(key, evaluator)?.unwrap_or(Value::Null))
}

/// `record.format(field)`: the field's current value rendered through its
/// declared `format` metadata hint (`currency`/`percent`/`number`/`date`/
/// `datetime`), falling back to the value's default display string.
pub fn format(record: &Record, field: &str, evaluator: &dyn Evaluate) -> Result<String, ErrorValue> {
    let descriptor = field_or_error(record, field)?;
    let value = record.data().get(field, evaluator)?.unwrap_or(Value::Null);
    let hint = match descriptor.metadata.get("format", evaluator)? {
        Some(Value::String(s)) => s.to_string(),
        _ => return Ok(value.to_display_string()),
    };
    Ok(apply_format_hint(&hint, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::value::dict::Dict;
    use parsley_core::value::schema::Schema;
    use parsley_core::value::schema::BaseType;
    use parsley_core::value::{Function, Money};
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

    #[test]
    fn title_falls_back_when_undeclared() {
        let field = FieldDescriptor::new("first_name", BaseType::String);
        let schema = Rc::new(Schema::new("Profile", vec![field]));
        let record = Record::new(schema, Dict::new());
        assert_eq!(title(&record, "first_name", &NoopEvaluator).unwrap(), "First Name");
    }

    #[test]
    fn format_applies_currency_hint() {
        let mut field = FieldDescriptor::new("price", BaseType::Money);
        field.metadata.insert("format", Value::string("currency"));
        let schema = Rc::new(Schema::new("Product", vec![field]));
        let data = Dict::from_values(vec![("price".into(), Value::Money(Money::new(1999, "USD", 2)))]);
        let record = Record::new(schema, data);
        assert_eq!(format(&record, "price", &NoopEvaluator).unwrap(), "USD 19.99");
    }
}
