//! Record method table (spec §4.5, §4.8): `data`, `keys`, `schema`,
//! `validate`, `isValid`, `error`, `errorCode`, `hasError`, `errors`,
//! `errorList`, `update`, `withError`, `title`, `placeholder`, `meta`,
//! `format`, `enumValues`, `toJSON`.

use parsley_core::value::schema::{Constraint, ValidationState};
use parsley_core::value::{Record, Value};
use parsley_core::ErrorValue;

use parsley_schema::{metadata, validate::validate_record};

use super::require_arity;
use crate::evaluator::Evaluator;

const TYPE_NAME: &str = "record";

fn arg_str<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a str, ErrorValue> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_ref()),
        _ => Err(ErrorValue::type_error("TYPE-0010", format!("{TYPE_NAME}.{method}: expected a string argument"))),
    }
}

pub fn dispatch(evaluator: &Evaluator, record: &Record, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    match method {
        "data" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Dict(record.data().clone()))
        }
        "keys" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::array(record.data().keys().into_iter().map(Value::string).collect()))
        }
        "schema" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Schema(record.schema().clone()))
        }
        "validate" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Record(validate_record(record, evaluator)?))
        }
        "isValid" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Boolean(record.is_valid()))
        }
        "error" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let field = arg_str(args, 0, method)?;
            Ok(record.error(field).map_or(Value::Null, |e| Value::string(e.message.clone())))
        }
        "errorCode" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let field = arg_str(args, 0, method)?;
            Ok(record.error(field).map_or(Value::Null, |e| Value::string(e.code.clone())))
        }
        "hasError" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let field = arg_str(args, 0, method)?;
            Ok(Value::Boolean(record.error(field).is_some()))
        }
        "errors" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let dict = parsley_core::value::Dict::new();
            for (field, err) in record.errors() {
                dict.insert(field.clone(), Value::string(err.message.clone()));
            }
            Ok(Value::Dict(dict))
        }
        "errorList" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let list = record
                .errors()
                .iter()
                .map(|(field, err)| {
                    let entry = parsley_core::value::Dict::new();
                    entry.insert("field", Value::string(field.clone()));
                    entry.insert("code", Value::string(err.code.clone()));
                    entry.insert("message", Value::string(err.message.clone()));
                    Value::Dict(entry)
                })
                .collect();
            Ok(Value::array(list))
        }
        "update" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            match args.first() {
                Some(Value::Dict(patch)) => Ok(Value::Record(record.update(patch, evaluator)?)),
                _ => Err(ErrorValue::type_error("TYPE-0025", format!("{TYPE_NAME}.update: expected a dictionary argument"))),
            }
        }
        "withError" => {
            if args.len() == 2 {
                let field = arg_str(args, 0, method)?;
                let message = arg_str(args, 1, method)?;
                Ok(Value::Record(record.with_error(field, None, message)))
            } else if args.len() == 3 {
                let field = arg_str(args, 0, method)?;
                let code = arg_str(args, 1, method)?;
                let message = arg_str(args, 2, method)?;
                Ok(Value::Record(record.with_error(field, Some(code), message)))
            } else {
                Err(ErrorValue::arity(format!("{TYPE_NAME}.withError: wrong number of arguments")))
            }
        }
        "title" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            Ok(Value::string(metadata::title(record, arg_str(args, 0, method)?, evaluator)?))
        }
        "placeholder" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            Ok(Value::string(metadata::placeholder(record, arg_str(args, 0, method)?, evaluator)?))
        }
        "meta" => {
            require_arity(TYPE_NAME, method, args, 2)?;
            let field = arg_str(args, 0, method)?;
            let key = arg_str(args, 1, method)?;
            metadata::meta(record, field, key, evaluator)
        }
        "format" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            Ok(Value::string(metadata::format(record, arg_str(args, 0, method)?, evaluator)?))
        }
        "enumValues" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let field = arg_str(args, 0, method)?;
            let descriptor = record
                .schema()
                .field(field)
                .ok_or_else(|| ErrorValue::type_error("FIELD-0001", format!("no such field '{field}'")))?;
            let values = descriptor
                .constraints
                .iter()
                .find_map(|c| match c {
                    Constraint::Enum(values) => Some(values.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            Ok(Value::array(values))
        }
        "toJSON" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            super::dict::dispatch(evaluator, record.data(), "toJSON", &[])
        }
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

#[must_use]
pub fn validation_state_name(state: ValidationState) -> &'static str {
    match state {
        ValidationState::Unvalidated => "unvalidated",
        ValidationState::Valid => "valid",
        ValidationState::Invalid => "invalid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::config::EngineConfig;
    use parsley_core::environment::HostContext;
    use parsley_core::value::schema::{BaseType, FieldDescriptor, Schema};
    use parsley_core::value::Dict;
    use std::rc::Rc;

    fn ev() -> Evaluator {
        Evaluator::new(Rc::new(HostContext::new(EngineConfig::default())))
    }

    fn sample_record() -> Record {
        let schema = Rc::new(Schema::new("Person", vec![FieldDescriptor::new("name", BaseType::String)]));
        Record::new(schema, Dict::from_values(vec![("name".to_string(), Value::string("Ada"))]))
    }

    #[test]
    fn data_exposes_the_backing_dict() {
        let e = ev();
        let record = sample_record();
        let data = dispatch(&e, &record, "data", &[]).unwrap();
        assert!(matches!(data, Value::Dict(_)));
    }

    #[test]
    fn error_is_null_when_field_has_no_error() {
        let e = ev();
        let record = sample_record();
        assert_eq!(dispatch(&e, &record, "error", &[Value::string("name")]).unwrap(), Value::Null);
    }

    #[test]
    fn with_error_defaults_code_to_custom() {
        let e = ev();
        let record = sample_record();
        let updated = dispatch(&e, &record, "withError", &[Value::string("name"), Value::string("too short")]).unwrap();
        let Value::Record(r) = updated else { panic!("expected record") };
        assert_eq!(r.error("name").unwrap().code, "CUSTOM");
    }
}
