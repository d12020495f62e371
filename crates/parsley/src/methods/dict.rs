//! Dict method table (spec §4.8): `keys`, `values`, `length`, `insertAfter`,
//! `insertBefore`, `as`, `toJSON`.

use parsley_core::value::{Dict, Value};
use parsley_core::ErrorValue;

use parsley_schema::construct::apply_dict;

use super::require_arity;
use crate::evaluator::Evaluator;

const TYPE_NAME: &str = "dictionary";

fn arg_str<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a str, ErrorValue> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_ref()),
        _ => Err(ErrorValue::type_error("TYPE-0010", format!("{TYPE_NAME}.{method}: expected a string argument"))),
    }
}

pub fn dispatch(evaluator: &Evaluator, dict: &Dict, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    match method {
        "keys" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::array(dict.keys().into_iter().map(Value::string).collect()))
        }
        "values" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let entries = dict.entries(evaluator)?;
            Ok(Value::array(entries.into_iter().map(|(_, v)| v).collect()))
        }
        "length" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Integer(dict.len() as i64))
        }
        "insertAfter" => {
            require_arity(TYPE_NAME, method, args, 3)?;
            let key = arg_str(args, 0, method)?;
            let new_key = arg_str(args, 1, method)?;
            dict.insert_after(key, new_key, args[2].clone())?;
            Ok(Value::Null)
        }
        "insertBefore" => {
            require_arity(TYPE_NAME, method, args, 3)?;
            let key = arg_str(args, 0, method)?;
            let new_key = arg_str(args, 1, method)?;
            dict.insert_before(key, new_key, args[2].clone())?;
            Ok(Value::Null)
        }
        "as" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            match args.first() {
                Some(Value::Schema(schema)) => Ok(Value::Record(apply_dict(std::rc::Rc::clone(schema), dict, evaluator)?)),
                _ => Err(ErrorValue::type_error("TYPE-0024", format!("{TYPE_NAME}.as: expected a schema argument"))),
            }
        }
        "toJSON" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let json = dict_to_json(dict, evaluator)?;
            Ok(Value::string(serde_json::to_string(&json).unwrap_or_default()))
        }
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

/// Forces every (possibly nested) lazy slot, unlike `parsley-io`'s internal
/// `peek`-based converter which is only safe for already-materialised
/// request/response bodies.
fn dict_to_json(dict: &Dict, evaluator: &Evaluator) -> Result<serde_json::Value, ErrorValue> {
    let entries = dict.entries(evaluator)?;
    let mut map = serde_json::Map::with_capacity(entries.len());
    for (k, v) in entries {
        map.insert(k, value_to_json(&v, evaluator)?);
    }
    Ok(serde_json::Value::Object(map))
}

fn value_to_json(value: &Value, evaluator: &Evaluator) -> Result<serde_json::Value, ErrorValue> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(value_to_json(item, evaluator)?);
            }
            serde_json::Value::Array(out)
        }
        Value::Dict(d) => dict_to_json(d, evaluator)?,
        other => serde_json::Value::String(other.to_display_string()),
    })
}
