//! Builtin method dispatch (spec §4.8): each value kind exposes a frozen
//! method table. Split one module per value kind, the way `parsley-schema`
//! splits validation/metadata/format concerns.

pub mod array;
pub mod dbconn;
pub mod dict;
pub mod record;
pub mod scalar;
pub mod string;
pub mod table;

use parsley_core::errorvalue::ErrorValue;
use parsley_core::value::Value;

use crate::evaluator::Evaluator;

fn arity_error(type_name: &str, method: &str) -> ErrorValue {
    ErrorValue::arity(format!("{type_name}.{method}: wrong number of arguments"))
}

fn require_arity(type_name: &str, method: &str, args: &[Value], expected: usize) -> Result<(), ErrorValue> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error(type_name, method))
    }
}

/// `.type()` (spec §4.8): every value kind answers this the same way, and
/// it takes no arguments.
fn universal_type(receiver: &Value, args: &[Value]) -> Result<Option<Value>, ErrorValue> {
    if args.is_empty() {
        Ok(Some(Value::string(receiver.value_type().as_str())))
    } else {
        Err(ErrorValue::arity("type(): wrong number of arguments (expected 0)"))
    }
}

/// Routes `receiver.method(args)` to the receiver's type's method table
/// (spec §4.1 "Method call"). Returns `Err(NAME-0002)` when the method name
/// isn't in that type's table.
pub fn dispatch(evaluator: &Evaluator, receiver: &Value, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    if method == "type" {
        if let Some(result) = universal_type(receiver, args)? {
            return Ok(result);
        }
    }

    match receiver {
        Value::String(s) => string::dispatch(s, method, args),
        Value::Array(items) => array::dispatch(evaluator, items, method, args),
        Value::Dict(d) => dict::dispatch(evaluator, d, method, args),
        Value::Record(r) => record::dispatch(evaluator, r, method, args),
        Value::Table(t) => table::dispatch(evaluator, t, method, args),
        Value::DateTime(dt) => scalar::datetime_dispatch(dt, method, args),
        Value::Money(m) => scalar::money_dispatch(m, method, args),
        Value::Duration(d) => scalar::duration_dispatch(d, method, args),
        Value::DbConnection(handle) => dbconn::dispatch(evaluator, handle, method, args),
        other => Err(ErrorValue::name_error(format!(
            "no method '{method}' on {}",
            other.value_type().as_str()
        ))),
    }
}
