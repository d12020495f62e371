//! DbConnection method table (spec §4.6, §4.8): `bind`, `begin`, `commit`,
//! `rollback`, `ping`.

use parsley_core::dbconn::DbConnectionHandle;
use parsley_core::value::Value;
use parsley_core::{ErrorKind, ErrorValue};

use super::require_arity;
use crate::dsl::{parse_bind_options, parse_relation_options};
use crate::evaluator::Evaluator;

const TYPE_NAME: &str = "db_connection";

fn sql_error(message: String) -> ErrorValue {
    ErrorValue::new(ErrorKind::Sql, "SQL-0001", message)
}

pub fn dispatch(evaluator: &Evaluator, handle: &DbConnectionHandle, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    match method {
        "bind" => {
            if args.len() < 2 || args.len() > 3 {
                return Err(ErrorValue::arity(format!("{TYPE_NAME}.bind: wrong number of arguments")));
            }
            let Some(Value::Schema(schema)) = args.first() else {
                return Err(ErrorValue::type_error("TYPE-0026", format!("{TYPE_NAME}.bind: expected a schema as the first argument")));
            };
            let Some(Value::String(table)) = args.get(1) else {
                return Err(ErrorValue::type_error("TYPE-0010", format!("{TYPE_NAME}.bind: expected a table name string")));
            };
            let options = match args.get(2) {
                Some(Value::Dict(d)) => Some(d),
                Some(other) => return Err(ErrorValue::type_error("TYPE-0027", format!("{TYPE_NAME}.bind: expected a dictionary of options, got {}", other.value_type().as_str()))),
                None => None,
            };
            let soft_delete = parse_bind_options(options, evaluator)?;
            let bindings = evaluator.bindings_for(handle);
            bindings.borrow_mut().bind(schema.name.clone(), schema.clone(), table.to_string(), soft_delete);
            Ok(Value::Null)
        }
        "relate" => {
            require_arity(TYPE_NAME, method, args, 3)?;
            let Some(Value::String(binding_name)) = args.first() else {
                return Err(ErrorValue::type_error("TYPE-0031", format!("{TYPE_NAME}.relate: expected a binding name string as the first argument")));
            };
            let Some(Value::String(relation_name)) = args.get(1) else {
                return Err(ErrorValue::type_error("TYPE-0032", format!("{TYPE_NAME}.relate: expected a relation name string as the second argument")));
            };
            let Some(Value::Dict(options)) = args.get(2) else {
                return Err(ErrorValue::type_error("TYPE-0033", format!("{TYPE_NAME}.relate: expected a dictionary of options as the third argument")));
            };
            let relation = parse_relation_options(options, evaluator)?;
            let bindings = evaluator.bindings_for(handle);
            bindings.borrow_mut().relate(binding_name, relation_name.to_string(), relation)?;
            Ok(Value::Null)
        }
        "begin" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            evaluator.block_on(handle.inner.begin()).map_err(sql_error)?;
            Ok(Value::Null)
        }
        "commit" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            evaluator.block_on(handle.inner.commit()).map_err(sql_error)?;
            Ok(Value::Null)
        }
        "rollback" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            evaluator.block_on(handle.inner.rollback()).map_err(sql_error)?;
            Ok(Value::Null)
        }
        "ping" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Boolean(evaluator.block_on(handle.inner.ping()).is_ok()))
        }
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}
