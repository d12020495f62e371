//! Table method table (spec §4.5, §4.8): `length`, `rows`, `columns`,
//! `schema`, `validate`, `isValid`, `errors`, `validRows`, `invalidRows`.

use parsley_core::value::{Table, Value};
use parsley_core::ErrorValue;

use parsley_schema::validate::{partition_rows, validate_table};

use super::require_arity;
use crate::evaluator::Evaluator;

const TYPE_NAME: &str = "table";

fn rows_at(table: &Table, indices: &[usize]) -> Value {
    let records = indices.iter().filter_map(|&i| table.row_record(i)).map(Value::Record).collect();
    Value::array(records)
}

pub fn dispatch(evaluator: &Evaluator, table: &Table, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    match method {
        "length" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Integer(table.len() as i64))
        }
        "rows" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(rows_at(table, &(0..table.len()).collect::<Vec<_>>()))
        }
        "columns" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let columns = table
                .schema()
                .map(|s| s.visible_fields().iter().map(|f| Value::string(f.name.clone())).collect())
                .unwrap_or_default();
            Ok(Value::array(columns))
        }
        "schema" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(table.schema().map_or(Value::Null, |s| Value::Schema(s.clone())))
        }
        "validate" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Table(validate_table(table, evaluator)?))
        }
        "isValid" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Boolean(
                table.states().iter().all(|s| *s == parsley_core::value::schema::ValidationState::Valid),
            ))
        }
        "errors" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let per_row = table
                .row_errors()
                .iter()
                .map(|errs| {
                    let dict = parsley_core::value::Dict::new();
                    for (field, err) in errs {
                        dict.insert(field.clone(), Value::string(err.message.clone()));
                    }
                    Value::Dict(dict)
                })
                .collect();
            Ok(Value::array(per_row))
        }
        "validRows" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let (valid, _) = partition_rows(table).unwrap_or_default();
            Ok(rows_at(table, &valid))
        }
        "invalidRows" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let (_, invalid) = partition_rows(table).unwrap_or_default();
            Ok(rows_at(table, &invalid))
        }
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}
