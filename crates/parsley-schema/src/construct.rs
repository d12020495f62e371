//! Schema-as-callable construction (spec §4.5, §9 Design Notes: "Schemas as
//! callables ... applying a dict yields a record, an array yields a typed
//! table").

use std::rc::Rc;

use parsley_core::value::dict::Dict;
use parsley_core::value::function::Evaluate;
use parsley_core::value::{Record, Schema, Table};
use parsley_core::ErrorValue;

/// Builds the record's backing dict: drops keys not in the schema, fills
/// missing fields with declared defaults, and emits the schema's column
/// order regardless of the input dict's key order (spec §3 invariant:
/// "Schema field order is the authoritative column order").
fn project_fields(schema: &Schema, source: &Dict, evaluator: &dyn Evaluate) -> Result<Dict, ErrorValue> {
    let projected = Dict::new();
    for field in &schema.fields {
        let value = match source.get(&field.name, evaluator)? {
            Some(v) => v,
            None => match &field.default {
                Some(default) => default.clone(),
                None => continue,
            },
        };
        projected.insert(field.name.clone(), value);
    }
    Ok(projected)
}

/// Schema applied to a dict (spec §4.5: "given schema and array of dicts,
/// drop unknown keys, apply defaults, preserve schema column order" — the
/// single-record case of the same rule).
pub fn apply_dict(schema: Rc<Schema>, data: &Dict, evaluator: &dyn Evaluate) -> Result<Record, ErrorValue> {
    let projected = project_fields(&schema, data, evaluator)?;
    Ok(Record::new(schema, projected))
}

/// Schema applied to an array of dicts: a typed table.
pub fn apply_array(schema: Rc<Schema>, rows: &[Dict], evaluator: &dyn Evaluate) -> Result<Table, ErrorValue> {
    let mut projected_rows = Vec::with_capacity(rows.len());
    for row in rows {
        projected_rows.push(project_fields(&schema, row, evaluator)?);
    }
    Ok(Table::new(Some(schema), projected_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::value::schema::{BaseType, FieldDescriptor};
    use parsley_core::value::{Function, Value};
    use parsley_core::Environment;

    struct NoopEvaluator;
    impl Evaluate for NoopEvaluator {
        fn eval_node(&self, _n: &dyn parsley_core::value::function::AstNode, _e: &Environment) -> Result<Value, ErrorValue> {
            unreachable!()
        }
        fn call_function(&self, _f: &Function, _a: &[Value]) -> Result<Value, ErrorValue> {
            unreachable!()
        }
    }

    fn user_schema() -> Rc<Schema> {
        let mut role = FieldDescriptor::new("role", BaseType::String);
        role.default = Some(Value::string("member"));
        Rc::new(Schema::new("User", vec![FieldDescriptor::new("name", BaseType::String), role]))
    }

    #[test]
    fn apply_dict_drops_unknown_keys_and_applies_defaults() {
        let schema = user_schema();
        let input = Dict::from_values(vec![
            ("name".into(), Value::string("Ada")),
            ("unexpected".into(), Value::Integer(1)),
        ]);
        let record = apply_dict(schema, &input, &NoopEvaluator).unwrap();
        assert_eq!(record.data().keys(), vec!["name".to_string(), "role".to_string()]);
        assert_eq!(record.data().peek("role"), Some(Value::string("member")));
    }

    #[test]
    fn apply_array_preserves_schema_column_order_per_row() {
        let schema = user_schema();
        let rows = vec![Dict::from_values(vec![("name".into(), Value::string("A"))])];
        let table = apply_array(schema, &rows, &NoopEvaluator).unwrap();
        assert_eq!(table.rows()[0].keys(), vec!["name".to_string(), "role".to_string()]);
    }
}
