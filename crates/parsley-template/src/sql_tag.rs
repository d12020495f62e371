//! The `<SQL>...</SQL>` tag (spec §4.2): lowers tag body text plus its
//! attribute values, in declaration order, into a `SqlQuery` value — the
//! same shape the query compiler (`parsley-query`) produces, so both feed
//! `parsley-io`'s SQL operators identically.

use parsley_core::value::sql::{SqlQuery, SqlValue};
use parsley_core::Value;

fn value_to_sql_param(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Bool(*b),
        Value::Integer(n) => SqlValue::Int(*n),
        Value::Float(f) => SqlValue::Float(*f),
        Value::String(s) => SqlValue::Text(s.to_string()),
        other => SqlValue::Text(other.to_display_string()),
    }
}

/// `body` is the tag's literal inner text (the SQL, with `?` placeholders);
/// `attr_values` are its attributes' already-evaluated values, in the order
/// they were declared on the tag.
#[must_use]
pub fn build_sql_tag(body: &str, attr_values: &[Value]) -> SqlQuery {
    SqlQuery::new(body.trim().to_string(), attr_values.iter().map(value_to_sql_param).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace_but_keeps_inner_text() {
        let query = build_sql_tag("\n  SELECT * FROM users WHERE id = ?\n", &[Value::Integer(7)]);
        assert_eq!(query.sql, "SELECT * FROM users WHERE id = ?");
        assert_eq!(query.params, vec![SqlValue::Int(7)]);
    }

    #[test]
    fn params_follow_attribute_declaration_order() {
        let query = build_sql_tag("UPDATE t SET a = ?, b = ? WHERE id = ?", &[Value::string("x"), Value::Integer(2), Value::Integer(9)]);
        assert_eq!(query.params, vec![SqlValue::Text("x".into()), SqlValue::Int(2), SqlValue::Int(9)]);
    }
}
