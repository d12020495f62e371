//! SQL exec/query operators (`<=!=>`, `<=?=>`, `<=??=>`) (spec §4.4): thin
//! `Value`-producing wrappers over `parsley_core::dbconn::DbConnection`.
//! Parameter binding uses the SQL-query value's `params[]` positionally;
//! the driver-level binding itself lives in the connection implementation
//! (e.g. `parsley-sqlite`).

use parsley_core::dbconn::{DbConnectionHandle, Row};
use parsley_core::errorvalue::{ErrorKind, ErrorValue};
use parsley_core::value::sql::{SqlQuery, SqlValue};
use parsley_core::value::Dict;
use parsley_core::Value;
use tracing::warn;

fn sql_error(message: impl Into<String>) -> Value {
    let message = message.into();
    warn!(error = %message, "driver reported an error");
    Value::error(ErrorValue::new(ErrorKind::Sql, "SQL-0001", message))
}

fn sql_value_to_value(v: &SqlValue) -> Value {
    match v {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Boolean(*b),
        SqlValue::Int(n) => Value::Integer(*n),
        SqlValue::Float(f) => Value::Float(*f),
        SqlValue::Text(s) => Value::string(s.clone()),
        SqlValue::Blob(b) => Value::array(b.iter().map(|byte| Value::Integer(i64::from(*byte))).collect()),
    }
}

/// Builds a row dict in the column order the driver returned them, which
/// for `parsley-sqlite` is schema-declared column order (spec §4.4: "a row
/// as a dict in schema-declared column order").
fn row_to_dict(row: Row) -> Value {
    let pairs = row.into_iter().map(|(name, value)| (name, sql_value_to_value(&value))).collect();
    Value::Dict(Dict::from_values(pairs))
}

/// `conn <=!=> stmt`. Returns `{affected, lastId}` or an error value.
pub async fn sql_exec(conn: &DbConnectionHandle, stmt: &SqlQuery) -> Value {
    match conn.inner.exec(stmt).await {
        Ok(result) => Value::Dict(Dict::from_values(vec![("affected".to_string(), Value::Integer(result.affected)), ("lastId".to_string(), Value::Integer(result.last_id))])),
        Err(e) => sql_error(e),
    }
}

/// `conn <=?=> stmt`. Returns a row dict, `null` if no rows, or an error value.
pub async fn sql_query_one(conn: &DbConnectionHandle, stmt: &SqlQuery) -> Value {
    match conn.inner.query_one(stmt).await {
        Ok(Some(row)) => row_to_dict(row),
        Ok(None) => Value::Null,
        Err(e) => sql_error(e),
    }
}

/// `conn <=??=> stmt`. Returns an array of row dicts or an error value.
pub async fn sql_query_many(conn: &DbConnectionHandle, stmt: &SqlQuery) -> Value {
    match conn.inner.query_many(stmt).await {
        Ok(rows) => Value::array(rows.into_iter().map(row_to_dict).collect()),
        Err(e) => sql_error(e),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use async_trait::async_trait;
    use parsley_core::dbconn::{DbConnection, ExecResult};

    use super::*;

    struct FakeConnection;

    #[async_trait(?Send)]
    impl DbConnection for FakeConnection {
        async fn exec(&self, _query: &SqlQuery) -> Result<ExecResult, String> {
            Ok(ExecResult { affected: 1, last_id: 42 })
        }

        async fn query_one(&self, _query: &SqlQuery) -> Result<Option<Row>, String> {
            Ok(Some(vec![("id".to_string(), SqlValue::Int(1)), ("name".to_string(), SqlValue::Text("alice".into()))]))
        }

        async fn query_many(&self, _query: &SqlQuery) -> Result<Vec<Row>, String> {
            Ok(vec![vec![("id".to_string(), SqlValue::Int(1))], vec![("id".to_string(), SqlValue::Int(2))]])
        }

        async fn begin(&self) -> Result<(), String> {
            Ok(())
        }

        async fn commit(&self) -> Result<(), String> {
            Ok(())
        }

        async fn rollback(&self) -> Result<(), String> {
            Ok(())
        }

        async fn ping(&self) -> Result<(), String> {
            Ok(())
        }
    }

    fn handle() -> DbConnectionHandle {
        DbConnectionHandle { driver: "fake".to_string(), managed: true, inner: Rc::new(FakeConnection) }
    }

    #[tokio::test]
    async fn exec_reports_affected_and_last_id() {
        let result = sql_exec(&handle(), &SqlQuery::raw("UPDATE t SET x = 1")).await;
        match result {
            Value::Dict(d) => {
                assert_eq!(d.peek("affected"), Some(Value::Integer(1)));
                assert_eq!(d.peek("lastId"), Some(Value::Integer(42)));
            }
            other => panic!("expected dict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_one_builds_a_row_dict_in_returned_column_order() {
        let result = sql_query_one(&handle(), &SqlQuery::raw("SELECT id, name FROM t")).await;
        match result {
            Value::Dict(d) => {
                assert_eq!(d.keys(), vec!["id".to_string(), "name".to_string()]);
                assert_eq!(d.peek("name"), Some(Value::string("alice")));
            }
            other => panic!("expected dict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_many_returns_an_array_of_row_dicts() {
        let result = sql_query_many(&handle(), &SqlQuery::raw("SELECT id FROM t")).await;
        match result {
            Value::Array(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected array, got {other:?}"),
        }
    }
}
