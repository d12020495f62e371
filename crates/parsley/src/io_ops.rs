//! I/O operator nodes (spec §4.4): remote write/append, fetch, and the
//! three SQL operators. Each blocks the calling script until a response or
//! an error value is produced (spec §4.1: "Suspension occurs only at
//! remote-write/fetch/SQL boundaries").

use std::rc::Rc;
use std::time::Duration;

use parsley_core::environment::Environment;
use parsley_core::value::sql::SqlQuery;
use parsley_core::value::{Dict, Endpoint, Value};
use parsley_core::ErrorValue;

use crate::ast::Expr;
use crate::evaluator::Evaluator;

pub enum IoOp {
    RemoteWrite { payload: Rc<Expr>, target: Rc<Expr>, timeout_ms: Option<u64> },
    RemoteAppend { payload: Rc<Expr>, target: Rc<Expr>, timeout_ms: Option<u64> },
    Fetch { source: Rc<Expr>, timeout_ms: Option<u64> },
    SqlExec { conn: Rc<Expr>, stmt: Rc<Expr> },
    SqlQueryOne { conn: Rc<Expr>, stmt: Rc<Expr> },
    SqlQueryMany { conn: Rc<Expr>, stmt: Rc<Expr> },
}

/// `target`/`source` must be a typed endpoint wrapper (spec §4.4: "scalar or
/// bare URL string is an error").
fn require_endpoint(value: Value) -> Result<Endpoint, ErrorValue> {
    match value {
        Value::Endpoint(e) => Ok(e),
        other => Err(ErrorValue::type_error(
            "TYPE-0005",
            format!("expected a typed endpoint wrapper (JSON(url(...)) or text(url(...))), got {}", other.value_type().as_str()),
        )),
    }
}

/// Accepts a raw string or the `{sql, params}` dict shape produced by the
/// `<SQL>` tag / query compiler.
fn require_sql_query(value: Value) -> Result<SqlQuery, ErrorValue> {
    match value {
        Value::String(s) => Ok(SqlQuery::raw(s.to_string())),
        Value::Dict(d) => {
            let sql = match d.peek("sql") {
                Some(Value::String(s)) => s.to_string(),
                _ => return Err(ErrorValue::type_error("TYPE-0006", "SQL statement dict is missing a string 'sql' field")),
            };
            let params = match d.peek("params") {
                Some(Value::Array(values)) => values.iter().map(parsley_query::value_to_sql).collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Ok(SqlQuery::new(sql, params))
        }
        other => Err(ErrorValue::type_error("TYPE-0006", format!("expected a SQL statement, got {}", other.value_type().as_str()))),
    }
}

fn resolve_timeout(evaluator: &Evaluator, override_ms: Option<u64>) -> Duration {
    Duration::from_millis(override_ms.unwrap_or(evaluator.config().default_timeout_ms))
}

pub fn execute(evaluator: &Evaluator, op: &IoOp, env: &Environment) -> Result<Value, ErrorValue> {
    match op {
        IoOp::RemoteWrite { payload, target, timeout_ms } => {
            let endpoint = require_endpoint(evaluator.eval(target, env)?)?;
            let payload = evaluator.eval(payload, env)?;
            let timeout = resolve_timeout(evaluator, *timeout_ms);
            Ok(evaluator.block_on(parsley_io::remote_write(&endpoint, &payload, timeout)))
        }
        IoOp::RemoteAppend { payload, target, timeout_ms } => {
            let endpoint = require_endpoint(evaluator.eval(target, env)?)?;
            let payload = evaluator.eval(payload, env)?;
            let timeout = resolve_timeout(evaluator, *timeout_ms);
            Ok(evaluator.block_on(parsley_io::remote_append(&endpoint, &payload, timeout)))
        }
        IoOp::Fetch { source, timeout_ms } => {
            let endpoint = require_endpoint(evaluator.eval(source, env)?)?;
            let timeout = resolve_timeout(evaluator, *timeout_ms);
            Ok(evaluator.block_on(parsley_io::fetch(&endpoint, timeout)))
        }
        IoOp::SqlExec { conn, stmt } => {
            let handle = evaluator.resolve_connection(conn, env)?;
            let stmt = require_sql_query(evaluator.eval(stmt, env)?)?;
            Ok(evaluator.block_on(parsley_io::sql_exec(&handle, &stmt)))
        }
        IoOp::SqlQueryOne { conn, stmt } => {
            let handle = evaluator.resolve_connection(conn, env)?;
            let stmt = require_sql_query(evaluator.eval(stmt, env)?)?;
            Ok(evaluator.block_on(parsley_io::sql_query_one(&handle, &stmt)))
        }
        IoOp::SqlQueryMany { conn, stmt } => {
            let handle = evaluator.resolve_connection(conn, env)?;
            let stmt = require_sql_query(evaluator.eval(stmt, env)?)?;
            Ok(evaluator.block_on(parsley_io::sql_query_many(&handle, &stmt)))
        }
    }
}

/// `let {data, error[, status, headers]} = <io-expr>` (spec §4.1, §4.4):
/// only meaningful for a value produced by one of the four I/O operators,
/// but the projection itself doesn't care which — it reads the typed
/// response dict shape either way.
#[must_use]
pub fn is_destructurable_response(value: &Value) -> bool {
    matches!(value, Value::Dict(d) if parsley_core::response::is_typed_response(d))
}

pub fn project_response(dict: &Dict, evaluator: &dyn parsley_core::value::function::Evaluate) -> Result<parsley_core::response::Destructured, ErrorValue> {
    parsley_core::response::destructure(dict, evaluator)
}
