//! `DBConnection` host collaborator (spec §3, §6): driver name, open handle,
//! managed flag (true if the host owns the connection's lifetime).

use std::rc::Rc;

use async_trait::async_trait;

use crate::value::sql::{SqlQuery, SqlValue};

/// Result row in schema-declared column order, as a flat name/value list
/// (the value model's `Dict` construction from this happens in `parsley-query`,
/// which knows the binding's schema).
pub type Row = Vec<(String, SqlValue)>;

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub affected: i64,
    pub last_id: i64,
}

/// `DBConnection`: `Exec(sql, params) (affected, lastId, err)`, `QueryOne`,
/// `QueryMany`, `Begin`, `Commit`, `Rollback`, `Ping` (spec §6).
#[async_trait(?Send)]
pub trait DbConnection {
    async fn exec(&self, query: &SqlQuery) -> Result<ExecResult, String>;
    async fn query_one(&self, query: &SqlQuery) -> Result<Option<Row>, String>;
    async fn query_many(&self, query: &SqlQuery) -> Result<Vec<Row>, String>;
    async fn begin(&self) -> Result<(), String>;
    async fn commit(&self) -> Result<(), String>;
    async fn rollback(&self) -> Result<(), String>;
    async fn ping(&self) -> Result<(), String>;
}

/// `Value::DbConnection` payload: a driver name, the shared handle, and
/// whether the host (vs. `@sqlite(path)` itself) owns the connection's
/// lifetime.
#[derive(Clone)]
pub struct DbConnectionHandle {
    pub driver: String,
    pub managed: bool,
    pub inner: Rc<dyn DbConnection>,
}

impl std::fmt::Debug for DbConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnectionHandle")
            .field("driver", &self.driver)
            .field("managed", &self.managed)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DbConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.driver == other.driver && Rc::ptr_eq(&self.inner, &other.inner)
    }
}
