//! The `DbConnection` impl plugged into `Value::DbConnection` by `@sqlite`
//! host setup. Grounded on `oxide-orm/src/queryset.rs`'s async query
//! execution over `SqlitePool`, generalised to run either against the pool
//! directly or against an open `@transaction` handle.

use std::cell::RefCell;

use async_trait::async_trait;
use parsley_core::dbconn::{DbConnection, ExecResult, Row};
use parsley_core::value::sql::{SqlQuery, SqlValue};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, Transaction};
use tracing::debug;

use crate::rows::decode_row;

/// A SQLite-backed `DbConnection`. Queries run against the pool unless a
/// `begin()` is in progress, in which case they're routed through the open
/// transaction so `@transaction` blocks see a consistent view.
pub struct SqliteConnection {
    pool: SqlitePool,
    tx: RefCell<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteConnection {
    /// Opens a pool against `path` (e.g. `"file:data.db"`, `":memory:"`).
    pub async fn connect(path: &str) -> Result<Self, String> {
        let pool = SqlitePoolOptions::new().max_connections(5).connect(path).await.map_err(|e| e.to_string())?;
        Ok(Self { pool, tx: RefCell::new(None) })
    }

    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, tx: RefCell::new(None) }
    }

    fn bind<'q>(
        mut built: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        params: &'q [SqlValue],
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        for param in params {
            built = match param {
                SqlValue::Null => built.bind(Option::<i64>::None),
                SqlValue::Bool(b) => built.bind(*b),
                SqlValue::Int(n) => built.bind(*n),
                SqlValue::Float(f) => built.bind(*f),
                SqlValue::Text(s) => built.bind(s.as_str()),
                SqlValue::Blob(b) => built.bind(b.as_slice()),
            };
        }
        built
    }
}

#[async_trait(?Send)]
impl DbConnection for SqliteConnection {
    async fn exec(&self, query: &SqlQuery) -> Result<ExecResult, String> {
        debug!(sql = %query.sql, "executing");
        let built = Self::bind(sqlx::query(&query.sql), &query.params);
        let mut guard = self.tx.borrow_mut();
        let result = if let Some(tx) = guard.as_mut() { built.execute(&mut **tx).await } else { built.execute(&self.pool).await };
        let result = result.map_err(|e| e.to_string())?;
        Ok(ExecResult { affected: i64::try_from(result.rows_affected()).unwrap_or(i64::MAX), last_id: result.last_insert_rowid() })
    }

    async fn query_one(&self, query: &SqlQuery) -> Result<Option<Row>, String> {
        let built = Self::bind(sqlx::query(&query.sql), &query.params);
        let mut guard = self.tx.borrow_mut();
        let row = if let Some(tx) = guard.as_mut() { built.fetch_optional(&mut **tx).await } else { built.fetch_optional(&self.pool).await };
        let row = row.map_err(|e| e.to_string())?;
        Ok(row.as_ref().map(decode_row))
    }

    async fn query_many(&self, query: &SqlQuery) -> Result<Vec<Row>, String> {
        let built = Self::bind(sqlx::query(&query.sql), &query.params);
        let mut guard = self.tx.borrow_mut();
        let rows = if let Some(tx) = guard.as_mut() { built.fetch_all(&mut **tx).await } else { built.fetch_all(&self.pool).await };
        let rows = rows.map_err(|e| e.to_string())?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn begin(&self) -> Result<(), String> {
        if self.tx.borrow().is_some() {
            return Err("a transaction is already open on this connection".to_string());
        }
        let tx = self.pool.begin().await.map_err(|e| e.to_string())?;
        *self.tx.borrow_mut() = Some(tx);
        Ok(())
    }

    async fn commit(&self) -> Result<(), String> {
        let tx = self.tx.borrow_mut().take().ok_or_else(|| "no open transaction to commit".to_string())?;
        tx.commit().await.map_err(|e| e.to_string())
    }

    async fn rollback(&self) -> Result<(), String> {
        let tx = self.tx.borrow_mut().take().ok_or_else(|| "no open transaction to roll back".to_string())?;
        tx.rollback().await.map_err(|e| e.to_string())
    }

    async fn ping(&self) -> Result<(), String> {
        self.pool.acquire().await.map(|_| ()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use parsley_core::value::sql::SqlQuery;

    use super::*;

    async fn memory_connection() -> SqliteConnection {
        SqliteConnection::connect(":memory:").await.expect("in-memory sqlite connects")
    }

    #[tokio::test]
    async fn exec_and_query_round_trip() {
        let conn = memory_connection().await;
        conn.exec(&SqlQuery::raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")).await.unwrap();
        conn.exec(&SqlQuery::new("INSERT INTO t (name) VALUES (?)", vec![SqlValue::Text("alice".into())])).await.unwrap();

        let row = conn.query_one(&SqlQuery::raw("SELECT id, name FROM t")).await.unwrap().expect("one row");
        assert_eq!(row[1], ("name".to_string(), SqlValue::Text("alice".into())));
    }

    #[tokio::test]
    async fn query_one_on_empty_result_is_none() {
        let conn = memory_connection().await;
        conn.exec(&SqlQuery::raw("CREATE TABLE t (id INTEGER PRIMARY KEY)")).await.unwrap();
        assert!(conn.query_one(&SqlQuery::raw("SELECT id FROM t WHERE id = 99")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rollback_discards_writes_made_inside_the_transaction() {
        let conn = memory_connection().await;
        conn.exec(&SqlQuery::raw("CREATE TABLE t (id INTEGER PRIMARY KEY)")).await.unwrap();

        conn.begin().await.unwrap();
        conn.exec(&SqlQuery::raw("INSERT INTO t (id) VALUES (1)")).await.unwrap();
        conn.rollback().await.unwrap();

        let rows = conn.query_many(&SqlQuery::raw("SELECT id FROM t")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn commit_after_begin_requires_a_matching_begin_first() {
        let conn = memory_connection().await;
        assert!(conn.commit().await.is_err());
    }
}
