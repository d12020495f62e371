//! Dynamic row decoding. A Parsley table has no compile-time row shape to
//! `#[derive(FromRow)]` against, so each column is probed against the
//! handful of SQLite storage classes instead (inverse of
//! `oxide-orm/src/queryset.rs`'s `bind_param`, which goes the other way).

use parsley_core::dbconn::Row;
use parsley_core::value::sql::SqlValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, ValueRef};

pub fn decode_row(row: &SqliteRow) -> Row {
    row.columns().iter().enumerate().map(|(idx, column)| (column.name().to_string(), decode_value(row, idx))).collect()
}

fn decode_value(row: &SqliteRow, idx: usize) -> SqlValue {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return SqlValue::Null,
        Err(_) => return SqlValue::Null,
        Ok(_) => {}
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return SqlValue::Int(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return SqlValue::Float(v);
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return SqlValue::Bool(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        return SqlValue::Blob(v);
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return SqlValue::Text(v);
    }
    SqlValue::Null
}

#[cfg(test)]
mod tests {
    // `SqliteRow` can't be constructed outside of a live connection, so
    // decoding is exercised end-to-end in `connection::tests` instead.
}
