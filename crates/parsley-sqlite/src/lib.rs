//! # parsley-sqlite
//!
//! Default `DbConnection` backend (spec §3 `@sqlite(path)`, §6
//! `DBConnection`) over `sqlx::SqlitePool`. Grounded on
//! `oxide-orm/src/queryset.rs`'s `execute`/`bind_param` pattern, adapted
//! from typed `FromRow` results to the value model's dynamic `Row` shape
//! since a Parsley table has no compile-time-known row type.

mod connection;
mod rows;

pub use connection::SqliteConnection;
