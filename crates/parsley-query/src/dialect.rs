//! Dialect-specific SQL rendering (spec §9 Design Notes: "isolates SQL
//! dialect concerns"). Grounded on the teacher's `Dialect` trait
//! (`oxide-sql-core/src/dialect/mod.rs`), generalised with a placeholder
//! rewrite hook for drivers that don't speak `?` positional params.

pub trait Dialect {
    fn name(&self) -> &'static str;

    fn identifier_quote(&self) -> char {
        '"'
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_upsert(&self) -> bool {
        true
    }

    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        format!("{quote}{name}{quote}")
    }

    /// Rewrites the `?`-placeholder SQL this crate emits internally (spec
    /// §4.6: "All emitted SQL uses `?`-style positional parameters") into
    /// the driver's actual placeholder syntax. Identity for drivers that
    /// already accept `?`.
    fn rewrite_placeholders(&self, sql: &str) -> String {
        sql.to_string()
    }

    fn now_expr(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }
}

pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn rewrite_placeholders(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut n = 0u32;
        let mut in_quotes = false;
        for ch in sql.chars() {
            match ch {
                '\'' => {
                    in_quotes = !in_quotes;
                    out.push(ch);
                }
                '?' if !in_quotes => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
                _ => out.push(ch),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_rewrites_positional_placeholders() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.rewrite_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"), "SELECT * FROM t WHERE a = $1 AND b = $2");
    }

    #[test]
    fn postgres_leaves_quoted_question_marks_alone() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.rewrite_placeholders("SELECT '?' FROM t WHERE a = ?"), "SELECT '?' FROM t WHERE a = $1");
    }

    #[test]
    fn sqlite_is_identity() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.rewrite_placeholders("SELECT * WHERE a = ?"), "SELECT * WHERE a = ?");
    }
}
