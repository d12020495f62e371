//! The driver-agnostic `SqlPlan` (spec §9 Design Notes: "lower to a
//! driver-agnostic `SqlPlan{select, from, joins, where, groupBy, having,
//! orderBy, limit, params}` then format for the target driver"). Grounded
//! structurally on `oxide-sql-core/src/builder/select.rs`'s
//! `SelectDyn::build()`, minus its compile-time typestate (the DSL compiler
//! assembles these plans from a runtime AST, not a fluent builder chain).

use parsley_core::value::sql::SqlValue;

#[derive(Debug, Clone, Default)]
pub struct SqlPlan {
    pub select: Vec<String>,
    pub from: String,
    pub joins: Vec<String>,
    pub where_clause: Option<String>,
    pub group_by: Vec<String>,
    pub having: Option<String>,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub params: Vec<SqlValue>,
}

impl SqlPlan {
    /// Renders `?`-placeholder SQL text. Dialect-specific placeholder
    /// rewriting happens in a later step ([`crate::dialect::Dialect::rewrite_placeholders`]).
    #[must_use]
    pub fn render(&self) -> String {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.select.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if let Some(w) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if let Some(h) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(h);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        sql
    }
}

/// One `WITH name AS (...)` block plus the final query.
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
    pub ctes: Vec<(String, SqlPlan)>,
    pub plan: SqlPlan,
}

impl CompiledQuery {
    #[must_use]
    pub fn render(&self) -> String {
        if self.ctes.is_empty() {
            return self.plan.render();
        }
        let cte_sql: Vec<String> = self.ctes.iter().map(|(name, plan)| format!("{name} AS ({})", plan.render())).collect();
        format!("WITH {} {}", cte_sql.join(", "), self.plan.render())
    }

    /// All bound parameters in source order: CTEs first, then the main plan
    /// (spec §8 invariant 4: positional order matches source order).
    #[must_use]
    pub fn params(&self) -> Vec<SqlValue> {
        let mut all = Vec::new();
        for (_, plan) in &self.ctes {
            all.extend(plan.params.iter().cloned());
        }
        all.extend(self.plan.params.iter().cloned());
        all
    }
}

#[derive(Debug, Clone)]
pub struct InsertPlan {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
    pub conflict_key: Option<String>,
    pub returning: bool,
}

impl InsertPlan {
    #[must_use]
    pub fn render(&self, supports_upsert: bool, supports_returning: bool) -> (String, Vec<SqlValue>) {
        let mut sql = format!("INSERT INTO {} ({})", self.table, self.columns.join(", "));
        let row_placeholders = format!("({})", vec!["?"; self.columns.len()].join(", "));
        let values_sql = vec![row_placeholders; self.rows.len()].join(", ");
        sql.push_str(" VALUES ");
        sql.push_str(&values_sql);
        if supports_upsert {
            if let Some(key) = &self.conflict_key {
                let assignments: Vec<String> = self.columns.iter().filter(|c| *c != key).map(|c| format!("{c} = excluded.{c}")).collect();
                sql.push_str(&format!(" ON CONFLICT({key}) DO UPDATE SET {}", assignments.join(", ")));
            }
        }
        if self.returning && supports_returning {
            sql.push_str(" RETURNING *");
        }
        let params = self.rows.iter().flatten().cloned().collect();
        (sql, params)
    }
}

#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub table: String,
    pub assignments: Vec<(String, SqlValue)>,
    pub where_clause: Option<String>,
    pub where_params: Vec<SqlValue>,
}

impl UpdatePlan {
    #[must_use]
    pub fn render(&self) -> (String, Vec<SqlValue>) {
        let set_sql: Vec<String> = self.assignments.iter().map(|(col, _)| format!("{col} = ?")).collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, set_sql.join(", "));
        let mut params: Vec<SqlValue> = self.assignments.iter().map(|(_, v)| v.clone()).collect();
        if let Some(w) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
            params.extend(self.where_params.iter().cloned());
        }
        (sql, params)
    }
}

/// A `@delete`, possibly rewritten into an `UPDATE` by the soft-delete rule
/// (spec §4.6: "every `@delete` is rewritten as `UPDATE ... SET <col> =
/// now`").
#[derive(Debug, Clone)]
pub enum DeletePlan {
    Physical { table: String, where_clause: Option<String>, where_params: Vec<SqlValue> },
    SoftDelete(UpdatePlan),
}

impl DeletePlan {
    #[must_use]
    pub fn render(&self) -> (String, Vec<SqlValue>) {
        match self {
            Self::Physical { table, where_clause, where_params } => {
                let mut sql = format!("DELETE FROM {table}");
                let mut params = Vec::new();
                if let Some(w) = where_clause {
                    sql.push_str(" WHERE ");
                    sql.push_str(w);
                    params.extend(where_params.iter().cloned());
                }
                (sql, params)
            }
            Self::SoftDelete(update) => update.render(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_plan_renders_full_clause_set() {
        let plan = SqlPlan {
            select: vec!["status".into(), "COUNT(*) AS cnt".into()],
            from: "orders".into(),
            where_clause: Some("active = ?".into()),
            group_by: vec!["status".into()],
            having: Some("cnt > ?".into()),
            order_by: vec!["cnt DESC".into()],
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(
            plan.render(),
            "SELECT status, COUNT(*) AS cnt FROM orders WHERE active = ? GROUP BY status HAVING cnt > ? ORDER BY cnt DESC LIMIT 5"
        );
    }

    #[test]
    fn insert_plan_renders_upsert() {
        let plan = InsertPlan {
            table: "users".into(),
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![SqlValue::Int(1), SqlValue::Text("A".into())]],
            conflict_key: Some("id".into()),
            returning: false,
        };
        let (sql, params) = plan.render(true, false);
        assert!(sql.contains("ON CONFLICT(id) DO UPDATE SET name = excluded.name"));
        assert_eq!(params.len(), 2);
    }
}
