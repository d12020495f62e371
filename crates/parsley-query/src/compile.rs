//! Lowers the query DSL AST to a driver-agnostic [`SqlPlan`]/[`InsertPlan`]/
//! [`UpdatePlan`]/[`DeletePlan`] (spec §4.6 compilation contract), applying
//! the soft-delete and eager-load rewrites along the way.

use std::collections::HashSet;

use parsley_core::value::sql::SqlValue;
use parsley_core::value::Value;
use parsley_core::{ErrorKind, ErrorValue};

use crate::ast::{
    Assignment, BoolOp, Clause, Condition, CorrelatedSubquery, DeleteQuery, InsertQuery, Operand, Projection, Query, RelationLoad,
    Terminal, UpdateQuery,
};
use crate::bindings::Bindings;
use crate::plan::{CompiledQuery, DeletePlan, InsertPlan, SqlPlan, UpdatePlan};

/// Converts a runtime [`Value`] used as a bound query parameter into the
/// wire-safe [`SqlValue`] (spec §4.6: values are "collected in emission
/// order and passed to the driver"). Composite values (array, dict,
/// function, ...) have no SQL representation.
pub fn value_to_sql(value: &Value) -> Result<SqlValue, ErrorValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Bool(*b),
        Value::Integer(n) => SqlValue::Int(*n),
        Value::Float(f) => SqlValue::Float(*f),
        Value::String(s) => SqlValue::Text(s.to_string()),
        Value::DateTime(dt) => SqlValue::Text(dt.iso().unwrap_or_default()),
        Value::Url(u) => SqlValue::Text(u.raw.clone()),
        Value::Path(p) => SqlValue::Text(p.raw.clone()),
        Value::Money(m) => SqlValue::Int(m.minor_units),
        other => {
            return Err(ErrorValue::new(
                ErrorKind::Type,
                "TYPE-0002",
                format!("{:?} has no SQL parameter representation", other.value_type()),
            ))
        }
    })
}

fn lower_operand(operand: &Operand, params: &mut Vec<SqlValue>) -> Result<String, ErrorValue> {
    match operand {
        Operand::Column(name) => Ok(name.clone()),
        Operand::Value(value) => {
            params.push(value_to_sql(value)?);
            Ok("?".to_string())
        }
    }
}

/// Compiles one condition to SQL text plus its parameters, in the order
/// values are encountered (spec §8 invariant 4).
pub fn compile_condition(condition: &Condition, bindings: &Bindings) -> Result<(String, Vec<SqlValue>), ErrorValue> {
    match condition {
        Condition::Compare { field, op, rhs } => {
            let mut params = Vec::new();
            let rhs_sql = lower_operand(rhs, &mut params)?;
            Ok((format!("{field} {} {rhs_sql}", op.as_sql()), params))
        }
        Condition::Between { field, low, high } => {
            let mut params = Vec::new();
            let low_sql = lower_operand(low, &mut params)?;
            let high_sql = lower_operand(high, &mut params)?;
            Ok((format!("{field} BETWEEN {low_sql} AND {high_sql}"), params))
        }
        Condition::Like { field, pattern } => Ok((format!("{field} LIKE ?"), vec![SqlValue::Text(pattern.clone())])),
        Condition::In { field, subquery } | Condition::NotIn { field, subquery } => {
            let compiled = compile_select(subquery, bindings)?;
            let op_sql = if matches!(condition, Condition::In { .. }) { "IN" } else { "NOT IN" };
            Ok((format!("{field} {op_sql} ({})", compiled.plan.render()), compiled.params()))
        }
        Condition::Not(inner) => {
            let (sql, params) = compile_condition(inner, bindings)?;
            Ok((format!("NOT ({sql})"), params))
        }
        Condition::Group(left, op, right) => {
            let (left_sql, mut params) = compile_condition(left, bindings)?;
            let (right_sql, right_params) = compile_condition(right, bindings)?;
            params.extend(right_params);
            let op_sql = match op {
                BoolOp::And => "AND",
                BoolOp::Or => "OR",
            };
            Ok((format!("({left_sql}) {op_sql} ({right_sql})"), params))
        }
    }
}

fn condition_alias_field(condition: &Condition) -> Option<&str> {
    match condition {
        Condition::Compare { field, .. } | Condition::Between { field, .. } => Some(field),
        _ => None,
    }
}

fn render_projection(projection: &Projection) -> Vec<String> {
    match projection {
        Projection::Star => vec!["*".to_string()],
        Projection::Columns(cols) => cols.clone(),
    }
}

/// Lowers a `@query` statement, applying the binding's soft-delete filter
/// (spec §4.6) and collecting any `with` relation loads for the caller to
/// stitch in as follow-up queries.
pub fn compile_select(query: &Query, bindings: &Bindings) -> Result<CompiledQuery, ErrorValue> {
    let binding = bindings.get(&query.binding)?;

    let mut where_parts = Vec::new();
    let mut where_params = Vec::new();
    let mut having_parts: Vec<String> = Vec::new();
    let mut having_params = Vec::new();
    let mut agg_projection = Vec::new();
    let mut agg_aliases = HashSet::new();
    let mut group_by = Vec::new();
    let mut order_by = Vec::new();
    let mut limit = None;
    let mut projected_subquery_params = Vec::new();

    for clause in &query.clauses {
        match clause {
            Clause::Cond(condition) => {
                let (sql, params) = compile_condition(condition, bindings)?;
                if condition_alias_field(condition).is_some_and(|f| agg_aliases.contains(f)) {
                    having_parts.push(sql);
                    having_params.extend(params);
                } else {
                    where_parts.push(sql);
                    where_params.extend(params);
                }
            }
            Clause::Order(fields) => {
                order_by = fields
                    .iter()
                    .map(|f| format!("{} {}", f.field, if f.dir == crate::ast::OrderDir::Asc { "ASC" } else { "DESC" }))
                    .collect();
            }
            Clause::Limit(n) => limit = Some(*n),
            Clause::GroupBy(cols) => group_by = cols.clone(),
            Clause::Agg(agg) => {
                agg_projection.push(format!("{} AS {}", agg.func.to_sql(&agg.column), agg.alias));
                agg_aliases.insert(agg.alias.clone());
            }
            Clause::With(_) => {}
            Clause::Correlated(correlated) => {
                let (sql, params) = compile_correlated_subquery(correlated, bindings)?;
                agg_projection.push(sql);
                projected_subquery_params.extend(params);
            }
        }
    }

    if let Some(soft_delete) = &binding.soft_delete {
        where_parts.push(format!("({soft_delete} IS NULL)"));
    }

    let select = match &query.terminal {
        Terminal::One(projection) | Terminal::Many(projection) => {
            let projected = render_projection(projection);
            let mut cols = agg_projection;
            let projected_is_bare_star = projected == ["*".to_string()];
            if !projected_is_bare_star || cols.is_empty() {
                cols.extend(projected);
            }
            cols
        }
        Terminal::Count => vec!["COUNT(*)".to_string()],
        Terminal::Exists => vec!["1".to_string()],
        Terminal::None => vec!["*".to_string()],
    };

    if matches!(query.terminal, Terminal::One(_)) {
        limit = Some(limit.unwrap_or(1).min(1));
    }
    if matches!(query.terminal, Terminal::Exists) {
        limit = Some(1);
    }

    let from = match &query.alias {
        Some(alias) => format!("{} AS {alias}", binding.table),
        None => binding.table.clone(),
    };

    let plan = SqlPlan {
        select,
        from,
        joins: Vec::new(),
        where_clause: if where_parts.is_empty() { None } else { Some(where_parts.join(" AND ")) },
        group_by,
        having: if having_parts.is_empty() { None } else { Some(having_parts.join(" AND ")) },
        order_by,
        limit,
        params: projected_subquery_params.into_iter().chain(where_params).chain(having_params).collect(),
    };

    let mut ctes = Vec::new();
    for (name, cte_query) in &query.ctes {
        let compiled = compile_select(cte_query, bindings)?;
        ctes.push((name.clone(), compiled.plan));
    }

    Ok(CompiledQuery { ctes, plan })
}

/// Compiles one `binding as b | ... | row-of-b-ref ?-> count` correlated
/// subquery (spec §4.6) to a single projected column: `(SELECT ...) AS
/// alias`. CTEs on the nested query are not supported (a scalar subquery
/// has no `WITH` clause of its own to attach them to).
fn compile_correlated_subquery(correlated: &CorrelatedSubquery, bindings: &Bindings) -> Result<(String, Vec<SqlValue>), ErrorValue> {
    let compiled = compile_select(&correlated.query, bindings)?;
    Ok((format!("({}) AS {}", compiled.render(), correlated.column_alias), compiled.params()))
}

/// Relations a compiled query still needs stitched in (spec §4.6: "`with
/// relation` performs a second query and stitches results"). Resolving the
/// relation's own binding and foreign-key column is a schema-registry
/// concern left to the caller driving the connection.
#[must_use]
pub fn pending_relations(query: &Query) -> Vec<RelationLoad> {
    query
        .clauses
        .iter()
        .filter_map(|clause| match clause {
            Clause::With(relation) => Some(relation.clone()),
            _ => None,
        })
        .collect()
}

fn assignment_columns_and_params(assignments: &[Assignment]) -> Result<(Vec<String>, Vec<SqlValue>), ErrorValue> {
    let mut columns = Vec::with_capacity(assignments.len());
    let mut params = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        columns.push(assignment.field.clone());
        let value = match &assignment.value {
            Operand::Value(v) => v.clone(),
            Operand::Column(name) => {
                return Err(ErrorValue::new(
                    ErrorKind::Type,
                    "TYPE-0003",
                    format!("assignment to '{}' must be a value, not a bare column reference '{name}'", assignment.field),
                ))
            }
        };
        params.push(value_to_sql(&value)?);
    }
    Ok((columns, params))
}

/// Lowers `@insert` (spec §4.6), producing one `InsertPlan` per DSL
/// statement; the batch form (`* each arr as x |< ...`) is represented by
/// more than one row in `rows`.
pub fn compile_insert(insert: &InsertQuery, bindings: &Bindings) -> Result<InsertPlan, ErrorValue> {
    let binding = bindings.get(&insert.binding)?;
    let columns = insert
        .rows
        .first()
        .map(|row| row.iter().map(|a| a.field.clone()).collect::<Vec<_>>())
        .unwrap_or_default();
    let mut rows = Vec::with_capacity(insert.rows.len());
    for row in &insert.rows {
        let (_, params) = assignment_columns_and_params(row)?;
        rows.push(params);
    }
    Ok(InsertPlan {
        table: binding.table.clone(),
        columns,
        rows,
        conflict_key: insert.update_on_key.clone(),
        returning: matches!(insert.terminal, Terminal::One(_)),
    })
}

/// Lowers `@update` (spec §4.6).
pub fn compile_update(update: &UpdateQuery, bindings: &Bindings) -> Result<UpdatePlan, ErrorValue> {
    let binding = bindings.get(&update.binding)?;
    let (columns, params) = assignment_columns_and_params(&update.assignments)?;
    let assignments = columns.into_iter().zip(params).collect();

    let mut where_parts = Vec::new();
    let mut where_params = Vec::new();
    for condition in &update.conditions {
        let (sql, params) = compile_condition(condition, bindings)?;
        where_parts.push(sql);
        where_params.extend(params);
    }
    if let Some(soft_delete) = &binding.soft_delete {
        where_parts.push(format!("({soft_delete} IS NULL)"));
    }

    Ok(UpdatePlan {
        table: binding.table.clone(),
        assignments,
        where_clause: if where_parts.is_empty() { None } else { Some(where_parts.join(" AND ")) },
        where_params,
    })
}

/// Lowers `@delete`, rewriting to an `UPDATE` when the binding declares
/// `soft_delete` (spec §4.6), using `now_expr` as the tombstone value.
pub fn compile_delete(delete: &DeleteQuery, bindings: &Bindings, now_expr: &str) -> Result<DeletePlan, ErrorValue> {
    let binding = bindings.get(&delete.binding)?;
    let mut where_parts = Vec::new();
    let mut where_params = Vec::new();
    for condition in &delete.conditions {
        let (sql, params) = compile_condition(condition, bindings)?;
        where_parts.push(sql);
        where_params.extend(params);
    }
    let where_clause = if where_parts.is_empty() { None } else { Some(where_parts.join(" AND ")) };

    if let Some(soft_delete) = &binding.soft_delete {
        Ok(DeletePlan::SoftDelete(UpdatePlan {
            table: binding.table.clone(),
            assignments: vec![(soft_delete.clone(), SqlValue::Text(now_expr.to_string()))],
            where_clause,
            where_params,
        }))
    } else {
        Ok(DeletePlan::Physical { table: binding.table.clone(), where_clause, where_params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, OrderDir, OrderField};
    use parsley_core::value::schema::{BaseType, FieldDescriptor};
    use parsley_core::value::{Schema, Value};
    use std::rc::Rc;

    fn bindings_with_soft_delete() -> Bindings {
        let mut bindings = Bindings::new();
        let schema = Rc::new(Schema::new("User", vec![FieldDescriptor::new("id", BaseType::Integer)]));
        bindings.bind("Users", schema, "users", Some("deleted_at".to_string()));
        bindings
    }

    #[test]
    fn soft_delete_binding_filters_selects() {
        let bindings = bindings_with_soft_delete();
        let query = Query::new("Users", Terminal::Many(Projection::Star));
        let compiled = compile_select(&query, &bindings).unwrap();
        assert_eq!(compiled.plan.where_clause.as_deref(), Some("(deleted_at IS NULL)"));
    }

    #[test]
    fn condition_with_value_pushes_positional_param() {
        let bindings = bindings_with_soft_delete();
        let mut query = Query::new("Users", Terminal::Many(Projection::Star));
        query.clauses.push(Clause::Cond(Condition::Compare {
            field: "status".into(),
            op: CompareOp::Eq,
            rhs: Operand::Value(Value::string("active")),
        }));
        let compiled = compile_select(&query, &bindings).unwrap();
        assert_eq!(compiled.plan.where_clause.as_deref(), Some("status = ? AND (deleted_at IS NULL)"));
        assert_eq!(compiled.params(), vec![SqlValue::Text("active".into())]);
    }

    #[test]
    fn delete_without_soft_delete_is_physical() {
        let mut bindings = Bindings::new();
        let schema = Rc::new(Schema::new("Tag", vec![FieldDescriptor::new("id", BaseType::Integer)]));
        bindings.bind("Tags", schema, "tags", None);
        let delete = DeleteQuery {
            binding: "Tags".into(),
            conditions: vec![Condition::Compare { field: "id".into(), op: CompareOp::Eq, rhs: Operand::Value(Value::Integer(1)) }],
            terminal: Terminal::None,
        };
        let plan = compile_delete(&delete, &bindings, "now").unwrap();
        assert!(matches!(plan, DeletePlan::Physical { .. }));
    }

    #[test]
    fn delete_with_soft_delete_rewrites_to_update() {
        let bindings = bindings_with_soft_delete();
        let delete = DeleteQuery {
            binding: "Users".into(),
            conditions: vec![Condition::Compare { field: "id".into(), op: CompareOp::Eq, rhs: Operand::Value(Value::Integer(1)) }],
            terminal: Terminal::None,
        };
        let plan = compile_delete(&delete, &bindings, "CURRENT_TIMESTAMP").unwrap();
        let (sql, _) = plan.render();
        assert!(sql.starts_with("UPDATE users SET deleted_at = ?"));
    }

    #[test]
    fn order_by_preserves_declaration_order() {
        let bindings = bindings_with_soft_delete();
        let mut query = Query::new("Users", Terminal::Many(Projection::Star));
        query.clauses.push(Clause::Order(vec![
            OrderField { field: "a".into(), dir: OrderDir::Asc },
            OrderField { field: "b".into(), dir: OrderDir::Desc },
        ]));
        let compiled = compile_select(&query, &bindings).unwrap();
        assert_eq!(compiled.plan.order_by, vec!["a ASC".to_string(), "b DESC".to_string()]);
    }

    #[test]
    fn binding_alias_renders_as_from_alias() {
        let bindings = bindings_with_soft_delete();
        let mut query = Query::new("Users", Terminal::Many(Projection::Star));
        query.alias = Some("u".into());
        let compiled = compile_select(&query, &bindings).unwrap();
        assert_eq!(compiled.plan.from, "users AS u");
    }

    fn bindings_with_orders_and_customers() -> Bindings {
        let mut bindings = bindings_with_soft_delete();
        let schema = Rc::new(Schema::new("Order", vec![FieldDescriptor::new("id", BaseType::Integer)]));
        bindings.bind("Orders", schema, "orders", None);
        bindings.bind(
            "Customers",
            Rc::new(Schema::new("Customer", vec![FieldDescriptor::new("id", BaseType::Integer)])),
            "customers",
            None,
        );
        bindings
    }

    #[test]
    fn correlated_subquery_compiles_to_a_projected_scalar_column() {
        let bindings = bindings_with_orders_and_customers();
        let mut inner = Query::new("Orders", Terminal::Count);
        inner.alias = Some("o".into());
        inner.clauses.push(Clause::Cond(Condition::Compare {
            field: "o.customerId".into(),
            op: CompareOp::Eq,
            rhs: Operand::Column("Customers.id".into()),
        }));

        let mut outer = Query::new("Customers", Terminal::Many(Projection::Star));
        outer.clauses.push(Clause::Correlated(CorrelatedSubquery { column_alias: "orderCount".into(), query: Box::new(inner) }));

        let compiled = compile_select(&outer, &bindings).unwrap();
        assert_eq!(
            compiled.plan.select,
            vec!["(SELECT COUNT(*) FROM orders AS o WHERE o.customerId = Customers.id) AS orderCount".to_string()]
        );
    }
}
