//! DSL statement nodes (spec §4.6: `@query`, `@insert`, `@update`,
//! `@delete`, `@transaction`) and their execution against a resolved
//! connection.
//!
//! `parsley_query::ast::Operand` has no "interpolated expression" variant by
//! design (the query compiler "never evaluates expressions itself"). Since
//! lexing/parsing the DSL's own grammar is out of scope here, each statement
//! node instead carries a `build` closure — produced by whatever constructs
//! the AST — that the evaluator runs at execution time to turn already
//! -bound host values into a fully resolved `parsley_query::ast` structure,
//! mirroring the `Builtin::func: Rc<dyn Fn(&[Value]) -> ...>` shape
//! `parsley-core` already uses for native functions.

use std::cell::RefCell;
use std::rc::Rc;

use parsley_core::dbconn::DbConnectionHandle;
use parsley_core::environment::Environment;
use parsley_core::value::function::Evaluate;
use parsley_core::value::sql::SqlQuery;
use parsley_core::value::{Dict, Value};
use parsley_core::ErrorValue;

use parsley_query::ast::{Clause, CompareOp, Condition, DeleteQuery, InsertQuery, Operand, Projection, Query, RelationLoad, Terminal, UpdateQuery};
use parsley_query::{compile_delete, compile_insert, compile_select, compile_update, pending_relations, Bindings, Relation, RelationKind};

use crate::ast::Expr;
use crate::evaluator::Evaluator;

pub type QueryBuilder = Rc<dyn Fn(&Environment, &dyn Evaluate) -> Result<Query, ErrorValue>>;
pub type InsertBuilder = Rc<dyn Fn(&Environment, &dyn Evaluate) -> Result<InsertQuery, ErrorValue>>;
pub type UpdateBuilder = Rc<dyn Fn(&Environment, &dyn Evaluate) -> Result<UpdateQuery, ErrorValue>>;
pub type DeleteBuilder = Rc<dyn Fn(&Environment, &dyn Evaluate) -> Result<DeleteQuery, ErrorValue>>;

/// One DSL statement (spec §4.6). `conn` names the connection the
/// statement's binding(s) were registered against via `db.bind(...)`;
/// resolving *which* connection owns a binding from lexical context alone
/// is a parser concern, so the AST carries it explicitly rather than having
/// the evaluator search every open connection's binding map.
pub enum DslStatement {
    Query { conn: Rc<Expr>, build: QueryBuilder },
    Insert { conn: Rc<Expr>, build: InsertBuilder },
    Update { conn: Rc<Expr>, build: UpdateBuilder },
    Delete { conn: Rc<Expr>, build: DeleteBuilder },
    /// `@transaction { stmts }`: each nested statement must itself name
    /// `conn` (always the same connection in practice, but not enforced
    /// here — a mismatched connection simply fails to find its binding).
    Transaction { conn: Rc<Expr>, statements: Vec<Rc<DslStatement>> },
}

fn row_count(row: &[(String, parsley_core::value::sql::SqlValue)]) -> Value {
    row.first().map_or(Value::Integer(0), |(_, v)| match v {
        parsley_core::value::sql::SqlValue::Int(n) => Value::Integer(*n),
        _ => Value::Integer(0),
    })
}

fn run_query(evaluator: &Evaluator, conn: &Rc<Expr>, build: &QueryBuilder, env: &Environment) -> Result<Value, ErrorValue> {
    let handle = evaluator.resolve_connection(conn, env)?;
    let bindings = evaluator.bindings_for(&handle);
    let query = build(env, evaluator)?;
    let compiled = {
        let bindings = bindings.borrow();
        compile_select(&query, &bindings)?
    };
    let stmt = SqlQuery::new(compiled.render(), compiled.params());
    let result = match query.terminal {
        Terminal::One(_) => evaluator.block_on(parsley_io::sql_query_one(&handle, &stmt)),
        Terminal::Many(_) => evaluator.block_on(parsley_io::sql_query_many(&handle, &stmt)),
        Terminal::Count => {
            let row = evaluator.block_on(parsley_io::sql_query_one(&handle, &stmt));
            match row {
                Value::Dict(d) => {
                    let pairs = d.entries(evaluator)?;
                    row_count(&pairs.into_iter().map(|(k, v)| (k, parsley_query::value_to_sql(&v).unwrap_or(parsley_core::value::sql::SqlValue::Null))).collect::<Vec<_>>())
                }
                other => other,
            }
        }
        Terminal::Exists => {
            let row = evaluator.block_on(parsley_io::sql_query_one(&handle, &stmt));
            Value::Boolean(!matches!(row, Value::Null))
        }
        Terminal::None => {
            evaluator.block_on(parsley_io::sql_query_many(&handle, &stmt));
            Value::Null
        }
    };
    let relations = pending_relations(&query);
    if relations.is_empty() {
        Ok(result)
    } else {
        stitch_relations(evaluator, &handle, &bindings, &query.binding, result, &relations)
    }
}

/// Applies every top-level `with relPath[.relPath...]` eager load (spec
/// §4.6) onto a fetched row or array of rows, recursing once per dotted
/// path segment. Terminals with no row shape (`count`, `exists`, none) fall
/// through `pending_relations` empty and never reach here.
fn stitch_relations(
    evaluator: &Evaluator,
    handle: &DbConnectionHandle,
    bindings: &Rc<RefCell<Bindings>>,
    binding_name: &str,
    value: Value,
    relations: &[RelationLoad],
) -> Result<Value, ErrorValue> {
    match value {
        Value::Array(rows) => {
            let mut stitched = Vec::with_capacity(rows.len());
            for row in rows.iter() {
                stitched.push(stitch_relations_one(evaluator, handle, bindings, binding_name, row.clone(), relations)?);
            }
            Ok(Value::array(stitched))
        }
        Value::Dict(_) => stitch_relations_one(evaluator, handle, bindings, binding_name, value, relations),
        other => Ok(other),
    }
}

fn stitch_relations_one(
    evaluator: &Evaluator,
    handle: &DbConnectionHandle,
    bindings: &Rc<RefCell<Bindings>>,
    binding_name: &str,
    row: Value,
    relations: &[RelationLoad],
) -> Result<Value, ErrorValue> {
    let Value::Dict(dict) = &row else { return Ok(row) };
    for load in relations {
        let Some((head, rest)) = load.path.split_first() else { continue };
        let relation = bindings.borrow().relation(binding_name, head)?.clone();
        let apply_clauses_here = rest.is_empty();
        let loaded = load_relation(evaluator, handle, bindings, &relation, dict, if apply_clauses_here { &load.clauses } else { &[] })?;
        let loaded = if apply_clauses_here {
            loaded
        } else {
            let nested = RelationLoad { path: rest.to_vec(), clauses: load.clauses.clone() };
            stitch_relations(evaluator, handle, bindings, &relation.target, loaded, std::slice::from_ref(&nested))?
        };
        dict.insert(head.clone(), loaded);
    }
    Ok(row)
}

/// Runs one relation's follow-up query (spec §4.6): belongs-to loads the
/// parent row by the owning row's foreign key column; has-many loads
/// children whose foreign key equals the owning row's `id`. `clauses` (the
/// `with rel(cond|order|limit)` form) are only non-empty at the deepest
/// segment of a dotted `with a.b.c` path.
fn load_relation(
    evaluator: &Evaluator,
    handle: &DbConnectionHandle,
    bindings: &Rc<RefCell<Bindings>>,
    relation: &Relation,
    owner: &Dict,
    clauses: &[Clause],
) -> Result<Value, ErrorValue> {
    let mut query = match relation.kind {
        RelationKind::BelongsTo => {
            let fk = owner.get(&relation.foreign_key, evaluator)?.unwrap_or(Value::Null);
            if matches!(fk, Value::Null) {
                return Ok(Value::Null);
            }
            let mut query = Query::new(relation.target.clone(), Terminal::One(Projection::Star));
            query.clauses.push(Clause::Cond(Condition::Compare { field: "id".into(), op: CompareOp::Eq, rhs: Operand::Value(fk) }));
            query
        }
        RelationKind::HasMany => {
            let id = owner.get("id", evaluator)?.unwrap_or(Value::Null);
            let mut query = Query::new(relation.target.clone(), Terminal::Many(Projection::Star));
            query.clauses.push(Clause::Cond(Condition::Compare { field: relation.foreign_key.clone(), op: CompareOp::Eq, rhs: Operand::Value(id) }));
            query
        }
    };
    query.clauses.extend(clauses.iter().cloned());

    let compiled = {
        let bindings = bindings.borrow();
        compile_select(&query, &bindings)?
    };
    let stmt = SqlQuery::new(compiled.render(), compiled.params());
    Ok(match query.terminal {
        Terminal::One(_) => evaluator.block_on(parsley_io::sql_query_one(handle, &stmt)),
        _ => evaluator.block_on(parsley_io::sql_query_many(handle, &stmt)),
    })
}

fn run_insert(evaluator: &Evaluator, conn: &Rc<Expr>, build: &InsertBuilder, env: &Environment) -> Result<Value, ErrorValue> {
    let handle = evaluator.resolve_connection(conn, env)?;
    let bindings = evaluator.bindings_for(&handle);
    let insert = build(env, evaluator)?;
    let plan = {
        let bindings = bindings.borrow();
        compile_insert(&insert, &bindings)?
    };
    let (sql, params) = plan.render(true, matches!(insert.terminal, Terminal::One(_)));
    let stmt = SqlQuery::new(sql, params);
    let exec = evaluator.block_on(parsley_io::sql_exec(&handle, &stmt));
    match insert.terminal {
        Terminal::One(_) => {
            let last_id = match &exec {
                Value::Dict(d) => d.peek("lastId").unwrap_or(Value::Null),
                _ => Value::Null,
            };
            let binding = bindings.borrow().get(&insert.binding)?.clone();
            let lookup = SqlQuery::new(format!("SELECT * FROM {} WHERE rowid = ?", binding.table), vec![parsley_query::value_to_sql(&last_id)?]);
            Ok(evaluator.block_on(parsley_io::sql_query_one(&handle, &lookup)))
        }
        Terminal::None => Ok(exec),
        _ => Ok(exec),
    }
}

fn run_update(evaluator: &Evaluator, conn: &Rc<Expr>, build: &UpdateBuilder, env: &Environment) -> Result<Value, ErrorValue> {
    let handle = evaluator.resolve_connection(conn, env)?;
    let bindings = evaluator.bindings_for(&handle);
    let update = build(env, evaluator)?;
    let plan = {
        let bindings = bindings.borrow();
        compile_update(&update, &bindings)?
    };
    let (sql, params) = plan.render();
    let stmt = SqlQuery::new(sql, params);
    Ok(evaluator.block_on(parsley_io::sql_exec(&handle, &stmt)))
}

fn run_delete(evaluator: &Evaluator, conn: &Rc<Expr>, build: &DeleteBuilder, env: &Environment) -> Result<Value, ErrorValue> {
    let handle = evaluator.resolve_connection(conn, env)?;
    let bindings = evaluator.bindings_for(&handle);
    let delete = build(env, evaluator)?;
    let plan = {
        let bindings = bindings.borrow();
        compile_delete(&delete, &bindings, "CURRENT_TIMESTAMP")?
    };
    let (sql, params) = plan.render();
    let stmt = SqlQuery::new(sql, params);
    Ok(evaluator.block_on(parsley_io::sql_exec(&handle, &stmt)))
}

/// `@transaction { stmts }` (spec §4.6): begin, run each statement in
/// order, roll back and propagate on the first error, otherwise commit and
/// return the last non-null statement result.
fn run_transaction(evaluator: &Evaluator, conn: &Rc<Expr>, statements: &[Rc<DslStatement>], env: &Environment) -> Result<Value, ErrorValue> {
    let handle = evaluator.resolve_connection(conn, env)?;
    evaluator
        .block_on(handle.inner.begin())
        .map_err(|e| ErrorValue::new(parsley_core::ErrorKind::Sql, "SQL-0001", e))?;

    let mut last = Value::Null;
    for stmt in statements {
        match execute(evaluator, stmt, env) {
            Ok(value) => {
                if !matches!(value, Value::Null) {
                    last = value;
                }
            }
            Err(err) => {
                let _ = evaluator.block_on(handle.inner.rollback());
                return Err(err);
            }
        }
    }
    evaluator
        .block_on(handle.inner.commit())
        .map_err(|e| ErrorValue::new(parsley_core::ErrorKind::Sql, "SQL-0001", e))?;
    Ok(last)
}

pub fn execute(evaluator: &Evaluator, stmt: &DslStatement, env: &Environment) -> Result<Value, ErrorValue> {
    match stmt {
        DslStatement::Query { conn, build } => run_query(evaluator, conn, build, env),
        DslStatement::Insert { conn, build } => run_insert(evaluator, conn, build, env),
        DslStatement::Update { conn, build } => run_update(evaluator, conn, build, env),
        DslStatement::Delete { conn, build } => run_delete(evaluator, conn, build, env),
        DslStatement::Transaction { conn, statements } => run_transaction(evaluator, conn, statements, env),
    }
}

/// `db.bind(Schema, table [, {soft_delete: column}])` (spec §4.6): called
/// from `methods::dbconn`'s method table, not from an `Expr::Dsl` node,
/// since it is an ordinary method call on a `db_connection` value rather
/// than its own DSL grammar form.
pub fn parse_bind_options(options: Option<&Dict>, evaluator: &dyn Evaluate) -> Result<Option<String>, ErrorValue> {
    let Some(options) = options else { return Ok(None) };
    match options.get("soft_delete", evaluator)? {
        Some(Value::String(s)) => Ok(Some(s.to_string())),
        Some(_) => Err(ErrorValue::type_error("TYPE-0004", "soft_delete option must be a string column name")),
        None => Ok(None),
    }
}

/// `db.relate(bindingName, relationName, {type, target, foreignKey})` (spec
/// §4.6, §9 "relations ... resolved at query-compile time"): declares a
/// `with`-loadable relation, called from `methods::dbconn`'s method table
/// the same way `db.bind(...)` is.
pub fn parse_relation_options(options: &Dict, evaluator: &dyn Evaluate) -> Result<Relation, ErrorValue> {
    let kind = match options.get("type", evaluator)? {
        Some(Value::String(s)) if &*s == "belongsTo" => RelationKind::BelongsTo,
        Some(Value::String(s)) if &*s == "hasMany" => RelationKind::HasMany,
        Some(Value::String(s)) => return Err(ErrorValue::type_error("TYPE-0028", format!("db.relate: unknown relation type '{s}'"))),
        _ => return Err(ErrorValue::type_error("TYPE-0028", "db.relate: expected a 'type' of 'belongsTo' or 'hasMany'")),
    };
    let target = match options.get("target", evaluator)? {
        Some(Value::String(s)) => s.to_string(),
        _ => return Err(ErrorValue::type_error("TYPE-0029", "db.relate: expected a 'target' binding name string")),
    };
    let foreign_key = match options.get("foreignKey", evaluator)? {
        Some(Value::String(s)) => s.to_string(),
        _ => return Err(ErrorValue::type_error("TYPE-0030", "db.relate: expected a 'foreignKey' column name string")),
    };
    Ok(Relation { kind, target, foreign_key })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parsley_core::config::EngineConfig;
    use parsley_core::dbconn::{DbConnection, ExecResult, Row};
    use parsley_core::environment::HostContext;
    use parsley_core::value::schema::{BaseType, FieldDescriptor};
    use parsley_core::value::sql::SqlValue;
    use parsley_core::value::Schema;

    use super::*;
    use crate::ast::Expr;

    /// Answers `query_one`/`query_many` by matching the table name named in
    /// `FROM <table>` against canned rows; good enough to exercise relation
    /// stitching without a real driver.
    struct RowsByTable(Vec<(String, Row)>);

    #[async_trait(?Send)]
    impl DbConnection for RowsByTable {
        async fn exec(&self, _query: &SqlQuery) -> Result<ExecResult, String> {
            unimplemented!("relation stitching tests never insert/update/delete")
        }
        async fn query_one(&self, query: &SqlQuery) -> Result<Option<Row>, String> {
            Ok(self.0.iter().find(|(table, _)| query.sql.contains(&format!("FROM {table}"))).map(|(_, row)| row.clone()))
        }
        async fn query_many(&self, query: &SqlQuery) -> Result<Vec<Row>, String> {
            Ok(self.0.iter().filter(|(table, _)| query.sql.contains(&format!("FROM {table}"))).map(|(_, row)| row.clone()).collect())
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

    fn ev() -> Evaluator {
        Evaluator::new(Rc::new(HostContext::new(EngineConfig::default())))
    }

    fn handle_with(rows: Vec<(&str, Row)>) -> DbConnectionHandle {
        DbConnectionHandle {
            driver: "fake".to_string(),
            managed: true,
            inner: Rc::new(RowsByTable(rows.into_iter().map(|(t, r)| (t.to_string(), r)).collect())),
        }
    }

    fn a_schema(name: &str) -> Rc<Schema> {
        Rc::new(Schema::new(name, vec![FieldDescriptor::new("id", BaseType::Integer)]))
    }

    fn run(evaluator: &Evaluator, handle: DbConnectionHandle, query: Query) -> Value {
        let conn = Rc::new(Expr::Literal(Value::DbConnection(handle)));
        let build: QueryBuilder = Rc::new(move |_env, _eval| Ok(query.clone()));
        let env = evaluator.root_environment();
        execute(evaluator, &DslStatement::Query { conn, build }, &env).unwrap()
    }

    #[test]
    fn with_relation_stitches_a_belongs_to_parent_row() {
        let evaluator = ev();
        let handle = handle_with(vec![
            ("posts", vec![("id".into(), SqlValue::Int(1)), ("authorId".into(), SqlValue::Int(7))]),
            ("users", vec![("id".into(), SqlValue::Int(7)), ("name".into(), SqlValue::Text("Ada".into()))]),
        ]);
        let bindings = evaluator.bindings_for(&handle);
        {
            let mut bindings = bindings.borrow_mut();
            bindings.bind("Posts", a_schema("Post"), "posts", None);
            bindings.bind("Users", a_schema("User"), "users", None);
            bindings.relate("Posts", "author", Relation { kind: RelationKind::BelongsTo, target: "Users".into(), foreign_key: "authorId".into() }).unwrap();
        }

        let mut query = Query::new("Posts", Terminal::One(Projection::Star));
        query.clauses.push(Clause::With(RelationLoad { path: vec!["author".into()], clauses: vec![] }));
        let result = run(&evaluator, handle, query);

        let Value::Dict(row) = result else { panic!("expected a dict") };
        let Some(Value::Dict(author)) = row.peek("author") else { panic!("expected author to be stitched in") };
        assert_eq!(author.peek("name"), Some(Value::string("Ada")));
    }

    #[test]
    fn with_relation_stitches_has_many_children() {
        let evaluator = ev();
        let handle = handle_with(vec![
            ("users", vec![("id".into(), SqlValue::Int(7)), ("name".into(), SqlValue::Text("Ada".into()))]),
            ("posts", vec![("id".into(), SqlValue::Int(1)), ("authorId".into(), SqlValue::Int(7))]),
            ("posts", vec![("id".into(), SqlValue::Int(2)), ("authorId".into(), SqlValue::Int(7))]),
        ]);
        let bindings = evaluator.bindings_for(&handle);
        {
            let mut bindings = bindings.borrow_mut();
            bindings.bind("Users", a_schema("User"), "users", None);
            bindings.bind("Posts", a_schema("Post"), "posts", None);
            bindings.relate("Users", "posts", Relation { kind: RelationKind::HasMany, target: "Posts".into(), foreign_key: "authorId".into() }).unwrap();
        }

        let mut query = Query::new("Users", Terminal::One(Projection::Star));
        query.clauses.push(Clause::With(RelationLoad { path: vec!["posts".into()], clauses: vec![] }));
        let result = run(&evaluator, handle, query);

        let Value::Dict(row) = result else { panic!("expected a dict") };
        let Some(Value::Array(posts)) = row.peek("posts") else { panic!("expected posts to be stitched in") };
        assert_eq!(posts.len(), 2);
    }

    #[test]
    fn with_nested_relation_path_recurses_one_segment_at_a_time() {
        let evaluator = ev();
        let handle = handle_with(vec![
            ("posts", vec![("id".into(), SqlValue::Int(1)), ("authorId".into(), SqlValue::Int(7))]),
            ("users", vec![("id".into(), SqlValue::Int(7)), ("orgId".into(), SqlValue::Int(3))]),
            ("orgs", vec![("id".into(), SqlValue::Int(3)), ("name".into(), SqlValue::Text("Acme".into()))]),
        ]);
        let bindings = evaluator.bindings_for(&handle);
        {
            let mut bindings = bindings.borrow_mut();
            bindings.bind("Posts", a_schema("Post"), "posts", None);
            bindings.bind("Users", a_schema("User"), "users", None);
            bindings.bind("Orgs", a_schema("Org"), "orgs", None);
            bindings.relate("Posts", "author", Relation { kind: RelationKind::BelongsTo, target: "Users".into(), foreign_key: "authorId".into() }).unwrap();
            bindings.relate("Users", "org", Relation { kind: RelationKind::BelongsTo, target: "Orgs".into(), foreign_key: "orgId".into() }).unwrap();
        }

        let mut query = Query::new("Posts", Terminal::One(Projection::Star));
        query.clauses.push(Clause::With(RelationLoad { path: vec!["author".into(), "org".into()], clauses: vec![] }));
        let result = run(&evaluator, handle, query);

        let Value::Dict(row) = result else { panic!("expected a dict") };
        let Some(Value::Dict(author)) = row.peek("author") else { panic!("expected author to be stitched in") };
        let Some(Value::Dict(org)) = author.peek("org") else { panic!("expected org to be stitched onto author") };
        assert_eq!(org.peek("name"), Some(Value::string("Acme")));
    }

    #[test]
    fn relation_with_no_declared_path_head_is_an_error() {
        let evaluator = ev();
        let handle = handle_with(vec![("posts", vec![("id".into(), SqlValue::Int(1))])]);
        let bindings = evaluator.bindings_for(&handle);
        bindings.borrow_mut().bind("Posts", a_schema("Post"), "posts", None);

        let mut query = Query::new("Posts", Terminal::One(Projection::Star));
        query.clauses.push(Clause::With(RelationLoad { path: vec!["author".into()], clauses: vec![] }));
        let conn = Rc::new(Expr::Literal(Value::DbConnection(handle)));
        let build: QueryBuilder = Rc::new(move |_env, _eval| Ok(query.clone()));
        let env = evaluator.root_environment();
        let err = execute(&evaluator, &DslStatement::Query { conn, build }, &env).unwrap_err();
        assert_eq!(err.code, "BINDING-0002");
    }
}
