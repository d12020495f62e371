//! The query DSL's own small AST (spec §4.6), kept distinct from the host
//! language's AST (spec §9 Design Notes: "Represent the DSL as a small AST
//! ... distinct from the host-language AST"). By the time a `Query` reaches
//! this crate, every `{expr}` interpolation has already been evaluated by
//! the host evaluator down to a plain [`Value`] — this crate never
//! evaluates expressions itself.

use parsley_core::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// The right-hand side of a comparison: a bare identifier is a column
/// reference, not a variable; `{expr}` interpolation already resolved its
/// value upstream (spec §4.6: "Identifier resolution inside conditions").
#[derive(Debug, Clone)]
pub enum Operand {
    Column(String),
    Value(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum Condition {
    Compare { field: String, op: CompareOp, rhs: Operand },
    Between { field: String, low: Operand, high: Operand },
    Like { field: String, pattern: String },
    In { field: String, subquery: Box<Query> },
    NotIn { field: String, subquery: Box<Query> },
    Not(Box<Condition>),
    /// A parenthesised group; `or` only appears inside one of these (spec
    /// §4.6: "`or` appears only inside parenthesised groups").
    Group(Box<Condition>, BoolOp, Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct OrderField {
    pub field: String,
    pub dir: OrderDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggFunc {
    #[must_use]
    pub fn to_sql(self, column: &str) -> String {
        match self {
            Self::Count => format!("COUNT({column})"),
            Self::CountDistinct => format!("COUNT(DISTINCT {column})"),
            Self::Sum => format!("SUM({column})"),
            Self::Avg => format!("AVG({column})"),
            Self::Max => format!("MAX({column})"),
            Self::Min => format!("MIN({column})"),
        }
    }
}

/// `name: agg(x)` (spec §4.6): emits into the projection and may be
/// referenced by a later `| name > K` clause, rendered as `HAVING`.
#[derive(Debug, Clone)]
pub struct AggAssign {
    pub alias: String,
    pub func: AggFunc,
    pub column: String,
}

/// `with relPath [(subclauses)]` (spec §4.6). `path` is the dotted relation
/// chain (`a.b.c`); `clauses` are applied to the relation's own query.
#[derive(Debug, Clone)]
pub struct RelationLoad {
    pub path: Vec<String>,
    pub clauses: Vec<Clause>,
}

/// `binding as b | field <- other | … | row-of-b-ref ?-> count` (spec §4.6):
/// a scalar correlated subquery, projected as one column of the enclosing
/// query. `query.alias` carries the subquery's own FROM alias (`b`); its
/// conditions reach back into the enclosing query's columns the same way
/// hand-written correlated SQL does — a qualified [`Operand::Column`] such
/// as `b.customerId` compared against `Customers.id`. No new condition
/// shape is needed: correlation is just a `Condition::Compare` whose
/// right-hand side happens to name a column from the outer scope.
#[derive(Debug, Clone)]
pub struct CorrelatedSubquery {
    pub column_alias: String,
    pub query: Box<Query>,
}

#[derive(Debug, Clone)]
pub enum Clause {
    Cond(Condition),
    Order(Vec<OrderField>),
    Limit(u64),
    GroupBy(Vec<String>),
    Agg(AggAssign),
    With(RelationLoad),
    Correlated(CorrelatedSubquery),
}

#[derive(Debug, Clone)]
pub enum Projection {
    Star,
    Columns(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum Terminal {
    /// `?-> projection`: single row.
    One(Projection),
    /// `??-> projection`: many rows.
    Many(Projection),
    /// `.-> count`.
    Count,
    /// `.-> exists`.
    Exists,
    /// `.`: no return value.
    None,
}

/// `binding [alias] (pipe clause)* terminal`, plus the CTE form (`binding
/// as name` blocks preceding the final binding).
#[derive(Debug, Clone)]
pub struct Query {
    pub binding: String,
    pub alias: Option<String>,
    pub ctes: Vec<(String, Box<Query>)>,
    pub clauses: Vec<Clause>,
    pub terminal: Terminal,
}

impl Query {
    #[must_use]
    pub fn new(binding: impl Into<String>, terminal: Terminal) -> Self {
        Self {
            binding: binding.into(),
            alias: None,
            ctes: Vec::new(),
            clauses: Vec::new(),
            terminal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub field: String,
    pub value: Operand,
}

/// `@insert(B |< f: v ... [| update on key] terminal)` (spec §4.6). The
/// batch form (`* each arr as x |< ...`) is represented as multiple `rows`.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    pub binding: String,
    pub rows: Vec<Vec<Assignment>>,
    pub update_on_key: Option<String>,
    pub terminal: Terminal,
}

#[derive(Debug, Clone)]
pub struct UpdateQuery {
    pub binding: String,
    pub conditions: Vec<Condition>,
    pub assignments: Vec<Assignment>,
    pub terminal: Terminal,
}

#[derive(Debug, Clone)]
pub struct DeleteQuery {
    pub binding: String,
    pub conditions: Vec<Condition>,
    pub terminal: Terminal,
}

/// `@transaction { stmts }` (spec §4.6): a sequence of the other statement
/// kinds, executed in source order within one connection transaction.
#[derive(Debug, Clone)]
pub enum Statement {
    Select(Query),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub statements: Vec<Statement>,
}
