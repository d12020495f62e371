//! The host-language AST (spec §4.1): the shape the lexer/parser collaborator
//! builds and the [`crate::evaluator::Evaluator`] walks. Lexing and parsing
//! themselves are out of scope here; this module defines only the node
//! types a parser would construct and hands them to the evaluator through
//! [`parsley_core::value::function::AstNode`].

use std::fmt;
use std::rc::Rc;

use parsley_core::environment::Environment;
use parsley_core::value::function::{AstNode, Evaluate};
use parsley_core::value::Value;
use parsley_core::ErrorValue;

use crate::dsl::DslStatement;
use crate::io_ops::IoOp;

/// A function body implemented in Rust rather than walked from source (spec
/// §4.7: `@std/api`'s auth wrappers need to call back into the evaluator to
/// invoke the handler they wrap, which a plain `Builtin` can't do since its
/// `func` has no evaluator/environment parameter). Mirrors the
/// `Rc<dyn Fn(&Environment, &dyn Evaluate) -> Result<_, ErrorValue>>` shape
/// `dsl.rs` already uses for builder closures.
pub type NativeFn = Rc<dyn Fn(&[Value], &Environment, &dyn Evaluate) -> Result<Value, ErrorValue>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// One `key: value` dict-literal entry (spec §9: dict entries are stored as
/// expressions, materialised lazily).
#[derive(Debug, Clone)]
pub struct DictEntry {
    pub key: String,
    pub value: Rc<Expr>,
}

/// `<Name attr=expr @record=...>children</Name>` (spec §4.2, §4.3). A tag
/// whose `name` starts uppercase is a component reference; lowercase is raw
/// HTML (decided at evaluation time by [`parsley_template::tag::is_component_tag`]).
#[derive(Debug, Clone)]
pub struct TagNode {
    pub name: String,
    pub attrs: Vec<(String, Rc<Expr>)>,
    pub bool_attrs: Vec<(String, bool)>,
    pub children: Vec<Rc<Expr>>,
    /// `@record={expr}`: pushes a form-binding record while rendering children.
    pub record_attr: Option<Rc<Expr>>,
    /// `@field="name"`.
    pub field_attr: Option<String>,
    /// `@tag="span"`: swaps the rendered element name for `<Label>`.
    pub tag_attr: Option<String>,
    /// `@key="help"`: the metadata key for `<Meta>`.
    pub key_attr: Option<String>,
}

/// The facade's node kind set (spec §4.1): one variant per evaluator rule.
pub enum Expr {
    Literal(Value),
    Identifier(String),
    ArrayLit(Vec<Rc<Expr>>),
    DictLit(Vec<DictEntry>),
    Let { name: String, value: Rc<Expr> },
    LetDestructure { fields: Vec<String>, value: Rc<Expr> },
    Assign { name: String, value: Rc<Expr> },
    If { cond: Rc<Expr>, then_branch: Rc<Expr>, else_branch: Option<Rc<Expr>> },
    While { cond: Rc<Expr>, body: Rc<Expr> },
    ForIn { var: String, iterable: Rc<Expr>, body: Rc<Expr> },
    ForRange { var: String, start: Rc<Expr>, end: Rc<Expr>, inclusive: bool, body: Rc<Expr> },
    Block(Vec<Rc<Expr>>),
    FunctionLit { name: Option<String>, params: Vec<String>, body: Rc<Expr> },
    Call { callee: Rc<Expr>, args: Vec<Rc<Expr>> },
    MethodCall { receiver: Rc<Expr>, method: String, args: Vec<Rc<Expr>> },
    Index { receiver: Rc<Expr>, index: Rc<Expr> },
    Binary { op: BinOp, left: Rc<Expr>, right: Rc<Expr> },
    Unary { op: UnOp, operand: Rc<Expr> },
    Tag(TagNode),
    Dsl(Rc<DslStatement>),
    IoOp(IoOp),
    /// `import @std/<name>` (spec §4.7).
    Import(String),
    /// A function body backed by Rust, not source (see [`NativeFn`]). Never
    /// produced by a parser; only the evaluator constructs these, to wrap
    /// `@std/api` handlers.
    Native(NativeFn),
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Literal(v) => return write!(f, "Literal({v:?})"),
            Self::Identifier(name) => return write!(f, "Identifier({name:?})"),
            Self::ArrayLit(_) => "ArrayLit",
            Self::DictLit(_) => "DictLit",
            Self::Let { name, .. } => return write!(f, "Let({name:?})"),
            Self::LetDestructure { fields, .. } => return write!(f, "LetDestructure({fields:?})"),
            Self::Assign { name, .. } => return write!(f, "Assign({name:?})"),
            Self::If { .. } => "If",
            Self::While { .. } => "While",
            Self::ForIn { .. } => "ForIn",
            Self::ForRange { .. } => "ForRange",
            Self::Block(_) => "Block",
            Self::FunctionLit { name, .. } => return write!(f, "FunctionLit({name:?})"),
            Self::Call { .. } => "Call",
            Self::MethodCall { method, .. } => return write!(f, "MethodCall({method:?})"),
            Self::Index { .. } => "Index",
            Self::Binary { op, .. } => return write!(f, "Binary({op:?})"),
            Self::Unary { op, .. } => return write!(f, "Unary({op:?})"),
            Self::Tag(tag) => return write!(f, "Tag({:?})", tag.name),
            Self::Dsl(_) => "Dsl",
            Self::IoOp(_) => "IoOp",
            Self::Import(path) => return write!(f, "Import({path:?})"),
            Self::Native(_) => "Native",
        };
        f.write_str(variant)
    }
}

impl AstNode for Expr {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Builds `Rc<Expr>` leaves; a small convenience so hand-built fixtures
/// (tests, and the out-of-scope parser) don't repeat `Rc::new` everywhere.
impl Expr {
    #[must_use]
    pub fn rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    #[must_use]
    pub fn literal(value: Value) -> Rc<Self> {
        Self::Literal(value).rc()
    }

    #[must_use]
    pub fn ident(name: impl Into<String>) -> Rc<Self> {
        Self::Identifier(name.into()).rc()
    }
}

/// "cannot call X as a function" (spec §4.1) with the two hint variants the
/// spec names by name.
pub fn not_callable_error(value_type: &str, was_null: bool) -> ErrorValue {
    let err = ErrorValue::type_error("TYPE-0001", format!("cannot call {value_type} as a function"));
    if was_null {
        err.with_hint("null may not be exported")
    } else {
        err.with_hint("components must be functions")
    }
}
