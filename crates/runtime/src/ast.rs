//! Abstract syntax tree consumed by the evaluator
//!
//! Nodes are plain data produced by a parser (or by the factory functions
//! in [`crate::builder`]). Every expression and statement carries the
//! `LinePragma` used to locate runtime errors.

use std::rc::Rc;
use tarn_core::LinePragma;

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
}

/// Whether a unary operator precedes or follows its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Postfix,
}

/// Expression node
#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExprKind,
    pub pragma: LinePragma,
}

/// Expression variants
#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),

    /// Variable reference
    Variable(String),

    This,

    /// Bare `super`; only valid as a member/index target or a constructor call
    Super,

    /// `target.name`
    Member {
        target: Box<Expression>,
        name: String,
    },

    /// `target[arguments]`
    Index {
        target: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// `callee(arguments)`
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// `new class(arguments)`
    New {
        class: Box<Expression>,
        arguments: Vec<Expression>,
    },

    Unary {
        op: String,
        fixity: Fixity,
        operand: Box<Expression>,
    },

    /// Binary operation; assignment is the `=` operator
    Binary {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Ternary operation keyed by both symbols joined by a space (`"? :"`)
    Ternary {
        op: String,
        first: Box<Expression>,
        second: Box<Expression>,
        third: Box<Expression>,
    },

    /// Array literal; also a destructuring pattern on the left of `=`
    Array(Vec<Expression>),

    /// Object literal
    Object(Vec<(String, Expression)>),

    /// Function expression
    Function(Rc<FunctionDecl>),

    /// Class expression
    Class(Rc<ClassDecl>),
}

/// Statement node
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StmtKind,
    pub pragma: LinePragma,
}

/// One `name = initializer` of a `var` statement
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: String,
    pub initializer: Option<Expression>,
}

/// `case test: body`
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub test: Expression,
    pub body: Vec<Statement>,
}

/// Statement variants
#[derive(Debug, Clone)]
pub enum StmtKind {
    Expression(Expression),
    Var(Vec<VarDeclarator>),
    Function(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
    Block(Vec<Statement>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    For {
        init: Vec<Statement>,
        condition: Option<Expression>,
        increment: Vec<Expression>,
        body: Box<Statement>,
    },
    Switch {
        discriminant: Expression,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Statement>>,
    },
    Label(String),
    Goto(String),
    Break,
    Continue,
    Return(Option<Expression>),
    Empty,
}

impl Statement {
    /// Arguments of a `super(...)` call if this is one
    pub fn super_call(&self) -> Option<&[Expression]> {
        let StmtKind::Expression(expr) = &self.kind else {
            return None;
        };
        match &expr.kind {
            ExprKind::Call { callee, arguments } if matches!(callee.kind, ExprKind::Super) => {
                Some(arguments)
            }
            _ => None,
        }
    }
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,

    /// Missing arguments bind `null` instead of failing
    pub optional: bool,

    /// Evaluated in the callee scope when the argument is missing
    pub default: Option<Expression>,
}

/// Function, method or accessor body
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub pragma: LinePragma,
}

impl FunctionDecl {
    /// Name used in error messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// Parameters that must be supplied by the caller
    pub fn required_parameters(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.optional && p.default.is_none())
            .count()
    }
}

/// Member access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Property accessor
#[derive(Debug, Clone)]
pub enum AccessorBody {
    /// `get;` / `set;` backed by a hidden field
    Auto,
    Body(Rc<FunctionDecl>),
}

/// Class member declaration
#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub kind: MemberKind,
    pub pragma: LinePragma,
}

/// Member declaration variants
#[derive(Debug, Clone)]
pub enum MemberKind {
    Field {
        initializer: Option<Expression>,
    },
    Method(Rc<FunctionDecl>),
    Constructor(Rc<FunctionDecl>),
    Property {
        getter: Option<AccessorBody>,
        setter: Option<AccessorBody>,
        initializer: Option<Expression>,
    },
    /// Getter takes the index parameters; setter takes them plus the value
    Indexer {
        getter: Option<Rc<FunctionDecl>>,
        setter: Option<Rc<FunctionDecl>>,
    },
}

/// Class declaration
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Option<Expression>,
    pub members: Vec<MemberDecl>,
    pub pragma: LinePragma,
}
