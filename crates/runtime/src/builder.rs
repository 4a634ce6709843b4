//! Factory functions for assembling syntax trees
//!
//! Nodes start at `LinePragma::START`; use [`Expression::at`] and
//! [`Statement::at`] to attach a source position.

use crate::ast::*;
use std::rc::Rc;
use tarn_core::LinePragma;

impl Expression {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            pragma: LinePragma::START,
        }
    }

    /// Same node at `line`, `column`
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.pragma = LinePragma::new(line, column);
        self
    }
}

impl Statement {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            pragma: LinePragma::START,
        }
    }

    /// Same node at `line`, `column`
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.pragma = LinePragma::new(line, column);
        self
    }
}

// Expressions

pub fn null() -> Expression {
    Expression::new(ExprKind::Literal(Literal::Null))
}

pub fn boolean(value: bool) -> Expression {
    Expression::new(ExprKind::Literal(Literal::Bool(value)))
}

pub fn number(value: f64) -> Expression {
    Expression::new(ExprKind::Literal(Literal::Number(value)))
}

pub fn string(value: &str) -> Expression {
    Expression::new(ExprKind::Literal(Literal::String(value.into())))
}

pub fn ident(name: &str) -> Expression {
    Expression::new(ExprKind::Variable(name.into()))
}

pub fn this() -> Expression {
    Expression::new(ExprKind::This)
}

pub fn super_ref() -> Expression {
    Expression::new(ExprKind::Super)
}

pub fn member(target: Expression, name: &str) -> Expression {
    Expression::new(ExprKind::Member {
        target: Box::new(target),
        name: name.into(),
    })
}

pub fn index(target: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::new(ExprKind::Index {
        target: Box::new(target),
        arguments,
    })
}

pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::new(ExprKind::Call {
        callee: Box::new(callee),
        arguments,
    })
}

/// `target.name(arguments)`
pub fn call_method(target: Expression, name: &str, arguments: Vec<Expression>) -> Expression {
    call(member(target, name), arguments)
}

pub fn new_instance(class: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::new(ExprKind::New {
        class: Box::new(class),
        arguments,
    })
}

pub fn prefix(op: &str, operand: Expression) -> Expression {
    Expression::new(ExprKind::Unary {
        op: op.into(),
        fixity: Fixity::Prefix,
        operand: Box::new(operand),
    })
}

pub fn postfix(op: &str, operand: Expression) -> Expression {
    Expression::new(ExprKind::Unary {
        op: op.into(),
        fixity: Fixity::Postfix,
        operand: Box::new(operand),
    })
}

pub fn binary(op: &str, left: Expression, right: Expression) -> Expression {
    Expression::new(ExprKind::Binary {
        op: op.into(),
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn assign(target: Expression, value: Expression) -> Expression {
    binary("=", target, value)
}

/// `condition ? then : otherwise`
pub fn ternary(condition: Expression, then: Expression, otherwise: Expression) -> Expression {
    Expression::new(ExprKind::Ternary {
        op: "? :".into(),
        first: Box::new(condition),
        second: Box::new(then),
        third: Box::new(otherwise),
    })
}

pub fn array(items: Vec<Expression>) -> Expression {
    Expression::new(ExprKind::Array(items))
}

pub fn object(properties: Vec<(&str, Expression)>) -> Expression {
    Expression::new(ExprKind::Object(
        properties
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    ))
}

pub fn function_expr(decl: Rc<FunctionDecl>) -> Expression {
    Expression::new(ExprKind::Function(decl))
}

pub fn class_expr(decl: Rc<ClassDecl>) -> Expression {
    Expression::new(ExprKind::Class(decl))
}

// Functions

pub fn param(name: &str) -> Parameter {
    Parameter {
        name: name.into(),
        optional: false,
        default: None,
    }
}

pub fn optional_param(name: &str) -> Parameter {
    Parameter {
        optional: true,
        ..param(name)
    }
}

pub fn default_param(name: &str, default: Expression) -> Parameter {
    Parameter {
        default: Some(default),
        ..param(name)
    }
}

pub fn function(name: Option<&str>, parameters: Vec<Parameter>, body: Vec<Statement>) -> Rc<FunctionDecl> {
    Rc::new(FunctionDecl {
        name: name.map(str::to_string),
        parameters,
        body,
        pragma: LinePragma::START,
    })
}

// Statements

pub fn expr(expression: Expression) -> Statement {
    Statement::new(StmtKind::Expression(expression))
}

pub fn var(name: &str, initializer: Option<Expression>) -> Statement {
    Statement::new(StmtKind::Var(vec![VarDeclarator {
        name: name.into(),
        initializer,
    }]))
}

pub fn function_decl(name: &str, parameters: Vec<Parameter>, body: Vec<Statement>) -> Statement {
    Statement::new(StmtKind::Function(function(Some(name), parameters, body)))
}

pub fn class_decl(decl: Rc<ClassDecl>) -> Statement {
    Statement::new(StmtKind::Class(decl))
}

pub fn block(statements: Vec<Statement>) -> Statement {
    Statement::new(StmtKind::Block(statements))
}

pub fn if_then(condition: Expression, then_branch: Statement) -> Statement {
    Statement::new(StmtKind::If {
        condition,
        then_branch: Box::new(then_branch),
        else_branch: None,
    })
}

pub fn if_else(condition: Expression, then_branch: Statement, else_branch: Statement) -> Statement {
    Statement::new(StmtKind::If {
        condition,
        then_branch: Box::new(then_branch),
        else_branch: Some(Box::new(else_branch)),
    })
}

pub fn while_loop(condition: Expression, body: Statement) -> Statement {
    Statement::new(StmtKind::While {
        condition,
        body: Box::new(body),
    })
}

pub fn do_while(body: Statement, condition: Expression) -> Statement {
    Statement::new(StmtKind::DoWhile {
        body: Box::new(body),
        condition,
    })
}

pub fn for_loop(
    init: Vec<Statement>,
    condition: Option<Expression>,
    increment: Vec<Expression>,
    body: Statement,
) -> Statement {
    Statement::new(StmtKind::For {
        init,
        condition,
        increment,
        body: Box::new(body),
    })
}

pub fn case(test: Expression, body: Vec<Statement>) -> SwitchCase {
    SwitchCase { test, body }
}

pub fn switch(
    discriminant: Expression,
    cases: Vec<SwitchCase>,
    default: Option<Vec<Statement>>,
) -> Statement {
    Statement::new(StmtKind::Switch {
        discriminant,
        cases,
        default,
    })
}

pub fn label(name: &str) -> Statement {
    Statement::new(StmtKind::Label(name.into()))
}

pub fn goto(name: &str) -> Statement {
    Statement::new(StmtKind::Goto(name.into()))
}

pub fn break_stmt() -> Statement {
    Statement::new(StmtKind::Break)
}

pub fn continue_stmt() -> Statement {
    Statement::new(StmtKind::Continue)
}

pub fn return_stmt(value: Option<Expression>) -> Statement {
    Statement::new(StmtKind::Return(value))
}

pub fn empty() -> Statement {
    Statement::new(StmtKind::Empty)
}

/// Incremental class declaration
#[derive(Debug)]
pub struct ClassBuilder {
    decl: ClassDecl,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            decl: ClassDecl {
                name: name.into(),
                extends: None,
                members: Vec::new(),
                pragma: LinePragma::START,
            },
        }
    }

    pub fn extends(mut self, class: Expression) -> Self {
        self.decl.extends = Some(class);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.decl.pragma = LinePragma::new(line, column);
        self
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.decl.members.push(member);
        self
    }

    fn add(self, name: &str, visibility: Visibility, is_static: bool, kind: MemberKind) -> Self {
        self.member(MemberDecl {
            name: name.into(),
            visibility,
            is_static,
            kind,
            pragma: LinePragma::START,
        })
    }

    pub fn field(self, visibility: Visibility, name: &str, initializer: Option<Expression>) -> Self {
        self.add(name, visibility, false, MemberKind::Field { initializer })
    }

    pub fn static_field(
        self,
        visibility: Visibility,
        name: &str,
        initializer: Option<Expression>,
    ) -> Self {
        self.add(name, visibility, true, MemberKind::Field { initializer })
    }

    pub fn method(
        self,
        visibility: Visibility,
        name: &str,
        parameters: Vec<Parameter>,
        body: Vec<Statement>,
    ) -> Self {
        let decl = function(Some(name), parameters, body);
        self.add(name, visibility, false, MemberKind::Method(decl))
    }

    pub fn static_method(
        self,
        visibility: Visibility,
        name: &str,
        parameters: Vec<Parameter>,
        body: Vec<Statement>,
    ) -> Self {
        let decl = function(Some(name), parameters, body);
        self.add(name, visibility, true, MemberKind::Method(decl))
    }

    pub fn constructor(self, parameters: Vec<Parameter>, body: Vec<Statement>) -> Self {
        let decl = function(Some("constructor"), parameters, body);
        self.add("constructor", Visibility::Public, false, MemberKind::Constructor(decl))
    }

    /// Property with explicit bodies; the setter receives `value`
    pub fn property(
        self,
        visibility: Visibility,
        name: &str,
        getter: Option<Vec<Statement>>,
        setter: Option<Vec<Statement>>,
    ) -> Self {
        let getter = getter.map(|body| AccessorBody::Body(function(Some(name), vec![], body)));
        let setter = setter
            .map(|body| AccessorBody::Body(function(Some(name), vec![param("value")], body)));
        self.add(
            name,
            visibility,
            false,
            MemberKind::Property {
                getter,
                setter,
                initializer: None,
            },
        )
    }

    /// `name { get; set; } = initializer`
    pub fn auto_property(
        self,
        visibility: Visibility,
        name: &str,
        writable: bool,
        initializer: Option<Expression>,
    ) -> Self {
        let kind = MemberKind::Property {
            getter: Some(AccessorBody::Auto),
            setter: writable.then_some(AccessorBody::Auto),
            initializer,
        };
        self.add(name, visibility, false, kind)
    }

    pub fn static_auto_property(
        self,
        visibility: Visibility,
        name: &str,
        writable: bool,
        initializer: Option<Expression>,
    ) -> Self {
        let kind = MemberKind::Property {
            getter: Some(AccessorBody::Auto),
            setter: writable.then_some(AccessorBody::Auto),
            initializer,
        };
        self.add(name, visibility, true, kind)
    }

    /// Indexer over `parameters`; the setter also receives `value`
    pub fn indexer(
        self,
        visibility: Visibility,
        parameters: Vec<Parameter>,
        getter: Option<Vec<Statement>>,
        setter: Option<Vec<Statement>>,
    ) -> Self {
        let getter = getter.map(|body| function(Some("[]"), parameters.clone(), body));
        let setter = setter.map(|body| {
            let mut setter_params = parameters.clone();
            setter_params.push(param("value"));
            function(Some("[]"), setter_params, body)
        });
        self.add("[]", visibility, false, MemberKind::Indexer { getter, setter })
    }

    pub fn build(self) -> Rc<ClassDecl> {
        Rc::new(self.decl)
    }
}
