//! Statement execution
//!
//! Non-local control flow travels as an `ExecuteResult`. Each construct
//! hands the results of its body to `BlockFlow::absorb`, which decides
//! whether the construct keeps going or finishes with a result.

use crate::ast::{Statement, StmtKind, SwitchCase, Expression};
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::memory::BindingKind;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use std::collections::HashMap;

/// Outcome of executing a statement or statement sequence
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResult {
    Next,
    Break,
    Continue,
    Return(Value),
    Goto(String),
}

/// Kind of a block context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFlow {
    Plain,
    /// One loop iteration
    Loop,
    /// One switch case
    Switch,
}

/// What a construct does with a result of its body
#[derive(Debug, Clone, PartialEq)]
pub enum Absorbed {
    /// Keep going
    Proceed,
    /// Stop and report the result
    Exit(ExecuteResult),
}

impl BlockFlow {
    pub fn permits_break(self) -> bool {
        matches!(self, BlockFlow::Loop | BlockFlow::Switch)
    }

    pub fn permits_continue(self) -> bool {
        matches!(self, BlockFlow::Loop)
    }

    pub fn absorb(self, result: ExecuteResult) -> Absorbed {
        match (self, result) {
            (_, ExecuteResult::Next) => Absorbed::Proceed,
            (BlockFlow::Loop, ExecuteResult::Continue) => Absorbed::Proceed,
            (BlockFlow::Loop | BlockFlow::Switch, ExecuteResult::Break) => {
                Absorbed::Exit(ExecuteResult::Next)
            }
            (_, other) => Absorbed::Exit(other),
        }
    }
}

impl RuntimeContext {
    /// Hoist the declarations and labels of `statements`, then run them in order
    pub fn execute_sequence(&self, statements: &[Statement]) -> Result<ExecuteResult> {
        let labels = self.hoist_declarations(statements)?;

        let mut index = 0;
        while let Some(statement) = statements.get(index) {
            self.runtime().check_cancelled()?;
            match self.execute(statement)? {
                ExecuteResult::Next => index += 1,
                ExecuteResult::Goto(label) => match labels.get(&label) {
                    Some(&target) => index = target,
                    None => return Ok(ExecuteResult::Goto(label)),
                },
                other => return Ok(other),
            }
        }
        Ok(ExecuteResult::Next)
    }

    /// Reserve every name declared by `statements`; returns label positions
    fn hoist_declarations(&self, statements: &[Statement]) -> Result<HashMap<String, usize>> {
        let mut labels = HashMap::new();

        for (index, statement) in statements.iter().enumerate() {
            let hoisted = match &statement.kind {
                StmtKind::Var(declarators) => declarators
                    .iter()
                    .try_for_each(|d| self.hoist(&d.name, BindingKind::Variable)),
                StmtKind::Function(decl) => match &decl.name {
                    Some(name) => self.hoist(name, BindingKind::Function),
                    None => Ok(()),
                },
                StmtKind::Class(decl) => self.hoist(&decl.name, BindingKind::Class),
                StmtKind::Label(label) => {
                    labels.insert(label.clone(), index);
                    self.declare_label(label)
                }
                _ => Ok(()),
            };
            hoisted.map_err(|e| e.at(statement.pragma))?;
        }

        Ok(labels)
    }

    /// Run one statement; failures are located at the statement
    pub fn execute(&self, statement: &Statement) -> Result<ExecuteResult> {
        if self.runtime().config().trace_statements {
            tracing::trace!(pragma = %statement.pragma, "execute");
        }
        ensure_sufficient_stack(|| self.execute_kind(statement))
            .map_err(|e| e.at(statement.pragma))
    }

    fn execute_kind(&self, statement: &Statement) -> Result<ExecuteResult> {
        let objects = self.runtime().objects();

        match &statement.kind {
            StmtKind::Expression(expression) => {
                self.evaluate(expression)?;
                Ok(ExecuteResult::Next)
            }
            StmtKind::Var(declarators) => {
                for declarator in declarators {
                    let value = match &declarator.initializer {
                        Some(initializer) => self.evaluate(initializer)?,
                        None => objects.null(),
                    };
                    self.declare(&declarator.name, BindingKind::Variable, value)?;
                }
                Ok(ExecuteResult::Next)
            }
            StmtKind::Function(decl) => {
                if let Some(name) = &decl.name {
                    let function = objects.function(decl.clone(), self.clone());
                    self.declare(name, BindingKind::Function, function)?;
                }
                Ok(ExecuteResult::Next)
            }
            StmtKind::Class(decl) => {
                let id = self.create_class(decl)?;
                self.declare(&decl.name, BindingKind::Class, objects.class(id))?;
                Ok(ExecuteResult::Next)
            }
            StmtKind::Block(statements) => {
                self.block(BlockFlow::Plain).execute_sequence(statements)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ExecuteResult::Next)
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Absorbed::Exit(result) = self.iterate(body)? {
                        return Ok(result);
                    }
                }
                Ok(ExecuteResult::Next)
            }
            StmtKind::DoWhile { body, condition } => {
                loop {
                    if let Absorbed::Exit(result) = self.iterate(body)? {
                        return Ok(result);
                    }
                    if !self.evaluate(condition)?.is_truthy() {
                        return Ok(ExecuteResult::Next);
                    }
                }
            }
            StmtKind::For {
                init,
                condition,
                increment,
                body,
            } => self.execute_for(init, condition.as_ref(), increment, body),
            StmtKind::Switch {
                discriminant,
                cases,
                default,
            } => self.execute_switch(discriminant, cases, default.as_deref()),
            StmtKind::Label(_) | StmtKind::Empty => Ok(ExecuteResult::Next),
            StmtKind::Goto(label) => {
                if self.can_goto(label) {
                    Ok(ExecuteResult::Goto(label.clone()))
                } else {
                    Err(ScriptError::LabelNotFound(label.clone()))
                }
            }
            StmtKind::Break => {
                if self.can_break() {
                    Ok(ExecuteResult::Break)
                } else {
                    Err(ScriptError::MisplacedBreak)
                }
            }
            StmtKind::Continue => {
                if self.can_continue() {
                    Ok(ExecuteResult::Continue)
                } else {
                    Err(ScriptError::MisplacedContinue)
                }
            }
            StmtKind::Return(value) => {
                if !self.can_return() {
                    return Err(ScriptError::MisplacedReturn);
                }
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => objects.null(),
                };
                Ok(ExecuteResult::Return(value))
            }
        }
    }

    /// Run one loop iteration in a fresh context
    fn iterate(&self, body: &Statement) -> Result<Absorbed> {
        self.runtime().check_cancelled()?;
        let iteration = self.block(BlockFlow::Loop);
        let result = match &body.kind {
            StmtKind::Block(statements) => iteration.execute_sequence(statements)?,
            _ => iteration.execute(body)?,
        };
        Ok(BlockFlow::Loop.absorb(result))
    }

    fn execute_for(
        &self,
        init: &[Statement],
        condition: Option<&Expression>,
        increment: &[Expression],
        body: &Statement,
    ) -> Result<ExecuteResult> {
        // Loop variables live here, shared by every iteration
        let outer = self.block(BlockFlow::Plain);
        match outer.execute_sequence(init)? {
            ExecuteResult::Next => {}
            other => return Ok(other),
        }

        loop {
            if let Some(condition) = condition {
                if !outer.evaluate(condition)?.is_truthy() {
                    return Ok(ExecuteResult::Next);
                }
            }
            if let Absorbed::Exit(result) = outer.iterate(body)? {
                return Ok(result);
            }
            for expression in increment {
                outer.evaluate(expression)?;
            }
        }
    }

    /// Cases run from the first match until a `break`; the default clause
    /// runs when no case matched or a matched case fell through to the end
    fn execute_switch(
        &self,
        discriminant: &Expression,
        cases: &[SwitchCase],
        default: Option<&[Statement]>,
    ) -> Result<ExecuteResult> {
        let value = self.evaluate(discriminant)?;
        let mut matched = false;

        for case in cases {
            if !matched {
                matched = self.evaluate(&case.test)?.strict_equals(&value);
            }
            if matched {
                let result = self.block(BlockFlow::Switch).execute_sequence(&case.body)?;
                if let Absorbed::Exit(result) = BlockFlow::Switch.absorb(result) {
                    return Ok(result);
                }
            }
        }

        if let Some(default) = default {
            let result = self.block(BlockFlow::Switch).execute_sequence(default)?;
            if let Absorbed::Exit(result) = BlockFlow::Switch.absorb(result) {
                return Ok(result);
            }
        }
        Ok(ExecuteResult::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::interpreter::Interpreter;
    use crate::test_support::init_logging;
    use tarn_config::InterpreterConfig;
    use tarn_core::LinePragma;

    fn run(statements: Vec<Statement>) -> Result<Value> {
        init_logging();
        Interpreter::new().unwrap().run(&statements)
    }

    fn text(value: &str) -> Value {
        Value::string(value)
    }

    #[test]
    fn test_absorb_table() {
        use ExecuteResult::*;
        assert_eq!(BlockFlow::Loop.absorb(Continue), Absorbed::Proceed);
        assert_eq!(BlockFlow::Loop.absorb(Break), Absorbed::Exit(Next));
        assert_eq!(BlockFlow::Switch.absorb(Break), Absorbed::Exit(Next));
        assert_eq!(BlockFlow::Switch.absorb(Continue), Absorbed::Exit(Continue));
        assert_eq!(BlockFlow::Plain.absorb(Break), Absorbed::Exit(Break));
        assert_eq!(
            BlockFlow::Loop.absorb(Goto("l".into())),
            Absorbed::Exit(Goto("l".into()))
        );
        assert_eq!(BlockFlow::Plain.absorb(Next), Absorbed::Proceed);
    }

    #[test]
    fn test_function_body_result() {
        let result = run(vec![
            function_decl(
                "f",
                vec![],
                vec![
                    var("x", Some(number(1.0))),
                    expr(binary("+=", ident("x"), number(2.0))),
                    return_stmt(Some(ident("x"))),
                ],
            ),
            return_stmt(Some(call(ident("f"), vec![]))),
        ]);
        assert_eq!(result.unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_hoisted_name_before_declaration() {
        let err = run(vec![
            expr(ident("x").at(2, 5)).at(2, 1),
            var("x", Some(number(1.0))),
        ])
        .unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::Unassigned("x".into()));
        assert_eq!(err.to_string(), "<2,5> : 'x' is used before its declaration");

        let err = run(vec![expr(ident("y"))]).unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::Undefined("y".into()));
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = run(vec![
            var("x", None),
            function_decl("x", vec![], vec![]).at(2, 1),
        ])
        .unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::AlreadyDeclared("x".into()));
        assert_eq!(err.pragma(), Some(LinePragma::new(2, 1)));
    }

    #[test]
    fn test_inner_block_may_shadow() {
        let result = run(vec![
            var("x", Some(number(1.0))),
            block(vec![var("x", Some(number(2.0)))]),
            return_stmt(Some(ident("x"))),
        ]);
        assert_eq!(result.unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_break_skips_final_increment() {
        // for (var i = 0;; i = i + 1, steps++) { if (i == 2) break; }
        let result = run(vec![
            var("steps", Some(number(0.0))),
            for_loop(
                vec![var("i", Some(number(0.0)))],
                None,
                vec![
                    assign(ident("i"), binary("+", ident("i"), number(1.0))),
                    postfix("++", ident("steps")),
                ],
                block(vec![if_then(
                    binary("==", ident("i"), number(2.0)),
                    break_stmt(),
                )]),
            ),
            return_stmt(Some(ident("steps"))),
        ]);
        assert_eq!(result.unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_while_continue() {
        let result = run(vec![
            var("i", Some(number(0.0))),
            var("sum", Some(number(0.0))),
            while_loop(
                binary("<", ident("i"), number(10.0)),
                block(vec![
                    expr(postfix("++", ident("i"))),
                    if_then(
                        binary("==", binary("%", ident("i"), number(2.0)), number(0.0)),
                        continue_stmt(),
                    ),
                    expr(binary("+=", ident("sum"), ident("i"))),
                ]),
            ),
            return_stmt(Some(ident("sum"))),
        ]);
        assert_eq!(result.unwrap(), Value::Number(25.0));
    }

    #[test]
    fn test_do_while_runs_once() {
        let result = run(vec![
            var("n", Some(number(0.0))),
            do_while(block(vec![expr(postfix("++", ident("n")))]), boolean(false)),
            return_stmt(Some(ident("n"))),
        ]);
        assert_eq!(result.unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_iterations_get_fresh_scopes() {
        // each closure sees the `j` of its own iteration
        let result = run(vec![
            var("fns", Some(array(vec![]))),
            for_loop(
                vec![var("i", Some(number(0.0)))],
                Some(binary("<", ident("i"), number(3.0))),
                vec![postfix("++", ident("i"))],
                block(vec![
                    var("j", Some(ident("i"))),
                    expr(assign(
                        index(ident("fns"), vec![ident("i")]),
                        function_expr(function(None, vec![], vec![return_stmt(Some(ident("j")))])),
                    )),
                ]),
            ),
            return_stmt(Some(array(vec![
                call(index(ident("fns"), vec![number(0.0)]), vec![]),
                call(index(ident("fns"), vec![number(2.0)]), vec![]),
            ]))),
        ]);
        assert_eq!(result.unwrap().to_string(), "[0, 2]");
    }

    fn switch_log(discriminant: f64, break_after_first: bool) -> Value {
        let mut first = vec![expr(binary("+=", ident("log"), string("a")))];
        if break_after_first {
            first.push(break_stmt());
        }
        run(vec![
            var("log", Some(string(""))),
            switch(
                number(discriminant),
                vec![
                    case(number(1.0), first),
                    case(
                        number(2.0),
                        vec![expr(binary("+=", ident("log"), string("b"))), break_stmt()],
                    ),
                    case(number(3.0), vec![expr(binary("+=", ident("log"), string("c")))]),
                ],
                Some(vec![expr(binary("+=", ident("log"), string("d")))]),
            ),
            return_stmt(Some(ident("log"))),
        ])
        .unwrap()
    }

    #[test]
    fn test_switch_fallthrough() {
        assert_eq!(switch_log(1.0, false), text("ab"));
        assert_eq!(switch_log(1.0, true), text("a"));
        assert_eq!(switch_log(2.0, false), text("b"));
    }

    #[test]
    fn test_switch_default() {
        // nothing matched
        assert_eq!(switch_log(9.0, false), text("d"));
        // the last case falls through into the default clause
        assert_eq!(switch_log(3.0, false), text("cd"));
    }

    #[test]
    fn test_misplaced_control_flow() {
        let err = run(vec![break_stmt().at(4, 3)]).unwrap_err();
        assert_eq!(err.to_string(), "<4,3> : 'break' outside of a loop or switch");

        let err = run(vec![switch(
            number(1.0),
            vec![case(number(1.0), vec![continue_stmt()])],
            None,
        )])
        .unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::MisplacedContinue);
    }

    #[test]
    fn test_break_does_not_cross_functions() {
        let err = run(vec![while_loop(
            boolean(true),
            block(vec![
                function_decl("f", vec![], vec![break_stmt()]),
                expr(call(ident("f"), vec![])),
            ]),
        )])
        .unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::MisplacedBreak);
    }

    #[test]
    fn test_top_level_return_can_be_disabled() {
        let config = InterpreterConfig {
            top_level_return: false,
            ..InterpreterConfig::default()
        };
        let interpreter = Interpreter::with_config(config).unwrap();
        let err = interpreter
            .run(&[return_stmt(Some(number(1.0)))])
            .unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::MisplacedReturn);
    }

    #[test]
    fn test_goto_backward() {
        let result = run(vec![
            var("n", Some(number(0.0))),
            label("top"),
            expr(postfix("++", ident("n"))),
            if_then(binary("<", ident("n"), number(5.0)), goto("top")),
            return_stmt(Some(ident("n"))),
        ]);
        assert_eq!(result.unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_goto_escapes_to_enclosing_block() {
        let result = run(vec![
            var("log", Some(string(""))),
            block(vec![
                expr(binary("+=", ident("log"), string("a"))),
                goto("done"),
                expr(binary("+=", ident("log"), string("b"))),
            ]),
            expr(binary("+=", ident("log"), string("c"))),
            label("done"),
            return_stmt(Some(ident("log"))),
        ]);
        assert_eq!(result.unwrap(), text("a"));
    }

    #[test]
    fn test_goto_errors() {
        let err = run(vec![goto("nowhere")]).unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::LabelNotFound("nowhere".into()));

        let err = run(vec![label("a"), label("a")]).unwrap_err();
        assert_eq!(err.root_cause(), &ScriptError::DuplicateLabel("a".into()));
    }

    #[test]
    fn test_cancellation_stops_endless_loop() {
        init_logging();
        let interpreter = Interpreter::new().unwrap();
        let token = interpreter.cancellation_token();
        interpreter
            .define_native_function("stop", Some(0), move |_| {
                token.cancel();
                Ok(Value::Null)
            })
            .unwrap();

        let err = interpreter
            .run(&[while_loop(
                boolean(true),
                block(vec![expr(call(ident("stop"), vec![]))]),
            )])
            .unwrap_err();
        assert_eq!(err, ScriptError::Cancelled);
    }

    #[test]
    fn test_cancellation_check_can_be_disabled() {
        let config = InterpreterConfig {
            check_cancellation: false,
            ..InterpreterConfig::default()
        };
        let interpreter = Interpreter::with_config(config).unwrap();
        interpreter.cancellation_token().cancel();
        let result = interpreter.run(&[return_stmt(Some(number(1.0)))]);
        assert_eq!(result.unwrap(), Value::Number(1.0));
    }
}
