//! Interpreter façade
//!
//! Wires the pluggable services into a `Runtime`, owns the global scope and
//! exposes the entry points an embedder needs.

use crate::ast::{Expression, Statement};
use crate::builtins;
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::executor::ExecuteResult;
use crate::memory::{BindingKind, DefaultMemoryCreator, MemoryCreator};
use crate::objects::{DefaultObjectCreator, ObjectCreator};
use crate::oop::{ClassId, NativeClassBuilder};
use crate::operators::{OperatorCalculator, OperatorTable};
use crate::runtime::Runtime;
use crate::value::{Function, NativeCall, NativeFunction, Value};
use std::rc::Rc;
use tarn_config::InterpreterConfig;
use tokio_util::sync::CancellationToken;

/// Configures the services of an `Interpreter`
pub struct InterpreterBuilder {
    config: InterpreterConfig,
    objects: Box<dyn ObjectCreator>,
    operators: Box<dyn OperatorCalculator>,
    memory: Box<dyn MemoryCreator>,
    cancellation: CancellationToken,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            config: InterpreterConfig::default(),
            objects: Box::new(DefaultObjectCreator),
            operators: Box::new(OperatorTable::standard()),
            memory: Box::new(DefaultMemoryCreator),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn object_creator(mut self, objects: impl ObjectCreator + 'static) -> Self {
        self.objects = Box::new(objects);
        self
    }

    pub fn operators(mut self, operators: impl OperatorCalculator + 'static) -> Self {
        self.operators = Box::new(operators);
        self
    }

    pub fn memory_creator(mut self, memory: impl MemoryCreator + 'static) -> Self {
        self.memory = Box::new(memory);
        self
    }

    /// Token polled once per statement
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Wire the services and declare the builtins in the global scope;
    /// fails when the memory rejects a builtin declaration
    pub fn build(self) -> Result<Interpreter> {
        let runtime = Rc::new(Runtime::new(
            self.config,
            self.objects,
            self.operators,
            self.memory,
            self.cancellation,
        ));
        let global = RuntimeContext::root(Rc::clone(&runtime));

        builtins::register(&global).map_err(|e| {
            tracing::warn!(error = %e, "failed to register builtins");
            e
        })?;
        tracing::debug!(interpreter = %runtime.config().name, "interpreter created");

        Ok(Interpreter { runtime, global })
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tree-walking interpreter with one global scope
pub struct Interpreter {
    runtime: Rc<Runtime>,
    global: RuntimeContext,
}

impl Interpreter {
    /// Interpreter with default configuration and services
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn with_config(config: InterpreterConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn config(&self) -> &InterpreterConfig {
        self.runtime.config()
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// The global scope
    pub fn global(&self) -> &RuntimeContext {
        &self.global
    }

    /// Cancelling the token stops the running script before its next statement
    pub fn cancellation_token(&self) -> CancellationToken {
        self.runtime.cancellation_token().clone()
    }

    /// Execute `statements` in the global scope; yields the value of a
    /// top-level `return`, `null` otherwise
    pub fn run(&self, statements: &[Statement]) -> Result<Value> {
        tracing::debug!(
            interpreter = %self.runtime.config().name,
            statements = statements.len(),
            "running script"
        );
        match self.global.execute_sequence(statements)? {
            ExecuteResult::Return(value) => Ok(value),
            ExecuteResult::Goto(label) => Err(ScriptError::LabelNotFound(label)),
            _ => Ok(Value::Null),
        }
    }

    /// Evaluate `expression` in the global scope
    pub fn evaluate(&self, expression: &Expression) -> Result<Value> {
        self.global.evaluate(expression)
    }

    pub fn call(&self, function: &Value, args: Vec<Value>) -> Result<Value> {
        self.global.call_value(function, args)
    }

    /// Call the global function `name`
    pub fn call_global(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let function = self.global.lookup(name)?;
        self.call(&function, args)
    }

    pub fn construct(&self, class: ClassId, args: Vec<Value>) -> Result<Value> {
        self.global.construct(class, args)
    }

    pub fn get_global(&self, name: &str) -> Result<Value> {
        self.global.lookup(name)
    }

    /// Assign the global `name`, declaring it when missing
    pub fn set_global(&self, name: &str, value: Value) -> Result<()> {
        match self.global.assign_variable(name, value.clone()) {
            Err(ScriptError::Undefined(_)) => {
                self.global.declare(name, BindingKind::Variable, value)
            }
            other => other,
        }
    }

    /// Declare a global host function
    pub fn define_native_function(
        &self,
        name: &str,
        arity: Option<usize>,
        body: impl Fn(&NativeCall<'_>) -> Result<Value> + 'static,
    ) -> Result<()> {
        let function = Function::Native(NativeFunction::new(name, arity, body));
        self.global
            .declare(name, BindingKind::Function, Value::function(function))
    }

    /// Register a host class and bind it globally under its name
    pub fn define_native_class(&self, builder: NativeClassBuilder) -> Result<ClassId> {
        let name = builder.name().to_string();
        let id = builder.register(&self.runtime)?;
        self.global
            .declare(&name, BindingKind::Class, self.runtime.objects().class(id))?;
        Ok(id)
    }

    pub fn class_name(&self, class: ClassId) -> Option<String> {
        self.runtime.class_name(class)
    }

    /// Lines written by `print`
    pub fn output(&self) -> Vec<String> {
        self.runtime.output()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::memory::{ScopeMemory, VariableMemory};
    use crate::test_support::init_logging;
    use std::cell::Cell;

    fn interpreter() -> Interpreter {
        init_logging();
        Interpreter::new().unwrap()
    }

    #[test]
    fn test_print_records_output() {
        let interpreter = interpreter();
        interpreter
            .run(&[
                expr(call(
                    ident("print"),
                    vec![string("a"), number(1.0), boolean(true)],
                )),
                expr(call(ident("print"), vec![array(vec![number(1.5), null()])])),
            ])
            .unwrap();
        assert_eq!(interpreter.output(), vec!["a 1 true", "[1.5, null]"]);
    }

    #[test]
    fn test_print_self_referencing_array() {
        let interpreter = interpreter();
        let result = interpreter.run(&[
            var("a", Some(array(vec![]))),
            expr(assign(index(ident("a"), vec![number(0.0)]), ident("a"))),
            expr(call(ident("print"), vec![ident("a")])),
            return_stmt(Some(array(vec![
                call(ident("str"), vec![ident("a")]),
                binary("+", string(""), ident("a")),
            ]))),
        ]);
        assert_eq!(interpreter.output(), vec!["[[...]]"]);
        assert_eq!(result.unwrap().to_string(), "[[[...]], [[...]]]");
    }

    #[test]
    fn test_builtins() {
        let interpreter = interpreter();
        let result = interpreter.evaluate(&array(vec![
            call(ident("typeof"), vec![string("x")]),
            call(ident("typeof"), vec![ident("print")]),
            call(ident("len"), vec![array(vec![number(1.0), number(2.0)])]),
            call(ident("len"), vec![string("héllo")]),
            call(ident("len"), vec![object(vec![("a", null())])]),
            call(ident("str"), vec![number(2.0)]),
        ]));
        assert_eq!(result.unwrap().to_string(), "[string, function, 2, 5, 1, 2]");

        let err = interpreter
            .evaluate(&call(ident("len"), vec![number(3.0)]))
            .unwrap_err();
        assert!(matches!(err.root_cause(), ScriptError::TypeMismatch(_)));

        let err = interpreter
            .evaluate(&call(ident("typeof"), vec![]))
            .unwrap_err();
        assert!(matches!(err.root_cause(), ScriptError::ArityMismatch { got: 0, .. }));
    }

    #[test]
    fn test_globals_shared_between_runs() {
        let interpreter = interpreter();
        interpreter
            .run(&[function_decl(
                "add",
                vec![param("a"), param("b")],
                vec![return_stmt(Some(binary("+", ident("a"), ident("b"))))],
            )])
            .unwrap();

        let sum = interpreter
            .call_global("add", vec![Value::Number(2.0), Value::Number(3.0)])
            .unwrap();
        assert_eq!(sum, Value::Number(5.0));

        interpreter.set_global("limit", Value::Number(1.0)).unwrap();
        interpreter.set_global("limit", Value::Number(2.0)).unwrap();
        assert_eq!(interpreter.get_global("limit").unwrap(), Value::Number(2.0));

        let result = interpreter.run(&[return_stmt(Some(call(
            ident("add"),
            vec![ident("limit"), number(40.0)],
        )))]);
        assert_eq!(result.unwrap(), Value::Number(42.0));

        assert_eq!(
            interpreter.get_global("missing"),
            Err(ScriptError::Undefined("missing".into()))
        );
    }

    #[test]
    fn test_native_function_calls_back_into_script() {
        let interpreter = interpreter();
        interpreter
            .define_native_function("twice", Some(1), |call| {
                let callback = call.arg(0);
                let first = call.context.call_value(&callback, vec![])?;
                let second = call.context.call_value(&callback, vec![])?;
                Ok(Value::array(vec![first, second]))
            })
            .unwrap();

        let counter = function(
            None,
            vec![],
            vec![
                expr(binary("+=", ident("n"), number(1.0))),
                return_stmt(Some(ident("n"))),
            ],
        );
        let result = interpreter.run(&[
            var("n", Some(number(0.0))),
            return_stmt(Some(call(ident("twice"), vec![function_expr(counter)]))),
        ]);
        assert_eq!(result.unwrap().to_string(), "[1, 2]");
    }

    #[test]
    fn test_unresolved_top_level_goto() {
        let interpreter = interpreter();
        let err = interpreter
            .run(&[block(vec![goto("nowhere")])])
            .unwrap_err();
        assert!(matches!(err.root_cause(), ScriptError::LabelNotFound(_)));
    }

    struct DoublingCreator;

    impl ObjectCreator for DoublingCreator {
        fn number(&self, value: f64) -> Value {
            Value::Number(value * 2.0)
        }
    }

    #[test]
    fn test_custom_object_creator() {
        init_logging();
        let interpreter = Interpreter::builder()
            .object_creator(DoublingCreator)
            .build()
            .unwrap();
        let result = interpreter.evaluate(&binary("+", number(1.0), number(2.0)));
        assert_eq!(result.unwrap(), Value::Number(6.0));
    }

    struct CountingCreator(Rc<Cell<usize>>);

    impl MemoryCreator for CountingCreator {
        fn create(&self) -> Box<dyn VariableMemory> {
            self.0.set(self.0.get() + 1);
            Box::new(ScopeMemory::new())
        }
    }

    #[test]
    fn test_custom_memory_creator() {
        init_logging();
        let created = Rc::new(Cell::new(0));
        let interpreter = Interpreter::builder()
            .memory_creator(CountingCreator(Rc::clone(&created)))
            .build()
            .unwrap();
        assert_eq!(created.get(), 1);

        // One scope for the call and one for the function body
        interpreter
            .run(&[
                function_decl("f", vec![], vec![]),
                expr(call(ident("f"), vec![])),
            ])
            .unwrap();
        assert_eq!(created.get(), 3);
    }

    /// Scope storage refusing every declaration
    #[derive(Default)]
    struct FrozenMemory(ScopeMemory);

    impl VariableMemory for FrozenMemory {
        fn hoist(&mut self, name: &str, kind: BindingKind) -> Result<()> {
            self.0.hoist(name, kind)
        }

        fn declare(&mut self, name: &str, _kind: BindingKind, _value: Value) -> Result<()> {
            Err(ScriptError::Native(format!("cannot declare '{name}'")))
        }

        fn lookup(&self, name: &str) -> crate::memory::Lookup {
            self.0.lookup(name)
        }

        fn assign(&mut self, name: &str, value: Value) -> Result<bool> {
            self.0.assign(name, value)
        }

        fn contains(&self, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    struct FrozenCreator;

    impl MemoryCreator for FrozenCreator {
        fn create(&self) -> Box<dyn VariableMemory> {
            Box::new(FrozenMemory::default())
        }
    }

    #[test]
    fn test_build_fails_when_builtins_cannot_be_declared() {
        init_logging();
        let err = Interpreter::builder()
            .memory_creator(FrozenCreator)
            .build()
            .err()
            .unwrap();
        assert_eq!(err, ScriptError::Native("cannot declare 'print'".into()));
    }

    #[test]
    fn test_with_config() {
        init_logging();
        let config = InterpreterConfig {
            name: "embedded".into(),
            top_level_return: false,
            ..InterpreterConfig::default()
        };
        let interpreter = Interpreter::with_config(config).unwrap();
        assert_eq!(interpreter.config().name, "embedded");

        let err = interpreter
            .run(&[return_stmt(Some(number(1.0)))])
            .unwrap_err();
        assert!(matches!(err.root_cause(), ScriptError::MisplacedReturn));
    }
}
