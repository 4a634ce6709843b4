//! Expression evaluation, assignment and calls

use crate::ast::{ExprKind, Expression, FunctionDecl, Literal, Statement};
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::executor::{BlockFlow, ExecuteResult};
use crate::memory::BindingKind;
use crate::oop::{ClassId, ClassKind, MethodImpl};
use crate::stack::ensure_sufficient_stack;
use crate::value::{Function, NativeCall, Value};
use std::rc::Rc;

fn is_super(expression: &Expression) -> bool {
    matches!(expression.kind, ExprKind::Super)
}

impl RuntimeContext {
    /// Evaluate `expression`; failures are located at the innermost node
    pub fn evaluate(&self, expression: &Expression) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_kind(expression))
            .map_err(|e| e.at(expression.pragma))
    }

    fn evaluate_kind(&self, expression: &Expression) -> Result<Value> {
        let runtime = self.runtime();
        let objects = runtime.objects();

        match &expression.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Null => objects.null(),
                Literal::Bool(b) => objects.boolean(*b),
                Literal::Number(n) => objects.number(*n),
                Literal::String(s) => objects.string(s),
            }),
            ExprKind::Variable(name) => self.lookup(name),
            ExprKind::This => self.this().ok_or(ScriptError::InvalidThis),
            ExprKind::Super => Err(ScriptError::InvalidSuper(
                "must be followed by a member access, an index or a constructor call".into(),
            )),
            ExprKind::Member { target, name } => {
                if is_super(target) {
                    self.get_super_member(name)
                } else {
                    let target = self.evaluate(target)?;
                    self.get_member(&target, name)
                }
            }
            ExprKind::Index { target, arguments } => {
                if is_super(target) {
                    let args = self.evaluate_arguments(arguments)?;
                    self.get_super_item(args)
                } else {
                    let target = self.evaluate(target)?;
                    let args = self.evaluate_arguments(arguments)?;
                    self.get_item(&target, args)
                }
            }
            ExprKind::Call { callee, arguments } => {
                if is_super(callee) {
                    return Err(ScriptError::InvalidSuper(
                        "'super(...)' is only allowed as the first statement of a constructor"
                            .into(),
                    ));
                }
                let function = self.evaluate(callee)?;
                let args = self.evaluate_arguments(arguments)?;
                self.call_value(&function, args)
            }
            ExprKind::New { class, arguments } => {
                let class = self.evaluate(class)?;
                let args = self.evaluate_arguments(arguments)?;
                match class {
                    Value::Class(id) => self.construct(id, args),
                    other => Err(ScriptError::NotAClass(other.type_name().into())),
                }
            }
            ExprKind::Unary {
                op,
                fixity,
                operand,
            } => runtime.operators().unary(self, op, *fixity, operand),
            ExprKind::Binary { op, left, right } => {
                runtime.operators().binary(self, op, left, right)
            }
            ExprKind::Ternary {
                op,
                first,
                second,
                third,
            } => runtime.operators().ternary(self, op, first, second, third),
            ExprKind::Array(items) => {
                let values = self.evaluate_arguments(items)?;
                Ok(objects.array(values))
            }
            ExprKind::Object(properties) => {
                let mut values = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    values.push((key.clone(), self.evaluate(value)?));
                }
                Ok(objects.object(values))
            }
            ExprKind::Function(decl) => Ok(objects.function(Rc::clone(decl), self.clone())),
            ExprKind::Class(decl) => {
                let id = self.create_class(decl)?;
                Ok(objects.class(id))
            }
        }
    }

    /// Evaluate each expression left to right
    pub fn evaluate_arguments(&self, arguments: &[Expression]) -> Result<Vec<Value>> {
        arguments.iter().map(|a| self.evaluate(a)).collect()
    }

    /// Store `value` into an assignment target
    pub fn assign(&self, target: &Expression, value: Value) -> Result<()> {
        self.assign_kind(target, value)
            .map_err(|e| e.at(target.pragma))
    }

    fn assign_kind(&self, target: &Expression, value: Value) -> Result<()> {
        match &target.kind {
            ExprKind::Variable(name) => self.assign_variable(name, value),
            ExprKind::Member { target, name } => {
                if is_super(target) {
                    self.set_super_member(name, value)
                } else {
                    let target = self.evaluate(target)?;
                    self.set_member(&target, name, value)
                }
            }
            ExprKind::Index { target, arguments } => {
                if is_super(target) {
                    let args = self.evaluate_arguments(arguments)?;
                    self.set_super_item(args, value)
                } else {
                    let target = self.evaluate(target)?;
                    let args = self.evaluate_arguments(arguments)?;
                    self.set_item(&target, args, value)
                }
            }
            ExprKind::Array(pattern) => self.destructure(pattern, value),
            _ => Err(ScriptError::InvalidAssignmentTarget),
        }
    }

    /// Assign the leading elements of `value` to `pattern`; the pattern
    /// must be non-empty and no longer than the value
    fn destructure(&self, pattern: &[Expression], value: Value) -> Result<()> {
        let items = value.enumerate().ok_or_else(|| {
            ScriptError::TypeMismatch(format!("cannot destructure a {}", value.type_name()))
        })?;

        if pattern.is_empty() || pattern.len() > items.len() {
            return Err(ScriptError::DestructuringMismatch {
                pattern_len: pattern.len(),
                source_len: items.len(),
            });
        }

        for (target, item) in pattern.iter().zip(items) {
            self.assign(target, item)?;
        }
        Ok(())
    }

    /// Call a function value
    pub fn call_value(&self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        let Value::Function(function) = callee else {
            return Err(ScriptError::NotCallable(callee.type_name().into()));
        };

        match function.as_ref() {
            Function::Script { decl, closure } => RuntimeContext::function(closure).invoke(decl, args),
            Function::Native(native) => native.invoke(&NativeCall {
                context: self,
                this: None,
                args: &args,
            }),
            Function::Bound {
                class,
                method,
                this,
            } => self.invoke_method(*class, method, this.clone(), args),
        }
    }

    /// Run a method of `class` with receiver `this`
    pub(crate) fn invoke_method(
        &self,
        class: ClassId,
        method: &MethodImpl,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value> {
        match method {
            MethodImpl::Native(native) => native.invoke(&NativeCall {
                context: self,
                this: this.as_ref(),
                args: &args,
            }),
            MethodImpl::Script(decl) => {
                let class_object = self.runtime().class(class)?;
                let ClassKind::Script { closure, .. } = class_object.kind() else {
                    return Err(ScriptError::TypeMismatch(format!(
                        "class '{}' has no script scope",
                        class_object.name()
                    )));
                };
                RuntimeContext::method(closure, class, this).invoke(decl, args)
            }
        }
    }

    /// Bind `args` and run `decl` in this freshly created call context
    fn invoke(&self, decl: &FunctionDecl, args: Vec<Value>) -> Result<Value> {
        let runtime = Rc::clone(self.runtime());
        let _guard = runtime.enter_call()?;

        self.bind_parameters(decl, args)?;
        match self.run_body(&decl.body)? {
            ExecuteResult::Return(value) => Ok(value),
            ExecuteResult::Goto(label) => Err(ScriptError::LabelNotFound(label)),
            _ => Ok(runtime.objects().null()),
        }
    }

    /// Declare the parameters of `decl` in this context.
    ///
    /// Missing arguments take their default, evaluated here so earlier
    /// parameters are visible, or `null` when optional.
    pub(crate) fn bind_parameters(&self, decl: &FunctionDecl, args: Vec<Value>) -> Result<()> {
        let got = args.len();
        if got > decl.parameters.len() {
            return Err(arity_mismatch(decl, got));
        }

        let mut args = args.into_iter();
        for parameter in &decl.parameters {
            let value = match (args.next(), &parameter.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.evaluate(default)?,
                (None, None) if parameter.optional => self.runtime().objects().null(),
                (None, None) => return Err(arity_mismatch(decl, got)),
            };
            self.declare(&parameter.name, BindingKind::Parameter, value)?;
        }
        Ok(())
    }

    /// Run a function body in a block below this call context
    pub(crate) fn run_body(&self, body: &[Statement]) -> Result<ExecuteResult> {
        self.block(BlockFlow::Plain).execute_sequence(body)
    }
}

fn arity_mismatch(decl: &FunctionDecl, got: usize) -> ScriptError {
    let required = decl.required_parameters();
    let total = decl.parameters.len();
    let expected = if required == total {
        total.to_string()
    } else {
        format!("{required} to {total}")
    };
    ScriptError::ArityMismatch {
        name: decl.display_name().to_string(),
        expected,
        got,
    }
}
