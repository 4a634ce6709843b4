//! Runtime context chain
//!
//! Every executing scope is a `RuntimeContext`: the global Root, a Block
//! (plain, loop iteration or switch body), a Function call or a Method
//! call. Lookups walk `scope()`: a Block delegates to its parent, a
//! Function or Method to its closure. Only Method contexts own a class
//! and a receiver; the other kinds forward `class()` and `this()`.

use crate::error::{Result, ScriptError};
use crate::executor::BlockFlow;
use crate::memory::{BindingKind, Lookup, VariableMemory};
use crate::oop::ClassId;
use crate::runtime::Runtime;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Kind of a context and its link to the enclosing one
#[derive(Clone)]
pub enum ContextKind {
    Root,
    Block {
        parent: RuntimeContext,
        flow: BlockFlow,
    },
    Function {
        closure: RuntimeContext,
    },
    /// `this` is `None` inside static methods
    Method {
        closure: RuntimeContext,
        class: ClassId,
        this: Option<Value>,
    },
}

struct ContextInner {
    kind: ContextKind,
    memory: RefCell<Box<dyn VariableMemory>>,
    labels: RefCell<HashSet<String>>,
    runtime: Rc<Runtime>,
}

/// Shared handle to one scope
#[derive(Clone)]
pub struct RuntimeContext {
    inner: Rc<ContextInner>,
}

impl RuntimeContext {
    /// Global context of an interpreter
    pub fn root(runtime: Rc<Runtime>) -> Self {
        Self::with_kind(runtime, ContextKind::Root)
    }

    fn with_kind(runtime: Rc<Runtime>, kind: ContextKind) -> Self {
        let memory = runtime.memory().create();
        Self {
            inner: Rc::new(ContextInner {
                kind,
                memory: RefCell::new(memory),
                labels: RefCell::new(HashSet::new()),
                runtime,
            }),
        }
    }

    /// Nested block scope
    pub fn block(&self, flow: BlockFlow) -> Self {
        Self::with_kind(
            Rc::clone(&self.inner.runtime),
            ContextKind::Block {
                parent: self.clone(),
                flow,
            },
        )
    }

    /// Scope of one call of a function closing over `closure`
    pub fn function(closure: &RuntimeContext) -> Self {
        Self::with_kind(
            Rc::clone(&closure.inner.runtime),
            ContextKind::Function {
                closure: closure.clone(),
            },
        )
    }

    /// Scope of one call of a method of `class`
    pub fn method(closure: &RuntimeContext, class: ClassId, this: Option<Value>) -> Self {
        Self::with_kind(
            Rc::clone(&closure.inner.runtime),
            ContextKind::Method {
                closure: closure.clone(),
                class,
                this,
            },
        )
    }

    pub fn kind(&self) -> &ContextKind {
        &self.inner.kind
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.inner.runtime
    }

    /// Enclosing scope for name lookups
    pub fn scope(&self) -> Option<&RuntimeContext> {
        match &self.inner.kind {
            ContextKind::Root => None,
            ContextKind::Block { parent, .. } => Some(parent),
            ContextKind::Function { closure } | ContextKind::Method { closure, .. } => Some(closure),
        }
    }

    /// Class whose method is executing
    pub fn class(&self) -> Option<ClassId> {
        match &self.inner.kind {
            ContextKind::Method { class, .. } => Some(*class),
            _ => self.scope().and_then(RuntimeContext::class),
        }
    }

    /// Receiver of the executing method; the class itself in static methods
    pub fn this(&self) -> Option<Value> {
        match &self.inner.kind {
            ContextKind::Method { this: Some(this), .. } => Some(this.clone()),
            ContextKind::Method { class, this: None, .. } => Some(Value::Class(*class)),
            _ => self.scope().and_then(RuntimeContext::this),
        }
    }

    pub fn can_break(&self) -> bool {
        match &self.inner.kind {
            ContextKind::Block { parent, flow } => flow.permits_break() || parent.can_break(),
            _ => false,
        }
    }

    pub fn can_continue(&self) -> bool {
        match &self.inner.kind {
            ContextKind::Block { parent, flow } => flow.permits_continue() || parent.can_continue(),
            _ => false,
        }
    }

    pub fn can_return(&self) -> bool {
        match &self.inner.kind {
            ContextKind::Root => self.inner.runtime.config().top_level_return,
            ContextKind::Block { parent, .. } => parent.can_return(),
            ContextKind::Function { .. } | ContextKind::Method { .. } => true,
        }
    }

    /// Whether `label` is declared here or in an enclosing block
    pub fn can_goto(&self, label: &str) -> bool {
        if self.inner.labels.borrow().contains(label) {
            return true;
        }
        match &self.inner.kind {
            ContextKind::Block { parent, .. } => parent.can_goto(label),
            _ => false,
        }
    }

    pub(crate) fn declare_label(&self, label: &str) -> Result<()> {
        if !self.inner.labels.borrow_mut().insert(label.to_string()) {
            return Err(ScriptError::DuplicateLabel(label.to_string()));
        }
        Ok(())
    }

    /// Reserve `name` in this scope
    pub fn hoist(&self, name: &str, kind: BindingKind) -> Result<()> {
        self.inner.memory.borrow_mut().hoist(name, kind)
    }

    /// Bind `name` in this scope
    pub fn declare(&self, name: &str, kind: BindingKind, value: Value) -> Result<()> {
        self.inner.memory.borrow_mut().declare(name, kind, value)
    }

    /// Value of `name` in the nearest scope that has it
    pub fn lookup(&self, name: &str) -> Result<Value> {
        let mut current = Some(self);
        while let Some(context) = current {
            match context.inner.memory.borrow().lookup(name) {
                Lookup::Found(value) => return Ok(value),
                Lookup::Unassigned => return Err(ScriptError::Unassigned(name.to_string())),
                Lookup::Missing => current = context.scope(),
            }
        }
        Err(ScriptError::Undefined(name.to_string()))
    }

    /// Assign `name` in the nearest scope that has it
    pub fn assign_variable(&self, name: &str, value: Value) -> Result<()> {
        let mut current = Some(self);
        while let Some(context) = current {
            if context
                .inner
                .memory
                .borrow_mut()
                .assign(name, value.clone())?
            {
                return Ok(());
            }
            current = context.scope();
        }
        Err(ScriptError::Undefined(name.to_string()))
    }
}

impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner.kind {
            ContextKind::Root => "Root",
            ContextKind::Block { .. } => "Block",
            ContextKind::Function { .. } => "Function",
            ContextKind::Method { .. } => "Method",
        };
        f.debug_struct("RuntimeContext").field("kind", &kind).finish()
    }
}
