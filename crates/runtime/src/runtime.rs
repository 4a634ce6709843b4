//! Services shared by every context of one interpreter

use crate::error::{Result, ScriptError};
use crate::memory::MemoryCreator;
use crate::objects::ObjectCreator;
use crate::oop::{ClassId, ClassObject, ClassRegistry};
use crate::operators::OperatorCalculator;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tarn_config::InterpreterConfig;
use tokio_util::sync::CancellationToken;

/// Interpreter-wide state reachable from every `RuntimeContext`
pub struct Runtime {
    config: InterpreterConfig,
    classes: RefCell<ClassRegistry>,
    objects: Box<dyn ObjectCreator>,
    operators: Box<dyn OperatorCalculator>,
    memory: Box<dyn MemoryCreator>,
    cancellation: CancellationToken,

    /// Script calls currently on the host stack
    depth: Cell<usize>,

    /// Lines written by `print`
    output: RefCell<Vec<String>>,
}

impl Runtime {
    pub(crate) fn new(
        config: InterpreterConfig,
        objects: Box<dyn ObjectCreator>,
        operators: Box<dyn OperatorCalculator>,
        memory: Box<dyn MemoryCreator>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            config,
            classes: RefCell::new(ClassRegistry::default()),
            objects,
            operators,
            memory,
            cancellation,
            depth: Cell::new(0),
            output: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn objects(&self) -> &dyn ObjectCreator {
        self.objects.as_ref()
    }

    pub fn operators(&self) -> &dyn OperatorCalculator {
        self.operators.as_ref()
    }

    pub fn memory(&self) -> &dyn MemoryCreator {
        self.memory.as_ref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail with `Cancelled` once the host cancelled the token
    pub fn check_cancelled(&self) -> Result<()> {
        if self.config.check_cancellation && self.cancellation.is_cancelled() {
            tracing::warn!(interpreter = %self.config.name, "script cancelled");
            return Err(ScriptError::Cancelled);
        }
        Ok(())
    }

    /// Count one nested script call until the guard drops
    pub fn enter_call(&self) -> Result<CallGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.config.max_call_depth {
            return Err(ScriptError::StackOverflow(self.config.max_call_depth));
        }
        self.depth.set(depth + 1);
        Ok(CallGuard { depth: &self.depth })
    }

    pub fn class(&self, id: ClassId) -> Result<Rc<ClassObject>> {
        self.classes
            .borrow()
            .get(id)
            .ok_or_else(|| ScriptError::NotAClass(format!("class #{}", id.get())))
    }

    pub fn class_name(&self, id: ClassId) -> Option<String> {
        self.classes.borrow().get(id).map(|c| c.name().to_string())
    }

    pub(crate) fn register_class(&self, class: ClassObject) -> ClassId {
        self.classes.borrow_mut().insert(class)
    }

    /// `class` derives from `ancestor`, directly or not
    pub fn is_extended_from(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.classes.borrow().is_extended_from(class, ancestor)
    }

    /// Same class or related by inheritance in either direction
    pub fn is_related(&self, a: ClassId, b: ClassId) -> bool {
        a == b || self.is_extended_from(a, b) || self.is_extended_from(b, a)
    }

    pub(crate) fn record_output(&self, line: String) {
        self.output.borrow_mut().push(line);
    }

    /// Lines written by `print` so far
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }
}

/// Releases one level of call depth on drop
pub struct CallGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
