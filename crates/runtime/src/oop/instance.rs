//! Class instances and construction

use super::{ClassId, ClassKind};
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::executor::ExecuteResult;
use crate::value::{NativeCall, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Instance of a class; fields are keyed by mangled name
pub struct InstanceObject {
    class: ClassId,
    fields: RefCell<HashMap<String, Value>>,
}

impl InstanceObject {
    pub(crate) fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn field(&self, key: &str) -> Option<Value> {
        self.fields.borrow().get(key).cloned()
    }

    pub fn set_field(&self, key: &str, value: Value) {
        self.fields.borrow_mut().insert(key.to_string(), value);
    }
}

impl fmt::Debug for InstanceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.fields.borrow().keys().cloned().collect();
        keys.sort();
        f.debug_struct("InstanceObject")
            .field("class", &self.class)
            .field("fields", &keys)
            .finish()
    }
}

impl RuntimeContext {
    /// Create an instance of `class` and run its constructor chain
    pub fn construct(&self, class: ClassId, args: Vec<Value>) -> Result<Value> {
        let instance = Rc::new(InstanceObject::new(class));
        self.initialize(class, &instance, args)?;
        Ok(Value::Instance(instance))
    }

    /// Run the constructor of `class_id` on `instance`: superclass first,
    /// then field initializers, then the constructor body
    fn initialize(
        &self,
        class_id: ClassId,
        instance: &Rc<InstanceObject>,
        args: Vec<Value>,
    ) -> Result<()> {
        let runtime = Rc::clone(self.runtime());
        let class = runtime.class(class_id)?;
        let this = Value::Instance(Rc::clone(instance));
        let _guard = runtime.enter_call()?;

        match class.kind() {
            ClassKind::Native { constructor } => {
                if let Some(super_id) = class.super_class() {
                    self.initialize(super_id, instance, Vec::new())?;
                }
                for field in &class.instance_fields {
                    instance.set_field(&field.key, Value::Null);
                }
                match constructor {
                    Some(constructor) => {
                        constructor.invoke(&NativeCall {
                            context: self,
                            this: Some(&this),
                            args: &args,
                        })?;
                    }
                    None if !args.is_empty() => {
                        return Err(ScriptError::ArityMismatch {
                            name: class.name().to_string(),
                            expected: "0".into(),
                            got: args.len(),
                        });
                    }
                    None => {}
                }
                Ok(())
            }
            ClassKind::Script {
                closure,
                constructor,
            } => {
                let method = RuntimeContext::method(closure, class_id, Some(this));

                let mut body: &[_] = &[];
                let mut super_call = None;
                match constructor {
                    Some(decl) => {
                        method.bind_parameters(decl, args)?;
                        body = &decl.body;
                        if let Some((first, rest)) = decl.body.split_first() {
                            if let Some(arguments) = first.super_call() {
                                super_call = Some((arguments, first.pragma));
                                body = rest;
                            }
                        }
                    }
                    None if !args.is_empty() => {
                        return Err(ScriptError::ArityMismatch {
                            name: class.name().to_string(),
                            expected: "0".into(),
                            got: args.len(),
                        });
                    }
                    None => {}
                }

                match (super_call, class.super_class()) {
                    (Some((arguments, pragma)), Some(super_id)) => {
                        let values = method
                            .evaluate_arguments(arguments)
                            .map_err(|e| e.at(pragma))?;
                        self.initialize(super_id, instance, values)
                            .map_err(|e| e.at(pragma))?;
                    }
                    (Some((_, pragma)), None) => {
                        return Err(ScriptError::InvalidSuper(format!(
                            "class '{}' has no superclass",
                            class.name()
                        ))
                        .at(pragma));
                    }
                    (None, Some(super_id)) => self.initialize(super_id, instance, Vec::new())?,
                    (None, None) => {}
                }

                for field in &class.instance_fields {
                    let value = match &field.initializer {
                        Some(initializer) => method.evaluate(initializer)?,
                        None => Value::Null,
                    };
                    instance.set_field(&field.key, value);
                }

                match method.run_body(body)? {
                    ExecuteResult::Goto(label) => Err(ScriptError::LabelNotFound(label)),
                    _ => Ok(()),
                }
            }
        }
    }
}
