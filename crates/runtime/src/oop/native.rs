//! Host-defined classes
//!
//! Members declared here are public. Every host callable uses the same
//! variadic convention: it receives the receiver and the argument slice
//! through a `NativeCall` and returns one value.

use super::{ClassId, ClassKind, ClassMember, ClassObject, FieldSlot, MethodImpl, Side, INDEXER_NAME};
use crate::error::{Result, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeCall, NativeFunction, Value};

/// Declares a class implemented by the host
pub struct NativeClassBuilder {
    name: String,
    super_class: Option<ClassId>,
    constructor: Option<NativeFunction>,
    members: Vec<(Side, String, ClassMember)>,
    instance_fields: Vec<String>,
    static_fields: Vec<(String, Value)>,
}

impl NativeClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_class: None,
            constructor: None,
            members: Vec::new(),
            instance_fields: Vec::new(),
            static_fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extends(mut self, super_class: ClassId) -> Self {
        self.super_class = Some(super_class);
        self
    }

    /// Runs after the superclass is initialized, with `this` set
    pub fn constructor(
        mut self,
        arity: Option<usize>,
        body: impl Fn(&NativeCall<'_>) -> Result<Value> + 'static,
    ) -> Self {
        self.constructor = Some(NativeFunction::new(&self.name, arity, body));
        self
    }

    pub fn method(
        mut self,
        name: &str,
        arity: Option<usize>,
        body: impl Fn(&NativeCall<'_>) -> Result<Value> + 'static,
    ) -> Self {
        let method = MethodImpl::Native(NativeFunction::new(name, arity, body));
        self.members
            .push((Side::Instance, name.to_string(), ClassMember::Method(method)));
        self
    }

    pub fn static_method(
        mut self,
        name: &str,
        arity: Option<usize>,
        body: impl Fn(&NativeCall<'_>) -> Result<Value> + 'static,
    ) -> Self {
        let method = MethodImpl::Native(NativeFunction::new(name, arity, body));
        self.members
            .push((Side::Static, name.to_string(), ClassMember::Method(method)));
        self
    }

    /// Property with an optional getter and setter
    pub fn property(
        mut self,
        name: &str,
        getter: Option<NativeFunction>,
        setter: Option<NativeFunction>,
    ) -> Self {
        let member = ClassMember::Property {
            getter: getter.map(MethodImpl::Native),
            setter: setter.map(MethodImpl::Native),
        };
        self.members.push((Side::Instance, name.to_string(), member));
        self
    }

    /// Instance indexer; the setter receives the indices followed by the value
    pub fn indexer(mut self, getter: Option<NativeFunction>, setter: Option<NativeFunction>) -> Self {
        let member = ClassMember::Indexer {
            getter: getter.map(MethodImpl::Native),
            setter: setter.map(MethodImpl::Native),
        };
        self.members
            .push((Side::Instance, INDEXER_NAME.to_string(), member));
        self
    }

    /// Public instance field, `null` until assigned
    pub fn field(mut self, name: &str) -> Self {
        self.instance_fields.push(name.to_string());
        self
    }

    pub fn static_field(mut self, name: &str, value: Value) -> Self {
        self.static_fields.push((name.to_string(), value));
        self
    }

    /// Register the class with `runtime`
    pub(crate) fn register(self, runtime: &Runtime) -> Result<ClassId> {
        if let Some(super_class) = self.super_class {
            runtime.class(super_class)?;
        }

        let mut class = ClassObject::new(
            &self.name,
            self.super_class,
            ClassKind::Native {
                constructor: self.constructor,
            },
        );

        for key in self.instance_fields {
            class.instance_fields.push(FieldSlot {
                key,
                initializer: None,
            });
        }
        for (key, value) in self.static_fields {
            class.static_fields.get_mut().insert(key, value);
        }

        for (side, key, member) in self.members {
            let is_indexer = matches!(member, ClassMember::Indexer { .. });
            let table = match side {
                Side::Instance => &mut class.instance_members,
                Side::Static => &mut class.static_members,
            };
            if table.insert(key.clone(), member).is_some() {
                return Err(if is_indexer {
                    ScriptError::DuplicateIndexer(self.name.clone())
                } else {
                    ScriptError::DuplicateMember {
                        class: self.name.clone(),
                        member: key,
                    }
                });
            }
        }

        let id = runtime.register_class(class);
        tracing::debug!(class = %self.name, id = id.get(), "native class registered");
        Ok(id)
    }
}
