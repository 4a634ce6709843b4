//! Member and indexer access on values
//!
//! Class members are looked up level by level from the most derived class
//! upward. At each level three keys are tried in order: the name mangled
//! private to the calling class, the public name, and the protected name
//! when the caller is related to that level.

use super::{mangle, ClassId, ClassMember, ClassObject, MethodImpl, Side, INDEXER_NAME};
use crate::ast::Visibility;
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::value::{Function, Value};
use std::rc::Rc;

/// Outcome of a member search
pub(crate) enum Resolved {
    /// Declared field; instance values live in the instance
    Field { owner: Rc<ClassObject>, key: String },
    Member { owner: ClassId, member: ClassMember },
}

/// Class, side and receiver a member access starts from
struct Target {
    start: ClassId,
    side: Side,
    receiver: Option<Value>,
}

impl RuntimeContext {
    pub(crate) fn resolve_member(
        &self,
        start: ClassId,
        side: Side,
        name: &str,
    ) -> Result<Option<Resolved>> {
        let runtime = Rc::clone(self.runtime());
        let caller = self.class();
        let private_key = match caller {
            Some(caller) => Some(mangle(Visibility::Private, runtime.class(caller)?.name(), name)),
            None => None,
        };
        let protected_key = mangle(Visibility::Protected, "", name);

        let mut current = Some(start);
        while let Some(id) = current {
            let class = runtime.class(id)?;

            let mut keys = Vec::with_capacity(3);
            keys.extend(private_key.as_deref());
            keys.push(name);
            if caller.is_some_and(|caller| runtime.is_related(caller, id)) {
                keys.push(&protected_key);
            }

            for key in keys {
                if let Some(member) = class.members(side).get(key) {
                    return Ok(Some(Resolved::Member {
                        owner: id,
                        member: member.clone(),
                    }));
                }
                if class.has_field(side, key) {
                    return Ok(Some(Resolved::Field {
                        key: key.to_string(),
                        owner: class,
                    }));
                }
            }

            current = class.super_class();
        }
        Ok(None)
    }

    fn class_target(&self, value: &Value) -> Option<Target> {
        match value {
            Value::Instance(instance) => Some(Target {
                start: instance.class(),
                side: Side::Instance,
                receiver: Some(value.clone()),
            }),
            Value::Class(id) => Some(Target {
                start: *id,
                side: Side::Static,
                receiver: None,
            }),
            _ => None,
        }
    }

    /// Target of `super.x` / `super[...]`: the superclass of the executing class
    fn super_target(&self) -> Result<Target> {
        let class_id = self
            .class()
            .ok_or_else(|| ScriptError::InvalidSuper("used outside of a class".into()))?;
        let class = self.runtime().class(class_id)?;
        let start = class.super_class().ok_or_else(|| {
            ScriptError::InvalidSuper(format!("class '{}' has no superclass", class.name()))
        })?;

        Ok(match self.this() {
            Some(receiver @ Value::Instance(_)) => Target {
                start,
                side: Side::Instance,
                receiver: Some(receiver),
            },
            _ => Target {
                start,
                side: Side::Static,
                receiver: None,
            },
        })
    }

    pub fn get_member(&self, target: &Value, name: &str) -> Result<Value> {
        if let Some(target) = self.class_target(target) {
            return self.get_class_member(&target, name);
        }
        match target {
            Value::Object(object) => Ok(object.borrow().get(name).unwrap_or(Value::Null)),
            Value::Array(items) if name == "length" => Ok(Value::Number(items.borrow().len() as f64)),
            Value::String(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::Null => Err(ScriptError::NullReference(name.to_string())),
            _ => Err(ScriptError::MemberNotFound(name.to_string())),
        }
    }

    pub fn set_member(&self, target: &Value, name: &str, value: Value) -> Result<()> {
        if let Some(target) = self.class_target(target) {
            return self.set_class_member(&target, name, value);
        }
        match target {
            Value::Object(object) => {
                object.borrow_mut().set(name, value);
                Ok(())
            }
            Value::Null => Err(ScriptError::NullReference(name.to_string())),
            other => Err(ScriptError::TypeMismatch(format!(
                "cannot set '{name}' on a {}",
                other.type_name()
            ))),
        }
    }

    pub fn get_item(&self, target: &Value, args: Vec<Value>) -> Result<Value> {
        if let Some(target) = self.class_target(target) {
            return self.get_class_item(&target, args);
        }
        match target {
            Value::Array(items) => {
                let items = items.borrow();
                let index = array_index(&args, items.len())?;
                items
                    .get(index)
                    .cloned()
                    .ok_or_else(|| out_of_range(&args, items.len()))
            }
            Value::String(s) => {
                let len = s.chars().count();
                let index = array_index(&args, len)?;
                s.chars()
                    .nth(index)
                    .map(|c| Value::string(&c.to_string()))
                    .ok_or_else(|| out_of_range(&args, len))
            }
            Value::Object(object) => {
                let key = object_key(&args)?;
                Ok(object.borrow().get(&key).unwrap_or(Value::Null))
            }
            Value::Null => Err(ScriptError::NullReference(INDEXER_NAME.into())),
            other => Err(ScriptError::IndexerNotFound(other.type_name().into())),
        }
    }

    pub fn set_item(&self, target: &Value, args: Vec<Value>, value: Value) -> Result<()> {
        if let Some(target) = self.class_target(target) {
            return self.set_class_item(&target, args, value);
        }
        match target {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                let index = array_index(&args, items.len())?;
                if index < items.len() {
                    items[index] = value;
                } else if index == items.len() {
                    items.push(value);
                } else {
                    return Err(out_of_range(&args, items.len()));
                }
                Ok(())
            }
            Value::Object(object) => {
                let key = object_key(&args)?;
                object.borrow_mut().set(&key, value);
                Ok(())
            }
            Value::Null => Err(ScriptError::NullReference(INDEXER_NAME.into())),
            other => Err(ScriptError::IndexerNotFound(other.type_name().into())),
        }
    }

    pub fn get_super_member(&self, name: &str) -> Result<Value> {
        let target = self.super_target()?;
        self.get_class_member(&target, name)
    }

    pub fn set_super_member(&self, name: &str, value: Value) -> Result<()> {
        let target = self.super_target()?;
        self.set_class_member(&target, name, value)
    }

    pub fn get_super_item(&self, args: Vec<Value>) -> Result<Value> {
        let target = self.super_target()?;
        self.get_class_item(&target, args)
    }

    pub fn set_super_item(&self, args: Vec<Value>, value: Value) -> Result<()> {
        let target = self.super_target()?;
        self.set_class_item(&target, args, value)
    }

    fn get_class_member(&self, target: &Target, name: &str) -> Result<Value> {
        let Some(resolved) = self.resolve_member(target.start, target.side, name)? else {
            return Err(ScriptError::MemberNotFound(name.to_string()));
        };

        match resolved {
            Resolved::Field { owner, key } => Ok(match (&target.receiver, target.side) {
                (Some(Value::Instance(instance)), Side::Instance) => instance.field(&key),
                _ => owner.static_field(&key),
            }
            .unwrap_or(Value::Null)),
            Resolved::Member { owner, member } => match member {
                ClassMember::Method(method) => Ok(Value::function(Function::Bound {
                    class: owner,
                    method,
                    this: target.receiver.clone(),
                })),
                ClassMember::Property {
                    getter: Some(getter),
                    ..
                } => self.invoke_method(owner, &getter, target.receiver.clone(), Vec::new()),
                ClassMember::Property { getter: None, .. } => {
                    Err(ScriptError::WriteOnly(name.to_string()))
                }
                ClassMember::Indexer { .. } => Err(ScriptError::MemberNotFound(name.to_string())),
            },
        }
    }

    fn set_class_member(&self, target: &Target, name: &str, value: Value) -> Result<()> {
        let Some(resolved) = self.resolve_member(target.start, target.side, name)? else {
            return Err(ScriptError::MemberNotFound(name.to_string()));
        };

        match resolved {
            Resolved::Field { owner, key } => {
                match (&target.receiver, target.side) {
                    (Some(Value::Instance(instance)), Side::Instance) => {
                        instance.set_field(&key, value)
                    }
                    _ => owner.set_static_field(&key, value),
                }
                Ok(())
            }
            Resolved::Member { owner, member } => match member {
                ClassMember::Property {
                    setter: Some(setter),
                    ..
                } => self
                    .invoke_method(owner, &setter, target.receiver.clone(), vec![value])
                    .map(drop),
                ClassMember::Property { setter: None, .. } | ClassMember::Method(_) => {
                    Err(ScriptError::ReadOnly(name.to_string()))
                }
                ClassMember::Indexer { .. } => Err(ScriptError::MemberNotFound(name.to_string())),
            },
        }
    }

    fn find_indexer(&self, target: &Target) -> Result<(ClassId, Option<MethodImpl>, Option<MethodImpl>)> {
        match self.resolve_member(target.start, target.side, INDEXER_NAME)? {
            Some(Resolved::Member {
                owner,
                member: ClassMember::Indexer { getter, setter },
            }) => Ok((owner, getter, setter)),
            _ => {
                let name = self
                    .runtime()
                    .class_name(target.start)
                    .unwrap_or_default();
                Err(ScriptError::IndexerNotFound(format!("class '{name}'")))
            }
        }
    }

    fn get_class_item(&self, target: &Target, args: Vec<Value>) -> Result<Value> {
        match self.find_indexer(target)? {
            (owner, Some(getter), _) => {
                self.invoke_method(owner, &getter, target.receiver.clone(), args)
            }
            (_, None, _) => Err(ScriptError::WriteOnly(INDEXER_NAME.into())),
        }
    }

    fn set_class_item(&self, target: &Target, mut args: Vec<Value>, value: Value) -> Result<()> {
        match self.find_indexer(target)? {
            (owner, _, Some(setter)) => {
                args.push(value);
                self.invoke_method(owner, &setter, target.receiver.clone(), args)
                    .map(drop)
            }
            (_, _, None) => Err(ScriptError::ReadOnly(INDEXER_NAME.into())),
        }
    }
}

/// Single non-negative integral index
fn array_index(args: &[Value], len: usize) -> Result<usize> {
    match args {
        [Value::Number(n)] if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as usize),
        [Value::Number(_)] => Err(out_of_range(args, len)),
        _ => Err(ScriptError::TypeMismatch(
            "arrays and strings are indexed by one number".into(),
        )),
    }
}

fn out_of_range(args: &[Value], len: usize) -> ScriptError {
    let index = args.first().and_then(Value::as_number).unwrap_or(f64::NAN);
    ScriptError::IndexOutOfRange { index, len }
}

fn object_key(args: &[Value]) -> Result<String> {
    match args {
        [key @ (Value::String(_) | Value::Number(_))] => Ok(key.to_string()),
        _ => Err(ScriptError::TypeMismatch(
            "objects are indexed by one string or number".into(),
        )),
    }
}
