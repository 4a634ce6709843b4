//! Pluggable scope storage
//!
//! Declarations are two-phase: a hoisting pass reserves every name of a
//! statement sequence before it runs, and the declaring statement later
//! assigns it. Between the two a lookup reports `Lookup::Unassigned`.

use crate::error::{Result, ScriptError};
use crate::value::Value;
use std::collections::HashMap;

/// What introduced a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Variable,
    Parameter,
    Function,
    Class,
}

impl BindingKind {
    /// Whether assignment may replace the value
    pub fn is_mutable(self) -> bool {
        matches!(self, BindingKind::Variable | BindingKind::Parameter)
    }
}

/// Result of looking a name up in one scope
#[derive(Debug, Clone)]
pub enum Lookup {
    Missing,
    Unassigned,
    Found(Value),
}

/// Storage of one scope
pub trait VariableMemory {
    /// Reserve `name`; fails if the scope already has it
    fn hoist(&mut self, name: &str, kind: BindingKind) -> Result<()>;

    /// Give `name` its declared value, reserving it if needed
    fn declare(&mut self, name: &str, kind: BindingKind, value: Value) -> Result<()>;

    fn lookup(&self, name: &str) -> Lookup;

    /// Replace the value of `name`; `Ok(false)` if this scope does not have it
    fn assign(&mut self, name: &str, value: Value) -> Result<bool>;

    fn contains(&self, name: &str) -> bool;
}

/// Creates the memory of every new scope
pub trait MemoryCreator {
    fn create(&self) -> Box<dyn VariableMemory>;
}

#[derive(Debug, Clone)]
struct Binding {
    kind: BindingKind,
    value: Option<Value>,
}

/// Default scope storage backed by a map
#[derive(Debug, Default)]
pub struct ScopeMemory {
    bindings: HashMap<String, Binding>,
}

impl ScopeMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariableMemory for ScopeMemory {
    fn hoist(&mut self, name: &str, kind: BindingKind) -> Result<()> {
        if self.bindings.contains_key(name) {
            return Err(ScriptError::AlreadyDeclared(name.to_string()));
        }
        self.bindings
            .insert(name.to_string(), Binding { kind, value: None });
        Ok(())
    }

    fn declare(&mut self, name: &str, kind: BindingKind, value: Value) -> Result<()> {
        self.bindings.insert(
            name.to_string(),
            Binding {
                kind,
                value: Some(value),
            },
        );
        Ok(())
    }

    fn lookup(&self, name: &str) -> Lookup {
        match self.bindings.get(name) {
            None => Lookup::Missing,
            Some(Binding { value: None, .. }) => Lookup::Unassigned,
            Some(Binding {
                value: Some(value), ..
            }) => Lookup::Found(value.clone()),
        }
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<bool> {
        let Some(binding) = self.bindings.get_mut(name) else {
            return Ok(false);
        };
        if binding.value.is_none() {
            return Err(ScriptError::Unassigned(name.to_string()));
        }
        if !binding.kind.is_mutable() {
            return Err(ScriptError::ConstantBinding(name.to_string()));
        }
        binding.value = Some(value);
        Ok(true)
    }

    fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Creates a `ScopeMemory` per scope
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMemoryCreator;

impl MemoryCreator for DefaultMemoryCreator {
    fn create(&self) -> Box<dyn VariableMemory> {
        Box::new(ScopeMemory::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_phase_declaration() {
        let mut memory = ScopeMemory::new();
        assert!(matches!(memory.lookup("x"), Lookup::Missing));

        memory.hoist("x", BindingKind::Variable).unwrap();
        assert!(matches!(memory.lookup("x"), Lookup::Unassigned));
        assert_eq!(
            memory.assign("x", Value::Null),
            Err(ScriptError::Unassigned("x".into()))
        );

        memory.declare("x", BindingKind::Variable, 1.0.into()).unwrap();
        assert!(matches!(memory.lookup("x"), Lookup::Found(Value::Number(n)) if n == 1.0));
        assert_eq!(memory.assign("x", 2.0.into()), Ok(true));
    }

    #[test]
    fn test_duplicate_hoist() {
        let mut memory = ScopeMemory::new();
        memory.hoist("f", BindingKind::Function).unwrap();
        assert_eq!(
            memory.hoist("f", BindingKind::Variable),
            Err(ScriptError::AlreadyDeclared("f".into()))
        );
    }

    #[test]
    fn test_constant_bindings() {
        let mut memory = ScopeMemory::new();
        memory.declare("C", BindingKind::Class, Value::Null).unwrap();
        assert_eq!(
            memory.assign("C", 1.0.into()),
            Err(ScriptError::ConstantBinding("C".into()))
        );
    }

    #[test]
    fn test_assign_missing() {
        let mut memory = ScopeMemory::new();
        assert_eq!(memory.assign("nope", Value::Null), Ok(false));
        assert!(!memory.contains("nope"));
    }
}
