//! Runtime values

use crate::ast::FunctionDecl;
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::oop::{ClassId, InstanceObject, MethodImpl};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A script value
///
/// Arrays, objects, functions and instances are shared references;
/// cloning a `Value` never copies them.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<PlainObject>>),
    Function(Rc<Function>),
    Class(ClassId),
    Instance(Rc<InstanceObject>),
}

impl Value {
    pub fn string(text: &str) -> Self {
        Value::String(text.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: PlainObject) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn function(function: Function) -> Self {
        Value::Function(Rc::new(function))
    }

    /// Type name reported by `typeof` and in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality without conversions; references compare by identity
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Elements when destructured or measured by `len`
    pub fn enumerate(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items.borrow().clone()),
            Value::String(s) => Some(s.chars().map(|c| Value::string(&c.to_string())).collect()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n == f64::INFINITY {
        "Infinity".into()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".into()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

/// Write `value`, printing `[...]` / `{...}` for a container that is
/// already being written further up
fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, open: &mut Vec<*const ()>) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Number(n) => write!(f, "{}", format_number(*n)),
        Value::String(s) => write!(f, "{s}"),
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items).cast::<()>();
            if open.contains(&ptr) {
                return write!(f, "[...]");
            }
            open.push(ptr);
            write!(f, "[")?;
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, item, open)?;
            }
            open.pop();
            write!(f, "]")
        }
        Value::Object(object) => {
            let ptr = Rc::as_ptr(object).cast::<()>();
            if open.contains(&ptr) {
                return write!(f, "{{...}}");
            }
            open.push(ptr);
            write!(f, "{{")?;
            for (i, (key, value)) in object.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}: ")?;
                write_value(f, value, open)?;
            }
            open.pop();
            write!(f, "}}")
        }
        Value::Function(function) => write!(f, "[function {}]", function.name()),
        Value::Class(id) => write!(f, "[class #{}]", id.get()),
        Value::Instance(instance) => write!(f, "[instance of #{}]", instance.class().get()),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

/// Key/value object created by object literals
#[derive(Clone, Default)]
pub struct PlainObject {
    properties: BTreeMap<String, Value>,
}

impl PlainObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Property value, `None` when absent
    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.properties.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.properties.iter()
    }
}

impl FromIterator<(String, Value)> for PlainObject {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

/// Callable value
pub enum Function {
    /// Script function closing over its defining scope
    Script {
        decl: Rc<FunctionDecl>,
        closure: RuntimeContext,
    },

    /// Host function
    Native(NativeFunction),

    /// Class method bound to its receiver; `this` is `None` for static methods
    Bound {
        class: ClassId,
        method: MethodImpl,
        this: Option<Value>,
    },
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Script { decl, .. } => decl.display_name(),
            Function::Native(native) => native.name(),
            Function::Bound { method, .. } => method.name(),
        }
    }
}

/// Host function body
pub type NativeFn = dyn Fn(&NativeCall<'_>) -> Result<Value>;

/// Arguments of a host function invocation
pub struct NativeCall<'a> {
    /// Context of the caller; lets host code call back into scripts
    pub context: &'a RuntimeContext,
    pub this: Option<&'a Value>,
    pub args: &'a [Value],
}

impl NativeCall<'_> {
    /// Argument `index`, `null` when missing
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Argument `index` as a number
    pub fn number(&self, index: usize) -> Result<f64> {
        match self.arg(index) {
            Value::Number(n) => Ok(n),
            other => Err(ScriptError::TypeMismatch(format!(
                "argument {} must be a number, got {}",
                index + 1,
                other.type_name()
            ))),
        }
    }

    /// Receiver as a class instance
    pub fn this_instance(&self) -> Result<&Rc<InstanceObject>> {
        match self.this {
            Some(Value::Instance(instance)) => Ok(instance),
            _ => Err(ScriptError::InvalidThis),
        }
    }
}

/// Host function with a variadic calling convention
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    /// Exact argument count, `None` for any
    arity: Option<usize>,
    body: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: &str,
        arity: Option<usize>,
        body: impl Fn(&NativeCall<'_>) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Check the argument count and run the body
    pub fn invoke(&self, call: &NativeCall<'_>) -> Result<Value> {
        if let Some(arity) = self.arity {
            if call.args.len() != arity {
                return Err(ScriptError::ArityMismatch {
                    name: self.name.to_string(),
                    expected: arity.to_string(),
                    got: call.args.len(),
                });
            }
        }
        (self.body)(call)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_strict_equality() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::string("1"));
        assert_ne!(Value::Null, Value::Bool(false));

        let a = Value::array(vec![]);
        assert_eq!(a, a.clone());
        assert_ne!(a, Value::array(vec![]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(
            Value::array(vec![1.0.into(), "a".into(), Value::Null]).to_string(),
            "[1, a, null]"
        );

        let mut object = PlainObject::new();
        object.set("b", true.into());
        object.set("a", 1.0.into());
        assert_eq!(Value::object(object).to_string(), "{a: 1, b: true}");
    }

    #[test]
    fn test_display_of_cyclic_containers() {
        let list = Value::array(vec![Value::Number(1.0)]);
        if let Value::Array(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(list.to_string(), "[1, [...]]");

        let object = Value::object(PlainObject::new());
        if let Value::Object(properties) = &object {
            properties.borrow_mut().set("a", Value::Number(1.0));
            properties.borrow_mut().set("self", object.clone());
        }
        assert_eq!(object.to_string(), "{a: 1, self: {...}}");
        assert_eq!(format!("{object:?}"), "{a: 1, self: {...}}");
    }

    #[test]
    fn test_display_of_shared_containers() {
        // Repeated but acyclic references print in full
        let inner = Value::array(vec![Value::Number(1.0)]);
        let outer = Value::array(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "[[1], [1]]");
    }

    #[test]
    fn test_enumerate() {
        let chars = Value::string("ab").enumerate().unwrap();
        assert_eq!(chars, vec![Value::string("a"), Value::string("b")]);
        assert!(Value::Number(1.0).enumerate().is_none());
    }
}
