//! Value factory used by the evaluator

use crate::ast::FunctionDecl;
use crate::context::RuntimeContext;
use crate::oop::ClassId;
use crate::value::{Function, PlainObject, Value};
use std::rc::Rc;

/// Materializes literal, function, class, array and object values.
///
/// Every method has the one-to-one default; embedders override the ones
/// they want to intercept.
pub trait ObjectCreator {
    fn null(&self) -> Value {
        Value::Null
    }

    fn boolean(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn number(&self, value: f64) -> Value {
        Value::Number(value)
    }

    fn string(&self, value: &Rc<str>) -> Value {
        Value::String(Rc::clone(value))
    }

    fn array(&self, items: Vec<Value>) -> Value {
        Value::array(items)
    }

    fn object(&self, properties: Vec<(String, Value)>) -> Value {
        Value::object(properties.into_iter().collect::<PlainObject>())
    }

    fn function(&self, decl: Rc<FunctionDecl>, closure: RuntimeContext) -> Value {
        Value::function(Function::Script { decl, closure })
    }

    fn class(&self, id: ClassId) -> Value {
        Value::Class(id)
    }
}

/// The one-to-one object creator
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultObjectCreator;

impl ObjectCreator for DefaultObjectCreator {}
