//! Class records and the class arena

use crate::ast::{Expression, FunctionDecl, Visibility};
use crate::context::RuntimeContext;
use crate::value::{NativeFunction, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Reserved member name of indexers
pub const INDEXER_NAME: &str = "[]";

const PROTECTED_PREFIX: &str = "#";

/// Index of a class in the `ClassRegistry`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub fn get(&self) -> usize {
        self.0
    }
}

/// Member table key encoding visibility
pub fn mangle(visibility: Visibility, class_name: &str, name: &str) -> String {
    match visibility {
        Visibility::Public => name.to_string(),
        Visibility::Protected => format!("{PROTECTED_PREFIX}{name}"),
        Visibility::Private => format!("{class_name}::{name}"),
    }
}

/// Name of the hidden field behind an auto-property
pub(crate) fn backing_field_name(property: &str) -> String {
    format!("<{property}>")
}

/// Static or instance half of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Instance,
    Static,
}

/// Method body
#[derive(Clone)]
pub enum MethodImpl {
    Script(Rc<FunctionDecl>),
    Native(NativeFunction),
}

impl MethodImpl {
    pub fn name(&self) -> &str {
        match self {
            MethodImpl::Script(decl) => decl.display_name(),
            MethodImpl::Native(native) => native.name(),
        }
    }
}

impl fmt::Debug for MethodImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodImpl({})", self.name())
    }
}

/// Entry of a member table
#[derive(Debug, Clone)]
pub enum ClassMember {
    Method(MethodImpl),
    Property {
        getter: Option<MethodImpl>,
        setter: Option<MethodImpl>,
    },
    Indexer {
        getter: Option<MethodImpl>,
        setter: Option<MethodImpl>,
    },
}

/// Declared instance field, initialized on construction
#[derive(Debug, Clone)]
pub struct FieldSlot {
    pub key: String,
    pub initializer: Option<Expression>,
}

/// Where method bodies come from
#[derive(Clone)]
pub enum ClassKind {
    /// Declared by script; methods run in the defining scope
    Script {
        closure: RuntimeContext,
        constructor: Option<Rc<FunctionDecl>>,
    },
    /// Declared by the host
    Native { constructor: Option<NativeFunction> },
}

/// A class; closed once registered
pub struct ClassObject {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) super_class: Option<ClassId>,
    pub(crate) kind: ClassKind,
    pub(crate) instance_members: HashMap<String, ClassMember>,
    pub(crate) static_members: HashMap<String, ClassMember>,
    pub(crate) instance_fields: Vec<FieldSlot>,
    pub(crate) static_fields: RefCell<HashMap<String, Value>>,
}

impl ClassObject {
    pub(crate) fn new(name: &str, super_class: Option<ClassId>, kind: ClassKind) -> Self {
        Self {
            id: ClassId(0),
            name: name.to_string(),
            super_class,
            kind,
            instance_members: HashMap::new(),
            static_members: HashMap::new(),
            instance_fields: Vec::new(),
            static_fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn super_class(&self) -> Option<ClassId> {
        self.super_class
    }

    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    pub fn members(&self, side: Side) -> &HashMap<String, ClassMember> {
        match side {
            Side::Instance => &self.instance_members,
            Side::Static => &self.static_members,
        }
    }

    /// Whether `key` names a declared field on `side`
    pub fn has_field(&self, side: Side, key: &str) -> bool {
        match side {
            Side::Instance => self.instance_fields.iter().any(|f| f.key == key),
            Side::Static => self.static_fields.borrow().contains_key(key),
        }
    }

    pub fn static_field(&self, key: &str) -> Option<Value> {
        self.static_fields.borrow().get(key).cloned()
    }

    pub(crate) fn set_static_field(&self, key: &str, value: Value) {
        self.static_fields.borrow_mut().insert(key.to_string(), value);
    }
}

impl fmt::Debug for ClassObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("super_class", &self.super_class)
            .finish()
    }
}

/// Arena of every class of an interpreter
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<Rc<ClassObject>>,
}

impl ClassRegistry {
    /// Add `class`, assigning its id
    pub fn insert(&mut self, mut class: ClassObject) -> ClassId {
        let id = ClassId(self.classes.len());
        class.id = id;
        self.classes.push(Rc::new(class));
        id
    }

    pub fn get(&self, id: ClassId) -> Option<Rc<ClassObject>> {
        self.classes.get(id.0).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Whether `ancestor` is a proper superclass of `class`
    pub fn is_extended_from(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = self.get(class).and_then(|c| c.super_class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|c| c.super_class);
        }
        false
    }
}
