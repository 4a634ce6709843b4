//! Builds class records from class declarations

use super::{
    backing_field_name, mangle, ClassId, ClassKind, ClassMember, ClassObject, FieldSlot,
    MethodImpl, Side, INDEXER_NAME,
};
use crate::ast::{AccessorBody, ClassDecl, Expression, FunctionDecl, MemberDecl, MemberKind, Visibility};
use crate::builder;
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::value::Value;
use std::rc::Rc;

/// Class under construction
struct ClassDraft {
    class: ClassObject,
    constructor: Option<Rc<FunctionDecl>>,
    static_initializers: Vec<(String, Expression)>,
}

impl ClassDraft {
    fn side(is_static: bool) -> Side {
        if is_static {
            Side::Static
        } else {
            Side::Instance
        }
    }

    fn ensure_unique(&self, side: Side, key: &str, name: &str) -> Result<()> {
        if self.class.members(side).contains_key(key) || self.class.has_field(side, key) {
            return Err(ScriptError::DuplicateMember {
                class: self.class.name.clone(),
                member: name.to_string(),
            });
        }
        Ok(())
    }

    fn add_field(&mut self, side: Side, key: String, initializer: Option<Expression>) {
        match side {
            Side::Instance => self.class.instance_fields.push(FieldSlot { key, initializer }),
            Side::Static => {
                self.class.static_fields.get_mut().insert(key.clone(), Value::Null);
                if let Some(initializer) = initializer {
                    self.static_initializers.push((key, initializer));
                }
            }
        }
    }

    fn add_member(&mut self, side: Side, key: String, member: ClassMember) {
        match side {
            Side::Instance => self.class.instance_members.insert(key, member),
            Side::Static => self.class.static_members.insert(key, member),
        };
    }

    fn add(&mut self, decl: &MemberDecl) -> Result<()> {
        let side = Self::side(decl.is_static);
        let key = mangle(decl.visibility, &self.class.name, &decl.name);

        match &decl.kind {
            MemberKind::Field { initializer } => {
                self.ensure_unique(side, &key, &decl.name)?;
                self.add_field(side, key, initializer.clone());
            }
            MemberKind::Method(function) => {
                self.ensure_unique(side, &key, &decl.name)?;
                self.add_member(side, key, ClassMember::Method(MethodImpl::Script(Rc::clone(function))));
            }
            MemberKind::Constructor(function) => {
                if decl.is_static || self.constructor.is_some() {
                    return Err(ScriptError::DuplicateMember {
                        class: self.class.name.clone(),
                        member: "constructor".into(),
                    });
                }
                self.constructor = Some(Rc::clone(function));
            }
            MemberKind::Property {
                getter,
                setter,
                initializer,
            } => {
                self.ensure_unique(side, &key, &decl.name)?;
                self.add_property(decl, side, key, getter, setter, initializer)?;
            }
            MemberKind::Indexer { getter, setter } => {
                let key = mangle(decl.visibility, &self.class.name, INDEXER_NAME);
                let has_indexer = self
                    .class
                    .members(side)
                    .values()
                    .any(|member| matches!(member, ClassMember::Indexer { .. }));
                if has_indexer {
                    return Err(ScriptError::DuplicateIndexer(self.class.name.clone()));
                }
                self.add_member(
                    side,
                    key,
                    ClassMember::Indexer {
                        getter: getter.clone().map(MethodImpl::Script),
                        setter: setter.clone().map(MethodImpl::Script),
                    },
                );
            }
        }
        Ok(())
    }

    /// Auto accessors become a private backing field plus generated bodies
    /// reading and writing it through `this`
    fn add_property(
        &mut self,
        decl: &MemberDecl,
        side: Side,
        key: String,
        getter: &Option<AccessorBody>,
        setter: &Option<AccessorBody>,
        initializer: &Option<Expression>,
    ) -> Result<()> {
        let is_auto = matches!(getter, Some(AccessorBody::Auto))
            || matches!(setter, Some(AccessorBody::Auto));
        let backing_name = backing_field_name(&decl.name);

        if is_auto {
            let backing_key = mangle(Visibility::Private, &self.class.name, &backing_name);
            self.ensure_unique(side, &backing_key, &backing_name)?;
            self.add_field(side, backing_key, initializer.clone());
        } else if initializer.is_some() {
            return Err(ScriptError::TypeMismatch(format!(
                "property '{}' has accessor bodies and cannot take an initializer",
                decl.name
            )));
        }

        let getter = getter.as_ref().map(|body| {
            accessor(body, || {
                let read = builder::member(builder::this(), &backing_name);
                located(builder::function(
                    Some(&decl.name),
                    vec![],
                    vec![builder::return_stmt(Some(read))],
                ), decl)
            })
        });
        let setter = setter.as_ref().map(|body| {
            accessor(body, || {
                let write = builder::assign(
                    builder::member(builder::this(), &backing_name),
                    builder::ident("value"),
                );
                located(builder::function(
                    Some(&decl.name),
                    vec![builder::param("value")],
                    vec![builder::expr(write)],
                ), decl)
            })
        });

        self.add_member(side, key, ClassMember::Property { getter, setter });
        Ok(())
    }
}

fn accessor(body: &AccessorBody, synthesize: impl FnOnce() -> Rc<FunctionDecl>) -> MethodImpl {
    match body {
        AccessorBody::Auto => MethodImpl::Script(synthesize()),
        AccessorBody::Body(function) => MethodImpl::Script(Rc::clone(function)),
    }
}

/// Give a generated accessor the position of its property
fn located(function: Rc<FunctionDecl>, decl: &MemberDecl) -> Rc<FunctionDecl> {
    let mut function = Rc::unwrap_or_clone(function);
    function.pragma = decl.pragma;
    for statement in &mut function.body {
        statement.pragma = decl.pragma;
    }
    Rc::new(function)
}

impl RuntimeContext {
    /// Build and register the class declared by `decl`, closing over this context
    pub fn create_class(&self, decl: &ClassDecl) -> Result<ClassId> {
        let super_class = match &decl.extends {
            Some(expression) => match self.evaluate(expression)? {
                Value::Class(id) => Some(id),
                other => {
                    return Err(ScriptError::NotAClass(other.type_name().into()).at(expression.pragma))
                }
            },
            None => None,
        };

        let mut draft = ClassDraft {
            class: ClassObject::new(
                &decl.name,
                super_class,
                ClassKind::Script {
                    closure: self.clone(),
                    constructor: None,
                },
            ),
            constructor: None,
            static_initializers: Vec::new(),
        };

        for member in &decl.members {
            draft.add(member).map_err(|e| e.at(member.pragma))?;
        }

        let ClassDraft {
            mut class,
            constructor,
            static_initializers,
        } = draft;
        class.kind = ClassKind::Script {
            closure: self.clone(),
            constructor,
        };

        let runtime = Rc::clone(self.runtime());
        let id = runtime.register_class(class);
        tracing::debug!(class = %decl.name, id = id.get(), ?super_class, "class created");

        let class = runtime.class(id)?;
        let static_context = RuntimeContext::method(self, id, None);
        for (key, initializer) in &static_initializers {
            let value = static_context.evaluate(initializer)?;
            class.set_static_field(key, value);
        }

        Ok(id)
    }
}
