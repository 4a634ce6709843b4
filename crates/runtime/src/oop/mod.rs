//! Object model: classes, instances and member resolution

mod class;
mod creator;
mod instance;
mod native;
mod resolve;

pub use class::{
    mangle, ClassId, ClassKind, ClassMember, ClassObject, ClassRegistry, FieldSlot, MethodImpl,
    Side, INDEXER_NAME,
};
pub(crate) use class::backing_field_name;
pub use instance::InstanceObject;
pub use native::NativeClassBuilder;
