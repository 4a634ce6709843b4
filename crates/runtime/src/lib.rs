//! # Tarn Runtime
//!
//! Tree-walking evaluator for the Tarn scripting language.
//!
//! ## Features
//! - Closures and lexical scoping with declaration hoisting
//! - Classes with single inheritance, access modifiers, properties and indexers
//! - Labels and `goto`, `switch` fallthrough, loops with fresh per-iteration scopes
//! - Errors located at the innermost failing node (`<line,column> : message`)
//! - Pluggable value creation, operator semantics and scope storage
//! - Host functions and host classes with a variadic calling convention
//! - Cooperative cancellation checked once per statement
//!
//! ## Threading
//! An interpreter and every value it produces are single-threaded (`Rc`
//! based). Only the `CancellationToken` may be shared with other threads.

pub mod ast;
pub mod builder;
mod builtins;
pub mod context;
pub mod error;
mod evaluator;
pub mod executor;
pub mod interpreter;
pub mod memory;
pub mod objects;
pub mod oop;
pub mod operators;
pub mod runtime;
mod stack;
pub mod value;

pub use context::{ContextKind, RuntimeContext};
pub use error::{Result, ScriptError};
pub use executor::{BlockFlow, ExecuteResult};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use memory::{BindingKind, MemoryCreator, ScopeMemory, VariableMemory};
pub use objects::{DefaultObjectCreator, ObjectCreator};
pub use oop::{ClassId, InstanceObject, NativeClassBuilder};
pub use operators::{OperatorCalculator, OperatorTable};
pub use runtime::Runtime;
pub use value::{Function, NativeCall, NativeFunction, PlainObject, Value};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Route tracing output to the test harness once per process
    pub fn init_logging() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}
