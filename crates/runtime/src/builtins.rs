//! Built-in functions registered into every global scope

use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::memory::BindingKind;
use crate::value::{Function, NativeCall, NativeFunction, Value};

/// Declare every builtin in `global`
pub(crate) fn register(global: &RuntimeContext) -> Result<()> {
    let builtins = [
        NativeFunction::new("print", None, builtin_print),
        NativeFunction::new("typeof", Some(1), builtin_typeof),
        NativeFunction::new("len", Some(1), builtin_len),
        NativeFunction::new("str", Some(1), builtin_str),
    ];

    for builtin in builtins {
        let name = builtin.name().to_string();
        global.declare(&name, BindingKind::Function, Value::function(Function::Native(builtin)))?;
    }
    Ok(())
}

/// Write the arguments separated by spaces
fn builtin_print(call: &NativeCall<'_>) -> Result<Value> {
    let line = call
        .args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    let runtime = call.context.runtime();
    tracing::info!(interpreter = %runtime.config().name, "{}", line);
    runtime.record_output(line);
    Ok(Value::Null)
}

fn builtin_typeof(call: &NativeCall<'_>) -> Result<Value> {
    Ok(Value::string(call.arg(0).type_name()))
}

fn builtin_len(call: &NativeCall<'_>) -> Result<Value> {
    let value = call.arg(0);
    let len = match &value {
        Value::Array(items) => items.borrow().len(),
        Value::String(s) => s.chars().count(),
        Value::Object(object) => object.borrow().len(),
        other => {
            return Err(ScriptError::TypeMismatch(format!(
                "len() expects an array, string or object, got {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::Number(len as f64))
}

fn builtin_str(call: &NativeCall<'_>) -> Result<Value> {
    Ok(Value::from(call.arg(0).to_string()))
}
