//! Pluggable operator semantics
//!
//! Operators receive their operands unevaluated so that short-circuiting
//! and assigning operators control evaluation themselves. Ternary
//! operators are keyed by both symbols joined by a space (`"? :"`).

use crate::ast::{Expression, Fixity};
use crate::context::RuntimeContext;
use crate::error::{Result, ScriptError};
use crate::value::Value;
use std::collections::HashMap;

pub type UnaryOperator = Box<dyn Fn(&RuntimeContext, &Expression) -> Result<Value>>;
pub type BinaryOperator = Box<dyn Fn(&RuntimeContext, &Expression, &Expression) -> Result<Value>>;
pub type TernaryOperator =
    Box<dyn Fn(&RuntimeContext, &Expression, &Expression, &Expression) -> Result<Value>>;

/// Evaluates operator expressions
pub trait OperatorCalculator {
    fn unary(
        &self,
        context: &RuntimeContext,
        op: &str,
        fixity: Fixity,
        operand: &Expression,
    ) -> Result<Value>;

    fn binary(
        &self,
        context: &RuntimeContext,
        op: &str,
        left: &Expression,
        right: &Expression,
    ) -> Result<Value>;

    fn ternary(
        &self,
        context: &RuntimeContext,
        op: &str,
        first: &Expression,
        second: &Expression,
        third: &Expression,
    ) -> Result<Value>;
}

/// Operator calculator backed by symbol tables
pub struct OperatorTable {
    prefix: HashMap<String, UnaryOperator>,
    postfix: HashMap<String, UnaryOperator>,
    binary: HashMap<String, BinaryOperator>,
    ternary: HashMap<String, TernaryOperator>,
}

/// Binary operators computed from two evaluated operands
const ARITHMETIC: &[&str] = &["+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>"];

impl OperatorTable {
    /// Table without any operator
    pub fn empty() -> Self {
        Self {
            prefix: HashMap::new(),
            postfix: HashMap::new(),
            binary: HashMap::new(),
            ternary: HashMap::new(),
        }
    }

    /// The standard operator set
    pub fn standard() -> Self {
        let mut table = Self::empty();

        for &op in ARITHMETIC {
            table.set_binary(op, move |context, left, right| {
                let left = context.evaluate(left)?;
                let right = context.evaluate(right)?;
                arithmetic(op, &left, &right)
            });
            table.set_binary(&format!("{op}="), move |context, left, right| {
                let current = context.evaluate(left)?;
                let operand = context.evaluate(right)?;
                let result = arithmetic(op, &current, &operand)?;
                context.assign(left, result.clone())?;
                Ok(result)
            });
        }

        for op in ["<", ">", "<=", ">="] {
            table.set_binary(op, move |context, left, right| {
                let left = context.evaluate(left)?;
                let right = context.evaluate(right)?;
                compare(op, &left, &right)
            });
        }

        for (op, negate) in [("==", false), ("===", false), ("!=", true), ("!==", true)] {
            table.set_binary(op, move |context, left, right| {
                let left = context.evaluate(left)?;
                let right = context.evaluate(right)?;
                Ok(Value::Bool(left.strict_equals(&right) != negate))
            });
        }

        table
            .set_binary("=", |context, left, right| {
                let value = context.evaluate(right)?;
                context.assign(left, value.clone())?;
                Ok(value)
            })
            .set_binary("&&", |context, left, right| {
                let left = context.evaluate(left)?;
                if left.is_truthy() {
                    context.evaluate(right)
                } else {
                    Ok(left)
                }
            })
            .set_binary("||", |context, left, right| {
                let left = context.evaluate(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    context.evaluate(right)
                }
            })
            .set_binary("??", |context, left, right| {
                let left = context.evaluate(left)?;
                if left.is_null() {
                    context.evaluate(right)
                } else {
                    Ok(left)
                }
            });

        type Keep = fn(&Value) -> bool;
        let conditional: [(&str, Keep); 3] = [
            ("&&=", |v| !v.is_truthy()),
            ("||=", Value::is_truthy),
            ("??=", |v| !v.is_null()),
        ];
        for (op, keep) in conditional {
            table.set_binary(op, move |context, left, right| {
                let current = context.evaluate(left)?;
                if keep(&current) {
                    return Ok(current);
                }
                let value = context.evaluate(right)?;
                context.assign(left, value.clone())?;
                Ok(value)
            });
        }

        table
            .set_prefix("-", |context, operand| {
                match context.evaluate(operand)? {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(unary_not_supported("-", &other)),
                }
            })
            .set_prefix("+", |context, operand| {
                match context.evaluate(operand)? {
                    Value::Number(n) => Ok(Value::Number(n)),
                    other => Err(unary_not_supported("+", &other)),
                }
            })
            .set_prefix("!", |context, operand| {
                Ok(Value::Bool(!context.evaluate(operand)?.is_truthy()))
            })
            .set_prefix("~", |context, operand| {
                match context.evaluate(operand)? {
                    Value::Number(n) => Ok(Value::Number(!to_i32(n) as f64)),
                    other => Err(unary_not_supported("~", &other)),
                }
            })
            .set_prefix("++", |context, operand| update(context, "++", operand, 1.0, true))
            .set_prefix("--", |context, operand| update(context, "--", operand, -1.0, true))
            .set_postfix("++", |context, operand| update(context, "++", operand, 1.0, false))
            .set_postfix("--", |context, operand| update(context, "--", operand, -1.0, false));

        table.set_ternary("? :", |context, condition, then, otherwise| {
            if context.evaluate(condition)?.is_truthy() {
                context.evaluate(then)
            } else {
                context.evaluate(otherwise)
            }
        });

        table
    }

    pub fn set_prefix(
        &mut self,
        op: &str,
        operator: impl Fn(&RuntimeContext, &Expression) -> Result<Value> + 'static,
    ) -> &mut Self {
        self.prefix.insert(op.to_string(), Box::new(operator));
        self
    }

    pub fn set_postfix(
        &mut self,
        op: &str,
        operator: impl Fn(&RuntimeContext, &Expression) -> Result<Value> + 'static,
    ) -> &mut Self {
        self.postfix.insert(op.to_string(), Box::new(operator));
        self
    }

    pub fn set_binary(
        &mut self,
        op: &str,
        operator: impl Fn(&RuntimeContext, &Expression, &Expression) -> Result<Value> + 'static,
    ) -> &mut Self {
        self.binary.insert(op.to_string(), Box::new(operator));
        self
    }

    pub fn set_ternary(
        &mut self,
        op: &str,
        operator: impl Fn(&RuntimeContext, &Expression, &Expression, &Expression) -> Result<Value>
            + 'static,
    ) -> &mut Self {
        self.ternary.insert(op.to_string(), Box::new(operator));
        self
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl OperatorCalculator for OperatorTable {
    fn unary(
        &self,
        context: &RuntimeContext,
        op: &str,
        fixity: Fixity,
        operand: &Expression,
    ) -> Result<Value> {
        let table = match fixity {
            Fixity::Prefix => &self.prefix,
            Fixity::Postfix => &self.postfix,
        };
        let operator = table
            .get(op)
            .ok_or_else(|| ScriptError::UnknownOperator(op.to_string()))?;
        operator(context, operand)
    }

    fn binary(
        &self,
        context: &RuntimeContext,
        op: &str,
        left: &Expression,
        right: &Expression,
    ) -> Result<Value> {
        let operator = self
            .binary
            .get(op)
            .ok_or_else(|| ScriptError::UnknownOperator(op.to_string()))?;
        operator(context, left, right)
    }

    fn ternary(
        &self,
        context: &RuntimeContext,
        op: &str,
        first: &Expression,
        second: &Expression,
        third: &Expression,
    ) -> Result<Value> {
        let operator = self
            .ternary
            .get(op)
            .ok_or_else(|| ScriptError::UnknownOperator(op.to_string()))?;
        operator(context, first, second, third)
    }
}

/// Two's-complement 32-bit view used by bitwise operators
fn to_i32(n: f64) -> i32 {
    n as i64 as i32
}

fn not_supported(op: &str, left: &Value, right: &Value) -> ScriptError {
    ScriptError::OperatorNotSupported {
        op: op.to_string(),
        operands: format!("{} and {}", left.type_name(), right.type_name()),
    }
}

fn unary_not_supported(op: &str, operand: &Value) -> ScriptError {
    ScriptError::OperatorNotSupported {
        op: op.to_string(),
        operands: operand.type_name().to_string(),
    }
}

fn arithmetic(op: &str, left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::String(_), _) | (_, Value::String(_)) if op == "+" => {
            Ok(Value::from(format!("{left}{right}")))
        }
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                "/" => a / b,
                "%" => a % b,
                "&" => (to_i32(a) & to_i32(b)) as f64,
                "|" => (to_i32(a) | to_i32(b)) as f64,
                "^" => (to_i32(a) ^ to_i32(b)) as f64,
                "<<" => to_i32(a).wrapping_shl(to_i32(b) as u32 & 31) as f64,
                ">>" => to_i32(a).wrapping_shr(to_i32(b) as u32 & 31) as f64,
                _ => return Err(ScriptError::UnknownOperator(op.to_string())),
            };
            Ok(Value::Number(result))
        }
        _ => Err(not_supported(op, left, right)),
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> Result<Value> {
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(not_supported(op, left, right));
    };
    let result = match op {
        "<" => a < b,
        ">" => a > b,
        "<=" => a <= b,
        ">=" => a >= b,
        _ => return Err(ScriptError::UnknownOperator(op.to_string())),
    };
    Ok(Value::Bool(result))
}

/// `++`/`--`; prefix forms yield the new value, postfix forms the old one
fn update(
    context: &RuntimeContext,
    op: &str,
    operand: &Expression,
    delta: f64,
    prefix: bool,
) -> Result<Value> {
    let current = match context.evaluate(operand)? {
        Value::Number(n) => n,
        other => return Err(unary_not_supported(op, &other)),
    };
    let updated = current + delta;
    context.assign(operand, Value::Number(updated))?;
    Ok(Value::Number(if prefix { updated } else { current }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let n = |v: f64| Value::Number(v);
        assert_eq!(arithmetic("+", &n(1.0), &n(2.0)).unwrap(), n(3.0));
        assert_eq!(arithmetic("%", &n(7.0), &n(4.0)).unwrap(), n(3.0));
        assert_eq!(arithmetic("<<", &n(1.0), &n(4.0)).unwrap(), n(16.0));
        assert_eq!(arithmetic("^", &n(6.0), &n(3.0)).unwrap(), n(5.0));
        assert_eq!(arithmetic(">>", &n(-8.0), &n(1.0)).unwrap(), n(-4.0));
    }

    #[test]
    fn test_string_concatenation_only() {
        let s = Value::string("a");
        assert_eq!(arithmetic("+", &s, &Value::Number(1.0)).unwrap(), Value::string("a1"));
        assert_eq!(arithmetic("+", &Value::Null, &s).unwrap(), Value::string("nulla"));
        assert!(matches!(
            arithmetic("-", &s, &Value::Number(1.0)),
            Err(ScriptError::OperatorNotSupported { .. })
        ));
        assert!(matches!(
            compare("<", &s, &s),
            Err(ScriptError::OperatorNotSupported { .. })
        ));
    }

    #[test]
    fn test_non_numeric_arithmetic_rejected() {
        let result = arithmetic("*", &Value::Bool(true), &Value::Number(2.0));
        assert_eq!(
            result,
            Err(ScriptError::OperatorNotSupported {
                op: "*".into(),
                operands: "boolean and number".into(),
            })
        );
    }
}
