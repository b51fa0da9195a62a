//! The builtin operator set.
//!
//! Each group registers through the same [`FunctionRegistry::register`]
//! boundary a host application uses for its own operators (mission and
//! ship predicates live host-side; they need game state this core does not
//! have). Argument values arriving in a routine are already evaluated and
//! type-checked against the descriptor.
//!
//! Mixed integer/float arithmetic goes through `rust_decimal` so that
//! mathematically whole results stay integers: `(+ 1 0.5)` is `1.5`, but
//! `(* 2 1.5)` is the integer `3`.

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    evaluator::EvalError,
    registry::{FunctionDescriptor, FunctionRegistry, RegistryError},
    value::{Value, ValueType},
};

/// Register every builtin group.
pub fn register_builtins(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    register_arithmetic(registry)?;
    register_comparison(registry)?;
    register_logic(registry)?;
    register_strings(registry)?;
    register_variables(registry)?;
    Ok(())
}

/// A registry preloaded with the builtin operator set.
pub fn standard_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    register_builtins(&mut registry)
        .expect("builtin registration cannot collide in an empty registry");
    registry
}

// ========================================
// Arithmetic
// ========================================

#[derive(Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Fold a Decimal result back into a value, preserving integers when the
/// result is mathematically whole.
fn decimal_result(rd: Decimal) -> Option<Value> {
    if rd.is_integer()
        && let Some(r) = rd.to_i64()
    {
        return Some(Value::Integer(r));
    }
    rd.to_f64().map(Value::Float)
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

fn apply_arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            ArithOp::Add => Ok(Value::Integer(a.wrapping_add(*b))),
            ArithOp::Sub => Ok(Value::Integer(a.wrapping_sub(*b))),
            ArithOp::Mul => Ok(Value::Integer(a.wrapping_mul(*b))),
            ArithOp::Div => {
                if *b == 0 {
                    return Err(EvalError::division_by_zero());
                }
                // Exact division stays an integer; otherwise fall to float
                if a % b == 0 {
                    Ok(Value::Integer(a / b))
                } else {
                    Ok(Value::Float(*a as f64 / *b as f64))
                }
            }
            ArithOp::Mod => {
                if *b == 0 {
                    return Err(EvalError::division_by_zero());
                }
                Ok(Value::Integer(a % b))
            }
        },
        (Value::Float(a), Value::Float(b)) => match op {
            ArithOp::Add => Ok(Value::Float(a + b)),
            ArithOp::Sub => Ok(Value::Float(a - b)),
            ArithOp::Mul => Ok(Value::Float(a * b)),
            ArithOp::Div => {
                if *b == 0.0 {
                    return Err(EvalError::division_by_zero());
                }
                Ok(Value::Float(a / b))
            }
            ArithOp::Mod => {
                if *b == 0.0 {
                    return Err(EvalError::division_by_zero());
                }
                Ok(Value::Float(a % b))
            }
        },
        (a, b) => {
            if matches!(op, ArithOp::Div | ArithOp::Mod) && b.as_float() == 0.0 {
                return Err(EvalError::division_by_zero());
            }
            if let Some(ad) = to_decimal(a)
                && let Some(bd) = to_decimal(b)
            {
                let rd = match op {
                    ArithOp::Add => ad + bd,
                    ArithOp::Sub => ad - bd,
                    ArithOp::Mul => ad * bd,
                    ArithOp::Div => ad / bd,
                    ArithOp::Mod => ad % bd,
                };
                if let Some(result) = decimal_result(rd) {
                    return Ok(result);
                }
            }
            let (af, bf) = (a.as_float(), b.as_float());
            Ok(Value::Float(match op {
                ArithOp::Add => af + bf,
                ArithOp::Sub => af - bf,
                ArithOp::Mul => af * bf,
                ArithOp::Div => af / bf,
                ArithOp::Mod => af % bf,
            }))
        }
    }
}

fn fold_arith(op: ArithOp, args: &[Value]) -> Result<Value, EvalError> {
    let mut result = args[0].clone();
    for arg in &args[1..] {
        result = apply_arith(op, &result, arg)?;
    }
    Ok(result)
}

fn register_arithmetic(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    let number = vec![ValueType::Number];

    registry.register(FunctionDescriptor::new(
        "+",
        2,
        None,
        number.clone(),
        |_, args| fold_arith(ArithOp::Add, args),
    ))?;
    registry.register(FunctionDescriptor::new(
        "-",
        1,
        None,
        number.clone(),
        |_, args| {
            // Unary minus negates; otherwise subtract left to right
            if args.len() == 1 {
                return apply_arith(ArithOp::Sub, &Value::Integer(0), &args[0]);
            }
            fold_arith(ArithOp::Sub, args)
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "*",
        2,
        None,
        number.clone(),
        |_, args| fold_arith(ArithOp::Mul, args),
    ))?;
    registry.register(FunctionDescriptor::new(
        "/",
        2,
        None,
        number.clone(),
        |_, args| fold_arith(ArithOp::Div, args),
    ))?;
    registry.register(FunctionDescriptor::new(
        "mod",
        2,
        Some(2),
        number.clone(),
        |_, args| apply_arith(ArithOp::Mod, &args[0], &args[1]),
    ))?;
    registry.register(FunctionDescriptor::new(
        "abs",
        1,
        Some(1),
        number.clone(),
        |_, args| match &args[0] {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_abs())),
            Value::Float(n) => Ok(Value::Float(n.abs())),
            other => Err(EvalError::type_error(format!(
                "abs requires a number, got {}",
                other.type_name()
            ))),
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "min",
        1,
        None,
        number.clone(),
        |_, args| {
            let mut best = args[0].clone();
            for arg in &args[1..] {
                if arg.as_float() < best.as_float() {
                    best = arg.clone();
                }
            }
            Ok(best)
        },
    ))?;
    registry.register(FunctionDescriptor::new("max", 1, None, number, |_, args| {
        let mut best = args[0].clone();
        for arg in &args[1..] {
            if arg.as_float() > best.as_float() {
                best = arg.clone();
            }
        }
        Ok(best)
    }))?;
    Ok(())
}

// ========================================
// Comparison
// ========================================

/// Equality across the closed value set: numbers compare numerically
/// (so `(= 2 2.0)` holds), strings and booleans compare strictly.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            a.as_float() == b.as_float()
        }
        _ => false,
    }
}

fn register_comparison(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    registry.register(FunctionDescriptor::new(
        "=",
        2,
        None,
        vec![ValueType::Any],
        |_, args| {
            Ok(Value::Boolean(
                args.windows(2).all(|w| values_equal(&w[0], &w[1])),
            ))
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "!=",
        2,
        Some(2),
        vec![ValueType::Any],
        |_, args| Ok(Value::Boolean(!values_equal(&args[0], &args[1]))),
    ))?;

    // Ordered comparisons chain pairwise: (< 1 2 3) checks 1<2 and 2<3
    let ordered: [(&str, fn(f64, f64) -> bool); 4] = [
        ("<", |a, b| a < b),
        (">", |a, b| a > b),
        ("<=", |a, b| a <= b),
        (">=", |a, b| a >= b),
    ];
    for (name, cmp) in ordered {
        registry.register(FunctionDescriptor::new(
            name,
            2,
            None,
            vec![ValueType::Number],
            move |_, args| {
                Ok(Value::Boolean(
                    args.windows(2).all(|w| cmp(w[0].as_float(), w[1].as_float())),
                ))
            },
        ))?;
    }
    Ok(())
}

// ========================================
// Logic
// ========================================

fn register_logic(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    registry.register(FunctionDescriptor::new(
        "true",
        0,
        Some(0),
        vec![],
        |_, _| Ok(Value::Boolean(true)),
    ))?;
    registry.register(FunctionDescriptor::new(
        "false",
        0,
        Some(0),
        vec![],
        |_, _| Ok(Value::Boolean(false)),
    ))?;
    registry.register(FunctionDescriptor::new(
        "not",
        1,
        Some(1),
        vec![ValueType::Boolean],
        |_, args| Ok(Value::Boolean(!args[0].as_bool())),
    ))?;

    // `and` / `or` are short-circuit special forms in the evaluator; these
    // descriptors exist so lookup, arity validation, and search see them.
    registry.register(FunctionDescriptor::new(
        "and",
        1,
        None,
        vec![ValueType::Boolean],
        |_, args| Ok(Value::Boolean(args.iter().all(Value::as_bool))),
    ))?;
    registry.register(FunctionDescriptor::new(
        "or",
        1,
        None,
        vec![ValueType::Boolean],
        |_, args| Ok(Value::Boolean(args.iter().any(Value::as_bool))),
    ))?;
    Ok(())
}

// ========================================
// Strings
// ========================================

fn register_strings(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    registry.register(FunctionDescriptor::new(
        "string-concat",
        1,
        None,
        vec![ValueType::String],
        |_, args| {
            Ok(Value::String(
                args.iter().map(Value::as_string).collect::<String>(),
            ))
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "string-length",
        1,
        Some(1),
        vec![ValueType::String],
        |_, args| Ok(Value::Integer(args[0].as_string().chars().count() as i64)),
    ))?;
    registry.register(FunctionDescriptor::new(
        "string-contains",
        2,
        Some(2),
        vec![ValueType::String],
        |_, args| {
            Ok(Value::Boolean(
                args[0].as_string().contains(&args[1].as_string()),
            ))
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "string-matches",
        2,
        Some(2),
        vec![ValueType::String],
        |_, args| {
            let pattern = args[1].as_string();
            let re = regex::Regex::new(&pattern)
                .map_err(|e| EvalError::type_error(format!("invalid regex: {e}")))?;
            Ok(Value::Boolean(re.is_match(&args[0].as_string())))
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "number-to-string",
        1,
        Some(1),
        vec![ValueType::Number],
        |_, args| Ok(Value::String(args[0].as_string())),
    ))?;
    registry.register(FunctionDescriptor::new(
        "string-to-number",
        1,
        Some(1),
        vec![ValueType::String],
        |_, args| Ok(args[0].coerce_to(ValueType::Number)),
    ))?;
    Ok(())
}

// ========================================
// Variables
// ========================================

fn register_variables(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    // Special form: the evaluator handles the variable reference itself.
    // The descriptor carries the signature for validation and search.
    registry.register(FunctionDescriptor::new(
        "modify-variable",
        2,
        Some(2),
        vec![ValueType::Any],
        |_, _| {
            Err(EvalError::type_error(
                "modify-variable is evaluated as a special form",
            ))
        },
    ))?;
    registry.register(FunctionDescriptor::new(
        "is-variable-defined",
        1,
        Some(1),
        vec![ValueType::String],
        |ctx, args| Ok(Value::Boolean(ctx.store.is_defined(&args[0].as_string()))),
    ))?;
    Ok(())
}
