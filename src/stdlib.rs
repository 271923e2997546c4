/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Built-in native functions available to every default environment.
//!
//! Hosts can register additional functions (or shadow these) through
//! [`Env::register_function`](crate::Env::register_function).

use crate::Config;
use crate::runtime::{ApproxValue, Env, RuntimeError, Value, compare_values, value_eq};
use crate::ast::CmpOp;

/// Registers the standard functions into an environment.
pub(crate) fn register_builtins(env: &mut Env) {
    env.register_function("len", builtin_len);
    env.register_function("abs", builtin_abs);
    env.register_function("min", builtin_min);
    env.register_function("max", builtin_max);
    env.register_function("sum", builtin_sum);
    env.register_function("str", builtin_str);
    env.register_function("keys", builtin_keys);
    env.register_function("contains", builtin_contains);
    env.register_function("approx", builtin_approx);
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::Arity {
            name: name.to_string(),
            expected: expected.to_string(),
            got: args.len(),
        });
    }
    Ok(())
}

fn builtin_len(args: &[Value], _config: &Config) -> Result<Value, RuntimeError> {
    expect_arity("len", args, 1)?;
    let length = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(RuntimeError::Type(format!(
                "len() is not defined for {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(length as i64))
}

fn builtin_abs(args: &[Value], _config: &Config) -> Result<Value, RuntimeError> {
    expect_arity("abs", args, 1)?;
    match &args[0] {
        Value::Int(v) => v
            .checked_abs()
            .map(Value::Int)
            .ok_or(RuntimeError::Overflow("abs")),
        Value::Float(v) => Ok(Value::Float(v.abs())),
        // Complex magnitude is a real number.
        Value::Complex { re, im } => Ok(Value::Float((re * re + im * im).sqrt())),
        other => Err(RuntimeError::Type(format!(
            "abs() is not defined for {}",
            other.type_name()
        ))),
    }
}

/// Extracts the element list for `min`/`max`/`sum` aggregate builtins.
fn aggregate_items<'a>(name: &str, args: &'a [Value]) -> Result<&'a [Value], RuntimeError> {
    match args {
        [Value::List(items)] => Ok(items),
        [] | [_] => Err(RuntimeError::Type(format!(
            "{name}() expects a list argument"
        ))),
        // Two-or-more scalar arguments behave like an inline list.
        many => Ok(many),
    }
}

fn builtin_min(args: &[Value], config: &Config) -> Result<Value, RuntimeError> {
    fold_extremum("min", CmpOp::Lt, args, config)
}

fn builtin_max(args: &[Value], config: &Config) -> Result<Value, RuntimeError> {
    fold_extremum("max", CmpOp::Gt, args, config)
}

fn fold_extremum(
    name: &str,
    op: CmpOp,
    args: &[Value],
    config: &Config,
) -> Result<Value, RuntimeError> {
    let items = aggregate_items(name, args)?;
    let Some(first) = items.first() else {
        return Err(RuntimeError::Type(format!(
            "{name}() of an empty sequence"
        )));
    };
    let mut best = first.clone();
    for item in &items[1..] {
        if compare_values(op, item, &best, config)? {
            best = item.clone();
        }
    }
    Ok(best)
}

fn builtin_sum(args: &[Value], _config: &Config) -> Result<Value, RuntimeError> {
    let items = aggregate_items("sum", args)?;
    let mut int_total: i64 = 0;
    let mut real_total: f64 = 0.0;
    let mut imag_total: f64 = 0.0;
    let mut all_ints = true;
    let mut any_complex = false;
    for item in items {
        match item {
            Value::Int(v) => {
                int_total = int_total
                    .checked_add(*v)
                    .ok_or(RuntimeError::Overflow("sum"))?;
                real_total += *v as f64;
            }
            Value::Float(v) => {
                all_ints = false;
                real_total += v;
            }
            Value::Complex { re, im } => {
                all_ints = false;
                any_complex = true;
                real_total += re;
                imag_total += im;
            }
            other => {
                return Err(RuntimeError::Type(format!(
                    "sum() is not defined for {} elements",
                    other.type_name()
                )));
            }
        }
    }
    if any_complex {
        Ok(Value::Complex {
            re: real_total,
            im: imag_total,
        })
    } else if all_ints {
        Ok(Value::Int(int_total))
    } else {
        Ok(Value::Float(real_total))
    }
}

fn builtin_str(args: &[Value], config: &Config) -> Result<Value, RuntimeError> {
    expect_arity("str", args, 1)?;
    Ok(Value::Str(match &args[0] {
        Value::Str(s) => s.clone(),
        other => crate::format::repr(other, config),
    }))
}

fn builtin_keys(args: &[Value], _config: &Config) -> Result<Value, RuntimeError> {
    expect_arity("keys", args, 1)?;
    match &args[0] {
        Value::Map(entries) => Ok(Value::List(
            entries.keys().map(|key| Value::Str(key.clone())).collect(),
        )),
        other => Err(RuntimeError::Type(format!(
            "keys() is not defined for {}",
            other.type_name()
        ))),
    }
}

fn builtin_contains(args: &[Value], config: &Config) -> Result<Value, RuntimeError> {
    expect_arity("contains", args, 2)?;
    let found = match &args[0] {
        Value::List(items) => items.iter().any(|item| value_eq(item, &args[1], config)),
        Value::Str(s) => match &args[1] {
            Value::Str(sub) => s.contains(sub.as_str()),
            other => {
                return Err(RuntimeError::Type(format!(
                    "contains() over a str requires a str needle, found {}",
                    other.type_name()
                )));
            }
        },
        Value::Map(entries) => match &args[1] {
            Value::Str(key) => entries.contains_key(key),
            other => {
                return Err(RuntimeError::Type(format!(
                    "contains() over a map requires a str key, found {}",
                    other.type_name()
                )));
            }
        },
        other => {
            return Err(RuntimeError::Type(format!(
                "contains() is not defined for {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::Bool(found))
}

/// `approx(expected)`, `approx(expected, rel)`, `approx(expected, rel, abs)`.
fn builtin_approx(args: &[Value], _config: &Config) -> Result<Value, RuntimeError> {
    if args.is_empty() || args.len() > 3 {
        return Err(RuntimeError::Arity {
            name: "approx".to_string(),
            expected: "1 to 3".to_string(),
            got: args.len(),
        });
    }
    let mut approx = ApproxValue::new(args[0].clone())?;
    if let Some(rel) = args.get(1) {
        let Some(rel) = rel.as_real() else {
            return Err(RuntimeError::Type(format!(
                "approx() relative tolerance must be a real number, found {}",
                rel.type_name()
            )));
        };
        approx = approx.with_rel(rel);
    }
    if let Some(abs) = args.get(2) {
        let Some(abs) = abs.as_real() else {
            return Err(RuntimeError::Type(format!(
                "approx() absolute tolerance must be a real number, found {}",
                abs.type_name()
            )));
        };
        approx = approx.with_abs(abs);
    }
    Ok(Value::Approx(approx))
}
