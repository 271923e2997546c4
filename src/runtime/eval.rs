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

//! Single-pass expression evaluation with optional value capture.
//!
//! Every expression is evaluated exactly once, in source order, whether or
//! not capture is armed; instrumentation only adds value clones for call
//! and attribute nodes, never re-evaluation.

use super::{Env, RuntimeError, Value};
use crate::Config;
use crate::ast::{BinOp, BoolOp, CmpOp, Expr, ExprKind, SourceSpan};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One captured call/attribute value for a `where` elaboration line.
#[derive(Debug, Clone)]
pub(crate) struct WhereCapture {
    /// Value the node evaluated to.
    pub value: Value,
    /// Source span of the node, for reconstructing its text.
    pub span: SourceSpan,
    /// Nesting depth relative to the enclosing operand (1 = outermost).
    pub depth: usize,
}

/// Collector for call/attribute values captured during one evaluation.
///
/// A disarmed sink tracks depth but records nothing, so the plain path
/// performs no clones.
#[derive(Debug)]
pub(crate) struct CaptureSink {
    records: Vec<WhereCapture>,
    depth: usize,
    enabled: bool,
}

impl CaptureSink {
    /// Creates a sink that records captures.
    pub(crate) fn armed() -> Self {
        Self {
            records: Vec::new(),
            depth: 0,
            enabled: true,
        }
    }

    /// Creates a sink that ignores captures.
    pub(crate) fn disarmed() -> Self {
        Self {
            records: Vec::new(),
            depth: 0,
            enabled: false,
        }
    }

    /// Consumes the sink, returning captures in evaluation (innermost-first)
    /// order.
    pub(crate) fn into_records(self) -> Vec<WhereCapture> {
        self.records
    }

    fn enter(&mut self) {
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn record(&mut self, value: &Value, span: &SourceSpan) {
        if self.enabled {
            self.records.push(WhereCapture {
                value: value.clone(),
                span: span.clone(),
                depth: self.depth,
            });
        }
    }
}

/// Evaluates one expression against the environment.
///
/// Errors propagate immediately; a partially filled sink is abandoned by
/// the caller in that case, since no explanation is assembled for runtime
/// errors.
pub(crate) fn eval_expr(
    expr: &Expr,
    env: &Env,
    config: &Config,
    sink: &mut CaptureSink,
) -> Result<Value, RuntimeError> {
    match &expr.kind {
        ExprKind::Int(v) => Ok(Value::Int(*v)),
        ExprKind::Float(v) => Ok(Value::Float(*v)),
        ExprKind::Imaginary(v) => Ok(Value::Complex { re: 0.0, im: *v }),
        ExprKind::Str(s) => Ok(Value::Str(s.clone())),
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
        ExprKind::Ident(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownIdentifier(name.clone())),
        ExprKind::ListLit(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(item, env, config, sink)?);
            }
            Ok(Value::List(values))
        }
        ExprKind::MapLit(entries) => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                let value = eval_expr(value, env, config, sink)?;
                map.insert(key.clone(), value);
            }
            Ok(Value::Map(map))
        }
        ExprKind::UnaryNeg(inner) => {
            let value = eval_expr(inner, env, config, sink)?;
            negate_value(&value)
        }
        ExprKind::Not(inner) => {
            let value = eval_expr(inner, env, config, sink)?;
            Ok(Value::Bool(!value.is_truthy()))
        }
        ExprKind::Binary { op, left, right } => {
            let left = eval_expr(left, env, config, sink)?;
            let right = eval_expr(right, env, config, sink)?;
            apply_binary(*op, &left, &right)
        }
        ExprKind::Compare { first, rest } => {
            // Chains evaluate each operand once and stop after the first
            // false pairwise comparison.
            let mut left = eval_expr(first, env, config, sink)?;
            for (op, rhs) in rest {
                let right = eval_expr(rhs, env, config, sink)?;
                if !compare_values(*op, &left, &right, config)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        ExprKind::BoolChain { op, clauses } => {
            // Short-circuit evaluation; the deciding operand value is the
            // chain's result.
            let mut last = Value::Bool(matches!(op, BoolOp::And));
            for clause in clauses {
                let value = eval_expr(clause, env, config, sink)?;
                let truthy = value.is_truthy();
                last = value;
                match op {
                    BoolOp::And if !truthy => return Ok(last),
                    BoolOp::Or if truthy => return Ok(last),
                    _ => {}
                }
            }
            Ok(last)
        }
        ExprKind::Call { name, args } => {
            let Some(function) = env.function(name) else {
                return Err(RuntimeError::UnknownFunction(name.clone()));
            };
            let function = function.clone();
            sink.enter();
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, env, config, sink)?);
            }
            let value = function.as_ref()(&values, config)?;
            sink.record(&value, &expr.span);
            sink.leave();
            Ok(value)
        }
        ExprKind::Attribute { base, name } => {
            sink.enter();
            let base_value = eval_expr(base, env, config, sink)?;
            let value = match &base_value {
                Value::Map(entries) => {
                    entries
                        .get(name)
                        .cloned()
                        .ok_or_else(|| RuntimeError::MissingAttribute {
                            ty: "map",
                            name: name.clone(),
                        })?
                }
                other => {
                    return Err(RuntimeError::MissingAttribute {
                        ty: other.type_name(),
                        name: name.clone(),
                    });
                }
            };
            sink.record(&value, &expr.span);
            sink.leave();
            Ok(value)
        }
        ExprKind::Index { base, index } => {
            let base_value = eval_expr(base, env, config, sink)?;
            let index_value = eval_expr(index, env, config, sink)?;
            subscript(&base_value, &index_value)
        }
    }
}

/// Applies one pairwise comparison operator.
pub(crate) fn compare_values(
    op: CmpOp,
    left: &Value,
    right: &Value,
    config: &Config,
) -> Result<bool, RuntimeError> {
    match op {
        CmpOp::Eq => Ok(value_eq(left, right, config)),
        CmpOp::Ne => Ok(!value_eq(left, right, config)),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            match try_order(left, right, config)? {
                // NaN operands order with nothing; every ordering test fails.
                None => Ok(false),
                Some(ordering) => Ok(match op {
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::Le => ordering != Ordering::Greater,
                    CmpOp::Gt => ordering == Ordering::Greater,
                    CmpOp::Ge => ordering != Ordering::Less,
                    _ => unreachable!("non-ordering operator handled above"),
                }),
            }
        }
        CmpOp::In => membership(left, right, config),
        CmpOp::NotIn => Ok(!membership(left, right, config)?),
    }
}

/// Structural equality with approx and cross-type numeric handling.
pub(crate) fn value_eq(left: &Value, right: &Value, config: &Config) -> bool {
    if let Value::Approx(approx) = left {
        return approx.matches(right, config);
    }
    if let Value::Approx(approx) = right {
        return approx.matches(left, config);
    }
    // Ints, floats, and complex values compare numerically across types.
    if let (Some(l), Some(r)) = (left.as_complex(), right.as_complex()) {
        return l == r;
    }
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(x, y)| value_eq(x, y, config))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && value_eq(va, vb, config))
        }
        _ => false,
    }
}

/// Attempts a total ordering between two values.
///
/// `Ok(None)` marks comparable types without an ordering for these operands
/// (NaN); type mismatches are errors.
fn try_order(
    left: &Value,
    right: &Value,
    config: &Config,
) -> Result<Option<Ordering>, RuntimeError> {
    if let (Some(l), Some(r)) = (left.as_real(), right.as_real()) {
        return Ok(l.partial_cmp(&r));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            // Lexicographic: first differing element decides, length breaks
            // ties.
            for (x, y) in a.iter().zip(b.iter()) {
                if value_eq(x, y, config) {
                    continue;
                }
                return try_order(x, y, config);
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(RuntimeError::Type(format!(
            "ordering is not defined for {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Implements the `in` operator for lists, strings, and maps.
fn membership(needle: &Value, haystack: &Value, config: &Config) -> Result<bool, RuntimeError> {
    match haystack {
        Value::List(items) => Ok(items.iter().any(|item| value_eq(needle, item, config))),
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(s.contains(sub.as_str())),
            other => Err(RuntimeError::Type(format!(
                "'in' over a str requires a str needle, found {}",
                other.type_name()
            ))),
        },
        Value::Map(entries) => match needle {
            Value::Str(key) => Ok(entries.contains_key(key)),
            other => Err(RuntimeError::Type(format!(
                "'in' over a map requires a str key, found {}",
                other.type_name()
            ))),
        },
        other => Err(RuntimeError::Type(format!(
            "'in' is not defined for {}",
            other.type_name()
        ))),
    }
}

/// Numeric operand pair promoted to its widest common shape.
enum NumPair {
    Ints(i64, i64),
    Reals(f64, f64),
    Complexes((f64, f64), (f64, f64)),
}

/// Promotes two values to a common numeric shape when possible.
fn promote(left: &Value, right: &Value) -> Option<NumPair> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(NumPair::Ints(*a, *b)),
        (Value::Complex { .. }, _) | (_, Value::Complex { .. }) => {
            Some(NumPair::Complexes(left.as_complex()?, right.as_complex()?))
        }
        _ => Some(NumPair::Reals(left.as_real()?, right.as_real()?)),
    }
}

/// Applies one binary arithmetic operator.
fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    // String and list concatenation come before numeric promotion.
    if let (BinOp::Add, Value::Str(a), Value::Str(b)) = (op, left, right) {
        return Ok(Value::Str(format!("{a}{b}")));
    }
    if let (BinOp::Add, Value::List(a), Value::List(b)) = (op, left, right) {
        let mut items = a.clone();
        items.extend(b.iter().cloned());
        return Ok(Value::List(items));
    }

    let Some(pair) = promote(left, right) else {
        return Err(RuntimeError::Type(format!(
            "operator '{}' is not defined for {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };

    match pair {
        NumPair::Ints(a, b) => match op {
            BinOp::Add => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow("+")),
            BinOp::Sub => a
                .checked_sub(b)
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow("-")),
            BinOp::Mul => a
                .checked_mul(b)
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow("*")),
            BinOp::Div => {
                // Division always yields a float, matching the original
                // semantics of `/`.
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Float(a as f64 / b as f64))
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Int(a.rem_euclid(b)))
            }
        },
        NumPair::Reals(a, b) => match op {
            BinOp::Add => Ok(Value::Float(a + b)),
            BinOp::Sub => Ok(Value::Float(a - b)),
            BinOp::Mul => Ok(Value::Float(a * b)),
            BinOp::Div => {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Float(a / b))
            }
            BinOp::Mod => {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Float(a.rem_euclid(b)))
            }
        },
        NumPair::Complexes((are, aim), (bre, bim)) => match op {
            BinOp::Add => Ok(Value::Complex {
                re: are + bre,
                im: aim + bim,
            }),
            BinOp::Sub => Ok(Value::Complex {
                re: are - bre,
                im: aim - bim,
            }),
            BinOp::Mul => Ok(Value::Complex {
                re: are * bre - aim * bim,
                im: are * bim + aim * bre,
            }),
            BinOp::Div => {
                let denom = bre * bre + bim * bim;
                if denom == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Complex {
                    re: (are * bre + aim * bim) / denom,
                    im: (aim * bre - are * bim) / denom,
                })
            }
            BinOp::Mod => Err(RuntimeError::Type(
                "operator '%' is not defined for complex values".to_string(),
            )),
        },
    }
}

/// Applies unary arithmetic negation.
fn negate_value(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(v) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or(RuntimeError::Overflow("-")),
        Value::Float(v) => Ok(Value::Float(-v)),
        Value::Complex { re, im } => Ok(Value::Complex { re: -re, im: -im }),
        other => Err(RuntimeError::Type(format!(
            "unary '-' is not defined for {}",
            other.type_name()
        ))),
    }
}

/// Implements subscript access for lists, strings, and maps.
fn subscript(base: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match (base, index) {
        (Value::List(items), Value::Int(idx)) => {
            let resolved = resolve_index(*idx, items.len())?;
            Ok(items[resolved].clone())
        }
        (Value::Str(s), Value::Int(idx)) => {
            let chars: Vec<char> = s.chars().collect();
            let resolved = resolve_index(*idx, chars.len())?;
            Ok(Value::Str(chars[resolved].to_string()))
        }
        (Value::Map(entries), Value::Str(key)) => entries
            .get(key)
            .cloned()
            .ok_or_else(|| RuntimeError::MissingKey(key.clone())),
        (base, index) => Err(RuntimeError::Type(format!(
            "{} is not indexable by {}",
            base.type_name(),
            index.type_name()
        ))),
    }
}

/// Resolves a possibly negative index against a container length.
fn resolve_index(index: i64, len: usize) -> Result<usize, RuntimeError> {
    let resolved = if index < 0 {
        index + len as i64
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(RuntimeError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}
