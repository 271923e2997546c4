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

//! Expression analysis: decomposing assertion conditions into capture plans.
//!
//! Only the top-level boolean and comparison structure is decomposed. Calls
//! and attribute accesses stay opaque; their values are captured by the
//! evaluator as single `where` entries.

use crate::ast::{BoolOp, CmpOp, Expr, ExprKind};
use serde::{Deserialize, Serialize};

/// Deepest expression nesting the analyzer will instrument.
///
/// Anything deeper is left as a plain assert so instrumentation never
/// amplifies an already pathological statement.
pub(crate) const MAX_INSTRUMENTATION_DEPTH: usize = 64;

/// Capture plan for one assertion condition.
///
/// The plan mirrors the decomposable skeleton of the expression; the
/// evaluator walks plan and expression together so each sub-expression is
/// evaluated exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum AssertShape {
    /// Pairwise-decomposed comparison chain.
    Compare {
        /// Chain operators in source order.
        ops: Vec<CmpOp>,
    },
    /// Short-circuiting boolean chain; clauses decompose recursively.
    Bool {
        /// Chain operator.
        op: BoolOp,
        /// Per-clause plans in source order.
        clauses: Vec<AssertShape>,
    },
    /// Logical negation; the negated expression is captured opaquely.
    Negation,
    /// Single opaque condition value.
    Opaque,
}

/// Builds the capture plan for one assertion condition.
///
/// Returns `None` when the expression nests too deeply to instrument; the
/// rewriter then leaves that statement in plain form.
pub(crate) fn analyze(cond: &Expr) -> Option<AssertShape> {
    if expr_depth(cond) > MAX_INSTRUMENTATION_DEPTH {
        return None;
    }
    Some(shape_of(cond))
}

fn shape_of(expr: &Expr) -> AssertShape {
    match &expr.kind {
        ExprKind::Compare { rest, .. } => AssertShape::Compare {
            ops: rest.iter().map(|(op, _)| *op).collect(),
        },
        ExprKind::BoolChain { op, clauses } => AssertShape::Bool {
            op: *op,
            clauses: clauses.iter().map(shape_of).collect(),
        },
        ExprKind::Not(_) => AssertShape::Negation,
        _ => AssertShape::Opaque,
    }
}

/// Computes the nesting depth of an expression tree.
fn expr_depth(expr: &Expr) -> usize {
    let children = match &expr.kind {
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Imaginary(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Ident(_) => 0,
        ExprKind::ListLit(items) => items.iter().map(expr_depth).max().unwrap_or(0),
        ExprKind::MapLit(entries) => entries
            .iter()
            .map(|(_, value)| expr_depth(value))
            .max()
            .unwrap_or(0),
        ExprKind::UnaryNeg(inner) | ExprKind::Not(inner) => expr_depth(inner),
        ExprKind::Binary { left, right, .. } => expr_depth(left).max(expr_depth(right)),
        ExprKind::Compare { first, rest } => rest
            .iter()
            .map(|(_, operand)| expr_depth(operand))
            .max()
            .unwrap_or(0)
            .max(expr_depth(first)),
        ExprKind::BoolChain { clauses, .. } => {
            clauses.iter().map(expr_depth).max().unwrap_or(0)
        }
        ExprKind::Call { args, .. } => args.iter().map(expr_depth).max().unwrap_or(0),
        ExprKind::Attribute { base, .. } => expr_depth(base),
        ExprKind::Index { base, index } => expr_depth(base).max(expr_depth(index)),
    };
    children + 1
}
