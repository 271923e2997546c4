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

//! Explanation assembly: captured values to final failure text.
//!
//! Ordering is fixed: optional user message, summary line, `where`
//! provenance lines (outermost first, indented per nesting depth), then the
//! structural diff of the failing comparison pair. Assembly is a pure
//! function of the captured values, so identical captures produce
//! byte-identical text.

use crate::Config;
use crate::ast::{BoolOp, CmpOp, SourceSpan};
use crate::format::{diff_values, repr, truncate_lines};
use crate::runtime::{Value, WhereCapture};
use std::fmt;

/// Final multi-line failure explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// Explanation lines in display order.
    pub lines: Vec<String>,
}

impl Explanation {
    /// Returns the explanation as one newline-joined string.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

/// One evaluated operand with its captured provenance.
#[derive(Debug, Clone)]
pub(crate) struct OperandTrace {
    /// Value the operand evaluated to.
    pub value: Value,
    /// Operand source span.
    pub span: SourceSpan,
    /// Call/attribute captures inside the operand, innermost-first.
    pub wheres: Vec<WhereCapture>,
}

/// Captured evaluation trace of one failed condition.
///
/// Only evaluated sub-expressions appear; anything skipped by a
/// short-circuit exit has no trace entry.
#[derive(Debug, Clone)]
pub(crate) enum ConditionTrace {
    /// Comparison chain; the last evaluated pair is the failing one.
    Compare {
        /// Evaluated operands, left to right.
        operands: Vec<OperandTrace>,
        /// Evaluated operators (one fewer than operands).
        ops: Vec<CmpOp>,
    },
    /// Boolean chain over evaluated clauses; the last clause decided.
    Bool {
        /// Chain operator.
        op: BoolOp,
        /// Evaluated clause traces in source order.
        clauses: Vec<ConditionTrace>,
    },
    /// `not expr` over one opaque operand.
    Negation {
        /// The negated operand.
        inner: OperandTrace,
    },
    /// Single opaque condition value.
    Opaque {
        /// The condition operand.
        operand: OperandTrace,
    },
}

/// Assembles the final explanation from a failed condition trace.
pub(crate) fn assemble(
    trace: &ConditionTrace,
    user_message: Option<&str>,
    source: &str,
    config: &Config,
) -> Explanation {
    let mut lines = Vec::new();
    if let Some(message) = user_message {
        lines.extend(message.lines().map(str::to_string));
    }
    lines.push(format!("assert {}", summary(trace, config)));
    push_wheres(trace, source, config, &mut lines);
    push_elaboration(trace, config, &mut lines);
    Explanation {
        lines: truncate_lines(lines, config),
    }
}

/// Renders the one-line condition summary from captured operand values.
fn summary(trace: &ConditionTrace, config: &Config) -> String {
    match trace {
        ConditionTrace::Compare { operands, ops } => {
            let mut out = String::new();
            for (index, operand) in operands.iter().enumerate() {
                if index > 0 {
                    out.push_str(&format!(" {} ", ops[index - 1].symbol()));
                }
                out.push_str(&repr(&operand.value, config));
            }
            out
        }
        ConditionTrace::Bool { op, clauses } => {
            let parts: Vec<String> = clauses
                .iter()
                .map(|clause| summary(clause, config))
                .collect();
            format!("({})", parts.join(&format!(" {} ", op.symbol())))
        }
        ConditionTrace::Negation { inner } => format!("not {}", repr(&inner.value, config)),
        ConditionTrace::Opaque { operand } => repr(&operand.value, config),
    }
}

/// Emits `where` provenance lines for every evaluated operand.
///
/// Captures are recorded innermost-first during evaluation; reversing per
/// operand yields the required outermost-first order, innermost last, with
/// one indent level per nesting depth.
fn push_wheres(trace: &ConditionTrace, source: &str, config: &Config, lines: &mut Vec<String>) {
    let mut operands = Vec::new();
    collect_operands(trace, &mut operands);
    for operand in operands {
        for capture in operand.wheres.iter().rev() {
            lines.push(format!(
                " +{}where {} = {}",
                "  ".repeat(capture.depth),
                repr(&capture.value, config),
                capture.span.text(source)
            ));
        }
    }
}

/// Collects operand traces left-to-right across the condition trace.
fn collect_operands<'t>(trace: &'t ConditionTrace, out: &mut Vec<&'t OperandTrace>) {
    match trace {
        ConditionTrace::Compare { operands, .. } => out.extend(operands.iter()),
        ConditionTrace::Bool { clauses, .. } => {
            for clause in clauses {
                collect_operands(clause, out);
            }
        }
        ConditionTrace::Negation { inner } => out.push(inner),
        ConditionTrace::Opaque { operand } => out.push(operand),
    }
}

/// Emits the structural diff of the failing equality pair, if any.
fn push_elaboration(trace: &ConditionTrace, config: &Config, lines: &mut Vec<String>) {
    match trace {
        ConditionTrace::Compare { operands, ops } => {
            // The chain stopped at its first false pair, so the last
            // evaluated pair is the one that failed.
            let (Some(op), true) = (ops.last(), operands.len() >= 2) else {
                return;
            };
            if *op != CmpOp::Eq {
                return;
            }
            let left = &operands[operands.len() - 2].value;
            let right = &operands[operands.len() - 1].value;
            if let Some(diff) = diff_values(left, right, config) {
                lines.extend(diff.into_iter().map(|line| format!("  {line}")));
            }
        }
        ConditionTrace::Bool { clauses, .. } => {
            // Elaborate the clause that decided the chain's value.
            if let Some(deciding) = clauses.last() {
                push_elaboration(deciding, config, lines);
            }
        }
        ConditionTrace::Negation { .. } | ConditionTrace::Opaque { .. } => {}
    }
}
