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

//! AST definitions for test modules with precise source spans.
//!
//! The parser creates this AST first. The rewriter then instruments each
//! `assert` statement, and the evaluator walks the same tree exactly once
//! per statement at run time.

use nom_locate::LocatedSpan;
use serde::{Deserialize, Serialize};

/// Parser input span type carrying byte offsets and line/column info.
pub type Span<'a> = LocatedSpan<&'a str>;

/// Source range and anchor position for diagnostics and operand text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based UTF-8 column.
    pub column: usize,
}

impl SourceSpan {
    /// Creates a source span from parser start/end positions.
    pub fn from_bounds(start: Span<'_>, end: Span<'_>) -> Self {
        Self {
            start: start.location_offset(),
            end: end.location_offset(),
            line: start.location_line() as usize,
            column: start.get_utf8_column(),
        }
    }

    /// Returns span length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a span that starts at `self` and ends at `other`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }

    /// Extracts the source fragment the span covers, trimmed of trivia.
    ///
    /// Spans produced by the parser include surrounding whitespace consumed
    /// as trivia; the trim keeps reconstructed operand text readable.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.start..self.end.min(source.len()))
            .unwrap_or("")
            .trim()
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Remainder (`%`).
    Mod,
}

impl BinOp {
    /// Operator symbol as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

/// Comparison operators usable in chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    /// Equality (`==`).
    Eq,
    /// Inequality (`!=`).
    Ne,
    /// Less-than (`<`).
    Lt,
    /// Less-or-equal (`<=`).
    Le,
    /// Greater-than (`>`).
    Gt,
    /// Greater-or-equal (`>=`).
    Ge,
    /// Membership (`in`).
    In,
    /// Negated membership (`not in`).
    NotIn,
}

impl CmpOp {
    /// Operator symbol as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    /// Conjunction (`and`); stops at the first falsy clause.
    And,
    /// Disjunction (`or`); stops at the first truthy clause.
    Or,
}

impl BoolOp {
    /// Operator keyword as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

/// Expression node variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Imaginary literal (`4j`); evaluates to a complex value.
    Imaginary(f64),
    /// String literal.
    Str(String),
    /// Boolean literal (`true` / `false`).
    Bool(bool),
    /// Identifier reference.
    Ident(String),
    /// List literal (`[a, b, c]`).
    ListLit(Vec<Expr>),
    /// Map literal (`{"key": value}`).
    MapLit(Vec<(String, Expr)>),
    /// Unary arithmetic negation.
    UnaryNeg(Box<Expr>),
    /// Logical negation (`not expr`).
    Not(Box<Expr>),
    /// Binary arithmetic operation.
    Binary {
        /// Operator kind.
        op: BinOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Comparison chain (`a < b < c` holds pairwise).
    Compare {
        /// Leftmost operand.
        first: Box<Expr>,
        /// Subsequent `(operator, operand)` pairs in source order.
        rest: Vec<(CmpOp, Expr)>,
    },
    /// Flattened `and` / `or` chain over two or more clauses.
    BoolChain {
        /// Chain operator.
        op: BoolOp,
        /// Clauses in source order.
        clauses: Vec<Expr>,
    },
    /// Call of a registered native function.
    Call {
        /// Function name.
        name: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// Attribute access (`base.name`).
    Attribute {
        /// Base expression.
        base: Box<Expr>,
        /// Attribute name.
        name: String,
    },
    /// Subscript access (`base[index]`).
    Index {
        /// Base expression.
        base: Box<Expr>,
        /// Index expression.
        index: Box<Expr>,
    },
}

/// Spanned expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Expression payload.
    pub kind: ExprKind,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Variable binding (`let name = expr;`).
    Let {
        /// Bound name.
        name: String,
        /// Initializer expression.
        value: Expr,
    },
    /// Assertion statement (`assert expr;` or `assert expr, message;`).
    Assert {
        /// Boolean condition.
        cond: Expr,
        /// Optional user message, evaluated only on failure.
        message: Option<Expr>,
    },
}

/// Spanned statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// Statement payload.
    pub kind: StmtKind,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Module-level directive (`pragma name;`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pragma {
    /// Directive name.
    pub name: String,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Full parsed test module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module directives; `pragma plain_asserts;` disables instrumentation.
    pub pragmas: Vec<Pragma>,
    /// Statements in source order.
    pub statements: Vec<Stmt>,
}
