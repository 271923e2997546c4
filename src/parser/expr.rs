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

//! Expression parser.
//!
//! Precedence tower, loosest first: `or`, `and`, `not`, comparison chains,
//! `+`/`-`, `*`/`/`/`%`, unary `-`, postfix (call args, `.attr`, `[idx]`),
//! atoms.

use crate::ast::{BinOp, BoolOp, CmpOp, Expr, ExprKind, SourceSpan, Span};
use nom::Parser;
use nom::{
    branch::alt,
    character::complete::{digit1, one_of},
    combinator::{map_res, opt, recognize, value},
    error::context,
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
};

use super::PResult;
use super::utils::{identifier, keyword, string_literal, ws, ws_char, ws0};

/// Top-level expression parser.
pub(super) fn expr(input: Span<'_>) -> PResult<'_, Expr> {
    parse_or(input)
}

/// Parses an `or` chain with short-circuit clauses kept flat.
fn parse_or(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, first) = parse_and(input)?;
    let mut extra = Vec::new();
    loop {
        let (next, found) = opt(ws(keyword("or"))).parse(input)?;
        if found.is_none() {
            break;
        }
        let (next, clause) = parse_and(next)?;
        extra.push(clause);
        input = next;
    }
    Ok((input, bool_chain_expr(BoolOp::Or, first, extra)))
}

/// Parses an `and` chain with short-circuit clauses kept flat.
fn parse_and(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, first) = parse_not(input)?;
    let mut extra = Vec::new();
    loop {
        let (next, found) = opt(ws(keyword("and"))).parse(input)?;
        if found.is_none() {
            break;
        }
        let (next, clause) = parse_not(next)?;
        extra.push(clause);
        input = next;
    }
    Ok((input, bool_chain_expr(BoolOp::And, first, extra)))
}

/// Folds parsed clauses into a flat boolean chain node.
///
/// `a and b and c` is kept as one flat clause list so the analyzer can
/// number clauses in source order.
fn bool_chain_expr(op: BoolOp, first: Expr, extra: Vec<Expr>) -> Expr {
    if extra.is_empty() {
        return first;
    }

    let mut span = first.span.clone();
    if let Some(last) = extra.last() {
        span = span.merge(&last.span);
    }
    let mut clauses = Vec::with_capacity(extra.len() + 1);
    clauses.push(first);
    clauses.extend(extra);
    Expr {
        kind: ExprKind::BoolChain { op, clauses },
        span,
    }
}

/// Parses logical negation (`not expr`).
fn parse_not(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    // `not` is parsed recursively to support chains like `not not x`.
    if let Ok((input, _)) = ws(keyword("not")).parse(input) {
        let (input, inner) = parse_not(input)?;
        let span = SourceSpan::from_bounds(start, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Not(Box::new(inner)),
                span,
            },
        ));
    }
    parse_comparison(input)
}

/// Parses a comparison chain (`a < b < c`).
fn parse_comparison(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, first) = parse_add_sub(input)?;
    let mut rest: Vec<(CmpOp, Expr)> = Vec::new();
    let mut span = first.span.clone();
    loop {
        let (next, op) = opt(ws(cmp_op)).parse(input)?;
        let Some(op) = op else {
            break;
        };

        let (next, right) = parse_add_sub(next)?;
        span = span.merge(&right.span);
        rest.push((op, right));
        input = next;
    }

    if rest.is_empty() {
        return Ok((input, first));
    }
    Ok((
        input,
        Expr {
            kind: ExprKind::Compare {
                first: Box::new(first),
                rest,
            },
            span,
        },
    ))
}

/// Parses one comparison operator token.
fn cmp_op(input: Span<'_>) -> PResult<'_, CmpOp> {
    // Two-character operators must be tried before their prefixes.
    alt((
        value(CmpOp::Le, nom::bytes::complete::tag("<=")),
        value(CmpOp::Ge, nom::bytes::complete::tag(">=")),
        value(CmpOp::Eq, nom::bytes::complete::tag("==")),
        value(CmpOp::Ne, nom::bytes::complete::tag("!=")),
        value(CmpOp::Lt, nom::character::complete::char('<')),
        value(CmpOp::Gt, nom::character::complete::char('>')),
        value(CmpOp::NotIn, tuple((keyword("not"), ws0, keyword("in")))),
        value(CmpOp::In, keyword("in")),
    ))
    .parse(input)
}

/// Parses left-associative `+`/`-`.
fn parse_add_sub(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_mul_div(input)?;
    loop {
        let (next, op) = opt(alt((ws_char('+'), ws_char('-')))).parse(input)?;
        let Some(op_char) = op else {
            break;
        };

        // Left-associative fold: `a-b-c` becomes `(a-b)-c`.
        let (next, right) = parse_mul_div(next)?;
        let op = if op_char == '+' {
            BinOp::Add
        } else {
            BinOp::Sub
        };
        let span = left.span.merge(&right.span);
        left = Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        };
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `*`/`/`/`%`.
fn parse_mul_div(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_unary(input)?;
    loop {
        let (next, op) = opt(alt((ws_char('*'), ws_char('/'), ws_char('%')))).parse(input)?;
        let Some(op_char) = op else {
            break;
        };

        let (next, right) = parse_unary(next)?;
        let op = match op_char {
            '*' => BinOp::Mul,
            '/' => BinOp::Div,
            _ => BinOp::Mod,
        };
        let span = left.span.merge(&right.span);
        left = Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        };
        input = next;
    }
    Ok((input, left))
}

/// Parses unary arithmetic negation.
fn parse_unary(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    // Unary minus is parsed recursively to support chains like `---x`.
    if let Ok((input, _)) = ws_char('-').parse(input) {
        let (input, inner) = parse_unary(input)?;
        let span = SourceSpan::from_bounds(start, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::UnaryNeg(Box::new(inner)),
                span,
            },
        ));
    }
    parse_postfix(input)
}

/// Parses postfix attribute/subscript chains (`expr.name`, `expr[idx]`).
fn parse_postfix(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut expr_node) = parse_primary(input)?;
    loop {
        let (next, attr) = opt(preceded(ws_char('.'), ws(identifier))).parse(input)?;
        if let Some(name) = attr {
            let mut span = expr_node.span.clone();
            span.end = next.location_offset();
            expr_node = Expr {
                kind: ExprKind::Attribute {
                    base: Box::new(expr_node),
                    name,
                },
                span,
            };
            input = next;
            continue;
        }

        let (next, index) = opt(delimited(
            ws_char('['),
            expr,
            context("']'", ws_char(']')),
        ))
        .parse(input)?;
        if let Some(index) = index {
            let mut span = expr_node.span.clone();
            span.end = next.location_offset();
            expr_node = Expr {
                kind: ExprKind::Index {
                    base: Box::new(expr_node),
                    index: Box::new(index),
                },
                span,
            };
            input = next;
            continue;
        }

        break;
    }
    Ok((input, expr_node))
}

/// Parses expression atoms.
fn parse_primary(input: Span<'_>) -> PResult<'_, Expr> {
    alt((
        parse_parenthesized,
        parse_list_literal,
        parse_map_literal,
        parse_number,
        parse_string,
        parse_bool_literal,
        parse_ident_or_call,
    ))
    .parse(input)
}

/// Parses parenthesized expressions.
fn parse_parenthesized(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, inner) = delimited(ws_char('('), expr, context("')'", ws_char(')'))).parse(input)?;
    let mut inner = inner;
    // Preserve outer range for better diagnostics around parenthesized terms.
    inner.span = SourceSpan::from_bounds(start, input);
    Ok((input, inner))
}

/// Parses list literal expressions.
fn parse_list_literal(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, _) = ws_char('[').parse(input)?;
    let (input, elements) = separated_list0(ws_char(','), expr).parse(input)?;
    let (input, _) = context("']'", ws_char(']')).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::ListLit(elements),
            span,
        },
    ))
}

/// Parses map literal expressions (`{"key": value}`).
fn parse_map_literal(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, _) = ws_char('{').parse(input)?;
    let (input, entries) = separated_list0(ws_char(','), map_entry).parse(input)?;
    let (input, _) = context("'}'", ws_char('}')).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::MapLit(entries),
            span,
        },
    ))
}

/// Parses one `"key": value` map entry.
fn map_entry(input: Span<'_>) -> PResult<'_, (String, Expr)> {
    let (input, key) = context("map key", ws(string_literal)).parse(input)?;
    let (input, _) = context("':'", ws_char(':')).parse(input)?;
    let (input, value) = expr(input)?;
    Ok((input, (key, value)))
}

/// Parses numeric literals: integers, floats, and imaginary (`4j`).
fn parse_number(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, kind) = ws(map_res(
        recognize(tuple((
            digit1,
            opt(pair(nom::character::complete::char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            opt(one_of("jJ")),
        ))),
        |s: Span<'_>| -> Result<ExprKind, std::num::ParseFloatError> {
            let frag = *s.fragment();
            if let Some(stripped) = frag.strip_suffix(&['j', 'J'][..]) {
                return Ok(ExprKind::Imaginary(stripped.parse::<f64>()?));
            }
            if frag.contains(&['.', 'e', 'E'][..]) {
                return Ok(ExprKind::Float(frag.parse::<f64>()?));
            }
            // Integer literals too large for i64 degrade to floats.
            match frag.parse::<i64>() {
                Ok(v) => Ok(ExprKind::Int(v)),
                Err(_) => Ok(ExprKind::Float(frag.parse::<f64>()?)),
            }
        },
    ))
    .parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((input, Expr { kind, span }))
}

/// Parses string literal expressions.
fn parse_string(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, text) = ws(string_literal).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::Str(text),
            span,
        },
    ))
}

/// Parses boolean literal expressions.
fn parse_bool_literal(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, value) = ws(alt((
        value(true, keyword("true")),
        value(false, keyword("false")),
    )))
    .parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::Bool(value),
            span,
        },
    ))
}

/// Parses either identifier or function call expression.
fn parse_ident_or_call(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, name) = ws(identifier).parse(input)?;
    let (input, args) = opt(delimited(
        ws_char('('),
        separated_list0(ws_char(','), expr),
        context("')'", ws_char(')')),
    ))
    .parse(input)?;

    let span = SourceSpan::from_bounds(start, input);
    // A name followed by `(...)` is parsed as call, otherwise identifier.
    let kind = if let Some(args) = args {
        ExprKind::Call { name, args }
    } else {
        ExprKind::Ident(name)
    };

    Ok((input, Expr { kind, span }))
}
