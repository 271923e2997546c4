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

//! Statement and top-level item parsers.

use crate::ast::{Pragma, SourceSpan, Span, Stmt, StmtKind};
use nom::Parser;
use nom::{
    branch::alt,
    combinator::{map, opt},
    error::context,
    sequence::preceded,
};

use super::PResult;
use super::expr::expr;
use super::utils::{identifier, keyword, ws, ws_char};

/// One top-level AST item.
pub(super) enum TopItem {
    Pragma(Pragma),
    Stmt(Stmt),
}

/// Parses one top-level item.
pub(super) fn top_item(input: Span<'_>) -> PResult<'_, TopItem> {
    // Pragmas are tried first so `pragma` is never read as an expression.
    alt((
        map(pragma_stmt, TopItem::Pragma),
        map(statement, TopItem::Stmt),
    ))
    .parse(input)
}

/// Parses one module directive (`pragma name;`).
fn pragma_stmt(input: Span<'_>) -> PResult<'_, Pragma> {
    let start = input;
    let (input, _) = ws(keyword("pragma")).parse(input)?;
    let (input, name) = context("pragma name", ws(identifier)).parse(input)?;
    let (input, _) = context("';'", ws_char(';')).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((input, Pragma { name, span }))
}

/// Parses one statement and trailing semicolon.
pub(super) fn statement(input: Span<'_>) -> PResult<'_, Stmt> {
    let start = input;
    // A statement is either a binding or an assertion.
    let (input, kind) = alt((let_stmt, assert_stmt)).parse(input)?;
    let (input, _) = context("';'", ws_char(';')).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((input, Stmt { kind, span }))
}

/// Parses a binding statement body (`let name = expr`).
fn let_stmt(input: Span<'_>) -> PResult<'_, StmtKind> {
    let (input, _) = ws(keyword("let")).parse(input)?;
    let (input, name) = context("identifier", ws(identifier)).parse(input)?;
    let (input, _) = context("'='", ws_char('=')).parse(input)?;
    let (input, value) = context("initializer expression", expr).parse(input)?;
    Ok((input, StmtKind::Let { name, value }))
}

/// Parses an assertion statement body (`assert expr` / `assert expr, msg`).
fn assert_stmt(input: Span<'_>) -> PResult<'_, StmtKind> {
    let (input, _) = ws(keyword("assert")).parse(input)?;
    let (input, cond) = context("assertion condition", expr).parse(input)?;
    // The message expression is parsed here but evaluated only on failure.
    let (input, message) = opt(preceded(
        ws_char(','),
        context("assertion message", expr),
    ))
    .parse(input)?;
    Ok((input, StmtKind::Assert { cond, message }))
}
