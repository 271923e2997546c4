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

//! Parser trivia and lexical helpers.

use crate::ast::Span;
use nom::Parser;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, none_of},
    combinator::{map, not, opt, peek, recognize, value, verify},
    error::context,
    multi::many0,
    sequence::{delimited, pair, terminated},
};

use super::PResult;

/// Reserved words that can never be identifiers.
const KEYWORDS: &[&str] = &[
    "let", "assert", "pragma", "and", "or", "not", "in", "true", "false",
];

/// Parses a double-quoted string literal with minimal escape support.
///
/// Recognized escapes: `\"`, `\\`, `\n`, `\t`. Raw newlines inside string
/// literals are rejected.
pub(super) fn string_literal(input: Span<'_>) -> PResult<'_, String> {
    map(
        delimited(
            char('"'),
            many0(string_char),
            context("closing quote", char('"')),
        ),
        |chars: Vec<char>| chars.into_iter().collect(),
    )
    .parse(input)
}

/// Parses one string character, resolving escape sequences.
fn string_char(input: Span<'_>) -> PResult<'_, char> {
    alt((
        map(
            pair(
                char('\\'),
                context(
                    "escape character",
                    alt((
                        value('"', char('"')),
                        value('\\', char('\\')),
                        value('\n', char('n')),
                        value('\t', char('t')),
                    )),
                ),
            ),
            |(_, c)| c,
        ),
        none_of("\"\\\n\r"),
    ))
    .parse(input)
}

/// Parses identifiers (`[A-Za-z_][A-Za-z0-9_]*`), excluding keywords.
pub(super) fn identifier(input: Span<'_>) -> PResult<'_, String> {
    map(
        verify(
            recognize(pair(
                take_while1(is_ident_start),
                take_while(is_ident_continue),
            )),
            |s: &Span<'_>| !KEYWORDS.contains(s.fragment()),
        ),
        |s: Span<'_>| s.fragment().to_string(),
    )
    .parse(input)
}

/// Parses a reserved word with a word-boundary check.
///
/// The boundary check keeps `in` from matching the prefix of `index`.
pub(super) fn keyword<'a>(kw: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, ()> {
    move |input| {
        value(
            (),
            terminated(tag(kw), peek(not(take_while1(is_ident_continue)))),
        )
        .parse(input)
    }
}

/// Returns whether a char can start an identifier.
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

/// Returns whether a char can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Skips zero-or-more whitespace/comments.
pub(super) fn ws0(input: Span<'_>) -> PResult<'_, ()> {
    // Treat spaces/newlines and comments uniformly as trivia.
    value((), many0(alt((value((), multispace1), comment)))).parse(input)
}

/// Parses line comments (`// ...` and `# ...`).
fn comment(input: Span<'_>) -> PResult<'_, ()> {
    // Accept shell-style and C++-style single-line comments.
    value(
        (),
        alt((
            pair(tag("//"), opt(nom::character::complete::not_line_ending)),
            pair(tag("#"), opt(nom::character::complete::not_line_ending)),
        )),
    )
    .parse(input)
}

/// Wraps a parser with leading/trailing whitespace/comment skipping.
pub(super) fn ws<'a, O, P>(mut parser: P) -> impl FnMut(Span<'a>) -> PResult<'a, O>
where
    P: FnMut(Span<'a>) -> PResult<'a, O>,
{
    // This helper keeps grammar rules free from manual trivia handling.
    move |input| delimited(ws0, &mut parser, ws0)(input)
}

/// Parses a specific character token with surrounding whitespace/comments.
pub(super) fn ws_char<'a>(c: char) -> impl FnMut(Span<'a>) -> PResult<'a, char> {
    ws(char(c))
}
