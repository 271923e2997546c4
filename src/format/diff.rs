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

//! Type-aware structural diffing for compared container pairs.
//!
//! Only same-type pairs diff: list against list, map against map, string
//! against string. Mixed-type comparisons fall back to the plain
//! side-by-side reprs in the summary line.

use super::repr;
use crate::Config;
use crate::runtime::Value;

/// Produces diff lines for a failed equality over a same-type pair.
///
/// Returns `None` for pairs that do not support structural diffing.
pub(crate) fn diff_values(left: &Value, right: &Value, config: &Config) -> Option<Vec<String>> {
    match (left, right) {
        (Value::List(a), Value::List(b)) => {
            let left_items: Vec<String> = a.iter().map(|item| repr(item, config)).collect();
            let right_items: Vec<String> = b.iter().map(|item| repr(item, config)).collect();
            Some(bracketed_diff("[", "]", &left_items, &right_items))
        }
        (Value::Map(a), Value::Map(b)) => {
            let left_items: Vec<String> = a
                .iter()
                .map(|(key, value)| entry_line(key, value, config))
                .collect();
            let right_items: Vec<String> = b
                .iter()
                .map(|(key, value)| entry_line(key, value, config))
                .collect();
            Some(bracketed_diff("{", "}", &left_items, &right_items))
        }
        (Value::Str(a), Value::Str(b)) => {
            let left_lines: Vec<String> = a.lines().map(str::to_string).collect();
            let right_lines: Vec<String> = b.lines().map(str::to_string).collect();
            Some(marked_lines(&left_lines, &right_lines, ""))
        }
        _ => None,
    }
}

/// Renders one map entry as an element line.
fn entry_line(key: &str, value: &Value, config: &Config) -> String {
    format!("\"{key}\": {}", repr(value, config))
}

/// Diffs element lines inside opening/closing bracket lines of their own.
fn bracketed_diff(open: &str, close: &str, left: &[String], right: &[String]) -> Vec<String> {
    let mut lines = Vec::with_capacity(left.len() + right.len() + 2);
    lines.push(open.to_string());
    lines.extend(marked_lines(left, right, ","));
    lines.push(close.to_string());
    lines
}

/// Marks item lines: common prefix/suffix unmarked, removals `-`, adds `+`.
fn marked_lines(left: &[String], right: &[String], suffix: &str) -> Vec<String> {
    let prefix = common_prefix(left, right);
    let suffix_len = common_suffix(left, right, prefix);

    let mut lines = Vec::new();
    for item in &left[..prefix] {
        lines.push(format!("  {item}{suffix}"));
    }
    for item in &left[prefix..left.len() - suffix_len] {
        lines.push(format!("- {item}{suffix}"));
    }
    for item in &right[prefix..right.len() - suffix_len] {
        lines.push(format!("+ {item}{suffix}"));
    }
    for item in &left[left.len() - suffix_len..] {
        lines.push(format!("  {item}{suffix}"));
    }
    lines
}

/// Counts equal leading items.
fn common_prefix(left: &[String], right: &[String]) -> usize {
    left.iter()
        .zip(right.iter())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Counts equal trailing items, never overlapping the common prefix.
fn common_suffix(left: &[String], right: &[String], prefix: usize) -> usize {
    let limit = left.len().min(right.len()) - prefix;
    left.iter()
        .rev()
        .zip(right.iter().rev())
        .take(limit)
        .take_while(|(a, b)| a == b)
        .count()
}
