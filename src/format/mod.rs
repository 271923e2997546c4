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

//! Value rendering for explanations.
//!
//! Reprs are single-line and deterministic. Approx wrappers render with an
//! explicit tolerance annotation; complex wrappers additionally render the
//! tolerance disc in polar notation. A depth guard replaces pathological
//! nesting with a placeholder line instead of aborting assembly.

mod diff;

pub(crate) use diff::diff_values;

use crate::Config;
use crate::runtime::{ApproxValue, Value};

/// Rendering recursion limit; deeper values become placeholders.
const MAX_REPR_DEPTH: usize = 32;

/// Renders one value as a single line of text.
pub(crate) fn repr(value: &Value, config: &Config) -> String {
    repr_at(value, config, 0)
}

fn repr_at(value: &Value, config: &Config, depth: usize) -> String {
    if depth > MAX_REPR_DEPTH {
        // Local fallback: one unprintable value never aborts the rest of
        // the explanation.
        return format!("<unprintable {} value>", value.type_name());
    }
    match value {
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format_float(*v),
        Value::Complex { re, im } => format_complex(*re, *im),
        Value::Str(s) => quote_str(s),
        Value::List(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| repr_at(item, config, depth + 1))
                .collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Map(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    format!("{}: {}", quote_str(key), repr_at(value, config, depth + 1))
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Approx(approx) => format_approx(approx, config),
    }
}

/// Renders a float, keeping whole values recognizable as floats.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Renders one complex component without a forced decimal point.
fn format_component(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// Renders a complex number (`4j`, `(3+4j)`, `(3-4j)`).
pub(crate) fn format_complex(re: f64, im: f64) -> String {
    if re == 0.0 {
        return format!("{}j", format_component(im));
    }
    let sign = if im < 0.0 { "-" } else { "+" };
    format!(
        "({}{}{}j)",
        format_component(re),
        sign,
        format_component(im.abs())
    )
}

/// Renders a tolerance in scientific notation with a two-digit exponent.
fn format_tolerance(tolerance: f64) -> String {
    let rendered = format!("{tolerance:.1e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("+", exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

/// Renders an approx wrapper with its tolerance annotation.
///
/// Real scalars render as `expected ± tolerance`. Complex scalars render
/// the tolerance disc in polar notation, `expected ± radius ∠ ±180°`: the
/// disc is centered on the expected point, so every deviation direction is
/// tolerated. Lists annotate each element with its own band.
fn format_approx(approx: &ApproxValue, config: &Config) -> String {
    match approx.expected() {
        Value::List(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| format_approx_scalar(item, approx, config))
                .collect();
            format!("approx([{}])", parts.join(", "))
        }
        scalar => format_approx_scalar(scalar, approx, config),
    }
}

/// Renders one annotated scalar of an approx wrapper.
fn format_approx_scalar(expected: &Value, approx: &ApproxValue, config: &Config) -> String {
    match expected {
        Value::Complex { re, im } => {
            let magnitude = (re * re + im * im).sqrt();
            let tolerance = approx.tolerance_for(magnitude, config);
            format!(
                "{} ± {} ∠ ±180°",
                format_complex(*re, *im),
                format_tolerance(tolerance)
            )
        }
        Value::Int(v) => {
            let tolerance = approx.tolerance_for((*v as f64).abs(), config);
            format!("{v} ± {}", format_tolerance(tolerance))
        }
        Value::Float(v) => {
            let tolerance = approx.tolerance_for(v.abs(), config);
            format!("{} ± {}", format_float(*v), format_tolerance(tolerance))
        }
        other => format!("approx({})", repr_at(other, config, MAX_REPR_DEPTH)),
    }
}

/// Quotes and escapes a string for display.
fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Enforces the configured explanation size bounds.
///
/// Overflow is cut at the limit and reported with one marker line; output
/// is never unbounded.
pub(crate) fn truncate_lines(lines: Vec<String>, config: &Config) -> Vec<String> {
    let max_lines = config.max_explanation_lines.max(1);
    let max_chars = config.max_explanation_chars.max(1);

    let total = lines.len();
    let mut kept = Vec::new();
    let mut chars = 0usize;
    for (index, line) in lines.into_iter().enumerate() {
        if kept.len() >= max_lines || chars + line.len() > max_chars {
            let hidden = total - index;
            kept.push(format!("...full output truncated ({hidden} lines hidden)"));
            return kept;
        }
        chars += line.len();
        kept.push(line);
    }
    kept
}
