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

//! Tolerance-based approximate equality wrapper.

use super::{RuntimeError, Value};
use crate::Config;

/// "Expected value ± tolerance" proxy used in comparisons.
///
/// Holds one expected value (real scalar, complex, or homogeneous list of
/// scalars) plus optional relative/absolute tolerance overrides. Unset
/// tolerances resolve against [`Config`] defaults at comparison time.
///
/// Equality against a candidate accepts any value within
/// `max(rel × |expected|, abs)` of the expected value; for complex numbers
/// the band is a disc around the expected point, so any deviation
/// direction is tolerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproxValue {
    expected: Box<Value>,
    rel: Option<f64>,
    abs: Option<f64>,
}

impl ApproxValue {
    /// Wraps an expected value, validating that it is numeric.
    ///
    /// Accepts ints, floats, complex numbers, and lists whose elements are
    /// all scalars or complex.
    pub fn new(expected: Value) -> Result<Self, RuntimeError> {
        match &expected {
            Value::Int(_) | Value::Float(_) | Value::Complex { .. } => {}
            Value::List(items) => {
                for item in items {
                    if item.as_complex().is_none() {
                        return Err(RuntimeError::Type(format!(
                            "approx() list elements must be numeric, found {}",
                            item.type_name()
                        )));
                    }
                }
            }
            other => {
                return Err(RuntimeError::Type(format!(
                    "approx() expects a numeric value or list, found {}",
                    other.type_name()
                )));
            }
        }
        Ok(Self {
            expected: Box::new(expected),
            rel: None,
            abs: None,
        })
    }

    /// Overrides the relative tolerance.
    pub fn with_rel(mut self, rel: f64) -> Self {
        self.rel = Some(rel);
        self
    }

    /// Overrides the absolute tolerance.
    pub fn with_abs(mut self, abs: f64) -> Self {
        self.abs = Some(abs);
        self
    }

    /// Returns the wrapped expected value.
    pub fn expected(&self) -> &Value {
        &self.expected
    }

    /// Resolves the tolerance band half-width for a given expected magnitude.
    ///
    /// An expected value of zero cancels the relative term, leaving only the
    /// absolute tolerance.
    pub(crate) fn tolerance_for(&self, expected_magnitude: f64, config: &Config) -> f64 {
        let rel = self.rel.unwrap_or(config.rel_tolerance);
        let abs = self.abs.unwrap_or(config.abs_tolerance);
        (rel * expected_magnitude).abs().max(abs)
    }

    /// Returns whether a candidate value falls inside the tolerance band.
    ///
    /// Non-numeric candidates and shape mismatches compare unequal rather
    /// than raising; approximate equality is symmetric by construction.
    pub(crate) fn matches(&self, candidate: &Value, config: &Config) -> bool {
        match (&*self.expected, candidate) {
            (Value::List(expected), Value::List(actual)) => {
                expected.len() == actual.len()
                    && expected
                        .iter()
                        .zip(actual.iter())
                        .all(|(e, a)| self.scalar_matches(e, a, config))
            }
            (Value::List(_), _) | (_, Value::List(_)) => false,
            (expected, actual) => self.scalar_matches(expected, actual, config),
        }
    }

    /// Checks one scalar/complex pair against its own tolerance band.
    fn scalar_matches(&self, expected: &Value, actual: &Value, config: &Config) -> bool {
        let (Some((ere, eim)), Some((are, aim))) = (expected.as_complex(), actual.as_complex())
        else {
            return false;
        };
        let expected_magnitude = (ere * ere + eim * eim).sqrt();
        let tolerance = self.tolerance_for(expected_magnitude, config);
        let (dre, dim) = (are - ere, aim - eim);
        (dre * dre + dim * dim).sqrt() <= tolerance
    }
}
