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

//! Runtime values, the execution environment, and evaluation errors.

mod approx;
mod eval;

use crate::Config;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use thiserror::Error;

pub use approx::ApproxValue;
pub(crate) use eval::{CaptureSink, WhereCapture, compare_values, eval_expr, value_eq};

/// Signature for native functions callable from test scripts.
///
/// Functions are injected by the host (or the built-in standard library)
/// and may capture state; argument evaluation order is source order.
pub type NativeFn = Rc<dyn Fn(&[Value], &Config) -> Result<Value, RuntimeError>>;

/// A runtime value produced by expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Complex number with `f64` components.
    Complex {
        /// Real part.
        re: f64,
        /// Imaginary part.
        im: f64,
    },
    /// UTF-8 string.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// String-keyed map with deterministic iteration order.
    Map(BTreeMap<String, Value>),
    /// Tolerance-carrying approximate-equality wrapper.
    Approx(ApproxValue),
}

impl Value {
    /// Human-readable type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex { .. } => "complex",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Approx(_) => "approx",
        }
    }

    /// Returns the value's truthiness.
    ///
    /// Numbers are truthy when non-zero, containers and strings when
    /// non-empty; an approx wrapper is always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Complex { re, im } => *re != 0.0 || *im != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Approx(_) => true,
        }
    }

    /// Returns the numeric value as `f64` when it is a real number.
    pub(crate) fn as_real(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as complex components when it is any number.
    pub(crate) fn as_complex(&self) -> Option<(f64, f64)> {
        match self {
            Value::Int(v) => Some((*v as f64, 0.0)),
            Value::Float(v) => Some((*v, 0.0)),
            Value::Complex { re, im } => Some((*re, *im)),
            _ => None,
        }
    }
}

/// Errors raised while evaluating expressions.
///
/// These propagate out of a test run unchanged; they are never folded into
/// assertion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// An identifier had no binding in the environment.
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    /// A called function was not registered.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// A function was called with the wrong number of arguments.
    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    Arity {
        /// Function name.
        name: String,
        /// Expected argument count description.
        expected: String,
        /// Received argument count.
        got: usize,
    },
    /// An operator or function was applied to unsupported operand types.
    #[error("type error: {0}")]
    Type(String),
    /// Integer or float division/remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Arithmetic overflow on integer operations.
    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),
    /// Subscript index outside container bounds.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Container length.
        len: usize,
    },
    /// Map subscript or attribute lookup with a missing key.
    #[error("missing key '{0}'")]
    MissingKey(String),
    /// Attribute access on a value without attributes.
    #[error("value of type {ty} has no attribute '{name}'")]
    MissingAttribute {
        /// Base value type label.
        ty: &'static str,
        /// Requested attribute.
        name: String,
    },
}

/// Execution environment: variable bindings plus native functions.
///
/// One environment is threaded through a module run; `let` statements bind
/// into it and the host may pre-register values and functions.
#[derive(Clone, Default)]
pub struct Env {
    vars: HashMap<String, Value>,
    functions: HashMap<String, NativeFn>,
}

impl Env {
    /// Creates an environment with the built-in standard functions.
    pub fn new() -> Self {
        let mut env = Self::empty();
        crate::stdlib::register_builtins(&mut env);
        env
    }

    /// Creates an environment with no bindings and no functions.
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Binds or rebinds a variable.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Looks up a variable binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Registers a native function under the given name.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &Config) -> Result<Value, RuntimeError> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(f));
    }

    /// Looks up a registered native function.
    pub(crate) fn function(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("vars", &self.vars)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
