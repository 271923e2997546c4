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

//! Assertion introspection engine for test scripts.
//!
//! This crate provides:
//! - A spanned parser for a small test-script language (`let` bindings and
//!   `assert` statements over literals, calls, containers, comparisons,
//!   and boolean chains).
//! - Statement rewriting that instruments asserts with a capture plan
//!   while preserving evaluation order, side effects, and truthiness.
//! - Single-pass evaluation that records sub-expression values only along
//!   the evaluated path, at no formatting cost on success.
//! - Failure explanations: summary line from captured operand values,
//!   `where` provenance lines, same-type container diffs, and tolerance
//!   annotations for approximate comparisons.
//! - An on-disk rewrite cache keyed by source content fingerprint.
//!
//! # Pipeline
//!
//! 1. Parse module source into a spanned AST.
//! 2. Rewrite: decide per statement whether to instrument, per the scope
//!    policy and module pragmas; cache the result by source fingerprint.
//! 3. Execute statements against a host [`Env`]; each assert condition is
//!    evaluated exactly once, captures armed.
//! 4. On a false condition, evaluate the lazy user message, assemble the
//!    explanation, and surface it as [`RunError::Assertion`].
//!
//! # Failure behavior
//!
//! Runtime errors raised by condition or message expressions propagate as
//! [`RunError::Runtime`]; they are never reinterpreted as assertion
//! failures and no explanation is assembled for them.

mod analyze;
mod ast;
mod diagnostics;
mod explain;
mod format;
mod parser;
mod rewrite;
mod runtime;
mod session;
mod stdlib;

#[cfg(test)]
mod tests;

pub use ast::{
    BinOp, BoolOp, CmpOp, Expr, ExprKind, Module, Pragma, SourceSpan, Stmt, StmtKind,
};
pub use diagnostics::CompileError;
pub use explain::Explanation;
pub use parser::parse_module;
pub use rewrite::{CompiledModule, PLAIN_ASSERTS_PRAGMA, RewriteCache, RewritePolicy};
pub use runtime::{ApproxValue, Env, NativeFn, RuntimeError, Value};
pub use session::{
    AssertionFailure, ModuleSource, RunError, RunReport, Session,
};

use thiserror::Error;

/// Engine configuration.
///
/// Explanation bounds and tolerance defaults are deliberate defaults, not
/// invariants; hosts tune them per run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of explanation lines before truncation.
    pub max_explanation_lines: usize,
    /// Maximum total explanation characters before truncation.
    pub max_explanation_chars: usize,
    /// Glob patterns selecting module paths that receive instrumentation.
    ///
    /// Empty means every module is instrumented.
    pub rewrite_scope: Vec<String>,
    /// Default relative tolerance for approx wrappers.
    pub rel_tolerance: f64,
    /// Default absolute tolerance for approx wrappers.
    ///
    /// An expected value of zero cancels the relative term, so this is the
    /// whole band in that case.
    pub abs_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_explanation_lines: 24,
            max_explanation_chars: 2048,
            rewrite_scope: Vec::new(),
            rel_tolerance: 1e-6,
            abs_tolerance: 1e-12,
        }
    }
}

/// Errors from the one-shot [`run_script`] convenience API.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script failed to parse.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// The script failed while running.
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Compiles one module with default configuration and no cache.
pub fn compile_module(path: &str, source: &str) -> Result<CompiledModule, CompileError> {
    Session::new(Config::default())?.compile_module(path, source)
}

/// Parses, instruments, and runs one inline script against an environment.
pub fn run_script(source: &str, env: &mut Env) -> Result<RunReport, ScriptError> {
    let session = Session::new(Config::default())?;
    let module = session.compile_module("<inline>", source)?;
    Ok(session.run_module(&module, env)?)
}
