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

//! Assertion rewriting: instrumentation decisions per module and statement.
//!
//! A compiled module keeps the original statement semantics; instrumented
//! asserts merely carry a capture plan the runner consults. A statement
//! stays plain when the module path is outside the rewrite scope, the
//! module opted out via `pragma plain_asserts;`, or the analyzer declined
//! the expression.

mod cache;

pub use cache::RewriteCache;
pub(crate) use cache::source_fingerprint;

use crate::analyze::{AssertShape, analyze};
use crate::ast::{Expr, Module, SourceSpan, StmtKind};
use crate::diagnostics::CompileError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Pragma name that disables instrumentation for a whole module.
pub const PLAIN_ASSERTS_PRAGMA: &str = "plain_asserts";

/// One executable statement of a compiled module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum CompiledStmt {
    /// Variable binding.
    Let {
        /// Bound name.
        name: String,
        /// Initializer expression.
        value: Expr,
        /// Statement span.
        span: SourceSpan,
    },
    /// Assertion; `shape` is `None` for plain (uninstrumented) asserts.
    Assert {
        /// Boolean condition.
        cond: Expr,
        /// Optional lazy user message.
        message: Option<Expr>,
        /// Capture plan when instrumented.
        shape: Option<AssertShape>,
        /// Statement span.
        span: SourceSpan,
    },
}

/// A rewritten module ready to execute, cacheable by source fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledModule {
    /// Module path label used in diagnostics and cache keys.
    pub path: String,
    /// SHA-256 fingerprint of the module source.
    pub fingerprint: String,
    /// Full module source, kept for snippets and operand text.
    pub source: String,
    /// Whether instrumentation was applied to this module at all.
    pub instrumented: bool,
    pub(crate) statements: Vec<CompiledStmt>,
}

impl CompiledModule {
    /// Returns the number of assertion statements in the module.
    pub fn assertion_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|stmt| matches!(stmt, CompiledStmt::Assert { .. }))
            .count()
    }
}

/// Decides which module paths receive instrumentation.
///
/// An empty scope instruments everything; otherwise only paths matching
/// one of the glob patterns are rewritten and the rest keep plain asserts.
#[derive(Debug, Clone)]
pub struct RewritePolicy {
    scope: Option<GlobSet>,
}

impl RewritePolicy {
    /// Creates a policy that instruments every module.
    pub fn instrument_all() -> Self {
        Self { scope: None }
    }

    /// Creates a policy from glob patterns over module paths.
    pub fn with_scope(patterns: &[String]) -> Result<Self, CompileError> {
        if patterns.is_empty() {
            return Ok(Self::instrument_all());
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|err| {
                CompileError::message_only(format!(
                    "Invalid rewrite scope pattern '{pattern}': {err}"
                ))
            })?;
            builder.add(glob);
        }
        let scope = builder.build().map_err(|err| {
            CompileError::message_only(format!("Invalid rewrite scope: {err}"))
        })?;
        Ok(Self { scope: Some(scope) })
    }

    /// Returns whether a module path is inside the rewrite scope.
    pub fn instruments(&self, path: &str) -> bool {
        match &self.scope {
            None => true,
            Some(scope) => scope.is_match(path),
        }
    }
}

/// Rewrites one parsed module into its executable form.
pub(crate) fn rewrite_module(
    path: &str,
    source: &str,
    module: &Module,
    policy: &RewritePolicy,
    fingerprint: String,
) -> CompiledModule {
    let mut instrumented = policy.instruments(path);
    for pragma in &module.pragmas {
        if pragma.name == PLAIN_ASSERTS_PRAGMA {
            instrumented = false;
        } else {
            tracing::warn!(pragma = %pragma.name, path, "ignoring unknown pragma");
        }
    }

    let statements = module
        .statements
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::Let { name, value } => CompiledStmt::Let {
                name: name.clone(),
                value: value.clone(),
                span: stmt.span.clone(),
            },
            StmtKind::Assert { cond, message } => {
                let shape = if instrumented { analyze(cond) } else { None };
                if instrumented && shape.is_none() {
                    tracing::debug!(
                        path,
                        line = stmt.span.line,
                        "assertion too deep to instrument; left plain"
                    );
                }
                CompiledStmt::Assert {
                    cond: cond.clone(),
                    message: message.clone(),
                    shape,
                    span: stmt.span.clone(),
                }
            }
        })
        .collect();

    CompiledModule {
        path: path.to_string(),
        fingerprint,
        source: source.to_string(),
        instrumented,
        statements,
    }
}
