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

//! Session API: compile modules (with caching) and execute them.

use crate::Config;
use crate::analyze::AssertShape;
use crate::ast::{BoolOp, Expr, ExprKind, SourceSpan};
use crate::diagnostics::{CompileError, snippet_and_pointer};
use crate::explain::{self, ConditionTrace, Explanation, OperandTrace};
use crate::format;
use crate::parser::parse_module_in_source;
use crate::rewrite::{
    CompiledModule, CompiledStmt, RewriteCache, RewritePolicy, rewrite_module, source_fingerprint,
};
use crate::runtime::{CaptureSink, Env, RuntimeError, Value, compare_values, eval_expr};
use std::fmt;
use thiserror::Error;

/// One module source unit handed to the session by the loading collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// Logical module path used in diagnostics and cache keys.
    pub path: String,
    /// Full module source text.
    pub source: String,
}

impl ModuleSource {
    /// Creates a source unit.
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Statistics for one successful module run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Number of assertions that held.
    pub assertions_passed: usize,
}

/// A failed assertion with its assembled explanation and source context.
#[derive(Debug, Clone)]
pub struct AssertionFailure {
    /// The multi-line failure explanation.
    pub explanation: Explanation,
    /// Rendered user message, when the statement carried one.
    pub user_message: Option<String>,
    /// Module path.
    pub file: String,
    /// 1-based source line of the assert statement.
    pub line: usize,
    /// 1-based source column of the assert statement.
    pub column: usize,
    /// Source line snippet.
    pub snippet: String,
    /// Caret pointer for `snippet`.
    pub pointer: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n --> {}:{}:{}\n  |\n{:>3} | {}\n  | {}",
            self.explanation, self.file, self.line, self.column, self.line, self.snippet,
            self.pointer
        )
    }
}

/// Errors produced while executing a compiled module.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    /// An assertion was false; carries the assembled explanation.
    #[error("{0}")]
    Assertion(Box<AssertionFailure>),
    /// Evaluation raised an error; propagated unchanged, never folded into
    /// an assertion failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RunError {
    /// Returns the assertion failure payload when present.
    pub fn assertion(&self) -> Option<&AssertionFailure> {
        match self {
            RunError::Assertion(failure) => Some(failure),
            RunError::Runtime(_) => None,
        }
    }
}

/// Compilation and execution front-end.
///
/// A session owns the configuration, the rewrite policy derived from it,
/// and an optional artifact cache. It holds no per-run mutable state, so
/// one session can compile and run any number of modules.
#[derive(Debug)]
pub struct Session {
    config: Config,
    policy: RewritePolicy,
    cache: Option<RewriteCache>,
}

impl Session {
    /// Creates a session from a configuration.
    pub fn new(config: Config) -> Result<Self, CompileError> {
        let policy = RewritePolicy::with_scope(&config.rewrite_scope)?;
        Ok(Self {
            config,
            policy,
            cache: None,
        })
    }

    /// Attaches an on-disk rewrite cache.
    pub fn with_cache(mut self, cache: RewriteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles one module: cache lookup, parse, rewrite, cache store.
    pub fn compile_module(&self, path: &str, source: &str) -> Result<CompiledModule, CompileError> {
        let fingerprint = source_fingerprint(source);
        if let Some(cache) = &self.cache {
            if let Some(module) = cache.load(path, &fingerprint) {
                tracing::debug!(path, "rewrite cache hit");
                return Ok(module);
            }
        }

        let parsed = parse_module_in_source(source, path)?;
        let module = rewrite_module(path, source, &parsed, &self.policy, fingerprint);
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.store(&module) {
                // Cache trouble is never fatal; the compiled module is
                // simply regenerated next run.
                tracing::warn!(path, error = %err, "failed to store rewrite cache artifact");
            }
        }
        Ok(module)
    }

    /// Compiles many modules, collecting per-module diagnostics.
    ///
    /// A module that fails to parse is skipped with its diagnostic
    /// recorded; compilation continues for the remaining modules.
    pub fn compile_all(
        &self,
        sources: &[ModuleSource],
    ) -> (Vec<CompiledModule>, Vec<CompileError>) {
        let mut modules = Vec::new();
        let mut errors = Vec::new();
        for source in sources {
            match self.compile_module(&source.path, &source.source) {
                Ok(module) => modules.push(module),
                Err(err) => {
                    tracing::warn!(path = %source.path, error = %err.message, "module failed to compile");
                    errors.push(err);
                }
            }
        }
        (modules, errors)
    }

    /// Executes a compiled module against an environment.
    ///
    /// Stops at the first failed assertion or runtime error. Runtime
    /// errors raised by condition or message expressions propagate
    /// unchanged.
    pub fn run_module(
        &self,
        module: &CompiledModule,
        env: &mut Env,
    ) -> Result<RunReport, RunError> {
        let mut assertions_passed = 0;
        for stmt in &module.statements {
            match stmt {
                CompiledStmt::Let { name, value, .. } => {
                    let mut sink = CaptureSink::disarmed();
                    let bound = eval_expr(value, env, &self.config, &mut sink)?;
                    env.bind(name.clone(), bound);
                }
                CompiledStmt::Assert {
                    cond,
                    message,
                    shape,
                    span,
                } => {
                    self.run_assert(module, cond, message.as_ref(), shape.as_ref(), span, env)?;
                    assertions_passed += 1;
                }
            }
        }
        Ok(RunReport { assertions_passed })
    }

    /// Executes one assertion statement.
    fn run_assert(
        &self,
        module: &CompiledModule,
        cond: &Expr,
        message: Option<&Expr>,
        shape: Option<&AssertShape>,
        span: &SourceSpan,
        env: &Env,
    ) -> Result<(), RunError> {
        match shape {
            Some(shape) => {
                let (holds, trace) = self.eval_condition(cond, shape, env)?;
                if holds {
                    // Success path: captures are dropped without any
                    // formatting work.
                    return Ok(());
                }
                let user_message = self.eval_message(message, env)?;
                let explanation = explain::assemble(
                    &trace,
                    user_message.as_deref(),
                    &module.source,
                    &self.config,
                );
                Err(RunError::Assertion(Box::new(self.failure(
                    module,
                    span,
                    explanation,
                    user_message,
                ))))
            }
            None => {
                let mut sink = CaptureSink::disarmed();
                let value = eval_expr(cond, env, &self.config, &mut sink)?;
                if value.is_truthy() {
                    return Ok(());
                }
                let user_message = self.eval_message(message, env)?;
                // Plain asserts report only the original condition text.
                let mut lines = Vec::new();
                if let Some(msg) = &user_message {
                    lines.extend(msg.lines().map(str::to_string));
                }
                lines.push(format!("assert {}", cond.span.text(&module.source)));
                let explanation = Explanation { lines };
                Err(RunError::Assertion(Box::new(self.failure(
                    module,
                    span,
                    explanation,
                    user_message,
                ))))
            }
        }
    }

    /// Evaluates the lazy user message; reached only on the failure path.
    fn eval_message(
        &self,
        message: Option<&Expr>,
        env: &Env,
    ) -> Result<Option<String>, RuntimeError> {
        let Some(expr) = message else {
            return Ok(None);
        };
        let mut sink = CaptureSink::disarmed();
        let value = eval_expr(expr, env, &self.config, &mut sink)?;
        Ok(Some(match value {
            Value::Str(s) => s,
            other => format::repr(&other, &self.config),
        }))
    }

    /// Evaluates a condition along its capture plan, exactly once.
    ///
    /// Returns the truthiness plus the trace the assembler consumes on
    /// failure. Evaluation order and short-circuiting match the plain
    /// (uninstrumented) semantics of the same expression.
    fn eval_condition(
        &self,
        expr: &Expr,
        shape: &AssertShape,
        env: &Env,
    ) -> Result<(bool, ConditionTrace), RuntimeError> {
        match (shape, &expr.kind) {
            (AssertShape::Compare { .. }, ExprKind::Compare { first, rest }) => {
                let mut operands = vec![self.eval_operand(first, env)?];
                let mut ops = Vec::new();
                let mut holds = true;
                for (op, rhs) in rest {
                    let right = self.eval_operand(rhs, env)?;
                    let pair_holds = compare_values(
                        *op,
                        &operands[operands.len() - 1].value,
                        &right.value,
                        &self.config,
                    )?;
                    ops.push(*op);
                    operands.push(right);
                    if !pair_holds {
                        // Later operands are never evaluated and never
                        // appear in the explanation.
                        holds = false;
                        break;
                    }
                }
                Ok((holds, ConditionTrace::Compare { operands, ops }))
            }
            (AssertShape::Bool { op, clauses }, ExprKind::BoolChain { clauses: exprs, .. }) => {
                let mut traces = Vec::new();
                let mut result = matches!(op, BoolOp::And);
                for (clause_shape, clause_expr) in clauses.iter().zip(exprs.iter()) {
                    let (truthy, trace) = self.eval_condition(clause_expr, clause_shape, env)?;
                    traces.push(trace);
                    result = truthy;
                    match op {
                        BoolOp::And if !truthy => break,
                        BoolOp::Or if truthy => break,
                        _ => {}
                    }
                }
                Ok((
                    result,
                    ConditionTrace::Bool {
                        op: *op,
                        clauses: traces,
                    },
                ))
            }
            (AssertShape::Negation, ExprKind::Not(inner)) => {
                let operand = self.eval_operand(inner, env)?;
                let holds = !operand.value.is_truthy();
                Ok((holds, ConditionTrace::Negation { inner: operand }))
            }
            // Plan/expression drift (a hand-edited artifact) degrades to
            // opaque capture instead of failing the run.
            _ => {
                let operand = self.eval_operand(expr, env)?;
                let holds = operand.value.is_truthy();
                Ok((holds, ConditionTrace::Opaque { operand }))
            }
        }
    }

    /// Evaluates one operand with an armed capture sink.
    fn eval_operand(&self, expr: &Expr, env: &Env) -> Result<OperandTrace, RuntimeError> {
        let mut sink = CaptureSink::armed();
        let value = eval_expr(expr, env, &self.config, &mut sink)?;
        Ok(OperandTrace {
            value,
            span: expr.span.clone(),
            wheres: sink.into_records(),
        })
    }

    /// Builds the failure payload with source snippet and caret context.
    fn failure(
        &self,
        module: &CompiledModule,
        span: &SourceSpan,
        explanation: Explanation,
        user_message: Option<String>,
    ) -> AssertionFailure {
        let (snippet, pointer) = snippet_and_pointer(&module.source, span);
        AssertionFailure {
            explanation,
            user_message,
            file: module.path.clone(),
            line: span.line,
            column: span.column,
            snippet,
            pointer,
        }
    }
}
