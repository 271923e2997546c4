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

//! Crate unit tests.

use super::*;
use std::cell::RefCell;
use std::rc::Rc;

fn first_caret_column(pointer: &str) -> Option<usize> {
    pointer.chars().position(|ch| ch == '^').map(|idx| idx + 1)
}

fn run_source(source: &str) -> Result<RunReport, ScriptError> {
    let mut env = Env::new();
    run_script(source, &mut env)
}

fn failure_text(source: &str, env: &mut Env) -> String {
    let session = Session::new(Config::default()).expect("session");
    let module = session
        .compile_module("<inline>", source)
        .expect("module should compile");
    let err = session
        .run_module(&module, env)
        .expect_err("run should fail");
    match err {
        RunError::Assertion(failure) => failure.explanation.text(),
        RunError::Runtime(err) => panic!("expected assertion failure, got runtime error: {err}"),
    }
}

fn failure_text_default(source: &str) -> String {
    let mut env = Env::new();
    failure_text(source, &mut env)
}

fn env_with_inc() -> Env {
    let mut env = Env::new();
    env.register_function("inc", |args: &[Value], _config: &Config| match args {
        [Value::Int(v)] => Ok(Value::Int(v + 1)),
        _ => Err(RuntimeError::Type("inc expects one int".to_string())),
    });
    env
}

// ── Parsing ──────────────────────────────────────────────────────────

#[test]
fn parses_module_statements_and_pragmas() {
    let src = "pragma plain_asserts;\nlet x = 1;\nassert x == 1, \"ok\";";
    let module = parse_module(src).expect("parse");
    assert_eq!(module.pragmas.len(), 1);
    assert_eq!(module.pragmas[0].name, "plain_asserts");
    assert_eq!(module.statements.len(), 2);

    let StmtKind::Let { name, .. } = &module.statements[0].kind else {
        panic!("expected let statement");
    };
    assert_eq!(name, "x");

    let StmtKind::Assert { message, .. } = &module.statements[1].kind else {
        panic!("expected assert statement");
    };
    assert!(message.is_some());
}

#[test]
fn parses_comparison_chains_pairwise() {
    let module = parse_module("assert 1 < x <= 10;").expect("parse");
    let StmtKind::Assert { cond, .. } = &module.statements[0].kind else {
        panic!("expected assert statement");
    };
    let ExprKind::Compare { rest, .. } = &cond.kind else {
        panic!("expected comparison chain");
    };
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].0, CmpOp::Lt);
    assert_eq!(rest[1].0, CmpOp::Le);
}

#[test]
fn parses_boolean_chains_flat() {
    let module = parse_module("assert a and b and c;").expect("parse");
    let StmtKind::Assert { cond, .. } = &module.statements[0].kind else {
        panic!("expected assert statement");
    };
    let ExprKind::BoolChain { op, clauses } = &cond.kind else {
        panic!("expected boolean chain");
    };
    assert_eq!(*op, BoolOp::And);
    assert_eq!(clauses.len(), 3);
}

#[test]
fn parses_negated_membership() {
    let module = parse_module("assert 1 not in xs;").expect("parse");
    let StmtKind::Assert { cond, .. } = &module.statements[0].kind else {
        panic!("expected assert statement");
    };
    let ExprKind::Compare { rest, .. } = &cond.kind else {
        panic!("expected comparison");
    };
    assert_eq!(rest[0].0, CmpOp::NotIn);
}

#[test]
fn parses_imaginary_and_map_literals() {
    let module = parse_module("let z = 3 + 4j;\nlet cfg = {\"limit\": 10};").expect("parse");
    let StmtKind::Let { value, .. } = &module.statements[0].kind else {
        panic!("expected let statement");
    };
    let ExprKind::Binary { right, .. } = &value.kind else {
        panic!("expected binary expression");
    };
    assert!(matches!(right.kind, ExprKind::Imaginary(v) if v == 4.0));

    let StmtKind::Let { value, .. } = &module.statements[1].kind else {
        panic!("expected let statement");
    };
    assert!(matches!(&value.kind, ExprKind::MapLit(entries) if entries.len() == 1));
}

fn assert_parse_error_case(case_name: &str, source: &str, expected_line: usize) {
    let err = parse_module(source).expect_err("parse should fail");
    assert_eq!(err.line, expected_line, "{case_name}: unexpected error line");
    assert!(err.column > 0, "{case_name}: expected non-zero column");
    assert!(
        err.message.contains("Syntax error") || err.message.contains("Incomplete input"),
        "{case_name}: unexpected message '{}'",
        err.message
    );

    let expected_snippet = source
        .lines()
        .nth(err.line.saturating_sub(1))
        .unwrap_or_default();
    assert_eq!(
        err.snippet, expected_snippet,
        "{case_name}: snippet should match source line"
    );
    assert!(
        err.pointer.contains('^'),
        "{case_name}: missing caret pointer"
    );
    assert_eq!(
        first_caret_column(&err.pointer),
        Some(err.column),
        "{case_name}: caret column mismatch"
    );
}

#[test]
fn reports_parse_errors_for_invalid_forms() {
    let cases = vec![
        ("missing semicolon", "let x = 1", 1usize),
        ("missing initializer", "let x = ;", 1),
        ("unclosed parenthesis", "assert (1 == 1;", 1),
        ("unclosed list literal", "assert [1, 2 == [1, 2];", 1),
        ("non-string map key", "assert {1: 2} == {};", 1),
        ("trailing garbage", "assert 1 == 1; garbage", 1),
        ("unterminated string", "assert \"abc == 1;", 1),
        ("missing pragma name", "pragma;", 1),
        ("missing assert condition", "assert ;", 1),
        (
            "second statement malformed",
            "let x = 1;\nassert x ==;",
            2,
        ),
    ];

    for (case_name, source, expected_line) in cases {
        assert_parse_error_case(case_name, source, expected_line);
    }
}

#[test]
fn compile_errors_render_with_caret() {
    let err = parse_module("let x = ;").expect_err("parse should fail");
    let rendered = err.to_string();
    assert!(rendered.contains(" --> "));
    assert!(rendered.contains('^'));
}

// ── Rewriting and policy ─────────────────────────────────────────────

#[test]
fn pragma_disables_instrumentation() {
    let mut env = env_with_inc();
    let src = "pragma plain_asserts;\nassert inc(3) == 5;";

    let module = compile_module("<inline>", src).expect("compile");
    assert!(!module.instrumented);

    let text = failure_text(src, &mut env);
    assert_eq!(text, "assert inc(3) == 5");
}

#[test]
fn rewrite_scope_limits_instrumentation() {
    let config = Config {
        rewrite_scope: vec!["tests/**".to_string()],
        ..Config::default()
    };
    let session = Session::new(config).expect("session");
    let inside = session
        .compile_module("tests/sample.test", "assert 1 == 2;")
        .expect("compile");
    let outside = session
        .compile_module("src/helper.test", "assert 1 == 2;")
        .expect("compile");
    assert!(inside.instrumented);
    assert!(!outside.instrumented);
}

#[test]
fn invalid_scope_pattern_is_a_compile_error() {
    let err = RewritePolicy::with_scope(&["te[st".to_string()]).expect_err("bad glob");
    assert!(err.message.contains("rewrite scope"));
}

#[test]
fn overly_deep_conditions_stay_plain() {
    let mut source = String::from("assert ");
    source.push_str(&"-".repeat(81));
    source.push_str("1 == 1;");

    let module = compile_module("<inline>", &source).expect("compile");
    assert!(module.instrumented);
    assert_eq!(module.assertion_count(), 1);

    // The statement itself fell back to plain form: the failure message is
    // the bare condition text, with no captured values.
    let mut env = Env::new();
    let text = failure_text(&source, &mut env);
    assert!(text.starts_with("assert --"));
    assert!(!text.contains("where"));
}

#[test]
fn compile_all_continues_after_parse_errors() {
    let sources = vec![
        ModuleSource::new("bad.test", "let x = ;"),
        ModuleSource::new("good.test", "assert 1 == 1;"),
    ];
    let session = Session::new(Config::default()).expect("session");
    let (modules, errors) = session.compile_all(&sources);
    assert_eq!(modules.len(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(modules[0].path, "good.test");
    assert_eq!(errors[0].file, "bad.test");
}

// ── Rewrite cache ────────────────────────────────────────────────────

#[test]
fn cache_round_trips_compiled_modules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::new(Config::default())
        .expect("session")
        .with_cache(RewriteCache::new(dir.path()));

    let src = "let x = 2;\nassert x == 2;";
    let first = session
        .compile_module("tests/cache.test", src)
        .expect("compile");
    let artifacts: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read cache dir")
        .collect();
    assert_eq!(artifacts.len(), 1);

    let second = session
        .compile_module("tests/cache.test", src)
        .expect("recompile");
    assert_eq!(first, second);
}

#[test]
fn corrupt_cache_artifacts_are_rebuilt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::new(Config::default())
        .expect("session")
        .with_cache(RewriteCache::new(dir.path()));

    let src = "assert 1 == 1;";
    let fresh = session
        .compile_module("tests/corrupt.test", src)
        .expect("compile");

    let artifact = std::fs::read_dir(dir.path())
        .expect("read cache dir")
        .next()
        .expect("artifact entry")
        .expect("artifact entry")
        .path();
    std::fs::write(&artifact, b"not json").expect("corrupt artifact");

    // Corruption is a cache miss: the module is rebuilt and re-stored.
    let rebuilt = session
        .compile_module("tests/corrupt.test", src)
        .expect("recompile");
    assert_eq!(fresh, rebuilt);
    let bytes = std::fs::read(&artifact).expect("reread artifact");
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_ok());
}

#[test]
fn cache_misses_on_source_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::new(Config::default())
        .expect("session")
        .with_cache(RewriteCache::new(dir.path()));

    session
        .compile_module("tests/change.test", "assert 1 == 1;")
        .expect("compile");
    session
        .compile_module("tests/change.test", "assert 2 == 2;")
        .expect("compile changed");

    // Distinct fingerprints produce distinct artifacts.
    let artifacts: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read cache dir")
        .collect();
    assert_eq!(artifacts.len(), 2);
}

// ── Evaluation semantics ─────────────────────────────────────────────

#[test]
fn arithmetic_follows_promotion_rules() {
    let passing = [
        "assert 1 + 2 == 3;",
        "assert 7 / 2 == 3.5;",
        "assert 7 % 3 == 1;",
        "assert -7 % 3 == 2;",
        "assert 2 * 2.5 == 5.0;",
        "assert \"ab\" + \"cd\" == \"abcd\";",
        "assert [1] + [2] == [1, 2];",
        "assert (3 + 4j) * (3 - 4j) == 25;",
        "assert 1 == 1.0;",
        "assert 2 < 3 < 4;",
        "assert \"b\" in [\"a\", \"b\"];",
        "assert \"x\" not in \"abc\";",
        "assert \"k\" in {\"k\": 1};",
        "assert \"abc\"[1] == \"b\";",
        "assert not 1 == 2;",
    ];
    for src in passing {
        run_source(src).unwrap_or_else(|err| panic!("{src} should pass: {err}"));
    }
}

#[test]
fn subscripts_and_attributes_resolve() {
    let src = "let xs = [10, 20, 30];\n\
               let cfg = {\"limit\": 10};\n\
               assert xs[0] == 10;\n\
               assert xs[-1] == 30;\n\
               assert cfg.limit == 10;\n\
               assert cfg[\"limit\"] == 10;";
    let report = run_source(src).expect("run");
    assert_eq!(report.assertions_passed, 4);
}

#[test]
fn let_bindings_flow_between_statements() {
    let report = run_source("let x = 2;\nlet y = x * 3;\nassert y == 6;").expect("run");
    assert_eq!(report.assertions_passed, 1);
}

#[test]
fn eval_errors_carry_their_kind() {
    let cases: Vec<(&str, fn(&RuntimeError) -> bool)> = vec![
        ("assert missing == 1;", |err| {
            matches!(err, RuntimeError::UnknownIdentifier(name) if name == "missing")
        }),
        ("assert boom() == 1;", |err| {
            matches!(err, RuntimeError::UnknownFunction(name) if name == "boom")
        }),
        ("assert 1 / 0 == 1;", |err| {
            matches!(err, RuntimeError::DivisionByZero)
        }),
        ("assert 1 < \"a\";", |err| {
            matches!(err, RuntimeError::Type(_))
        }),
        ("assert 4j < 5j;", |err| matches!(err, RuntimeError::Type(_))),
        ("assert [1][5] == 1;", |err| {
            matches!(err, RuntimeError::IndexOutOfRange { index: 5, len: 1 })
        }),
        ("assert {\"a\": 1}.b == 1;", |err| {
            matches!(err, RuntimeError::MissingAttribute { ty: "map", .. })
        }),
        ("assert 1 in 2;", |err| matches!(err, RuntimeError::Type(_))),
        ("assert len(1) == 1;", |err| {
            matches!(err, RuntimeError::Type(_))
        }),
    ];

    for (src, check) in cases {
        let err = run_source(src).expect_err("should raise");
        let ScriptError::Run(RunError::Runtime(runtime)) = &err else {
            panic!("{src}: expected runtime error, got {err:?}");
        };
        assert!(check(runtime), "{src}: unexpected error {runtime:?}");
    }
}

#[test]
fn runtime_errors_are_never_assertion_failures() {
    // Spec: errors during condition evaluation propagate unchanged; the
    // same holds for the failure-path message expression.
    let mut env = Env::new();
    let err = run_script("assert 1 == 2, missing;", &mut env).expect_err("message error");
    assert!(matches!(
        err,
        ScriptError::Run(RunError::Runtime(RuntimeError::UnknownIdentifier(_)))
    ));
}

#[test]
fn stdlib_builtins_cover_common_shapes() {
    let passing = [
        "assert len([1, 2]) == 2;",
        "assert len(\"abc\") == 3;",
        "assert abs(-3) == 3;",
        "assert abs(3 + 4j) == 5.0;",
        "assert min([3, 1, 2]) == 1;",
        "assert max(3, 7) == 7;",
        "assert sum([1, 2, 3]) == 6;",
        "assert str(12) == \"12\";",
        "assert keys({\"a\": 1, \"b\": 2}) == [\"a\", \"b\"];",
        "assert contains([1, 2], 2);",
    ];
    for src in passing {
        run_source(src).unwrap_or_else(|err| panic!("{src} should pass: {err}"));
    }
}

// ── Side effects, short-circuiting, laziness ─────────────────────────

#[test]
fn calls_evaluate_exactly_once() {
    let calls = Rc::new(RefCell::new(0i64));
    let mut env = Env::new();
    let counter = calls.clone();
    env.register_function("tick", move |_args: &[Value], _config: &Config| {
        *counter.borrow_mut() += 1;
        let count = *counter.borrow();
        Ok(Value::Int(count))
    });

    run_script("assert tick() == 1;", &mut env).expect("first tick should pass");
    assert_eq!(*calls.borrow(), 1);

    let err = run_script("assert tick() == 99;", &mut env).expect_err("second tick should fail");
    assert_eq!(*calls.borrow(), 2, "failure path must not re-evaluate");
    assert!(matches!(err, ScriptError::Run(RunError::Assertion(_))));
}

#[test]
fn short_circuit_and_skips_right_clause() {
    let calls = Rc::new(RefCell::new(0i64));
    let mut env = Env::new();
    let counter = calls.clone();
    env.register_function("second", move |_args: &[Value], _config: &Config| {
        *counter.borrow_mut() += 1;
        Ok(Value::Bool(true))
    });
    env.bind("flag", Value::Bool(false));

    let session = Session::new(Config::default()).expect("session");
    let module = session
        .compile_module("<inline>", "assert flag and second();")
        .expect("compile");
    let err = session
        .run_module(&module, &mut env)
        .expect_err("should fail");
    let failure = err.assertion().expect("assertion failure");

    assert_eq!(*calls.borrow(), 0, "short-circuited clause must not run");
    let text = failure.explanation.text();
    assert!(text.contains("assert (false)"), "unexpected: {text}");
    assert!(!text.contains("second"));
}

#[test]
fn short_circuit_or_skips_right_clause() {
    let calls = Rc::new(RefCell::new(0i64));
    let mut env = Env::new();
    let counter = calls.clone();
    env.register_function("second", move |_args: &[Value], _config: &Config| {
        *counter.borrow_mut() += 1;
        Ok(Value::Bool(false))
    });
    env.bind("flag", Value::Bool(true));

    let report = run_script("assert flag or second();", &mut env).expect("should pass");
    assert_eq!(report.assertions_passed, 1);
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn comparison_chain_stops_at_first_false_pair() {
    let calls = Rc::new(RefCell::new(0i64));
    let mut env = Env::new();
    let counter = calls.clone();
    env.register_function("third", move |_args: &[Value], _config: &Config| {
        *counter.borrow_mut() += 1;
        Ok(Value::Int(10))
    });
    env.bind("a", Value::Int(1));
    env.bind("b", Value::Int(0));

    let text = failure_text("assert a < b < third();", &mut env);
    assert_eq!(*calls.borrow(), 0, "operand after false pair must not run");
    assert!(text.contains("assert 1 < 0"), "unexpected: {text}");
    assert!(!text.contains("third"));
}

#[test]
fn message_is_lazy_on_success() {
    let calls = Rc::new(RefCell::new(0i64));
    let mut env = Env::new();
    let counter = calls.clone();
    env.register_function("note", move |_args: &[Value], _config: &Config| {
        *counter.borrow_mut() += 1;
        Ok(Value::Str("never".to_string()))
    });

    let report = run_script("assert 1 == 1, note();", &mut env).expect("should pass");
    assert_eq!(report.assertions_passed, 1);
    assert_eq!(*calls.borrow(), 0, "message must not be evaluated on success");
}

// ── Explanations ─────────────────────────────────────────────────────

#[test]
fn explains_failed_call_comparison() {
    let mut env = env_with_inc();
    let text = failure_text("assert inc(3) == 5;", &mut env);
    assert!(text.contains("assert 4 == 5"), "unexpected: {text}");
    assert!(text.contains("+  where 4 = inc(3)"), "unexpected: {text}");
}

#[test]
fn nested_call_provenance_orders_outermost_first() {
    let mut env = env_with_inc();
    let text = failure_text("assert inc(inc(1)) == 5;", &mut env);
    assert!(text.contains("assert 3 == 5"), "unexpected: {text}");

    let outer = text
        .find("+  where 3 = inc(inc(1))")
        .expect("outer where line");
    let inner = text.find("+    where 2 = inc(1)").expect("inner where line");
    assert!(outer < inner, "outermost must come first:\n{text}");
}

#[test]
fn attribute_values_get_where_lines() {
    let text = failure_text_default("let cfg = {\"limit\": 10};\nassert cfg.limit == 3;");
    assert!(text.contains("assert 10 == 3"), "unexpected: {text}");
    assert!(text.contains("+  where 10 = cfg.limit"), "unexpected: {text}");
}

#[test]
fn diffs_same_type_lists() {
    let src = r#"
let left = ["version", "version_info", "sys.version", "sys.version_info"];
let right = ["version", "version_info", "sys.version", "sys.version_info", " ", "sys.version", "sys.version_info"];
assert left == right;
"#;
    let text = failure_text_default(src);
    let lines: Vec<&str> = text.lines().collect();

    assert!(
        lines.iter().any(|line| line.trim() == "["),
        "missing opening bracket line:\n{text}"
    );
    assert!(
        lines.iter().any(|line| line.trim() == "]"),
        "missing closing bracket line:\n{text}"
    );

    let added = lines
        .iter()
        .filter(|line| line.trim_start().starts_with("+ \""))
        .count();
    let removed = lines
        .iter()
        .filter(|line| line.trim_start().starts_with("- "))
        .count();
    assert_eq!(added, 3, "expected three added lines:\n{text}");
    assert_eq!(removed, 0, "expected no removed lines:\n{text}");

    // The unchanged prefix is shown unmarked.
    assert!(
        lines
            .iter()
            .any(|line| line.trim_start().starts_with("\"version\",")),
        "missing unmarked prefix line:\n{text}"
    );
}

#[test]
fn diffs_same_type_maps() {
    let text =
        failure_text_default("assert {\"a\": 1, \"b\": 2} == {\"a\": 1, \"b\": 3};");
    assert!(text.contains("- \"b\": 2,"), "unexpected: {text}");
    assert!(text.contains("+ \"b\": 3,"), "unexpected: {text}");
    assert!(text.contains("\"a\": 1,"), "unexpected: {text}");
}

#[test]
fn diffs_multiline_strings_linewise() {
    let text =
        failure_text_default("assert \"line1\\nline2\" == \"line1\\nline3\";");
    assert!(text.contains("- line2"), "unexpected: {text}");
    assert!(text.contains("+ line3"), "unexpected: {text}");
}

#[test]
fn mixed_type_comparisons_are_not_diffed() {
    let text = failure_text_default("assert [1, 2] == \"12\";");
    assert_eq!(text, "assert [1, 2] == \"12\"");
}

#[test]
fn bool_chain_elaborates_deciding_comparison() {
    let text = failure_text_default("assert 1 == 1 and [1, 2] == [1, 3];");
    assert!(
        text.contains("assert (1 == 1 and [1, 2] == [1, 3])"),
        "unexpected: {text}"
    );
    assert!(text.contains("- 2,"), "unexpected: {text}");
    assert!(text.contains("+ 3,"), "unexpected: {text}");
}

#[test]
fn bool_chain_summary_uses_operand_values() {
    let text = failure_text_default("assert 0 or [];");
    assert!(text.contains("assert (0 or [])"), "unexpected: {text}");
}

#[test]
fn includes_user_message_on_failure() {
    let mut env = Env::new();
    env.bind("x", Value::Int(3));
    env.bind("y", Value::Int(4));

    let session = Session::new(Config::default()).expect("session");
    let module = session
        .compile_module("<inline>", "assert x == y, \"custom msg\";")
        .expect("compile");
    let err = session
        .run_module(&module, &mut env)
        .expect_err("should fail");
    let failure = err.assertion().expect("assertion failure");

    assert_eq!(failure.user_message.as_deref(), Some("custom msg"));
    let text = failure.explanation.text();
    assert!(text.contains("custom msg"), "unexpected: {text}");
    assert!(text.contains("assert 3 == 4"), "unexpected: {text}");
}

#[test]
fn formats_complex_approx_with_polar_tolerance() {
    let text = failure_text_default("assert approx(3 + 4j) == 5;");
    assert!(text.contains("∠ ±180°"), "unexpected: {text}");
    assert!(text.contains("5.0e-06"), "unexpected: {text}");
}

#[test]
fn failures_carry_source_location() {
    let mut env = Env::new();
    let session = Session::new(Config::default()).expect("session");
    let module = session
        .compile_module("tests/loc.test", "let x = 1;\nassert x == 2;")
        .expect("compile");
    let err = session
        .run_module(&module, &mut env)
        .expect_err("should fail");
    let failure = err.assertion().expect("assertion failure");

    assert_eq!(failure.file, "tests/loc.test");
    assert_eq!(failure.line, 2);
    assert_eq!(failure.snippet, "assert x == 2;");
    assert_eq!(first_caret_column(&failure.pointer), Some(failure.column));
    assert!(failure.to_string().contains("tests/loc.test:2:"));
}

#[test]
fn truncates_oversized_explanations() {
    let left: Vec<String> = (0..30).map(|i| i.to_string()).collect();
    let right: Vec<String> = (30..60).map(|i| i.to_string()).collect();
    let src = format!(
        "assert [{}] == [{}];",
        left.join(", "),
        right.join(", ")
    );

    let config = Config {
        max_explanation_lines: 5,
        ..Config::default()
    };
    let session = Session::new(config).expect("session");
    let module = session.compile_module("<inline>", &src).expect("compile");
    let mut env = Env::new();
    let err = session
        .run_module(&module, &mut env)
        .expect_err("should fail");
    let failure = err.assertion().expect("assertion failure");

    let lines = &failure.explanation.lines;
    assert_eq!(lines.len(), 6, "five kept lines plus the marker");
    assert!(
        lines
            .last()
            .expect("marker line")
            .contains("full output truncated"),
        "missing truncation marker: {lines:?}"
    );
}

#[test]
fn assembly_is_deterministic() {
    let src = "assert {\"a\": [1, 2]} == {\"a\": [1, 3]};";
    let first = failure_text_default(src);
    let second = failure_text_default(src);
    assert_eq!(first, second);
}

// ── Approx wrapper ───────────────────────────────────────────────────

#[test]
fn approx_accepts_values_within_tolerance() {
    let passing = [
        "assert 1.0000001 == approx(1);",
        "assert approx(1) == 1.0000001;",
        "assert approx(0) == 0.0000000000001;",
        "assert approx(100, 0.05) == 104;",
        "assert approx(100, 0.01, 10) == 109;",
        "assert approx([1, 2]) == [1, 2.0000001];",
        "assert approx(3 + 4j) == 3.0000001 + 4j;",
    ];
    for src in passing {
        run_source(src).unwrap_or_else(|err| panic!("{src} should pass: {err}"));
    }
}

#[test]
fn approx_rejects_values_outside_tolerance() {
    let failing = [
        "assert 1.001 == approx(1);",
        "assert approx(0) == 0.1;",
        "assert approx([1, 2]) == [1];",
        "assert approx([1, 2]) == [1, 3];",
    ];
    for src in failing {
        let err = run_source(src).expect_err("should fail");
        assert!(
            matches!(err, ScriptError::Run(RunError::Assertion(_))),
            "{src}: expected assertion failure, got {err:?}"
        );
    }
}

#[test]
fn approx_requires_numeric_expected_values() {
    let err = run_source("assert approx(\"x\") == 1;").expect_err("should raise");
    assert!(matches!(
        err,
        ScriptError::Run(RunError::Runtime(RuntimeError::Type(_)))
    ));
}

#[test]
fn approx_reprs_annotate_tolerance() {
    let config = Config::default();

    let scalar = ApproxValue::new(Value::Int(4)).expect("approx");
    assert_eq!(
        crate::format::repr(&Value::Approx(scalar), &config),
        "4 ± 4.0e-06"
    );

    let real = ApproxValue::new(Value::Float(2.5)).expect("approx");
    assert_eq!(
        crate::format::repr(&Value::Approx(real), &config),
        "2.5 ± 2.5e-06"
    );

    let complex = ApproxValue::new(Value::Complex { re: 3.0, im: 4.0 }).expect("approx");
    assert_eq!(
        crate::format::repr(&Value::Approx(complex), &config),
        "(3+4j) ± 5.0e-06 ∠ ±180°"
    );
}

// ── Value formatting ─────────────────────────────────────────────────

#[test]
fn value_reprs_are_stable() {
    let config = Config::default();
    let cases: Vec<(Value, &str)> = vec![
        (Value::Int(4), "4"),
        (Value::Float(4.0), "4.0"),
        (Value::Float(2.5), "2.5"),
        (Value::Bool(true), "true"),
        (Value::Str("hi".to_string()), "\"hi\""),
        (Value::Str("a\"b".to_string()), "\"a\\\"b\""),
        (Value::Complex { re: 0.0, im: 4.0 }, "4j"),
        (Value::Complex { re: 3.0, im: -4.0 }, "(3-4j)"),
        (
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            "[1, 2]",
        ),
        (
            Value::Map(std::collections::BTreeMap::from([(
                "a".to_string(),
                Value::Int(1),
            )])),
            "{\"a\": 1}",
        ),
    ];
    for (value, expected) in cases {
        assert_eq!(crate::format::repr(&value, &config), expected);
    }
}

#[test]
fn diff_of_identical_lists_has_no_markers() {
    let config = Config::default();
    let value = Value::List(vec![Value::Int(1), Value::Str("x".to_string())]);
    let lines =
        crate::format::diff_values(&value, &value.clone(), &config).expect("same-type diff");
    assert!(
        lines
            .iter()
            .all(|line| !line.starts_with('+') && !line.starts_with('-')),
        "unexpected markers: {lines:?}"
    );
}

// ── Properties ───────────────────────────────────────────────────────

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn instrumentation_preserves_truthiness(
            a in -50i64..50,
            b in -50i64..50,
            op_idx in 0usize..6,
        ) {
            let ops = ["==", "!=", "<", "<=", ">", ">="];
            let op = ops[op_idx];
            let instrumented = format!("assert {a} {op} {b};");
            let plain = format!("pragma plain_asserts;\nassert {a} {op} {b};");
            prop_assert_eq!(
                run_source(&instrumented).is_ok(),
                run_source(&plain).is_ok()
            );
        }

        #[test]
        fn approx_equality_is_symmetric(x in -1e6f64..1e6, y in -1e6f64..1e6) {
            let config = Config::default();
            let approx = ApproxValue::new(Value::Float(x)).expect("approx");
            let wrapped = Value::Approx(approx);
            let candidate = Value::Float(y);
            prop_assert_eq!(
                crate::runtime::value_eq(&wrapped, &candidate, &config),
                crate::runtime::value_eq(&candidate, &wrapped, &config)
            );
        }

        #[test]
        fn identical_sequence_diffs_have_no_markers(
            items in proptest::collection::vec("[a-z]{0,6}", 0..8),
        ) {
            let value = Value::List(items.into_iter().map(Value::Str).collect());
            let lines = crate::format::diff_values(&value, &value.clone(), &Config::default())
                .expect("same-type diff");
            prop_assert!(
                lines.iter().all(|line| !line.starts_with('+') && !line.starts_with('-'))
            );
        }
    }
}
