#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use weft_ir::{Form, FormSource, Head, Literal, Stmt, Thunk, VecSource};
use weft_runtime::{ErrorCategory, Runtime, Value, WarningKind};

use crate::backend::SourceParser;
use crate::reference::Route;
use crate::test_helpers::TestSession;

/// `L0: if !cond goto L1; goto L0; L1:` with a condition the interpreter can
/// evaluate.
fn idle_loop(cond: bool) -> Vec<Stmt> {
    vec![
        Stmt::Label(0),
        Stmt::GotoIfNot {
            cond: Form::Literal(Literal::Bool(cond)),
            target: 1,
        },
        Stmt::Goto(0),
        Stmt::Label(1),
    ]
}

#[test]
fn test_trivial_forms_go_to_interpreter() {
    let mut s = TestSession::new();
    assert_eq!(s.eval(Form::int(7)).unwrap(), Value::Int(7));
    assert_eq!(s.eval(Form::Null).unwrap(), Value::Nothing);
    assert_eq!(s.routes(), vec![Route::Interpret, Route::Interpret]);
}

#[test]
fn test_parser_error_forms_raise_syntax_errors() {
    let mut s = TestSession::new();
    let err = s.eval(Form::SyntaxError("unexpected )".into())).unwrap_err();
    assert_eq!(err.message, "syntax: unexpected )");
    assert_eq!(err.category(), ErrorCategory::Syntax);

    let err = s.eval(Form::Incomplete("incomplete: premature end of input".into())).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    assert!(s.routes().is_empty());
}

#[test]
fn test_splice_returns_last_value() {
    let mut s = TestSession::new();
    let value = s
        .run(|s| Form::Toplevel(vec![s.assign("a", Form::int(1)), s.sym("a"), Form::int(2)]))
        .unwrap();
    assert_eq!(value, Value::Int(2));
    assert_eq!(s.run(|s| s.sym("a")).unwrap(), Value::Int(1));
    assert_eq!(s.run(|_| Form::Toplevel(Vec::new())).unwrap(), Value::Nothing);
}

#[test]
fn test_plain_expression_is_expanded_then_interpreted() {
    let mut s = TestSession::new();
    s.run(|s| s.assign("x", Form::int(1))).unwrap();
    assert_eq!(s.routes(), vec![Route::Expand, Route::Interpret]);
}

#[test]
fn test_intrinsic_call_is_compiled() {
    let mut s = TestSession::new();
    let value = s
        .run(|s| s.call("add_int", [Form::int(1), Form::int(2)]))
        .unwrap();
    assert_eq!(value, Value::Int(3));
    assert_eq!(s.routes(), vec![Route::Expand, Route::Compile, Route::Apply]);
}

#[test]
fn test_intrinsic_through_top_reference_is_compiled() {
    let mut s = TestSession::new();
    let value = s
        .run(|s| Form::call(Form::TopRef(s.name("mul_int")), [Form::int(6), Form::int(7)]))
        .unwrap();
    assert_eq!(value, Value::Int(42));
    assert_eq!(s.routes(), vec![Route::Expand, Route::Compile, Route::Apply]);
}

#[test]
fn test_straight_line_body_is_interpreted() {
    let mut s = TestSession::new();
    let body = Form::Body(vec![Stmt::Expr(Form::int(1)), Stmt::Expr(Form::int(2))]);
    assert_eq!(s.eval(body.clone()).unwrap(), Value::Int(2));
    assert_eq!(s.eval_form(body, false).unwrap(), Value::Int(2));
    assert_eq!(s.routes(), vec![Route::InterpretBody, Route::InterpretBody]);
}

#[test]
fn test_loops_compile_only_in_fast_mode() {
    let mut s = TestSession::new();
    s.eval(Form::Body(idle_loop(false))).unwrap();
    assert_eq!(s.routes(), vec![Route::Compile, Route::Apply]);

    s.machine.clear_routes();
    s.eval_form(Form::Body(idle_loop(false)), false).unwrap();
    assert_eq!(s.routes(), vec![Route::InterpretBody]);
}

#[test]
fn test_loop_compilation_can_be_disabled() {
    let mut s = TestSession::with(|builder| builder.compile_loops(false));
    assert!(!s.config().compile_loops);
    s.eval(Form::Body(idle_loop(false))).unwrap();
    assert_eq!(s.routes(), vec![Route::InterpretBody]);
}

#[test]
fn test_captures_force_compilation() {
    let mut s = TestSession::new();
    let captured = s.name("outer");
    let thunk = Thunk {
        body: vec![Stmt::Expr(Form::int(5))],
        captures: vec![captured],
        locals: Vec::new(),
    };
    assert_eq!(s.eval(Form::Thunk(Arc::new(thunk))).unwrap(), Value::Int(5));
    assert_eq!(s.routes(), vec![Route::Compile, Route::Apply]);

    s.machine.clear_routes();
    let plain = Thunk::new(vec![Stmt::Expr(Form::int(6))]);
    assert_eq!(s.eval(Form::Thunk(Arc::new(plain))).unwrap(), Value::Int(6));
    assert_eq!(s.routes(), vec![Route::InterpretThunk]);
}

#[test]
fn test_compiled_closures_are_released_from_roots() {
    let mut s = TestSession::new();
    let before = s.rt.roots.len();
    s.run(|s| s.call("add_int", [Form::int(1), Form::int(1)])).unwrap();
    assert_eq!(s.rt.roots.len(), before);
}

#[test]
fn test_eval_all_returns_last_value() {
    let mut s = TestSession::new();
    let forms = vec![s.assign("a", Form::int(4)), s.sym("a")];
    let mut source = VecSource::new(forms);
    assert_eq!(s.eval_all("demo.wf", &mut source).unwrap(), Value::Int(4));
}

#[test]
fn test_eval_all_wraps_errors_with_line() {
    let mut s = TestSession::new();
    let forms = vec![
        (1, s.assign("a", Form::int(4))),
        (4, s.sym("missing")),
        (9, s.assign("b", Form::int(5))),
    ];
    let mut source = VecSource::with_lines(forms);
    let err = s.eval_all("demo.wf", &mut source).unwrap_err();

    assert_eq!(err.message, "error loading demo.wf, in expression starting on line 4");
    assert_eq!(err.category(), ErrorCategory::Load);
    assert_eq!(err.root_cause().message, "missing not defined");
    assert!(s.run(|s| s.sym("b")).is_err());
    assert_eq!(s.rt.location().1, 0);
}

#[test]
fn test_eval_all_sets_location_for_definitions() {
    let mut s = TestSession::new();
    let sparam = s.sym("T");
    let method = Form::Expr {
        head: Head::Method,
        args: vec![
            s.sym("f"),
            Form::block(vec![s.sym("x")]),
            Form::block(vec![sparam]),
            s.sym("x"),
        ],
    };
    let mut source = VecSource::with_lines([(3, method)]);
    s.eval_all("defs.wf", &mut source).unwrap();

    assert_eq!(
        s.warnings_of(WarningKind::UnusedStaticParameter),
        vec![
            "static parameter T does not occur in signature for f at defs.wf:3.\nThe method will not be callable."
                .to_string()
        ]
    );
}

#[test]
fn test_eval_source_needs_a_parser() {
    let mut s = TestSession::new();
    let err = s.eval_source("x.wf", "1").unwrap_err();
    assert_eq!(err.message, "no source parser configured");
}

#[test]
fn test_load_file_rejects_missing_path() {
    let mut s = TestSession::new();
    let err = s.load_file(Path::new("/nonexistent/weft/x.wf")).unwrap_err();
    assert_eq!(err.message, "could not open file /nonexistent/weft/x.wf");
    assert_eq!(err.category(), ErrorCategory::Load);
}

/// Reads one integer literal per non-blank line.
struct IntLines;

impl SourceParser for IntLines {
    fn parse(&mut self, _rt: &Runtime, _name: &str, text: &str) -> Box<dyn FormSource> {
        let forms: Vec<(u32, Form)> = text
            .lines()
            .zip(1u32..)
            .filter_map(|(line, n)| line.trim().parse().ok().map(|v| (n, Form::int(v))))
            .collect();
        Box::new(VecSource::with_lines(forms))
    }
}

#[test]
fn test_load_file_into_the_standard_library() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extras.wf");
    std::fs::write(&path, "1\n\n5\n").unwrap();

    let mut s = TestSession::with(|b| b.parser(IntLines));
    s.run(|s| s.bare_module("Base", vec![])).unwrap();
    let base = s.module_id(&["Base"]).unwrap();
    assert_eq!(s.rt.stdlib(), Some(base));

    let mut scope = s.enter_module(base);
    assert_eq!(scope.load_file(&path).unwrap(), Value::Int(5));
    scope.complete();
    assert_eq!(s.current_module(), s.rt.root());
}

#[test]
fn test_call_value_runs_natives_and_rejects_values() {
    let mut s = TestSession::new();
    let double = s.register_native(|_, args| match args {
        [Value::Int(n)] => Ok(Value::Int(n * 2)),
        _ => Ok(Value::Nothing),
    });
    assert_eq!(s.call_value(&double, &[Value::Int(21)]).unwrap(), Value::Int(42));

    let err = s.call_value(&Value::Int(1), &[]).unwrap_err();
    assert_eq!(err.message, "Int is not callable");
}

#[test]
fn test_toplevel_only_forms_are_rejected_inside_expressions() {
    let mut s = TestSession::new();
    let err = s
        .run(|s| Form::block(vec![Form::int(1), s.export(&["x"])]))
        .unwrap_err();
    assert_eq!(err.message, "syntax: \"export\" expression not at top level");
}
