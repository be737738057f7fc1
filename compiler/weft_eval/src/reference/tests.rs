#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use weft_ir::{Form, Head, Literal, Stmt, StringInterner};
use weft_runtime::{DiagnosticSink, Runtime, RuntimeNames, Ty, Value};

use super::*;
use crate::test_helpers::TestSession;

fn runtime() -> Runtime {
    let mut rt = Runtime::new(
        Arc::new(StringInterner::new()),
        &RuntimeNames::default(),
        DiagnosticSink::Silent,
    );
    install(&mut rt).unwrap();
    rt
}

fn typed(s: &TestSession, name: &str, ty: Form) -> Form {
    s.custom("::", vec![s.sym(name), ty])
}

fn method(s: &TestSession, f: &str, params: Vec<Form>, sparams: Vec<Form>, body: Form) -> Form {
    Form::Expr {
        head: Head::Method,
        args: vec![s.sym(f), Form::block(params), Form::block(sparams), body],
    }
}

fn declare(head: Head, name: Form, supertype: Option<Form>) -> Form {
    let mut args = vec![name];
    args.extend(supertype);
    Form::Expr { head, args }
}

#[test]
fn test_while_lowers_to_labels_and_jumps() {
    let s = TestSession::new();
    let cond = Form::Literal(Literal::Bool(true));
    let form = s.while_loop(cond.clone(), vec![Form::int(1)]);
    let expanded = expand::expand(&s.rt, form).unwrap();
    assert_eq!(
        expanded,
        Form::Body(vec![
            Stmt::Label(0),
            Stmt::GotoIfNot { cond, target: 1 },
            Stmt::Expr(Form::int(1)),
            Stmt::Goto(0),
            Stmt::Label(1),
        ])
    );
}

#[test]
fn test_single_expression_stays_plain() {
    let s = TestSession::new();
    let form = s.call("f", [Form::int(1)]);
    assert_eq!(expand::expand(&s.rt, form.clone()).unwrap(), form);
    assert_eq!(
        expand::expand(&s.rt, Form::block(vec![form.clone()])).unwrap(),
        form
    );
    assert_eq!(expand::expand(&s.rt, Form::block(Vec::new())).unwrap(), Form::Null);
}

#[test]
fn test_method_body_becomes_thunk_with_locals() {
    let s = TestSession::new();
    let body = Form::block(vec![
        s.assign("acc", Form::int(0)),
        s.assign("acc", s.sym("x")),
        s.sym("acc"),
    ]);
    let form = method(&s, "f", vec![s.sym("x")], Vec::new(), body);
    let Form::Expr { args, .. } = expand::expand(&s.rt, form).unwrap() else {
        panic!("method stays an expression");
    };
    let Some(Form::Thunk(thunk)) = args.last() else {
        panic!("body lowered to a thunk");
    };
    assert_eq!(thunk.locals, vec![s.name("acc")]);
    assert_eq!(thunk.body.len(), 3);
}

#[test]
fn test_interpreter_refuses_intrinsics() {
    let mut rt = runtime();
    let root = rt.root();
    let call = Form::call(Form::Symbol(rt.intern("add_int")), [Form::int(1), Form::int(2)]);
    let mut machine = Machine::new();

    let err = machine.interpret(&mut rt, root, &call).unwrap_err();
    assert_eq!(err.message, "intrinsic add_int cannot be interpreted");

    let closure = machine.compile(&mut rt, root, Arc::new(Thunk::wrap(call))).unwrap();
    assert_eq!(machine.apply(&mut rt, &closure, &[]).unwrap(), Value::Int(3));
    assert_eq!(machine.routes(), vec![Route::Interpret, Route::Compile, Route::Apply]);
}

#[test]
fn test_dispatch_prefers_typed_methods() {
    let mut s = TestSession::new();
    s.run(|s| method(s, "f", vec![s.sym("x")], Vec::new(), Form::int(2)))
        .unwrap();
    s.run(|s| method(s, "f", vec![typed(s, "x", s.sym("Int"))], Vec::new(), Form::int(1)))
        .unwrap();

    assert_eq!(s.run(|s| s.call("f", [Form::int(5)])).unwrap(), Value::Int(1));
    assert_eq!(
        s.run(|s| s.call("f", [TestSession::text("five")])).unwrap(),
        Value::Int(2)
    );
    let err = s
        .run(|s| s.call("f", [Form::int(1), Form::int(2)]))
        .unwrap_err();
    assert_eq!(err.message, "no method matching f(Int, Int)");
}

#[test]
fn test_methods_run_with_intrinsics_and_locals() {
    let mut s = TestSession::new();
    s.run(|s| {
        let body = Form::block(vec![
            s.assign("acc", s.call("mul_int", [s.sym("x"), Form::int(2)])),
            s.call("add_int", [s.sym("acc"), Form::int(1)]),
        ]);
        method(s, "twice_plus_one", vec![s.sym("x")], Vec::new(), body)
    })
    .unwrap();

    let value = s.run(|s| s.call("twice_plus_one", [Form::int(20)])).unwrap();
    assert_eq!(value, Value::Int(41));
    // `acc` stayed local to the method.
    assert!(s.run(|s| s.sym("acc")).is_err());
}

#[test]
fn test_static_parameters_bind_in_signature() {
    let mut s = TestSession::new();
    s.run(|s| {
        method(
            s,
            "ident",
            vec![typed(s, "x", s.sym("T"))],
            vec![s.sym("T")],
            s.sym("x"),
        )
    })
    .unwrap();
    assert!(s.warnings.warnings().is_empty());
    assert_eq!(s.run(|s| s.call("ident", [Form::int(3)])).unwrap(), Value::Int(3));
}

#[test]
fn test_type_declarations_check_supertypes() {
    let mut s = TestSession::new();
    s.run(|s| declare(Head::Abstract, s.sym("Shape"), None)).unwrap();
    s.run(|s| declare(Head::Struct, s.sym("Circle"), Some(s.sym("Shape"))))
        .unwrap();

    let err = s
        .run(|s| declare(Head::Struct, s.sym("Square"), Some(s.sym("Circle"))))
        .unwrap_err();
    assert_eq!(err.message, "invalid subtyping in definition of Square");

    let err = s
        .run(|s| declare(Head::Abstract, s.sym("Loop"), Some(s.sym("Loop"))))
        .unwrap_err();
    assert_eq!(err.message, "invalid subtyping in definition of Loop");
}

#[test]
fn test_parametric_declaration_and_instantiation() {
    let mut s = TestSession::new();
    s.run(|s| declare(Head::Abstract, s.sym("Shape"), None)).unwrap();
    s.run(|s| {
        let name = s.custom("curly", vec![s.sym("Boxed"), s.sym("T")]);
        declare(Head::Abstract, name, Some(s.sym("Shape")))
    })
    .unwrap();

    let value = s
        .run(|s| s.custom("curly", vec![s.sym("Boxed"), s.sym("Int")]))
        .unwrap();
    let Some(Ty::Data { family, params }) = value.as_type() else {
        panic!("expected a data type, got {value:?}");
    };
    assert_eq!(params, &vec![Value::data_type(s.rt.types.builtins().int)]);
    assert_eq!(s.rt.types.get(*family).instances().len(), 1);
}

#[test]
fn test_static_typeof_is_compiled() {
    let mut s = TestSession::new();
    let value = s
        .run(|_| Form::Expr {
            head: Head::StaticTypeof,
            args: vec![Form::int(1)],
        })
        .unwrap();
    assert_eq!(value, Value::data_type(s.rt.types.builtins().int));
    assert_eq!(s.routes(), vec![Route::Expand, Route::Compile, Route::Apply]);
}

#[test]
fn test_println_writes_to_print_handler() {
    let mut s = TestSession::new();
    s.run(|s| s.call("println", [TestSession::text("n = "), Form::int(3)]))
        .unwrap();
    assert_eq!(s.printed(), vec!["n = 3"]);
    s.machine.print_handler().clear();
    assert!(s.printed().is_empty());
}

#[test]
fn test_intrinsics_reject_bad_arguments() {
    let mut s = TestSession::new();
    let err = s
        .run(|s| s.call("add_int", [Form::int(1), TestSession::text("x")]))
        .unwrap_err();
    assert_eq!(err.message, "intrinsic add_int: invalid arguments (Int, String)");
}

#[test]
fn test_conditions_must_be_booleans() {
    let mut s = TestSession::new();
    let err = s
        .run(|s| s.while_loop(Form::int(1), vec![s.sym("x")]))
        .unwrap_err();
    assert_eq!(err.message, "type error: if: expected Bool, got Int");
}
