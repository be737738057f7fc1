//! Behavioral guarantees of the top-level driver.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use weft_eval::reference::Route;
use weft_eval::test_helpers::TestSession;
use weft_ir::{Form, Literal, Stmt, Thunk};
use weft_runtime::{ErrorCategory, Value, WarningKind};

use crate::common::{declare, define_base, method, method_count, typed};

fn straight_line(s: &TestSession) -> Vec<Stmt> {
    vec![
        Stmt::Expr(s.assign("a", Form::int(1))),
        Stmt::Expr(s.sym("a")),
    ]
}

fn counting_loop(s: &TestSession) -> Form {
    // i = 0; while i < 3: i = i + 1
    Form::block(vec![
        s.assign("i", Form::int(0)),
        s.while_loop(
            s.call("slt_int", [s.sym("i"), Form::int(3)]),
            vec![s.assign("i", s.call("add_int", [s.sym("i"), Form::int(1)]))],
        ),
    ])
}

#[test]
fn straight_line_bodies_are_never_compiled() {
    for compile_loops in [true, false] {
        let mut s = TestSession::with(|b| b.compile_loops(compile_loops));
        for fast in [true, false] {
            let body = straight_line(&s);
            assert_eq!(s.eval_form(Form::Body(body), fast).unwrap(), Value::Int(1));
        }
        assert_eq!(s.routes(), vec![Route::InterpretBody, Route::InterpretBody]);
    }
}

#[test]
fn backward_branches_compile_only_with_loop_compilation() {
    let loop_body = vec![
        Stmt::Label(0),
        Stmt::GotoIfNot {
            cond: Form::Literal(Literal::Bool(false)),
            target: 1,
        },
        Stmt::Goto(0),
        Stmt::Label(1),
    ];

    let mut on = TestSession::new();
    on.eval(Form::Body(loop_body.clone())).unwrap();
    assert_eq!(on.routes(), vec![Route::Compile, Route::Apply]);

    let mut off = TestSession::with(|b| b.compile_loops(false));
    off.eval(Form::Body(loop_body)).unwrap();
    assert_eq!(off.routes(), vec![Route::InterpretBody]);
}

#[test]
fn loops_calling_intrinsics_compile_either_way() {
    for compile_loops in [true, false] {
        let mut s = TestSession::with(|b| b.compile_loops(compile_loops));
        s.run(counting_loop).unwrap();
        assert_eq!(s.run(|s| s.sym("i")).unwrap(), Value::Int(3));
        assert!(s.routes().contains(&Route::Compile));
    }
}

#[test]
fn captures_always_force_compilation() {
    for compile_loops in [true, false] {
        let mut s = TestSession::with(|b| b.compile_loops(compile_loops));
        let mut thunk = Thunk::new(vec![Stmt::Expr(Form::int(1))]);
        thunk.captures.push(s.name("outer"));
        s.eval_form(Form::Thunk(Arc::new(thunk)), false).unwrap();
        assert_eq!(s.routes(), vec![Route::Compile, Route::Apply]);
    }
}

#[test]
fn nested_initializers_run_innermost_first_across_redeclarations() {
    let mut s = TestSession::new();
    let nested = |s: &TestSession| {
        s.module(
            "A",
            vec![
                s.initializer("A"),
                s.module(
                    "B",
                    vec![s.module("C", vec![s.initializer("C")]), s.initializer("B")],
                ),
            ],
        )
    };
    s.run(nested).unwrap();
    assert_eq!(s.printed(), vec!["C", "B", "A"]);

    s.run(nested).unwrap();
    s.run(nested).unwrap();
    assert_eq!(
        s.printed(),
        vec!["C", "B", "A", "C", "B", "A", "C", "B", "A"]
    );
    assert_eq!(s.warnings_of(WarningKind::ModuleReplaced).len(), 2);
}

#[test]
fn bare_modules_never_receive_standard_imports() {
    let mut s = TestSession::new();
    define_base(&mut s);
    s.run(|s| s.bare_module("Bare", vec![])).unwrap();
    s.run(|s| s.module("Full", vec![])).unwrap();

    assert_eq!(s.global_in(&["Bare"], "version"), None);
    assert_eq!(s.global_in(&["Bare"], "plus"), None);
    assert_eq!(s.global_in(&["Full"], "version"), Some(Value::Int(7)));
    assert_eq!(s.global_in(&["Full"], "plus"), Some(Value::Int(1)));
}

#[test]
fn parent_hops_resolve_relative_to_the_enclosing_module() {
    let mut s = TestSession::new();
    s.run(|s| s.module("Foo", vec![s.assign("x", Form::int(100))])).unwrap();
    s.run(|s| {
        s.module(
            "Outer",
            vec![
                s.module("Foo", vec![s.assign("x", Form::int(1))]),
                s.module(
                    "Mid",
                    vec![s.module(
                        "Inner",
                        vec![
                            // From Outer.Mid.Inner, `..` is Outer.Mid and `...` is Outer.
                            s.import(&[".", ".", ".", "Foo"]),
                            s.import(&[".", ".", ".", "Foo", "x"]),
                        ],
                    )],
                ),
            ],
        )
    })
    .unwrap();

    let outer_foo = s.module_id(&["Outer", "Foo"]).unwrap();
    let root_foo = s.module_id(&["Foo"]).unwrap();
    assert_ne!(outer_foo, root_foo);
    assert_eq!(
        s.global_in(&["Outer", "Mid", "Inner"], "Foo"),
        Some(Value::Module(outer_foo))
    );
    assert_eq!(s.global_in(&["Outer", "Mid", "Inner"], "x"), Some(Value::Int(1)));

    // One hop short lands in Outer2, which has no Foo.
    s.run(|s| {
        s.module(
            "Outer2",
            vec![s.module("Mid", vec![s.import(&[".", ".", "Foo"])])],
        )
    })
    .unwrap();
    assert_eq!(s.global_in(&["Outer2", "Mid"], "Foo"), None);
    assert_eq!(
        s.warnings_of(WarningKind::ImportMissing),
        vec!["could not import Outer2.Foo into Mid"]
    );
}

#[test]
fn non_type_argument_entries_fail_and_leave_methods_alone() {
    let mut s = TestSession::new();
    s.run(|s| method(s, "f", vec![s.sym("x")], Vec::new(), s.sym("x")))
        .unwrap();
    assert_eq!(method_count(&mut s, "f"), 1);

    let err = s
        .run(|s| {
            method(
                s,
                "f",
                vec![s.sym("a"), typed(s, "b", Form::int(1))],
                Vec::new(),
                s.sym("b"),
            )
        })
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Type);
    assert_eq!(
        err.message,
        "invalid type for argument b (position 2) in method definition for f at none:0"
    );
    assert_eq!(method_count(&mut s, "f"), 1);
}

#[test]
fn unused_static_parameters_warn_unless_hidden() {
    let mut s = TestSession::new();
    s.run(|s| method(s, "visible", vec![s.sym("x")], vec![s.sym("T")], s.sym("x")))
        .unwrap();
    s.run(|s| method(s, "#hidden#1", vec![s.sym("x")], vec![s.sym("T")], s.sym("x")))
        .unwrap();

    let warnings = s.warnings_of(WarningKind::UnusedStaticParameter);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("static parameter T does not occur in signature for visible"));
    assert!(warnings[0].ends_with("The method will not be callable."));
}

#[test]
fn supertypes_must_be_other_abstract_types() {
    let mut s = TestSession::new();
    s.run(|s| declare(true, s.sym("Animal"), None)).unwrap();
    s.run(|s| declare(false, s.sym("Dog"), Some(s.sym("Animal"))))
        .unwrap();

    let concrete = s
        .run(|s| declare(false, s.sym("Puppy"), Some(s.sym("Dog"))))
        .unwrap_err();
    assert_eq!(concrete.message, "invalid subtyping in definition of Puppy");

    let own = s
        .run(|s| declare(true, s.sym("Ouroboros"), Some(s.sym("Ouroboros"))))
        .unwrap_err();
    assert_eq!(own.message, "invalid subtyping in definition of Ouroboros");

    let vararg = s
        .run(|s| declare(true, s.sym("Many"), Some(s.sym("Vararg"))))
        .unwrap_err();
    assert_eq!(vararg.category(), ErrorCategory::Type);
}

#[test]
fn failures_in_nested_bodies_restore_the_enclosing_module() {
    let mut s = TestSession::new();
    let root = s.rt.root();
    let err = s
        .run(|s| {
            s.module(
                "Outer",
                vec![s.module("Inner", vec![s.call("no_such_function", [])])],
            )
        })
        .unwrap_err();
    assert_eq!(err.message, "no_such_function not defined");
    assert_eq!(s.current_module(), root);
    assert_eq!(s.context().task_module, root);

    // Evaluation continues in the root.
    s.run(|s| s.assign("after", Form::int(1))).unwrap();
    assert_eq!(s.global_in(&[], "after"), Some(Value::Int(1)));
}
