//! A standard library, a loader, and user modules built on both.

use pretty_assertions::assert_eq;
use weft_eval::test_helpers::TestSession;
use weft_ir::{Form, Name, VecSource};
use weft_runtime::{ErrorCategory, EvalErrorKind, Value, WarningKind};

use crate::common::{define_base, install_loader, LoadLog};

/// `Lib` exports `helper(x) = add_int(x, 1)` and announces its
/// initialization.
fn lib(s: &TestSession) -> Form {
    s.module(
        "Lib",
        vec![
            s.method(
                "helper",
                &["x"],
                s.call("add_int", [s.sym("x"), Form::int(1)]),
            ),
            s.initializer("Lib"),
            s.export(&["helper"]),
        ],
    )
}

fn session() -> (TestSession, LoadLog) {
    let mut s = TestSession::new();
    define_base(&mut s);
    let library = vec![("Lib", lib(&s))];
    let log = install_loader(&mut s, library);
    (s, log)
}

fn app(s: &TestSession) -> Form {
    s.module(
        "App",
        vec![
            s.import(&["Lib", "helper"]),
            s.assign("result", s.call("helper", [Form::int(20)])),
            s.initializer("App"),
        ],
    )
}

#[test]
fn importing_an_unknown_module_loads_it_first() {
    let (mut s, log) = session();
    s.run(app).unwrap();

    assert_eq!(*log.borrow(), vec!["Lib"]);
    assert_eq!(s.global_in(&["App"], "result"), Some(Value::Int(21)));
    // Lib was initialized by the load, before App's body finished.
    assert_eq!(s.printed(), vec!["Lib", "App"]);
    assert!(s.pending_initializers().is_empty());
}

#[test]
fn loaded_modules_are_not_loaded_again() {
    let (mut s, log) = session();
    s.run(app).unwrap();
    s.run(|s| s.module("Second", vec![s.import(&["Lib", "helper"])]))
        .unwrap();
    assert_eq!(*log.borrow(), vec!["Lib"]);
    assert_eq!(s.printed(), vec!["Lib", "App"]);
}

#[test]
fn user_modules_see_the_standard_library() {
    let (mut s, _log) = session();
    s.run(app).unwrap();
    assert_eq!(s.global_in(&["App"], "version"), Some(Value::Int(7)));
    assert_eq!(s.global_in(&["App"], "plus"), Some(Value::Int(1)));
    assert_eq!(s.global_in(&["Lib"], "version"), Some(Value::Int(7)));
}

#[test]
fn the_loader_stays_cached_across_a_library_swap() {
    let (mut s, log) = session();
    s.run(app).unwrap();

    // A new Base without a loader replaces the old one.
    s.run(|s| s.bare_module("Base", vec![])).unwrap();
    assert_eq!(s.warnings_of(WarningKind::ModuleReplaced), vec!["replacing module Base"]);
    let base = s.module_id(&["Base"]);
    assert_eq!(s.rt.stdlib(), base);

    s.run(|s| s.import(&["Missing", "thing"])).unwrap();
    assert_eq!(*log.borrow(), vec!["Lib", "Missing"]);
    assert_eq!(
        s.warnings_of(WarningKind::LoaderDidNotDefine),
        vec!["requiring \"Missing\" did not define a corresponding module."]
    );
}

#[test]
fn a_failing_program_reports_the_line_it_stopped_at() {
    let (mut s, _log) = session();
    let program = {
        let s = &s;
        vec![
            (1, app(s)),
            (4, s.assign("total", s.call("helper", [Form::int(1)]))),
            (6, s.import(&["App", "result"])),
            (12, s.assign("unreached", Form::int(0))),
        ]
    };
    // Line 4 fails: `helper` is not visible in the root until it is imported.
    let mut source = VecSource::with_lines(program);
    let err = s.eval_all("main.wf", &mut source).unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Load);
    assert_eq!(
        err.kind,
        EvalErrorKind::Load {
            path: "main.wf".to_string(),
            line: 4
        }
    );
    assert_eq!(err.root_cause().message, "helper not defined");
    assert_eq!(s.global_in(&[], "unreached"), None);
}

#[test]
fn a_complete_program_returns_its_last_value() {
    let (mut s, _log) = session();
    let program = {
        let s = &s;
        vec![
            app(s),
            s.import(&["Lib", "helper"]),
            s.call("helper", [s.call("helper", [Form::int(1)])]),
        ]
    };
    let mut source = VecSource::new(program);
    assert_eq!(s.eval_all("main.wf", &mut source).unwrap(), Value::Int(3));
    assert_eq!(s.rt.location(), (Name::EMPTY, 0));
}
