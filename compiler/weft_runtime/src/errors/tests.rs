use super::*;
use pretty_assertions::assert_eq;
use std::error::Error as _;

#[test]
fn test_messages_match_kinds() {
    assert_eq!(
        malformed("import").to_string(),
        "syntax: malformed \"import\" statement"
    );
    assert_eq!(
        undefined_in_path("Foo").message,
        "in module path: Foo not defined"
    );
    assert_eq!(
        not_a_module("x").message,
        "invalid module path (x does not name a module)"
    );
    assert_eq!(
        invalid_subtyping("Point").message,
        "invalid subtyping in definition of Point"
    );
}

#[test]
fn test_categories() {
    assert_eq!(malformed("module").category(), ErrorCategory::Syntax);
    assert_eq!(syntax_error("eof").category(), ErrorCategory::Syntax);
    assert_eq!(invalid_subtyping("T").category(), ErrorCategory::Type);
    assert_eq!(
        type_mismatch("module", "Symbol", "Int").category(),
        ErrorCategory::Type
    );
    assert_eq!(undefined_in_path("A").category(), ErrorCategory::Name);
    assert_eq!(
        function_shadows_value("f").category(),
        ErrorCategory::Definition
    );
    assert_eq!(EvalError::new("boom").category(), ErrorCategory::Runtime);
}

#[test]
fn test_in_file_wraps_cause() {
    let inner = undefined_variable("x");
    let wrapped = inner.in_file("lib/a.wf", 12);

    assert_eq!(wrapped.category(), ErrorCategory::Load);
    assert_eq!(
        wrapped.kind,
        EvalErrorKind::Load {
            path: "lib/a.wf".to_string(),
            line: 12,
        }
    );
    assert_eq!(wrapped.root_cause().message, "x not defined");
    assert!(wrapped.source().is_some());
    assert!(wrapped.to_string().contains("x not defined"));
}

#[test]
fn test_nested_load_errors_keep_innermost_cause() {
    let wrapped = EvalError::new("boom").in_file("b.wf", 3).in_file("a.wf", 7);
    assert_eq!(wrapped.root_cause().message, "boom");
}
