//! Shared fixtures for the top-level tests.

use std::cell::RefCell;
use std::rc::Rc;

use weft_eval::test_helpers::TestSession;
use weft_eval::Toplevel;
use weft_ir::{Form, Head};
use weft_runtime::Value;

/// Requests the loader has seen, in order.
pub type LoadLog = Rc<RefCell<Vec<String>>>;

/// A bare standard library `Base` with an `Operators` sub-module exporting
/// `plus`, and exporting `version` itself.
pub fn define_base(s: &mut TestSession) {
    s.run(|s| {
        s.bare_module(
            "Base",
            vec![
                s.bare_module(
                    "Operators",
                    vec![s.assign("plus", Form::int(1)), s.export(&["plus"])],
                ),
                s.assign("version", Form::int(7)),
                s.export(&["version"]),
            ],
        )
    })
    .unwrap();
}

/// Install a `require` loader in `Base` that declares modules from
/// `library` in the root module.
pub fn install_loader(s: &mut TestSession, library: Vec<(&'static str, Form)>) -> LoadLog {
    let base = s.module_id(&["Base"]).unwrap();
    let log: LoadLog = Rc::default();
    let seen = Rc::clone(&log);
    s.define_native(base, "require", move |tl: &mut Toplevel, args: &[Value]| {
        let [Value::Str(name)] = args else {
            return Ok(Value::Nothing);
        };
        seen.borrow_mut().push(name.to_string());
        let Some((_, module)) = library.iter().find(|(n, _)| **n == **name) else {
            return Ok(Value::Nothing);
        };
        let root = tl.rt.root();
        let mut scope = tl.enter_module(root);
        scope.eval(module.clone())?;
        scope.complete();
        Ok(Value::Nothing)
    })
    .unwrap();
    log
}

/// `(x :: ty)`
pub fn typed(s: &TestSession, name: &str, ty: Form) -> Form {
    s.custom("::", vec![s.sym(name), ty])
}

/// `(method f (params...) (sparams...) body)`
pub fn method(s: &TestSession, f: &str, params: Vec<Form>, sparams: Vec<Form>, body: Form) -> Form {
    Form::Expr {
        head: Head::Method,
        args: vec![s.sym(f), Form::block(params), Form::block(sparams), body],
    }
}

/// `(abstract name super)` or `(struct name super)`
pub fn declare(is_abstract: bool, name: Form, supertype: Option<Form>) -> Form {
    let mut args = vec![name];
    args.extend(supertype);
    Form::Expr {
        head: if is_abstract { Head::Abstract } else { Head::Struct },
        args,
    }
}

/// Number of methods of the generic function bound to `name` in the root.
pub fn method_count(s: &mut TestSession, name: &str) -> usize {
    match s.global_in(&[], name) {
        Some(Value::Function(id)) => s.rt.functions.get(id).methods.len(),
        _ => 0,
    }
}
