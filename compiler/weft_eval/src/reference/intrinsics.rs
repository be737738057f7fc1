//! Primitive operations of the reference machine.
//!
//! Intrinsics are bound in `Core` and exported, so every module sees them.
//! The execution selector sends any unit that calls one to the compiler;
//! the interpreter refuses to run them.

use weft_runtime::{EvalError, EvalResult, Runtime, Value};

use super::print::PrintHandler;

/// Every intrinsic the machine implements.
pub const INTRINSICS: [&str; 6] = ["add_int", "sub_int", "mul_int", "slt_int", "eq", "println"];

/// Bind every intrinsic in `Core`.
pub fn install(rt: &mut Runtime) -> Result<(), EvalError> {
    let core = rt.core();
    for name in INTRINSICS {
        rt.define_intrinsic(core, name)?;
    }
    Ok(())
}

pub(super) fn call(name: &str, args: &[Value], print: &PrintHandler) -> EvalResult {
    let int = |f: fn(i64, i64) -> Value| match args {
        [Value::Int(a), Value::Int(b)] => Ok(f(*a, *b)),
        _ => Err(bad_arguments(name, args)),
    };
    match name {
        "add_int" => int(|a, b| Value::Int(a.wrapping_add(b))),
        "sub_int" => int(|a, b| Value::Int(a.wrapping_sub(b))),
        "mul_int" => int(|a, b| Value::Int(a.wrapping_mul(b))),
        "slt_int" => int(|a, b| Value::Bool(a < b)),
        "eq" => match args {
            [a, b] => Ok(Value::Bool(a == b)),
            _ => Err(bad_arguments(name, args)),
        },
        "println" => {
            print.println(&render(args));
            Ok(Value::Nothing)
        }
        _ => Err(EvalError::new(format!("unknown intrinsic {name}"))),
    }
}

/// Strings print without quotes; everything else as displayed.
fn render(args: &[Value]) -> String {
    args.iter()
        .map(|v| match v {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[cold]
fn bad_arguments(name: &str, args: &[Value]) -> EvalError {
    let kinds: Vec<&str> = args.iter().map(Value::kind_name).collect();
    EvalError::new(format!(
        "intrinsic {name}: invalid arguments ({})",
        kinds.join(", ")
    ))
}
