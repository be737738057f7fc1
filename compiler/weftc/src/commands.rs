//! The `run` and `check` subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use weft_eval::reference::{self, Machine};
use weft_eval::{Toplevel, ToplevelBuilder};
use weft_ir::{Form, FormSource, StringInterner};
use weft_runtime::{EvalError, Value};

use crate::loader::{install_loader, LoadPath};
use crate::reader::{Reader, SexprParser};

/// Source of the standard library every session starts with.
pub const PRELUDE: &str = include_str!("prelude.wf");

/// Options for `weft run`.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Compile bodies that loop instead of interpreting them.
    pub compile_loops: bool,
    /// Extra directories searched by `require`, after the script's own.
    pub load_path: Vec<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            compile_loops: true,
            load_path: Vec::new(),
        }
    }
}

/// Parse `run` options from the arguments after the subcommand.
///
/// Returns the script path and the options, or a message for the user.
pub fn parse_run_args(args: &[String]) -> Result<(PathBuf, RunOptions), String> {
    let mut options = RunOptions::default();
    let mut file = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-compile-loops" => options.compile_loops = false,
            "--path" | "-L" => {
                let dir = iter
                    .next()
                    .ok_or_else(|| format!("missing directory after {arg}"))?;
                options.load_path.push(PathBuf::from(dir));
            }
            other if other.starts_with('-') => return Err(format!("unknown option '{other}'")),
            other if file.is_none() => file = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }
    let file = file.ok_or_else(|| "missing file path".to_string())?;
    Ok((file, options))
}

/// A session on the reference backend with the prelude loaded and the
/// loader searching `load_path`.
pub fn session(compile_loops: bool, load_path: LoadPath) -> Result<Toplevel, EvalError> {
    let mut toplevel = ToplevelBuilder::with_backend(Machine::new())
        .parser(SexprParser)
        .compile_loops(compile_loops)
        .build();
    reference::install(&mut toplevel.rt)?;
    toplevel.eval_source("prelude", PRELUDE)?;
    let stdlib = toplevel
        .rt
        .stdlib()
        .ok_or_else(|| EvalError::new("the prelude did not define a standard library"))?;
    install_loader(&mut toplevel, stdlib, load_path)?;
    Ok(toplevel)
}

/// Evaluate a script. Modules it imports are searched for next to it first.
///
/// A failure is described with the standard library type that names it,
/// such as `LoadError: error loading main.wf, ...`.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn run_file(path: &Path, options: &RunOptions) -> Result<Value, String> {
    let mut load_path = LoadPath::default();
    if let Some(dir) = path.parent() {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        load_path.push(dir);
    }
    for dir in &options.load_path {
        load_path.push(dir.clone());
    }
    let mut toplevel = session(options.compile_loops, load_path).map_err(|err| err.to_string())?;
    toplevel
        .load_file(path)
        .map_err(|err| describe_failure(&mut toplevel, &err))
}

fn describe_failure(toplevel: &mut Toplevel, err: &EvalError) -> String {
    match toplevel.rt.exception_type(err) {
        Some(t) => {
            let name = toplevel.rt.types.get(t).name;
            format!("{}: {err}", toplevel.rt.name_str(name))
        }
        None => err.to_string(),
    }
}

/// A syntax problem found by `weft check`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxProblem {
    pub line: u32,
    pub message: String,
}

/// Read every form of `text` without evaluating anything.
pub fn check_source(text: &str) -> Result<usize, SyntaxProblem> {
    let mut reader = Reader::new(Arc::new(StringInterner::new()), text);
    let mut count = 0;
    while let Some(form) = reader.next_form() {
        match form {
            Form::SyntaxError(message) | Form::Incomplete(message) => {
                return Err(SyntaxProblem {
                    line: reader.line(),
                    message,
                })
            }
            _ => count += 1,
        }
    }
    Ok(count)
}

/// `weft check`: report the first syntax problem, or the number of forms.
pub fn check_file(path: &Path) -> Result<usize, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("could not open file {}: {err}", path.display()))?;
    check_source(&text).map_err(|problem| {
        format!(
            "{}:{}: syntax: {}",
            path.display(),
            problem.line,
            problem.message
        )
    })
}

#[cfg(test)]
mod tests;
