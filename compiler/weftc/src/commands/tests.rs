#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use weft_runtime::Value;

use super::{check_source, parse_run_args, run_file, session, RunOptions, SyntaxProblem};
use crate::loader::LoadPath;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_parse_run_args() {
    let (file, options) =
        parse_run_args(&args(&["main.wf", "--no-compile-loops", "--path", "lib"])).unwrap();
    assert_eq!(file, PathBuf::from("main.wf"));
    assert!(!options.compile_loops);
    assert_eq!(options.load_path, vec![PathBuf::from("lib")]);

    let (_, options) = parse_run_args(&args(&["-L", "a", "main.wf", "-L", "b"])).unwrap();
    assert!(options.compile_loops);
    assert_eq!(options.load_path, vec![PathBuf::from("a"), PathBuf::from("b")]);
}

#[test]
fn test_parse_run_args_errors() {
    assert_eq!(parse_run_args(&args(&[])).unwrap_err(), "missing file path");
    assert_eq!(
        parse_run_args(&args(&["main.wf", "--path"])).unwrap_err(),
        "missing directory after --path"
    );
    assert_eq!(
        parse_run_args(&args(&["--fast", "main.wf"])).unwrap_err(),
        "unknown option '--fast'"
    );
    assert_eq!(
        parse_run_args(&args(&["a.wf", "b.wf"])).unwrap_err(),
        "unexpected argument 'b.wf'"
    );
}

#[test]
fn test_check_source() {
    assert_eq!(check_source("1 (f 2) ; done"), Ok(2));
    assert_eq!(
        check_source("(module A\n  (= x 1)\n"),
        Err(SyntaxProblem {
            line: 1,
            message: "incomplete: premature end of input".to_string(),
        })
    );
}

#[test]
fn test_prelude_operators_are_visible_everywhere() {
    let mut toplevel = session(true, LoadPath::default()).unwrap();
    assert_eq!(toplevel.eval_source("main", "(* (+ 1 2) 4)").unwrap(), Value::Int(12));
    let value = toplevel
        .eval_source(
            "main",
            "(module M (= y (- 10 version)))\n(import M.y)\ny",
        )
        .unwrap();
    assert_eq!(value, Value::Int(9));
}

#[test]
fn test_loops_run_with_and_without_loop_compilation() {
    let program = "(= i 0)\n(= total 0)\n(while (< i 5) (= total (+ total i)) (= i (+ i 1)))\ntotal";
    for compile_loops in [true, false] {
        let mut toplevel = session(compile_loops, LoadPath::default()).unwrap();
        assert_eq!(toplevel.eval_source("main", program).unwrap(), Value::Int(10));
    }
}

#[test]
fn test_run_file_searches_the_script_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Shapes.wf"),
        "(module Shapes\n  (abstract Shape)\n  (struct Square Shape)\n  (method area (s) () 4)\n  (export Shape Square area))\n",
    )
    .unwrap();
    let main = dir.path().join("main.wf");
    fs::write(&main, "(using Shapes)\n(area 1)\n").unwrap();

    assert_eq!(run_file(&main, &RunOptions::default()).unwrap(), Value::Int(4));
}

#[test]
fn test_run_file_names_the_failure_type() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.wf");
    fs::write(&main, "(= x 1)\n(undefined_thing x)\n").unwrap();

    let message = run_file(&main, &RunOptions::default()).unwrap_err();
    assert!(message.starts_with("LoadError: error loading "), "{message}");
    assert!(message.ends_with("undefined_thing not defined"), "{message}");
}
