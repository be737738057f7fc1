//! Weft CLI
//!
//! Runs Weft scripts on the reference backend.

use std::path::Path;

use weftc::commands::{check_file, parse_run_args, run_file};
use weftc::init_tracing;

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "run" => {
            let (file, options) = match parse_run_args(&args[2..]) {
                Ok(parsed) => parsed,
                Err(message) => {
                    eprintln!("error: {message}");
                    eprintln!("Usage: weft run <file.wf> [--no-compile-loops] [--path <dir>]");
                    std::process::exit(1);
                }
            };
            if let Err(err) = run_file(&file, &options) {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: weft check <file.wf>");
                std::process::exit(1);
            }
            match check_file(Path::new(&args[2])) {
                Ok(count) => println!("{}: {count} forms, no syntax errors", args[2]),
                Err(message) => {
                    eprintln!("error: {message}");
                    std::process::exit(1);
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Weft {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // A bare script path runs it
            if Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wf"))
            {
                match parse_run_args(&args[1..]) {
                    Ok((file, options)) => {
                        if let Err(err) = run_file(&file, &options) {
                            eprintln!("error: {err}");
                            std::process::exit(1);
                        }
                    }
                    Err(message) => {
                        eprintln!("error: {message}");
                        std::process::exit(1);
                    }
                }
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("Weft");
    println!();
    println!("Usage: weft <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.wf>        Evaluate a Weft script");
    println!("  check <file.wf>      Read a script and report syntax errors (no evaluation)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Run options:");
    println!("  --no-compile-loops   Interpret loops instead of compiling them");
    println!("  --path <dir>, -L     Also search <dir> for imported modules");
    println!();
    println!("Environment:");
    println!("  WEFT_LOG=<filter>    Print evaluation traces, e.g. WEFT_LOG=weft_eval=debug");
    println!();
    println!("Examples:");
    println!("  weft run main.wf");
    println!("  weft run main.wf --path lib/");
    println!("  weft check main.wf");
}
