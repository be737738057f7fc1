//! Weft command-line driver.
//!
//! Wires the top-level core to concrete collaborators:
//!
//! - [`reader`]: s-expression source parser
//! - [`loader`]: the standard library's `require` hook, backed by a search
//!   path of source directories
//! - [`commands`]: the `run` and `check` subcommands
//!
//! Evaluation itself uses the reference backend from `weft_eval`.

pub mod commands;
pub mod loader;
pub mod reader;
mod tracing_setup;

pub use commands::{check_file, check_source, parse_run_args, run_file, session, RunOptions};
pub use loader::{install_loader, LoadPath};
pub use reader::{Reader, SexprParser};
pub use tracing_setup::init_tracing;
