//! The `require` loader hook.
//!
//! When an absolute import names a module the root does not have, the core
//! calls the standard library's loader with the module name. This loader
//! looks for `<Name>.wf` in each directory of a [`LoadPath`] and evaluates
//! the first match in the root module. Finding nothing is not an error: the
//! core reports the module as still undefined.

use std::path::{Path, PathBuf};

use weft_eval::Toplevel;
use weft_ir::Name;
use weft_runtime::{EvalError, ModuleId, Value};

/// Source file extension searched for.
pub const SOURCE_EXTENSION: &str = "wf";

/// Directories searched for modules, in order.
#[derive(Clone, Debug, Default)]
pub struct LoadPath {
    dirs: Vec<PathBuf>,
}

impl LoadPath {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        LoadPath {
            dirs: dirs.into_iter().collect(),
        }
    }

    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// First `<name>.wf` that exists as a regular file.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(name).with_extension(SOURCE_EXTENSION))
            .find(|candidate| candidate.is_file())
    }
}

/// Bind the loader under the session's configured loader name in `stdlib`.
pub fn install_loader(
    toplevel: &mut Toplevel,
    stdlib: ModuleId,
    path: LoadPath,
) -> Result<Name, EvalError> {
    let name = toplevel.config().loader.clone();
    toplevel.define_native(stdlib, &name, move |tl: &mut Toplevel, args: &[Value]| {
        let [Value::Str(module)] = args else {
            return Err(EvalError::new("require: expected a module name"));
        };
        let Some(file) = path.find(module) else {
            tracing::debug!(module = %module, "not found on the load path");
            return Ok(Value::Nothing);
        };
        load_in_root(tl, &file)
    })
}

fn load_in_root(toplevel: &mut Toplevel, file: &Path) -> Result<Value, EvalError> {
    let root = toplevel.rt.root();
    let mut scope = toplevel.enter_module(root);
    scope.load_file(file)?;
    scope.complete();
    Ok(Value::Nothing)
}
