//! Import path resolution and the import statements.
//!
//! # Paths
//!
//! A path is a list of segments, the last of which names the thing being
//! imported. Leading `.` segments make the path relative:
//!
//! - the first `.` starts the search at the current module;
//! - each further `.` moves one parent up;
//! - if exactly one real segment follows, the module reached is the result.
//!
//! Without a leading `.` the search starts at the root. The first real
//! segment must then name a module binding owned by, or explicitly imported
//! into, the module searched. Names seen only through `using` do not count.
//!
//! # Autoload
//!
//! When the first segment of an absolute path is unknown in the root, the
//! loader hook (a global of the standard library, looked up once and then
//! cached) is called with the segment's name and resolution is retried
//! exactly once. If the retry still fails, a warning is emitted and the
//! statement does nothing.
//!
//! The segments between the first and the last are read as globals and
//! must all be modules. The last segment is returned to the statement
//! unresolved.

use smallvec::SmallVec;
use weft_ir::{Form, Name};
use weft_runtime::{EvalResult, ModuleId, Value, WarningKind};

use crate::errors::{
    invalid_import_path, malformed, not_a_module, not_a_module_binding, undefined_in_path,
    EvalError,
};
use super::Toplevel;

type Path = SmallVec<[Name; 4]>;

/// Segments of an import path, validated as symbols ending in a real name.
fn path_segments(args: &[Form], statement: &'static str) -> Result<Path, EvalError> {
    let path = args
        .iter()
        .map(Form::as_symbol)
        .collect::<Option<Path>>()
        .ok_or_else(|| malformed(statement))?;
    match path.last() {
        Some(&last) if last != Name::DOT => Ok(path),
        _ => Err(malformed(statement)),
    }
}

impl Toplevel {
    /// Resolve all but the last segment of `path` to a module.
    ///
    /// `Ok(None)` means the loader ran but did not define the module.
    #[tracing::instrument(level = "debug", skip_all, fields(segments = path.len()))]
    pub fn resolve_import_path(&mut self, path: &[Name]) -> Result<Option<ModuleId>, EvalError> {
        self.resolve_path(path, false)
    }

    fn resolve_path(&mut self, path: &[Name], retrying: bool) -> Result<Option<ModuleId>, EvalError> {
        let Some(&first) = path.first() else {
            return Err(invalid_import_path());
        };

        let mut next = 1;
        let mut var = first;
        let mut m = if first == Name::DOT {
            let mut m = self.ctx.module;
            loop {
                let Some(&segment) = path.get(next) else {
                    return Err(invalid_import_path());
                };
                var = segment;
                next += 1;
                if var != Name::DOT {
                    if next == path.len() {
                        return Ok(Some(m));
                    }
                    break m;
                }
                m = self.rt.modules.parent(m);
            }
        } else {
            self.rt.root()
        };

        match self.path_root(m, var)? {
            Some(found) => m = found,
            None => {
                let name = self.rt.name_str(var);
                if m == self.rt.root() && !retrying && next == 1 {
                    if let Some(loader) = self.loader_hook() {
                        tracing::debug!(module = name, "autoloading");
                        self.call_value(&loader, &[Value::string(name)])?;
                        return self.resolve_path(path, true);
                    }
                }
                if retrying && self.loader.is_some() {
                    self.rt.warn(
                        WarningKind::LoaderDidNotDefine,
                        format!("requiring \"{name}\" did not define a corresponding module."),
                    );
                    return Ok(None);
                }
                return Err(undefined_in_path(name));
            }
        }

        for &segment in path.iter().take(path.len() - 1).skip(next) {
            m = self
                .rt
                .eval_global(m, segment)?
                .as_module()
                .ok_or_else(invalid_import_path)?;
        }
        Ok(Some(m))
    }

    /// Module bound to `var` in `m`, if `m` owns or explicitly imports it.
    ///
    /// An owned binding without a value counts as unresolved, so it can
    /// still be autoloaded.
    fn path_root(&mut self, m: ModuleId, var: Name) -> Result<Option<ModuleId>, EvalError> {
        let Some((owner, imported)) = self
            .rt
            .modules
            .get(m)
            .entry(var)
            .and_then(|b| b.owner.map(|owner| (owner, b.is_imported())))
        else {
            return Ok(None);
        };
        let owned = owner == m;
        if !owned && !imported {
            return Ok(None);
        }
        match self.rt.global(m, var) {
            Some(Value::Module(found)) => Ok(Some(found)),
            None if !imported => Ok(None),
            _ => Err(not_a_module(self.rt.name_str(var))),
        }
    }

    /// The loader hook from the standard library, cached once found.
    fn loader_hook(&mut self) -> Option<Value> {
        if self.loader.is_none() {
            let stdlib = self.rt.stdlib()?;
            self.loader = self.rt.global(stdlib, self.names.loader);
        }
        self.loader.clone()
    }

    /// `import a.b.c`: bind `c` of module `a.b` in the current module.
    pub(crate) fn eval_import(&mut self, args: &[Form]) -> EvalResult {
        let path = path_segments(args, "import")?;
        let Some(from) = self.resolve_import_path(&path)? else {
            return Ok(Value::Nothing);
        };
        let name = path[path.len() - 1];
        self.rt.import(self.ctx.module, from, name);
        Ok(Value::Nothing)
    }

    /// `using a.b`: use module `a.b` whole, or just the name `b` when `b` is
    /// not a module.
    pub(crate) fn eval_using(&mut self, args: &[Form]) -> EvalResult {
        let path = path_segments(args, "using")?;
        let Some(from) = self.resolve_import_path(&path)? else {
            return Ok(Value::Nothing);
        };
        let name = path[path.len() - 1];
        let target = self.rt.eval_global(from, name)?;
        match target.as_module() {
            Some(used) => self.rt.using(self.ctx.module, used),
            None => self.rt.use_name(self.ctx.module, from, name),
        }
        Ok(Value::Nothing)
    }

    /// `importall a.b`: import every name exported by module `a.b`.
    pub(crate) fn eval_import_all(&mut self, args: &[Form]) -> EvalResult {
        let path = path_segments(args, "importall")?;
        let Some(from) = self.resolve_import_path(&path)? else {
            return Ok(Value::Nothing);
        };
        let name = path[path.len() - 1];
        let target = self
            .rt
            .eval_global(from, name)?
            .as_module()
            .ok_or_else(|| not_a_module_binding("importall"))?;
        self.rt.import_all(self.ctx.module, target);
        Ok(Value::Nothing)
    }

    /// `export a b c` from the current module.
    pub(crate) fn eval_export(&mut self, args: &[Form]) -> EvalResult {
        let names = args
            .iter()
            .map(Form::as_symbol)
            .collect::<Option<SmallVec<[Name; 8]>>>()
            .ok_or_else(|| malformed("export"))?;
        for name in names {
            self.rt.export(self.ctx.module, name);
        }
        Ok(Value::Nothing)
    }
}
