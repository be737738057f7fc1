//! Method installation on generic functions.

use std::sync::Arc;

use weft_ir::Name;
use weft_runtime::{
    Binding, FunctionId, Lambda, Method, ModuleId, Runtime, Ty, TypeId, TypeVar, Value,
    WarningKind,
};

use crate::errors::{
    extend_without_import, function_shadows_value, imported_assignment, invalid_argument_type,
    not_generic_function, type_mismatch, EvalError,
};

/// Where the generic function being extended lives.
pub enum MethodSlot<'a> {
    /// The global of the method's name in `module`.
    Global { module: ModuleId },
    /// A local variable cell of an enclosing scope.
    Local(&'a mut Option<Value>),
}

/// A method about to be installed.
#[derive(Clone, Debug)]
pub struct MethodDef {
    /// Argument-type tuple.
    pub signature: Vec<Value>,
    /// Static parameters; each must be a type variable.
    pub static_params: Vec<Value>,
    pub lambda: Arc<Lambda>,
}

/// Validate `def` and add it to the generic function in `slot`, creating the
/// function when the slot is empty.
///
/// Returns the generic function the method was added to.
#[tracing::instrument(level = "debug", skip_all, fields(name = rt.name_str(name)))]
pub fn define_method(
    rt: &mut Runtime,
    name: Name,
    slot: MethodSlot<'_>,
    def: MethodDef,
) -> Result<FunctionId, EvalError> {
    let fname = rt.name_str(name);

    let (current, owner) = match &slot {
        MethodSlot::Global { module } => {
            let owner = method_binding_owner(rt, *module, name)?;
            let binding = rt.modules.get(owner).entry(name);
            let value = binding.and_then(|b| b.value.clone());
            if value.is_some() && !binding.is_some_and(Binding::is_const) {
                return Err(function_shadows_value(fname));
            }
            (value, Some(owner))
        }
        MethodSlot::Local(cell) => ((**cell).clone(), None),
    };

    let existing = match current {
        None => None,
        Some(Value::Function(id)) => Some(id),
        Some(value) => match constructor_family(&value) {
            Some(family) => Some(rt.materialize_constructors(family)),
            None => return Err(not_generic_function(fname)),
        },
    };

    let location = rt.describe_location(def.lambda.file, def.lambda.line);
    for (i, entry) in def.signature.iter().enumerate() {
        if !entry.is_type_or_var() {
            let argument = def.lambda.arg_name(i).map_or("?", |n| rt.name_str(n));
            return Err(invalid_argument_type(fname, argument, i + 1, location));
        }
    }

    let static_params = static_type_vars(fname, &def.static_params)?;
    if !is_hidden(fname) {
        for tv in &static_params {
            let var = Value::TypeVar(Arc::clone(tv));
            if !def.signature.iter().any(|entry| entry.contains(&var)) {
                rt.warn(
                    WarningKind::UnusedStaticParameter,
                    format!(
                        "static parameter {} does not occur in signature for {fname} at {location}.\nThe method will not be callable.",
                        rt.name_str(tv.name)
                    ),
                );
            }
        }
    }

    let id = existing.unwrap_or_else(|| rt.functions.create(name));
    match slot {
        MethodSlot::Global { .. } => {
            let owner = owner.unwrap_or_else(|| rt.root());
            if existing.is_none() {
                rt.replace_const(owner, name, Value::Function(id))?;
            } else {
                rt.mark_constant(owner, name)?;
            }
        }
        MethodSlot::Local(cell) => {
            if cell.is_none() {
                *cell = Some(Value::Function(id));
            }
        }
    }

    let replaced = rt.functions.add_method(
        id,
        Method {
            signature: def.signature,
            static_params: static_params.clone(),
            lambda: Arc::clone(&def.lambda),
        },
    );
    tracing::debug!(replaced, "method added");

    check_static_parameter_conflicts(rt, &def.lambda, &static_params, name);
    Ok(id)
}

/// Warn for every local variable of `lambda` named like one of its static
/// parameters.
pub fn check_static_parameter_conflicts(
    rt: &Runtime,
    lambda: &Lambda,
    static_params: &[Arc<TypeVar>],
    fname: Name,
) {
    let locals = lambda.arg_names.iter().chain(&lambda.body.locals);
    for local in locals {
        if static_params.iter().any(|tv| tv.name == *local) {
            rt.warn(
                WarningKind::StaticParameterShadowed,
                format!(
                    "local variable {} conflicts with a static parameter in {} at {}.",
                    rt.name_str(*local),
                    rt.name_str(fname),
                    rt.describe_location(lambda.file, lambda.line)
                ),
            );
        }
    }
}

/// Module owning the binding a method definition of `name` in `module`
/// writes to.
///
/// An import only counts when it was explicit; a function seen through
/// `using` has to be imported before it can be extended.
fn method_binding_owner(
    rt: &mut Runtime,
    module: ModuleId,
    name: Name,
) -> Result<ModuleId, EvalError> {
    let local = rt
        .modules
        .get(module)
        .entry(name)
        .and_then(|b| b.owner.map(|owner| (owner, b.is_imported())));

    match local {
        Some((owner, imported)) if owner != module => {
            let owner = rt.modules.resolve(module, name).unwrap_or(owner);
            if !imported {
                let value = rt.modules.get(owner).entry(name).and_then(|b| b.value.as_ref());
                if matches!(value, None | Some(Value::Function(_))) {
                    return Err(extend_without_import(rt.module_name(owner), rt.name_str(name)));
                }
            }
            Ok(owner)
        }
        _ => match rt.modules.binding_for_write(module, name) {
            Ok(_) => Ok(module),
            Err(_) => Err(imported_assignment(
                rt.name_str(name),
                rt.module_name(module),
                rt.module_name(module),
            )),
        },
    }
}

/// Family of a plain data type value, whose constructor a method extends.
fn constructor_family(value: &Value) -> Option<TypeId> {
    match value.as_type()? {
        Ty::Data { family, params } if params.is_empty() => Some(*family),
        _ => None,
    }
}

fn static_type_vars(fname: &str, params: &[Value]) -> Result<Vec<Arc<TypeVar>>, EvalError> {
    params
        .iter()
        .map(|param| match param {
            Value::TypeVar(tv) => Ok(Arc::clone(tv)),
            other => Err(type_mismatch(
                format!("{fname}: in method definition"),
                "TypeVar",
                other.kind_name(),
            )),
        })
        .collect()
}

/// Compiler-generated names carry a `#` and are exempt from the unused
/// static parameter warning.
#[inline]
fn is_hidden(fname: &str) -> bool {
    fname.contains('#')
}
