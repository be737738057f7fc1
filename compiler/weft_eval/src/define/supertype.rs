//! Supertype installation.

use weft_runtime::{Runtime, Ty, TypeId, Value};

use crate::errors::{invalid_subtyping, EvalError};

/// Link `candidate` as the supertype of `t`.
///
/// The candidate must be an abstract data type that is neither `t` itself
/// nor the variadic marker or the meta-type (or below either). Parametric
/// types get their instantiation cache cleared and every cached instance
/// derived again against the new supertype.
pub fn set_supertype(rt: &mut Runtime, t: TypeId, candidate: &Value) -> Result<(), EvalError> {
    if !is_valid_supertype(rt, t, candidate) {
        return Err(invalid_subtyping(rt.name_str(rt.types.get(t).name)));
    }

    rt.types.get_mut(t).supertype = Some(candidate.clone());
    if rt.types.get(t).is_parametric() {
        let rebuilt = rt.types.reinstantiate(t);
        tracing::debug!(
            name = rt.name_str(rt.types.get(t).name),
            rebuilt,
            "reinstantiated after supertype change"
        );
    }
    Ok(())
}

fn is_valid_supertype(rt: &Runtime, t: TypeId, candidate: &Value) -> bool {
    let Some(Ty::Data { family, .. }) = candidate.as_type() else {
        return false;
    };
    let family = *family;
    let builtins = rt.types.builtins();
    rt.types.get(family).is_abstract
        && family != t
        && !rt.types.is_subtype_family(family, builtins.vararg)
        && !rt.types.is_subtype_family(family, builtins.type_type)
}
