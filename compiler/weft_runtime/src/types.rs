//! Data type families and their parametric instantiation caches.
//!
//! A [`DataType`] is a family: `Point` or `Vector{T}`. Applying a family to
//! parameter values yields an instance whose derived properties (its
//! supertype with parameters substituted) are cached per parameter list. When
//! a family's supertype changes, its cache is cleared and every instance that
//! had been materialized is derived again.

use std::sync::Arc;

use weft_ir::{Name, StringInterner};

use crate::functions::FunctionId;
use crate::store::ModuleId;
use crate::value::{Ty, TypeVar, Value};

/// Handle to a data type family.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// One materialized parametric instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub params: Vec<Value>,
    /// The family's supertype with this instance's parameters substituted.
    pub supertype: Option<Value>,
}

/// A data type family.
#[derive(Clone, Debug)]
pub struct DataType {
    pub name: Name,
    pub module: ModuleId,
    /// `None` only for `Any` and for families whose supertype is not set yet.
    pub supertype: Option<Value>,
    pub parameters: Vec<Arc<TypeVar>>,
    pub is_abstract: bool,
    /// Constructor generic function, materialized on demand.
    pub constructor: Option<FunctionId>,
    cache: Vec<Instance>,
}

impl DataType {
    /// Materialized instances, in creation order.
    pub fn instances(&self) -> &[Instance] {
        &self.cache
    }

    #[inline]
    pub fn is_parametric(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// Families every runtime starts with.
#[derive(Copy, Clone, Debug)]
pub struct Builtins {
    pub any: TypeId,
    /// The universal meta-type `Type{T}`.
    pub type_type: TypeId,
    /// The variadic-argument marker `Vararg{T}`.
    pub vararg: TypeId,
    pub number: TypeId,
    pub nothing: TypeId,
    pub bool_: TypeId,
    pub int: TypeId,
    pub float: TypeId,
    pub string: TypeId,
}

/// Arena of data type families.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<DataType>,
    builtins: Builtins,
}

impl TypeTable {
    /// Create the table with the builtin families, owned by `core`.
    pub fn new(interner: &StringInterner, core: ModuleId) -> Self {
        let mut table = TypeTable {
            types: Vec::new(),
            builtins: Builtins {
                any: TypeId(0),
                type_type: TypeId(0),
                vararg: TypeId(0),
                number: TypeId(0),
                nothing: TypeId(0),
                bool_: TypeId(0),
                int: TypeId(0),
                float: TypeId(0),
                string: TypeId(0),
            },
        };
        let t = interner.intern("T");

        let any = table.define(interner.intern("Any"), core, Vec::new(), true);
        let any_value = Value::data_type(any);
        let abstract_family = |table: &mut TypeTable, name: &str, params: Vec<Arc<TypeVar>>| {
            let id = table.define(interner.intern(name), core, params, true);
            table.get_mut(id).supertype = Some(any_value.clone());
            id
        };
        let type_type = abstract_family(&mut table, "Type", vec![TypeVar::new(t)]);
        let vararg = abstract_family(&mut table, "Vararg", vec![TypeVar::new(t)]);
        let number = abstract_family(&mut table, "Number", Vec::new());

        let concrete = |table: &mut TypeTable, name: &str, supertype: TypeId| {
            let id = table.define(interner.intern(name), core, Vec::new(), false);
            table.get_mut(id).supertype = Some(Value::data_type(supertype));
            id
        };
        let nothing = concrete(&mut table, "Nothing", any);
        let bool_ = concrete(&mut table, "Bool", any);
        let int = concrete(&mut table, "Int", number);
        let float = concrete(&mut table, "Float", number);
        let string = concrete(&mut table, "String", any);

        table.builtins = Builtins {
            any,
            type_type,
            vararg,
            number,
            nothing,
            bool_,
            int,
            float,
            string,
        };
        table
    }

    #[inline]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Every family, for registering names.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &DataType)> {
        self.types.iter().enumerate().map(|(i, t)| {
            let raw = u32::try_from(i).unwrap_or(u32::MAX);
            (TypeId(raw), t)
        })
    }

    /// Declare a new family with no supertype yet.
    pub fn define(
        &mut self,
        name: Name,
        module: ModuleId,
        parameters: Vec<Arc<TypeVar>>,
        is_abstract: bool,
    ) -> TypeId {
        let raw = u32::try_from(self.types.len()).unwrap_or(u32::MAX);
        self.types.push(DataType {
            name,
            module,
            supertype: None,
            parameters,
            is_abstract,
            constructor: None,
            cache: Vec::new(),
        });
        TypeId(raw)
    }

    /// # Panics
    /// Panics on a handle from another table.
    #[inline]
    pub fn get(&self, id: TypeId) -> &DataType {
        &self.types[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TypeId) -> &mut DataType {
        &mut self.types[id.0 as usize]
    }

    /// Apply a family to parameter values, materializing the instance.
    pub fn instantiate(&mut self, id: TypeId, params: Vec<Value>) -> Value {
        let family = self.get(id);
        if family.is_parametric() && !family.cache.iter().any(|i| i.params == params) {
            let instance = Self::derive(family, params.clone());
            self.get_mut(id).cache.push(instance);
        }
        Value::Type(Arc::new(Ty::Data { family: id, params }))
    }

    /// Clear a family's cache and derive every instance it held again.
    ///
    /// Returns the number of instances rebuilt.
    pub fn reinstantiate(&mut self, id: TypeId) -> usize {
        let stale = std::mem::take(&mut self.get_mut(id).cache);
        let family = self.get(id);
        let rebuilt: Vec<Instance> = stale
            .into_iter()
            .map(|old| Self::derive(family, old.params))
            .collect();
        let count = rebuilt.len();
        self.get_mut(id).cache = rebuilt;
        count
    }

    fn derive(family: &DataType, params: Vec<Value>) -> Instance {
        let supertype = family
            .supertype
            .as_ref()
            .map(|s| substitute(s, &family.parameters, &params));
        Instance { params, supertype }
    }

    /// Whether `id` is `ancestor` or has it on its supertype chain.
    pub fn is_subtype_family(&self, id: TypeId, ancestor: TypeId) -> bool {
        let mut current = id;
        for _ in 0..=self.types.len() {
            if current == ancestor {
                return true;
            }
            match self.get(current).supertype.as_ref().and_then(Value::as_data_family) {
                Some(next) if next != current => current = next,
                _ => return false,
            }
        }
        false
    }
}

/// Replace type variables by the matching parameter values.
pub fn substitute(value: &Value, vars: &[Arc<TypeVar>], params: &[Value]) -> Value {
    match value {
        Value::TypeVar(tv) => vars
            .iter()
            .position(|v| v == tv)
            .and_then(|i| params.get(i).cloned())
            .unwrap_or_else(|| value.clone()),
        Value::Type(ty) => {
            let map = |items: &[Value]| -> Vec<Value> {
                items.iter().map(|v| substitute(v, vars, params)).collect()
            };
            let ty = match &**ty {
                Ty::Data { family, params: p } => Ty::Data {
                    family: *family,
                    params: map(p),
                },
                Ty::Union(members) => Ty::Union(map(members)),
                Ty::Tuple(members) => Ty::Tuple(map(members)),
            };
            Value::Type(Arc::new(ty))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests;
