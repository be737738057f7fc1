//! Runtime values.
//!
//! Values are cheap to clone: everything larger than a word sits behind an
//! `Arc` or is a handle into one of the runtime's arenas.

use std::fmt;
use std::sync::Arc;

use weft_ir::{Name, Thunk};

use crate::functions::FunctionId;
use crate::store::ModuleId;
use crate::types::TypeId;

/// Handle to a native function registered with the evaluator.
///
/// The function itself lives in the evaluator's native table because it needs
/// access to the whole evaluation session, not only the runtime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NativeId(pub u32);

/// A type variable, as used for static parameters and type parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeVar {
    pub name: Name,
    /// Upper bound; `None` means `Any`.
    pub upper: Option<Value>,
}

impl TypeVar {
    pub fn new(name: Name) -> Arc<Self> {
        Arc::new(TypeVar { name, upper: None })
    }
}

/// A type value.
#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    /// A data type family applied to parameters (empty for plain types).
    Data { family: TypeId, params: Vec<Value> },
    Union(Vec<Value>),
    Tuple(Vec<Value>),
}

/// Callable produced by the compiler for a deferred unit.
#[derive(Debug)]
pub struct Closure {
    /// The unit the closure was compiled from.
    pub thunk: Arc<Thunk>,
    /// Module the unit was compiled in.
    pub module: ModuleId,
    /// Whether type inference ran on the unit.
    pub inferred: bool,
}

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Tuple(Arc<[Value]>),
    Module(ModuleId),
    Type(Arc<Ty>),
    TypeVar(Arc<TypeVar>),
    Function(FunctionId),
    /// Primitive operation the interpreter cannot execute.
    Intrinsic(Name),
    Native(NativeId),
    Closure(Arc<Closure>),
}

impl Value {
    /// A string value.
    pub fn string(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// A plain (unparameterized) data type value.
    pub fn data_type(family: TypeId) -> Self {
        Value::Type(Arc::new(Ty::Data {
            family,
            params: Vec::new(),
        }))
    }

    #[inline]
    pub fn as_module(&self) -> Option<ModuleId> {
        match self {
            Value::Module(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub fn as_type(&self) -> Option<&Ty> {
        match self {
            Value::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Family of a data type value.
    #[inline]
    pub fn as_data_family(&self) -> Option<TypeId> {
        match self.as_type() {
            Some(Ty::Data { family, .. }) => Some(*family),
            _ => None,
        }
    }

    #[inline]
    pub fn is_module(&self) -> bool {
        matches!(self, Value::Module(_))
    }

    #[inline]
    pub fn is_type(&self) -> bool {
        matches!(self, Value::Type(_))
    }

    #[inline]
    pub fn is_typevar(&self) -> bool {
        matches!(self, Value::TypeVar(_))
    }

    /// Whether the value may appear in an argument-type tuple.
    #[inline]
    pub fn is_type_or_var(&self) -> bool {
        self.is_type() || self.is_typevar()
    }

    /// Short kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nothing => "Nothing",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Tuple(_) => "Tuple",
            Value::Module(_) => "Module",
            Value::Type(_) => "Type",
            Value::TypeVar(_) => "TypeVar",
            Value::Function(_) => "Function",
            Value::Intrinsic(_) => "IntrinsicFunction",
            Value::Native(_) => "NativeFunction",
            Value::Closure(_) => "Closure",
        }
    }

    /// Whether `self` is `target` or contains it inside a tuple, union, or
    /// data type parameter list.
    pub fn contains(&self, target: &Value) -> bool {
        if self == target {
            return true;
        }
        match self {
            Value::Tuple(items) => items.iter().any(|item| item.contains(target)),
            Value::Type(ty) => match &**ty {
                Ty::Data { params, .. } => params.iter().any(|p| p.contains(target)),
                Ty::Union(members) | Ty::Tuple(members) => {
                    members.iter().any(|m| m.contains(target))
                }
            },
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::TypeVar(a), Value::TypeVar(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Intrinsic(a), Value::Intrinsic(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "nothing"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            other => write!(f, "<{}>", other.kind_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_looks_through_parameters() {
        let t = Value::TypeVar(TypeVar::new(Name::from_raw(9)));
        let inner = Value::Type(Arc::new(Ty::Data {
            family: TypeId(3),
            params: vec![t.clone()],
        }));
        let sig = Value::Tuple(Arc::from(vec![Value::Int(1), inner]));
        assert!(sig.contains(&t));

        let other = Value::TypeVar(TypeVar::new(Name::from_raw(10)));
        assert!(!sig.contains(&other));
    }

    #[test]
    fn test_contains_union_members() {
        let t = Value::TypeVar(TypeVar::new(Name::from_raw(2)));
        let union = Value::Type(Arc::new(Ty::Union(vec![Value::Nothing, t.clone()])));
        assert!(union.contains(&t));
    }

    #[test]
    fn test_type_or_var() {
        assert!(Value::data_type(TypeId(0)).is_type_or_var());
        assert!(Value::TypeVar(TypeVar::new(Name::EMPTY)).is_type_or_var());
        assert!(!Value::Int(1).is_type_or_var());
    }
}
