use super::*;
use pretty_assertions::assert_eq;

fn table() -> (StringInterner, TypeTable) {
    let interner = StringInterner::new();
    let table = TypeTable::new(&interner, ModuleId(1));
    (interner, table)
}

#[test]
fn test_builtin_hierarchy() {
    let (_, table) = table();
    let b = *table.builtins();
    assert!(table.is_subtype_family(b.int, b.number));
    assert!(table.is_subtype_family(b.int, b.any));
    assert!(!table.is_subtype_family(b.string, b.number));
    assert!(table.get(b.vararg).is_abstract);
    assert!(!table.get(b.int).is_abstract);
    assert_eq!(table.get(b.any).supertype, None);
}

#[test]
fn test_instantiate_caches_parametric_instances() {
    let (interner, mut table) = table();
    let t = TypeVar::new(interner.intern("T"));
    let family = table.define(interner.intern("Box"), ModuleId(0), vec![t], false);
    let any = Value::data_type(table.builtins().any);
    table.get_mut(family).supertype = Some(any.clone());

    let int = Value::data_type(table.builtins().int);
    let first = table.instantiate(family, vec![int.clone()]);
    let second = table.instantiate(family, vec![int.clone()]);
    assert_eq!(first, second);
    assert_eq!(table.get(family).instances().len(), 1);
    assert_eq!(table.get(family).instances()[0].supertype, Some(any));
}

#[test]
fn test_plain_family_has_no_cache() {
    let (interner, mut table) = table();
    let family = table.define(interner.intern("Point"), ModuleId(0), Vec::new(), false);
    table.instantiate(family, Vec::new());
    assert!(table.get(family).instances().is_empty());
}

#[test]
fn test_reinstantiate_substitutes_new_supertype() {
    let (interner, mut table) = table();
    let t = TypeVar::new(interner.intern("T"));
    let abstract_vec = table.define(
        interner.intern("AbstractVec"),
        ModuleId(0),
        vec![Arc::clone(&t)],
        true,
    );
    let vec_family = table.define(interner.intern("Vec"), ModuleId(0), vec![Arc::clone(&t)], false);
    table.get_mut(vec_family).supertype = Some(Value::data_type(table.builtins().any));

    let int = Value::data_type(table.builtins().int);
    table.instantiate(vec_family, vec![int.clone()]);

    let parent = Value::Type(Arc::new(Ty::Data {
        family: abstract_vec,
        params: vec![Value::TypeVar(t)],
    }));
    table.get_mut(vec_family).supertype = Some(parent);
    assert_eq!(table.reinstantiate(vec_family), 1);

    let expected = Value::Type(Arc::new(Ty::Data {
        family: abstract_vec,
        params: vec![int],
    }));
    assert_eq!(
        table.get(vec_family).instances()[0].supertype,
        Some(expected)
    );
}

#[test]
fn test_substitute_leaves_unknown_vars() {
    let (interner, _) = table();
    let t = TypeVar::new(interner.intern("T"));
    let s = TypeVar::new(interner.intern("S"));
    let value = Value::TypeVar(Arc::clone(&s));
    assert_eq!(substitute(&value, &[t], &[Value::Int(1)]), value);
}
