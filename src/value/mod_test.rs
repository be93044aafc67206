use super::*;
use crate::value::symbol::SymbolTable;

fn setup() -> (Vec<u8>, SymbolTable) {
    (vec![0u8; 4096], SymbolTable::new())
}

#[test]
fn truthiness_excludes_only_nil_and_false() {
    assert!(Value::True.is_truthy());
    assert!(Value::fixnum(0).is_truthy());
    assert!(!Value::Nil.is_truthy());
    assert!(!Value::False.is_truthy());
}

#[test]
fn heap_addr_is_some_only_for_refcounted_variants() {
    assert!(Value::Nil.heap_addr().is_none());
    assert!(Value::Class(ClassId::new(0)).heap_addr().is_none());
    assert!(Value::Handle(Addr::new(3)).heap_addr().is_none());
    assert!(Value::Array(Addr::new(3)).heap_addr().is_some());
}

#[test]
fn dup_then_release_is_a_no_op_on_the_pool() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = array::new(&mut heap, vm).unwrap();
    let value = Value::Array(arr);
    let used_after_alloc = heap.stats(None).used;

    let duped = value.dup(&mut heap);
    duped.release(&mut heap, &symbols);
    assert_eq!(heap.stats(None).used, used_after_alloc);

    value.release(&mut heap, &symbols);
    assert_eq!(heap.stats(None).used, 0);
}

#[test]
fn release_at_zero_refcount_frees_and_recurses_into_contents() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let inner = array::new(&mut heap, vm).unwrap();
    let outer = array::new(&mut heap, vm).unwrap();
    array::push(&mut heap, vm, outer, Value::Array(inner)).unwrap();

    Value::Array(outer).release(&mut heap, &symbols);
    assert_eq!(heap.stats(None).used, 0);
}

#[test]
fn compare_cross_type_is_deterministic_but_unspecified() {
    let (buf, symbols) = setup();
    let mut backing = buf;
    let heap = Tlsf::new(&mut backing).unwrap();

    let a = Value::Nil.compare(Value::True, &heap, &symbols);
    let b = Value::Nil.compare(Value::True, &heap, &symbols);
    assert_eq!(a, b);
    assert_ne!(a, core::cmp::Ordering::Equal);
}

#[test]
fn empty_and_nil_compare_equal() {
    let (buf, symbols) = setup();
    let mut backing = buf;
    let heap = Tlsf::new(&mut backing).unwrap();
    assert!(Value::Empty.equals(Value::Nil, &heap, &symbols));
}
