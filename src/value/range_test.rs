use super::*;

fn setup() -> Vec<u8> {
    vec![0u8; 4096]
}

#[test]
fn accessors_round_trip() {
    let mut buf = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let r = new(&mut heap, vm, Value::fixnum(1), Value::fixnum(5), false).unwrap();
    assert!(matches!(first(&heap, r), Value::Fixnum(1)));
    assert!(matches!(last(&heap, r), Value::Fixnum(5)));
    assert!(!excludes_end(&heap, r));
}

#[test]
fn contains_respects_exclusive_end() {
    let mut buf = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let inclusive = new(&mut heap, vm, Value::fixnum(1), Value::fixnum(5), false).unwrap();
    assert!(contains_fixnum(&heap, inclusive, 5));

    let exclusive = new(&mut heap, vm, Value::fixnum(1), Value::fixnum(5), true).unwrap();
    assert!(!contains_fixnum(&heap, exclusive, 5));
    assert!(contains_fixnum(&heap, exclusive, 4));
}

#[test]
fn compare_orders_by_endpoints_then_exclusivity() {
    let mut buf = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let symbols = crate::value::symbol::SymbolTable::new();
    let vm = VmId::new(1);

    let a = new(&mut heap, vm, Value::fixnum(1), Value::fixnum(5), false).unwrap();
    let b = new(&mut heap, vm, Value::fixnum(1), Value::fixnum(5), true).unwrap();
    assert_eq!(compare(&heap, &symbols, a, a), core::cmp::Ordering::Equal);
    assert_ne!(compare(&heap, &symbols, a, b), core::cmp::Ordering::Equal);
}
