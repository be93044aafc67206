use super::*;
use crate::value::symbol::SymbolTable;

fn setup() -> (Vec<u8>, SymbolTable) {
    (vec![0u8; 4096], SymbolTable::new())
}

#[test]
fn push_and_pop_round_trip() {
    let (mut buf, _symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    push(&mut heap, vm, arr, Value::fixnum(10)).unwrap();
    push(&mut heap, vm, arr, Value::fixnum(20)).unwrap();
    push(&mut heap, vm, arr, Value::fixnum(30)).unwrap();

    assert_eq!(len(&heap, arr), 3);
    let popped = pop(&mut heap, arr).unwrap();
    assert!(matches!(popped, Value::Fixnum(30)));
    assert_eq!(len(&heap, arr), 2);
}

#[test]
fn negative_index_counts_from_end() {
    let (mut buf, _symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    for i in 0..5 {
        push(&mut heap, vm, arr, Value::fixnum(i)).unwrap();
    }

    assert!(matches!(get(&heap, arr, -1), Value::Fixnum(4)));
    assert!(matches!(get(&heap, arr, -(5 + 1)), Value::Nil));
}

#[test]
fn set_beyond_length_fills_nil_gaps() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    set(&mut heap, &symbols, vm, arr, 3, Value::fixnum(99)).unwrap();

    assert_eq!(len(&heap, arr), 4);
    assert!(matches!(get(&heap, arr, 0), Value::Nil));
    assert!(matches!(get(&heap, arr, 3), Value::Fixnum(99)));
}

#[test]
fn min_and_max_of_an_empty_array_are_nil() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    assert!(matches!(min(&heap, &symbols, arr), Value::Nil));
    assert!(matches!(max(&heap, &symbols, arr), Value::Nil));
}

#[test]
fn min_and_max_ignore_insertion_order() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    for i in [5, 1, 9, 3] {
        push(&mut heap, vm, arr, Value::fixnum(i)).unwrap();
    }
    assert!(matches!(min(&heap, &symbols, arr), Value::Fixnum(1)));
    assert!(matches!(max(&heap, &symbols, arr), Value::Fixnum(9)));
}

#[test]
fn insert_and_remove_memmove_the_tail() {
    let (mut buf, _symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    for i in [10, 30] {
        push(&mut heap, vm, arr, Value::fixnum(i)).unwrap();
    }
    insert(&mut heap, vm, arr, 1, Value::fixnum(20)).unwrap();
    assert_eq!(len(&heap, arr), 3);
    assert!(matches!(get(&heap, arr, 1), Value::Fixnum(20)));
    assert!(matches!(get(&heap, arr, 2), Value::Fixnum(30)));

    let removed = remove(&mut heap, arr, 0).unwrap();
    assert!(matches!(removed, Value::Fixnum(10)));
    assert_eq!(len(&heap, arr), 2);
    assert!(matches!(get(&heap, arr, 0), Value::Fixnum(20)));
}

#[test]
fn unshift_and_shift_round_trip_at_the_front() {
    let (mut buf, _symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    push(&mut heap, vm, arr, Value::fixnum(2)).unwrap();
    unshift(&mut heap, vm, arr, Value::fixnum(1)).unwrap();
    assert!(matches!(get(&heap, arr, 0), Value::Fixnum(1)));

    let shifted = shift(&mut heap, arr).unwrap();
    assert!(matches!(shifted, Value::Fixnum(1)));
    assert!(matches!(get(&heap, arr, 0), Value::Fixnum(2)));
}

#[test]
fn release_contents_frees_data_buffer() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let arr = new(&mut heap, vm).unwrap();
    for i in 0..20 {
        push(&mut heap, vm, arr, Value::fixnum(i)).unwrap();
    }
    let used_before = heap.stats(None).used;
    release_contents(&mut heap, &symbols, arr);
    heap.free(arr);
    let used_after = heap.stats(None).used;
    assert_eq!(used_after, 0);
    assert!(used_before > 0);
}
