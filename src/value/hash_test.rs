use super::*;
use crate::value::symbol::SymbolTable;

fn setup() -> (Vec<u8>, SymbolTable) {
    (vec![0u8; 4096], SymbolTable::new())
}

#[test]
fn insert_then_get_round_trips() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let h = new(&mut heap, vm).unwrap();
    insert(&mut heap, &symbols, vm, h, Value::fixnum(1), Value::fixnum(100)).unwrap();
    insert(&mut heap, &symbols, vm, h, Value::fixnum(2), Value::fixnum(200)).unwrap();

    assert_eq!(len(&heap, h), 2);
    assert!(matches!(get(&heap, &symbols, h, Value::fixnum(1)), Some(Value::Fixnum(100))));
    assert!(matches!(get(&heap, &symbols, h, Value::fixnum(2)), Some(Value::Fixnum(200))));
    assert!(get(&heap, &symbols, h, Value::fixnum(3)).is_none());
}

#[test]
fn insert_existing_key_overwrites_value() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let h = new(&mut heap, vm).unwrap();
    insert(&mut heap, &symbols, vm, h, Value::fixnum(1), Value::fixnum(100)).unwrap();
    insert(&mut heap, &symbols, vm, h, Value::fixnum(1), Value::fixnum(999)).unwrap();

    assert_eq!(len(&heap, h), 1);
    assert!(matches!(get(&heap, &symbols, h, Value::fixnum(1)), Some(Value::Fixnum(999))));
}

#[test]
fn remove_preserves_order_of_remaining_entries() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let h = new(&mut heap, vm).unwrap();
    for i in 0..4 {
        insert(&mut heap, &symbols, vm, h, Value::fixnum(i), Value::fixnum(i * 10)).unwrap();
    }
    let removed = remove(&mut heap, &symbols, h, Value::fixnum(1));
    assert!(matches!(removed, Some(Value::Fixnum(10))));
    assert_eq!(len(&heap, h), 3);

    let k = keys(&mut heap, vm, h).unwrap();
    let collected: Vec<i32> = (0..super::array::len(&heap, k))
        .map(|i| match super::array::get(&heap, k, i32::from(i)) {
            Value::Fixnum(n) => n,
            _ => panic!("expected fixnum key"),
        })
        .collect();
    assert_eq!(collected, vec![0, 2, 3]);
}

#[test]
fn release_contents_frees_data_buffer() {
    let (mut buf, symbols) = setup();
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let vm = VmId::new(1);

    let h = new(&mut heap, vm).unwrap();
    for i in 0..10 {
        insert(&mut heap, &symbols, vm, h, Value::fixnum(i), Value::fixnum(i)).unwrap();
    }
    release_contents(&mut heap, &symbols, h);
    heap.free(h);
    assert_eq!(heap.stats(None).used, 0);
}
