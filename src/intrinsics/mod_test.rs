use super::*;
use crate::addr::VmId;
use crate::loader::Irep;
use crate::platform::MockPlatform;
use crate::value::string as vstr;
use crate::value::{array, hash, range};

/// Drive a native method directly: set absolute registers
/// `base..base+values.len()` and run `func` as a call over that window,
/// returning `vm.reg_abs(base)` once it returns.
#[allow(clippy::too_many_arguments)]
fn call_native(
    vm: &mut Vm<'_>,
    heap: &mut Tlsf,
    symbols: &mut SymbolTable,
    classes: &mut ClassTable,
    bootstrap: &Bootstrap,
    platform: &mut MockPlatform,
    base: u16,
    values: &[Value],
    argc: u8,
    func: NativeFn,
) -> Value {
    for (i, v) in values.iter().enumerate() {
        vm.set_reg_abs(base + i as u16, *v, symbols, heap);
    }
    let mut globals = crate::vm::Globals::new();
    let mut consts = crate::vm::Consts::new();
    let mut call = NativeCall {
        vm,
        heap,
        symbols,
        classes,
        bootstrap,
        platform,
        natives: &[],
        globals: &mut globals,
        consts: &mut consts,
        window_base: base,
        argc,
        block: None,
    };
    func(&mut call);
    call.vm.reg_abs(base)
}

/// Fresh heap plus the installed bootstrap class hierarchy.
macro_rules! classes_harness {
    ($pool:ident, $heap:ident, $symbols:ident, $classes:ident, $bootstrap:ident) => {
        let mut $pool = [0u8; 4096];
        let mut $heap = Tlsf::new(&mut $pool).unwrap();
        let mut $symbols = SymbolTable::new();
        let mut $classes = ClassTable::new();
        let ($bootstrap, _natives) = install(&mut $heap, &mut $classes, &mut $symbols).unwrap();
    };
}

/// A [`classes_harness`] plus an empty-code `Vm` and a [`MockPlatform`],
/// ready to drive a native method through [`call_native`].
macro_rules! harness {
    ($pool:ident, $heap:ident, $symbols:ident, $classes:ident, $bootstrap:ident, $vm:ident, $platform:ident) => {
        classes_harness!($pool, $heap, $symbols, $classes, $bootstrap);
        let code: Vec<u8> = Vec::new();
        let root = Irep { nlocals: 0, nregs: 16, code: &code, pool: Vec::new(), symbols: Vec::new(), reps: Vec::new() };
        let mut $vm = Vm::new(&root, VmId::new(1));
        let mut $platform = MockPlatform::new();
    };
}

#[test]
fn install_wires_every_bootstrap_class_to_object() {
    classes_harness!(pool, _heap, _symbols, classes, bootstrap);

    for class in [bootstrap.nil_class, bootstrap.true_class, bootstrap.false_class, bootstrap.fixnum, bootstrap.array, bootstrap.string, bootstrap.hash, bootstrap.range] {
        assert_eq!(classes.super_class(class), Some(bootstrap.object));
    }
    assert_eq!(classes.super_class(bootstrap.object), None);
}

#[test]
fn class_of_resolves_scalars_to_their_bootstrap_class() {
    classes_harness!(pool, heap, _symbols, _classes, bootstrap);

    assert_eq!(class_of(&bootstrap, &heap, Value::Fixnum(1)), bootstrap.fixnum);
    assert_eq!(class_of(&bootstrap, &heap, Value::Nil), bootstrap.nil_class);
    assert_eq!(class_of(&bootstrap, &heap, Value::True), bootstrap.true_class);
}

#[test]
fn object_class_reports_the_receivers_bootstrap_class() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Fixnum(5)], 0, kernel::object_class);
    assert!(matches!(result, Value::Class(id) if id == bootstrap.fixnum));
}

#[test]
fn object_eq_compares_fixnums_by_value() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);

    let equal = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Fixnum(3), Value::Fixnum(3)], 1, kernel::object_eq);
    assert!(matches!(equal, Value::True));

    let unequal = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 2, &[Value::Fixnum(3), Value::Fixnum(4)], 1, kernel::object_eq);
    assert!(matches!(unequal, Value::False));
}

#[test]
fn object_to_s_renders_nil_as_text() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Nil], 0, kernel::object_to_s);
    let Value::String(addr) = result else { panic!("expected a String result") };
    assert_eq!(vstr::bytes(&heap, addr), b"nil");
}

#[test]
fn fixnum_mod_by_zero_yields_nil_rather_than_trapping() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Fixnum(7), Value::Fixnum(0)], 1, arithmetic::fixnum_mod);
    assert!(matches!(result, Value::Nil));
}

#[test]
fn fixnum_to_s_formats_negative_decimal() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Fixnum(-17)], 0, arithmetic::fixnum_to_s);
    let Value::String(addr) = result else { panic!("expected a String result") };
    assert_eq!(vstr::bytes(&heap, addr), b"-17");
}

#[test]
fn string_concat_allocates_a_new_joined_string() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let a = vstr::new(&mut heap, vm_id, b"foo").unwrap();
    let b = vstr::new(&mut heap, vm_id, b"bar").unwrap();

    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::String(a), Value::String(b)], 1, string::string_concat);
    let Value::String(addr) = result else { panic!("expected a String result") };
    assert_eq!(vstr::bytes(&heap, addr), b"foobar");
}

#[test]
fn string_chomp_drops_one_trailing_newline() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let addr = vstr::new(&mut heap, vm_id, b"hi\n").unwrap();

    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::String(addr)], 0, string::string_chomp);
    let Value::String(copy) = result else { panic!("expected a String result") };
    assert_eq!(vstr::bytes(&heap, copy), b"hi");
}

#[test]
fn array_set_replaces_an_element_and_returns_the_stored_value() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let addr = array::new(&mut heap, vm_id).unwrap();
    array::push(&mut heap, vm_id, addr, Value::Fixnum(1)).unwrap();
    array::push(&mut heap, vm_id, addr, Value::Fixnum(2)).unwrap();

    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Array(addr), Value::Fixnum(1), Value::Fixnum(99)], 2, collection::array_set);
    assert!(matches!(result, Value::Fixnum(99)));
    assert!(matches!(array::get(&heap, addr, 1), Value::Fixnum(99)));
}

#[test]
fn array_pop_removes_and_returns_the_last_element() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let addr = array::new(&mut heap, vm_id).unwrap();
    array::push(&mut heap, vm_id, addr, Value::Fixnum(10)).unwrap();
    array::push(&mut heap, vm_id, addr, Value::Fixnum(20)).unwrap();

    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Array(addr)], 0, collection::array_pop);
    assert!(matches!(result, Value::Fixnum(20)));
    assert_eq!(array::len(&heap, addr), 1);
}

#[test]
fn hash_delete_removes_the_key_and_returns_its_value() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let addr = hash::new(&mut heap, vm_id).unwrap();
    let key = Value::Symbol(symbols.intern("name"));
    hash::insert(&mut heap, &symbols, vm_id, addr, key, Value::Fixnum(42)).unwrap();

    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Hash(addr), key], 1, collection::hash_delete);
    assert!(matches!(result, Value::Fixnum(42)));
    assert!(hash::get(&heap, &symbols, addr, key).is_none());
}

#[test]
fn hash_keys_collects_every_inserted_key() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let addr = hash::new(&mut heap, vm_id).unwrap();
    let a = Value::Symbol(symbols.intern("a"));
    let b = Value::Symbol(symbols.intern("b"));
    hash::insert(&mut heap, &symbols, vm_id, addr, a, Value::Fixnum(1)).unwrap();
    hash::insert(&mut heap, &symbols, vm_id, addr, b, Value::Fixnum(2)).unwrap();

    let result = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Hash(addr)], 0, collection::hash_keys);
    let Value::Array(keys_addr) = result else { panic!("expected an Array result") };
    assert_eq!(array::len(&heap, keys_addr), 2);
}

#[test]
fn range_first_last_and_include_reflect_its_bounds() {
    harness!(pool, heap, symbols, classes, bootstrap, vm, platform);
    let vm_id = vm.vm_id();
    let addr = range::new(&mut heap, vm_id, Value::Fixnum(1), Value::Fixnum(5), true).unwrap();

    let first = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 0, &[Value::Range(addr)], 0, collection::range_first);
    assert!(matches!(first, Value::Fixnum(1)));

    let last = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 1, &[Value::Range(addr)], 0, collection::range_last);
    assert!(matches!(last, Value::Fixnum(5)));

    let includes_four = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 2, &[Value::Range(addr), Value::Fixnum(4)], 1, collection::range_include);
    assert!(matches!(includes_four, Value::True));

    let excludes_five = call_native(&mut vm, &mut heap, &mut symbols, &mut classes, &bootstrap, &mut platform, 4, &[Value::Range(addr), Value::Fixnum(5)], 1, collection::range_include);
    assert!(matches!(excludes_five, Value::False));
}
