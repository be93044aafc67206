use super::*;
use crate::value::symbol::SymbolTable;

#[test]
fn define_class_and_lookup_method_walks_superclass_chain() {
    let mut symbols = SymbolTable::new();
    let mut classes = ClassTable::new();

    let object_name = symbols.intern("Object");
    let object = classes.define_class(object_name, None).unwrap();

    let animal_name = symbols.intern("Animal");
    let animal = classes.define_class(animal_name, Some(object)).unwrap();

    let speak = symbols.intern("speak");
    classes.define_method(object, speak, Value::fixnum(1)).unwrap();

    assert!(matches!(classes.lookup_method(animal, speak), Some(Value::Fixnum(1))));
    assert!(classes.lookup_method(animal, symbols.intern("fly")).is_none());
}

#[test]
fn redefining_a_method_shadows_the_old_body() {
    let mut symbols = SymbolTable::new();
    let mut classes = ClassTable::new();
    let name = symbols.intern("Foo");
    let foo = classes.define_class(name, None).unwrap();
    let bar = symbols.intern("bar");

    classes.define_method(foo, bar, Value::fixnum(1)).unwrap();
    classes.define_method(foo, bar, Value::fixnum(2)).unwrap();

    assert!(matches!(classes.lookup_method(foo, bar), Some(Value::Fixnum(2))));
}

#[test]
fn is_subclass_of_walks_the_chain() {
    let mut symbols = SymbolTable::new();
    let mut classes = ClassTable::new();
    let object = classes.define_class(symbols.intern("Object"), None).unwrap();
    let animal = classes.define_class(symbols.intern("Animal"), Some(object)).unwrap();
    let dog = classes.define_class(symbols.intern("Dog"), Some(animal)).unwrap();

    assert!(classes.is_subclass_of(dog, object));
    assert!(!classes.is_subclass_of(object, dog));
}

#[test]
fn ivars_round_trip_and_stay_sorted() {
    let mut buf = vec![0u8; 4096];
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let mut symbols = SymbolTable::new();
    let mut classes = ClassTable::new();
    let vm = VmId::new(1);
    let klass = classes.define_class(symbols.intern("Foo"), None).unwrap();

    let obj = new_object(&mut heap, vm, klass).unwrap();
    let a = symbols.intern("a");
    let b = symbols.intern("b");
    let c = symbols.intern("c");

    set_ivar(&mut heap, &symbols, vm, obj, c, Value::fixnum(3)).unwrap();
    set_ivar(&mut heap, &symbols, vm, obj, a, Value::fixnum(1)).unwrap();
    set_ivar(&mut heap, &symbols, vm, obj, b, Value::fixnum(2)).unwrap();

    assert!(matches!(get_ivar(&heap, obj, a), Value::Fixnum(1)));
    assert!(matches!(get_ivar(&heap, obj, b), Value::Fixnum(2)));
    assert!(matches!(get_ivar(&heap, obj, c), Value::Fixnum(3)));
    assert!(matches!(get_ivar(&heap, obj, symbols.intern("missing")), Value::Nil));
    assert_eq!(class_of(&heap, obj), klass);
}

#[test]
fn release_object_contents_frees_ivar_buffer() {
    let mut buf = vec![0u8; 4096];
    let mut heap = Tlsf::new(&mut buf).unwrap();
    let symbols = SymbolTable::new();
    let mut classes = ClassTable::new();
    let vm = VmId::new(1);
    let klass = classes.define_class(SymbolId::new(0), None).unwrap();

    let obj = new_object(&mut heap, vm, klass).unwrap();
    set_ivar(&mut heap, &symbols, vm, obj, SymbolId::new(0), Value::fixnum(1)).unwrap();
    release_object_contents(&mut heap, &symbols, obj);
    heap.free(obj);
    assert_eq!(heap.stats(None).used, 0);
}
