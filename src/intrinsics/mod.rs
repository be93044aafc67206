// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Built-in methods for the core's bootstrap classes.
//!
//! Intrinsics are Rust functions invoked through the same `SEND`/`CALL`
//! path as bytecode methods: each one is registered as a
//! [`crate::value::proc::ProcKind::Native`] body on a bootstrap class, so
//! from the interpreter's point of view a native method and a compiled one
//! are indistinguishable. A [`NativeCall`] bundles the borrows a native
//! needs (the calling `Vm`, the heap, the symbol and class tables, and the
//! platform) plus the register window `{receiver, arg1, .., argN}` the
//! call landed in.

#[cfg(test)]
mod mod_test;

mod arithmetic;
mod collection;
mod kernel;
mod string;

use crate::addr::Addr;
use crate::alloc::Tlsf;
use crate::platform::Platform;
use crate::value::class::{ClassError, ClassId, ClassTable};
use crate::value::proc;
use crate::value::symbol::{SymbolId, SymbolTable};
use crate::value::Value;
use crate::vm::{Consts, Globals, Vm};

/// Per-call context handed to a [`NativeFn`]: the receiver is `arg(0)`, the
/// first real argument is `arg(1)`.
pub struct NativeCall<'a, 'img, 'buf> {
    pub(crate) vm: &'a mut Vm<'img>,
    pub(crate) heap: &'a mut Tlsf<'buf>,
    pub(crate) symbols: &'a mut SymbolTable,
    pub(crate) classes: &'a mut ClassTable,
    pub(crate) bootstrap: &'a Bootstrap,
    pub(crate) platform: &'a mut dyn Platform,
    pub(crate) natives: &'a [NativeFn],
    pub(crate) globals: &'a mut Globals,
    pub(crate) consts: &'a mut Consts,
    pub(crate) window_base: u16,
    pub(crate) argc: u8,
    /// The literal block passed by a `SENDB` call site, if any.
    pub(crate) block: Option<Addr>,
}

impl<'a, 'img, 'buf> NativeCall<'a, 'img, 'buf> {
    /// Argument `i` (0 is the receiver), or `Nil` if `i` exceeds `argc`.
    #[must_use]
    pub fn arg(&self, i: u8) -> Value {
        self.vm.reg_abs(self.window_base + u16::from(i))
    }

    #[must_use]
    pub fn receiver(&self) -> Value {
        self.arg(0)
    }

    /// Number of arguments, not counting the receiver.
    #[must_use]
    pub const fn argc(&self) -> u8 {
        self.argc
    }

    pub fn set_result(&mut self, value: Value) {
        self.vm.set_reg_abs(self.window_base, value, self.symbols, self.heap);
    }

    /// Whether this call was made with a literal block (`foo { ... }`).
    #[must_use]
    pub const fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// Invoke the block passed to this call with `args`, running it to
    /// completion and returning its result. A no-op returning `Nil` if no
    /// block was given.
    pub fn invoke_block(&mut self, args: &[Value]) -> Value {
        let Some(block) = self.block else {
            return Value::Nil;
        };
        self.vm.invoke_block(self.heap, self.symbols, self.classes, self.bootstrap, self.natives, self.platform, self.globals, self.consts, block, args)
    }
}

fn diagnostic(call: &mut NativeCall<'_, '_, '_>, msg: &str) {
    use crate::platform::PlatformExt;
    call.platform.write_str("intrinsic: ");
    call.platform.write_line(msg);
}

/// A built-in method body.
pub type NativeFn = fn(&mut NativeCall<'_, '_, '_>);

/// Class ids of the bootstrap classes, resolved once at `install` time.
#[derive(Debug, Clone, Copy)]
pub struct Bootstrap {
    pub object: ClassId,
    pub nil_class: ClassId,
    pub true_class: ClassId,
    pub false_class: ClassId,
    pub fixnum: ClassId,
    #[cfg(feature = "float")]
    pub float: ClassId,
    pub symbol: ClassId,
    pub array: ClassId,
    pub string: ClassId,
    pub hash: ClassId,
    pub range: ClassId,
    pub proc_class: ClassId,
    pub class_class: ClassId,
}

/// The class a value dispatches methods against.
#[must_use]
pub fn class_of(bootstrap: &Bootstrap, heap: &Tlsf, value: Value) -> ClassId {
    match value {
        Value::Empty | Value::Nil => bootstrap.nil_class,
        Value::False => bootstrap.false_class,
        Value::True => bootstrap.true_class,
        Value::Fixnum(_) => bootstrap.fixnum,
        #[cfg(feature = "float")]
        Value::Float(_) => bootstrap.float,
        Value::Symbol(_) => bootstrap.symbol,
        Value::Class(_) => bootstrap.class_class,
        Value::Object(addr) => crate::value::class::class_of(heap, addr),
        Value::Proc(_) => bootstrap.proc_class,
        Value::Array(_) => bootstrap.array,
        Value::String(_) => bootstrap.string,
        Value::Range(_) => bootstrap.range,
        Value::Hash(_) => bootstrap.hash,
        Value::Handle(_) => bootstrap.object,
    }
}

/// One row of the installation table: the owning class, the method name,
/// and the native function it dispatches to.
struct Builtin {
    class: fn(&Bootstrap) -> ClassId,
    name: &'static str,
    func: NativeFn,
}

fn table() -> &'static [Builtin] {
    &[
        Builtin { class: |b| b.object, name: "class", func: kernel::object_class },
        Builtin { class: |b| b.object, name: "puts", func: kernel::kernel_puts },
        Builtin { class: |b| b.object, name: "print", func: kernel::kernel_print },
        Builtin { class: |b| b.object, name: "p", func: kernel::kernel_p },
        Builtin { class: |b| b.object, name: "==", func: kernel::object_eq },
        Builtin { class: |b| b.object, name: "inspect", func: kernel::object_to_s },
        Builtin { class: |b| b.object, name: "to_s", func: kernel::object_to_s },
        Builtin { class: |b| b.fixnum, name: "+", func: arithmetic::fixnum_add },
        Builtin { class: |b| b.fixnum, name: "-", func: arithmetic::fixnum_sub },
        Builtin { class: |b| b.fixnum, name: "*", func: arithmetic::fixnum_mul },
        Builtin { class: |b| b.fixnum, name: "/", func: arithmetic::fixnum_div },
        Builtin { class: |b| b.fixnum, name: "%", func: arithmetic::fixnum_mod },
        Builtin { class: |b| b.fixnum, name: "to_s", func: arithmetic::fixnum_to_s },
        Builtin { class: |b| b.fixnum, name: "times", func: arithmetic::fixnum_times },
        Builtin { class: |b| b.string, name: "length", func: string::string_length },
        Builtin { class: |b| b.string, name: "size", func: string::string_length },
        Builtin { class: |b| b.string, name: "+", func: string::string_concat },
        Builtin { class: |b| b.string, name: "to_s", func: string::string_to_s },
        Builtin { class: |b| b.string, name: "strip", func: string::string_strip },
        Builtin { class: |b| b.string, name: "chomp", func: string::string_chomp },
        Builtin { class: |b| b.string, name: "[]", func: string::string_get },
        Builtin { class: |b| b.string, name: "index", func: string::string_index },
        Builtin { class: |b| b.array, name: "length", func: collection::array_length },
        Builtin { class: |b| b.array, name: "size", func: collection::array_length },
        Builtin { class: |b| b.array, name: "push", func: collection::array_push },
        Builtin { class: |b| b.array, name: "<<", func: collection::array_push },
        Builtin { class: |b| b.array, name: "pop", func: collection::array_pop },
        Builtin { class: |b| b.array, name: "insert", func: collection::array_insert },
        Builtin { class: |b| b.array, name: "delete_at", func: collection::array_remove },
        Builtin { class: |b| b.array, name: "unshift", func: collection::array_unshift },
        Builtin { class: |b| b.array, name: "shift", func: collection::array_shift },
        Builtin { class: |b| b.array, name: "min", func: collection::array_min },
        Builtin { class: |b| b.array, name: "max", func: collection::array_max },
        Builtin { class: |b| b.array, name: "[]", func: collection::array_get },
        Builtin { class: |b| b.array, name: "[]=", func: collection::array_set },
        Builtin { class: |b| b.hash, name: "length", func: collection::hash_length },
        Builtin { class: |b| b.hash, name: "size", func: collection::hash_length },
        Builtin { class: |b| b.hash, name: "[]", func: collection::hash_get },
        Builtin { class: |b| b.hash, name: "[]=", func: collection::hash_set },
        Builtin { class: |b| b.hash, name: "delete", func: collection::hash_delete },
        Builtin { class: |b| b.hash, name: "keys", func: collection::hash_keys },
        Builtin { class: |b| b.range, name: "first", func: collection::range_first },
        Builtin { class: |b| b.range, name: "last", func: collection::range_last },
        Builtin { class: |b| b.range, name: "include?", func: collection::range_include },
    ]
}

fn intern_name(symbols: &mut SymbolTable, name: &str) -> SymbolId {
    symbols.intern(name)
}

/// Define the bootstrap class hierarchy and register every built-in
/// method, returning the dispatch table a [`crate::vm::Vm::step`] call
/// indexes by [`crate::value::proc::ProcKind::Native`]'s index.
///
/// # Errors
///
/// Returns [`ClassError`] if the class or method tables are full — both
/// fixed, compile-time-known capacities of the embedding.
pub fn install(
    heap: &mut Tlsf,
    classes: &mut ClassTable,
    symbols: &mut SymbolTable,
) -> Result<(Bootstrap, crate::alloc_crate::vec::Vec<NativeFn>), ClassError> {
    use crate::addr::VmId;

    let object = classes.define_class(intern_name(symbols, "Object"), None)?;
    let nil_class = classes.define_class(intern_name(symbols, "NilClass"), Some(object))?;
    let true_class = classes.define_class(intern_name(symbols, "TrueClass"), Some(object))?;
    let false_class = classes.define_class(intern_name(symbols, "FalseClass"), Some(object))?;
    let fixnum = classes.define_class(intern_name(symbols, "Integer"), Some(object))?;
    #[cfg(feature = "float")]
    let float = classes.define_class(intern_name(symbols, "Float"), Some(object))?;
    let symbol = classes.define_class(intern_name(symbols, "Symbol"), Some(object))?;
    let array = classes.define_class(intern_name(symbols, "Array"), Some(object))?;
    let string = classes.define_class(intern_name(symbols, "String"), Some(object))?;
    let hash = classes.define_class(intern_name(symbols, "Hash"), Some(object))?;
    let range = classes.define_class(intern_name(symbols, "Range"), Some(object))?;
    let proc_class = classes.define_class(intern_name(symbols, "Proc"), Some(object))?;
    let class_class = classes.define_class(intern_name(symbols, "Class"), Some(object))?;

    let bootstrap = Bootstrap {
        object,
        nil_class,
        true_class,
        false_class,
        fixnum,
        #[cfg(feature = "float")]
        float,
        symbol,
        array,
        string,
        hash,
        range,
        proc_class,
        class_class,
    };

    let mut natives = crate::alloc_crate::vec::Vec::with_capacity(table().len());
    for (idx, builtin) in table().iter().enumerate() {
        // Index into `table()` doubles as the `ProcKind::Native` index a
        // bytecode-visible method body carries.
        let addr = proc::new_native(heap, VmId::PROCESS, idx as u16).map_err(|_| ClassError::MethodTableFull)?;
        let name = intern_name(symbols, builtin.name);
        classes.define_method((builtin.class)(&bootstrap), name, Value::Proc(addr))?;
        natives.push(builtin.func);
    }

    Ok((bootstrap, natives))
}
