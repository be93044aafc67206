// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `Object`/`Kernel` methods every value responds to.

use super::NativeCall;
use crate::alloc_crate::format;
use crate::alloc_crate::vec::Vec;
use crate::platform::{PlatformExt, FD_STDOUT};
use crate::value::Value;

pub(super) fn object_class(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    let class_id = super::class_of(call.bootstrap, call.heap, recv);
    call.set_result(Value::Class(class_id));
}

pub(super) fn object_eq(call: &mut NativeCall<'_, '_, '_>) {
    let a = call.receiver();
    let b = call.arg(1);
    let equal = a.equals(b, call.heap, call.symbols);
    call.set_result(Value::bool(equal));
}

/// Writes the receiver's inspected form to a byte buffer, scalars only —
/// heap containers fall back to a stable placeholder rather than walking
/// their contents (no `to_s`/`inspect` recursion in this dispatch layer).
fn inspect_scalar(recv: Value, symbols: &crate::value::symbol::SymbolTable) -> crate::alloc_crate::string::String {
    match recv {
        Value::Empty | Value::Nil => "nil".into(),
        Value::True => "true".into(),
        Value::False => "false".into(),
        Value::Fixnum(n) => format!("{n}"),
        #[cfg(feature = "float")]
        Value::Float(f) => format!("{f}"),
        Value::Symbol(id) => format!(":{}", symbols.name(id)),
        Value::Class(_) => "Class".into(),
        Value::Object(_) => "#<Object>".into(),
        Value::Proc(_) => "#<Proc>".into(),
        Value::Array(_) => "[Array]".into(),
        Value::String(_) => "\"...\"".into(),
        Value::Range(_) => "(Range)".into(),
        Value::Hash(_) => "{Hash}".into(),
        Value::Handle(_) => "#<Handle>".into(),
    }
}

pub(super) fn object_to_s(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    let bytes = match recv {
        Value::String(addr) => crate::value::string::bytes(call.heap, addr).to_vec(),
        other => inspect_scalar(other, call.symbols).into_bytes(),
    };
    let vm_id = call.vm.vm_id();
    let result = crate::value::string::new(call.heap, vm_id, &bytes).ok().map_or(Value::Nil, Value::String);
    call.set_result(result);
}

fn write_value(call: &mut NativeCall<'_, '_, '_>, value: Value) {
    match value {
        Value::String(addr) => {
            let bytes: Vec<u8> = crate::value::string::bytes(call.heap, addr).to_vec();
            call.platform.write(FD_STDOUT, &bytes);
        }
        other => {
            let text = inspect_scalar(other, call.symbols);
            call.platform.write_str(&text);
        }
    }
}

pub(super) fn kernel_puts(call: &mut NativeCall<'_, '_, '_>) {
    if call.argc() == 0 {
        call.platform.write_line("");
    } else {
        for i in 1..=call.argc() {
            let v = call.arg(i);
            write_value(call, v);
            call.platform.write(FD_STDOUT, b"\n");
        }
    }
    call.set_result(Value::Nil);
}

pub(super) fn kernel_print(call: &mut NativeCall<'_, '_, '_>) {
    for i in 1..=call.argc() {
        let v = call.arg(i);
        write_value(call, v);
    }
    call.set_result(Value::Nil);
}

/// Recursive `inspect` rendering: scalars fall back to
/// [`inspect_scalar`]; arrays and hashes walk their own elements rather
/// than printing a placeholder.
fn inspect_value(heap: &crate::alloc::Tlsf, symbols: &crate::value::symbol::SymbolTable, value: Value) -> crate::alloc_crate::string::String {
    match value {
        Value::Array(addr) => {
            let len = crate::value::array::len(heap, addr);
            let mut parts = Vec::with_capacity(len as usize);
            for i in 0..len {
                parts.push(inspect_value(heap, symbols, crate::value::array::get(heap, addr, i32::from(i))));
            }
            format!("[{}]", parts.join(", "))
        }
        Value::Hash(addr) => {
            let len = crate::value::hash::len(heap, addr);
            let mut parts = Vec::with_capacity(len as usize);
            for i in 0..len {
                let (k, v) = crate::value::hash::entry(heap, addr, i);
                parts.push(format!("{}=>{}", inspect_value(heap, symbols, k), inspect_value(heap, symbols, v)));
            }
            format!("{{{}}}", parts.join(", "))
        }
        Value::String(addr) => format!("\"{}\"", core::str::from_utf8(crate::value::string::bytes(heap, addr)).unwrap_or("?")),
        other => inspect_scalar(other, symbols),
    }
}

pub(super) fn kernel_p(call: &mut NativeCall<'_, '_, '_>) {
    for i in 1..=call.argc() {
        let v = call.arg(i);
        let text = inspect_value(call.heap, call.symbols, v);
        call.platform.write_str(&text);
        call.platform.write_line("");
    }
    let result = if call.argc() == 0 { Value::Nil } else { call.arg(call.argc()).dup(call.heap) };
    call.set_result(result);
}
