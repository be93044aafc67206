// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `Array`, `Hash`, and `Range` instance methods.

use super::NativeCall;
use crate::value::{array, hash, range, Value};

fn fixnum_arg(v: Value) -> Option<i32> {
    match v {
        Value::Fixnum(n) => Some(n),
        _ => None,
    }
}

// --- Array --------------------------------------------------------------

pub(super) fn array_length(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Array(addr) => Value::fixnum(i32::from(array::len(call.heap, addr))),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn array_get(call: &mut NativeCall<'_, '_, '_>) {
    let result = match (call.receiver(), fixnum_arg(call.arg(1))) {
        (Value::Array(addr), Some(idx)) => array::get(call.heap, addr, idx).dup(call.heap),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn array_set(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    let idx = fixnum_arg(call.arg(1));
    let value = call.arg(2);
    if let (Value::Array(addr), Some(idx)) = (recv, idx) {
        let stored = value.dup(call.heap);
        let vm_id = call.vm.vm_id();
        let _ = array::set(call.heap, call.symbols, vm_id, addr, idx, stored);
    }
    call.set_result(value);
}

pub(super) fn array_push(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    if let Value::Array(addr) = recv {
        let value = call.arg(1).dup(call.heap);
        let vm_id = call.vm.vm_id();
        let _ = array::push(call.heap, vm_id, addr, value);
    }
    // returning the receiver overwrites the same register it already
    // occupies; `set_result` releases that slot's current owner first, so
    // dup to cover the copy being written back.
    call.set_result(recv.dup(call.heap));
}

pub(super) fn array_pop(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Array(addr) => array::pop(call.heap, addr).unwrap_or(Value::Nil),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn array_insert(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    if let (Value::Array(addr), Some(idx)) = (recv, fixnum_arg(call.arg(1))) {
        let value = call.arg(2).dup(call.heap);
        let vm_id = call.vm.vm_id();
        let _ = array::insert(call.heap, vm_id, addr, idx, value);
    }
    call.set_result(recv.dup(call.heap));
}

pub(super) fn array_remove(call: &mut NativeCall<'_, '_, '_>) {
    let result = match (call.receiver(), fixnum_arg(call.arg(1))) {
        (Value::Array(addr), Some(idx)) => array::remove(call.heap, addr, idx).unwrap_or(Value::Nil),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn array_unshift(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    if let Value::Array(addr) = recv {
        let value = call.arg(1).dup(call.heap);
        let vm_id = call.vm.vm_id();
        let _ = array::unshift(call.heap, vm_id, addr, value);
    }
    call.set_result(recv.dup(call.heap));
}

pub(super) fn array_shift(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Array(addr) => array::shift(call.heap, addr).unwrap_or(Value::Nil),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn array_min(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Array(addr) => array::min(call.heap, call.symbols, addr).dup(call.heap),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn array_max(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Array(addr) => array::max(call.heap, call.symbols, addr).dup(call.heap),
        _ => Value::Nil,
    };
    call.set_result(result);
}

// --- Hash -----------------------------------------------------------------

pub(super) fn hash_length(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Hash(addr) => Value::fixnum(i32::from(hash::len(call.heap, addr))),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn hash_get(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Hash(addr) => {
            let key = call.arg(1);
            hash::get(call.heap, call.symbols, addr, key).map(|v| v.dup(call.heap)).unwrap_or(Value::Nil)
        }
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn hash_set(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    let key = call.arg(1);
    let value = call.arg(2);
    if let Value::Hash(addr) = recv {
        let stored_key = key.dup(call.heap);
        let stored_value = value.dup(call.heap);
        let vm_id = call.vm.vm_id();
        let _ = hash::insert(call.heap, call.symbols, vm_id, addr, stored_key, stored_value);
    }
    call.set_result(value);
}

pub(super) fn hash_delete(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Hash(addr) => {
            let key = call.arg(1);
            hash::remove(call.heap, call.symbols, addr, key).unwrap_or(Value::Nil)
        }
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn hash_keys(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Hash(addr) => {
            let vm_id = call.vm.vm_id();
            hash::keys(call.heap, vm_id, addr).ok().map_or(Value::Nil, Value::Array)
        }
        _ => Value::Nil,
    };
    call.set_result(result);
}

// --- Range ----------------------------------------------------------------

pub(super) fn range_first(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Range(addr) => range::first(call.heap, addr).dup(call.heap),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn range_last(call: &mut NativeCall<'_, '_, '_>) {
    let result = match call.receiver() {
        Value::Range(addr) => range::last(call.heap, addr).dup(call.heap),
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn range_include(call: &mut NativeCall<'_, '_, '_>) {
    let result = match (call.receiver(), fixnum_arg(call.arg(1))) {
        (Value::Range(addr), Some(n)) => Value::bool(range::contains_fixnum(call.heap, addr, n)),
        _ => Value::bool(false),
    };
    call.set_result(result);
}
