// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `String` instance methods.

use super::NativeCall;
use crate::alloc_crate::vec::Vec;
use crate::value::{string, Value};

fn receiver_addr(call: &NativeCall<'_, '_, '_>) -> Option<crate::addr::Addr> {
    match call.receiver() {
        Value::String(addr) => Some(addr),
        _ => None,
    }
}

fn fixnum_arg(v: Value) -> Option<i32> {
    match v {
        Value::Fixnum(n) => Some(n),
        _ => None,
    }
}

pub(super) fn string_length(call: &mut NativeCall<'_, '_, '_>) {
    let result = receiver_addr(call).map_or(Value::Nil, |addr| Value::fixnum(i32::from(string::len(call.heap, addr))));
    call.set_result(result);
}

pub(super) fn string_concat(call: &mut NativeCall<'_, '_, '_>) {
    let Some(addr) = receiver_addr(call) else {
        call.set_result(Value::Nil);
        return;
    };
    let Value::String(other) = call.arg(1) else {
        call.set_result(Value::Nil);
        return;
    };
    let mut bytes: Vec<u8> = string::bytes(call.heap, addr).to_vec();
    bytes.extend_from_slice(string::bytes(call.heap, other));
    let vm_id = call.vm.vm_id();
    let result = string::new(call.heap, vm_id, &bytes).ok().map_or(Value::Nil, Value::String);
    call.set_result(result);
}

pub(super) fn string_to_s(call: &mut NativeCall<'_, '_, '_>) {
    let result = call.receiver().dup(call.heap);
    call.set_result(result);
}

pub(super) fn string_strip(call: &mut NativeCall<'_, '_, '_>) {
    let Some(addr) = receiver_addr(call) else {
        call.set_result(Value::Nil);
        return;
    };
    let bytes: Vec<u8> = string::bytes(call.heap, addr).to_vec();
    let vm_id = call.vm.vm_id();
    let Ok(copy) = string::new(call.heap, vm_id, &bytes) else {
        call.set_result(Value::Nil);
        return;
    };
    string::strip(call.heap, copy);
    call.set_result(Value::String(copy));
}

/// `str[idx]` or `str[idx, count]`, negative indices counting from the
/// end; a missing `count` defaults to a one-character slice.
pub(super) fn string_get(call: &mut NativeCall<'_, '_, '_>) {
    let (Some(addr), Some(idx)) = (receiver_addr(call), fixnum_arg(call.arg(1))) else {
        call.set_result(Value::Nil);
        return;
    };
    let count = if call.argc() >= 2 {
        match fixnum_arg(call.arg(2)) {
            Some(n) if n >= 0 => n as u16,
            _ => 0,
        }
    } else {
        1
    };
    let vm_id = call.vm.vm_id();
    let result = string::slice(call.heap, vm_id, addr, idx, count).ok().flatten().map_or(Value::Nil, Value::String);
    call.set_result(result);
}

/// Byte offset of the first occurrence of a substring, or `nil`.
pub(super) fn string_index(call: &mut NativeCall<'_, '_, '_>) {
    let result = match (receiver_addr(call), call.arg(1)) {
        (Some(addr), Value::String(needle)) => {
            let bytes: Vec<u8> = string::bytes(call.heap, needle).to_vec();
            string::index_of(call.heap, addr, &bytes).map_or(Value::Nil, |i| Value::fixnum(i32::from(i)))
        }
        _ => Value::Nil,
    };
    call.set_result(result);
}

pub(super) fn string_chomp(call: &mut NativeCall<'_, '_, '_>) {
    let Some(addr) = receiver_addr(call) else {
        call.set_result(Value::Nil);
        return;
    };
    let bytes: Vec<u8> = string::bytes(call.heap, addr).to_vec();
    let vm_id = call.vm.vm_id();
    let Ok(copy) = string::new(call.heap, vm_id, &bytes) else {
        call.set_result(Value::Nil);
        return;
    };
    string::chomp(call.heap, copy);
    call.set_result(Value::String(copy));
}
