// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `Integer` arithmetic methods.
//!
//! These back explicit method sends (`1.send(:+, 2)`, a user subclass
//! overriding `+`, etc.); the common case of `ADD`/`SUB`/`MUL`/`DIV` on two
//! plain operands is handled inline by the interpreter without reaching
//! here. Fixnum operations wrap on overflow, matching the interpreter's
//! own `wrapping_add`/`wrapping_sub`/`wrapping_mul`.

use super::{diagnostic, NativeCall};
use crate::alloc_crate::format;
use crate::value::Value;

fn operands(call: &NativeCall<'_, '_, '_>) -> Option<(i32, i32)> {
    match (call.receiver(), call.arg(1)) {
        (Value::Fixnum(a), Value::Fixnum(b)) => Some((a, b)),
        _ => None,
    }
}

pub(super) fn fixnum_add(call: &mut NativeCall<'_, '_, '_>) {
    match operands(call) {
        Some((a, b)) => call.set_result(Value::fixnum(a.wrapping_add(b))),
        None => {
            diagnostic(call, "+ called with a non-Integer argument");
            call.set_result(Value::Nil);
        }
    }
}

pub(super) fn fixnum_sub(call: &mut NativeCall<'_, '_, '_>) {
    match operands(call) {
        Some((a, b)) => call.set_result(Value::fixnum(a.wrapping_sub(b))),
        None => {
            diagnostic(call, "- called with a non-Integer argument");
            call.set_result(Value::Nil);
        }
    }
}

pub(super) fn fixnum_mul(call: &mut NativeCall<'_, '_, '_>) {
    match operands(call) {
        Some((a, b)) => call.set_result(Value::fixnum(a.wrapping_mul(b))),
        None => {
            diagnostic(call, "* called with a non-Integer argument");
            call.set_result(Value::Nil);
        }
    }
}

pub(super) fn fixnum_div(call: &mut NativeCall<'_, '_, '_>) {
    match operands(call) {
        Some((_, 0)) => call.set_result(Value::Nil),
        Some((a, b)) => call.set_result(Value::fixnum(a.wrapping_div(b))),
        None => {
            diagnostic(call, "/ called with a non-Integer argument");
            call.set_result(Value::Nil);
        }
    }
}

pub(super) fn fixnum_mod(call: &mut NativeCall<'_, '_, '_>) {
    match operands(call) {
        Some((_, 0)) => call.set_result(Value::Nil),
        Some((a, b)) => call.set_result(Value::fixnum(a.wrapping_rem(b))),
        None => {
            diagnostic(call, "% called with a non-Integer argument");
            call.set_result(Value::Nil);
        }
    }
}

/// Yield the block `self` times with the current index, returning `self`.
/// A negative or missing receiver yields zero times.
pub(super) fn fixnum_times(call: &mut NativeCall<'_, '_, '_>) {
    let recv = call.receiver();
    if let Value::Fixnum(n) = recv {
        for i in 0..n.max(0) {
            call.invoke_block(&[Value::fixnum(i)]);
        }
    }
    call.set_result(recv.dup(call.heap));
}

pub(super) fn fixnum_to_s(call: &mut NativeCall<'_, '_, '_>) {
    let Value::Fixnum(n) = call.receiver() else {
        call.set_result(Value::Nil);
        return;
    };
    let text = format!("{n}");
    let vm_id = call.vm.vm_id();
    let result = crate::value::string::new(call.heap, vm_id, text.as_bytes())
        .ok()
        .map_or(Value::Nil, Value::String);
    call.set_result(result);
}
