// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Range container: `first..last` or `first...last`, fixed in size since
//! neither endpoint can grow in place.

#[cfg(test)]
mod range_test;

use super::header::{Header, Tag};
use super::symbol::SymbolTable;
use super::Value;
use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};
use core::cmp::Ordering;

const VALUE_SIZE: usize = core::mem::size_of::<Value>();
const EXCLUDE_OFFSET: usize = 0;
const FIRST_OFFSET: usize = 1;
const LAST_OFFSET: usize = 1 + VALUE_SIZE;
const BODY_SIZE: usize = 1 + 2 * VALUE_SIZE;
const BLOCK_SIZE: usize = super::header::HEADER_SIZE + BODY_SIZE;

/// Allocate a new range, taking ownership of `first` and `last`.
///
/// # Errors
///
/// Returns [`AllocError`] if the pool has no room.
pub fn new(heap: &mut Tlsf, vm_id: VmId, first: Value, last: Value, exclude_end: bool) -> Result<Addr, AllocError> {
    let addr = heap.alloc(BLOCK_SIZE, vm_id)?;
    unsafe { heap.write(addr, Header::new(Tag::Range, vm_id.as_u8()).encode()) };
    let body = addr.add(super::header::HEADER_SIZE as u16);
    unsafe {
        heap.write(body.add(EXCLUDE_OFFSET as u16), u8::from(exclude_end));
        heap.write(body.add(FIRST_OFFSET as u16), first);
        heap.write(body.add(LAST_OFFSET as u16), last);
    }
    Ok(addr)
}

fn body(addr: Addr) -> Addr {
    addr.add(super::header::HEADER_SIZE as u16)
}

#[must_use]
pub fn first(heap: &Tlsf, addr: Addr) -> Value {
    unsafe { heap.read(body(addr).add(FIRST_OFFSET as u16)) }
}

#[must_use]
pub fn last(heap: &Tlsf, addr: Addr) -> Value {
    unsafe { heap.read(body(addr).add(LAST_OFFSET as u16)) }
}

#[must_use]
pub fn excludes_end(heap: &Tlsf, addr: Addr) -> bool {
    let byte: u8 = unsafe { heap.read(body(addr).add(EXCLUDE_OFFSET as u16)) };
    byte != 0
}

/// Whether an integer range `first..last` (or `first...last`) contains
/// `n`. Non-integer endpoints never contain anything, matching the
/// integer-only iteration support.
#[must_use]
pub fn contains_fixnum(heap: &Tlsf, addr: Addr, n: i32) -> bool {
    let (Value::Fixnum(lo), Value::Fixnum(hi)) = (first(heap, addr), last(heap, addr)) else {
        return false;
    };
    if excludes_end(heap, addr) {
        n >= lo && n < hi
    } else {
        n >= lo && n <= hi
    }
}

#[must_use]
pub fn compare(heap: &Tlsf, symbols: &SymbolTable, a: Addr, b: Addr) -> Ordering {
    first(heap, a)
        .compare(first(heap, b), heap, symbols)
        .then_with(|| last(heap, a).compare(last(heap, b), heap, symbols))
        .then_with(|| excludes_end(heap, a).cmp(&excludes_end(heap, b)))
}

pub(super) fn release_contents(heap: &mut Tlsf, symbols: &SymbolTable, addr: Addr) {
    first(heap, addr).release(heap, symbols);
    last(heap, addr).release(heap, symbols);
}
