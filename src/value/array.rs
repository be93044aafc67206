// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Contiguous, growable array container.
//!
//! Layout at a `Value::Array` address: `[Header][GrowHeader]`, with the
//! element buffer living in a separate allocation reached through
//! `GrowHeader::data`. `push` grows the data buffer by
//! [`GROWTH`] slots at a time rather than doubling, matching the
//! original's fixed growth increment.

#[cfg(test)]
mod array_test;

use super::growable::{self, GrowHeader};
use super::header::{Header, Tag};
use super::symbol::SymbolTable;
use super::Value;
use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};
use core::cmp::Ordering;
use core::mem::size_of;

const BLOCK_SIZE: usize = super::header::HEADER_SIZE + growable::HEADER_SIZE;

/// Elements added to capacity each time an array must grow.
pub const GROWTH: u16 = 6;

fn read_grow(heap: &Tlsf, addr: Addr) -> GrowHeader {
    let bytes: [u8; growable::HEADER_SIZE] = unsafe { heap.read(addr.add(super::header::HEADER_SIZE as u16)) };
    GrowHeader::decode(bytes)
}

fn write_grow(heap: &mut Tlsf, addr: Addr, grow: GrowHeader) {
    unsafe { heap.write(addr.add(super::header::HEADER_SIZE as u16), grow.encode()) };
}

fn elem_addr(grow: &GrowHeader, index: u16) -> Addr {
    grow.data.add(index * size_of::<Value>() as u16)
}

/// Allocate a new, empty array owned by `vm_id`.
///
/// # Errors
///
/// Returns [`AllocError`] if the pool has no room for the fixed header
/// block.
pub fn new(heap: &mut Tlsf, vm_id: VmId) -> Result<Addr, AllocError> {
    let addr = heap.alloc(BLOCK_SIZE, vm_id)?;
    unsafe { heap.write(addr, Header::new(Tag::Array, vm_id.as_u8()).encode()) };
    write_grow(heap, addr, GrowHeader::empty());
    Ok(addr)
}

#[must_use]
pub fn len(heap: &Tlsf, addr: Addr) -> u16 {
    read_grow(heap, addr).length
}

/// Resolve a script-level index (negative indices count from the end) to
/// a slot index, or `None` if it falls outside `[0, len)`.
#[must_use]
fn resolve_index(idx: i32, len: u16) -> Option<u16> {
    let len = i32::from(len);
    let real = if idx < 0 { idx + len } else { idx };
    if real < 0 || real >= len { None } else { Some(real as u16) }
}

/// Read the element at `idx` (negative indices count from the end),
/// returning `Nil` when out of bounds.
#[must_use]
pub fn get(heap: &Tlsf, addr: Addr, idx: i32) -> Value {
    let grow = read_grow(heap, addr);
    match resolve_index(idx, grow.length) {
        Some(slot) => unsafe { heap.read(elem_addr(&grow, slot)) },
        None => Value::Nil,
    }
}

/// Write `value` at `idx`. A positive index at or beyond the current
/// length extends the array, filling any intermediate slots with `Nil`.
/// Negative indices beyond the start are out of range and ignored.
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn set(heap: &mut Tlsf, symbols: &SymbolTable, vm_id: VmId, addr: Addr, idx: i32, value: Value) -> Result<(), AllocError> {
    let mut grow = read_grow(heap, addr);
    let slot = if idx >= 0 {
        idx as u16
    } else {
        let Some(slot) = resolve_index(idx, grow.length) else {
            return Ok(());
        };
        slot
    };

    let original_length = grow.length;
    let needed = slot + 1;
    if needed > grow.length {
        growable::ensure_capacity(heap, &mut grow, needed, size_of::<Value>(), GROWTH, vm_id)?;
        for fill in grow.length..slot {
            unsafe { heap.write(elem_addr(&grow, fill), Value::Nil) };
        }
        grow.length = needed;
    }

    if slot < original_length {
        let old: Value = unsafe { heap.read(elem_addr(&grow, slot)) };
        old.release(heap, symbols);
    }
    unsafe { heap.write(elem_addr(&grow, slot), value) };
    write_grow(heap, addr, grow);
    Ok(())
}

/// Append `value`, growing the backing buffer by [`GROWTH`] when full.
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn push(heap: &mut Tlsf, vm_id: VmId, addr: Addr, value: Value) -> Result<(), AllocError> {
    let mut grow = read_grow(heap, addr);
    growable::ensure_capacity(heap, &mut grow, grow.length + 1, size_of::<Value>(), GROWTH, vm_id)?;
    unsafe { heap.write(elem_addr(&grow, grow.length), value) };
    grow.length += 1;
    write_grow(heap, addr, grow);
    Ok(())
}

/// Remove and return the last element, or `None` if the array is empty.
pub fn pop(heap: &mut Tlsf, addr: Addr) -> Option<Value> {
    let mut grow = read_grow(heap, addr);
    if grow.length == 0 {
        return None;
    }
    grow.length -= 1;
    let value = unsafe { heap.read(elem_addr(&grow, grow.length)) };
    write_grow(heap, addr, grow);
    Some(value)
}

/// Insert `value` before index `idx` (negative indices count from the
/// end), memmoving every later element one slot to the right. An index
/// at or beyond the current length appends rather than failing.
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn insert(heap: &mut Tlsf, vm_id: VmId, addr: Addr, idx: i32, value: Value) -> Result<(), AllocError> {
    let mut grow = read_grow(heap, addr);
    let slot = if idx < 0 { resolve_index(idx, grow.length).unwrap_or(0) } else { (idx as u16).min(grow.length) };

    growable::ensure_capacity(heap, &mut grow, grow.length + 1, size_of::<Value>(), GROWTH, vm_id)?;
    for i in (slot..grow.length).rev() {
        let v: Value = unsafe { heap.read(elem_addr(&grow, i)) };
        unsafe { heap.write(elem_addr(&grow, i + 1), v) };
    }
    unsafe { heap.write(elem_addr(&grow, slot), value) };
    grow.length += 1;
    write_grow(heap, addr, grow);
    Ok(())
}

/// Remove and return the element at `idx` (negative indices count from
/// the end), memmoving every later element one slot to the left. `None`
/// if `idx` is out of bounds.
pub fn remove(heap: &mut Tlsf, addr: Addr, idx: i32) -> Option<Value> {
    let mut grow = read_grow(heap, addr);
    let slot = resolve_index(idx, grow.length)?;
    let removed: Value = unsafe { heap.read(elem_addr(&grow, slot)) };
    for i in slot..grow.length - 1 {
        let v: Value = unsafe { heap.read(elem_addr(&grow, i + 1)) };
        unsafe { heap.write(elem_addr(&grow, i), v) };
    }
    grow.length -= 1;
    write_grow(heap, addr, grow);
    Some(removed)
}

/// Insert `value` at the front, memmoving every element one slot right.
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn unshift(heap: &mut Tlsf, vm_id: VmId, addr: Addr, value: Value) -> Result<(), AllocError> {
    insert(heap, vm_id, addr, 0, value)
}

/// Remove and return the first element, or `None` if the array is empty.
pub fn shift(heap: &mut Tlsf, addr: Addr) -> Option<Value> {
    remove(heap, addr, 0)
}

/// The least element by [`Value::compare`], or `Nil` if the array is
/// empty.
#[must_use]
pub fn min(heap: &Tlsf, symbols: &SymbolTable, addr: Addr) -> Value {
    extreme(heap, symbols, addr, Ordering::Less)
}

/// The greatest element by [`Value::compare`], or `Nil` if the array is
/// empty.
#[must_use]
pub fn max(heap: &Tlsf, symbols: &SymbolTable, addr: Addr) -> Value {
    extreme(heap, symbols, addr, Ordering::Greater)
}

fn extreme(heap: &Tlsf, symbols: &SymbolTable, addr: Addr, keep: Ordering) -> Value {
    let grow = read_grow(heap, addr);
    if grow.length == 0 {
        return Value::Nil;
    }
    let mut best: Value = unsafe { heap.read(elem_addr(&grow, 0)) };
    for i in 1..grow.length {
        let candidate: Value = unsafe { heap.read(elem_addr(&grow, i)) };
        if candidate.compare(best, heap, symbols) == keep {
            best = candidate;
        }
    }
    best
}

/// Element-wise comparison, shorter arrays ordering before longer ones
/// when all shared elements are equal.
#[must_use]
pub fn compare(heap: &Tlsf, symbols: &SymbolTable, a: Addr, b: Addr) -> Ordering {
    let ga = read_grow(heap, a);
    let gb = read_grow(heap, b);
    let shared = ga.length.min(gb.length);
    for i in 0..shared {
        let va: Value = unsafe { heap.read(elem_addr(&ga, i)) };
        let vb: Value = unsafe { heap.read(elem_addr(&gb, i)) };
        let ord = va.compare(vb, heap, symbols);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ga.length.cmp(&gb.length)
}

pub(super) fn release_contents(heap: &mut Tlsf, symbols: &SymbolTable, addr: Addr) {
    let grow = read_grow(heap, addr);
    for i in 0..grow.length {
        let value: Value = unsafe { heap.read(elem_addr(&grow, i)) };
        value.release(heap, symbols);
    }
    if !grow.data.is_null() {
        heap.free(grow.data);
    }
}
