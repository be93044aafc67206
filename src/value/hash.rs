// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Associative container, sharing the array's contiguous-buffer layout.
//!
//! Lookup is linear scan over key/value pairs, as the data model
//! mandates: "a re-index hook reserved for a future hashed
//! implementation." Deletion preserves insertion order of the remaining
//! entries.

#[cfg(test)]
mod hash_test;

use super::growable::{self, GrowHeader};
use super::header::{Header, Tag};
use super::symbol::SymbolTable;
use super::Value;
use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};
use core::cmp::Ordering;
use core::mem::size_of;

const BLOCK_SIZE: usize = super::header::HEADER_SIZE + growable::HEADER_SIZE;
const PAIR_SIZE: usize = 2 * size_of::<Value>();
const GROWTH: u16 = 6;

fn read_grow(heap: &Tlsf, addr: Addr) -> GrowHeader {
    let bytes: [u8; growable::HEADER_SIZE] = unsafe { heap.read(addr.add(super::header::HEADER_SIZE as u16)) };
    GrowHeader::decode(bytes)
}

fn write_grow(heap: &mut Tlsf, addr: Addr, grow: GrowHeader) {
    unsafe { heap.write(addr.add(super::header::HEADER_SIZE as u16), grow.encode()) };
}

fn key_addr(grow: &GrowHeader, index: u16) -> Addr {
    grow.data.add(index * PAIR_SIZE as u16)
}

fn value_addr(grow: &GrowHeader, index: u16) -> Addr {
    key_addr(grow, index).add(size_of::<Value>() as u16)
}

/// Allocate a new, empty hash owned by `vm_id`.
///
/// # Errors
///
/// Returns [`AllocError`] if the pool has no room for the fixed header.
pub fn new(heap: &mut Tlsf, vm_id: VmId) -> Result<Addr, AllocError> {
    let addr = heap.alloc(BLOCK_SIZE, vm_id)?;
    unsafe { heap.write(addr, Header::new(Tag::Hash, vm_id.as_u8()).encode()) };
    write_grow(heap, addr, GrowHeader::empty());
    Ok(addr)
}

#[must_use]
pub fn len(heap: &Tlsf, addr: Addr) -> u16 {
    read_grow(heap, addr).length
}

fn find_slot(heap: &Tlsf, symbols: &SymbolTable, grow: &GrowHeader, key: Value) -> Option<u16> {
    (0..grow.length).find(|&i| {
        let existing: Value = unsafe { heap.read(key_addr(grow, i)) };
        existing.equals(key, heap, symbols)
    })
}

/// Look up `key`, returning a borrowed value the caller must `dup` before
/// storing elsewhere.
#[must_use]
pub fn get(heap: &Tlsf, symbols: &SymbolTable, addr: Addr, key: Value) -> Option<Value> {
    let grow = read_grow(heap, addr);
    find_slot(heap, symbols, &grow, key).map(|slot| unsafe { heap.read(value_addr(&grow, slot)) })
}

/// Insert or overwrite `key => value`. Takes ownership of both (the
/// existing value, if any, is released).
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn insert(
    heap: &mut Tlsf,
    symbols: &SymbolTable,
    vm_id: VmId,
    addr: Addr,
    key: Value,
    value: Value,
) -> Result<(), AllocError> {
    let mut grow = read_grow(heap, addr);
    if let Some(slot) = find_slot(heap, symbols, &grow, key) {
        let old: Value = unsafe { heap.read(value_addr(&grow, slot)) };
        old.release(heap, symbols);
        key.release(heap, symbols); // caller's key is redundant with the stored one
        unsafe { heap.write(value_addr(&grow, slot), value) };
        return Ok(());
    }

    growable::ensure_capacity(heap, &mut grow, grow.length + 1, PAIR_SIZE, GROWTH, vm_id)?;
    let slot = grow.length;
    unsafe {
        heap.write(key_addr(&grow, slot), key);
        heap.write(value_addr(&grow, slot), value);
    }
    grow.length += 1;
    write_grow(heap, addr, grow);
    Ok(())
}

/// Remove `key`, returning its value and preserving the insertion order of
/// the remaining entries.
pub fn remove(heap: &mut Tlsf, symbols: &SymbolTable, addr: Addr, key: Value) -> Option<Value> {
    let mut grow = read_grow(heap, addr);
    let slot = find_slot(heap, symbols, &grow, key)?;
    let removed_key: Value = unsafe { heap.read(key_addr(&grow, slot)) };
    let removed_value: Value = unsafe { heap.read(value_addr(&grow, slot)) };
    removed_key.release(heap, symbols);

    for i in slot..grow.length - 1 {
        let k: Value = unsafe { heap.read(key_addr(&grow, i + 1)) };
        let v: Value = unsafe { heap.read(value_addr(&grow, i + 1)) };
        unsafe {
            heap.write(key_addr(&grow, i), k);
            heap.write(value_addr(&grow, i), v);
        }
    }
    grow.length -= 1;
    write_grow(heap, addr, grow);
    Some(removed_value)
}

/// Read-only access to the key/value pair at `index`, for callers (such
/// as `inspect`) that want to walk every entry without allocating a
/// fresh keys array.
#[must_use]
pub fn entry(heap: &Tlsf, addr: Addr, index: u16) -> (Value, Value) {
    let grow = read_grow(heap, addr);
    unsafe { (heap.read(key_addr(&grow, index)), heap.read(value_addr(&grow, index))) }
}

/// Build a fresh array of this hash's keys, each duplicated.
///
/// # Errors
///
/// Returns [`AllocError`] if allocating the result array fails.
pub fn keys(heap: &mut Tlsf, vm_id: VmId, addr: Addr) -> Result<Addr, AllocError> {
    let grow = read_grow(heap, addr);
    let result = super::array::new(heap, vm_id)?;
    for i in 0..grow.length {
        let key: Value = unsafe { heap.read(key_addr(&grow, i)) };
        super::array::push(heap, vm_id, result, key.dup(heap))?;
    }
    Ok(result)
}

/// Structural equality: same number of pairs and every key in `a` maps to
/// an equal value in `b`.
#[must_use]
fn pairs_equal(heap: &Tlsf, symbols: &SymbolTable, a: Addr, b: Addr) -> bool {
    let ga = read_grow(heap, a);
    let gb = read_grow(heap, b);
    if ga.length != gb.length {
        return false;
    }
    (0..ga.length).all(|i| {
        let key: Value = unsafe { heap.read(key_addr(&ga, i)) };
        let val: Value = unsafe { heap.read(value_addr(&ga, i)) };
        match get(heap, symbols, b, key) {
            Some(other) => val.equals(other, heap, symbols),
            None => false,
        }
    })
}

/// Hashes have no natural total order; equal hashes compare `Equal`,
/// unequal ones fall back to a deterministic address-based ordering.
#[must_use]
pub fn compare(heap: &Tlsf, symbols: &SymbolTable, a: Addr, b: Addr) -> Ordering {
    if pairs_equal(heap, symbols, a, b) {
        Ordering::Equal
    } else {
        a.cmp(&b)
    }
}

pub(super) fn release_contents(heap: &mut Tlsf, symbols: &SymbolTable, addr: Addr) {
    let grow = read_grow(heap, addr);
    for i in 0..grow.length {
        let key: Value = unsafe { heap.read(key_addr(&grow, i)) };
        let value: Value = unsafe { heap.read(value_addr(&grow, i)) };
        key.release(heap, symbols);
        value.release(heap, symbols);
    }
    if !grow.data.is_null() {
        heap.free(grow.data);
    }
}
