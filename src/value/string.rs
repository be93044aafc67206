// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Byte-string container: a length-prefixed, NUL-terminated buffer so a
//! string's contents can also be handed to C-style APIs without copying.

#[cfg(test)]
mod string_test;

use super::growable::{self, GrowHeader};
use super::header::{Header, Tag};
use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};
use core::cmp::Ordering;

const BLOCK_SIZE: usize = super::header::HEADER_SIZE + growable::HEADER_SIZE;

/// Bytes added to capacity each time a string must grow.
pub const GROWTH: u16 = 8;

const WHITESPACE: [u8; 6] = [b' ', b'\t', b'\r', b'\n', 0x0c, 0x0b];

fn read_grow(heap: &Tlsf, addr: Addr) -> GrowHeader {
    let bytes: [u8; growable::HEADER_SIZE] = unsafe { heap.read(addr.add(super::header::HEADER_SIZE as u16)) };
    GrowHeader::decode(bytes)
}

fn write_grow(heap: &mut Tlsf, addr: Addr, grow: GrowHeader) {
    unsafe { heap.write(addr.add(super::header::HEADER_SIZE as u16), grow.encode()) };
}

fn set_nul(heap: &mut Tlsf, grow: &GrowHeader) {
    unsafe { heap.write(grow.data.add(grow.length), 0u8) };
}

/// Allocate a new string holding a copy of `bytes`.
///
/// # Errors
///
/// Returns [`AllocError`] if the pool cannot hold the header or contents.
pub fn new(heap: &mut Tlsf, vm_id: VmId, bytes: &[u8]) -> Result<Addr, AllocError> {
    let addr = heap.alloc(BLOCK_SIZE, vm_id)?;
    unsafe { heap.write(addr, Header::new(Tag::String, vm_id.as_u8()).encode()) };
    let mut grow = GrowHeader::empty();
    // always reserve room for the trailing NUL, even for an empty string
    growable::ensure_capacity(heap, &mut grow, bytes.len() as u16 + 1, 1, GROWTH, vm_id)?;
    heap.slice_mut(grow.data, bytes.len())[..].copy_from_slice(bytes);
    grow.length = bytes.len() as u16;
    set_nul(heap, &grow);
    write_grow(heap, addr, grow);
    Ok(addr)
}

#[must_use]
pub fn len(heap: &Tlsf, addr: Addr) -> u16 {
    read_grow(heap, addr).length
}

#[must_use]
pub fn bytes<'a>(heap: &'a Tlsf, addr: Addr) -> &'a [u8] {
    let grow = read_grow(heap, addr);
    heap.slice(grow.data, grow.length as usize)
}

/// Append `more` in place.
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn append(heap: &mut Tlsf, vm_id: VmId, addr: Addr, more: &[u8]) -> Result<(), AllocError> {
    let mut grow = read_grow(heap, addr);
    let new_len = grow.length + more.len() as u16;
    growable::ensure_capacity(heap, &mut grow, new_len + 1, 1, GROWTH, vm_id)?;
    heap.slice_mut(grow.data.add(grow.length), more.len()).copy_from_slice(more);
    grow.length = new_len;
    set_nul(heap, &grow);
    write_grow(heap, addr, grow);
    Ok(())
}

fn resolve_index(idx: i32, len: u16) -> Option<u16> {
    let len = i32::from(len);
    let real = if idx < 0 { idx + len } else { idx };
    if real < 0 || real >= len { None } else { Some(real as u16) }
}

/// Build a new string holding `count` bytes starting at `idx` (negative
/// indices count from the end). Returns `None` if `idx` is out of range.
///
/// # Errors
///
/// Returns [`AllocError`] if allocating the result fails.
pub fn slice(heap: &mut Tlsf, vm_id: VmId, addr: Addr, idx: i32, count: u16) -> Result<Option<Addr>, AllocError> {
    let grow = read_grow(heap, addr);
    let Some(start) = resolve_index(idx, grow.length) else {
        return Ok(None);
    };
    let available = grow.length - start;
    let take = count.min(available);
    let slice_bytes: alloc_crate::vec::Vec<u8> = heap.slice(grow.data.add(start), take as usize).to_vec();
    new(heap, vm_id, &slice_bytes).map(Some)
}

/// Byte offset of the first occurrence of `needle`, or `None`.
#[must_use]
pub fn index_of(heap: &Tlsf, addr: Addr, needle: &[u8]) -> Option<u16> {
    let hay = bytes(heap, addr);
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| &hay[i..i + needle.len()] == needle).map(|i| i as u16)
}

/// Remove leading and trailing whitespace in place, returning the new
/// length.
pub fn strip(heap: &mut Tlsf, addr: Addr) -> u16 {
    let grow = read_grow(heap, addr);
    let data = heap.slice(grow.data, grow.length as usize);
    let mut start = 0usize;
    let mut end = data.len();
    while start < end && WHITESPACE.contains(&data[start]) {
        start += 1;
    }
    while end > start && WHITESPACE.contains(&data[end - 1]) {
        end -= 1;
    }
    let new_len = (end - start) as u16;
    if start > 0 {
        for i in 0..new_len as usize {
            let b = heap.slice(grow.data.add((start + i) as u16), 1)[0];
            heap.slice_mut(grow.data.add(i as u16), 1)[0] = b;
        }
    }
    let mut grow = grow;
    grow.length = new_len;
    set_nul(heap, &grow);
    write_grow(heap, addr, grow);
    new_len
}

/// Remove one trailing line terminator (`"\r\n"`, `"\n"`, or `"\r"`) in
/// place, returning the new length.
pub fn chomp(heap: &mut Tlsf, addr: Addr) -> u16 {
    let mut grow = read_grow(heap, addr);
    if grow.length == 0 {
        return 0;
    }
    let data = heap.slice(grow.data, grow.length as usize);
    let trim = if grow.length >= 2 && &data[grow.length as usize - 2..] == b"\r\n" {
        2
    } else if data[grow.length as usize - 1] == b'\n' || data[grow.length as usize - 1] == b'\r' {
        1
    } else {
        0
    };
    grow.length -= trim;
    set_nul(heap, &grow);
    write_grow(heap, addr, grow);
    grow.length
}

#[must_use]
pub fn compare(heap: &Tlsf, a: Addr, b: Addr) -> Ordering {
    bytes(heap, a).cmp(bytes(heap, b))
}
