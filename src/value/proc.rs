// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Callable bodies: either a native method (resolved by index into the
//! intrinsic dispatch table) or a bytecode method (resolved by index into
//! the loaded irep tree).
//!
//! A proc carries no captured upvalue slots of its own. Closures reach
//! their enclosing scope by walking the call-info chain at
//! `GETUPVAR`/`SETUPVAR` time, not by copying values into the proc when
//! it is created — the same indirection the class table uses for method
//! bodies.

#[cfg(test)]
mod proc_test;

use super::header::{Header, Tag};
use super::symbol::SymbolTable;
use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};

const KIND_NATIVE: u8 = 0;
const KIND_BYTECODE: u8 = 1;

const KIND_OFFSET: usize = 0;
const INDEX_OFFSET: usize = 1;
const BODY_SIZE: usize = 1 + 2;
const BLOCK_SIZE: usize = super::header::HEADER_SIZE + BODY_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcKind {
    /// Index into the intrinsic native dispatch table.
    Native(u16),
    /// Index into the loaded irep tree.
    Bytecode(u16),
}

fn body(addr: Addr) -> Addr {
    addr.add(super::header::HEADER_SIZE as u16)
}

fn new_with_kind(heap: &mut Tlsf, vm_id: VmId, kind_tag: u8, index: u16) -> Result<Addr, AllocError> {
    let addr = heap.alloc(BLOCK_SIZE, vm_id)?;
    unsafe {
        heap.write(addr, Header::new(Tag::Proc, vm_id.as_u8()).encode());
        heap.write(body(addr).add(KIND_OFFSET as u16), kind_tag);
        heap.write(body(addr).add(INDEX_OFFSET as u16), index);
    }
    Ok(addr)
}

/// # Errors
///
/// Returns [`AllocError`] if the pool has no room.
pub fn new_native(heap: &mut Tlsf, vm_id: VmId, native_index: u16) -> Result<Addr, AllocError> {
    new_with_kind(heap, vm_id, KIND_NATIVE, native_index)
}

/// # Errors
///
/// Returns [`AllocError`] if the pool has no room.
pub fn new_bytecode(heap: &mut Tlsf, vm_id: VmId, irep_index: u16) -> Result<Addr, AllocError> {
    new_with_kind(heap, vm_id, KIND_BYTECODE, irep_index)
}

#[must_use]
pub fn kind(heap: &Tlsf, addr: Addr) -> ProcKind {
    let tag: u8 = unsafe { heap.read(body(addr).add(KIND_OFFSET as u16)) };
    let index: u16 = unsafe { heap.read(body(addr).add(INDEX_OFFSET as u16)) };
    match tag {
        KIND_NATIVE => ProcKind::Native(index),
        _ => ProcKind::Bytecode(index),
    }
}

pub(super) fn release_contents(_heap: &mut Tlsf, _symbols: &SymbolTable, _addr: Addr) {
    // A proc body holds only scalar fields; nothing to release.
}
