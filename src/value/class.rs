// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Class table and object instances.
//!
//! Classes, like symbols, are process-wide and never torn down by
//! `free_all`: they live in a fixed-capacity table outside the allocator
//! pool. Methods form a singly-linked chain per class so redefinition
//! (re-opening a class) only has to prepend. Objects are ordinary
//! heap-backed values; their instance variables live in a sorted,
//! binary-searched buffer reachable through the object's [`super::growable::GrowHeader`].

#[cfg(test)]
mod class_test;

use super::growable::{self, GrowHeader};
use super::header::{Header, Tag};
use super::symbol::{SymbolId, SymbolTable};
use super::Value;
use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};
use core::mem::size_of;

/// Maximum number of classes a process may define.
pub const MAX_CLASSES: usize = 64;

/// Maximum number of methods across all classes.
pub const MAX_METHODS: usize = 512;

/// Class identifier. Never reference counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(u16);

impl ClassId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

#[derive(Clone, Copy)]
struct ClassEntry {
    name: SymbolId,
    super_class: Option<ClassId>,
    methods: Option<u16>,
}

#[derive(Clone, Copy)]
struct MethodEntry {
    name: SymbolId,
    body: Value,
    next: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassError {
    TableFull,
    MethodTableFull,
}

impl core::fmt::Display for ClassError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TableFull => write!(f, "class table is full"),
            Self::MethodTableFull => write!(f, "method table is full"),
        }
    }
}

/// The process-wide class and method registry.
pub struct ClassTable {
    classes: [Option<ClassEntry>; MAX_CLASSES],
    class_count: u16,
    methods: [Option<MethodEntry>; MAX_METHODS],
    method_count: u16,
}

impl ClassTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            classes: [None; MAX_CLASSES],
            class_count: 0,
            methods: [None; MAX_METHODS],
            method_count: 0,
        }
    }

    /// Define a new class named `name`, inheriting from `super_class`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::TableFull`] once [`MAX_CLASSES`] is reached.
    pub fn define_class(&mut self, name: SymbolId, super_class: Option<ClassId>) -> Result<ClassId, ClassError> {
        let idx = self.class_count as usize;
        if idx >= MAX_CLASSES {
            return Err(ClassError::TableFull);
        }
        self.classes[idx] = Some(ClassEntry {
            name,
            super_class,
            methods: None,
        });
        self.class_count += 1;
        Ok(ClassId::new(idx as u16))
    }

    fn entry(&self, class: ClassId) -> &ClassEntry {
        self.classes[class.as_u16() as usize].as_ref().expect("dangling class id")
    }

    #[must_use]
    pub fn name(&self, class: ClassId) -> SymbolId {
        self.entry(class).name
    }

    #[must_use]
    pub fn super_class(&self, class: ClassId) -> Option<ClassId> {
        self.entry(class).super_class
    }

    /// Define (or redefine) a method on `class`. Redefinition shadows the
    /// prior body; the old entry is left in the table unreachable, since
    /// method slots are never reclaimed.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::MethodTableFull`] once [`MAX_METHODS`] is
    /// reached.
    pub fn define_method(&mut self, class: ClassId, name: SymbolId, body: Value) -> Result<(), ClassError> {
        let idx = self.method_count as usize;
        if idx >= MAX_METHODS {
            return Err(ClassError::MethodTableFull);
        }
        let head = self.entry(class).methods;
        self.methods[idx] = Some(MethodEntry { name, body, next: head });
        self.method_count += 1;
        self.classes[class.as_u16() as usize].as_mut().expect("dangling class id").methods = Some(idx as u16);
        Ok(())
    }

    /// Resolve `name` starting at `class` and walking the superclass
    /// chain, returning the method body (a `Value::Proc`) if found.
    #[must_use]
    pub fn lookup_method(&self, class: ClassId, name: SymbolId) -> Option<Value> {
        let mut current = Some(class);
        while let Some(c) = current {
            let mut slot = self.entry(c).methods;
            while let Some(idx) = slot {
                let method = self.methods[idx as usize].expect("dangling method id");
                if method.name == name {
                    return Some(method.body);
                }
                slot = method.next;
            }
            current = self.entry(c).super_class;
        }
        None
    }

    /// Whether `ancestor` appears in `class`'s superclass chain (or is
    /// `class` itself).
    #[must_use]
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.entry(c).super_class;
        }
        false
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

// --- Object instances -------------------------------------------------

const IVAR_PAIR_SIZE: usize = size_of::<SymbolId>() + size_of::<Value>();
const CLASS_ID_SIZE: usize = size_of::<u16>();
const BLOCK_SIZE: usize = super::header::HEADER_SIZE + CLASS_ID_SIZE + growable::HEADER_SIZE;
const IVAR_GROWTH: u16 = 6;

fn class_id_addr(addr: Addr) -> Addr {
    addr.add(super::header::HEADER_SIZE as u16)
}

fn grow_addr(addr: Addr) -> Addr {
    class_id_addr(addr).add(CLASS_ID_SIZE as u16)
}

fn read_grow(heap: &Tlsf, addr: Addr) -> GrowHeader {
    let bytes: [u8; growable::HEADER_SIZE] = unsafe { heap.read(grow_addr(addr)) };
    GrowHeader::decode(bytes)
}

fn write_grow(heap: &mut Tlsf, addr: Addr, grow: GrowHeader) {
    unsafe { heap.write(grow_addr(addr), grow.encode()) };
}

fn ivar_key_addr(grow: &GrowHeader, index: u16) -> Addr {
    grow.data.add(index * IVAR_PAIR_SIZE as u16)
}

fn ivar_value_addr(grow: &GrowHeader, index: u16) -> Addr {
    ivar_key_addr(grow, index).add(size_of::<SymbolId>() as u16)
}

/// Allocate a new instance of `class`.
///
/// # Errors
///
/// Returns [`AllocError`] if the pool has no room for the fixed header.
pub fn new_object(heap: &mut Tlsf, vm_id: VmId, class: ClassId) -> Result<Addr, AllocError> {
    let addr = heap.alloc(BLOCK_SIZE, vm_id)?;
    unsafe {
        heap.write(addr, Header::new(Tag::Object, vm_id.as_u8()).encode());
        heap.write(class_id_addr(addr), class.as_u16());
    }
    write_grow(heap, addr, GrowHeader::empty());
    Ok(addr)
}

#[must_use]
pub fn class_of(heap: &Tlsf, addr: Addr) -> ClassId {
    let id: u16 = unsafe { heap.read(class_id_addr(addr)) };
    ClassId::new(id)
}

fn find_ivar(heap: &Tlsf, grow: &GrowHeader, name: SymbolId) -> Result<u16, u16> {
    let mut lo = 0u16;
    let mut hi = grow.length;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let key: SymbolId = unsafe { heap.read(ivar_key_addr(grow, mid)) };
        match key.cmp(&name) {
            core::cmp::Ordering::Less => lo = mid + 1,
            core::cmp::Ordering::Greater => hi = mid,
            core::cmp::Ordering::Equal => return Ok(mid),
        }
    }
    Err(lo)
}

/// Read an instance variable, or `Nil` if unset.
#[must_use]
pub fn get_ivar(heap: &Tlsf, addr: Addr, name: SymbolId) -> Value {
    let grow = read_grow(heap, addr);
    match find_ivar(heap, &grow, name) {
        Ok(slot) => unsafe { heap.read(ivar_value_addr(&grow, slot)) },
        Err(_) => Value::Nil,
    }
}

/// Set an instance variable, keeping the buffer sorted by symbol id for
/// binary search. Takes ownership of `value`; any previous value at that
/// slot is released.
///
/// # Errors
///
/// Returns [`AllocError`] if growing the backing buffer fails.
pub fn set_ivar(
    heap: &mut Tlsf,
    symbols: &SymbolTable,
    vm_id: VmId,
    addr: Addr,
    name: SymbolId,
    value: Value,
) -> Result<(), AllocError> {
    let mut grow = read_grow(heap, addr);
    match find_ivar(heap, &grow, name) {
        Ok(slot) => {
            let old: Value = unsafe { heap.read(ivar_value_addr(&grow, slot)) };
            old.release(heap, symbols);
            unsafe { heap.write(ivar_value_addr(&grow, slot), value) };
        }
        Err(slot) => {
            growable::ensure_capacity(heap, &mut grow, grow.length + 1, IVAR_PAIR_SIZE, IVAR_GROWTH, vm_id)?;
            for i in (slot..grow.length).rev() {
                let k: SymbolId = unsafe { heap.read(ivar_key_addr(&grow, i)) };
                let v: Value = unsafe { heap.read(ivar_value_addr(&grow, i)) };
                unsafe {
                    heap.write(ivar_key_addr(&grow, i + 1), k);
                    heap.write(ivar_value_addr(&grow, i + 1), v);
                }
            }
            unsafe {
                heap.write(ivar_key_addr(&grow, slot), name);
                heap.write(ivar_value_addr(&grow, slot), value);
            }
            grow.length += 1;
        }
    }
    write_grow(heap, addr, grow);
    Ok(())
}

pub(super) fn release_object_contents(heap: &mut Tlsf, symbols: &SymbolTable, addr: Addr) {
    let grow = read_grow(heap, addr);
    for i in 0..grow.length {
        let value: Value = unsafe { heap.read(ivar_value_addr(&grow, i)) };
        value.release(heap, symbols);
    }
    if !grow.data.is_null() {
        heap.free(grow.data);
    }
}
