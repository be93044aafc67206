// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Pool-relative addressing and VM/task identity.
//!
//! The allocator hands out offsets into a single caller-supplied byte
//! buffer rather than host pointers, so the whole core addresses heap
//! objects through [`Addr`] instead of raw pointers. This keeps the
//! allocator free of any pointer provenance and lets the same code run
//! against a boxed buffer on the host or a linker-placed array on a
//! microcontroller.

#[cfg(test)]
mod addr_test;

use core::fmt;

/// Offset, in bytes, from the start of the allocator's backing buffer.
///
/// Bounded to `u16` per the allocator's default `memsize` width (see
/// `alloc::tlsf`), which caps a single pool at 64 KiB.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Addr(u16);

impl Addr {
    /// Sentinel meaning "no address" (used for list terminators and
    /// `prev_physical_offset` on the first block). The top of the 64 KiB
    /// range is reserved for this, so pools must stay below it.
    pub const NULL: Self = Self(u16::MAX);

    #[inline]
    #[must_use]
    pub const fn new(offset: u16) -> Self {
        Self(offset)
    }

    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline]
    #[must_use]
    pub const fn add(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }

    #[inline]
    #[must_use]
    pub const fn sub(self, n: u16) -> Self {
        Self(self.0.wrapping_sub(n))
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Addr(null)")
        } else {
            write!(f, "Addr(0x{:04x})", self.0)
        }
    }
}

/// Identifier of the task (VM instance) that owns a heap allocation.
///
/// `VmId(0)` is reserved for allocations owned by the process itself
/// (class objects, methods, interned symbol strings, global/constant
/// tables) rather than any single task, per the data model invariants.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct VmId(u8);

impl VmId {
    /// The process-owned pseudo task.
    pub const PROCESS: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_process_owned(self) -> bool {
        self.0 == Self::PROCESS.0
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm{}", self.0)
    }
}
