// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared growth logic for the containers that need a stable outer
//! address (so a `Value` holding it never dangles) backed by a
//! separately-allocated, independently resizable data buffer.
//!
//! Array, Hash, String, and an object's instance-variable table all
//! follow this shape: a small fixed-size header holds `{capacity, length,
//! data}`, and only `data` ever moves when the buffer grows. This mirrors
//! how the original allocator's `mrbc_realloc` is used in `c_array.c` and
//! `c_string.c` — the `RArray`/`RString` cell itself is never
//! reallocated, only the element/byte buffer behind it.

use crate::addr::{Addr, VmId};
use crate::alloc::{AllocError, Tlsf};

pub const HEADER_SIZE: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct GrowHeader {
    pub capacity: u16,
    pub length: u16,
    pub data: Addr,
}

impl GrowHeader {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            capacity: 0,
            length: 0,
            data: Addr::NULL,
        }
    }

    #[must_use]
    pub fn encode(self) -> [u8; HEADER_SIZE] {
        let cap = self.capacity.to_le_bytes();
        let len = self.length.to_le_bytes();
        let data = self.data.as_u16().to_le_bytes();
        [cap[0], cap[1], len[0], len[1], data[0], data[1]]
    }

    #[must_use]
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            capacity: u16::from_le_bytes([bytes[0], bytes[1]]),
            length: u16::from_le_bytes([bytes[2], bytes[3]]),
            data: Addr::new(u16::from_le_bytes([bytes[4], bytes[5]])),
        }
    }
}

/// Ensure `data` can hold at least `needed` elements of `elem_size` bytes,
/// growing by reallocating the data buffer (never the header) if not.
///
/// # Errors
///
/// Returns [`AllocError::OutOfMemory`] if no larger buffer is available;
/// `header` is left unchanged on failure.
pub fn ensure_capacity(
    heap: &mut Tlsf,
    header: &mut GrowHeader,
    needed: u16,
    elem_size: usize,
    growth: u16,
    vm_id: VmId,
) -> Result<(), AllocError> {
    if needed <= header.capacity {
        return Ok(());
    }
    let new_capacity = needed.max(header.capacity + growth);
    let new_data = if header.capacity == 0 {
        heap.alloc(new_capacity as usize * elem_size, vm_id)?
    } else {
        heap.realloc(header.data, new_capacity as usize * elem_size, vm_id)?
    };
    header.capacity = new_capacity;
    header.data = new_data;
    Ok(())
}
