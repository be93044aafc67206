// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # rite-core
//!
//! A register-based bytecode VM core for resource-constrained embedded
//! targets.
//!
//! This crate provides:
//! - A two-level segregated-fit allocator over a caller-supplied byte pool
//! - A tagged, reference-counted value system with array/hash/string/range/
//!   symbol/class containers
//! - A register-based interpreter for the RITE bytecode format
//! - A cooperative, priority-based task scheduler with mutexes
//!
//! The VM owns no memory of its own: the embedder hands it one byte buffer
//! for the heap and implements [`platform::Platform`] for console I/O and
//! interrupt control.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc as alloc_crate;

pub mod addr;
pub mod alloc;
pub mod error;
pub mod intrinsics;
pub mod loader;
pub mod opcode;
pub mod platform;
pub mod runtime;
pub mod sched;
pub mod value;
pub mod vm;

pub use addr::{Addr, VmId};
pub use error::ErrorCode;
pub use runtime::{Runtime, RuntimeError};

/// Crate version.
pub const VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
    Some(v) => v,
    None => "unknown",
};
