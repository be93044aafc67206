// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for pool-relative addressing.

use super::{Addr, VmId};

#[test]
fn null_is_distinguishable() {
    assert!(Addr::NULL.is_null());
    assert!(!Addr::new(0).is_null());
    assert!(!Addr::new(1).is_null());
}

#[test]
fn arithmetic_wraps() {
    let a = Addr::new(10);
    assert_eq!(a.add(5).as_u16(), 15);
    assert_eq!(a.sub(5).as_u16(), 5);
    assert_eq!(Addr::new(0).sub(1), Addr::NULL);
}

#[test]
fn debug_format() {
    assert_eq!(format!("{:?}", Addr::new(0x10)), "Addr(0x0010)");
    assert_eq!(format!("{:?}", Addr::NULL), "Addr(null)");
}

#[test]
fn vm_id_process_owned() {
    assert!(VmId::PROCESS.is_process_owned());
    assert!(!VmId::new(1).is_process_owned());
    assert_eq!(VmId::new(3).as_u8(), 3);
}
