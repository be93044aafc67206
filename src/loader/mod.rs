// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Parses a compiled bytecode image into an in-memory [`Irep`] tree.
//!
//! The image is consumed bit-exact and big-endian throughout; this module
//! does not verify bytecode beyond the file-header sanity check described
//! by the error taxonomy. Pool string and symbol bytes are borrowed
//! directly from the image buffer, which must outlive every `Irep` parsed
//! from it.

mod cursor;

use crate::alloc_crate::vec::Vec;
use crate::error::LoadError;
use cursor::Cursor;

const MAGIC: &[u8; 4] = b"RITE";
const FORMAT_VERSION: &[u8; 4] = b"0004";
const IREP_VERSION: &[u8; 4] = b"0000";
const SECTION_ALIGN: usize = 8;
const RECORD_ALIGN: usize = 4;

const SECTION_IREP: &[u8; 4] = b"IREP";
const SECTION_LVAR: &[u8; 4] = b"LVAR";
const SECTION_END: &[u8; 4] = b"END\0";

/// One entry of an irep's literal pool.
#[derive(Debug, Clone, Copy)]
pub enum PoolValue<'img> {
    String(&'img [u8]),
    Fixnum(i32),
    #[cfg(feature = "float")]
    Float(f64),
    /// A float literal encountered while the `float` feature is disabled.
    #[cfg(not(feature = "float"))]
    FloatUnsupported,
}

/// One parsed irep record. Code, pool payloads, and symbol bytes are
/// borrowed from the image; children are owned and nested depth-first.
pub struct Irep<'img> {
    pub nlocals: u16,
    pub nregs: u16,
    pub code: &'img [u8],
    pub pool: Vec<PoolValue<'img>>,
    pub symbols: Vec<&'img [u8]>,
    pub reps: Vec<Irep<'img>>,
}

impl<'img> Irep<'img> {
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.code.len() / 4
    }
}

fn parse_pool_entry<'img>(cursor: &mut Cursor<'img>) -> Result<PoolValue<'img>, LoadError> {
    let kind = cursor.read_u8()?;
    let length = cursor.read_u16()?;
    let payload = cursor.read_bytes(length as usize)?;
    match kind {
        0 => Ok(PoolValue::String(payload)),
        1 => {
            let text = core::str::from_utf8(payload).map_err(|_| LoadError::Malformed)?;
            let n: i32 = text.parse().map_err(|_| LoadError::Malformed)?;
            Ok(PoolValue::Fixnum(n))
        }
        2 => {
            #[cfg(feature = "float")]
            {
                let text = core::str::from_utf8(payload).map_err(|_| LoadError::Malformed)?;
                let f: f64 = text.parse().map_err(|_| LoadError::Malformed)?;
                Ok(PoolValue::Float(f))
            }
            #[cfg(not(feature = "float"))]
            {
                Ok(PoolValue::FloatUnsupported)
            }
        }
        _ => Err(LoadError::Malformed),
    }
}

fn parse_irep<'img>(cursor: &mut Cursor<'img>) -> Result<Irep<'img>, LoadError> {
    let _record_size = cursor.read_u32()?;
    let nlocals = cursor.read_u16()?;
    let nregs = cursor.read_u16()?;
    let rlen = cursor.read_u16()?;
    let ilen = cursor.read_u32()?;
    cursor.align_to(RECORD_ALIGN)?;
    let code = cursor.read_bytes(ilen as usize * 4)?;

    let plen = cursor.read_u32()?;
    let mut pool = Vec::with_capacity(plen as usize);
    for _ in 0..plen {
        pool.push(parse_pool_entry(cursor)?);
    }

    let slen = cursor.read_u32()?;
    let mut symbols = Vec::with_capacity(slen as usize);
    for _ in 0..slen {
        let length = cursor.read_u16()?;
        let name = cursor.read_bytes(length as usize)?;
        cursor.skip(1)?; // trailing NUL
        symbols.push(name);
    }

    let mut reps = Vec::with_capacity(rlen as usize);
    for _ in 0..rlen {
        reps.push(parse_irep(cursor)?);
    }

    Ok(Irep {
        nlocals,
        nregs,
        code,
        pool,
        symbols,
        reps,
    })
}

/// Flatten an irep tree into a pre-order sequence of references, so a
/// `Value::Proc` created by `LAMBDA` can address a method body by a stable
/// index rather than a path through nested `reps` arrays.
#[must_use]
pub fn flatten<'img>(root: &'img Irep<'img>) -> Vec<&'img Irep<'img>> {
    let mut out = Vec::new();
    flatten_into(root, &mut out);
    out
}

fn flatten_into<'img>(irep: &'img Irep<'img>, out: &mut Vec<&'img Irep<'img>>) {
    out.push(irep);
    for child in &irep.reps {
        flatten_into(child, out);
    }
}

/// Parse a full bytecode image, returning its root [`Irep`].
///
/// # Errors
///
/// Returns [`LoadError::BadHeader`] if the magic or format version does
/// not match, [`LoadError::Truncated`] if the image ends early, and
/// [`LoadError::Malformed`] for structurally invalid pool/symbol data.
pub fn parse_image(image: &[u8]) -> Result<Irep<'_>, LoadError> {
    let mut cursor = Cursor::new(image);
    cursor.expect_tag(MAGIC)?;
    cursor.expect_tag(FORMAT_VERSION)?;
    cursor.skip(2)?; // CRC, ignored
    let _total_size = cursor.read_u32()?;
    cursor.skip(4)?; // producer tag, e.g. "MATZ"
    cursor.skip(4)?; // producer version, e.g. "0000"

    let mut root: Option<Irep<'_>> = None;
    loop {
        cursor.align_to(SECTION_ALIGN)?;
        let id = cursor.read_bytes(4)?;
        let section_len = cursor.read_u32()?;
        if id == SECTION_END {
            break;
        } else if id == SECTION_IREP {
            cursor.expect_tag(IREP_VERSION)?;
            root = Some(parse_irep(&mut cursor)?);
        } else if id == SECTION_LVAR {
            let body_len = (section_len as usize).saturating_sub(8);
            cursor.skip(body_len)?;
        } else {
            return Err(LoadError::BadHeader);
        }
    }

    root.ok_or(LoadError::Malformed)
}
