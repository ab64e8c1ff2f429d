// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Length-prefixed little-endian primitives for the binary representation.
//!
//! ```text
//! string      : len (4) | UTF-8 bytes
//! string list : count (4) | string[]
//! section list: count (4) | (len (4) | bytes)[]
//! row index   : u64
//! capacity    : u64, saturating to usize::MAX on read
//! ```

use crate::error::{DatapointError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

/// A value type that can live in a grid column.
pub trait CellValue: Clone {
    /// Smallest encoded size, used to bound counts read from the wire.
    const MIN_WIRE_SIZE: usize;

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()>;

    fn read_from(r: &mut Cursor<&[u8]>) -> Result<Self>;
}

impl CellValue for f64 {
    const MIN_WIRE_SIZE: usize = 8;

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_f64::<LittleEndian>(*self)?;
        Ok(())
    }

    fn read_from(r: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(r.read_f64::<LittleEndian>()?)
    }
}

impl CellValue for String {
    const MIN_WIRE_SIZE: usize = 4;

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_str(buf, self)
    }

    fn read_from(r: &mut Cursor<&[u8]>) -> Result<Self> {
        read_str(r)
    }
}

fn remaining(r: &Cursor<&[u8]>) -> usize {
    let len = r.get_ref().len() as u64;
    len.saturating_sub(r.position()) as usize
}

/// Read a u32 element count and check that `count * min_size` bytes can
/// still follow, so corrupt input cannot trigger huge allocations.
pub(crate) fn read_count(r: &mut Cursor<&[u8]>, min_size: usize) -> Result<usize> {
    let count = r.read_u32::<LittleEndian>()? as usize;
    let needed = count.saturating_mul(min_size);
    if needed > remaining(r) {
        return Err(DatapointError::InvalidFormat(format!(
            "count {} needs {} bytes, {} left",
            count,
            needed,
            remaining(r)
        )));
    }
    Ok(count)
}

fn read_bytes(r: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = read_count(r, 1)?;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Length or count prefix; fails instead of truncating.
pub(crate) fn to_u32(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| DatapointError::InvalidFormat(format!("{} exceeds u32", n)))
}

pub(crate) fn write_index(buf: &mut Vec<u8>, ridx: usize) -> Result<()> {
    buf.write_u64::<LittleEndian>(ridx as u64)?;
    Ok(())
}

pub(crate) fn read_index(r: &mut Cursor<&[u8]>) -> Result<usize> {
    let raw = r.read_u64::<LittleEndian>()?;
    usize::try_from(raw)
        .map_err(|_| DatapointError::InvalidFormat(format!("row index {} exceeds usize", raw)))
}

pub(crate) fn write_capacity(buf: &mut Vec<u8>, capacity: usize) -> Result<()> {
    buf.write_u64::<LittleEndian>(capacity as u64)?;
    Ok(())
}

pub(crate) fn read_capacity(r: &mut Cursor<&[u8]>) -> Result<usize> {
    let raw = r.read_u64::<LittleEndian>()?;
    Ok(usize::try_from(raw).unwrap_or(usize::MAX))
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    buf.write_u32::<LittleEndian>(to_u32(bytes.len())?)?;
    buf.write_all(bytes)?;
    Ok(())
}

pub(crate) fn write_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    write_bytes(buf, s.as_bytes())
}

pub(crate) fn read_str(r: &mut Cursor<&[u8]>) -> Result<String> {
    Ok(String::from_utf8(read_bytes(r)?)?)
}

pub(crate) fn encode_string_list(items: &[&str]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(to_u32(items.len())?)?;
    for item in items {
        write_str(&mut buf, item)?;
    }
    Ok(buf)
}

pub(crate) fn decode_string_list(bytes: &[u8]) -> Result<Vec<String>> {
    let mut r = Cursor::new(bytes);
    let count = read_count(&mut r, 4)?;
    (0..count).map(|_| read_str(&mut r)).collect()
}

pub(crate) fn encode_sections(sections: &[&[u8]]) -> Result<Vec<u8>> {
    let total: usize = sections.iter().map(|s| s.len() + 4).sum();
    let mut buf = Vec::with_capacity(total + 4);
    buf.write_u32::<LittleEndian>(to_u32(sections.len())?)?;
    for section in sections {
        write_bytes(&mut buf, section)?;
    }
    Ok(buf)
}

pub(crate) fn decode_sections(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut r = Cursor::new(bytes);
    let count = read_count(&mut r, 4)?;
    (0..count).map(|_| read_bytes(&mut r)).collect()
}

/// Fail unless the cursor consumed every byte.
pub(crate) fn expect_end(r: &Cursor<&[u8]>, what: &str) -> Result<()> {
    match remaining(r) {
        0 => Ok(()),
        n => Err(DatapointError::InvalidFormat(format!(
            "{} trailing bytes after {}",
            n, what
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_list_roundtrip() {
        let encoded = encode_string_list(&["OZ-1", "POLLUDRONE", "relative"]).unwrap();
        assert_eq!(&encoded[..4], &3u32.to_le_bytes());
        let decoded = decode_string_list(&encoded).unwrap();
        assert_eq!(decoded, vec!["OZ-1", "POLLUDRONE", "relative"]);
    }

    #[test]
    fn test_sections_roundtrip() {
        let encoded = encode_sections(&[b"abc", b"", b"z"]).unwrap();
        let decoded = decode_sections(&encoded).unwrap();
        assert_eq!(decoded, vec![b"abc".to_vec(), Vec::new(), b"z".to_vec()]);
    }

    #[test]
    fn test_oversized_count_rejected() {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(u32::MAX).unwrap();
        bytes.extend_from_slice(b"tiny");
        let err = decode_sections(&bytes).unwrap_err();
        assert!(matches!(err, DatapointError::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(1).unwrap();
        bytes.write_u32::<LittleEndian>(2).unwrap();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let err = decode_string_list(&bytes).unwrap_err();
        assert!(matches!(err, DatapointError::Utf8(_)));
    }

    #[test]
    fn test_counts_never_truncate() {
        assert_eq!(to_u32(7).unwrap(), 7);
        let err = to_u32(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, DatapointError::InvalidFormat(_)));
    }

    #[test]
    fn test_row_index_keeps_high_bits() {
        let ridx = u32::MAX as usize + 5;
        let mut buf = Vec::new();
        write_index(&mut buf, ridx).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(read_index(&mut Cursor::new(&buf[..])).unwrap(), ridx);
    }

    #[test]
    fn test_capacity_saturates() {
        let mut buf = Vec::new();
        write_capacity(&mut buf, usize::MAX).unwrap();
        assert_eq!(read_capacity(&mut Cursor::new(&buf[..])).unwrap(), usize::MAX);
    }

    #[test]
    fn test_expect_end() {
        let bytes = [1u8, 2, 3];
        let mut r = Cursor::new(&bytes[..]);
        assert!(expect_end(&r, "test").is_err());
        r.set_position(3);
        assert!(expect_end(&r, "test").is_ok());
    }
}
