// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Binary primitives
//!
//! Big-endian integer access, length-prefixed buffers and the 4 byte alignment rule used by
//! every STUN attribute.  All reads are bounds checked and report
//! [`StunParseError::Truncated`] instead of panicking.
//!
//! # Examples
//!
//! ```
//! use stun_wire::wire;
//! let mut out = vec![];
//! wire::write_prefixed(&mut out, &[1, 2, 3]).unwrap();
//! wire::write_padding(&mut out, 3);
//! assert_eq!(out, [0, 3, 1, 2, 3, 0]);
//! assert_eq!(wire::read_prefixed(&out, 0).unwrap(), &[1, 2, 3]);
//! ```

use byteorder::{BigEndian, ByteOrder};

use crate::message::{StunParseError, StunWriteError};

/// The number of zero bytes required after `len` bytes of attribute value to reach the next
/// 4 byte boundary.
///
/// # Examples
///
/// ```
/// # use stun_wire::wire::padding;
/// assert_eq!(padding(0), 0);
/// assert_eq!(padding(1), 3);
/// assert_eq!(padding(4), 0);
/// assert_eq!(padding(7), 1);
/// ```
pub const fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// `len` rounded up to the next multiple of 4.
pub const fn padded_len(len: usize) -> usize {
    len + padding(len)
}

fn check_available(data: &[u8], offset: usize, len: usize) -> Result<(), StunParseError> {
    let end = offset.checked_add(len).ok_or(StunParseError::Truncated {
        expected: usize::MAX,
        actual: data.len(),
    })?;
    if end > data.len() {
        return Err(StunParseError::Truncated {
            expected: end,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Read a big-endian `u16` at `offset`.
pub fn read_u16(data: &[u8], offset: usize) -> Result<u16, StunParseError> {
    check_available(data, offset, 2)?;
    Ok(BigEndian::read_u16(&data[offset..]))
}

/// Read a big-endian `u32` at `offset`.
pub fn read_u32(data: &[u8], offset: usize) -> Result<u32, StunParseError> {
    check_available(data, offset, 4)?;
    Ok(BigEndian::read_u32(&data[offset..]))
}

/// Read a big-endian `u128` at `offset`.
pub fn read_u128(data: &[u8], offset: usize) -> Result<u128, StunParseError> {
    check_available(data, offset, 16)?;
    Ok(BigEndian::read_u128(&data[offset..]))
}

/// Borrow `len` bytes starting at `offset`.
pub fn read_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], StunParseError> {
    check_available(data, offset, len)?;
    Ok(&data[offset..offset + len])
}

/// Borrow a buffer that is preceded by its big-endian `u16` length at `offset`.
pub fn read_prefixed(data: &[u8], offset: usize) -> Result<&[u8], StunParseError> {
    let len = read_u16(data, offset)? as usize;
    read_slice(data, offset + 2, len)
}

/// Append a big-endian `u16`.
pub fn write_u16(dest: &mut Vec<u8>, value: u16) {
    let mut buf = [0; 2];
    BigEndian::write_u16(&mut buf, value);
    dest.extend_from_slice(&buf);
}

/// Append a big-endian `u32`.
pub fn write_u32(dest: &mut Vec<u8>, value: u32) {
    let mut buf = [0; 4];
    BigEndian::write_u32(&mut buf, value);
    dest.extend_from_slice(&buf);
}

/// Append a big-endian `u128`.
pub fn write_u128(dest: &mut Vec<u8>, value: u128) {
    let mut buf = [0; 16];
    BigEndian::write_u128(&mut buf, value);
    dest.extend_from_slice(&buf);
}

/// Append `value` preceded by its length as a big-endian `u16`.
///
/// # Errors
///
/// - When `value` is longer than `u16::MAX` bytes.
pub fn write_prefixed(dest: &mut Vec<u8>, value: &[u8]) -> Result<(), StunWriteError> {
    let len = u16::try_from(value.len()).map_err(|_| StunWriteError::TooLarge {
        expected: u16::MAX as usize,
        actual: value.len(),
    })?;
    write_u16(dest, len);
    dest.extend_from_slice(value);
    Ok(())
}

/// Append the zero bytes that align a value of `len` bytes.
pub fn write_padding(dest: &mut Vec<u8>, len: usize) {
    dest.resize(dest.len() + padding(len), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_rounds_to_four() {
        crate::tests::test_init_log();
        for n in 0..64 {
            let padded = padded_len(n);
            assert_eq!(padded % 4, 0);
            assert!(padded >= n);
            assert!(padded - n < 4);
            assert_eq!(padding(n), padded - n);
        }
    }

    #[test]
    fn read_past_end() {
        crate::tests::test_init_log();
        let data = [0x12, 0x34, 0x56];
        assert_eq!(read_u16(&data, 0).unwrap(), 0x1234);
        assert_eq!(read_u16(&data, 1).unwrap(), 0x3456);
        assert!(matches!(
            read_u16(&data, 2),
            Err(StunParseError::Truncated {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            read_u32(&data, 0),
            Err(StunParseError::Truncated {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            read_slice(&data, usize::MAX, 2),
            Err(StunParseError::Truncated { .. })
        ));
    }

    #[test]
    fn prefixed_length_past_end() {
        crate::tests::test_init_log();
        // advertises 8 bytes, only 2 present
        let data = [0x00, 0x08, 0xaa, 0xbb];
        assert!(matches!(
            read_prefixed(&data, 0),
            Err(StunParseError::Truncated {
                expected: 10,
                actual: 4
            })
        ));
    }

    #[test]
    fn write_integers() {
        crate::tests::test_init_log();
        let mut out = vec![];
        write_u16(&mut out, 0xf824);
        write_u32(&mut out, 0x2112a442);
        assert_eq!(out, [0xf8, 0x24, 0x21, 0x12, 0xa4, 0x42]);
        assert_eq!(read_u32(&out, 2).unwrap(), 0x2112a442);
    }

    #[test]
    fn prefixed_too_large() {
        crate::tests::test_init_log();
        let mut out = vec![];
        let value = vec![0; u16::MAX as usize + 1];
        assert!(matches!(
            write_prefixed(&mut out, &value),
            Err(StunWriteError::TooLarge { .. })
        ));
        assert!(out.is_empty());
    }
}
