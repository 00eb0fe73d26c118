// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CRC-32 computation for the FINGERPRINT attribute.

use crc::{Crc, CRC_32_ISO_HDLC};

/// The value XOR-ed into the CRC-32 to produce the FINGERPRINT value.
pub const XOR_CONSTANT: u32 = 0x5354_554E;

/// Compute the FINGERPRINT value of a specified block of data: the CRC-32 of `data` XOR-ed
/// with [`XOR_CONSTANT`].
///
/// # Examples
/// ```
/// # use stun_wire::attribute::fingerprint;
/// let value = [99; 4];
/// assert_eq!(fingerprint::compute(&value), 0xd82dfa0e ^ 0x5354554e);
/// ```
pub fn compute(data: &[u8]) -> u32 {
    const CRC_ALGO: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);
    CRC_ALGO.checksum(data) ^ XOR_CONSTANT
}
