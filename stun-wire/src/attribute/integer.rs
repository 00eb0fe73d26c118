// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{BigEndian, ByteOrder};

use crate::message::StunParseError;

use super::check_len;

pub(super) fn encode_u16(value: u16) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub(super) fn encode_u32(value: u32) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

// RESPONSE-PORT and CHANNEL-NUMBER style values carry two reserved bytes after the value.
pub(super) fn decode_u16(data: &[u8]) -> Result<u16, StunParseError> {
    check_len(data.len(), 2..=4)?;
    Ok(BigEndian::read_u16(data))
}

pub(super) fn decode_u32(data: &[u8]) -> Result<u32, StunParseError> {
    check_len(data.len(), 4..=4)?;
    Ok(BigEndian::read_u32(data))
}
