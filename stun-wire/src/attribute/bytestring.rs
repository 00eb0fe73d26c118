// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::message::StunWriteError;

use super::AttributeType;

const MAX_TEXT_BYTES: usize = 763;
const MAX_TEXT_CHARS: usize = 127;
const MAX_USERNAME_BYTES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Limit {
    Exact(usize),
    MaxBytes(usize),
    /// UTF-8 text limited in both characters and bytes.
    MaxChars(usize),
}

fn limit_for(atype: AttributeType) -> Limit {
    match atype {
        AttributeType::USERNAME => Limit::MaxBytes(MAX_USERNAME_BYTES),
        AttributeType::REALM | AttributeType::NONCE | AttributeType::SOFTWARE => {
            Limit::MaxChars(MAX_TEXT_CHARS)
        }
        AttributeType::MESSAGE_INTEGRITY => Limit::Exact(20),
        AttributeType::ICE_CONTROLLED
        | AttributeType::ICE_CONTROLLING
        | AttributeType::RESERVATION_TOKEN => Limit::Exact(8),
        AttributeType::EVEN_PORT => Limit::Exact(1),
        AttributeType::USE_CANDIDATE | AttributeType::DONT_FRAGMENT => Limit::Exact(0),
        _ => Limit::MaxBytes(u16::MAX as usize),
    }
}

/// Check a byte string value against the limits of `atype`.  Only applied when constructing
/// attributes; decoding keeps whatever the peer sent.
pub(super) fn check(atype: AttributeType, value: &[u8]) -> Result<(), StunWriteError> {
    match limit_for(atype) {
        Limit::Exact(len) => {
            if value.len() < len {
                return Err(StunWriteError::TooSmall {
                    expected: len,
                    actual: value.len(),
                });
            }
            if value.len() > len {
                return Err(StunWriteError::TooLarge {
                    expected: len,
                    actual: value.len(),
                });
            }
        }
        Limit::MaxBytes(max) => {
            if value.len() > max {
                return Err(StunWriteError::TooLarge {
                    expected: max,
                    actual: value.len(),
                });
            }
        }
        Limit::MaxChars(max) => {
            if value.len() > MAX_TEXT_BYTES {
                return Err(StunWriteError::TooLarge {
                    expected: MAX_TEXT_BYTES,
                    actual: value.len(),
                });
            }
            let chars = std::str::from_utf8(value).map_or(value.len(), |s| s.chars().count());
            if chars > max {
                return Err(StunWriteError::TooLarge {
                    expected: max,
                    actual: chars,
                });
            }
        }
    }
    Ok(())
}
