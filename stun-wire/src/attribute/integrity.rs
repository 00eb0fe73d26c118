// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HMAC-SHA1 computation for the MESSAGE-INTEGRITY attribute.

use hmac::{Hmac, Mac};
use tracing::error;

use crate::message::{StunParseError, StunWriteError};

/// Length of the HMAC-SHA1 digest carried in MESSAGE-INTEGRITY.
pub const LENGTH: usize = 20;

/// Compute the Message Integrity value of a chunk of data using a key
///
/// Note: use [`verify`] for the actual verification to ensure constant time checks of the
/// values.
///
/// # Examples
/// ```
/// # use stun_wire::attribute::integrity;
/// let key = [40; 10];
/// let data = [10; 30];
/// let expected = [209, 217, 210, 15, 124, 78, 87, 181, 211, 233, 165, 180, 44, 142, 81, 233, 138, 186, 184, 97];
/// let hmac = integrity::compute(&data, &key).unwrap();
/// assert_eq!(hmac, expected);
/// ```
#[tracing::instrument(
    name = "MessageIntegrity::compute",
    level = "trace",
    err,
    ret,
    skip(data, key)
)]
pub fn compute(data: &[u8], key: &[u8]) -> Result<[u8; LENGTH], StunWriteError> {
    let mut hmac =
        Hmac::<sha1::Sha1>::new_from_slice(key).map_err(|_| StunWriteError::IntegrityFailed)?;
    hmac.update(data);
    Ok(hmac.finalize().into_bytes().into())
}

/// Verify the Message Integrity value of a chunk of data in constant time.
///
/// # Examples
/// ```
/// # use stun_wire::attribute::integrity;
/// let key = [40; 10];
/// let data = [10; 30];
/// let expected = [209, 217, 210, 15, 124, 78, 87, 181, 211, 233, 165, 180, 44, 142, 81, 233, 138, 186, 184, 97];
/// assert!(integrity::verify(&data, &key, &expected).is_ok());
/// assert!(integrity::verify(&data[1..], &key, &expected).is_err());
/// ```
#[tracing::instrument(
    name = "MessageIntegrity::verify",
    level = "debug",
    skip(data, key, expected)
)]
pub fn verify(data: &[u8], key: &[u8], expected: &[u8]) -> Result<(), StunParseError> {
    let mut hmac = Hmac::<sha1::Sha1>::new_from_slice(key).map_err(|_| {
        error!("failed to create hmac from key data");
        StunParseError::InvalidAttributeData
    })?;
    hmac.update(data);
    hmac.verify_slice(expected)
        .map_err(|_| StunParseError::IntegrityCheckFailed)
}
