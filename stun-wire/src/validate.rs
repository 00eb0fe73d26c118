// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Checksum validation
//!
//! FINGERPRINT and MESSAGE-INTEGRITY cover the message as it was when the checksum was
//! appended: every byte before the checksum attribute, with the header length counting up to
//! and including that attribute.  The `verify_*` functions check a received datagram in
//! place.  The `validate_*` functions check a [`Message`] by encoding it first.
//!
//! # Examples
//!
//! ```
//! use stun_wire::message::{Message, BINDING};
//! use stun_wire::validate;
//!
//! let mut msg = Message::new_request(BINDING);
//! msg.add_message_integrity(b"secret").unwrap();
//! msg.add_fingerprint().unwrap();
//! let data = msg.to_bytes().unwrap();
//!
//! assert!(validate::verify_fingerprint(&data).is_ok());
//! assert!(validate::verify_message_integrity(&data, b"secret").is_ok());
//! assert!(validate::verify_message_integrity(&data, b"wrong").is_err());
//! ```

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace, warn};

use crate::attribute::{fingerprint, integrity, AttributeHeader, AttributeType};
use crate::message::{Message, MessageHeader, StunParseError};
use crate::wire;

// Offset of the first attribute of type `atype` within `data`, and `data` cut to the length
// advertised in the header.
fn find_attribute(data: &[u8], atype: AttributeType) -> Result<(usize, &[u8]), StunParseError> {
    let header = MessageHeader::from_bytes(data)?;
    if header.transaction_id().is_legacy() {
        debug!("legacy messages do not carry {atype}");
        return Err(StunParseError::NotStun);
    }
    let end = MessageHeader::LENGTH + header.data_length() as usize;
    if end > data.len() {
        warn!(
            "advertised size {} exceeds data size {}",
            end,
            data.len()
        );
        return Err(StunParseError::Truncated {
            expected: end,
            actual: data.len(),
        });
    }
    let data = &data[..end];
    let mut offset = MessageHeader::LENGTH;
    while offset < end {
        let header = AttributeHeader::try_from(&data[offset..])?;
        if header.get_type() == atype {
            trace!("found {atype} at offset {offset}");
            return Ok((offset, data));
        }
        offset += AttributeHeader::LENGTH + wire::padded_len(header.length() as usize);
    }
    Err(StunParseError::MissingAttribute(atype))
}

// The bytes preceding the attribute at `offset` with the header length rewritten to end after
// an attribute of `attr_len` bytes at that offset.
fn covered_bytes(data: &[u8], offset: usize, attr_len: usize) -> Vec<u8> {
    let mut covered = data[..offset].to_vec();
    let length = offset + attr_len - MessageHeader::LENGTH;
    BigEndian::write_u16(&mut covered[2..4], length as u16);
    covered
}

/// Verify the FINGERPRINT attribute of a received STUN message.
///
/// # Errors
///
/// - [`StunParseError::MissingAttribute`] when there is no FINGERPRINT.
/// - [`StunParseError::FingerprintMismatch`] when the CRC does not match.
/// - [`StunParseError::NotStun`] for legacy messages.
/// - Any header or attribute framing error.
///
/// # Examples
///
/// ```
/// # use stun_wire::validate::verify_fingerprint;
/// let mut data = vec![
///     0x00, 0x01, 0x00, 0x08, 0x21, 0x12, 0xa4, 0x42,
///     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
///     0x00, 0x00, 0x00, 0x01, 0x80, 0x28, 0x00, 0x04,
///     0x00, 0x00, 0x00, 0x00,
/// ];
/// assert!(verify_fingerprint(&data).is_err());
/// let crc = stun_wire::attribute::fingerprint::compute(&data[..20]);
/// data[24..].copy_from_slice(&crc.to_be_bytes());
/// assert!(verify_fingerprint(&data).is_ok());
/// ```
#[tracing::instrument(
    name = "verify_fingerprint",
    level = "trace",
    err,
    skip(data),
    fields(data.len = data.len())
)]
pub fn verify_fingerprint(data: &[u8]) -> Result<(), StunParseError> {
    let (offset, data) = find_attribute(data, AttributeType::FINGERPRINT)?;
    let value = wire::read_prefixed(data, offset + 2)?;
    if value.len() != 4 {
        warn!("FINGERPRINT of invalid length {}", value.len());
        return Err(StunParseError::InvalidAttributeData);
    }
    let expected = BigEndian::read_u32(value);
    let covered = covered_bytes(data, offset, AttributeHeader::LENGTH + 4);
    let calculated = fingerprint::compute(&covered);
    if calculated != expected {
        warn!(
            "fingerprint mismatch, expected {:#x}, calculated {:#x}",
            expected, calculated
        );
        return Err(StunParseError::FingerprintMismatch);
    }
    Ok(())
}

/// Verify the MESSAGE-INTEGRITY attribute of a received STUN message with `key`.
///
/// See [`MessageIntegrityCredentials::make_hmac_key`](crate::message::MessageIntegrityCredentials::make_hmac_key)
/// for deriving `key` from credentials.
///
/// # Errors
///
/// - [`StunParseError::MissingAttribute`] when there is no MESSAGE-INTEGRITY.
/// - [`StunParseError::IntegrityCheckFailed`] when the HMAC does not match or `key` is empty.
/// - [`StunParseError::NotStun`] for legacy messages.
/// - Any header or attribute framing error.
#[tracing::instrument(
    name = "verify_message_integrity",
    level = "trace",
    err,
    skip(data, key),
    fields(data.len = data.len())
)]
pub fn verify_message_integrity(data: &[u8], key: &[u8]) -> Result<(), StunParseError> {
    if key.is_empty() {
        warn!("no key provided to verify MESSAGE-INTEGRITY");
        return Err(StunParseError::IntegrityCheckFailed);
    }
    let (offset, data) = find_attribute(data, AttributeType::MESSAGE_INTEGRITY)?;
    let value = wire::read_prefixed(data, offset + 2)?;
    if value.len() != integrity::LENGTH {
        warn!("MESSAGE-INTEGRITY of invalid length {}", value.len());
        return Err(StunParseError::InvalidAttributeData);
    }
    let covered = covered_bytes(data, offset, AttributeHeader::LENGTH + integrity::LENGTH);
    integrity::verify(&covered, key, value).map_err(|e| {
        warn!("MESSAGE-INTEGRITY check failed");
        e
    })
}

/// Whether the FINGERPRINT of `msg` matches its contents.  Legacy messages, messages without
/// a FINGERPRINT and messages that cannot be encoded are never valid.
///
/// # Examples
///
/// ```
/// # use stun_wire::message::{Message, BINDING};
/// # use stun_wire::validate::validate_fingerprint;
/// let mut msg = Message::new_request(BINDING);
/// assert!(!validate_fingerprint(&msg));
/// msg.add_fingerprint().unwrap();
/// assert!(validate_fingerprint(&msg));
/// ```
pub fn validate_fingerprint(msg: &Message) -> bool {
    if msg.is_legacy() {
        return false;
    }
    match msg.to_bytes() {
        Ok(data) => verify_fingerprint(&data).is_ok(),
        Err(e) => {
            warn!("failed to encode message for fingerprint validation: {e}");
            false
        }
    }
}

/// Whether the MESSAGE-INTEGRITY of `msg` matches its contents with `key`.  Legacy messages,
/// messages without a MESSAGE-INTEGRITY and messages that cannot be encoded are never valid.
///
/// # Examples
///
/// ```
/// # use stun_wire::message::{Message, BINDING, ShortTermCredentials, MessageIntegrityCredentials};
/// # use stun_wire::validate::validate_message_integrity;
/// let credentials: MessageIntegrityCredentials = ShortTermCredentials::new("pass".to_owned()).into();
/// let key = credentials.make_hmac_key();
/// let mut msg = Message::new_request(BINDING);
/// msg.add_username("user").unwrap();
/// msg.add_message_integrity(&key).unwrap();
/// assert!(validate_message_integrity(&msg, &key));
/// assert!(!validate_message_integrity(&msg, b"other"));
/// ```
pub fn validate_message_integrity(msg: &Message, key: &[u8]) -> bool {
    if msg.is_legacy() {
        return false;
    }
    match msg.to_bytes() {
        Ok(data) => verify_message_integrity(&data, key).is_ok(),
        Err(e) => {
            warn!("failed to encode message for integrity validation: {e}");
            false
        }
    }
}
