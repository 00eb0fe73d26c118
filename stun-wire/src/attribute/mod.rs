// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! STUN Attributes
//!
//! Every attribute in a STUN [`Message`](crate::message::Message) is a type-length-value triple.
//! The 16-bit [`AttributeType`] selects one of a fixed set of value encodings, the
//! [`ValueKind`], through a static registry.  Parsing a [`RawAttribute`] therefore always
//! produces an [`Attribute`] whose [`AttributeValue`] variant matches the registry entry for
//! its type, with types missing from the registry preserved verbatim as
//! [`AttributeValue::Unknown`].
//!
//! Relevant RFCs: [RFC5389], [RFC5245] (ICE), [RFC5766] (TURN) and [RFC5780].
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//! [RFC5245]: https://tools.ietf.org/html/rfc5245
//! [RFC5766]: https://tools.ietf.org/html/rfc5766
//! [RFC5780]: https://tools.ietf.org/html/rfc5780
//!
//! # Examples
//!
//! ### Write an [`Attribute`]
//!
//! ```
//! use stun_wire::attribute::{Attribute, AttributeType, RawAttribute};
//! let software = Attribute::text(AttributeType::SOFTWARE, "stun-wire").unwrap();
//!
//! let attribute_data = [
//!     0x80, 0x22, 0x00, 0x09, // Attribute type (0x8022: Software) and length (0x0009)
//!     0x73, 0x74, 0x75, 0x6E, // s t u n
//!     0x2D, 0x77, 0x69, 0x72, // - w i r
//!     0x65, 0x00, 0x00, 0x00  // e
//! ];
//!
//! let raw = software.to_raw(None).unwrap();
//! assert_eq!(raw.to_bytes(), attribute_data);
//!
//! // and parse it back again
//! let raw = RawAttribute::from_bytes(&attribute_data).unwrap();
//! let parsed = Attribute::parse(&raw, None).unwrap();
//! assert_eq!(parsed.value().as_str(), Some("stun-wire"));
//! ```
//!
//! ### Unregistered attribute types
//!
//! ```
//! use stun_wire::attribute::{Attribute, AttributeValue, RawAttribute, ValueKind};
//! let data = [0x88, 0x88, 0x00, 0x02, 0xde, 0xad, 0x00, 0x00];
//! let raw = RawAttribute::from_bytes(&data).unwrap();
//! let attr = Attribute::parse(&raw, None).unwrap();
//! assert_eq!(attr.kind(), ValueKind::Unknown);
//! assert_eq!(attr.value(), &AttributeValue::Unknown(vec![0xde, 0xad]));
//! // unknown values are never written back out
//! assert!(attr.to_raw(None).is_err());
//! ```

use std::borrow::Cow;
use std::net::SocketAddr;

use crate::message::{StunParseError, StunWriteError, TransactionId};
use crate::wire;

macro_rules! bytewise_xor {
    ($size:literal, $a:expr, $b:expr, $default:literal) => {{
        let mut arr = [$default; $size];
        for (i, item) in arr.iter_mut().enumerate() {
            *item = $a[i] ^ $b[i];
        }
        arr
    }};
}

mod address;
pub use address::{xor_socket_addr, AddressFamily};
mod bytestring;
mod error;
pub use error::{ErrorCode, ErrorCodeBuilder};
pub mod fingerprint;
mod integer;
pub mod integrity;
mod list;
pub use list::UInt16List;

/// The type of an [`Attribute`] in a STUN [`Message`](crate::message::Message)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeType(u16);

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#x}: {})", self.0, self.0, self.name())
    }
}

impl AttributeType {
    pub const MAPPED_ADDRESS: AttributeType = AttributeType(0x0001);
    pub const CHANGE_REQUEST: AttributeType = AttributeType(0x0003);
    pub const USERNAME: AttributeType = AttributeType(0x0006);
    pub const MESSAGE_INTEGRITY: AttributeType = AttributeType(0x0008);
    pub const ERROR_CODE: AttributeType = AttributeType(0x0009);
    pub const UNKNOWN_ATTRIBUTES: AttributeType = AttributeType(0x000A);
    pub const CHANNEL_NUMBER: AttributeType = AttributeType(0x000C);
    pub const LIFETIME: AttributeType = AttributeType(0x000D);
    pub const XOR_PEER_ADDRESS: AttributeType = AttributeType(0x0012);
    pub const DATA: AttributeType = AttributeType(0x0013);
    pub const REALM: AttributeType = AttributeType(0x0014);
    pub const NONCE: AttributeType = AttributeType(0x0015);
    pub const XOR_RELAYED_ADDRESS: AttributeType = AttributeType(0x0016);
    pub const EVEN_PORT: AttributeType = AttributeType(0x0018);
    pub const REQUESTED_TRANSPORT: AttributeType = AttributeType(0x0019);
    pub const DONT_FRAGMENT: AttributeType = AttributeType(0x001A);
    pub const XOR_MAPPED_ADDRESS: AttributeType = AttributeType(0x0020);
    pub const RESERVATION_TOKEN: AttributeType = AttributeType(0x0022);
    pub const PRIORITY: AttributeType = AttributeType(0x0024);
    pub const USE_CANDIDATE: AttributeType = AttributeType(0x0025);
    pub const PADDING: AttributeType = AttributeType(0x0026);
    pub const RESPONSE_PORT: AttributeType = AttributeType(0x0027);
    pub const SOFTWARE: AttributeType = AttributeType(0x8022);
    pub const ALTERNATE_SERVER: AttributeType = AttributeType(0x8023);
    pub const FINGERPRINT: AttributeType = AttributeType(0x8028);
    pub const ICE_CONTROLLED: AttributeType = AttributeType(0x8029);
    pub const ICE_CONTROLLING: AttributeType = AttributeType(0x802A);
    pub const RESPONSE_ORIGIN: AttributeType = AttributeType(0x802B);
    pub const OTHER_ADDRESS: AttributeType = AttributeType(0x802C);
    pub const ORIGIN: AttributeType = AttributeType(0x802F);
    pub const NOMINATION: AttributeType = AttributeType(0xC001);
    pub const NETWORK_INFO: AttributeType = AttributeType(0xC057);
    pub const RETRANSMIT_COUNT: AttributeType = AttributeType(0xFF00);

    /// Create a new AttributeType from an existing value
    ///
    /// # Examples
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// assert_eq!(AttributeType::new(0x123).value(), 0x123);
    /// ```
    pub const fn new(val: u16) -> Self {
        Self(val)
    }

    /// Return the integer value of this AttributeType
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns a human readable name of this `AttributeType` or "unknown"
    ///
    /// # Examples
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// assert_eq!(AttributeType::XOR_MAPPED_ADDRESS.name(), "XOR-MAPPED-ADDRESS");
    /// assert_eq!(AttributeType::new(0x8888).name(), "unknown");
    /// ```
    pub fn name(self) -> &'static str {
        registry_entry(self).map_or("unknown", |entry| entry.2)
    }

    /// The [`ValueKind`] used to encode values of this type.
    ///
    /// # Examples
    /// ```
    /// # use stun_wire::attribute::{AttributeType, ValueKind};
    /// assert_eq!(AttributeType::PRIORITY.kind(), ValueKind::UInt32);
    /// assert_eq!(AttributeType::new(0x8888).kind(), ValueKind::Unknown);
    /// ```
    pub fn kind(self) -> ValueKind {
        registry_entry(self).map_or(ValueKind::Unknown, |entry| entry.1)
    }

    /// Check if comprehension is required for an `AttributeType`.  All integer attribute
    /// values < 0x8000 require comprehension.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// assert_eq!(AttributeType::new(0x0).comprehension_required(), true);
    /// assert_eq!(AttributeType::new(0x8000).comprehension_required(), false);
    /// ```
    pub fn comprehension_required(self) -> bool {
        self.0 < 0x8000
    }
}

impl From<u16> for AttributeType {
    fn from(value: u16) -> Self {
        AttributeType::new(value)
    }
}

impl From<AttributeType> for u16 {
    fn from(value: AttributeType) -> Self {
        value.0
    }
}

/// The wire encoding of an attribute value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Reserved byte, family, port and a plain IPv4 or IPv6 address.
    Address,
    /// Like [`ValueKind::Address`] but XOR-ed with the magic cookie and transaction id.
    XorAddress,
    /// A big-endian `u16`.
    UInt16,
    /// A big-endian `u32`.
    UInt32,
    /// Opaque bytes or UTF-8 text.
    ByteString,
    /// An error class, number and reason phrase.
    ErrorCode,
    /// A list of big-endian `u16` values without duplicates.
    UInt16List,
    /// A type missing from the registry.  Read only.
    Unknown,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

static REGISTRY: &[(AttributeType, ValueKind, &str)] = &[
    (AttributeType::MAPPED_ADDRESS, ValueKind::Address, "MAPPED-ADDRESS"),
    (AttributeType::CHANGE_REQUEST, ValueKind::UInt32, "CHANGE-REQUEST"),
    (AttributeType::USERNAME, ValueKind::ByteString, "USERNAME"),
    (AttributeType::MESSAGE_INTEGRITY, ValueKind::ByteString, "MESSAGE-INTEGRITY"),
    (AttributeType::ERROR_CODE, ValueKind::ErrorCode, "ERROR-CODE"),
    (AttributeType::UNKNOWN_ATTRIBUTES, ValueKind::UInt16List, "UNKNOWN-ATTRIBUTES"),
    (AttributeType::CHANNEL_NUMBER, ValueKind::UInt32, "CHANNEL-NUMBER"),
    (AttributeType::LIFETIME, ValueKind::UInt32, "LIFETIME"),
    (AttributeType::XOR_PEER_ADDRESS, ValueKind::XorAddress, "XOR-PEER-ADDRESS"),
    (AttributeType::DATA, ValueKind::ByteString, "DATA"),
    (AttributeType::REALM, ValueKind::ByteString, "REALM"),
    (AttributeType::NONCE, ValueKind::ByteString, "NONCE"),
    (AttributeType::XOR_RELAYED_ADDRESS, ValueKind::XorAddress, "XOR-RELAYED-ADDRESS"),
    (AttributeType::EVEN_PORT, ValueKind::ByteString, "EVEN-PORT"),
    (AttributeType::REQUESTED_TRANSPORT, ValueKind::UInt32, "REQUESTED-TRANSPORT"),
    (AttributeType::DONT_FRAGMENT, ValueKind::ByteString, "DONT-FRAGMENT"),
    (AttributeType::XOR_MAPPED_ADDRESS, ValueKind::XorAddress, "XOR-MAPPED-ADDRESS"),
    (AttributeType::RESERVATION_TOKEN, ValueKind::ByteString, "RESERVATION-TOKEN"),
    (AttributeType::PRIORITY, ValueKind::UInt32, "PRIORITY"),
    (AttributeType::USE_CANDIDATE, ValueKind::ByteString, "USE-CANDIDATE"),
    (AttributeType::PADDING, ValueKind::ByteString, "PADDING"),
    (AttributeType::RESPONSE_PORT, ValueKind::UInt16, "RESPONSE-PORT"),
    (AttributeType::SOFTWARE, ValueKind::ByteString, "SOFTWARE"),
    (AttributeType::ALTERNATE_SERVER, ValueKind::Address, "ALTERNATE-SERVER"),
    (AttributeType::FINGERPRINT, ValueKind::UInt32, "FINGERPRINT"),
    (AttributeType::ICE_CONTROLLED, ValueKind::ByteString, "ICE-CONTROLLED"),
    (AttributeType::ICE_CONTROLLING, ValueKind::ByteString, "ICE-CONTROLLING"),
    (AttributeType::RESPONSE_ORIGIN, ValueKind::Address, "RESPONSE-ORIGIN"),
    (AttributeType::OTHER_ADDRESS, ValueKind::Address, "OTHER-ADDRESS"),
    (AttributeType::ORIGIN, ValueKind::ByteString, "ORIGIN"),
    (AttributeType::NOMINATION, ValueKind::UInt32, "NOMINATION"),
    (AttributeType::NETWORK_INFO, ValueKind::UInt32, "NETWORK-INFO"),
    (AttributeType::RETRANSMIT_COUNT, ValueKind::UInt32, "RETRANSMIT-COUNT"),
];

fn registry_entry(
    atype: AttributeType,
) -> Option<&'static (AttributeType, ValueKind, &'static str)> {
    REGISTRY.iter().find(|entry| entry.0 == atype)
}

/// Look up the [`ValueKind`] for a raw attribute type code.  Codes without a registry entry
/// map to [`ValueKind::Unknown`].
///
/// # Examples
///
/// ```
/// # use stun_wire::attribute::{kind_for, ValueKind};
/// assert_eq!(kind_for(0x0020), ValueKind::XorAddress);
/// assert_eq!(kind_for(0x000A), ValueKind::UInt16List);
/// assert_eq!(kind_for(0x8888), ValueKind::Unknown);
/// ```
pub fn kind_for(atype: u16) -> ValueKind {
    AttributeType::new(atype).kind()
}

/// Structure for holding the header of any STUN attribute.  Contains the type and the length
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeHeader {
    atype: AttributeType,
    length: u16,
}

impl AttributeHeader {
    /// The size in bytes of an attribute header.
    pub const LENGTH: usize = 4;

    fn parse(data: &[u8]) -> Result<Self, StunParseError> {
        Ok(Self {
            atype: wire::read_u16(data, 0)?.into(),
            length: wire::read_u16(data, 2)?,
        })
    }

    /// Returns the type of the attribute
    pub fn get_type(&self) -> AttributeType {
        self.atype
    }

    /// Returns the length of the attribute value
    pub fn length(&self) -> u16 {
        self.length
    }
}

impl TryFrom<&[u8]> for AttributeHeader {
    type Error = StunParseError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        AttributeHeader::parse(value)
    }
}

/// The type, length and still encoded value of an attribute as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    header: AttributeHeader,
    value: Cow<'a, [u8]>,
}

impl std::fmt::Display for RawAttribute<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RawAttribute (type: {}, len: {}, data: {:x?})",
            self.header.atype, self.header.length, &self.value
        )
    }
}

impl<'a> RawAttribute<'a> {
    /// Create a new [`RawAttribute`] borrowing `data` as its value.
    ///
    /// # Errors
    ///
    /// - When `data` does not fit into the 16-bit length field.
    pub fn new(atype: AttributeType, data: &'a [u8]) -> Result<Self, StunWriteError> {
        let length = u16::try_from(data.len()).map_err(|_| StunWriteError::TooLarge {
            expected: u16::MAX as usize,
            actual: data.len(),
        })?;
        Ok(Self {
            header: AttributeHeader { atype, length },
            value: Cow::Borrowed(data),
        })
    }

    /// Deserialize a `RawAttribute` from bytes.  Trailing padding is not required to be
    /// present.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::{RawAttribute, AttributeType};
    /// let data = &[0, 1, 0, 2, 5, 6, 0, 0];
    /// let attr = RawAttribute::from_bytes(data).unwrap();
    /// assert_eq!(attr.get_type(), AttributeType::new(1));
    /// assert_eq!(attr.value(), &[5, 6]);
    /// ```
    pub fn from_bytes(data: &'a [u8]) -> Result<Self, StunParseError> {
        let header = AttributeHeader::parse(data)?;
        let value = wire::read_prefixed(data, 2)?;
        Ok(Self {
            header,
            value: Cow::Borrowed(value),
        })
    }

    /// Serialize this `RawAttribute` including its padding.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::{RawAttribute, AttributeType};
    /// let attr = RawAttribute::new(AttributeType::new(1), &[5, 6]).unwrap();
    /// assert_eq!(attr.to_bytes(), &[0, 1, 0, 2, 5, 6, 0, 0]);
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.padded_len());
        self.write_into(&mut out);
        out
    }

    /// Append the TLV encoding of this `RawAttribute` to `dest`.
    pub fn write_into(&self, dest: &mut Vec<u8>) {
        wire::write_u16(dest, self.header.atype.value());
        wire::write_u16(dest, self.header.length);
        dest.extend_from_slice(&self.value);
        wire::write_padding(dest, self.value.len());
    }

    /// Returns the type of this attribute
    pub fn get_type(&self) -> AttributeType {
        self.header.atype
    }

    /// Returns the header of this attribute
    pub fn header(&self) -> AttributeHeader {
        self.header
    }

    /// The encoded value
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The number of bytes this attribute occupies on the wire, header and padding included.
    pub fn padded_len(&self) -> usize {
        AttributeHeader::LENGTH + wire::padded_len(self.value.len())
    }

    /// Take ownership of the value, detaching this `RawAttribute` from the input buffer.
    pub fn into_owned<'b>(self) -> RawAttribute<'b> {
        RawAttribute {
            header: self.header,
            value: Cow::Owned(self.value.into_owned()),
        }
    }
}

impl RawAttribute<'static> {
    fn owned(atype: AttributeType, value: Vec<u8>) -> Result<Self, StunWriteError> {
        let length = u16::try_from(value.len()).map_err(|_| StunWriteError::TooLarge {
            expected: u16::MAX as usize,
            actual: value.len(),
        })?;
        Ok(Self {
            header: AttributeHeader { atype, length },
            value: Cow::Owned(value),
        })
    }
}

/// Check that `len` is within the allowed range, reporting which bound was crossed.
pub(crate) fn check_len(
    len: usize,
    allowed_range: impl std::ops::RangeBounds<usize> + std::fmt::Debug,
) -> Result<(), StunParseError> {
    match allowed_range.start_bound() {
        std::ops::Bound::Unbounded => (),
        std::ops::Bound::Included(start) => {
            if len < *start {
                return Err(StunParseError::Truncated {
                    expected: *start,
                    actual: len,
                });
            }
        }
        std::ops::Bound::Excluded(start) => {
            if len <= *start {
                return Err(StunParseError::Truncated {
                    expected: start + 1,
                    actual: len,
                });
            }
        }
    }
    match allowed_range.end_bound() {
        std::ops::Bound::Unbounded => (),
        std::ops::Bound::Included(end) => {
            if len > *end {
                return Err(StunParseError::TooLarge {
                    expected: *end,
                    actual: len,
                });
            }
        }
        std::ops::Bound::Excluded(end) => {
            if len >= *end {
                return Err(StunParseError::TooLarge {
                    expected: end - 1,
                    actual: len,
                });
            }
        }
    }
    Ok(())
}

/// A decoded attribute value.  The variant always matches the [`ValueKind`] registered for
/// the attribute's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// A plain socket address.
    Address(SocketAddr),
    /// A socket address, stored un-XOR-ed.
    XorAddress(SocketAddr),
    UInt16(u16),
    UInt32(u32),
    ByteString(Vec<u8>),
    ErrorCode(ErrorCode),
    UInt16List(UInt16List),
    /// The raw value of an unregistered attribute type.
    Unknown(Vec<u8>),
}

impl AttributeValue {
    /// The [`ValueKind`] of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::Address(_) => ValueKind::Address,
            AttributeValue::XorAddress(_) => ValueKind::XorAddress,
            AttributeValue::UInt16(_) => ValueKind::UInt16,
            AttributeValue::UInt32(_) => ValueKind::UInt32,
            AttributeValue::ByteString(_) => ValueKind::ByteString,
            AttributeValue::ErrorCode(_) => ValueKind::ErrorCode,
            AttributeValue::UInt16List(_) => ValueKind::UInt16List,
            AttributeValue::Unknown(_) => ValueKind::Unknown,
        }
    }

    /// The socket address of an [`AttributeValue::Address`] or [`AttributeValue::XorAddress`].
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            AttributeValue::Address(addr) | AttributeValue::XorAddress(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            AttributeValue::UInt16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            AttributeValue::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// The bytes of an [`AttributeValue::ByteString`] or [`AttributeValue::Unknown`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::ByteString(v) | AttributeValue::Unknown(v) => Some(v),
            _ => None,
        }
    }

    /// The value of an [`AttributeValue::ByteString`] when it holds valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::ByteString(v) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<&ErrorCode> {
        match self {
            AttributeValue::ErrorCode(v) => Some(v),
            _ => None,
        }
    }

    pub fn uint16_list(&self) -> Option<&UInt16List> {
        match self {
            AttributeValue::UInt16List(v) => Some(v),
            _ => None,
        }
    }

    fn length(&self) -> usize {
        match self {
            AttributeValue::Address(addr) | AttributeValue::XorAddress(addr) => {
                address::encoded_len(addr)
            }
            AttributeValue::UInt16(_) => 2,
            AttributeValue::UInt32(_) => 4,
            AttributeValue::ByteString(v) | AttributeValue::Unknown(v) => v.len(),
            AttributeValue::ErrorCode(v) => v.length(),
            AttributeValue::UInt16List(v) => v.len() * 2,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Address(addr) | AttributeValue::XorAddress(addr) => {
                write!(f, "{addr}")
            }
            AttributeValue::UInt16(v) => write!(f, "{v}"),
            AttributeValue::UInt32(v) => write!(f, "{v:#x}"),
            AttributeValue::ByteString(v) => match std::str::from_utf8(v) {
                Ok(s) => write!(f, "'{s}'"),
                Err(_) => write!(f, "{v:x?}"),
            },
            AttributeValue::ErrorCode(v) => write!(f, "{v}"),
            AttributeValue::UInt16List(v) => write!(f, "{v}"),
            AttributeValue::Unknown(v) => write!(f, "unknown {v:x?}"),
        }
    }
}

/// A typed STUN attribute: an [`AttributeType`] and its decoded [`AttributeValue`].
///
/// XOR-encoded addresses need the transaction id of the message they are written into or read
/// from.  This is passed in as the `owner` of [`Attribute::to_raw`] and [`Attribute::parse`];
/// a [`Message`](crate::message::Message) always provides its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    atype: AttributeType,
    value: AttributeValue,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.atype, self.value)
    }
}

impl Attribute {
    /// Create a new [`Attribute`], validating the value against the registry entry for `atype`.
    ///
    /// # Errors
    ///
    /// - When the variant of `value` does not match [`AttributeType::kind`].
    /// - When an address has a port of 0.
    /// - When a byte string is outside the length limits of `atype`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::{Attribute, AttributeType, AttributeValue};
    /// let priority = Attribute::new(AttributeType::PRIORITY, AttributeValue::UInt32(0x6e0001ff)).unwrap();
    /// assert_eq!(priority.value().as_u32(), Some(0x6e0001ff));
    /// assert!(Attribute::new(AttributeType::PRIORITY, AttributeValue::UInt16(1)).is_err());
    /// ```
    pub fn new(atype: AttributeType, value: AttributeValue) -> Result<Self, StunWriteError> {
        let expected = atype.kind();
        let actual = value.kind();
        if expected != actual {
            return Err(StunWriteError::WrongValueKind {
                atype,
                expected,
                actual,
            });
        }
        match &value {
            AttributeValue::Address(addr) | AttributeValue::XorAddress(addr) => {
                address::check_addr(addr)?
            }
            AttributeValue::ByteString(bytes) => bytestring::check(atype, bytes)?,
            _ => (),
        }
        Ok(Self { atype, value })
    }

    /// Create an address attribute.  Whether the address is XOR-ed on the wire depends on the
    /// registry entry for `atype`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::{Attribute, AttributeType, ValueKind};
    /// let addr = "192.168.1.2:63524".parse().unwrap();
    /// let mapped = Attribute::address(AttributeType::MAPPED_ADDRESS, addr).unwrap();
    /// assert_eq!(mapped.kind(), ValueKind::Address);
    /// let xor_mapped = Attribute::address(AttributeType::XOR_MAPPED_ADDRESS, addr).unwrap();
    /// assert_eq!(xor_mapped.kind(), ValueKind::XorAddress);
    /// assert_eq!(xor_mapped.value().socket_addr(), Some(addr));
    /// ```
    pub fn address(atype: AttributeType, addr: SocketAddr) -> Result<Self, StunWriteError> {
        let value = match atype.kind() {
            ValueKind::XorAddress => AttributeValue::XorAddress(addr),
            _ => AttributeValue::Address(addr),
        };
        Self::new(atype, value)
    }

    pub fn uint16(atype: AttributeType, value: u16) -> Result<Self, StunWriteError> {
        Self::new(atype, AttributeValue::UInt16(value))
    }

    pub fn uint32(atype: AttributeType, value: u32) -> Result<Self, StunWriteError> {
        Self::new(atype, AttributeValue::UInt32(value))
    }

    /// Create a byte string attribute from opaque bytes.
    pub fn bytes(atype: AttributeType, value: impl Into<Vec<u8>>) -> Result<Self, StunWriteError> {
        Self::new(atype, AttributeValue::ByteString(value.into()))
    }

    /// Create a byte string attribute from text.
    pub fn text(atype: AttributeType, value: &str) -> Result<Self, StunWriteError> {
        Self::bytes(atype, value.as_bytes())
    }

    /// Create an ERROR-CODE attribute.
    pub fn error_code(error: ErrorCode) -> Self {
        Self {
            atype: AttributeType::ERROR_CODE,
            value: AttributeValue::ErrorCode(error),
        }
    }

    /// Create an attribute holding a list of `u16` values.
    pub fn uint16_list(atype: AttributeType, list: UInt16List) -> Result<Self, StunWriteError> {
        Self::new(atype, AttributeValue::UInt16List(list))
    }

    /// Returns the type of this attribute
    pub fn get_type(&self) -> AttributeType {
        self.atype
    }

    /// Returns the [`ValueKind`] of this attribute
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Returns the value of this attribute
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Consume the attribute, returning its value.
    pub fn into_value(self) -> AttributeValue {
        self.value
    }

    /// The length in bytes of the encoded value, excluding header and padding.
    pub fn length(&self) -> usize {
        self.value.length()
    }

    /// The number of bytes this attribute occupies on the wire, header and padding included.
    pub fn padded_len(&self) -> usize {
        AttributeHeader::LENGTH + wire::padded_len(self.length())
    }

    pub(crate) fn set_value(&mut self, value: AttributeValue) {
        debug_assert_eq!(self.value.kind(), value.kind());
        self.value = value;
    }

    pub(crate) fn new_unchecked(atype: AttributeType, value: AttributeValue) -> Self {
        Self { atype, value }
    }

    /// Encode this attribute.  `owner` is the transaction of the message the attribute is
    /// written into.
    ///
    /// # Errors
    ///
    /// - When a XOR-ed address has no `owner`.
    /// - When the attribute is of an unknown type.
    /// - When the value is too large for the 16-bit length field.
    pub fn to_raw(
        &self,
        owner: Option<&TransactionId>,
    ) -> Result<RawAttribute<'static>, StunWriteError> {
        let value = match &self.value {
            AttributeValue::Address(addr) => address::encode(*addr),
            AttributeValue::XorAddress(addr) => {
                let transaction =
                    owner.ok_or(StunWriteError::MissingTransaction(self.atype))?;
                address::encode(xor_socket_addr(*addr, transaction))
            }
            AttributeValue::UInt16(v) => integer::encode_u16(*v),
            AttributeValue::UInt32(v) => integer::encode_u32(*v),
            AttributeValue::ByteString(v) => v.clone(),
            AttributeValue::ErrorCode(v) => v.encode(),
            AttributeValue::UInt16List(v) => v.encode(),
            AttributeValue::Unknown(_) => {
                return Err(StunWriteError::UnknownAttribute(self.atype));
            }
        };
        RawAttribute::owned(self.atype, value)
    }

    /// Decode a [`RawAttribute`] using the registry entry for its type.  `owner` is the
    /// transaction of the message the attribute was read from.
    ///
    /// # Errors
    ///
    /// - When the value is truncated or malformed for its [`ValueKind`].
    /// - When a XOR-ed address has no `owner`.
    pub fn parse(
        raw: &RawAttribute<'_>,
        owner: Option<&TransactionId>,
    ) -> Result<Self, StunParseError> {
        let atype = raw.get_type();
        let data = raw.value();
        let value = match atype.kind() {
            ValueKind::Address => {
                AttributeValue::Address(address::valid_port(address::decode(data)?)?)
            }
            ValueKind::XorAddress => {
                let transaction = owner.ok_or(StunParseError::MissingTransaction(atype))?;
                let addr = xor_socket_addr(address::decode(data)?, transaction);
                AttributeValue::XorAddress(address::valid_port(addr)?)
            }
            ValueKind::UInt16 => AttributeValue::UInt16(integer::decode_u16(data)?),
            ValueKind::UInt32 => AttributeValue::UInt32(integer::decode_u32(data)?),
            ValueKind::ByteString => AttributeValue::ByteString(data.to_vec()),
            ValueKind::ErrorCode => AttributeValue::ErrorCode(ErrorCode::decode(data)?),
            ValueKind::UInt16List => AttributeValue::UInt16List(UInt16List::decode(data)?),
            ValueKind::Unknown => AttributeValue::Unknown(data.to_vec()),
        };
        Ok(Self { atype, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, ByteOrder};

    #[test]
    fn attribute_type() {
        crate::tests::test_init_log();
        let atype = AttributeType::SOFTWARE;
        assert!(!atype.comprehension_required());
        assert_eq!(u16::from(atype), 0x8022);
        assert_eq!(AttributeType::from(0x8022), atype);
        assert_eq!(format!("{atype}"), "32802(0x8022: SOFTWARE)");
        assert!(AttributeType::USERNAME.comprehension_required());
    }

    #[test]
    fn registry() {
        crate::tests::test_init_log();
        for &(atype, kind, name) in REGISTRY {
            assert_eq!(kind_for(atype.value()), kind);
            assert_eq!(atype.name(), name);
            // no duplicate codes
            assert_eq!(REGISTRY.iter().filter(|entry| entry.0 == atype).count(), 1);
        }
        assert_eq!(kind_for(0x0001), ValueKind::Address);
        assert_eq!(kind_for(0x8023), ValueKind::Address);
        assert_eq!(kind_for(0x0016), ValueKind::XorAddress);
        assert_eq!(kind_for(0x0009), ValueKind::ErrorCode);
        assert_eq!(kind_for(0x0027), ValueKind::UInt16);
        assert_eq!(kind_for(0x8028), ValueKind::UInt32);
        assert_eq!(kind_for(0x8029), ValueKind::ByteString);
        assert_eq!(kind_for(0x0000), ValueKind::Unknown);
        assert_eq!(kind_for(0xffff), ValueKind::Unknown);
    }

    #[test]
    fn raw_attribute_padding() {
        crate::tests::test_init_log();
        for n in 0..9 {
            let value = vec![0xff; n];
            let raw = RawAttribute::new(AttributeType::DATA, &value).unwrap();
            let bytes = raw.to_bytes();
            assert_eq!(bytes.len(), 4 + n + (4 - n % 4) % 4);
            assert_eq!(bytes.len(), raw.padded_len());
            assert_eq!(BigEndian::read_u16(&bytes[2..4]) as usize, n);
            assert!(bytes[4 + n..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn raw_attribute_truncated() {
        crate::tests::test_init_log();
        assert!(matches!(
            RawAttribute::from_bytes(&[0x00, 0x01, 0x00]),
            Err(StunParseError::Truncated {
                expected: 4,
                actual: 3
            })
        ));
        // length advertises more than is available
        assert!(matches!(
            RawAttribute::from_bytes(&[0x00, 0x06, 0x00, 0x05, 0x61, 0x62]),
            Err(StunParseError::Truncated {
                expected: 9,
                actual: 6
            })
        ));
    }

    #[test]
    fn wrong_value_kind() {
        crate::tests::test_init_log();
        assert!(matches!(
            Attribute::uint32(AttributeType::SOFTWARE, 1),
            Err(StunWriteError::WrongValueKind {
                expected: ValueKind::ByteString,
                actual: ValueKind::UInt32,
                ..
            })
        ));
        assert!(matches!(
            Attribute::address(AttributeType::PRIORITY, "127.0.0.1:1".parse().unwrap()),
            Err(StunWriteError::WrongValueKind { .. })
        ));
        assert!(matches!(
            Attribute::new(AttributeType::PRIORITY, AttributeValue::Unknown(vec![])),
            Err(StunWriteError::WrongValueKind { .. })
        ));
    }

    #[test]
    fn unknown_attribute_preserved() {
        crate::tests::test_init_log();
        let data = [0x88, 0x88, 0x00, 0x05, 1, 2, 3, 4, 5, 0, 0, 0];
        let raw = RawAttribute::from_bytes(&data).unwrap();
        let attr = Attribute::parse(&raw, None).unwrap();
        assert_eq!(attr.get_type(), AttributeType::new(0x8888));
        assert_eq!(attr.value().as_bytes(), Some(&[1, 2, 3, 4, 5][..]));
        assert_eq!(attr.length(), 5);
        assert!(matches!(
            attr.to_raw(None),
            Err(StunWriteError::UnknownAttribute(atype)) if atype.value() == 0x8888
        ));
    }

    #[test]
    fn xor_address_requires_owner() {
        crate::tests::test_init_log();
        let addr = "192.168.1.35:60689".parse().unwrap();
        let attr = Attribute::address(AttributeType::XOR_MAPPED_ADDRESS, addr).unwrap();
        assert!(matches!(
            attr.to_raw(None),
            Err(StunWriteError::MissingTransaction(AttributeType::XOR_MAPPED_ADDRESS))
        ));
        let transaction = TransactionId::from(0x644d4f37326c71514d4f4a51);
        let raw = attr.to_raw(Some(&transaction)).unwrap();
        assert_eq!(
            raw.value(),
            &[0x00, 0x01, 0xcc, 0x03, 0xe1, 0xba, 0xa5, 0x61]
        );
        assert!(matches!(
            Attribute::parse(&raw, None),
            Err(StunParseError::MissingTransaction(AttributeType::XOR_MAPPED_ADDRESS))
        ));
        let parsed = Attribute::parse(&raw, Some(&transaction)).unwrap();
        assert_eq!(parsed, attr);
    }

    #[test]
    fn uint_attributes() {
        crate::tests::test_init_log();
        let port = Attribute::uint16(AttributeType::RESPONSE_PORT, 0xf824).unwrap();
        let raw = port.to_raw(None).unwrap();
        assert_eq!(raw.to_bytes(), [0x00, 0x27, 0x00, 0x02, 0xf8, 0x24, 0x00, 0x00]);
        assert_eq!(Attribute::parse(&raw, None).unwrap(), port);

        let priority = Attribute::uint32(AttributeType::PRIORITY, 0x6e7f1eff).unwrap();
        let raw = priority.to_raw(None).unwrap();
        assert_eq!(raw.to_bytes(), [0x00, 0x24, 0x00, 0x04, 0x6e, 0x7f, 0x1e, 0xff]);
        assert_eq!(Attribute::parse(&raw, None).unwrap(), priority);

        // wrong length
        let raw = RawAttribute::new(AttributeType::PRIORITY, &[1, 2]).unwrap();
        assert!(matches!(
            Attribute::parse(&raw, None),
            Err(StunParseError::Truncated { .. })
        ));
        // two reserved bytes after the port
        let raw = RawAttribute::new(AttributeType::RESPONSE_PORT, &[0x0d, 0x96, 0, 0]).unwrap();
        assert_eq!(
            Attribute::parse(&raw, None).unwrap(),
            Attribute::uint16(AttributeType::RESPONSE_PORT, 3478).unwrap()
        );
        let raw = RawAttribute::new(AttributeType::RESPONSE_PORT, &[1, 2, 3, 4, 5]).unwrap();
        assert!(matches!(
            Attribute::parse(&raw, None),
            Err(StunParseError::TooLarge { .. })
        ));
    }

    #[test]
    fn display() {
        crate::tests::test_init_log();
        let software = Attribute::text(AttributeType::SOFTWARE, "stun").unwrap();
        assert_eq!(format!("{software}"), "32802(0x8022: SOFTWARE): 'stun'");
        let priority = Attribute::uint32(AttributeType::PRIORITY, 0x10).unwrap();
        assert_eq!(format!("{priority}"), "36(0x24: PRIORITY): 0x10");
    }
}
