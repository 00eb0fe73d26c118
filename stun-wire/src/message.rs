// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! STUN Messages
//!
//! Provides types for generating, parsing, and manipulating STUN messages as specified in
//! [RFC5389], with support for reading legacy [RFC3489] messages.
//!
//! A [`Message`] owns its header fields and an ordered list of typed [`Attribute`]s.  The order
//! of the list is the order of the attributes on the wire.
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//! [RFC3489]: https://tools.ietf.org/html/rfc3489
//!
//! ## Examples
//!
//! ### Parse a STUN [`Message`]
//!
//! ```
//! use stun_wire::attribute::AttributeType;
//! use stun_wire::message::{Message, MessageType, MessageClass, BINDING};
//!
//! let msg_data = [
//!     0x00, 0x01, 0x00, 0x0c, // method, class and length
//!     0x21, 0x12, 0xA4, 0x42, // Fixed STUN magic bytes
//!     0xd0, 0x05, 0x58, 0x70, // \
//!     0x7b, 0xb8, 0xcc, 0x6a, // } transaction ID
//!     0x63, 0x3a, 0x9d, 0xf7, // /
//!     0x00, 0x20, 0x00, 0x08, // XOR-MAPPED-ADDRESS attribute header (type and length)
//!     0x00, 0x01, 0xd9, 0x36, // family and XOR-ed port
//!     0xe1, 0xba, 0xa5, 0x61, // XOR-ed IPv4 address
//! ];
//! let msg = Message::from_bytes(&msg_data).unwrap();
//!
//! assert_eq!(msg.get_type(), MessageType::from_class_method(MessageClass::Request, BINDING));
//! assert_eq!(msg.transaction_id(), 0xd00558707bb8cc6a633a9df7.into());
//!
//! let attr = msg.attribute(AttributeType::XOR_MAPPED_ADDRESS).unwrap();
//! assert_eq!(attr.value().socket_addr(), Some("192.168.1.35:63524".parse().unwrap()));
//! ```
//!
//! ### Generating a [`Message`]
//!
//! ```
//! use stun_wire::message::{Message, BINDING};
//!
//! // Automatically generates a transaction ID.
//! let mut msg = Message::new_request(BINDING);
//! msg.add_software("stun-wire").unwrap();
//! msg.add_fingerprint().unwrap();
//!
//! let data = msg.to_bytes().unwrap();
//! assert_eq!(data.len(), 20 + 16 + 8);
//! assert_eq!(Message::from_bytes(&data).unwrap(), msg);
//! ```

use std::net::SocketAddr;

use byteorder::{BigEndian, ByteOrder};

use crate::attribute::*;
use crate::wire;

use tracing::{debug, trace, warn};

/// The value of the magic cookie (in network byte order) as specified in RFC5389.
pub const MAGIC_COOKIE: u32 = 0x2112A442;

const SOFTWARE: &str = concat!("stun-wire ", env!("CARGO_PKG_VERSION"));

/// The method in a STUN [`Message`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Method(u16);

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#x}: {})", self.0, self.0, self.name())
    }
}

impl Method {
    /// Create a new [`Method`] from an existing value
    ///
    /// # Panics
    ///
    /// If the value does not fit in the 12 bits available for a method.
    ///
    /// # Examples
    /// ```
    /// # use stun_wire::message::Method;
    /// assert_eq!(Method::new(0x123).value(), 0x123);
    /// ```
    pub const fn new(val: u16) -> Self {
        if val > 0xfff {
            panic!("Method value is out of range!");
        }
        Self(val)
    }

    /// Return the integer value of this [`Method`]
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns a human readable name of this `Method` or "unknown"
    ///
    /// # Examples
    /// ```
    /// # use stun_wire::message::*;
    /// assert_eq!(BINDING.name(), "BINDING");
    /// assert_eq!(CHANNEL_BIND.name(), "CHANNEL-BIND");
    /// ```
    pub fn name(self) -> &'static str {
        match self {
            BINDING => "BINDING",
            ALLOCATE => "ALLOCATE",
            REFRESH => "REFRESH",
            SEND => "SEND",
            DATA => "DATA",
            CREATE_PERMISSION => "CREATE-PERMISSION",
            CHANNEL_BIND => "CHANNEL-BIND",
            _ => "unknown",
        }
    }
}

/// The BINDING method
pub const BINDING: Method = Method::new(0x0001);
/// The TURN ALLOCATE method
pub const ALLOCATE: Method = Method::new(0x0003);
/// The TURN REFRESH method
pub const REFRESH: Method = Method::new(0x0004);
/// The TURN SEND method
pub const SEND: Method = Method::new(0x0006);
/// The TURN DATA method
pub const DATA: Method = Method::new(0x0007);
/// The TURN CREATE-PERMISSION method
pub const CREATE_PERMISSION: Method = Method::new(0x0008);
/// The TURN CHANNEL-BIND method
pub const CHANNEL_BIND: Method = Method::new(0x0009);

/// Possible errors when parsing a STUN message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StunParseError {
    /// Not a STUN message.
    #[error("The provided data is not a STUN message")]
    NotStun,
    /// The message has been truncated
    #[error("Not enough data available to parse the packet, expected {}, actual {}", .expected, .actual)]
    Truncated {
        /// The expeced number of bytes
        expected: usize,
        /// The encountered number of bytes
        actual: usize,
    },
    /// Too many bytes for this data
    #[error("Too many bytes for this data, expected {}, actual {}", .expected, .actual)]
    TooLarge {
        /// The expeced number of bytes
        expected: usize,
        /// The encountered number of bytes
        actual: usize,
    },
    /// Integrity value does not match computed value
    #[error("Integrity value does not match")]
    IntegrityCheckFailed,
    /// An attribute was not found in the message
    #[error("Missing attribute {}", .0)]
    MissingAttribute(AttributeType),
    /// A XOR-ed address was parsed without the transaction of its message
    #[error("Attribute {} requires a transaction id to be parsed", .0)]
    MissingTransaction(AttributeType),
    /// Fingerprint does not match the data.
    #[error("Fingerprint does not match")]
    FingerprintMismatch,
    /// The address family is not IPv4 or IPv6
    #[error("Invalid address family {:#x}", .0)]
    InvalidFamily(u8),
    /// A port of 0 was found in an address
    #[error("Invalid port 0")]
    InvalidPort,
    /// The attribute contains invalid data
    #[error("The attribute contains invalid data")]
    InvalidAttributeData,
}

/// Errors produced when constructing or writing a STUN message
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StunWriteError {
    /// The message already has this attribute
    #[error("The attribute {} already exists in the message", .0)]
    AttributeExists(AttributeType),
    /// The fingerprint attribute already exists. Cannot write any further attributes
    #[error("The message already contains a fingerprint attribute")]
    FingerprintExists,
    /// A message integrity attribute already exists. Cannot write any further attributes
    #[error("The message already contains a message intregrity attribute")]
    MessageIntegrityExists,
    /// Too many bytes for this data
    #[error("Too many bytes for this data, expected {}, actual {}", .expected, .actual)]
    TooLarge {
        /// The maximum number of bytes
        expected: usize,
        /// The encountered number of bytes
        actual: usize,
    },
    /// Not enough bytes for this data
    #[error("Not enough bytes for this data, expected {}, actual {}", .expected, .actual)]
    TooSmall {
        /// The expected number of bytes
        expected: usize,
        /// The encountered number of bytes
        actual: usize,
    },
    /// Failed to compute integrity
    #[error("Failed to compute integrity")]
    IntegrityFailed,
    /// Out of range input provided
    #[error("Out of range input provided, {} not in [{}, {}]", .value, .min, .max)]
    OutOfRange {
        /// The value provided.
        value: usize,
        /// The minimum allowed value.
        min: usize,
        /// The maximum allowed value.
        max: usize,
    },
    /// A transaction id must be 12 bytes, or 16 bytes for legacy messages
    #[error("Invalid transaction id of {} bytes", .0)]
    InvalidTransactionId(usize),
    /// The value does not match the registered value kind of the attribute type
    #[error("Attribute {} requires a {} value, not {}", .atype, .expected, .actual)]
    WrongValueKind {
        /// The attribute type.
        atype: AttributeType,
        /// The registered value kind.
        expected: ValueKind,
        /// The value kind provided.
        actual: ValueKind,
    },
    /// The attribute is not allowed in a message of this type
    #[error("Attribute {} is not allowed in a message of type {}", .atype, .mtype)]
    InvalidAttributeContext {
        /// The attribute type.
        atype: AttributeType,
        /// The type of the message.
        mtype: MessageType,
    },
    /// A XOR-ed address was written without the transaction of its message
    #[error("Attribute {} requires a transaction id to be written", .0)]
    MissingTransaction(AttributeType),
    /// Attributes of an unknown type cannot be written
    #[error("Attribute {} is of an unknown type and cannot be written", .0)]
    UnknownAttribute(AttributeType),
}

/// Structure for holding the required credentials for handling long-term STUN credentials
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct LongTermCredentials {
    username: String,
    password: String,
    realm: String,
}

impl LongTermCredentials {
    /// Create a new set of [`LongTermCredentials`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::LongTermCredentials;
    /// let credentials = LongTermCredentials::new(
    ///     "user".to_string(),
    ///     "pass".to_string(),
    ///     "realm".to_string(),
    /// );
    /// assert_eq!(credentials.username(), "user");
    /// assert_eq!(credentials.password(), "pass");
    /// assert_eq!(credentials.realm(), "realm");
    /// ```
    pub fn new(username: String, password: String, realm: String) -> Self {
        Self {
            username,
            password,
            realm,
        }
    }

    /// The configured username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The configured password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The configured realm
    pub fn realm(&self) -> &str {
        &self.realm
    }
}

/// Structure for holding the required credentials for handling short-term STUN credentials
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ShortTermCredentials {
    password: String,
}

impl ShortTermCredentials {
    /// Create a new set of [`ShortTermCredentials`]
    pub fn new(password: String) -> Self {
        Self { password }
    }

    /// The configured password
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// The credentials used to sign or verify a [`Message`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum MessageIntegrityCredentials {
    /// Short term integrity credentials.
    ShortTerm(ShortTermCredentials),
    /// Long term integrity credentials.
    LongTerm(LongTermCredentials),
}

impl From<LongTermCredentials> for MessageIntegrityCredentials {
    fn from(value: LongTermCredentials) -> Self {
        MessageIntegrityCredentials::LongTerm(value)
    }
}

impl From<ShortTermCredentials> for MessageIntegrityCredentials {
    fn from(value: ShortTermCredentials) -> Self {
        MessageIntegrityCredentials::ShortTerm(value)
    }
}

impl MessageIntegrityCredentials {
    /// The HMAC key for [`Message::add_message_integrity`].  Short-term credentials use the
    /// password as is, long-term credentials use `MD5(username ":" realm ":" password)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::*;
    /// let short: MessageIntegrityCredentials = ShortTermCredentials::new("pass".to_owned()).into();
    /// assert_eq!(short.make_hmac_key(), b"pass");
    /// let long: MessageIntegrityCredentials =
    ///     LongTermCredentials::new("user".to_owned(), "pass".to_owned(), "realm".to_owned()).into();
    /// assert_eq!(long.make_hmac_key().len(), 16);
    /// ```
    pub fn make_hmac_key(&self) -> Vec<u8> {
        match self {
            MessageIntegrityCredentials::ShortTerm(short) => short.password.clone().into(),
            MessageIntegrityCredentials::LongTerm(long) => {
                use md5::{Digest, Md5};
                let mut digest = Md5::new();
                digest.update(long.username.as_bytes());
                digest.update(b":");
                digest.update(long.realm.as_bytes());
                digest.update(b":");
                digest.update(long.password.as_bytes());
                digest.finalize().to_vec()
            }
        }
    }
}

/// The class of a [`Message`].
///
/// There are four classes of [`Message`]s within the STUN protocol:
///
///  - [Request][`MessageClass::Request`] indicates that a request is being made and a
///    response is expected.
///  - An [Indication][`MessageClass::Indication`] is a fire and forget [`Message`] where
///    no response is required or expected.
///  - [Success][`MessageClass::Success`] indicates that a [Request][`MessageClass::Request`]
///    was successfully handled.
///  - [Error][`MessageClass::Error`] class indicates that an error was produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageClass {
    /// A request that is expecting a response of either Success, or Error.
    Request,
    /// A request that does not expect a response.
    Indication,
    /// A success response to a previous Request.
    Success,
    /// An error response to a previous Request.
    Error,
}

impl MessageClass {
    const MASK: u16 = 0x0110;

    /// Returns whether this [`MessageClass`] is of a response type.  i.e. is either
    /// [`MessageClass::Success`] or [`MessageClass::Error`].
    pub fn is_response(self) -> bool {
        matches!(self, MessageClass::Success | MessageClass::Error)
    }

    fn to_bits(self) -> u16 {
        match self {
            MessageClass::Request => 0x000,
            MessageClass::Indication => 0x010,
            MessageClass::Success => 0x100,
            MessageClass::Error => 0x110,
        }
    }
}

/// The type of a [`Message`].  A combination of a [`MessageClass`] and a STUN method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageType(u16);

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MessageType(class: {:?}, method: {})",
            self.class(),
            self.method(),
        )
    }
}

impl MessageType {
    /// Create a new [`MessageType`] from the provided [`MessageClass`] and method
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Success, BINDING);
    /// assert_eq!(mtype.value(), 0x0101);
    /// assert_eq!(mtype.has_class(MessageClass::Success), true);
    /// assert_eq!(mtype.has_method(BINDING), true);
    /// ```
    pub fn from_class_method(class: MessageClass, method: Method) -> Self {
        let class_bits = MessageClass::to_bits(class);
        let method = method.value();
        let method_bits = method & 0xf | (method & 0x70) << 1 | (method & 0xf80) << 2;
        Self(class_bits | method_bits)
    }

    /// The raw 16-bit value of this [`MessageType`]
    pub fn value(self) -> u16 {
        self.0
    }

    /// Retrieves the class of a [`MessageType`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Indication, BINDING);
    /// assert_eq!(mtype.class(), MessageClass::Indication);
    /// ```
    pub fn class(self) -> MessageClass {
        match self.0 & MessageClass::MASK {
            0x000 => MessageClass::Request,
            0x010 => MessageClass::Indication,
            0x100 => MessageClass::Success,
            _ => MessageClass::Error,
        }
    }

    /// Returns whether class of a [`MessageType`] is equal to the provided [`MessageClass`]
    pub fn has_class(self, cls: MessageClass) -> bool {
        self.class() == cls
    }

    /// Returns whether the class of a [`MessageType`] indicates a response [`Message`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{MessageType, MessageClass, BINDING};
    /// assert_eq!(MessageType::from_class_method(MessageClass::Indication, BINDING)
    ///     .is_response(), false);
    /// assert_eq!(MessageType::from_class_method(MessageClass::Error, BINDING)
    ///     .is_response(), true);
    /// ```
    pub fn is_response(self) -> bool {
        self.class().is_response()
    }

    /// Returns the method of a [`MessageType`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{MessageType, MessageClass, CHANNEL_BIND};
    /// let mtype = MessageType::from_class_method(MessageClass::Error, CHANNEL_BIND);
    /// assert_eq!(mtype.method(), CHANNEL_BIND);
    /// ```
    pub fn method(self) -> Method {
        Method::new(self.0 & 0xf | (self.0 & 0xe0) >> 1 | (self.0 & 0x3e00) >> 2)
    }

    /// Returns whether the method of a [`MessageType`] is equal to the provided value
    pub fn has_method(self, method: Method) -> bool {
        self.method() == method
    }

    /// Convert a set of network bytes into a [`MessageType`] or return an error
    pub fn from_bytes(data: &[u8]) -> Result<Self, StunParseError> {
        Self::try_from(wire::read_u16(data, 0)?)
    }
}

impl TryFrom<u16> for MessageType {
    type Error = StunParseError;

    /// The two most significant bits of a STUN message type are always 0.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{MessageType, MessageClass, ALLOCATE};
    /// let mtype = MessageType::try_from(0x0113).unwrap();
    /// assert_eq!(mtype.class(), MessageClass::Error);
    /// assert_eq!(mtype.method(), ALLOCATE);
    /// assert!(MessageType::try_from(0x4001).is_err());
    /// ```
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value & 0xc000 != 0x0 {
            return Err(StunParseError::NotStun);
        }
        Ok(Self(value))
    }
}

/// A unique transaction identifier for each message and it's (possible) response.
///
/// RFC5389 transaction ids are 96 bits and follow the magic cookie in the message header.
/// Legacy RFC3489 transaction ids are 128 bits and take the place of the magic cookie.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct TransactionId {
    id: u128,
    legacy: bool,
}

impl TransactionId {
    /// The length in bytes of a RFC5389 transaction id
    pub const LENGTH: usize = 12;
    /// The length in bytes of a legacy RFC3489 transaction id
    pub const LEGACY_LENGTH: usize = 16;

    const MASK: u128 = 0xffff_ffff_ffff_ffff_ffff_ffff;

    /// Generate a new STUN transaction identifier.
    pub fn generate() -> TransactionId {
        use rand::Rng;
        let mut rng = rand::rng();
        rng.random::<u128>().into()
    }

    /// Create a legacy 128-bit transaction id.
    ///
    /// # Errors
    ///
    /// - When the first four bytes equal [`MAGIC_COOKIE`], which would be read back as an
    ///   RFC5389 transaction id.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::TransactionId;
    /// let id = TransactionId::legacy(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10).unwrap();
    /// assert!(id.is_legacy());
    /// assert_eq!(id.magic_cookie(), 0x01020304);
    /// assert!(TransactionId::legacy(0x2112a442 << 96).is_err());
    /// ```
    pub fn legacy(id: u128) -> Result<Self, StunWriteError> {
        if (id >> 96) as u32 == MAGIC_COOKIE {
            return Err(StunWriteError::InvalidTransactionId(Self::LEGACY_LENGTH));
        }
        Ok(Self { id, legacy: true })
    }

    /// Whether this is a legacy RFC3489 transaction id
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// The value of the magic cookie field written with this transaction id.
    pub fn magic_cookie(&self) -> u32 {
        (self.header_bits() >> 96) as u32
    }

    /// The transaction id in network byte order, 12 or 16 bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::TransactionId;
    /// let id = TransactionId::from(0x0102);
    /// assert_eq!(id.to_bytes(), [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2]);
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let bytes = self.id.to_be_bytes();
        if self.legacy {
            bytes.to_vec()
        } else {
            bytes[Self::LEGACY_LENGTH - Self::LENGTH..].to_vec()
        }
    }

    /// The 16 bytes following the length in the message header: the magic cookie and the
    /// transaction id.
    pub(crate) fn header_bits(&self) -> u128 {
        if self.legacy {
            self.id
        } else {
            (MAGIC_COOKIE as u128) << 96 | self.id
        }
    }

    fn from_header_bits(bits: u128) -> Self {
        if (bits >> 96) as u32 == MAGIC_COOKIE {
            bits.into()
        } else {
            Self {
                id: bits,
                legacy: true,
            }
        }
    }
}

impl From<u128> for TransactionId {
    fn from(id: u128) -> Self {
        Self {
            id: id & Self::MASK,
            legacy: false,
        }
    }
}

impl From<TransactionId> for u128 {
    fn from(id: TransactionId) -> Self {
        id.id
    }
}

impl TryFrom<&[u8]> for TransactionId {
    type Error = StunWriteError;

    /// Accepts 12 bytes or, for legacy messages, 16 bytes.
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.len() {
            Self::LENGTH => {
                let mut bytes = [0; 16];
                bytes[Self::LEGACY_LENGTH - Self::LENGTH..].copy_from_slice(value);
                Ok(u128::from_be_bytes(bytes).into())
            }
            Self::LEGACY_LENGTH => Self::legacy(BigEndian::read_u128(value)),
            len => Err(StunWriteError::InvalidTransactionId(len)),
        }
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.id)
    }
}

/// The fixed length header of a STUN message.  Allows reading the message header for a quick
/// check if this message is a valid STUN message.  Can also be used to expose the length of the
/// complete message without needing to receive the entire message.
#[derive(Debug)]
pub struct MessageHeader {
    mtype: MessageType,
    transaction_id: TransactionId,
    length: u16,
}

impl MessageHeader {
    /// The length of the STUN message header.
    pub const LENGTH: usize = 20;

    /// Deserialize a `MessageHeader`
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{MessageHeader, MessageType, MessageClass, BINDING};
    /// let msg_data = [0, 1, 0, 8, 33, 18, 164, 66, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 232];
    /// let message = MessageHeader::from_bytes(&msg_data).unwrap();
    /// assert_eq!(message.get_type(), MessageType::from_class_method(MessageClass::Request, BINDING));
    /// assert_eq!(message.transaction_id(), 1000.into());
    /// assert_eq!(message.data_length(), 8);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self, StunParseError> {
        if data.len() < Self::LENGTH {
            return Err(StunParseError::Truncated {
                expected: Self::LENGTH,
                actual: data.len(),
            });
        }
        let mtype = MessageType::from_bytes(data).map_err(|e| {
            debug!("not a STUN message type {:#x}", BigEndian::read_u16(data));
            e
        })?;
        let length = wire::read_u16(data, 2)?;
        let transaction_id = TransactionId::from_header_bits(wire::read_u128(data, 4)?);
        if transaction_id.is_legacy() {
            debug!(
                "cookie {:#x} != {:#x}, treating as a legacy message",
                transaction_id.magic_cookie(),
                MAGIC_COOKIE
            );
        }

        Ok(Self {
            mtype,
            transaction_id,
            length,
        })
    }

    /// The number of bytes of content in this [`MessageHeader`]. Adding both `data_length()`
    /// and [`MessageHeader::LENGTH`] will result in the size of the complete STUN message.
    pub fn data_length(&self) -> u16 {
        self.length
    }

    /// The [`TransactionId`] of this [`MessageHeader`]
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// The [`MessageType`] of this [`MessageHeader`]
    pub fn get_type(&self) -> MessageType {
        self.mtype
    }

    fn write_into(
        mtype: MessageType,
        transaction: &TransactionId,
        length: u16,
        dest: &mut Vec<u8>,
    ) {
        wire::write_u16(dest, mtype.value());
        wire::write_u16(dest, length);
        wire::write_u128(dest, transaction.header_bits());
    }
}

/// The structure that encapsulates the entirety of a STUN message
///
/// Contains the [`MessageType`], a [`TransactionId`], and an ordered list of [`Attribute`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    mtype: MessageType,
    transaction: TransactionId,
    attributes: Vec<Attribute>,
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Message(class: {:?}, method: {}, transaction: {}, attributes: ",
            self.class(),
            self.method(),
            self.transaction_id()
        )?;
        if self.attributes.is_empty() {
            write!(f, "[]")?;
        } else {
            write!(f, "[")?;
            for (i, attr) in self.attributes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{attr}")?;
            }
            write!(f, "]")?;
        }
        write!(f, ")")
    }
}

impl Message {
    /// Create a new [`Message`] with the provided [`MessageType`] and [`TransactionId`] and no
    /// attributes.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Indication, BINDING);
    /// let message = Message::new(mtype, 1234.into());
    /// assert!(message.has_class(MessageClass::Indication));
    /// assert!(message.has_method(BINDING));
    /// assert_eq!(message.attribute_count(), 0);
    /// ```
    pub fn new(mtype: MessageType, transaction: TransactionId) -> Self {
        Self {
            mtype,
            transaction,
            attributes: vec![],
        }
    }

    /// Create a new request [`Message`] of the provided method with a random transaction id.
    pub fn new_request(method: Method) -> Self {
        Message::new(
            MessageType::from_class_method(MessageClass::Request, method),
            TransactionId::generate(),
        )
    }

    /// Create a new success response to `orig`, reusing its method and transaction id.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, MessageClass, BINDING};
    /// let request = Message::new_request(BINDING);
    /// let response = Message::new_success(&request);
    /// assert!(response.has_class(MessageClass::Success));
    /// assert!(response.has_method(BINDING));
    /// assert_eq!(response.transaction_id(), request.transaction_id());
    /// ```
    pub fn new_success(orig: &Message) -> Self {
        Message::new(
            MessageType::from_class_method(MessageClass::Success, orig.method()),
            orig.transaction_id(),
        )
    }

    /// Create a new error response to `orig`, reusing its method and transaction id.
    pub fn new_error(orig: &Message) -> Self {
        Message::new(
            MessageType::from_class_method(MessageClass::Error, orig.method()),
            orig.transaction_id(),
        )
    }

    /// Retrieve the [`MessageType`] of a [`Message`]
    pub fn get_type(&self) -> MessageType {
        self.mtype
    }

    /// Change the [`MessageType`] of a [`Message`]
    pub fn set_type(&mut self, mtype: MessageType) {
        self.mtype = mtype;
    }

    /// Retrieve the [`MessageClass`] of a [`Message`]
    pub fn class(&self) -> MessageClass {
        self.get_type().class()
    }

    /// Returns whether the [`Message`] is of the specified [`MessageClass`]
    pub fn has_class(&self, cls: MessageClass) -> bool {
        self.class() == cls
    }

    /// Returns whether the [`Message`] is a response
    pub fn is_response(&self) -> bool {
        self.class().is_response()
    }

    /// Retrieves the method of the [`Message`]
    pub fn method(&self) -> Method {
        self.get_type().method()
    }

    /// Returns whether the [`Message`] is of the specified method
    pub fn has_method(&self, method: Method) -> bool {
        self.method() == method
    }

    /// Retrieves the [`TransactionId`] of a [`Message`]
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction
    }

    /// Replace the transaction id with 12 bytes, or 16 bytes for a legacy message.
    ///
    /// XOR-ed address attributes are written with the new transaction id from now on.
    ///
    /// # Errors
    ///
    /// - When `id` has any other length.  The message is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, BINDING};
    /// let mut message = Message::new_request(BINDING);
    /// assert!(message.set_transaction_id(&[7; 12]).is_ok());
    /// assert_eq!(message.transaction_id().to_bytes(), [7; 12]);
    /// assert!(message.set_transaction_id(&[7; 13]).is_err());
    /// assert_eq!(message.transaction_id().to_bytes(), [7; 12]);
    /// ```
    pub fn set_transaction_id(&mut self, id: &[u8]) -> Result<(), StunWriteError> {
        self.transaction = TransactionId::try_from(id)?;
        Ok(())
    }

    /// The magic cookie field of this message.  [`MAGIC_COOKIE`] unless this is a legacy
    /// message.
    pub fn magic_cookie(&self) -> u32 {
        self.transaction.magic_cookie()
    }

    /// Whether this is a legacy RFC3489 message
    pub fn is_legacy(&self) -> bool {
        self.transaction.is_legacy()
    }

    fn check_context(&self, atype: AttributeType) -> Result<(), StunWriteError> {
        let allowed = match atype {
            AttributeType::ERROR_CODE => self.has_class(MessageClass::Error),
            AttributeType::ICE_CONTROLLED | AttributeType::ICE_CONTROLLING => {
                self.has_class(MessageClass::Request) && self.has_method(BINDING)
            }
            _ => true,
        };
        if !allowed {
            warn!("attribute {atype} is not allowed in a {}", self.mtype);
            return Err(StunWriteError::InvalidAttributeContext {
                atype,
                mtype: self.mtype,
            });
        }
        Ok(())
    }

    // MESSAGE-INTEGRITY may only be followed by FINGERPRINT and nothing may follow FINGERPRINT.
    // Neither may appear twice.
    fn check_ordering(&self, atype: AttributeType) -> Result<(), StunWriteError> {
        if matches!(
            atype,
            AttributeType::MESSAGE_INTEGRITY | AttributeType::FINGERPRINT
        ) && self.has_attribute(atype)
        {
            return Err(StunWriteError::AttributeExists(atype));
        }
        if self.has_attribute(AttributeType::FINGERPRINT) {
            return Err(StunWriteError::FingerprintExists);
        }
        if atype != AttributeType::FINGERPRINT
            && self.has_attribute(AttributeType::MESSAGE_INTEGRITY)
        {
            return Err(StunWriteError::MessageIntegrityExists);
        }
        Ok(())
    }

    /// Append an [`Attribute`] to the end of this [`Message`], returning a reference to it.
    ///
    /// # Errors
    ///
    /// - When a FINGERPRINT attribute has already been added.
    /// - When a MESSAGE-INTEGRITY attribute has already been added and `attr` is not a
    ///   FINGERPRINT.
    /// - When `attr` is a second MESSAGE-INTEGRITY or FINGERPRINT.
    /// - When ERROR-CODE is added to a message that is not an error response.
    /// - When ICE-CONTROLLED or ICE-CONTROLLING is added to a message that is not a
    ///   Binding request.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::{Attribute, AttributeType};
    /// # use stun_wire::message::{Message, BINDING};
    /// let mut message = Message::new_request(BINDING);
    /// let attr = Attribute::uint32(AttributeType::PRIORITY, 0x6e0001ff).unwrap();
    /// assert_eq!(message.add_attribute(attr.clone()).unwrap(), &attr);
    /// assert_eq!(message.attribute(AttributeType::PRIORITY), Some(&attr));
    ///
    /// // ERROR-CODE is only allowed in error responses
    /// let error = Attribute::error_code(stun_wire::attribute::ErrorCode::new(400, "").unwrap());
    /// assert!(message.add_attribute(error).is_err());
    /// ```
    #[tracing::instrument(
        name = "message_add_attribute",
        level = "trace",
        err,
        skip(self, attr),
        fields(
            msg.transaction = %self.transaction_id(),
            attribute.type = %attr.get_type(),
        )
    )]
    pub fn add_attribute(&mut self, attr: Attribute) -> Result<&Attribute, StunWriteError> {
        self.check_ordering(attr.get_type())?;
        self.check_context(attr.get_type())?;
        self.attributes.push(attr);
        // just pushed
        Ok(&self.attributes[self.attributes.len() - 1])
    }

    /// Add an address attribute.  XOR-MAPPED-ADDRESS and the other XOR-ed types are XOR-ed
    /// with this message's transaction id when written.
    pub fn add_address(
        &mut self,
        atype: AttributeType,
        addr: SocketAddr,
    ) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::address(atype, addr)?)
    }

    /// Add a XOR-MAPPED-ADDRESS attribute.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, BINDING};
    /// let request = Message::new_request(BINDING);
    /// let mut response = Message::new_success(&request);
    /// let addr = "192.168.1.36:64131".parse().unwrap();
    /// response.add_xor_mapped_address(addr).unwrap();
    /// let data = response.to_bytes().unwrap();
    /// // the port is XOR-ed with the magic cookie
    /// assert_eq!(&data[24..28], &[0x00, 0x01, 0xdb, 0x91]);
    /// ```
    pub fn add_xor_mapped_address(
        &mut self,
        addr: SocketAddr,
    ) -> Result<&Attribute, StunWriteError> {
        self.add_address(AttributeType::XOR_MAPPED_ADDRESS, addr)
    }

    /// Add an ALTERNATE-SERVER attribute.
    pub fn add_alternate_server(&mut self, addr: SocketAddr) -> Result<&Attribute, StunWriteError> {
        self.add_address(AttributeType::ALTERNATE_SERVER, addr)
    }

    /// Add a USERNAME attribute of at most 512 bytes.
    pub fn add_username(&mut self, username: &str) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::text(AttributeType::USERNAME, username)?)
    }

    /// Add a REALM attribute of less than 128 characters.
    pub fn add_realm(&mut self, realm: &str) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::text(AttributeType::REALM, realm)?)
    }

    /// Add a NONCE attribute of less than 128 characters.
    pub fn add_nonce(&mut self, nonce: &str) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::text(AttributeType::NONCE, nonce)?)
    }

    /// Add a SOFTWARE attribute of less than 128 characters.
    pub fn add_software(&mut self, software: &str) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::text(AttributeType::SOFTWARE, software)?)
    }

    /// Add an ERROR-CODE attribute.  Without a `reason` the default reason phrase for `code`
    /// is used.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// # use stun_wire::message::{Message, BINDING};
    /// let request = Message::new_request(BINDING);
    /// let mut response = Message::new_error(&request);
    /// response.add_error(438, None).unwrap();
    /// let error = response.attribute(AttributeType::ERROR_CODE).unwrap();
    /// let error = error.value().error_code().unwrap();
    /// assert_eq!(error.code(), 438);
    /// assert_eq!(error.reason(), "Stale Nonce");
    ///
    /// // not an error response
    /// let mut response = Message::new_success(&request);
    /// assert!(response.add_error(400, Some("Bad Request")).is_err());
    /// ```
    pub fn add_error(
        &mut self,
        code: u16,
        reason: Option<&str>,
    ) -> Result<&Attribute, StunWriteError> {
        let mut builder = ErrorCode::builder(code);
        if let Some(reason) = reason {
            builder = builder.reason(reason);
        }
        self.add_attribute(Attribute::error_code(builder.build()?))
    }

    /// Add an UNKNOWN-ATTRIBUTES attribute listing `attributes`.
    pub fn add_unknown_attributes(
        &mut self,
        attributes: &[AttributeType],
    ) -> Result<&Attribute, StunWriteError> {
        let list = attributes.iter().collect();
        self.add_attribute(Attribute::uint16_list(
            AttributeType::UNKNOWN_ATTRIBUTES,
            list,
        )?)
    }

    /// Add an ICE PRIORITY attribute.
    pub fn add_priority(&mut self, priority: u32) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::uint32(AttributeType::PRIORITY, priority)?)
    }

    /// Add an empty ICE USE-CANDIDATE attribute.
    pub fn add_use_candidate(&mut self) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::bytes(AttributeType::USE_CANDIDATE, Vec::<u8>::new())?)
    }

    /// Add an ICE-CONTROLLED attribute with the agent's tie breaker.  Only allowed in Binding
    /// requests.
    pub fn add_ice_controlled(
        &mut self,
        tie_breaker: u64,
    ) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::bytes(
            AttributeType::ICE_CONTROLLED,
            tie_breaker.to_be_bytes(),
        )?)
    }

    /// Add an ICE-CONTROLLING attribute with the agent's tie breaker.  Only allowed in
    /// Binding requests.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, BINDING, ALLOCATE};
    /// let mut request = Message::new_request(BINDING);
    /// assert!(request.add_ice_controlling(0x1234).is_ok());
    /// let mut request = Message::new_request(ALLOCATE);
    /// assert!(request.add_ice_controlling(0x1234).is_err());
    /// ```
    pub fn add_ice_controlling(
        &mut self,
        tie_breaker: u64,
    ) -> Result<&Attribute, StunWriteError> {
        self.add_attribute(Attribute::bytes(
            AttributeType::ICE_CONTROLLING,
            tie_breaker.to_be_bytes(),
        )?)
    }

    /// Adds MESSAGE_INTEGRITY attribute to a [`Message`] using the provided key.
    ///
    /// The HMAC-SHA1 covers the message up to the MESSAGE-INTEGRITY attribute with a length
    /// field that already includes it.  See [`MessageIntegrityCredentials::make_hmac_key`] for
    /// deriving a key from credentials.
    ///
    /// # Errors
    ///
    /// - If a [`AttributeType::MESSAGE_INTEGRITY`] attribute has already been added.
    /// - If a [`AttributeType::FINGERPRINT`] attribute has already been added.
    /// - If `key` is empty.
    ///
    /// On error the message is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, BINDING};
    /// # use stun_wire::validate;
    /// let mut message = Message::new_request(BINDING);
    /// assert!(message.add_message_integrity(b"password").is_ok());
    /// assert!(validate::validate_message_integrity(&message, b"password"));
    ///
    /// // duplicate MESSAGE_INTEGRITY is an error
    /// assert!(message.add_message_integrity(b"password").is_err());
    /// ```
    #[tracing::instrument(
        name = "message_add_integrity",
        level = "trace",
        err,
        skip(self, key),
        fields(
            msg.transaction = %self.transaction_id(),
        )
    )]
    pub fn add_message_integrity(&mut self, key: &[u8]) -> Result<(), StunWriteError> {
        if key.is_empty() {
            warn!("no key provided for MESSAGE-INTEGRITY");
            return Err(StunWriteError::IntegrityFailed);
        }
        self.check_ordering(AttributeType::MESSAGE_INTEGRITY)?;

        self.attributes.push(Attribute::new_unchecked(
            AttributeType::MESSAGE_INTEGRITY,
            AttributeValue::ByteString(vec![0; integrity::LENGTH]),
        ));
        // the placeholder is included in the length field but not in the HMAC
        let hmac = self.to_bytes().and_then(|data| {
            let end = data.len() - (AttributeHeader::LENGTH + integrity::LENGTH);
            integrity::compute(&data[..end], key)
        });
        match hmac {
            Ok(hmac) => {
                if let Some(attr) = self.attributes.last_mut() {
                    attr.set_value(AttributeValue::ByteString(hmac.to_vec()));
                }
                Ok(())
            }
            Err(e) => {
                self.attributes.pop();
                Err(e)
            }
        }
    }

    /// Adds FINGERPRINT attribute to a [`Message`]
    ///
    /// # Errors
    ///
    /// - If a FINGERPRINT attribute has already been added.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, BINDING};
    /// # use stun_wire::validate;
    /// let mut message = Message::new_request(BINDING);
    /// assert!(message.add_fingerprint().is_ok());
    /// assert!(validate::validate_fingerprint(&message));
    ///
    /// // duplicate FINGERPRINT is an error
    /// assert!(message.add_fingerprint().is_err());
    /// ```
    #[tracing::instrument(
        name = "message_add_fingerprint",
        level = "trace",
        err,
        skip(self),
        fields(
            msg.transaction = %self.transaction_id(),
        )
    )]
    pub fn add_fingerprint(&mut self) -> Result<(), StunWriteError> {
        self.check_ordering(AttributeType::FINGERPRINT)?;

        self.attributes.push(Attribute::new_unchecked(
            AttributeType::FINGERPRINT,
            AttributeValue::UInt32(0),
        ));
        match self.to_bytes() {
            Ok(data) => {
                let end = data.len() - (AttributeHeader::LENGTH + 4);
                let fingerprint = fingerprint::compute(&data[..end]);
                if let Some(attr) = self.attributes.last_mut() {
                    attr.set_value(AttributeValue::UInt32(fingerprint));
                }
                Ok(())
            }
            Err(e) => {
                self.attributes.pop();
                Err(e)
            }
        }
    }

    /// Retrieve the first [`Attribute`] of type `atype`.
    pub fn attribute(&self, atype: AttributeType) -> Option<&Attribute> {
        let ret = self.attributes.iter().find(|attr| attr.get_type() == atype);
        trace!(
            "attribute {atype} {}",
            if ret.is_some() { "found" } else { "not found" }
        );
        ret
    }

    /// Whether this message contains an attribute of the specified type.
    pub fn has_attribute(&self, atype: AttributeType) -> bool {
        self.attributes.iter().any(|attr| attr.get_type() == atype)
    }

    /// Remove the first [`Attribute`] of type `atype`, returning it.  The order of the
    /// remaining attributes is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// # use stun_wire::message::{Message, BINDING};
    /// let mut message = Message::new_request(BINDING);
    /// message.add_username("user").unwrap();
    /// message.add_priority(10).unwrap();
    /// assert!(message.remove_attribute(AttributeType::USERNAME).is_some());
    /// assert!(message.remove_attribute(AttributeType::USERNAME).is_none());
    /// assert_eq!(message.attribute_count(), 1);
    /// ```
    pub fn remove_attribute(&mut self, atype: AttributeType) -> Option<Attribute> {
        let idx = self
            .attributes
            .iter()
            .position(|attr| attr.get_type() == atype)?;
        Some(self.attributes.remove(idx))
    }

    /// Iterate over the attributes of this message in wire order.
    pub fn iter_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// The number of attributes in this message
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// The number of bytes [`Message::to_bytes`] produces.
    pub fn byte_len(&self) -> usize {
        MessageHeader::LENGTH
            + self
                .attributes
                .iter()
                .map(|attr| attr.padded_len())
                .sum::<usize>()
    }

    /// Serialize this [`Message`].
    ///
    /// # Errors
    ///
    /// - When an attribute of an unknown type is present.
    /// - When the attributes do not fit into the 16-bit length field.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::message::{Message, MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Request, BINDING);
    /// let mut message = Message::new(mtype, 0x0102.into());
    /// message.add_priority(0x10).unwrap();
    /// assert_eq!(message.to_bytes().unwrap(), [
    ///     0x00, 0x01, 0x00, 0x08,
    ///     0x21, 0x12, 0xa4, 0x42,
    ///     0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00, 0x00, 0x00,
    ///     0x00, 0x00, 0x01, 0x02,
    ///     0x00, 0x24, 0x00, 0x04,
    ///     0x00, 0x00, 0x00, 0x10,
    /// ]);
    /// ```
    pub fn to_bytes(&self) -> Result<Vec<u8>, StunWriteError> {
        let mut raws = Vec::with_capacity(self.attributes.len());
        let mut length = 0;
        for attr in &self.attributes {
            let raw = attr.to_raw(Some(&self.transaction))?;
            length += raw.padded_len();
            raws.push(raw);
        }
        let length = u16::try_from(length).map_err(|_| StunWriteError::TooLarge {
            expected: u16::MAX as usize,
            actual: length,
        })?;
        let mut out = Vec::with_capacity(MessageHeader::LENGTH + length as usize);
        MessageHeader::write_into(self.mtype, &self.transaction, length, &mut out);
        for raw in &raws {
            raw.write_into(&mut out);
        }
        Ok(out)
    }

    /// Deserialize a `Message`
    ///
    /// Exactly the number of attribute bytes advertised in the header are parsed, any trailing
    /// data is ignored.  Checksums are not verified; see [`crate::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// # use stun_wire::message::{Message, MessageType, MessageClass, BINDING};
    /// let msg_data = vec![0, 1, 0, 8, 33, 18, 164, 66, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 232, 0x80, 0x22, 0, 1, 0x61, 0, 0, 0];
    /// let message = Message::from_bytes(&msg_data).unwrap();
    /// let attr = message.attribute(AttributeType::SOFTWARE).unwrap();
    /// assert_eq!(attr.value().as_str(), Some("a"));
    /// assert_eq!(message.get_type(), MessageType::from_class_method(MessageClass::Request, BINDING));
    /// assert_eq!(message.transaction_id(), 1000.into());
    /// ```
    #[tracing::instrument(
        name = "message_from_bytes",
        level = "trace",
        skip(data),
        fields(
            data.len = data.len()
        )
    )]
    pub fn from_bytes(data: &[u8]) -> Result<Self, StunParseError> {
        let header = MessageHeader::from_bytes(data)?;
        let end = header.data_length() as usize + MessageHeader::LENGTH;
        if end > data.len() {
            warn!(
                "malformed advertised size {} and data size {} don't match",
                end,
                data.len()
            );
            return Err(StunParseError::Truncated {
                expected: end,
                actual: data.len(),
            });
        }
        if end < data.len() {
            trace!("ignoring {} bytes after the message", data.len() - end);
        }

        let transaction = header.transaction_id();
        let mut attributes = vec![];
        let mut data_offset = MessageHeader::LENGTH;
        while data_offset < end {
            let raw = RawAttribute::from_bytes(&data[data_offset..end]).map_err(|e| {
                warn!("failed to parse message attribute at offset {data_offset}: {e}");
                match e {
                    StunParseError::Truncated { expected, actual } => StunParseError::Truncated {
                        expected: expected + data_offset,
                        actual: actual + data_offset,
                    },
                    e => e,
                }
            })?;
            let padded_len = raw.padded_len();
            if data_offset + padded_len > end {
                warn!(
                    "attribute {} extends past the end of the data",
                    raw.get_type()
                );
                return Err(StunParseError::Truncated {
                    expected: data_offset + padded_len,
                    actual: end,
                });
            }
            let attr = Attribute::parse(&raw, Some(&transaction)).map_err(|e| {
                warn!(
                    "failed to parse attribute {} at offset {data_offset}: {e}",
                    raw.get_type()
                );
                e
            })?;
            attributes.push(attr);
            data_offset += padded_len;
        }

        Ok(Self {
            mtype: header.get_type(),
            transaction,
            attributes,
        })
    }

    /// Check that a message only contains comprehension-required attributes from `supported`
    /// and contains every attribute in `required_in_msg`.  Otherwise an error response is
    /// returned: 420 (Unknown Attribute) listing the unsupported types, or 400 (Bad Request).
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// # use stun_wire::message::{Message, BINDING};
    /// let mut message = Message::new_request(BINDING);
    /// message.add_username("user").unwrap();
    /// // If a Username is in the message but is not advertised as supported then an
    /// // 'UNKNOWN-ATTRIBUTES' error response is returned
    /// let error_msg = Message::check_attribute_types(&message, &[], &[]).unwrap().unwrap();
    /// assert!(error_msg.is_response());
    /// let error_code = error_msg.attribute(AttributeType::ERROR_CODE).unwrap();
    /// assert_eq!(error_code.value().error_code().unwrap().code(), 420);
    /// assert!(error_msg.has_attribute(AttributeType::UNKNOWN_ATTRIBUTES));
    ///
    /// assert!(Message::check_attribute_types(&message, &[AttributeType::USERNAME], &[])
    ///     .unwrap()
    ///     .is_none());
    /// ```
    #[tracing::instrument(
        level = "trace",
        skip(msg),
        fields(
            msg.transaction = %msg.transaction_id(),
        )
    )]
    pub fn check_attribute_types(
        msg: &Message,
        supported: &[AttributeType],
        required_in_msg: &[AttributeType],
    ) -> Result<Option<Message>, StunWriteError> {
        let unsupported: Vec<AttributeType> = msg
            .iter_attributes()
            .map(|a| a.get_type())
            // attribute types that require comprehension but are not supported by the caller
            .filter(|at| at.comprehension_required() && !supported.contains(at))
            .collect();
        if !unsupported.is_empty() {
            warn!(
                "Message contains unknown comprehension required attributes {:?}, returning unknown attributes",
                unsupported
            );
            return Message::unknown_attributes(msg, &unsupported).map(Some);
        }
        let has_required_attribute_missing = required_in_msg
            .iter()
            .any(|&at| !msg.has_attribute(at));
        if has_required_attribute_missing {
            warn!("Message is missing required attributes, returning bad request");
            return Message::bad_request(msg).map(Some);
        }
        Ok(None)
    }

    /// Generate an error message with an ERROR-CODE attribute signalling 'Unknown Attribute'
    /// and an UNKNOWN-ATTRIBUTES attribute containing the attributes that are unknown.
    pub fn unknown_attributes(
        src: &Message,
        attributes: &[AttributeType],
    ) -> Result<Message, StunWriteError> {
        let mut out = Message::new_error(src);
        out.add_software(SOFTWARE)?;
        out.add_error(ErrorCode::UNKNOWN_ATTRIBUTE, None)?;
        if !attributes.is_empty() {
            out.add_unknown_attributes(attributes)?;
        }
        Ok(out)
    }

    /// Generate an error message with an ERROR-CODE attribute signalling a 'Bad Request'
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::AttributeType;
    /// # use stun_wire::message::{Message, BINDING};
    /// let msg = Message::new_request(BINDING);
    /// let error_msg = Message::bad_request(&msg).unwrap();
    /// let error_code = error_msg.attribute(AttributeType::ERROR_CODE).unwrap();
    /// assert_eq!(error_code.value().error_code().unwrap().code(), 400);
    /// ```
    pub fn bad_request(src: &Message) -> Result<Message, StunWriteError> {
        let mut out = Message::new_error(src);
        out.add_software(SOFTWARE)?;
        out.add_error(ErrorCode::BAD_REQUEST, None)?;
        Ok(out)
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = StunParseError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Message::from_bytes(value)
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn binding_response(transaction: &str) -> Message {
        let mut msg = Message::new(
            MessageType::from_class_method(MessageClass::Success, BINDING),
            0.into(),
        );
        msg.set_transaction_id(&hex(transaction)).unwrap();
        msg
    }

    #[test]
    fn msg_type_roundtrip() {
        crate::tests::test_init_log();
        /* validate that all methods/classes survive a roundtrip */
        for m in 0..0xfff {
            let m = Method::new(m);
            let classes = vec![
                MessageClass::Request,
                MessageClass::Indication,
                MessageClass::Success,
                MessageClass::Error,
            ];
            for c in classes {
                let mtype = MessageType::from_class_method(c, m);
                assert_eq!(mtype.class(), c);
                assert_eq!(mtype.method(), m);
                assert_eq!(mtype.value() & 0xc000, 0);
                assert_eq!(MessageType::try_from(mtype.value()).unwrap(), mtype);
            }
        }
    }

    #[test]
    fn msg_type_classification() {
        crate::tests::test_init_log();
        assert_eq!(MessageType(0x0001).class(), MessageClass::Request);
        assert_eq!(MessageType(0x0011).class(), MessageClass::Indication);
        assert_eq!(MessageType(0x0101).class(), MessageClass::Success);
        assert_eq!(MessageType(0x0111).class(), MessageClass::Error);
        assert_eq!(MessageType(0x0003).method(), ALLOCATE);
        assert_eq!(MessageType(0x0009).method(), CHANNEL_BIND);
    }

    #[test]
    fn transaction_id_lengths() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        let orig = msg.transaction_id();
        for len in [0, 11, 13, 15, 17, 20] {
            assert!(matches!(
                msg.set_transaction_id(&vec![1; len]),
                Err(StunWriteError::InvalidTransactionId(l)) if l == len
            ));
            assert_eq!(msg.transaction_id(), orig);
        }
        msg.set_transaction_id(&[2; 16]).unwrap();
        assert!(msg.is_legacy());
        assert_eq!(msg.magic_cookie(), 0x02020202);
        assert_eq!(msg.transaction_id().to_bytes(), [2; 16]);
        msg.set_transaction_id(&[3; 12]).unwrap();
        assert!(!msg.is_legacy());
        assert_eq!(msg.magic_cookie(), MAGIC_COOKIE);
        // a legacy id that looks like a magic cookie
        let mut id = [0; 16];
        id[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        assert!(msg.set_transaction_id(&id).is_err());
    }

    #[test]
    fn generated_transaction_ids_differ() {
        crate::tests::test_init_log();
        let a = Message::new_request(BINDING);
        let b = Message::new_request(BINDING);
        assert_ne!(a.transaction_id(), b.transaction_id());
        assert_eq!(a.transaction_id().to_bytes().len(), 12);
        assert!(!a.is_legacy());
    }

    #[test]
    fn fingerprint_vector() {
        crate::tests::test_init_log();
        let mut msg = binding_response("644d4f37326c71514d4f4a51");
        msg.add_xor_mapped_address("192.168.1.35:60689".parse().unwrap())
            .unwrap();
        msg.add_attribute(
            Attribute::bytes(
                AttributeType::MESSAGE_INTEGRITY,
                hex("a8fbde3bdc5ff7ab1e852a8c2cc6ef651cb74889"),
            )
            .unwrap(),
        )
        .unwrap();
        msg.add_fingerprint().unwrap();
        assert_eq!(
            msg.to_bytes().unwrap(),
            hex("0101002c2112a442644d4f37326c71514d4f4a51002000080001cc03e1baa56100080014a8fbde3bdc5ff7ab1e852a8c2cc6ef651cb74889802800042748c3bb")
        );
    }

    #[test]
    fn message_integrity_vector() {
        crate::tests::test_init_log();
        let mut msg = binding_response("6f576f544a34445674305276");
        msg.add_xor_mapped_address("192.168.1.36:64131".parse().unwrap())
            .unwrap();
        msg.add_message_integrity(b"6Gzr+PH5Krjg0VqBa81nE7n6")
            .unwrap();
        assert_eq!(
            msg.to_bytes().unwrap(),
            hex("010100242112a4426f576f544a34445674305276002000080001db91e1baa56600080014e161f72ee71ed9f6accaef828ec42f19a809045a")
        );
    }

    #[test]
    fn decode_binding_request() {
        crate::tests::test_init_log();
        let data = hex("0001000c2112a442d00558707bb8cc6a633a9df7002000080001d936e1baa561");
        let msg = Message::from_bytes(&data).unwrap();
        assert!(msg.has_class(MessageClass::Request));
        assert!(msg.has_method(BINDING));
        assert_eq!(msg.magic_cookie(), MAGIC_COOKIE);
        assert_eq!(
            msg.transaction_id().to_bytes(),
            hex("d00558707bb8cc6a633a9df7")
        );
        assert_eq!(msg.attribute_count(), 1);
        let attr = msg.attribute(AttributeType::XOR_MAPPED_ADDRESS).unwrap();
        assert_eq!(
            attr.value(),
            &AttributeValue::XorAddress("192.168.1.35:63524".parse().unwrap())
        );
        assert_eq!(msg.to_bytes().unwrap(), data);
    }

    #[test]
    fn roundtrip() {
        crate::tests::test_init_log();
        let request = Message::new_request(BINDING);
        let mut msg = Message::new_error(&request);
        msg.add_address(
            AttributeType::MAPPED_ADDRESS,
            "192.168.1.2:63524".parse().unwrap(),
        )
        .unwrap();
        msg.add_xor_mapped_address("[2001:db8::1]:3478".parse().unwrap())
            .unwrap();
        msg.add_address(
            AttributeType::XOR_RELAYED_ADDRESS,
            "10.0.0.1:50000".parse().unwrap(),
        )
        .unwrap();
        msg.add_alternate_server("[::1]:3479".parse().unwrap())
            .unwrap();
        msg.add_username("user:name").unwrap();
        msg.add_realm("example.org").unwrap();
        msg.add_nonce("f//499k954d6OL34oL9FSTvy64sA").unwrap();
        msg.add_software("stun-wire test").unwrap();
        msg.add_error(420, Some("Unknown Attribute")).unwrap();
        msg.add_unknown_attributes(&[AttributeType::new(0x0031), AttributeType::USERNAME])
            .unwrap();
        msg.add_attribute(Attribute::uint16(AttributeType::RESPONSE_PORT, 3478).unwrap())
            .unwrap();
        msg.add_attribute(Attribute::uint32(AttributeType::LIFETIME, 600).unwrap())
            .unwrap();
        msg.add_attribute(Attribute::bytes(AttributeType::DATA, [1u8, 2, 3, 4, 5]).unwrap())
            .unwrap();
        msg.add_message_integrity(b"key").unwrap();
        msg.add_fingerprint().unwrap();

        let data = msg.to_bytes().unwrap();
        assert_eq!(data.len(), msg.byte_len());
        assert_eq!(data.len() % 4, 0);
        let parsed = Message::from_bytes(&data).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(parsed.get_type(), msg.get_type());
        assert_eq!(parsed.transaction_id(), msg.transaction_id());
        assert_eq!(parsed.magic_cookie(), msg.magic_cookie());
        assert!(parsed
            .iter_attributes()
            .map(|a| a.get_type())
            .eq(msg.iter_attributes().map(|a| a.get_type())));
    }

    #[test]
    fn legacy_roundtrip() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        msg.set_transaction_id(&hex("000102030405060708090a0b0c0d0e0f"))
            .unwrap();
        msg.add_address(
            AttributeType::MAPPED_ADDRESS,
            "192.168.1.2:63524".parse().unwrap(),
        )
        .unwrap();
        let data = msg.to_bytes().unwrap();
        assert_eq!(&data[4..20], &hex("000102030405060708090a0b0c0d0e0f")[..]);
        let parsed = Message::from_bytes(&data).unwrap();
        assert!(parsed.is_legacy());
        assert_eq!(parsed.magic_cookie(), 0x00010203);
        assert_eq!(parsed, msg);
    }

    #[test]
    fn remove_attribute_keeps_order() {
        crate::tests::test_init_log();
        let build = || {
            let mut msg = Message::new_request(BINDING);
            msg.add_username("user").unwrap();
            msg.add_priority(1).unwrap();
            msg.add_software("sw").unwrap();
            msg
        };
        let types = |msg: &Message| msg.iter_attributes().map(|a| a.get_type()).collect::<Vec<_>>();

        let mut msg = build();
        let removed = msg.remove_attribute(AttributeType::USERNAME).unwrap();
        assert_eq!(removed.value().as_str(), Some("user"));
        assert_eq!(
            types(&msg),
            [AttributeType::PRIORITY, AttributeType::SOFTWARE]
        );

        let mut msg = build();
        assert!(msg.remove_attribute(AttributeType::PRIORITY).is_some());
        assert_eq!(
            types(&msg),
            [AttributeType::USERNAME, AttributeType::SOFTWARE]
        );

        let mut msg = build();
        assert!(msg.remove_attribute(AttributeType::SOFTWARE).is_some());
        assert_eq!(
            types(&msg),
            [AttributeType::USERNAME, AttributeType::PRIORITY]
        );

        assert!(msg.remove_attribute(AttributeType::REALM).is_none());
        assert_eq!(msg.attribute_count(), 2);
    }

    #[test]
    fn removed_xor_address_is_detached() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        msg.add_xor_mapped_address("192.168.1.35:60689".parse().unwrap())
            .unwrap();
        let attr = msg
            .remove_attribute(AttributeType::XOR_MAPPED_ADDRESS)
            .unwrap();
        assert!(matches!(
            attr.to_raw(None),
            Err(StunWriteError::MissingTransaction(_))
        ));
    }

    #[test]
    fn xor_address_follows_transaction_id() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        let addr: SocketAddr = "[2001:db8::1]:3478".parse().unwrap();
        msg.add_xor_mapped_address(addr).unwrap();
        msg.set_transaction_id(&[9; 12]).unwrap();
        let parsed = Message::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        let attr = parsed.attribute(AttributeType::XOR_MAPPED_ADDRESS).unwrap();
        assert_eq!(attr.value().socket_addr(), Some(addr));
    }

    #[test]
    fn iteration_reflects_current_state() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        msg.add_priority(1).unwrap();
        assert_eq!(msg.iter_attributes().count(), 1);
        msg.add_use_candidate().unwrap();
        assert_eq!(msg.iter_attributes().count(), 2);
        assert_eq!((&msg).into_iter().count(), 2);
        msg.remove_attribute(AttributeType::PRIORITY);
        let types: Vec<_> = msg.iter_attributes().map(|a| a.get_type()).collect();
        assert_eq!(types, [AttributeType::USE_CANDIDATE]);
    }

    #[test]
    fn attribute_context() {
        crate::tests::test_init_log();
        let request = Message::new_request(BINDING);
        let mut success = Message::new_success(&request);
        assert!(matches!(
            success.add_error(400, None),
            Err(StunWriteError::InvalidAttributeContext {
                atype: AttributeType::ERROR_CODE,
                ..
            })
        ));
        assert!(matches!(
            success.add_ice_controlled(1),
            Err(StunWriteError::InvalidAttributeContext {
                atype: AttributeType::ICE_CONTROLLED,
                ..
            })
        ));
        assert_eq!(success.attribute_count(), 0);

        let mut indication = Message::new(
            MessageType::from_class_method(MessageClass::Indication, BINDING),
            TransactionId::generate(),
        );
        assert!(indication.add_ice_controlling(1).is_err());

        let mut request = Message::new_request(BINDING);
        request.add_ice_controlled(0x0102030405060708).unwrap();
        let attr = request.attribute(AttributeType::ICE_CONTROLLED).unwrap();
        assert_eq!(attr.value().as_bytes(), Some(&[1, 2, 3, 4, 5, 6, 7, 8][..]));
    }

    #[test]
    fn invalid_values_leave_message_unchanged() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        assert!(msg.add_username(&"a".repeat(513)).is_err());
        assert!(msg.add_nonce(&"n".repeat(128)).is_err());
        assert!(msg
            .add_xor_mapped_address("1.2.3.4:0".parse().unwrap())
            .is_err());
        assert!(msg
            .add_address(AttributeType::USERNAME, "1.2.3.4:1".parse().unwrap())
            .is_err());
        assert_eq!(msg.attribute_count(), 0);
    }

    #[test]
    fn attributes_after_integrity() {
        crate::tests::test_init_log();
        let mut msg = Message::new_request(BINDING);
        assert!(matches!(
            msg.add_message_integrity(b""),
            Err(StunWriteError::IntegrityFailed)
        ));
        assert_eq!(msg.attribute_count(), 0);
        msg.add_message_integrity(b"secret").unwrap();
        assert!(matches!(
            msg.add_software("late"),
            Err(StunWriteError::MessageIntegrityExists)
        ));
        assert!(matches!(
            msg.add_message_integrity(b"secret"),
            Err(StunWriteError::AttributeExists(AttributeType::MESSAGE_INTEGRITY))
        ));
        let integrity = Attribute::bytes(AttributeType::MESSAGE_INTEGRITY, [0u8; 20]).unwrap();
        assert!(matches!(
            msg.add_attribute(integrity),
            Err(StunWriteError::AttributeExists(AttributeType::MESSAGE_INTEGRITY))
        ));
        assert_eq!(msg.attribute_count(), 1);
        msg.add_fingerprint().unwrap();
        assert!(matches!(
            msg.add_software("late"),
            Err(StunWriteError::FingerprintExists)
        ));
        assert!(matches!(
            msg.add_fingerprint(),
            Err(StunWriteError::AttributeExists(AttributeType::FINGERPRINT))
        ));
        let fingerprint = Attribute::uint32(AttributeType::FINGERPRINT, 0).unwrap();
        assert!(matches!(
            msg.add_attribute(fingerprint),
            Err(StunWriteError::AttributeExists(AttributeType::FINGERPRINT))
        ));
        let mut other = Message::new_request(BINDING);
        other.add_fingerprint().unwrap();
        assert!(matches!(
            other.add_message_integrity(b"secret"),
            Err(StunWriteError::FingerprintExists)
        ));
        assert_eq!(other.attribute_count(), 1);
    }

    #[test]
    fn unknown_attribute_not_encoded() {
        crate::tests::test_init_log();
        let mut data = hex("000100082112a442000000000000000000000001888800020102");
        data.extend([0, 0]);
        let mut msg = Message::from_bytes(&data).unwrap();
        let attr = msg.attribute(AttributeType::new(0x8888)).unwrap();
        assert_eq!(attr.value(), &AttributeValue::Unknown(vec![1, 2]));
        assert!(matches!(
            msg.to_bytes(),
            Err(StunWriteError::UnknownAttribute(_))
        ));
        // a failed checksum leaves the message as it was
        assert!(msg.add_fingerprint().is_err());
        assert_eq!(msg.attribute_count(), 1);
        msg.remove_attribute(AttributeType::new(0x8888));
        assert!(msg.to_bytes().is_ok());
    }

    #[test]
    fn parse_truncated_header() {
        crate::tests::test_init_log();
        let data = hex("0001000c2112a442d00558707bb8cc6a633a9df7");
        for len in 0..20 {
            assert!(matches!(
                Message::from_bytes(&data[..len]),
                Err(StunParseError::Truncated { expected: 20, actual }) if actual == len
            ));
        }
    }

    #[test]
    fn parse_truncated_message() {
        crate::tests::test_init_log();
        let data = hex("0001000c2112a442d00558707bb8cc6a633a9df7002000080001d936e1baa561");
        assert!(matches!(
            Message::from_bytes(&data[..30]),
            Err(StunParseError::Truncated {
                expected: 32,
                actual: 30
            })
        ));
        // attribute length runs past the advertised message length
        let mut data = data;
        data[3] = 0x08;
        assert!(matches!(
            Message::from_bytes(&data),
            Err(StunParseError::Truncated { .. })
        ));
        // an attribute header cut short
        let data = hex("000100022112a442d00558707bb8cc6a633a9df70020");
        assert!(matches!(
            Message::from_bytes(&data),
            Err(StunParseError::Truncated { .. })
        ));
    }

    #[test]
    fn parse_not_stun() {
        crate::tests::test_init_log();
        let mut data = hex("0001000c2112a442d00558707bb8cc6a633a9df7002000080001d936e1baa561");
        data[0] = 0x80;
        assert!(matches!(
            Message::from_bytes(&data),
            Err(StunParseError::NotStun)
        ));
    }

    #[test]
    fn parse_malformed_attribute() {
        crate::tests::test_init_log();
        // address family 3
        let data = hex("0001000c2112a442d00558707bb8cc6a633a9df7000100080003f824c0a80102");
        assert!(matches!(
            Message::from_bytes(&data),
            Err(StunParseError::InvalidFamily(3))
        ));
    }

    #[test]
    fn parse_ignores_trailing_data() {
        crate::tests::test_init_log();
        let mut data = hex("0001000c2112a442d00558707bb8cc6a633a9df7002000080001d936e1baa561");
        data.extend([0xff; 7]);
        let msg = Message::from_bytes(&data).unwrap();
        assert_eq!(msg.attribute_count(), 1);
    }

    #[test]
    fn error_responses() {
        crate::tests::test_init_log();
        let mut request = Message::new_request(BINDING);
        request.add_username("user").unwrap();
        request
            .add_attribute(Attribute::new_unchecked(
                AttributeType::new(0x0031),
                AttributeValue::Unknown(vec![1]),
            ))
            .unwrap();
        let response = Message::check_attribute_types(&request, &[AttributeType::USERNAME], &[])
            .unwrap()
            .unwrap();
        assert!(response.has_class(MessageClass::Error));
        assert_eq!(response.transaction_id(), request.transaction_id());
        let unknown = response
            .attribute(AttributeType::UNKNOWN_ATTRIBUTES)
            .unwrap()
            .value()
            .uint16_list()
            .unwrap();
        assert_eq!(unknown.iter().collect::<Vec<_>>(), [0x0031]);
        let software = response.attribute(AttributeType::SOFTWARE).unwrap();
        assert_eq!(software.value().as_str(), Some(SOFTWARE));

        let response = Message::check_attribute_types(
            &request,
            &[AttributeType::USERNAME, AttributeType::new(0x0031)],
            &[AttributeType::PRIORITY],
        )
        .unwrap()
        .unwrap();
        let error = response.attribute(AttributeType::ERROR_CODE).unwrap();
        assert_eq!(error.value().error_code().unwrap().code(), 400);
    }

    #[test]
    fn display() {
        crate::tests::test_init_log();
        let mut msg = Message::new(
            MessageType::from_class_method(MessageClass::Request, BINDING),
            0x10.into(),
        );
        assert_eq!(
            format!("{msg}"),
            "Message(class: Request, method: 1(0x1: BINDING), transaction: 0x10, attributes: [])"
        );
        msg.add_priority(2).unwrap();
        assert_eq!(
            format!("{msg}"),
            "Message(class: Request, method: 1(0x1: BINDING), transaction: 0x10, attributes: [36(0x24: PRIORITY): 0x2])"
        );
    }

    #[test]
    fn scoped_ipv6_address_rejected() {
        crate::tests::test_init_log();
        let mut msg = binding_response("6f576f544a34445674305276");
        assert!(matches!(
            msg.add_xor_mapped_address("[fe80::1%3]:1000".parse().unwrap()),
            Err(StunWriteError::OutOfRange { value: 3, .. })
        ));
        assert_eq!(msg.attribute_count(), 0);
        msg.add_xor_mapped_address("[fe80::1]:1000".parse().unwrap())
            .unwrap();
        let decoded = Message::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn response_port_with_reserved_bytes() {
        crate::tests::test_init_log();
        let data = hex("000100082112a442000000000000000000000001002700040d960000");
        let msg = Message::from_bytes(&data).unwrap();
        let port = msg.attribute(AttributeType::RESPONSE_PORT).unwrap();
        assert_eq!(port.value(), &AttributeValue::UInt16(3478));
    }
}
