// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! STUN
//!
//! A codec for STUN messages ([RFC5389]) and their attributes, with read support for legacy
//! [RFC3489] messages.
//!
//! - [`wire`]: bounds checked big-endian reads and writes.
//! - [`attribute`]: the attribute registry and typed attribute values.
//! - [`message`]: message headers, encoding, decoding and the checksum attributes.
//! - [`validate`]: FINGERPRINT and MESSAGE-INTEGRITY verification.
//!
//! No I/O is performed.  Decoding never panics on malformed input.
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//! [RFC3489]: https://tools.ietf.org/html/rfc3489

pub mod attribute;
pub mod message;
pub mod validate;
pub mod wire;

pub mod prelude {
    pub use crate::attribute::{Attribute, AttributeType, AttributeValue, ValueKind};
    pub use crate::message::{
        Message, MessageClass, MessageType, Method, StunParseError, StunWriteError,
        TransactionId,
    };
    pub use crate::validate::{validate_fingerprint, validate_message_integrity};
}
