// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::message::{StunParseError, StunWriteError};

use super::check_len;

const MAX_REASON_CHARS: usize = 127;
const MAX_REASON_BYTES: usize = 763;

/// The value of an ERROR-CODE attribute: a numeric code in the range [300, 699] and a reason
/// phrase.
///
/// On the wire the code is split into a class (hundreds) and a number (`code % 100`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    code: u16,
    reason: String,
}

/// Builder for an [`ErrorCode`]
pub struct ErrorCodeBuilder<'reason> {
    code: u16,
    reason: Option<&'reason str>,
}

impl<'reason> ErrorCodeBuilder<'reason> {
    fn new(code: u16) -> Self {
        Self { code, reason: None }
    }

    /// Set the custom reason for this [`ErrorCode`]
    pub fn reason(mut self, reason: &'reason str) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Create the [`ErrorCode`] with the configured paramaters
    ///
    /// # Errors
    ///
    /// - When the code value is out of range [300, 699]
    /// - When the reason is 128 characters or longer
    pub fn build(self) -> Result<ErrorCode, StunWriteError> {
        let reason = self
            .reason
            .unwrap_or_else(|| ErrorCode::default_reason_for_code(self.code));
        ErrorCode::new(self.code, reason)
    }
}

impl ErrorCode {
    pub const TRY_ALTERNATE: u16 = 300;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const UNKNOWN_ATTRIBUTE: u16 = 420;
    pub const STALE_CREDENTIALS: u16 = 430;
    pub const ALLOCATION_MISMATCH: u16 = 437;
    pub const STALE_NONCE: u16 = 438;
    pub const WRONG_CREDENTIALS: u16 = 441;
    pub const UNSUPPORTED_TRANSPORT_PROTOCOL: u16 = 442;
    pub const ALLOCATION_QUOTA_REACHED: u16 = 486;
    pub const ROLE_CONFLICT: u16 = 487;
    pub const SERVER_ERROR: u16 = 500;
    pub const INSUFFICIENT_CAPACITY: u16 = 508;
    pub const GLOBAL_FAILURE: u16 = 600;

    /// Create a builder for creating a new [`ErrorCode`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::ErrorCode;
    /// let error = ErrorCode::builder(400).reason("bad error").build().unwrap();
    /// assert_eq!(error.code(), 400);
    /// assert_eq!(error.reason(), "bad error");
    /// let error = ErrorCode::builder(ErrorCode::ROLE_CONFLICT).build().unwrap();
    /// assert_eq!(error.reason(), "Role Conflict");
    /// ```
    pub fn builder<'reason>(code: u16) -> ErrorCodeBuilder<'reason> {
        ErrorCodeBuilder::new(code)
    }

    /// Create a new [`ErrorCode`]
    ///
    /// # Errors
    ///
    /// - When the code value is out of range [300, 699]
    /// - When the reason is 128 characters or longer
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::ErrorCode;
    /// let error = ErrorCode::new(420, "Unknown Attribute").unwrap();
    /// assert_eq!(error.code(), 420);
    /// assert!(ErrorCode::new(299, "").is_err());
    /// assert!(ErrorCode::new(700, "").is_err());
    /// ```
    pub fn new(code: u16, reason: &str) -> Result<Self, StunWriteError> {
        if !(300..700).contains(&code) {
            return Err(StunWriteError::OutOfRange {
                value: code as usize,
                min: 300,
                max: 699,
            });
        }
        let chars = reason.chars().count();
        if chars > MAX_REASON_CHARS {
            return Err(StunWriteError::TooLarge {
                expected: MAX_REASON_CHARS,
                actual: chars,
            });
        }
        Ok(Self {
            code,
            reason: reason.to_owned(),
        })
    }

    /// The error code value
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The error code reason string
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The class of the error (the hundreds digit of the code)
    pub fn class(&self) -> u8 {
        (self.code / 100) as u8
    }

    /// The number of the error within its class
    pub fn number(&self) -> u8 {
        (self.code % 100) as u8
    }

    /// Return the default reason string for some error code values or "Unknown"
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::ErrorCode;
    /// assert_eq!(ErrorCode::default_reason_for_code(300), "Try Alternate Server");
    /// assert_eq!(ErrorCode::default_reason_for_code(599), "Unknown");
    /// ```
    pub fn default_reason_for_code(code: u16) -> &'static str {
        match code {
            Self::TRY_ALTERNATE => "Try Alternate Server",
            Self::BAD_REQUEST => "Bad Request",
            Self::UNAUTHORIZED => "Unauthorized",
            Self::FORBIDDEN => "Forbidden",
            Self::UNKNOWN_ATTRIBUTE => "Unknown Attribute",
            Self::STALE_CREDENTIALS => "Stale Credentials",
            Self::ALLOCATION_MISMATCH => "Allocation Mismatch",
            Self::STALE_NONCE => "Stale Nonce",
            Self::WRONG_CREDENTIALS => "Wrong Credentials",
            Self::UNSUPPORTED_TRANSPORT_PROTOCOL => "Unsupported Transport Protocol",
            Self::ALLOCATION_QUOTA_REACHED => "Allocation Quota Reached",
            Self::ROLE_CONFLICT => "Role Conflict",
            Self::SERVER_ERROR => "Server Error",
            Self::INSUFFICIENT_CAPACITY => "Insufficient Capacity",
            Self::GLOBAL_FAILURE => "Global Failure",
            _ => "Unknown",
        }
    }

    pub(super) fn length(&self) -> usize {
        4 + self.reason.len()
    }

    pub(super) fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.length());
        data.extend_from_slice(&[0, 0, self.class(), self.number()]);
        data.extend_from_slice(self.reason.as_bytes());
        data
    }

    pub(super) fn decode(data: &[u8]) -> Result<Self, StunParseError> {
        check_len(data.len(), 4..=MAX_REASON_BYTES + 4)?;
        let class = (data[2] & 0x7) as u16;
        let number = data[3] as u16;
        if !(3..7).contains(&class) || number > 99 {
            return Err(StunParseError::InvalidAttributeData);
        }
        let reason = std::str::from_utf8(&data[4..])
            .map_err(|_| StunParseError::InvalidAttributeData)?
            .to_owned();
        Ok(Self {
            code: class * 100 + number,
            reason,
        })
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.code, self.reason)
    }
}
