// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{BigEndian, ByteOrder};
use smallvec::SmallVec;

use crate::message::StunParseError;
use crate::wire;

use super::AttributeType;

/// A list of `u16` values that holds each value at most once, in the order each value was first
/// inserted.  Used by UNKNOWN-ATTRIBUTES.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UInt16List {
    values: SmallVec<[u16; 4]>,
}

impl UInt16List {
    /// Create a new, empty [`UInt16List`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` unless it is already present.  Returns whether the value was added.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_wire::attribute::UInt16List;
    /// let mut list = UInt16List::new();
    /// assert!(list.insert(0x0006));
    /// assert!(list.insert(0x0001));
    /// assert!(!list.insert(0x0006));
    /// assert_eq!(list.iter().collect::<Vec<_>>(), [0x0006, 0x0001]);
    /// ```
    pub fn insert(&mut self, value: u16) -> bool {
        if self.values.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Whether `value` is in the list
    pub fn contains(&self, value: u16) -> bool {
        self.values.contains(&value)
    }

    /// Whether the attribute type is in the list
    pub fn has_attribute(&self, atype: AttributeType) -> bool {
        self.contains(atype.value())
    }

    /// The values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.values.iter().copied()
    }

    /// The number of distinct values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the list holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(super) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.values.len() * 2);
        for &value in &self.values {
            wire::write_u16(&mut out, value);
        }
        out
    }

    pub(super) fn decode(data: &[u8]) -> Result<Self, StunParseError> {
        if data.len() % 2 != 0 {
            return Err(StunParseError::Truncated {
                expected: data.len() + 1,
                actual: data.len(),
            });
        }
        Ok(data.chunks_exact(2).map(BigEndian::read_u16).collect())
    }
}

impl FromIterator<u16> for UInt16List {
    fn from_iter<T: IntoIterator<Item = u16>>(iter: T) -> Self {
        let mut ret = Self::new();
        for value in iter {
            ret.insert(value);
        }
        ret
    }
}

impl<'a> FromIterator<&'a AttributeType> for UInt16List {
    fn from_iter<T: IntoIterator<Item = &'a AttributeType>>(iter: T) -> Self {
        iter.into_iter().map(|atype| atype.value()).collect()
    }
}

impl std::fmt::Display for UInt16List {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value:#06x}")?;
        }
        write!(f, "]")
    }
}
