// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use byteorder::{BigEndian, ByteOrder};

use crate::message::{StunParseError, StunWriteError, TransactionId};
use crate::wire;

use super::check_len;

/// The address family of a socket address stored in an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    IPV4,
    IPV6,
}

impl AddressFamily {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            AddressFamily::IPV4 => 0x1,
            AddressFamily::IPV6 => 0x2,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Result<AddressFamily, StunParseError> {
        match byte {
            0x1 => Ok(AddressFamily::IPV4),
            0x2 => Ok(AddressFamily::IPV6),
            _ => Err(StunParseError::InvalidFamily(byte)),
        }
    }

    fn address_len(self) -> usize {
        match self {
            AddressFamily::IPV4 => 4,
            AddressFamily::IPV6 => 16,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::IPV4 => write!(f, "IPV4"),
            AddressFamily::IPV6 => write!(f, "IPV6"),
        }
    }
}

// The wire format carries neither an IPv6 scope id nor a flow label.
pub(super) fn check_addr(addr: &SocketAddr) -> Result<(), StunWriteError> {
    if addr.port() == 0 {
        return Err(StunWriteError::OutOfRange {
            value: 0,
            min: 1,
            max: u16::MAX as usize,
        });
    }
    if let SocketAddr::V6(addr) = addr {
        for value in [addr.scope_id(), addr.flowinfo()] {
            if value != 0 {
                return Err(StunWriteError::OutOfRange {
                    value: value as usize,
                    min: 0,
                    max: 0,
                });
            }
        }
    }
    Ok(())
}

pub(super) fn encoded_len(addr: &SocketAddr) -> usize {
    match addr {
        SocketAddr::V4(_) => 8,
        SocketAddr::V6(_) => 20,
    }
}

pub(super) fn encode(addr: SocketAddr) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(&addr));
    out.push(0x0);
    match addr {
        SocketAddr::V4(addr) => {
            out.push(AddressFamily::IPV4.to_byte());
            wire::write_u16(&mut out, addr.port());
            wire::write_u32(&mut out, u32::from(*addr.ip()));
        }
        SocketAddr::V6(addr) => {
            out.push(AddressFamily::IPV6.to_byte());
            wire::write_u16(&mut out, addr.port());
            wire::write_u128(&mut out, u128::from(*addr.ip()));
        }
    }
    out
}

pub(super) fn decode(data: &[u8]) -> Result<SocketAddr, StunParseError> {
    check_len(data.len(), 4..)?;
    let family = AddressFamily::from_byte(data[1])?;
    let port = BigEndian::read_u16(&data[2..4]);
    let len = 4 + family.address_len();
    check_len(data.len(), len..=len)?;
    let ip = match family {
        AddressFamily::IPV4 => IpAddr::V4(Ipv4Addr::from(BigEndian::read_u32(&data[4..8]))),
        AddressFamily::IPV6 => IpAddr::V6(Ipv6Addr::from(BigEndian::read_u128(&data[4..20]))),
    };
    Ok(SocketAddr::new(ip, port))
}

/// Reject a decoded address with port 0.  XOR-ed addresses are checked after the transform.
pub(super) fn valid_port(addr: SocketAddr) -> Result<SocketAddr, StunParseError> {
    if addr.port() == 0 {
        return Err(StunParseError::InvalidPort);
    }
    Ok(addr)
}

/// Apply the XOR transform of XOR-MAPPED-ADDRESS and friends using the magic cookie and
/// transaction id in `transaction`.  Applying it twice returns the original address.
///
/// # Examples
///
/// ```
/// # use stun_wire::attribute::xor_socket_addr;
/// # use stun_wire::message::TransactionId;
/// let transaction = TransactionId::from(0x644d4f37326c71514d4f4a51);
/// let addr = "192.168.1.35:60689".parse().unwrap();
/// let xored = xor_socket_addr(addr, &transaction);
/// assert_eq!(xored, "225.186.165.97:52227".parse().unwrap());
/// assert_eq!(xor_socket_addr(xored, &transaction), addr);
/// ```
pub fn xor_socket_addr(addr: SocketAddr, transaction: &TransactionId) -> SocketAddr {
    // the magic cookie followed by the transaction id, as written in the message header
    let mask = transaction.header_bits().to_be_bytes();
    let port = addr.port() ^ BigEndian::read_u16(&mask[..2]);
    match addr {
        SocketAddr::V4(addr) => {
            let octets = bytewise_xor!(4, mask, addr.ip().octets(), 0);
            SocketAddr::new(IpAddr::V4(Ipv4Addr::from(octets)), port)
        }
        SocketAddr::V6(addr) => {
            let octets = bytewise_xor!(16, mask, addr.ip().octets(), 0);
            SocketAddr::new(IpAddr::V6(Ipv6Addr::from(octets)), port)
        }
    }
}
