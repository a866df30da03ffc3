//! Signed IP (`sip`) codec.

use std::fmt;
use std::net::Ipv4Addr;

use saskit_core::Error;
use saskit_core::Result;
use serde::Serialize;

/// A single IPv4 address or an inclusive range.
///
/// `to` is all zero for a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IpRange {
    /// First (or only) address.
    pub from: [u8; 4],
    /// Last address of the range, or `[0; 4]`.
    pub to: [u8; 4],
}

impl IpRange {
    /// Whether this is a range rather than a single address.
    pub fn is_range(&self) -> bool {
        self.to != [0; 4]
    }

    /// First address.
    pub fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.from)
    }

    /// Last address, equal to [`IpRange::start`] for a single address.
    pub fn end(&self) -> Ipv4Addr {
        if self.is_range() {
            Ipv4Addr::from(self.to)
        } else {
            self.start()
        }
    }

    /// Whether `addr` falls inside the range.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start() <= addr && addr <= self.end()
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_range() {
            write!(f, "{}-{}", self.start(), self.end())
        } else {
            write!(f, "{}", self.start())
        }
    }
}

/// Parse `sip` into an [`IpRange`].
///
/// The input is split on its first `-`. Each half must be four
/// dot-separated decimal octets; the first octet of the first address
/// must be non-zero. A range must not start after it ends.
pub fn parse_ip_range(sip: &str) -> Result<IpRange> {
    let (first, second) = match sip.split_once('-') {
        Some((first, second)) => (first, Some(second)),
        None => (sip, None),
    };

    let from = parse_octets(first)?;
    if from[0] == 0 {
        return Err(Error::request_invalid(format!(
            "address {first:?} must not start with 0"
        )));
    }

    let Some(second) = second else {
        return Ok(IpRange { from, to: [0; 4] });
    };

    let to = parse_octets(second)?;
    if u32::from_be_bytes(from) > u32::from_be_bytes(to) {
        return Err(Error::request_invalid(format!(
            "range starts at {first} which is after its end {second}"
        )));
    }

    Ok(IpRange { from, to })
}

fn parse_octets(s: &str) -> Result<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = s.split('.');

    for octet in octets.iter_mut() {
        let part = parts
            .next()
            .ok_or_else(|| {
                Error::request_invalid(format!("address {s:?} has fewer than 4 octets"))
            })?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::request_invalid(format!(
                "octet {part:?} in {s:?} is not a decimal number"
            )));
        }
        *octet = part.parse().map_err(|e| {
            Error::request_invalid(format!("octet {part:?} in {s:?} exceeds 255")).with_source(e)
        })?;
    }

    if parts.next().is_some() {
        return Err(Error::request_invalid(format!(
            "address {s:?} has more than 4 octets"
        )));
    }

    Ok(octets)
}
