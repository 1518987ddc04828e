//! Input validation for ufwblock.
//!
//! This module is the only input-sanity gate: it checks syntax only, not
//! reachability or whether the address is in a reserved range.

use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;

use crate::error::BlockError;

/// A validated IPv4 literal, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAddress(Ipv4Addr);

impl TargetAddress {
    pub fn addr(&self) -> Ipv4Addr {
        self.0
    }

    /// The single-host range covering only this address
    pub fn host_range(&self) -> Ipv4Net {
        Ipv4Net::from(self.0)
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate an IPv4 dotted-quad string.
///
/// Octets must be decimal in 0-255 with no leading zeros, no surrounding
/// whitespace, and exactly four of them.
///
/// # Examples
/// ```
/// use ufwblock::validation::validate;
/// assert!(validate("203.0.113.5").is_ok());
/// assert!(validate("256.0.0.1").is_err());
/// assert!(validate("::1").is_err());
/// ```
pub fn validate(ip_str: &str) -> Result<TargetAddress, BlockError> {
    ip_str
        .parse::<Ipv4Addr>()
        .map(TargetAddress)
        .map_err(|_| BlockError::Validation(ip_str.to_string()))
}

/// Parse an IPv4 CIDR whose address part also passes [`validate`].
///
/// Returns `None` for anything else, including a bare address without a
/// prefix.
pub fn parse_ipv4_cidr(candidate: &str) -> Option<Ipv4Net> {
    let (addr, prefix) = candidate.split_once('/')?;
    validate(addr).ok()?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    candidate.parse().ok()
}
