// ── Subnet Table ──
//
// The fixed bijection between CIDR prefix lengths 8..=30 and their dotted
// masks. Embedded, never fetched. Lookups are O(1) in both directions: by
// index for prefixes, by bit-counting for dotted masks.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MIN_PREFIX: u8 = 8;
pub const MAX_PREFIX: u8 = 30;

const MASKS: [&str; 23] = [
    "255.0.0.0",
    "255.128.0.0",
    "255.192.0.0",
    "255.224.0.0",
    "255.240.0.0",
    "255.248.0.0",
    "255.252.0.0",
    "255.254.0.0",
    "255.255.0.0",
    "255.255.128.0",
    "255.255.192.0",
    "255.255.224.0",
    "255.255.240.0",
    "255.255.248.0",
    "255.255.252.0",
    "255.255.254.0",
    "255.255.255.0",
    "255.255.255.128",
    "255.255.255.192",
    "255.255.255.224",
    "255.255.255.240",
    "255.255.255.248",
    "255.255.255.252",
];

/// A subnet mask known to the Subnet Table.
///
/// Serializes as its dotted form. Deserializes from any form
/// [`SubnetMask::parse`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubnetMask(u8);

impl SubnetMask {
    pub fn from_prefix(prefix: u8) -> Result<Self, CoreError> {
        if (MIN_PREFIX..=MAX_PREFIX).contains(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(CoreError::unknown_mask(prefix.to_string()))
        }
    }

    /// Look up a dotted mask such as `255.255.255.0`.
    pub fn from_dotted(mask: &str) -> Result<Self, CoreError> {
        let trimmed = mask.trim();
        let addr: Ipv4Addr = trimmed
            .parse()
            .map_err(|_| CoreError::unknown_mask(mask))?;
        let bits = u32::from(addr);
        let ones = bits.leading_ones();
        // Non-contiguous masks have ones after the first zero.
        if bits.checked_shl(ones).unwrap_or(0) != 0 {
            return Err(CoreError::unknown_mask(mask));
        }
        let prefix = u8::try_from(ones).map_err(|_| CoreError::unknown_mask(mask))?;
        let found = Self::from_prefix(prefix).map_err(|_| CoreError::unknown_mask(mask))?;
        if found.dotted() == trimmed {
            Ok(found)
        } else {
            Err(CoreError::unknown_mask(mask))
        }
    }

    /// Accept a dotted mask, `/24`, or a bare `24`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.contains('.') {
            return Self::from_dotted(trimmed);
        }
        let digits = trimmed.strip_prefix('/').unwrap_or(trimmed);
        digits
            .parse::<u8>()
            .map_err(|_| CoreError::unknown_mask(raw))
            .and_then(|prefix| Self::from_prefix(prefix).map_err(|_| CoreError::unknown_mask(raw)))
    }

    pub fn prefix(self) -> u8 {
        self.0
    }

    pub fn dotted(self) -> &'static str {
        MASKS
            .get(usize::from(self.0 - MIN_PREFIX))
            .copied()
            .unwrap_or_default()
    }

    /// Every table entry, shortest prefix first.
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (MIN_PREFIX..=MAX_PREFIX).map(Self)
    }
}

impl fmt::Display for SubnetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dotted())
    }
}

impl FromStr for SubnetMask {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SubnetMask {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SubnetMask> for String {
    fn from(mask: SubnetMask) -> Self {
        mask.dotted().to_owned()
    }
}

/// Dotted mask for a prefix length.
pub fn prefix_to_mask(prefix: u8) -> Result<&'static str, CoreError> {
    SubnetMask::from_prefix(prefix).map(SubnetMask::dotted)
}

/// Prefix length for a dotted mask.
pub fn mask_to_prefix(mask: &str) -> Result<u8, CoreError> {
    SubnetMask::from_dotted(mask).map(SubnetMask::prefix)
}
