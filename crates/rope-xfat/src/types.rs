//! Primitive types shared by every xFAT component

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in smallest units (18 decimals, like FAT)
pub type Amount = u128;

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Epoch index (`floor(time / epoch_duration)`)
pub type Epoch = u64;

/// Conversion rate in basis points (10_000 = 1:1)
pub type Rate = u64;

/// Identifier returned by the vote-escrow collaborator
pub type LockId = u64;

/// 32-byte account address
///
/// The all-zero address is the null account: transfers from it are mints,
/// transfers to it are burns.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 32]);

impl Address {
    /// The null account
    pub const ZERO: Address = Address([0u8; 32]);

    /// Deterministic address for a human-readable label (simulations, fixtures)
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, String> {
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(|e| e.to_string())?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|v: Vec<u8>| format!("expected 32 bytes, got {}", v.len()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::from_label("alice");
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
        assert_eq!(Address::from_hex(&format!("0x{}", addr.to_hex())).unwrap(), addr);
    }

    #[test]
    fn test_rejects_short_hex() {
        assert!(Address::from_hex("abcd").is_err());
        assert!(Address::from_hex("zz").is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("bob").is_zero());
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    }
}
