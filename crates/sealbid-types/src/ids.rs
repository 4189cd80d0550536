//! Identifiers used throughout SealBid.
//!
//! Participants are identified by 20-byte account addresses. Ciphertexts are
//! referenced by 32-byte opaque handles, never by value.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::SealbidError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address (owner, provider, bidder, or contract identity).
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Never a valid owner or provider.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Convenience constructor filling every byte with `b`. Handy for fixtures.
    #[must_use]
    pub fn repeat_byte(b: u8) -> Self {
        Self([b; 20])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// First four bytes in hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = SealbidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| SealbidError::Serialization(format!("address {s:?}: {e}")))?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| {
            SealbidError::Serialization(format!("address must be 20 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = SealbidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// Monotonically increasing batch identifier. `BatchId(0)` means no batch
/// has been opened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchId(pub u64);

impl BatchId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// Opaque decryption request identifier issued by the decryption oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CiphertextHandle
// ---------------------------------------------------------------------------

/// Opaque 32-byte reference to an encrypted value.
///
/// The all-zero handle denotes an uninitialized ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; 32]);

impl CiphertextHandle {
    pub const UNINITIALIZED: Self = Self([0u8; 32]);

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.0 != [0u8; 32]
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ct:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// SHA-256 commitment over a tournament result's handles and the contract
/// identity. Compared at callback time to detect ledger changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display_and_parse() {
        let addr = Address::repeat_byte(0xab);
        let text = addr.to_string();
        assert_eq!(text, format!("0x{}", "ab".repeat(20)));
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn address_parse_without_prefix() {
        let addr: Address = "11".repeat(20).parse().unwrap();
        assert_eq!(addr, Address::repeat_byte(0x11));
    }

    #[test]
    fn address_parse_rejects_wrong_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert!(matches!(err, SealbidError::Serialization(_)));
    }

    #[test]
    fn address_serde_is_hex_string() {
        let addr = Address::repeat_byte(0x01);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::repeat_byte(1).is_zero());
    }

    #[test]
    fn batch_id_next() {
        assert_eq!(BatchId(0).next(), BatchId(1));
        assert_eq!(BatchId(41).next(), BatchId(42));
    }

    #[test]
    fn handle_initialization() {
        assert!(!CiphertextHandle::UNINITIALIZED.is_initialized());
        assert!(CiphertextHandle([7u8; 32]).is_initialized());
    }
}
