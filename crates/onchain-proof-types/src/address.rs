//! Account and contract addresses
//!
//! Addresses are 32-byte public keys rendered as bech32 strings with the
//! `erd` human-readable part. Bech32 conversion goes through the SDK's
//! address type; this wrapper adds `Copy`, hashing and length checks.

use std::fmt;
use std::str::FromStr;

use multiversx_sdk::data::address::Address as SdkAddress;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;

/// Human-readable part used for every address on the network
pub const ADDRESS_HRP: &str = "erd";

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 32;

/// Length of a bech32 `erd1...` address string
pub const BECH32_ADDRESS_LEN: usize = 62;

/// A 32-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The all-zero address
    pub const fn zero() -> Self {
        Self([0u8; ADDRESS_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Build an address from a raw byte slice, checking its length
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != ADDRESS_LEN {
            return Err(CodecError::UnexpectedLength {
                expected: ADDRESS_LEN,
                actual: bytes.len(),
            });
        }
        let mut array = [0u8; ADDRESS_LEN];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    /// Parse a bech32 `erd1...` address
    pub fn from_bech32(encoded: &str) -> Result<Self, CodecError> {
        let encoded = encoded.trim().to_ascii_lowercase();

        // The SDK decoder accepts any HRP and assumes 32 bytes of payload
        let prefix = format!("{}1", ADDRESS_HRP);
        if !encoded.starts_with(&prefix) {
            return Err(CodecError::InvalidAddress(format!(
                "Expected an {} address, got {}",
                prefix, encoded
            )));
        }
        if encoded.len() != BECH32_ADDRESS_LEN {
            return Err(CodecError::InvalidAddress(format!(
                "Expected {} characters, got {}",
                BECH32_ADDRESS_LEN,
                encoded.len()
            )));
        }

        let address = SdkAddress::from_bech32_string(&encoded)
            .map_err(|e| CodecError::InvalidAddress(e.to_string()))?;
        Ok(Self(address.to_bytes()))
    }

    pub fn to_bech32(&self) -> String {
        self.to_string()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = SdkAddress::from(*self)
            .to_bech32_string()
            .map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<SdkAddress> for Address {
    fn from(address: SdkAddress) -> Self {
        Self(address.to_bytes())
    }
}

impl From<&SdkAddress> for Address {
    fn from(address: &SdkAddress) -> Self {
        Self(address.to_bytes())
    }
}

impl From<Address> for SdkAddress {
    fn from(address: Address) -> Self {
        SdkAddress::from_bytes(address.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bech32())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Address::from_bech32(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bech32_round_trip() {
        let address = Address::new([7u8; 32]);
        let encoded = address.to_bech32();

        assert!(encoded.starts_with("erd1"));
        assert_eq!(Address::from_bech32(&encoded).unwrap(), address);
    }

    #[test]
    fn test_rejects_foreign_hrp() {
        let foreign = Address::new([1u8; 32]).to_bech32().replacen("erd1", "bcx1", 1);

        let err = Address::from_bech32(&foreign).unwrap_err();
        assert!(matches!(err, CodecError::InvalidAddress(_)));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let encoded = Address::new([1u8; 32]).to_bech32();

        let err = Address::from_bech32(&encoded[..40]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidAddress(_)));
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut encoded = Address::new([1u8; 32]).to_bech32();
        let last = if encoded.ends_with('q') { "p" } else { "q" };
        encoded.replace_range(BECH32_ADDRESS_LEN - 1.., last);

        assert!(Address::from_bech32(&encoded).is_err());
    }

    #[test]
    fn test_sdk_address_conversion() {
        let address = Address::new([8u8; 32]);
        let sdk: SdkAddress = address.into();

        assert_eq!(sdk.to_bytes(), [8u8; 32]);
        assert_eq!(Address::from(&sdk), address);
        assert_eq!(sdk.to_bech32_string().unwrap(), address.to_bech32());
    }

    #[test]
    fn test_serde_uses_bech32_string() {
        let address = Address::new([3u8; 32]);
        let json = serde_json::to_string(&address).unwrap();

        assert_eq!(json, format!("\"{}\"", address.to_bech32()));
        let decoded: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, address);
    }
}
