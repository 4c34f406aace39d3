use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub const KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Invalid base58 encoding")]
    InvalidBase58,
}

// Fixed-size identifiers displayed in base58, stored as raw bytes on the wire.
macro_rules! base58_bytes {
    ($name:ident, $size:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $name([u8; $size]);

        impl $name {
            pub const fn new(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            pub const fn zero() -> Self {
                Self([0u8; $size])
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
                let array: [u8; $size] =
                    bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                        expected: $size,
                        got: bytes.len(),
                    })?;
                Ok(Self(array))
            }
        }

        impl FromStr for $name {
            type Err = CryptoError;

            // Malformed text must fail here, before any network call
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = bs58::decode(s)
                    .into_vec()
                    .map_err(|_| CryptoError::InvalidBase58)?;
                Self::from_slice(&bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", bs58::encode(&self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_str(&s).map_err(SerdeError::custom)
            }
        }

        impl Serializer for $name {
            fn write(&self, writer: &mut Writer) {
                writer.write_bytes(&self.0);
            }

            fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
                let bytes = reader.read_bytes($size)?;
                let mut array = [0u8; $size];
                array.copy_from_slice(bytes);
                Ok(Self(array))
            }
        }
    };
}

// On-chain account identifier (wallet, machine, mint, treasury)
base58_bytes!(Address, KEY_SIZE);
// Recent ledger hash sealing a transaction's validity window
base58_bytes!(Blockhash, KEY_SIZE);
// Ed25519 signature; the first signature of a transaction is its id
base58_bytes!(Signature, SIGNATURE_SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let address = Address::new([7u8; KEY_SIZE]);
        let text = address.to_string();
        let parsed = Address::from_str(&text).unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_address_rejects_bad_length() {
        // 4 bytes of base58, valid encoding but wrong size
        let text = bs58::encode(&[1u8, 2, 3, 4]).into_string();
        assert!(matches!(
            Address::from_str(&text),
            Err(CryptoError::InvalidLength { expected: 32, got: 4 })
        ));
    }

    #[test]
    fn test_address_rejects_bad_encoding() {
        // '0', 'O', 'I', 'l' are not part of the base58 alphabet
        assert!(matches!(
            Address::from_str("0OIl"),
            Err(CryptoError::InvalidBase58)
        ));
    }

    #[test]
    fn test_serializer_roundtrip() {
        let address = Address::new([42u8; KEY_SIZE]);
        let decoded = Address::from_bytes(&Serializer::to_bytes(&address)).unwrap();
        assert_eq!(decoded, address);
    }
}
