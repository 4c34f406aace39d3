use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

use super::{discriminator, read_discriminator, DISCRIMINATOR_SIZE};
use crate::{
    crypto::Address,
    serializer::{Reader, ReaderError, Serializer, Writer},
};

pub const METADATA_DISCRIMINATOR_INPUT: &str = "account:ItemMetadata";
// seed prefix for the derived metadata account address
const METADATA_SEED: &[u8] = b"metadata";

lazy_static! {
    static ref METADATA_DISCRIMINATOR: [u8; DISCRIMINATOR_SIZE] =
        discriminator(METADATA_DISCRIMINATOR_INPUT);
}

// The metadata account lives at an address derived from the mint:
// sha256("metadata" || mint). Deterministic, so the client can locate
// it without any index.
pub fn derive_metadata_address(mint: &Address) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(METADATA_SEED);
    hasher.update(mint.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Address::new(bytes)
}

/// Per-item metadata written by the machine during a mint.
/// `uri` points at the off-chain JSON document carrying the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub mint: Address,
    pub name: String,
    pub uri: String,
}

impl Serializer for ItemMetadata {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&*METADATA_DISCRIMINATOR);
        self.mint.write(writer);
        self.name.write(writer);
        self.uri.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        read_discriminator(reader, &METADATA_DISCRIMINATOR)?;
        Ok(Self {
            mint: Address::read(reader)?,
            name: String::read(reader)?,
            uri: String::read(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_SIZE;

    #[test]
    fn test_roundtrip() {
        let metadata = ItemMetadata {
            mint: Address::new([3u8; KEY_SIZE]),
            name: "Candy #42".to_string(),
            uri: "https://arweave.net/abc123".to_string(),
        };
        let decoded = ItemMetadata::from_bytes(&metadata.to_bytes()).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_derived_address_is_deterministic() {
        let mint = Address::new([5u8; KEY_SIZE]);
        assert_eq!(derive_metadata_address(&mint), derive_metadata_address(&mint));
        assert_ne!(
            derive_metadata_address(&mint),
            derive_metadata_address(&Address::new([6u8; KEY_SIZE]))
        );
    }
}
