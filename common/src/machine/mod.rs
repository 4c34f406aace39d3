//! On-chain model of the candy machine account.
//!
//! The machine account is a fixed binary layout prefixed by an 8-byte
//! discriminator derived from the account name. Decoding is strict:
//! unknown discriminators, short buffers, trailing bytes and
//! inconsistent counters are all surfaced as decode failures, never
//! papered over.

mod metadata;

pub use metadata::{derive_metadata_address, ItemMetadata, METADATA_DISCRIMINATOR_INPUT};

use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

use crate::{
    crypto::Address,
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimestampSeconds,
};

pub const DISCRIMINATOR_SIZE: usize = 8;
pub const MACHINE_DISCRIMINATOR_INPUT: &str = "account:CandyMachine";

lazy_static! {
    pub static ref MACHINE_DISCRIMINATOR: [u8; DISCRIMINATOR_SIZE] =
        discriminator(MACHINE_DISCRIMINATOR_INPUT);
}

// First 8 bytes of sha256 over the account name
pub fn discriminator(input: &str) -> [u8; DISCRIMINATOR_SIZE] {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; DISCRIMINATOR_SIZE];
    bytes.copy_from_slice(&digest[..DISCRIMINATOR_SIZE]);
    bytes
}

fn read_discriminator(
    reader: &mut Reader,
    expected: &[u8; DISCRIMINATOR_SIZE],
) -> Result<(), ReaderError> {
    let bytes = reader.read_bytes(DISCRIMINATOR_SIZE)?;
    if bytes != &expected[..] {
        return Err(ReaderError::InvalidDiscriminator);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistMode {
    BurnEveryTime,
    NeverBurn,
}

impl Serializer for WhitelistMode {
    fn write(&self, writer: &mut Writer) {
        let tag = match self {
            WhitelistMode::BurnEveryTime => 0,
            WhitelistMode::NeverBurn => 1,
        };
        writer.write_u8(tag);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        match reader.read_u8()? {
            0 => Ok(WhitelistMode::BurnEveryTime),
            1 => Ok(WhitelistMode::NeverBurn),
            _ => Err(ReaderError::InvalidValue),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistSettings {
    pub mode: WhitelistMode,
    pub mint: Address,
    pub presale: bool,
    // replaces the list price for whitelist holders when set
    pub discount_price: Option<u64>,
}

impl Serializer for WhitelistSettings {
    fn write(&self, writer: &mut Writer) {
        self.mode.write(writer);
        self.mint.write(writer);
        self.presale.write(writer);
        self.discount_price.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Self {
            mode: WhitelistMode::read(reader)?,
            mint: Address::read(reader)?,
            presale: bool::read(reader)?,
            discount_price: Option::read(reader)?,
        })
    }
}

/// Immutable snapshot of the machine state, replaced wholesale on
/// every successful poll. Comparisons are by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSnapshot {
    pub authority: Address,
    // account the mint payment is sent to
    pub treasury: Address,
    pub token_mint: Option<Address>,
    pub items_redeemed: u64,
    pub uuid: String,
    // signed so a malformed negative price stays representable for
    // the resolver's validation path
    pub price_lamports: i64,
    pub go_live_timestamp: Option<i64>,
    pub whitelist: Option<WhitelistSettings>,
    pub items_available: u64,
}

impl MachineSnapshot {
    pub fn items_remaining(&self) -> u64 {
        self.items_available.saturating_sub(self.items_redeemed)
    }

    pub fn is_sold_out(&self) -> bool {
        self.items_remaining() == 0
    }

    pub fn is_live(&self, now: TimestampSeconds) -> bool {
        match self.go_live_timestamp {
            // an absent go-live date means the machine is live immediately
            None => true,
            Some(go_live) => go_live <= 0 || now >= go_live as TimestampSeconds,
        }
    }

    pub fn is_active(&self, now: TimestampSeconds) -> bool {
        !self.is_sold_out() && self.is_live(now)
    }
}

impl Serializer for MachineSnapshot {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&*MACHINE_DISCRIMINATOR);
        self.authority.write(writer);
        self.treasury.write(writer);
        self.token_mint.write(writer);
        self.items_redeemed.write(writer);
        self.uuid.write(writer);
        writer.write_u64(self.price_lamports as u64);
        self.go_live_timestamp.write(writer);
        self.whitelist.write(writer);
        self.items_available.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        read_discriminator(reader, &MACHINE_DISCRIMINATOR)?;

        let authority = Address::read(reader)?;
        let treasury = Address::read(reader)?;
        let token_mint = Option::read(reader)?;
        let items_redeemed = reader.read_u64()?;
        let uuid = reader.read_string()?;
        // the wire carries an unsigned price; values that do not fit
        // the signed range are a layout mismatch
        let price_lamports = i64::try_from(reader.read_u64()?).map_err(|_| ReaderError::OutOfRange)?;
        let go_live_timestamp = Option::read(reader)?;
        let whitelist = Option::read(reader)?;
        let items_available = reader.read_u64()?;

        if items_redeemed > items_available {
            return Err(ReaderError::InvalidValue);
        }

        Ok(Self {
            authority,
            treasury,
            token_mint,
            items_redeemed,
            uuid,
            price_lamports,
            go_live_timestamp,
            whitelist,
            items_available,
        })
    }
}
