use candymint_common::{
    crypto::{Address, Blockhash, Signature},
    machine::MachineSnapshot,
    serializer::{Reader, ReaderError, Serializer, Writer},
};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

// A mint transaction references the machine, the treasury receiving
// the payment, the payer and the freshly generated mint account of
// the item being acquired. The recent blockhash bounds its validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub payer: Address,
    pub machine: Address,
    pub treasury: Address,
    pub mint: Address,
    pub price_lamports: u64,
    pub recent_blockhash: Blockhash,
}

impl Serializer for UnsignedTransaction {
    fn write(&self, writer: &mut Writer) {
        self.payer.write(writer);
        self.machine.write(writer);
        self.treasury.write(writer);
        self.mint.write(writer);
        writer.write_u64(self.price_lamports);
        self.recent_blockhash.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Self {
            payer: Address::read(reader)?,
            machine: Address::read(reader)?,
            treasury: Address::read(reader)?,
            mint: Address::read(reader)?,
            price_lamports: reader.read_u64()?,
            recent_blockhash: Blockhash::read(reader)?,
        })
    }
}

/// Transaction with its signatures attached. The payer signature
/// comes first and doubles as the transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: UnsignedTransaction,
    pub signatures: Vec<Signature>,
}

impl SignedTransaction {
    pub fn new(transaction: UnsignedTransaction, signature: Signature) -> Self {
        Self {
            transaction,
            signatures: vec![signature],
        }
    }

    pub fn push_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    pub fn id(&self) -> &Signature {
        // constructed through `new`, so there is always a payer signature
        &self.signatures[0]
    }
}

impl Serializer for SignedTransaction {
    fn write(&self, writer: &mut Writer) {
        self.transaction.write(writer);
        writer.write_u8(self.signatures.len() as u8);
        for signature in &self.signatures {
            signature.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let transaction = UnsignedTransaction::read(reader)?;
        let count = reader.read_u8()?;
        if count == 0 {
            return Err(ReaderError::InvalidValue);
        }
        let mut signatures = Vec::with_capacity(count as usize);
        for _ in 0..count {
            signatures.push(Signature::read(reader)?);
        }
        Ok(Self {
            transaction,
            signatures,
        })
    }
}

// Keypair of the item account created by the mint. Generated fresh
// for every attempt and co-signs the transaction next to the payer.
pub struct MintAccount {
    key: SigningKey,
}

impl MintAccount {
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn address(&self) -> Address {
        Address::new(self.key.verifying_key().to_bytes())
    }

    pub fn sign(&self, payload: &[u8]) -> Signature {
        Signature::new(self.key.sign(payload).to_bytes())
    }
}

pub fn build_mint_transaction(
    payer: Address,
    machine: Address,
    snapshot: &MachineSnapshot,
    price_lamports: u64,
    recent_blockhash: Blockhash,
) -> (UnsignedTransaction, MintAccount) {
    let mint_account = MintAccount::generate();
    let transaction = UnsignedTransaction {
        payer,
        machine,
        treasury: snapshot.treasury,
        mint: mint_account.address(),
        price_lamports,
        recent_blockhash,
    };
    (transaction, mint_account)
}
