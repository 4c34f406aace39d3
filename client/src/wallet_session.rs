use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use candymint_common::{
    crypto::{Address, Signature},
    serializer::Serializer,
};
use ed25519_dalek::{Signer, SigningKey};
use log::debug;
use rand::rngs::OsRng;

use crate::{
    error::WalletSessionError,
    transaction::{SignedTransaction, UnsignedTransaction},
};

// How the wallet is reached. Remote adapters need an explicit
// handshake driven by the connect call itself, so the triggering UI
// gesture must not also run its default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Browser,
    MobileRemote,
}

// The consumed side of the wallet: connection lifecycle and signing.
// `sign` can require out-of-band user interaction with human-scale
// latency; callers must never await it while holding state locks.
#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn connect(&self) -> Result<Address, WalletSessionError>;

    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn identity(&self) -> Option<Address>;

    fn adapter_kind(&self) -> AdapterKind;

    async fn sign(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, WalletSessionError>;
}

pub type SharedWalletSession = Arc<dyn WalletSession>;

/// In-process signer holding an ed25519 keypair. Backs the CLI and
/// the test suite; browser and mobile adapters live outside this
/// crate and only need to implement [`WalletSession`].
pub struct LocalKeypairSession {
    key: SigningKey,
    connected: AtomicBool,
}

impl LocalKeypairSession {
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut OsRng))
    }

    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            connected: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> Address {
        Address::new(self.key.verifying_key().to_bytes())
    }
}

#[async_trait]
impl WalletSession for LocalKeypairSession {
    async fn connect(&self) -> Result<Address, WalletSessionError> {
        self.connected.store(true, Ordering::SeqCst);
        let address = self.address();
        debug!("Local wallet connected: {}", address);
        Ok(address)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn identity(&self) -> Option<Address> {
        self.is_connected().then(|| self.address())
    }

    fn adapter_kind(&self) -> AdapterKind {
        AdapterKind::Browser
    }

    async fn sign(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, WalletSessionError> {
        if !self.is_connected() {
            return Err(WalletSessionError::NotConnected);
        }

        let payload = transaction.to_bytes();
        let signature = Signature::new(self.key.sign(&payload).to_bytes());
        Ok(SignedTransaction::new(transaction.clone(), signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candymint_common::crypto::{Blockhash, KEY_SIZE};

    fn transaction(payer: Address) -> UnsignedTransaction {
        UnsignedTransaction {
            payer,
            machine: Address::new([2u8; KEY_SIZE]),
            treasury: Address::new([3u8; KEY_SIZE]),
            mint: Address::new([4u8; KEY_SIZE]),
            price_lamports: 10,
            recent_blockhash: Blockhash::new([5u8; KEY_SIZE]),
        }
    }

    #[tokio::test]
    async fn test_sign_requires_connection() {
        let session = LocalKeypairSession::generate();
        let transaction = transaction(session.address());
        assert!(matches!(
            session.sign(&transaction).await,
            Err(WalletSessionError::NotConnected)
        ));

        session.connect().await.unwrap();
        let signed = session.sign(&transaction).await.unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(signed.transaction, transaction);
    }

    #[tokio::test]
    async fn test_identity_follows_connection() {
        let session = LocalKeypairSession::generate();
        assert_eq!(session.identity(), None);
        let address = session.connect().await.unwrap();
        assert_eq!(session.identity(), Some(address));
        session.disconnect().await;
        assert_eq!(session.identity(), None);
    }
}
