use std::sync::Arc;

use async_trait::async_trait;
use candymint_common::{
    crypto::Address,
    machine::{derive_metadata_address, ItemMetadata},
    serializer::Serializer,
};
use log::{debug, trace};
use serde::Deserialize;

use crate::{error::ClientError, rpc_gateway::SharedLedgerRpc};

/// Descriptor of a successfully acquired item. `image_uri` is absent
/// when the chain-level mint went through but metadata resolution
/// failed; that case is reported as a warning, never as a mint
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedItem {
    pub mint_address: Address,
    pub image_uri: Option<String>,
}

#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, mint: &Address) -> Result<MintedItem, ClientError>;
}

pub type SharedMetadataResolver = Arc<dyn MetadataResolver>;

// shape of the off-chain JSON document the on-chain uri points at
#[derive(Deserialize)]
struct OffChainMetadata {
    image: Option<String>,
}

// Resolves the minted item by reading its derived metadata account
// and following the uri to the off-chain JSON document.
pub struct OnChainMetadataResolver {
    ledger: SharedLedgerRpc,
    http: reqwest::Client,
}

impl OnChainMetadataResolver {
    pub fn new(ledger: SharedLedgerRpc) -> Self {
        Self {
            ledger,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MetadataResolver for OnChainMetadataResolver {
    async fn resolve(&self, mint: &Address) -> Result<MintedItem, ClientError> {
        trace!("resolve metadata for mint {}", mint);

        let metadata_address = derive_metadata_address(mint);
        let data = self
            .ledger
            .read_account(&metadata_address)
            .await
            .map_err(|e| ClientError::MetadataUnavailable(e.to_string()))?;
        let metadata = ItemMetadata::from_bytes(&data)
            .map_err(|e| ClientError::MetadataUnavailable(e.to_string()))?;

        debug!("Resolved metadata for {}: {}", mint, metadata.name);

        let document: OffChainMetadata = self
            .http
            .get(&metadata.uri)
            .send()
            .await
            .map_err(|e| ClientError::MetadataUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::MetadataUnavailable(e.to_string()))?;

        Ok(MintedItem {
            mint_address: *mint,
            // fall back to the on-chain uri when the document has no image
            image_uri: document.image.or(Some(metadata.uri)),
        })
    }
}
