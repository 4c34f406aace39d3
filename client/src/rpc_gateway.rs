use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use candymint_common::{
    api::{
        GetLatestBlockhashResult, GetTransactionStatusParams, GetTransactionStatusResult,
        ReadAccountParams, ReadAccountResult, RpcRequest, RpcResponse, SubmitTransactionParams,
        SubmitTransactionResult, TransactionStatus, JSON_RPC_VERSION,
    },
    config::CONFIRMATION_POLL_INTERVAL,
    crypto::{Address, Blockhash, Signature},
    serializer::Serializer,
};
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{sleep, timeout};

use crate::{error::RpcError, transaction::SignedTransaction};

// The consumed side of the ledger: account reads, broadcast and
// confirmation. Implementations must be safe to share across the
// refresh scheduler and the mint pipeline.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn read_account(&self, address: &Address) -> Result<Vec<u8>, RpcError>;

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<Signature, RpcError>;

    async fn get_transaction_status(
        &self,
        signature: &Signature,
    ) -> Result<TransactionStatus, RpcError>;

    async fn get_latest_blockhash(&self) -> Result<Blockhash, RpcError>;

    // Poll the transaction status until it settles or the timeout
    // elapses. The broadcast itself is irrevocable; only this wait may
    // be abandoned client-side, in which case the final outcome stays
    // unknown and the caller gets `RpcError::Timeout`.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        wait: Duration,
    ) -> Result<(), RpcError> {
        let poll = async {
            loop {
                match self.get_transaction_status(signature).await? {
                    TransactionStatus::Confirmed => return Ok(()),
                    TransactionStatus::Failed(reason) => {
                        return Err(RpcError::Node {
                            code: 0,
                            message: reason,
                        })
                    }
                    TransactionStatus::Pending => {
                        sleep(Duration::from_millis(CONFIRMATION_POLL_INTERVAL)).await
                    }
                }
            }
        };

        match timeout(wait, poll).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout),
        }
    }
}

pub type SharedLedgerRpc = Arc<dyn LedgerRpc>;

// JSON-RPC 2.0 gateway over HTTP
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
    id: AtomicU64,
}

impl HttpGateway {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            id: AtomicU64::new(0),
        })
    }

    async fn call<P: Serialize + Send, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, RpcError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("call: {}", method);
        }

        let request = RpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            id: self.id.fetch_add(1, Ordering::SeqCst),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response: RpcResponse<R> = response.json().await.map_err(map_reqwest_error)?;
        if let Some(error) = response.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or_else(|| RpcError::MalformedResponse("missing result field".to_string()))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> RpcError {
    if error.is_timeout() {
        RpcError::Timeout
    } else {
        RpcError::Transport(error)
    }
}

#[async_trait]
impl LedgerRpc for HttpGateway {
    async fn read_account(&self, address: &Address) -> Result<Vec<u8>, RpcError> {
        let result: ReadAccountResult = self
            .call(
                "read_account",
                Some(ReadAccountParams {
                    address: Cow::Borrowed(address),
                }),
            )
            .await?;

        hex::decode(&result.data)
            .map_err(|_| RpcError::MalformedResponse("account data is not valid hex".to_string()))
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<Signature, RpcError> {
        let result: SubmitTransactionResult = self
            .call(
                "submit_transaction",
                Some(SubmitTransactionParams {
                    data: transaction.to_hex(),
                }),
            )
            .await?;
        Ok(result.signature)
    }

    async fn get_transaction_status(
        &self,
        signature: &Signature,
    ) -> Result<TransactionStatus, RpcError> {
        let result: GetTransactionStatusResult = self
            .call(
                "get_transaction_status",
                Some(GetTransactionStatusParams {
                    signature: Cow::Borrowed(signature),
                }),
            )
            .await?;
        Ok(result.status)
    }

    async fn get_latest_blockhash(&self) -> Result<Blockhash, RpcError> {
        let result: GetLatestBlockhashResult = self
            .call::<(), _>("get_latest_blockhash", None)
            .await?;
        Ok(result.blockhash)
    }
}
