use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Blockhash, Signature};

pub const JSON_RPC_VERSION: &str = "2.0";

// JSON-RPC 2.0 request envelope
#[derive(Serialize)]
pub struct RpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

#[derive(Deserialize, Debug)]
pub struct RpcErrorObject {
    pub code: i16,
    pub message: String,
}

// Either `result` or `error` is set, never both
#[derive(Deserialize)]
pub struct RpcResponse<T> {
    pub id: Option<u64>,
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

#[derive(Serialize, Debug)]
pub struct ReadAccountParams<'a> {
    pub address: Cow<'a, Address>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ReadAccountResult {
    // raw account bytes, hex encoded
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmitTransactionParams {
    // serialized signed transaction, hex encoded
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmitTransactionResult {
    pub signature: Signature,
}

#[derive(Serialize, Debug)]
pub struct GetTransactionStatusParams<'a> {
    pub signature: Cow<'a, Signature>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum TransactionStatus {
    // known to the node but not yet finalized
    Pending,
    Confirmed,
    Failed(String),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetTransactionStatusResult {
    pub status: TransactionStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetLatestBlockhashResult {
    pub blockhash: Blockhash,
}
