use candymint_common::{
    crypto::CryptoError,
    serializer::ReaderError,
    time::{get_current_time_in_millis, TimestampMillis},
};
use strum::Display;
use thiserror::Error;

// Client-visible error taxonomy. Every captured error resolves to one
// of these kinds; the presentation layer only ever sees the kind and a
// rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    InvalidAddress,
    Decode,
    Network,
    Timeout,
    Precondition,
    InvalidState,
    WalletRejected,
    Unconfirmed,
    MetadataUnavailable,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC request timed out")]
    Timeout,
    #[error("Node returned error {code}: {message}")]
    Node { code: i16, message: String },
    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum WalletSessionError {
    #[error("Wallet rejected the request")]
    Rejected,
    #[error("No wallet is connected")]
    NotConnected,
    #[error("Wallet adapter failure: {0}")]
    Adapter(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] CryptoError),
    #[error("Failed to decode account data: {0}")]
    Decode(#[from] ReaderError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("Precondition failed: {0}")]
    Precondition(&'static str),
    #[error("Invalid machine state: {0}")]
    InvalidState(&'static str),
    #[error("Wallet rejected the transaction")]
    WalletRejected,
    #[error("Transaction was not confirmed within {0} ms, its final outcome is unknown")]
    Unconfirmed(u64),
    #[error("Mint succeeded but metadata could not be resolved: {0}")]
    MetadataUnavailable(String),
    #[error("Wallet session error: {0}")]
    Wallet(#[from] WalletSessionError),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Rpc(RpcError::Timeout) => ErrorKind::Timeout,
            Self::Rpc(_) => ErrorKind::Network,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::WalletRejected | Self::Wallet(WalletSessionError::Rejected) => {
                ErrorKind::WalletRejected
            }
            // other adapter failures are external failures, same as the network
            Self::Wallet(_) => ErrorKind::Network,
            Self::Unconfirmed(_) => ErrorKind::Unconfirmed,
            Self::MetadataUnavailable(_) => ErrorKind::MetadataUnavailable,
        }
    }
}

/// Most recent per-operation error, kept in the client view without
/// crashing the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub at: TimestampMillis,
}

impl ErrorRecord {
    pub fn capture(error: &ClientError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            at: get_current_time_in_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ClientError::Rpc(RpcError::Timeout).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            ClientError::Wallet(WalletSessionError::Rejected).kind(),
            ErrorKind::WalletRejected
        );
        assert_eq!(ClientError::Unconfirmed(500).kind(), ErrorKind::Unconfirmed);
        assert_eq!(
            ClientError::Precondition("wallet is not connected").kind(),
            ErrorKind::Precondition
        );
    }

    #[test]
    fn test_capture_keeps_message() {
        let record = ErrorRecord::capture(&ClientError::InvalidState("negative price"));
        assert_eq!(record.kind, ErrorKind::InvalidState);
        assert!(record.message.contains("negative price"));
    }
}
