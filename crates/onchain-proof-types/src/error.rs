//! Error types shared across the client crates
//!
//! Each layer has its own enum: the codec, the network gateway, the wallet
//! session manager and the contract client. Higher layers wrap lower ones.

use thiserror::Error;

/// Errors raised while encoding or decoding addresses, call data and
/// contract return values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unexpected length: expected {expected} bytes, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("Invalid UTF-8 data: {0}")]
    InvalidUtf8(String),

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),

    #[error("Malformed value: {0}")]
    Malformed(String),
}

impl CodecError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Errors raised by a network gateway (HTTP proxy or local ledger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Request(String),

    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

impl GatewayError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

impl From<CodecError> for GatewayError {
    fn from(err: CodecError) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Errors raised by the wallet session manager and its provider backends.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Failed to initialize provider: {0}")]
    Initialization(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Errors surfaced by the proof contract client.
///
/// Mutating calls collapse every failure past the connection check into
/// `Submission`, carrying the original message or a generic fallback.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("{0}")]
    Submission(String),

    #[error("Transaction {hash} failed with status {status}")]
    TransactionFailed { hash: String, status: String },

    #[error("Transaction {hash} was not confirmed after {attempts} attempts")]
    Timeout { hash: String, attempts: u32 },
}

impl ContractError {
    /// Wrap an underlying error, falling back to `fallback` when the error
    /// renders as an empty message.
    pub fn submission(err: impl std::fmt::Display, fallback: &str) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::Submission(fallback.to_string())
        } else {
            Self::Submission(message)
        }
    }
}
