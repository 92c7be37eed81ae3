use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use multiversx_sdk::data::address::Address as SdkAddress;
use serde::{Deserialize, Serialize};

pub use multiversx_sdk::data::transaction::Transaction;

use crate::address::Address;
use crate::codec::{encode_call_data, top_encode, TopEncode};
use crate::error::CodecError;

/// Transaction hash as returned by the gateway (hex string)
pub type TransactionHash = String;

/// Fixed gas price attached to every call
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;

/// Transaction format version. Version 1 signs the JSON payload itself,
/// not its hash.
pub const TRANSACTION_VERSION: u32 = 1;

/// How long a successful transaction stays visible before the state resets
pub const SUCCESS_DISPLAY_WINDOW: Duration = Duration::from_secs(5);

/// Client-side view of an SDK transaction
pub trait TransactionExt {
    fn sender_address(&self) -> Address;

    fn receiver_address(&self) -> Address;

    /// Decoded `data` field (`function@arg@arg...`)
    fn call_data(&self) -> Result<Vec<u8>, CodecError>;

    /// Contract function named in the call data, if any
    fn function_name(&self) -> Option<String>;

    /// Bytes the signer commits to: the JSON payload without the signature,
    /// serialized the way the SDK wallet serializes it
    fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error>;

    fn is_signed(&self) -> bool;
}

impl TransactionExt for Transaction {
    fn sender_address(&self) -> Address {
        Address::from(&self.sender)
    }

    fn receiver_address(&self) -> Address {
        Address::from(&self.receiver)
    }

    fn call_data(&self) -> Result<Vec<u8>, CodecError> {
        match &self.data {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map_err(|e| CodecError::InvalidBase64(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn function_name(&self) -> Option<String> {
        let data = self.call_data().ok()?;
        let data = String::from_utf8(data).ok()?;
        data.split('@')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        Ok(serde_json::to_value(&unsigned)?.to_string().into_bytes())
    }

    fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Builds a contract call with positional arguments
pub struct ContractCallBuilder {
    contract: Address,
    function: String,
    arguments: Vec<Vec<u8>>,
    sender: Option<Address>,
    nonce: u64,
    gas_limit: u64,
    chain_id: String,
    error: Option<CodecError>,
}

impl ContractCallBuilder {
    pub fn new(contract: Address, function: impl Into<String>) -> Self {
        Self {
            contract,
            function: function.into(),
            arguments: Vec::new(),
            sender: None,
            nonce: 0,
            gas_limit: 0,
            chain_id: String::new(),
            error: None,
        }
    }

    /// Append a top-encoded argument
    pub fn argument<T: TopEncode>(mut self, arg: &T) -> Self {
        match top_encode(arg) {
            Ok(encoded) => self.arguments.push(encoded),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Append the argument only when present
    pub fn optional_argument<T: TopEncode>(self, arg: Option<&T>) -> Self {
        match arg {
            Some(arg) => self.argument(arg),
            None => self,
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn build(self) -> Result<Transaction, CodecError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let sender = self.sender.ok_or_else(|| CodecError::malformed("Sender required"))?;
        if self.chain_id.is_empty() {
            return Err(CodecError::malformed("Chain id required"));
        }

        let data = encode_call_data(&self.function, &self.arguments);

        Ok(Transaction {
            nonce: self.nonce,
            value: "0".to_string(),
            receiver: SdkAddress::from(self.contract),
            sender: SdkAddress::from(sender),
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: self.gas_limit,
            data: Some(STANDARD.encode(data)),
            signature: None,
            chain_id: self.chain_id,
            version: TRANSACTION_VERSION,
            options: 0,
        })
    }
}

/// Status string reported by the gateway for a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Received,
    Executed,
    Success,
    Failed,
    Invalid,
    Other(String),
}

impl TransactionStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "pending" => TransactionStatus::Pending,
            "received" => TransactionStatus::Received,
            "executed" => TransactionStatus::Executed,
            "success" => TransactionStatus::Success,
            // The proxy reports "fail"; older nodes and the local ledger say "failed"
            "fail" | "failed" => TransactionStatus::Failed,
            "invalid" => TransactionStatus::Invalid,
            other => TransactionStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Received => "received",
            TransactionStatus::Executed => "executed",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Invalid => "invalid",
            TransactionStatus::Other(status) => status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionStatus::Executed | TransactionStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TransactionStatus::Failed | TransactionStatus::Invalid)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse outcome shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionOutcome {
    Pending,
    Success,
    Failed,
}

/// UI-local progress of the most recent mutating call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionState {
    pub is_loading: bool,
    pub hash: Option<TransactionHash>,
    pub status: Option<TransactionOutcome>,
    pub error: Option<String>,
    #[serde(skip)]
    completed_at: Option<DateTime<Utc>>,
}

impl TransactionState {
    pub fn begin(&mut self) {
        *self = Self {
            is_loading: true,
            ..Self::default()
        };
    }

    pub fn submitted(&mut self, hash: impl Into<TransactionHash>) {
        self.hash = Some(hash.into());
        self.status = Some(TransactionOutcome::Pending);
        self.error = None;
    }

    pub fn succeeded(&mut self) {
        self.succeeded_at(Utc::now());
    }

    pub fn succeeded_at(&mut self, at: DateTime<Utc>) {
        self.is_loading = false;
        self.status = Some(TransactionOutcome::Success);
        self.error = None;
        self.completed_at = Some(at);
    }

    pub fn failed(&mut self, error: impl Into<String>) {
        self.is_loading = false;
        self.status = Some(TransactionOutcome::Failed);
        self.error = Some(error.into());
        self.completed_at = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// A successful state is cleared once it has been shown for `window`
    pub fn should_reset_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match (self.status, self.completed_at) {
            (Some(TransactionOutcome::Success), Some(at)) => chrono::Duration::from_std(window)
                .map(|window| now - at >= window)
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction() -> Transaction {
        ContractCallBuilder::new(Address::new([9u8; 32]), "certifyAction")
            .argument(&"T".to_string())
            .argument(&"X".to_string())
            .with_sender(Address::new([1u8; 32]))
            .with_nonce(4)
            .with_gas_limit(10_000_000)
            .with_chain_id("D")
            .build()
            .unwrap()
    }

    #[test]
    fn test_status_classification() {
        assert!(TransactionStatus::parse("executed").is_success());
        assert!(TransactionStatus::parse("SUCCESS").is_success());
        assert!(TransactionStatus::parse("failed").is_failure());
        assert!(TransactionStatus::parse("fail").is_failure());
        assert_eq!(TransactionStatus::parse("fail"), TransactionStatus::Failed);
        assert!(TransactionStatus::parse("invalid").is_failure());
        assert!(!TransactionStatus::parse("pending").is_terminal());
        assert!(!TransactionStatus::parse("received").is_terminal());
        assert_eq!(
            TransactionStatus::parse("partially-executed"),
            TransactionStatus::Other("partially-executed".to_string())
        );
    }

    #[test]
    fn test_signing_payload_fields() {
        let tx = sample_transaction();
        let payload: serde_json::Value = serde_json::from_slice(&tx.signing_bytes().unwrap()).unwrap();

        for key in ["nonce", "value", "receiver", "sender", "gasPrice", "gasLimit", "data", "chainID", "version"] {
            assert!(payload.get(key).is_some(), "missing {} in {}", key, payload);
        }
        assert!(payload.get("signature").is_none());
        assert_eq!(payload["nonce"], 4);
        assert_eq!(payload["chainID"], "D");
    }

    #[test]
    fn test_signing_bytes_ignore_signature() {
        let mut tx = sample_transaction();
        let before = tx.signing_bytes().unwrap();
        tx.signature = Some("ab".repeat(64));

        assert_eq!(tx.signing_bytes().unwrap(), before);
        assert!(serde_json::to_string(&tx).unwrap().contains("signature"));
    }

    #[test]
    fn test_call_data_is_base64_on_the_wire() {
        let tx = sample_transaction();
        assert_eq!(tx.call_data().unwrap(), b"certifyAction@54@58".to_vec());

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], STANDARD.encode(b"certifyAction@54@58"));
        assert_eq!(json["receiver"], Address::new([9u8; 32]).to_bech32());
        assert_eq!(tx.sender_address(), Address::new([1u8; 32]));
    }

    #[test]
    fn test_optional_argument() {
        let metadata: Option<&String> = None;
        let tx = ContractCallBuilder::new(Address::zero(), "updateProof")
            .argument(&"id".to_string())
            .optional_argument(metadata)
            .with_sender(Address::new([1u8; 32]))
            .with_chain_id("D")
            .build()
            .unwrap();
        assert_eq!(tx.call_data().unwrap(), b"updateProof@6964".to_vec());
    }

    #[test]
    fn test_builder_requires_sender() {
        let result = ContractCallBuilder::new(Address::zero(), "getTotalProofs")
            .with_chain_id("D")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_function_name() {
        assert_eq!(sample_transaction().function_name().as_deref(), Some("certifyAction"));
    }

    #[test]
    fn test_transaction_state_lifecycle() {
        let mut state = TransactionState::default();
        state.begin();
        assert!(state.is_loading);

        state.submitted("abc");
        assert_eq!(state.status, Some(TransactionOutcome::Pending));

        let done = Utc::now();
        state.succeeded_at(done);
        assert!(!state.is_loading);
        assert!(!state.should_reset_at(done + chrono::Duration::seconds(4), SUCCESS_DISPLAY_WINDOW));
        assert!(state.should_reset_at(done + chrono::Duration::seconds(5), SUCCESS_DISPLAY_WINDOW));

        state.failed("boom");
        assert_eq!(state.hash.as_deref(), Some("abc"));
        assert!(!state.should_reset_at(done + chrono::Duration::hours(1), SUCCESS_DISPLAY_WINDOW));
    }
}
