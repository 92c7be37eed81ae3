//! Network provider abstraction
//!
//! A `Gateway` answers read-only contract queries, accepts signed
//! transactions and reports their status. The HTTP proxy and the in-process
//! ledger both implement it, so callers can be tested against fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use onchain_proof_types::{Address, GatewayError, Transaction, TransactionHash, TransactionStatus};

/// A read-only contract query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmQuery {
    pub sc_address: Address,
    pub func_name: String,
    /// Hex-encoded positional arguments
    pub args: Vec<String>,
}

impl VmQuery {
    pub fn new(contract: Address, function: impl Into<String>) -> Self {
        Self {
            sc_address: contract,
            func_name: function.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(hex::encode(arg.as_ref()));
        self
    }

    pub fn with_address_arg(self, address: &Address) -> Self {
        self.with_arg(address.as_bytes())
    }

    /// Decode the hex arguments back into raw bytes
    pub fn raw_args(&self) -> Result<Vec<Vec<u8>>, GatewayError> {
        self.args
            .iter()
            .map(|arg| {
                hex::decode(arg)
                    .map_err(|e| GatewayError::invalid_response(format!("Invalid query argument: {}", e)))
            })
            .collect()
    }
}

/// Outcome of a contract query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmQueryResult {
    /// Raw top-encoded return values
    pub return_data: Vec<Vec<u8>>,
    pub return_code: String,
    pub return_message: String,
}

impl VmQueryResult {
    pub fn ok(return_data: Vec<Vec<u8>>) -> Self {
        Self {
            return_data,
            return_code: "ok".to_string(),
            return_message: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.return_code == "ok"
    }

    pub fn first(&self) -> Option<&[u8]> {
        self.return_data.first().map(Vec::as_slice)
    }
}

/// Account snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub nonce: u64,
    /// Balance in the smallest denomination, as a decimal string
    pub balance: String,
}

/// Network provider used by the wallet and the contract client
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Run a read-only contract query
    async fn query_contract(&self, query: &VmQuery) -> Result<VmQueryResult, GatewayError>;

    /// Broadcast a signed transaction, returning its hash
    async fn send_transaction(&self, tx: &Transaction) -> Result<TransactionHash, GatewayError>;

    /// Current processing status of a transaction
    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionStatus, GatewayError>;

    /// Nonce and balance of an account
    async fn get_account(&self, address: &Address) -> Result<AccountInfo, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wire_format() {
        let contract = Address::new([5u8; 32]);
        let user = Address::new([6u8; 32]);
        let query = VmQuery::new(contract, "getProof")
            .with_address_arg(&user)
            .with_arg("X");

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["scAddress"], contract.to_bech32());
        assert_eq!(json["funcName"], "getProof");
        assert_eq!(json["args"][0], hex::encode([6u8; 32]));
        assert_eq!(json["args"][1], "58");

        assert_eq!(query.raw_args().unwrap()[1], b"X".to_vec());
    }
}
