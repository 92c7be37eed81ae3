//! Proof Contract Client
//!
//! Two mutating calls and seven read-only queries against a fixed contract.
//!
//! Mutating calls check the wallet connection before touching the network
//! and collapse every later failure into `ContractError::Submission`.
//! Read calls never fail: any gateway or decode error is logged and the
//! query's default value (`None`, empty list, `false`, `0`) is returned.

use std::sync::Arc;

use log::{debug, warn};

use onchain_proof_gateway::{Gateway, VmQuery, VmQueryResult};
use onchain_proof_types::codec::{top_decode, TopDecode};
use onchain_proof_types::{
    endpoints, Address, ContractCallBuilder, ContractError, Network, ProofRecord, TransactionExt,
    TransactionHash, TransactionStatus, WalletError,
};
use onchain_proof_wallet::WalletSessionManager;

use crate::polling::{self, PollConfig};

/// Gas budget of `certifyAction`
pub const CREATE_PROOF_GAS_LIMIT: u64 = 10_000_000;

/// Gas budget of `updateProof`
pub const UPDATE_PROOF_GAS_LIMIT: u64 = 6_000_000;

#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub contract_address: Address,
    pub chain_id: String,
    pub create_gas_limit: u64,
    pub update_gas_limit: u64,
    pub poll: PollConfig,
}

impl ContractConfig {
    pub fn new(contract_address: Address, network: Network) -> Self {
        Self {
            contract_address,
            chain_id: network.chain_id().to_string(),
            create_gas_limit: CREATE_PROOF_GAS_LIMIT,
            update_gas_limit: UPDATE_PROOF_GAS_LIMIT,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}

pub struct ProofContractClient {
    config: ContractConfig,
    gateway: Arc<dyn Gateway>,
    wallet: Arc<WalletSessionManager>,
}

impl ProofContractClient {
    pub fn new(config: ContractConfig, gateway: Arc<dyn Gateway>, wallet: Arc<WalletSessionManager>) -> Self {
        Self {
            config,
            gateway,
            wallet,
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn contract_address(&self) -> Address {
        self.config.contract_address
    }

    //==========================================================================
    // MUTATING CALLS
    //==========================================================================

    /// Certify a new proof. `metadata` is only sent when provided.
    pub async fn create_proof(
        &self,
        proof_text: &str,
        proof_id: &str,
        metadata: Option<&str>,
    ) -> Result<TransactionHash, ContractError> {
        let sender = self.connected_sender().await?;

        let call = ContractCallBuilder::new(self.config.contract_address, endpoints::CERTIFY_ACTION)
            .argument(&proof_text.to_string())
            .argument(&proof_id.to_string())
            .optional_argument(metadata.map(str::to_string).as_ref())
            .with_gas_limit(self.config.create_gas_limit);

        self.submit(sender, call)
            .await
            .map_err(|e| ContractError::submission(e, "Failed to create proof"))
    }

    /// Replace a proof's text, and its metadata when provided.
    pub async fn update_proof(
        &self,
        proof_id: &str,
        new_proof_text: &str,
        new_metadata: Option<&str>,
    ) -> Result<TransactionHash, ContractError> {
        let sender = self.connected_sender().await?;

        let call = ContractCallBuilder::new(self.config.contract_address, endpoints::UPDATE_PROOF)
            .argument(&proof_id.to_string())
            .argument(&new_proof_text.to_string())
            .optional_argument(new_metadata.map(str::to_string).as_ref())
            .with_gas_limit(self.config.update_gas_limit);

        self.submit(sender, call)
            .await
            .map_err(|e| ContractError::submission(e, "Failed to update proof"))
    }

    async fn connected_sender(&self) -> Result<Address, ContractError> {
        self.wallet
            .active_address()
            .await
            .ok_or(ContractError::WalletNotConnected)
    }

    async fn submit(&self, sender: Address, call: ContractCallBuilder) -> Result<TransactionHash, WalletError> {
        let account = self.gateway.get_account(&sender).await?;
        let tx = call
            .with_sender(sender)
            .with_nonce(account.nonce)
            .with_chain_id(self.config.chain_id.clone())
            .build()?;

        debug!(
            "Submitting {} from {} with nonce {}",
            tx.function_name().unwrap_or_default(),
            sender,
            tx.nonce
        );
        self.wallet.sign_and_broadcast(tx).await
    }

    /// Poll until the transaction is final, using the configured interval.
    pub async fn wait_for_transaction(
        &self,
        hash: &str,
        max_retries: u32,
    ) -> Result<TransactionStatus, ContractError> {
        let config = self.config.poll.with_max_retries(max_retries);
        polling::wait_for_transaction(self.gateway.as_ref(), hash, &config).await
    }

    //==========================================================================
    // READ QUERIES
    //==========================================================================

    async fn query(&self, query: VmQuery) -> Option<VmQueryResult> {
        let function = query.func_name.clone();
        match self.gateway.query_contract(&query).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Query {} failed: {}", function, e);
                None
            }
        }
    }

    fn new_query(&self, function: &str) -> VmQuery {
        VmQuery::new(self.config.contract_address, function)
    }

    pub async fn get_proof(&self, user: &Address, proof_id: &str) -> Option<ProofRecord> {
        let query = self
            .new_query(endpoints::GET_PROOF)
            .with_address_arg(user)
            .with_arg(proof_id);
        let result = self.query(query).await?;

        let bytes = result.first().filter(|bytes| !bytes.is_empty())?;
        match top_decode::<ProofRecord>(bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to decode proof {}: {}", proof_id, e);
                None
            }
        }
    }

    pub async fn get_user_proofs(&self, user: &Address) -> Vec<ProofRecord> {
        let query = self.new_query(endpoints::GET_USER_PROOFS).with_address_arg(user);
        self.query_list(query).await
    }

    pub async fn get_user_proof_ids(&self, user: &Address) -> Vec<String> {
        let query = self.new_query(endpoints::GET_USER_PROOF_IDS).with_address_arg(user);
        self.query_list(query).await
    }

    pub async fn get_proof_owner(&self, proof_id: &str) -> Option<Address> {
        let query = self.new_query(endpoints::GET_PROOF_OWNER).with_arg(proof_id);
        let result = self.query(query).await?;

        let bytes = result.first().filter(|bytes| !bytes.is_empty())?;
        top_decode::<[u8; 32]>(bytes)
            .map(Address::from)
            .map_err(|e| warn!("Failed to decode owner of {}: {}", proof_id, e))
            .ok()
    }

    pub async fn proof_exists(&self, proof_id: &str) -> bool {
        let query = self.new_query(endpoints::PROOF_EXISTS).with_arg(proof_id);
        self.query_value(query).await
    }

    pub async fn get_user_proof_count(&self, user: &Address) -> u64 {
        let query = self.new_query(endpoints::GET_USER_PROOF_COUNT).with_address_arg(user);
        self.query_value(query).await
    }

    pub async fn get_total_proofs(&self) -> u64 {
        self.query_value(self.new_query(endpoints::GET_TOTAL_PROOFS)).await
    }

    /// Single scalar result; an empty result is the type's zero value
    async fn query_value<T: TopDecode + Default>(&self, query: VmQuery) -> T {
        let function = query.func_name.clone();
        let Some(result) = self.query(query).await else {
            return T::default();
        };

        top_decode(result.first().unwrap_or_default())
            .map_err(|e| warn!("Failed to decode {}: {}", function, e))
            .unwrap_or_default()
    }

    /// Multi-value result, one top-encoded item per entry
    async fn query_list<T: TopDecode>(&self, query: VmQuery) -> Vec<T> {
        let function = query.func_name.clone();
        let Some(result) = self.query(query).await else {
            return Vec::new();
        };

        result
            .return_data
            .iter()
            .map(|bytes| top_decode::<T>(bytes))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|e| {
                warn!("Failed to decode {}: {}", function, e);
                Vec::new()
            })
    }
}
