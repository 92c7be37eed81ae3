//! In-process ledger running the proof contract
//!
//! `LocalLedger` implements `Gateway` without a network: it checks
//! signatures, chain id and nonces the way the proxy does, executes the
//! proof contract's endpoints against in-memory storage and answers its
//! views. Used by the offline demo and by tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use log::{debug, info};
use sha2::{Digest, Sha256};

use onchain_proof_types::codec::{decode_call_data, top_decode, top_encode, TopEncode};
use onchain_proof_types::{
    endpoints, is_valid_proof_text, Address, GatewayError, ProofRecord, Transaction, TransactionExt,
    TransactionHash, TransactionStatus,
};

use crate::gateway::{AccountInfo, Gateway, VmQuery, VmQueryResult};

/// Seconds between two blocks
pub const ROUND_DURATION_SECS: u64 = 6;

/// Balance given to accounts the ledger has not seen before
pub const DEFAULT_ACCOUNT_BALANCE: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone)]
struct AccountState {
    nonce: u64,
    balance: u128,
}

#[derive(Debug, Clone)]
struct LedgerTransaction {
    status: TransactionStatus,
    pending_polls: u32,
    error: Option<String>,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Address, AccountState>,
    proofs: HashMap<(Address, String), ProofRecord>,
    user_proof_ids: HashMap<Address, Vec<String>>,
    proof_owners: HashMap<String, Address>,
    total_proofs: u64,
    transactions: HashMap<TransactionHash, LedgerTransaction>,
    last_block_timestamp: u64,
}

impl LedgerState {
    fn account(&mut self, address: &Address) -> &mut AccountState {
        self.accounts.entry(*address).or_insert(AccountState {
            nonce: 0,
            balance: DEFAULT_ACCOUNT_BALANCE,
        })
    }

    /// Timestamp of the block that will include the next transaction
    fn next_block_timestamp(&mut self) -> u64 {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let timestamp = now.max(self.last_block_timestamp) + ROUND_DURATION_SECS;
        self.last_block_timestamp = timestamp;
        timestamp
    }

    fn user_proof_count(&self, user: &Address) -> u64 {
        self.user_proof_ids.get(user).map_or(0, |ids| ids.len() as u64)
    }
}

/// Contract user error, reported as a failed transaction
struct UserError(String);

impl UserError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// In-memory gateway running the proof contract
pub struct LocalLedger {
    contract: Address,
    chain_id: String,
    pending_polls: u32,
    state: Mutex<LedgerState>,
}

impl LocalLedger {
    pub fn new(contract: Address, chain_id: impl Into<String>) -> Self {
        Self {
            contract,
            chain_id: chain_id.into(),
            pending_polls: 0,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Number of status polls that report `pending` before the final status
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn set_balance(&self, address: &Address, balance: u128) -> Result<(), GatewayError> {
        self.state()?.account(address).balance = balance;
        Ok(())
    }

    /// Stored proof, bypassing the query codec
    pub fn proof(&self, owner: &Address, proof_id: &str) -> Option<ProofRecord> {
        let state = self.state().ok()?;
        state.proofs.get(&(*owner, proof_id.to_string())).cloned()
    }

    pub fn total_proofs(&self) -> u64 {
        self.state().map(|state| state.total_proofs).unwrap_or(0)
    }

    /// Reason a transaction failed, if it did
    pub fn transaction_error(&self, hash: &str) -> Option<String> {
        let state = self.state().ok()?;
        state.transactions.get(hash).and_then(|tx| tx.error.clone())
    }

    pub fn transaction_count(&self) -> usize {
        self.state().map(|state| state.transactions.len()).unwrap_or(0)
    }

    fn state(&self) -> Result<MutexGuard<'_, LedgerState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Request("Ledger state lock poisoned".to_string()))
    }

    //--------------------------------------------------------------------------
    // TRANSACTION VALIDATION
    //--------------------------------------------------------------------------

    fn verify_signature(tx: &Transaction) -> Result<Vec<u8>, GatewayError> {
        let signature_hex = tx
            .signature
            .as_deref()
            .ok_or_else(|| GatewayError::rejected("transaction is not signed"))?;
        let signature_bytes = hex::decode(signature_hex)
            .map_err(|_| GatewayError::rejected("invalid signature encoding"))?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|_| GatewayError::rejected("invalid signature length"))?;
        let verifying_key = VerifyingKey::from_bytes(tx.sender_address().as_bytes())
            .map_err(|_| GatewayError::rejected("invalid sender public key"))?;
        let payload = tx
            .signing_bytes()
            .map_err(|e| GatewayError::rejected(format!("cannot serialize transaction: {}", e)))?;

        verifying_key
            .verify(&payload, &signature)
            .map_err(|_| GatewayError::rejected("invalid signature"))?;

        Ok([payload, signature_bytes].concat())
    }

    //--------------------------------------------------------------------------
    // CONTRACT ENDPOINTS
    //--------------------------------------------------------------------------

    fn execute(&self, state: &mut LedgerState, tx: &Transaction) -> (TransactionStatus, Option<String>) {
        if tx.receiver_address() != self.contract {
            return (
                TransactionStatus::Invalid,
                Some("receiver is not the proof contract".to_string()),
            );
        }

        let call = tx.call_data().and_then(|data| decode_call_data(&data));
        let (function, args) = match call {
            Ok(call) => call,
            Err(e) => return (TransactionStatus::Invalid, Some(e.to_string())),
        };

        let caller = tx.sender_address();
        let result = match function.as_str() {
            endpoints::CERTIFY_ACTION => Self::certify_action(state, &caller, &args),
            endpoints::UPDATE_PROOF => Self::update_proof(state, &caller, &args),
            other => {
                return (
                    TransactionStatus::Invalid,
                    Some(format!("invalid function (not found): {}", other)),
                )
            }
        };

        match result {
            Ok(()) => (TransactionStatus::Success, None),
            Err(UserError(message)) => (TransactionStatus::Failed, Some(message)),
        }
    }

    fn text_arg(arg: &[u8]) -> Result<String, UserError> {
        top_decode::<String>(arg).map_err(|e| UserError::new(e.to_string()))
    }

    fn certify_action(state: &mut LedgerState, caller: &Address, args: &[Vec<u8>]) -> Result<(), UserError> {
        if !(2..=3).contains(&args.len()) {
            return Err(UserError::new("wrong number of arguments"));
        }
        let proof_text = Self::text_arg(&args[0])?;
        let proof_id = Self::text_arg(&args[1])?;
        let metadata = match args.get(2) {
            Some(arg) => Self::text_arg(arg)?,
            None => String::new(),
        };

        if !is_valid_proof_text(&proof_text) {
            return Err(UserError::new("Proof text must be between 1 and 500 characters"));
        }
        if proof_id.is_empty() {
            return Err(UserError::new("Proof ID cannot be empty"));
        }
        if state.proof_owners.contains_key(&proof_id) {
            return Err(UserError::new("Proof ID already exists"));
        }

        let timestamp = state.next_block_timestamp();
        let record = ProofRecord::new(proof_text, proof_id.clone(), timestamp, metadata);

        state.proofs.insert((*caller, proof_id.clone()), record);
        state.user_proof_ids.entry(*caller).or_default().push(proof_id.clone());
        state.proof_owners.insert(proof_id.clone(), *caller);
        state.total_proofs += 1;

        info!("Proof {} certified by {}", proof_id, caller);
        Ok(())
    }

    fn update_proof(state: &mut LedgerState, caller: &Address, args: &[Vec<u8>]) -> Result<(), UserError> {
        if !(2..=3).contains(&args.len()) {
            return Err(UserError::new("wrong number of arguments"));
        }
        let proof_id = Self::text_arg(&args[0])?;
        let new_text = Self::text_arg(&args[1])?;
        let new_metadata = match args.get(2) {
            Some(arg) => Some(Self::text_arg(arg)?),
            None => None,
        };

        let owner = *state
            .proof_owners
            .get(&proof_id)
            .ok_or_else(|| UserError::new("Proof not found"))?;
        if owner != *caller {
            return Err(UserError::new("Only proof owner can update"));
        }
        if !is_valid_proof_text(&new_text) {
            return Err(UserError::new("Proof text must be between 1 and 500 characters"));
        }

        let record = state
            .proofs
            .get_mut(&(owner, proof_id.clone()))
            .ok_or_else(|| UserError::new("Proof not found"))?;
        record.proof_text = new_text;
        if let Some(metadata) = new_metadata {
            record.metadata = metadata;
        }

        info!("Proof {} updated by {}", proof_id, caller);
        Ok(())
    }

    //--------------------------------------------------------------------------
    // CONTRACT VIEWS
    //--------------------------------------------------------------------------

    fn address_arg(arg: &[u8]) -> Result<Address, GatewayError> {
        Address::from_slice(arg).map_err(|e| GatewayError::rejected(e.to_string()))
    }

    fn string_arg(arg: &[u8]) -> Result<String, GatewayError> {
        top_decode::<String>(arg).map_err(|e| GatewayError::rejected(e.to_string()))
    }

    fn encoded<T: TopEncode>(value: &T) -> Result<Vec<u8>, GatewayError> {
        top_encode(value).map_err(|e| GatewayError::rejected(e.to_string()))
    }

    fn expect_args(args: &[Vec<u8>], count: usize) -> Result<(), GatewayError> {
        if args.len() != count {
            return Err(GatewayError::rejected("wrong number of arguments"));
        }
        Ok(())
    }

    fn run_view(state: &LedgerState, function: &str, args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, GatewayError> {
        match function {
            endpoints::GET_PROOF => {
                Self::expect_args(args, 2)?;
                let user = Self::address_arg(&args[0])?;
                let proof_id = Self::string_arg(&args[1])?;
                state
                    .proofs
                    .get(&(user, proof_id))
                    .map(|record| Self::encoded(record))
                    .into_iter()
                    .collect()
            }
            endpoints::GET_USER_PROOFS => {
                Self::expect_args(args, 1)?;
                let user = Self::address_arg(&args[0])?;
                let ids = state.user_proof_ids.get(&user).cloned().unwrap_or_default();
                ids.into_iter()
                    .filter_map(|id| state.proofs.get(&(user, id)))
                    .map(Self::encoded)
                    .collect()
            }
            endpoints::GET_USER_PROOF_IDS => {
                Self::expect_args(args, 1)?;
                let user = Self::address_arg(&args[0])?;
                state
                    .user_proof_ids
                    .get(&user)
                    .map(|ids| ids.iter().map(Self::encoded).collect())
                    .unwrap_or_else(|| Ok(Vec::new()))
            }
            endpoints::GET_PROOF_OWNER => {
                Self::expect_args(args, 1)?;
                let proof_id = Self::string_arg(&args[0])?;
                state
                    .proof_owners
                    .get(&proof_id)
                    .map(|owner| Self::encoded(owner.as_bytes()))
                    .into_iter()
                    .collect()
            }
            endpoints::GET_USER_PROOF_COUNT => {
                Self::expect_args(args, 1)?;
                let user = Self::address_arg(&args[0])?;
                Ok(vec![Self::encoded(&state.user_proof_count(&user))?])
            }
            endpoints::GET_TOTAL_PROOFS => {
                Self::expect_args(args, 0)?;
                Ok(vec![Self::encoded(&state.total_proofs)?])
            }
            endpoints::PROOF_EXISTS => {
                Self::expect_args(args, 1)?;
                let proof_id = Self::string_arg(&args[0])?;
                Ok(vec![Self::encoded(&state.proof_owners.contains_key(&proof_id))?])
            }
            other => Err(GatewayError::rejected(format!("function not found: {}", other))),
        }
    }
}

#[async_trait]
impl Gateway for LocalLedger {
    async fn query_contract(&self, query: &VmQuery) -> Result<VmQueryResult, GatewayError> {
        if query.sc_address != self.contract {
            return Err(GatewayError::rejected(format!(
                "no contract deployed at {}",
                query.sc_address
            )));
        }

        let args = query.raw_args()?;
        let state = self.state()?;
        let return_data = Self::run_view(&state, &query.func_name, &args)?;

        debug!("Query {} returned {} values", query.func_name, return_data.len());
        Ok(VmQueryResult::ok(return_data))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<TransactionHash, GatewayError> {
        if tx.chain_id != self.chain_id {
            return Err(GatewayError::rejected(format!(
                "invalid chain ID: expected {}, got {}",
                self.chain_id, tx.chain_id
            )));
        }

        let signed_bytes = Self::verify_signature(tx)?;
        let hash = hex::encode(Sha256::digest(&signed_bytes));

        let mut state = self.state()?;
        let account = state.account(&tx.sender_address());
        if tx.nonce < account.nonce {
            return Err(GatewayError::rejected(format!(
                "invalid nonce: transaction nonce {} is lower than account nonce {}",
                tx.nonce, account.nonce
            )));
        }
        // Nonce gaps would sit in the proxy's queue forever
        if tx.nonce > account.nonce {
            return Err(GatewayError::rejected(format!(
                "invalid nonce: transaction nonce {} is ahead of account nonce {}",
                tx.nonce, account.nonce
            )));
        }
        account.nonce += 1;

        let (status, error) = self.execute(&mut state, tx);
        debug!("Transaction {} finished with status {}", hash, status);

        state.transactions.insert(
            hash.clone(),
            LedgerTransaction {
                status,
                pending_polls: self.pending_polls,
                error,
            },
        );

        Ok(hash)
    }

    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionStatus, GatewayError> {
        let mut state = self.state()?;
        let tx = state
            .transactions
            .get_mut(hash)
            .ok_or_else(|| GatewayError::TransactionNotFound(hash.to_string()))?;

        if tx.pending_polls > 0 {
            tx.pending_polls -= 1;
            return Ok(TransactionStatus::Pending);
        }
        Ok(tx.status.clone())
    }

    async fn get_account(&self, address: &Address) -> Result<AccountInfo, GatewayError> {
        let mut state = self.state()?;
        let account = state.account(address).clone();

        Ok(AccountInfo {
            address: *address,
            nonce: account.nonce,
            balance: account.balance.to_string(),
        })
    }
}
