//! Proof service
//!
//! Wraps the contract client with the UI-local `TransactionState`: each
//! mutating call moves the state through begin, submitted and then
//! succeeded or failed. A successful state is cleared once its display
//! window has passed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::RwLock;

use onchain_proof_client::ProofContractClient;
use onchain_proof_types::{Address, ContractError, ProofRecord, TransactionHash, TransactionState, WalletSession};
use onchain_proof_wallet::WalletSessionManager;

use crate::error::{ServiceError, ServiceResult};

/// Read-side snapshot shown after every mutation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub session: WalletSession,
    pub user: Address,
    pub proofs: Vec<ProofRecord>,
    pub proof_ids: Vec<String>,
    pub user_proof_count: u64,
    pub total_proofs: u64,
}

pub struct ProofService {
    contract: Arc<ProofContractClient>,
    wallet: Arc<WalletSessionManager>,
    state: RwLock<TransactionState>,
    display_window: Duration,
    max_retries: u32,
}

impl ProofService {
    pub fn new(
        contract: Arc<ProofContractClient>,
        wallet: Arc<WalletSessionManager>,
        display_window: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            contract,
            wallet,
            state: RwLock::new(TransactionState::default()),
            display_window,
            max_retries,
        }
    }

    /// Current transaction state, cleared if a success has been shown long enough
    pub async fn transaction_state(&self) -> TransactionState {
        let mut state = self.state.write().await;
        if state.should_reset_at(Utc::now(), self.display_window) {
            state.reset();
        }
        state.clone()
    }

    pub async fn create_proof(
        &self,
        proof_text: &str,
        proof_id: &str,
        metadata: Option<&str>,
    ) -> ServiceResult<TransactionHash> {
        let hash = self
            .track(self.contract.create_proof(proof_text, proof_id, metadata))
            .await?;
        info!("Proof {} created in {}", proof_id, hash);
        Ok(hash)
    }

    pub async fn update_proof(
        &self,
        proof_id: &str,
        new_proof_text: &str,
        new_metadata: Option<&str>,
    ) -> ServiceResult<TransactionHash> {
        let hash = self
            .track(self.contract.update_proof(proof_id, new_proof_text, new_metadata))
            .await?;
        info!("Proof {} updated in {}", proof_id, hash);
        Ok(hash)
    }

    async fn track<F>(&self, submission: F) -> ServiceResult<TransactionHash>
    where
        F: Future<Output = Result<TransactionHash, ContractError>>,
    {
        self.state.write().await.begin();

        let hash = match submission.await {
            Ok(hash) => hash,
            Err(e) => return Err(self.fail(e).await),
        };
        self.state.write().await.submitted(hash.clone());

        match self.contract.wait_for_transaction(&hash, self.max_retries).await {
            Ok(_) => {
                self.state.write().await.succeeded();
                Ok(hash)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn fail(&self, error: ContractError) -> ServiceError {
        warn!("Transaction failed: {}", error);
        self.state.write().await.failed(error.to_string());
        error.into()
    }

    /// Snapshot of the read endpoints for `user`, queried concurrently
    pub async fn dashboard(&self, user: &Address) -> Dashboard {
        let session = self.current_session().await;

        let (proofs, proof_ids, user_proof_count, total_proofs) = tokio::join!(
            self.contract.get_user_proofs(user),
            self.contract.get_user_proof_ids(user),
            self.contract.get_user_proof_count(user),
            self.contract.get_total_proofs(),
        );

        Dashboard {
            session,
            user: *user,
            proofs,
            proof_ids,
            user_proof_count,
            total_proofs,
        }
    }

    /// Dashboard of the connected account
    pub async fn my_dashboard(&self) -> ServiceResult<Dashboard> {
        let user = self
            .wallet
            .active_address()
            .await
            .ok_or(ContractError::WalletNotConnected)?;
        Ok(self.dashboard(&user).await)
    }

    /// Persisted session, with a fresh balance when a backend is active
    pub async fn current_session(&self) -> WalletSession {
        let session = self.wallet.current_session();
        if !session.is_connected {
            return session;
        }
        let balance = self.wallet.refresh_balance().await;
        session.with_balance(balance)
    }
}
