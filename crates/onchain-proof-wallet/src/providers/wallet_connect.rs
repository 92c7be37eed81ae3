use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use sha2::{Digest, Sha256};

use onchain_proof_types::{Address, ProviderId, Transaction, WalletError};

use super::{sign_with, WalletProvider};
use crate::signer::TransactionSigner;

/// Relay-based mobile wallet
///
/// A pairing topic identifies the relay session; it exists between `init`
/// and `logout`.
pub struct WalletConnectProvider {
    project_id: Option<String>,
    relay_url: String,
    signer: Option<Arc<dyn TransactionSigner>>,
    pairing_topic: Option<String>,
}

impl WalletConnectProvider {
    pub fn new(
        project_id: Option<String>,
        relay_url: impl Into<String>,
        signer: Option<Arc<dyn TransactionSigner>>,
    ) -> Self {
        Self {
            project_id,
            relay_url: relay_url.into(),
            signer,
            pairing_topic: None,
        }
    }

    pub fn pairing_topic(&self) -> Option<&str> {
        self.pairing_topic.as_deref()
    }

    fn connected_signer(&self) -> Result<&dyn TransactionSigner, WalletError> {
        match (&self.signer, &self.pairing_topic) {
            (Some(signer), Some(_)) => Ok(signer.as_ref()),
            _ => Err(WalletError::NotConnected),
        }
    }
}

#[async_trait]
impl WalletProvider for WalletConnectProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WalletConnect
    }

    async fn init(&mut self) -> Result<(), WalletError> {
        let project_id = self
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| WalletError::initialization("WalletConnect project id is not configured"))?;
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| WalletError::initialization("No wallet approved the pairing request"))?;

        let mut hasher = Sha256::new();
        hasher.update(project_id.as_bytes());
        hasher.update(signer.address().as_bytes());
        hasher.update(chrono::Utc::now().timestamp_millis().to_be_bytes());
        let topic = hex::encode(hasher.finalize());

        info!("Paired with {} (topic {})", self.relay_url, topic);
        self.pairing_topic = Some(topic);
        Ok(())
    }

    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.connected_signer()?.address())
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        sign_with(self.connected_signer()?, tx).await
    }

    async fn logout(&mut self) -> Result<(), WalletError> {
        if let Some(topic) = self.pairing_topic.take() {
            debug!("Dropped pairing {}", topic);
        }
        Ok(())
    }
}
