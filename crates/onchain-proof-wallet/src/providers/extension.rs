use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use onchain_proof_types::{Address, ProviderId, Transaction, WalletError};

use super::{sign_with, WalletProvider};
use crate::signer::TransactionSigner;

/// Browser extension wallet
pub struct ExtensionProvider {
    signer: Option<Arc<dyn TransactionSigner>>,
    initialized: bool,
}

impl ExtensionProvider {
    pub fn new(signer: Option<Arc<dyn TransactionSigner>>) -> Self {
        Self {
            signer,
            initialized: false,
        }
    }

    fn connected_signer(&self) -> Result<&dyn TransactionSigner, WalletError> {
        match (&self.signer, self.initialized) {
            (Some(signer), true) => Ok(signer.as_ref()),
            _ => Err(WalletError::NotConnected),
        }
    }
}

#[async_trait]
impl WalletProvider for ExtensionProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Extension
    }

    async fn init(&mut self) -> Result<(), WalletError> {
        if self.signer.is_none() {
            return Err(WalletError::initialization("Wallet extension not detected"));
        }
        self.initialized = true;
        debug!("Extension provider initialized");
        Ok(())
    }

    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.connected_signer()?.address())
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        sign_with(self.connected_signer()?, tx).await
    }

    async fn logout(&mut self) -> Result<(), WalletError> {
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_fails_without_extension() {
        let mut provider = ExtensionProvider::new(None);
        let err = provider.init().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to initialize provider: Wallet extension not detected");
        assert!(matches!(provider.address().await, Err(WalletError::NotConnected)));
    }
}
