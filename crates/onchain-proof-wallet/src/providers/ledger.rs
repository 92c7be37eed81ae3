use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use onchain_proof_types::{Address, ProviderId, Transaction, WalletError};

use super::{sign_with, WalletProvider};
use crate::signer::TransactionSigner;

/// Hardware signer
pub struct LedgerProvider {
    account_index: u32,
    signer: Option<Arc<dyn TransactionSigner>>,
    device_open: bool,
}

impl LedgerProvider {
    pub fn new(account_index: u32, signer: Option<Arc<dyn TransactionSigner>>) -> Self {
        Self {
            account_index,
            signer,
            device_open: false,
        }
    }

    fn connected_signer(&self) -> Result<&dyn TransactionSigner, WalletError> {
        match (&self.signer, self.device_open) {
            (Some(signer), true) => Ok(signer.as_ref()),
            _ => Err(WalletError::NotConnected),
        }
    }
}

#[async_trait]
impl WalletProvider for LedgerProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ledger
    }

    async fn init(&mut self) -> Result<(), WalletError> {
        if self.signer.is_none() {
            return Err(WalletError::initialization("Ledger device not found"));
        }
        self.device_open = true;
        info!("Ledger device opened (account index {})", self.account_index);
        Ok(())
    }

    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.connected_signer()?.address())
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        sign_with(self.connected_signer()?, tx).await
    }

    async fn logout(&mut self) -> Result<(), WalletError> {
        self.device_open = false;
        Ok(())
    }
}
