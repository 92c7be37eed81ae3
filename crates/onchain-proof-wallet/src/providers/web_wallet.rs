use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use url::Url;

use onchain_proof_types::{Address, ProviderId, Transaction, WalletError};

use super::{sign_with, WalletProvider};
use crate::signer::TransactionSigner;

/// Hosted web wallet
///
/// Login completes by redirecting the user to the hosted wallet, which sends
/// them back to the callback URL. This is the only manual-redirect backend,
/// so it is never reconnected silently.
pub struct WebWalletProvider {
    wallet_url: Url,
    callback_url: String,
    signer: Option<Arc<dyn TransactionSigner>>,
    login_url: Option<Url>,
}

impl WebWalletProvider {
    pub fn new(
        wallet_url: &str,
        callback_url: &str,
        signer: Option<Arc<dyn TransactionSigner>>,
    ) -> Result<Self, WalletError> {
        let wallet_url = Url::parse(wallet_url)
            .map_err(|e| WalletError::initialization(format!("Invalid web wallet URL {}: {}", wallet_url, e)))?;

        Ok(Self {
            wallet_url,
            callback_url: callback_url.to_string(),
            signer,
            login_url: None,
        })
    }

    /// URL the user opens to log in
    pub fn login_hook_url(&self) -> Result<Url, WalletError> {
        let mut url = self
            .wallet_url
            .join("hook/login")
            .map_err(|e| WalletError::initialization(e.to_string()))?;
        url.query_pairs_mut().append_pair("callbackUrl", &self.callback_url);
        Ok(url)
    }

    fn connected_signer(&self) -> Result<&dyn TransactionSigner, WalletError> {
        match (&self.signer, &self.login_url) {
            (Some(signer), Some(_)) => Ok(signer.as_ref()),
            _ => Err(WalletError::NotConnected),
        }
    }
}

#[async_trait]
impl WalletProvider for WebWalletProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WebWallet
    }

    async fn init(&mut self) -> Result<(), WalletError> {
        let login_url = self.login_hook_url()?;
        info!("Web wallet login: {}", login_url);

        if self.signer.is_none() {
            return Err(WalletError::initialization("Web wallet login was not completed"));
        }
        self.login_url = Some(login_url);
        Ok(())
    }

    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.connected_signer()?.address())
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        sign_with(self.connected_signer()?, tx).await
    }

    async fn logout(&mut self) -> Result<(), WalletError> {
        self.login_url = None;
        Ok(())
    }
}
