//! Wallet provider backends
//!
//! Every backend implements the same capability set: initialize, report the
//! connected address, sign a transaction and (optionally) log out. The
//! backend for a session is chosen by `ProviderId` through
//! `ProviderRegistry` and stored as a `ProviderBackend` variant.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use onchain_proof_types::{Address, Network, ProviderId, Transaction, TransactionExt, WalletError};

use crate::signer::TransactionSigner;

pub mod extension;
pub mod ledger;
pub mod wallet_connect;
pub mod web_wallet;

pub use extension::ExtensionProvider;
pub use ledger::LedgerProvider;
pub use wallet_connect::WalletConnectProvider;
pub use web_wallet::WebWalletProvider;

/// Capability set shared by all signing backends
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Run the backend's connection ceremony
    async fn init(&mut self) -> Result<(), WalletError>;

    /// Address of the connected account
    async fn address(&self) -> Result<Address, WalletError>;

    /// Sign a transaction, returning it with the signature attached
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    /// Release the backend's connection, if it holds one
    async fn logout(&mut self) -> Result<(), WalletError> {
        Ok(())
    }
}

/// Sign `tx` with `signer`, refusing transactions sent from another account
pub(crate) async fn sign_with(
    signer: &dyn TransactionSigner,
    mut tx: Transaction,
) -> Result<Transaction, WalletError> {
    let address = signer.address();
    let sender = tx.sender_address();
    if sender != address {
        return Err(WalletError::signing(format!(
            "Transaction sender {} does not match connected account {}",
            sender, address
        )));
    }

    tx.signature = None;
    let signature = signer.sign_transaction(&tx).await?;
    tx.signature = Some(hex::encode(signature));
    Ok(tx)
}

/// One of the four signing backends
pub enum ProviderBackend {
    Extension(ExtensionProvider),
    WebWallet(WebWalletProvider),
    WalletConnect(WalletConnectProvider),
    Ledger(LedgerProvider),
}

impl ProviderBackend {
    fn as_provider(&self) -> &dyn WalletProvider {
        match self {
            ProviderBackend::Extension(provider) => provider,
            ProviderBackend::WebWallet(provider) => provider,
            ProviderBackend::WalletConnect(provider) => provider,
            ProviderBackend::Ledger(provider) => provider,
        }
    }

    fn as_provider_mut(&mut self) -> &mut dyn WalletProvider {
        match self {
            ProviderBackend::Extension(provider) => provider,
            ProviderBackend::WebWallet(provider) => provider,
            ProviderBackend::WalletConnect(provider) => provider,
            ProviderBackend::Ledger(provider) => provider,
        }
    }
}

#[async_trait]
impl WalletProvider for ProviderBackend {
    fn id(&self) -> ProviderId {
        self.as_provider().id()
    }

    async fn init(&mut self) -> Result<(), WalletError> {
        self.as_provider_mut().init().await
    }

    async fn address(&self) -> Result<Address, WalletError> {
        self.as_provider().address().await
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        self.as_provider().sign_transaction(tx).await
    }

    async fn logout(&mut self) -> Result<(), WalletError> {
        self.as_provider_mut().logout().await
    }
}

/// Settings consumed by the backends' connection ceremonies
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Hosted web wallet base URL
    pub web_wallet_url: String,
    /// Where the hosted wallet redirects after login
    pub callback_url: String,
    pub walletconnect_project_id: Option<String>,
    pub walletconnect_relay_url: String,
    pub ledger_account_index: u32,
}

impl ProviderSettings {
    pub fn for_network(network: Network) -> Self {
        Self {
            web_wallet_url: network.default_web_wallet_url().to_string(),
            ..Self::default()
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            web_wallet_url: Network::Devnet.default_web_wallet_url().to_string(),
            callback_url: "http://localhost:3000".to_string(),
            walletconnect_project_id: None,
            walletconnect_relay_url: "wss://relay.walletconnect.com".to_string(),
            ledger_account_index: 0,
        }
    }
}

/// Creates backends by id, handing each the signer registered for it
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    settings: ProviderSettings,
    signers: HashMap<ProviderId, Arc<dyn TransactionSigner>>,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            signers: HashMap::new(),
        }
    }

    pub fn with_signer(mut self, provider_id: ProviderId, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signers.insert(provider_id, signer);
        self
    }

    /// Use the same signing service behind every backend
    pub fn with_signer_for_all(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        for provider_id in ProviderId::ALL {
            self.signers.insert(provider_id, signer.clone());
        }
        self
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn create(&self, provider_id: ProviderId) -> Result<ProviderBackend, WalletError> {
        let signer = self.signers.get(&provider_id).cloned();

        let backend = match provider_id {
            ProviderId::Extension => ProviderBackend::Extension(ExtensionProvider::new(signer)),
            ProviderId::WebWallet => ProviderBackend::WebWallet(WebWalletProvider::new(
                &self.settings.web_wallet_url,
                &self.settings.callback_url,
                signer,
            )?),
            ProviderId::WalletConnect => ProviderBackend::WalletConnect(WalletConnectProvider::new(
                self.settings.walletconnect_project_id.clone(),
                self.settings.walletconnect_relay_url.clone(),
                signer,
            )),
            ProviderId::Ledger => ProviderBackend::Ledger(LedgerProvider::new(
                self.settings.ledger_account_index,
                signer,
            )),
        };

        Ok(backend)
    }
}
