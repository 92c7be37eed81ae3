//! Wallet Session Manager
//!
//! Owns the active signing backend and the connection state. Only the
//! minimal `{providerId, address, connectedAt}` blob is persisted; the
//! backend itself lives in memory for the lifetime of the manager.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::RwLock;

use onchain_proof_gateway::Gateway;
use onchain_proof_types::{
    Address, PersistedWalletState, ProviderId, Transaction, TransactionHash, WalletError, WalletSession,
};

use crate::providers::{ProviderBackend, ProviderRegistry, WalletProvider};
use crate::session_store::{SessionStore, WALLET_STATE_KEY};

struct ActiveProvider {
    backend: ProviderBackend,
    address: Address,
}

pub struct WalletSessionManager {
    gateway: Arc<dyn Gateway>,
    registry: ProviderRegistry,
    store: Arc<dyn SessionStore>,
    active: RwLock<Option<ActiveProvider>>,
}

impl WalletSessionManager {
    pub fn new(gateway: Arc<dyn Gateway>, registry: ProviderRegistry, store: Arc<dyn SessionStore>) -> Self {
        Self {
            gateway,
            registry,
            store,
            active: RwLock::new(None),
        }
    }

    /// Connect through the backend named by `provider_id`.
    ///
    /// Never fails: errors come back as a disconnected session carrying the
    /// message.
    pub async fn connect(&self, provider_id: &str) -> WalletSession {
        match self.try_connect(provider_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to connect wallet via {}: {}", provider_id, e);
                WalletSession::failed(e.to_string())
            }
        }
    }

    async fn try_connect(&self, provider_id: &str) -> Result<WalletSession, WalletError> {
        let provider_id: ProviderId = provider_id.parse()?;

        let mut backend = self.registry.create(provider_id)?;
        backend.init().await?;
        let address = backend.address().await?;

        let state = PersistedWalletState::now(provider_id, address.to_bech32());
        self.store.set(WALLET_STATE_KEY, &serde_json::to_string(&state)?)?;

        let previous = self.active.write().await.replace(ActiveProvider { backend, address });
        if let Some(mut previous) = previous {
            if let Err(e) = previous.backend.logout().await {
                warn!("Logout of replaced {} provider failed: {}", previous.backend.id(), e);
            }
        }

        info!("Wallet connected: {} via {}", address, provider_id);
        let balance = self.fetch_balance(&address).await;
        Ok(WalletSession::connected(address.to_bech32(), provider_id).with_balance(balance))
    }

    /// Best-effort account balance
    async fn fetch_balance(&self, address: &Address) -> Option<String> {
        match self.gateway.get_account(address).await {
            Ok(account) => Some(account.balance),
            Err(e) => {
                warn!("Failed to fetch balance for {}: {}", address, e);
                None
            }
        }
    }

    /// Log out of the active backend and clear all session state.
    pub async fn disconnect(&self) -> WalletSession {
        if let Some(mut active) = self.active.write().await.take() {
            if let Err(e) = active.backend.logout().await {
                warn!("Logout from {} provider failed: {}", active.backend.id(), e);
            }
        }

        self.clear_persisted();
        info!("Wallet disconnected");
        WalletSession::disconnected()
    }

    /// Session as recorded in persistent storage
    pub fn current_session(&self) -> WalletSession {
        match self.load_persisted() {
            Some(state) => WalletSession::connected(state.address, state.provider_id),
            None => WalletSession::disconnected(),
        }
    }

    /// Reconnect from persisted state if it is fresh and the provider can
    /// reconnect without user interaction.
    pub async fn auto_reconnect(&self) -> WalletSession {
        let Some(state) = self.load_persisted() else {
            return WalletSession::disconnected();
        };

        if state.is_expired() {
            info!("Persisted session from {} is stale, clearing it", state.connected_at);
            self.clear_persisted();
            return WalletSession::disconnected();
        }
        if state.provider_id.is_manual_redirect() {
            debug!("{} sessions require a manual login", state.provider_id);
            self.clear_persisted();
            return WalletSession::disconnected();
        }

        let session = self.connect(state.provider_id.as_str()).await;
        if session.is_connected && session.address.as_deref() != Some(state.address.as_str()) {
            warn!(
                "Reconnected to a different account than the persisted {}",
                state.address
            );
        }
        session
    }

    /// Sign `tx` with the active backend and broadcast it.
    pub async fn sign_and_broadcast(&self, tx: Transaction) -> Result<TransactionHash, WalletError> {
        let active = self.active.read().await;
        let active = active.as_ref().ok_or(WalletError::NotConnected)?;

        let signed = active.backend.sign_transaction(tx).await?;
        let hash = self.gateway.send_transaction(&signed).await?;

        debug!("Broadcast transaction {}", hash);
        Ok(hash)
    }

    /// Address of the in-memory backend, if one is connected
    pub async fn active_address(&self) -> Option<Address> {
        self.active.read().await.as_ref().map(|active| active.address)
    }

    pub async fn active_provider(&self) -> Option<ProviderId> {
        self.active.read().await.as_ref().map(|active| active.backend.id())
    }

    pub async fn is_connected(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Re-query the balance of the connected account
    pub async fn refresh_balance(&self) -> Option<String> {
        let address = self.active_address().await?;
        self.fetch_balance(&address).await
    }

    pub fn gateway(&self) -> Arc<dyn Gateway> {
        self.gateway.clone()
    }

    /// Parsed persisted state; corrupt state is removed
    fn load_persisted(&self) -> Option<PersistedWalletState> {
        let raw = match self.store.get(WALLET_STATE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Persisted session is corrupt, clearing it: {}", e);
                self.clear_persisted();
                None
            }
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.store.remove(WALLET_STATE_KEY) {
            warn!("Failed to clear persisted session: {}", e);
        }
    }
}
