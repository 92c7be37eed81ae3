use std::sync::Arc;

use onchain_proof_gateway::{Gateway, LocalLedger, DEFAULT_ACCOUNT_BALANCE};
use onchain_proof_types::{
    Address, ContractCallBuilder, PersistedWalletState, ProviderId, TransactionStatus, WalletError,
};
use onchain_proof_wallet::{
    FileSessionStore, KeypairSigner, MemorySessionStore, ProviderRegistry, ProviderSettings, SessionStore,
    TransactionSigner, WalletSessionManager, WALLET_STATE_KEY,
};

const CONTRACT: Address = Address::new([0xCC; 32]);

struct Harness {
    ledger: Arc<LocalLedger>,
    store: Arc<MemorySessionStore>,
    signer: Arc<KeypairSigner>,
    manager: WalletSessionManager,
}

fn settings() -> ProviderSettings {
    ProviderSettings {
        walletconnect_project_id: Some("test-project".to_string()),
        ..ProviderSettings::default()
    }
}

fn harness_with(registry: impl FnOnce(Arc<KeypairSigner>) -> ProviderRegistry) -> Harness {
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D"));
    let store = Arc::new(MemorySessionStore::new());
    let signer = Arc::new(KeypairSigner::from_passphrase("alice").unwrap());
    let manager = WalletSessionManager::new(ledger.clone(), registry(signer.clone()), store.clone());

    Harness {
        ledger,
        store,
        signer,
        manager,
    }
}

fn harness() -> Harness {
    harness_with(|signer| ProviderRegistry::new(settings()).with_signer_for_all(signer))
}

fn persist(store: &MemorySessionStore, state: &PersistedWalletState) {
    store
        .set(WALLET_STATE_KEY, &serde_json::to_string(state).unwrap())
        .unwrap();
}

#[tokio::test]
async fn test_connect_every_provider() {
    for provider_id in ProviderId::ALL {
        let h = harness();
        let session = h.manager.connect(provider_id.as_str()).await;

        // Connected with an address, or disconnected with an error; never both
        assert!(session.is_connected, "{} failed: {:?}", provider_id, session.error);
        assert_eq!(session.address, Some(h.signer.address().to_bech32()));
        assert_eq!(session.provider_id, Some(provider_id));
        assert!(session.error.is_none());
        assert_eq!(session.balance, Some(DEFAULT_ACCOUNT_BALANCE.to_string()));
    }
}

#[tokio::test]
async fn test_connect_failures_return_error_session() {
    let h = harness_with(|_| ProviderRegistry::new(ProviderSettings::default()));

    for provider in ["extension", "webwallet", "walletconnect", "ledger", "metamask"] {
        let session = h.manager.connect(provider).await;
        assert!(!session.is_connected);
        assert!(session.address.is_none());
        assert!(!session.error.unwrap_or_default().is_empty());
    }

    let unsupported = h.manager.connect("metamask").await;
    assert_eq!(unsupported.error.as_deref(), Some("Unsupported provider: metamask"));
    assert_eq!(h.store.get(WALLET_STATE_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_connect_persists_state() {
    let h = harness();
    let before = chrono::Utc::now().timestamp_millis();
    h.manager.connect("ledger").await;

    let raw = h.store.get(WALLET_STATE_KEY).unwrap().unwrap();
    let state: PersistedWalletState = serde_json::from_str(&raw).unwrap();
    assert_eq!(state.provider_id, ProviderId::Ledger);
    assert_eq!(state.address, h.signer.address().to_bech32());
    assert!(state.connected_at >= before);

    let current = h.manager.current_session();
    assert!(current.is_connected);
    assert_eq!(current.address, Some(state.address));
}

#[tokio::test]
async fn test_disconnect_clears_state() {
    let h = harness();
    h.manager.connect("walletconnect").await;
    assert!(h.manager.is_connected().await);

    let session = h.manager.disconnect().await;
    assert!(!session.is_connected);
    assert!(!h.manager.is_connected().await);
    assert_eq!(h.store.get(WALLET_STATE_KEY).unwrap(), None);

    // Disconnecting twice is harmless
    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_corrupt_state_is_cleared() {
    let h = harness();
    h.store.set(WALLET_STATE_KEY, "{not json").unwrap();

    let session = h.manager.current_session();
    assert!(!session.is_connected);
    assert_eq!(h.store.get(WALLET_STATE_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_auto_reconnect_expired_session() {
    let h = harness();
    let day_and_an_hour_ago = chrono::Utc::now().timestamp_millis() - 25 * 60 * 60 * 1000;
    persist(
        &h.store,
        &PersistedWalletState::new(ProviderId::Extension, h.signer.address().to_bech32(), day_and_an_hour_ago),
    );

    let session = h.manager.auto_reconnect().await;
    assert!(!session.is_connected);
    assert_eq!(h.store.get(WALLET_STATE_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_auto_reconnect_skips_web_wallet() {
    let h = harness();
    persist(
        &h.store,
        &PersistedWalletState::now(ProviderId::WebWallet, h.signer.address().to_bech32()),
    );

    let session = h.manager.auto_reconnect().await;
    assert!(!session.is_connected);
    assert_eq!(h.store.get(WALLET_STATE_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_auto_reconnect_fresh_session() {
    let h = harness();
    persist(
        &h.store,
        &PersistedWalletState::now(ProviderId::Extension, h.signer.address().to_bech32()),
    );

    let session = h.manager.auto_reconnect().await;
    assert!(session.is_connected);
    assert_eq!(h.manager.active_provider().await, Some(ProviderId::Extension));
}

#[tokio::test]
async fn test_sign_and_broadcast_requires_connection() {
    let h = harness();
    let tx = ContractCallBuilder::new(CONTRACT, "certifyAction")
        .argument(&"T".to_string())
        .argument(&"X".to_string())
        .with_sender(h.signer.address())
        .with_chain_id("D")
        .build()
        .unwrap();

    let err = h.manager.sign_and_broadcast(tx).await.unwrap_err();
    assert!(matches!(err, WalletError::NotConnected));
    assert_eq!(h.ledger.transaction_count(), 0);
}

#[tokio::test]
async fn test_sign_and_broadcast() {
    let h = harness();
    h.manager.connect("extension").await;

    let tx = ContractCallBuilder::new(CONTRACT, "certifyAction")
        .argument(&"T".to_string())
        .argument(&"X".to_string())
        .with_sender(h.signer.address())
        .with_gas_limit(10_000_000)
        .with_chain_id("D")
        .build()
        .unwrap();

    let hash = h.manager.sign_and_broadcast(tx).await.unwrap();
    assert_eq!(
        h.ledger.get_transaction_status(&hash).await.unwrap(),
        TransactionStatus::Success
    );
}

#[tokio::test]
async fn test_session_survives_restart_with_file_store() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D"));
    let signer: Arc<dyn TransactionSigner> = Arc::new(KeypairSigner::from_passphrase("carol").unwrap());
    let registry = ProviderRegistry::new(settings()).with_signer_for_all(signer.clone());

    let first = WalletSessionManager::new(
        ledger.clone(),
        registry.clone(),
        Arc::new(FileSessionStore::new(temp_dir.path())),
    );
    first.connect("ledger").await;

    let second = WalletSessionManager::new(ledger, registry, Arc::new(FileSessionStore::new(temp_dir.path())));
    assert!(!second.is_connected().await);

    let session = second.auto_reconnect().await;
    assert!(session.is_connected);
    assert_eq!(second.active_address().await, Some(signer.address()));
}
