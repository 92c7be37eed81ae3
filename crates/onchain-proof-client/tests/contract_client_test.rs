use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use onchain_proof_client::{ContractConfig, PollConfig, ProofContractClient};
use onchain_proof_gateway::{AccountInfo, Gateway, LocalLedger, VmQuery, VmQueryResult};
use onchain_proof_types::{
    Address, ContractError, GatewayError, Network, Transaction, TransactionHash, TransactionStatus,
};
use onchain_proof_wallet::{
    KeypairSigner, MemorySessionStore, ProviderRegistry, ProviderSettings, TransactionSigner,
    WalletSessionManager,
};

const CONTRACT: Address = Address::new([0xCC; 32]);

/// Gateway that counts every call and fails all of them
#[derive(Default)]
struct OfflineGateway {
    calls: AtomicUsize,
}

impl OfflineGateway {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::Request("connection refused".to_string()))
    }
}

#[async_trait]
impl Gateway for OfflineGateway {
    async fn query_contract(&self, _query: &VmQuery) -> Result<VmQueryResult, GatewayError> {
        self.fail()
    }

    async fn send_transaction(&self, _tx: &Transaction) -> Result<TransactionHash, GatewayError> {
        self.fail()
    }

    async fn get_transaction_status(&self, _hash: &str) -> Result<TransactionStatus, GatewayError> {
        self.fail()
    }

    async fn get_account(&self, _address: &Address) -> Result<AccountInfo, GatewayError> {
        self.fail()
    }
}

fn fast_poll() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_retries: 10,
    }
}

fn client_for(gateway: Arc<dyn Gateway>, passphrase: &str, network: Network) -> (ProofContractClient, Arc<WalletSessionManager>) {
    let signer: Arc<dyn TransactionSigner> = Arc::new(KeypairSigner::from_passphrase(passphrase).unwrap());
    let registry = ProviderRegistry::new(ProviderSettings::default()).with_signer_for_all(signer);
    let wallet = Arc::new(WalletSessionManager::new(
        gateway.clone(),
        registry,
        Arc::new(MemorySessionStore::new()),
    ));
    let config = ContractConfig::new(CONTRACT, network).with_poll(fast_poll());

    (ProofContractClient::new(config, gateway, wallet.clone()), wallet)
}

async fn connected_client(ledger: &Arc<LocalLedger>, passphrase: &str) -> (ProofContractClient, Address) {
    let (client, wallet) = client_for(ledger.clone(), passphrase, Network::Devnet);
    let session = wallet.connect("extension").await;
    assert!(session.is_connected);

    let address = wallet.active_address().await.unwrap();
    (client, address)
}

#[tokio::test]
async fn test_mutations_fail_fast_when_disconnected() {
    let gateway = Arc::new(OfflineGateway::default());
    let (client, _wallet) = client_for(gateway.clone(), "alice", Network::Devnet);

    let err = client.create_proof("T", "X", Some("{}")).await.unwrap_err();
    assert!(matches!(err, ContractError::WalletNotConnected));
    assert_eq!(err.to_string(), "Wallet not connected");

    let err = client.update_proof("X", "T2", None).await.unwrap_err();
    assert!(matches!(err, ContractError::WalletNotConnected));

    // No request reached the network
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_reads_return_defaults_on_gateway_failure() {
    let gateway = Arc::new(OfflineGateway::default());
    let (client, _wallet) = client_for(gateway.clone(), "alice", Network::Devnet);
    let user = Address::new([1u8; 32]);

    assert_eq!(client.get_proof(&user, "X").await, None);
    assert!(client.get_user_proofs(&user).await.is_empty());
    assert!(client.get_user_proof_ids(&user).await.is_empty());
    assert!(!client.proof_exists("X").await);
    assert_eq!(client.get_proof_owner("X").await, None);
    assert_eq!(client.get_user_proof_count(&user).await, 0);
    assert_eq!(client.get_total_proofs().await, 0);

    // One attempt per read, no retries
    assert_eq!(gateway.calls(), 7);
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D"));
    let (client, alice) = connected_client(&ledger, "alice").await;
    let before = chrono::Utc::now().timestamp() as u64;

    let hash = client.create_proof("T", "X", Some("{}")).await.unwrap();
    let status = client.wait_for_transaction(&hash, 10).await.unwrap();
    assert!(status.is_success());

    let record = client.get_proof(&alice, "X").await.unwrap();
    assert_eq!(record.proof_text, "T");
    assert_eq!(record.proof_id, "X");
    assert_eq!(record.metadata, "{}");
    assert!(record.timestamp > before);

    assert!(client.proof_exists("X").await);
    assert_eq!(client.get_proof_owner("X").await, Some(alice));
    assert_eq!(client.get_user_proof_ids(&alice).await, vec!["X".to_string()]);
}

#[tokio::test]
async fn test_update_flow_and_counters() {
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D").with_pending_polls(2));
    let (client, alice) = connected_client(&ledger, "alice").await;

    for (text, id) in [("HACKATHON_2025_WINNER", "hackathon_001"), ("COURSE_RUST", "course_001")] {
        let hash = client.create_proof(text, id, None).await.unwrap();
        client.wait_for_transaction(&hash, 10).await.unwrap();
    }

    let hash = client
        .update_proof("course_001", "COURSE_RUST_ADVANCED", Some(r#"{"level":2}"#))
        .await
        .unwrap();
    client.wait_for_transaction(&hash, 10).await.unwrap();

    let proofs = client.get_user_proofs(&alice).await;
    assert_eq!(proofs.len(), 2);
    assert_eq!(proofs[1].proof_text, "COURSE_RUST_ADVANCED");
    assert_eq!(proofs[1].metadata, r#"{"level":2}"#);
    assert_eq!(proofs[0].metadata, "");

    assert_eq!(client.get_user_proof_count(&alice).await, 2);
    assert_eq!(client.get_total_proofs().await, 2);
}

#[tokio::test]
async fn test_rejected_update_fails_on_wait() {
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D"));
    let (alice_client, _) = connected_client(&ledger, "alice").await;
    let (bob_client, _) = connected_client(&ledger, "bob").await;

    let hash = alice_client.create_proof("T", "shared", None).await.unwrap();
    alice_client.wait_for_transaction(&hash, 10).await.unwrap();

    let hash = bob_client.update_proof("shared", "forged", None).await.unwrap();
    let err = bob_client.wait_for_transaction(&hash, 10).await.unwrap_err();
    assert!(matches!(err, ContractError::TransactionFailed { .. }));
    assert_eq!(ledger.transaction_error(&hash).as_deref(), Some("Only proof owner can update"));
}

#[tokio::test]
async fn test_wait_times_out() {
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D").with_pending_polls(100));
    let (client, _) = connected_client(&ledger, "alice").await;

    let hash = client.create_proof("T", "slow", None).await.unwrap();
    let err = client.wait_for_transaction(&hash, 3).await.unwrap_err();
    assert!(matches!(err, ContractError::Timeout { attempts: 3, .. }));
}

#[tokio::test]
async fn test_broadcast_rejection_keeps_message() {
    // Client configured for mainnet, ledger running devnet
    let ledger = Arc::new(LocalLedger::new(CONTRACT, "D"));
    let (client, wallet) = client_for(ledger.clone(), "alice", Network::Mainnet);
    wallet.connect("ledger").await;

    let err = client.create_proof("T", "X", None).await.unwrap_err();
    match err {
        ContractError::Submission(message) => assert!(message.starts_with("invalid chain ID")),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(ledger.transaction_count(), 0);
}
