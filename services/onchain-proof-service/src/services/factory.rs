//! Service factory for dependency injection
//!
//! Everything is constructed explicitly and passed down: the gateway, the
//! wallet session manager and the contract client are shared through the
//! container rather than held in process-wide singletons.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use onchain_proof_client::{ContractConfig, PollConfig, ProofContractClient};
use onchain_proof_gateway::{Gateway, HttpGateway, HttpGatewayConfig, LocalLedger};
use onchain_proof_types::{Address, Network};
use onchain_proof_wallet::{
    FileSessionStore, KeypairSigner, MemorySessionStore, ProviderRegistry, ProviderSettings, SessionStore,
    TransactionSigner, WalletSessionManager,
};

use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};

use super::ProofService;

/// Key used for every provider when the local ledger runs without a key file
pub const LOCAL_DEMO_PASSPHRASE: &str = "onchain-proof-local";

/// Service container holding all initialized services
pub struct ServiceContainer {
    pub gateway: Arc<dyn Gateway>,
    /// Set when running against the in-process ledger
    pub ledger: Option<Arc<LocalLedger>>,
    pub wallet: Arc<WalletSessionManager>,
    pub contract: Arc<ProofContractClient>,
    pub proof_service: Arc<ProofService>,
}

/// Factory for creating and configuring services
pub struct ServiceFactory;

impl ServiceFactory {
    /// Create all services from the loaded configuration
    pub fn create_services(config: &Config) -> ServiceResult<ServiceContainer> {
        config.validate()?;
        let options = ServiceOptions::from_config(config)?;

        let mut ledger = None;
        let gateway: Arc<dyn Gateway> = if config.is_local() {
            let local = Arc::new(
                LocalLedger::new(options.contract.contract_address, options.contract.chain_id.clone())
                    .with_pending_polls(config.network.local_pending_polls),
            );
            ledger = Some(local.clone());
            info!("Using in-process ledger for contract {}", options.contract.contract_address);
            local
        } else {
            let url = config.gateway_url();
            info!("Using gateway {}", url);
            Arc::new(HttpGateway::new(HttpGatewayConfig {
                base_url: url,
                timeout: Duration::from_secs(config.network.request_timeout_secs),
            })?)
        };

        let signer: Option<Arc<dyn TransactionSigner>> = match &config.wallet.key_file {
            Some(path) => Some(Arc::new(KeypairSigner::load(path)?)),
            None if config.is_local() => Some(Arc::new(KeypairSigner::from_passphrase(LOCAL_DEMO_PASSPHRASE)?)),
            None => None,
        };

        let store: Arc<dyn SessionStore> = match &config.wallet.session_dir {
            Some(dir) => Arc::new(FileSessionStore::new(dir)),
            None => Arc::new(MemorySessionStore::new()),
        };

        let mut container = Self::create_with_options(gateway, signer, store, options)?;
        container.ledger = ledger;
        Ok(container)
    }

    /// Create services with custom configuration
    pub fn create_with_options(
        gateway: Arc<dyn Gateway>,
        signer: Option<Arc<dyn TransactionSigner>>,
        store: Arc<dyn SessionStore>,
        options: ServiceOptions,
    ) -> ServiceResult<ServiceContainer> {
        let mut registry = ProviderRegistry::new(options.provider_settings);
        if let Some(signer) = signer {
            registry = registry.with_signer_for_all(signer);
        }

        let wallet = Arc::new(WalletSessionManager::new(gateway.clone(), registry, store));
        let contract = Arc::new(ProofContractClient::new(options.contract, gateway.clone(), wallet.clone()));
        let proof_service = Arc::new(ProofService::new(
            contract.clone(),
            wallet.clone(),
            options.success_display_window,
            options.max_retries,
        ));

        Ok(ServiceContainer {
            gateway,
            ledger: None,
            wallet,
            contract,
            proof_service,
        })
    }

    /// Services over a fresh in-process ledger, for tests and the demo
    pub fn create_test_services(signer: Arc<dyn TransactionSigner>) -> ServiceResult<ServiceContainer> {
        let options = ServiceOptions::test_defaults();
        let ledger = Arc::new(LocalLedger::new(
            options.contract.contract_address,
            options.contract.chain_id.clone(),
        ));

        let mut container = Self::create_with_options(
            ledger.clone(),
            Some(signer),
            Arc::new(MemorySessionStore::new()),
            options,
        )?;
        container.ledger = Some(ledger);
        Ok(container)
    }
}

/// Options for customizing service creation
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub contract: ContractConfig,
    pub provider_settings: ProviderSettings,
    pub success_display_window: Duration,
    /// Default poll budget of `ProofService` mutations
    pub max_retries: u32,
}

impl ServiceOptions {
    /// Create options from config
    pub fn from_config(config: &Config) -> ServiceResult<Self> {
        let contract_address = config
            .contract_address()
            .map_err(|e| ServiceError::config(e.to_string()))?;

        let mut contract = ContractConfig::new(contract_address, config.network.network).with_poll(PollConfig {
            interval: Duration::from_millis(config.polling.interval_ms),
            max_retries: config.polling.max_retries,
        });
        contract.create_gas_limit = config.contract.create_gas_limit;
        contract.update_gas_limit = config.contract.update_gas_limit;

        let provider_settings = ProviderSettings {
            web_wallet_url: config.web_wallet_url(),
            callback_url: config.wallet.callback_url.clone(),
            walletconnect_project_id: config.wallet.walletconnect_project_id.clone(),
            ledger_account_index: config.wallet.ledger_account_index,
            ..ProviderSettings::for_network(config.network.network)
        };

        Ok(Self {
            contract,
            provider_settings,
            success_display_window: Duration::from_secs(config.polling.success_display_secs),
            max_retries: config.polling.max_retries,
        })
    }

    /// Default options for testing
    pub fn test_defaults() -> Self {
        let contract = ContractConfig::new(Address::new([0xCC; 32]), Network::Devnet).with_poll(PollConfig {
            interval: Duration::from_millis(1),
            max_retries: 10,
        });

        Self {
            contract,
            provider_settings: ProviderSettings {
                walletconnect_project_id: Some("test-project".to_string()),
                ..ProviderSettings::default()
            },
            success_display_window: Duration::from_millis(50),
            max_retries: 10,
        }
    }
}
