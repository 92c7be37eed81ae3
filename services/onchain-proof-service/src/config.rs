use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use onchain_proof_types::{Address, Network};

/// Contract address used by the in-process ledger when none is configured
pub const LOCAL_CONTRACT_ADDRESS: Address = Address::new(*b"proof-contract-local-ledger-0001");

pub const ENV_NETWORK: &str = "PROOF_NETWORK";
pub const ENV_GATEWAY_URL: &str = "PROOF_GATEWAY_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "PROOF_CONTRACT_ADDRESS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub contract: ContractSection,
    pub wallet: WalletConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Deployment environment: "devnet", "testnet" or "mainnet"
    pub network: Network,
    /// Gateway type: "http" or "local"
    pub gateway_type: String,
    /// Gateway URL; defaults to the network's public gateway
    pub gateway_url: Option<String>,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Status polls the local ledger reports as pending
    pub local_pending_polls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSection {
    /// Bech32 address of the proof contract
    pub address: Option<String>,
    pub create_gas_limit: u64,
    pub update_gas_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Directory of the persisted session; in-memory when unset
    pub session_dir: Option<String>,
    /// Hex secret key backing the signing providers
    pub key_file: Option<String>,
    /// Hosted web wallet URL; defaults to the network's wallet
    pub web_wallet_url: Option<String>,
    pub callback_url: String,
    pub walletconnect_project_id: Option<String>,
    pub ledger_account_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between transaction status polls in milliseconds
    pub interval_ms: u64,
    pub max_retries: u32,
    /// How long a successful transaction stays visible, in seconds
    pub success_display_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                network: Network::Devnet,
                gateway_type: "http".to_string(),
                gateway_url: None,
                request_timeout_secs: 30,
                local_pending_polls: 1,
            },
            contract: ContractSection {
                address: None,
                create_gas_limit: 10_000_000,
                update_gas_limit: 6_000_000,
            },
            wallet: WalletConfig {
                session_dir: Some(".onchain-proof".to_string()),
                key_file: None,
                web_wallet_url: None,
                callback_url: "http://localhost:3000".to_string(),
                walletconnect_project_id: None,
                ledger_account_index: 0,
            },
            polling: PollingConfig {
                interval_ms: 2000,
                max_retries: 10,
                success_display_secs: 5,
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?;
            Ok(config)
        } else {
            // Create default config file
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay the process environment. Read once at startup.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(network) = lookup(ENV_NETWORK) {
            self.network.network = network
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {}", ENV_NETWORK))?;
        }
        if let Some(url) = lookup(ENV_GATEWAY_URL) {
            self.network.gateway_url = Some(url);
        }
        if let Some(address) = lookup(ENV_CONTRACT_ADDRESS) {
            self.contract.address = Some(address);
        }
        Ok(())
    }

    pub fn is_local(&self) -> bool {
        self.network.gateway_type == "local"
    }

    pub fn gateway_url(&self) -> String {
        self.network
            .gateway_url
            .clone()
            .unwrap_or_else(|| self.network.network.default_gateway_url().to_string())
    }

    pub fn web_wallet_url(&self) -> String {
        self.wallet
            .web_wallet_url
            .clone()
            .unwrap_or_else(|| self.network.network.default_web_wallet_url().to_string())
    }

    /// Configured contract address; the local ledger falls back to its own
    pub fn contract_address(&self) -> Result<Address> {
        match &self.contract.address {
            Some(address) => Address::from_bech32(address)
                .with_context(|| format!("Invalid contract address {}", address)),
            None if self.is_local() => Ok(LOCAL_CONTRACT_ADDRESS),
            None => bail!("Contract address is not configured (set {})", ENV_CONTRACT_ADDRESS),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.network.gateway_type.as_str() {
            "http" | "local" => {}
            other => bail!("Unknown gateway type: {} (expected \"http\" or \"local\")", other),
        }
        if self.polling.max_retries == 0 {
            bail!("polling.max_retries must be at least 1");
        }
        if self.contract.create_gas_limit == 0 || self.contract.update_gas_limit == 0 {
            bail!("Gas limits must be positive");
        }
        self.contract_address()?;
        Ok(())
    }
}
