use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Deployment environment the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
}

impl Default for Network {
    fn default() -> Self {
        Network::Devnet
    }
}

impl Network {
    /// Chain identifier stamped into every transaction
    pub fn chain_id(&self) -> &'static str {
        match self {
            Network::Devnet => "D",
            Network::Testnet => "T",
            Network::Mainnet => "1",
        }
    }

    /// Public gateway (proxy) endpoint for this network
    pub fn default_gateway_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://devnet-gateway.multiversx.com",
            Network::Testnet => "https://testnet-gateway.multiversx.com",
            Network::Mainnet => "https://gateway.multiversx.com",
        }
    }

    /// Hosted web wallet for this network
    pub fn default_web_wallet_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://devnet-wallet.multiversx.com",
            Network::Testnet => "https://testnet-wallet.multiversx.com",
            Network::Mainnet => "https://wallet.multiversx.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(format!("Unknown network: {}", other)),
        }
    }
}
