//! Wallet session state
//!
//! `WalletSession` is what callers see; `PersistedWalletState` is the minimal
//! blob written to local storage under the `wallet_state` key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Sessions older than this are considered stale
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

/// Identifies one of the supported signing backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Browser extension wallet
    Extension,
    /// Hosted web wallet (manual redirect flow)
    #[serde(rename = "webwallet")]
    WebWallet,
    /// Relay-based mobile wallet
    #[serde(rename = "walletconnect")]
    WalletConnect,
    /// Hardware signer
    Ledger,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Extension,
        ProviderId::WebWallet,
        ProviderId::WalletConnect,
        ProviderId::Ledger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Extension => "extension",
            ProviderId::WebWallet => "webwallet",
            ProviderId::WalletConnect => "walletconnect",
            ProviderId::Ledger => "ledger",
        }
    }

    /// Whether login completes through a browser redirect rather than
    /// in-process, which rules out silent reconnection
    pub fn is_manual_redirect(&self) -> bool {
        matches!(self, ProviderId::WebWallet)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extension" => Ok(ProviderId::Extension),
            "webwallet" => Ok(ProviderId::WebWallet),
            "walletconnect" => Ok(ProviderId::WalletConnect),
            "ledger" => Ok(ProviderId::Ledger),
            _ => Err(WalletError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Connection state as presented to callers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub is_connected: bool,
    pub address: Option<String>,
    pub balance: Option<String>,
    pub provider_id: Option<ProviderId>,
    pub error: Option<String>,
}

impl WalletSession {
    pub fn connected(address: impl Into<String>, provider_id: ProviderId) -> Self {
        Self {
            is_connected: true,
            address: Some(address.into()),
            balance: None,
            provider_id: Some(provider_id),
            error: None,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A disconnected session carrying an error message
    pub fn failed(error: impl Into<String>) -> Self {
        let mut message = error.into();
        if message.trim().is_empty() {
            message = "Failed to connect wallet".to_string();
        }
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    pub fn with_balance(mut self, balance: Option<String>) -> Self {
        self.balance = balance;
        self
    }
}

/// Minimal session metadata persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWalletState {
    pub provider_id: ProviderId,
    pub address: String,
    /// Unix time in milliseconds
    pub connected_at: i64,
}

impl PersistedWalletState {
    pub fn new(provider_id: ProviderId, address: impl Into<String>, connected_at: i64) -> Self {
        Self {
            provider_id,
            address: address.into(),
            connected_at,
        }
    }

    /// Stamp the state with the current wall-clock time
    pub fn now(provider_id: ProviderId, address: impl Into<String>) -> Self {
        Self::new(provider_id, address, chrono::Utc::now().timestamp_millis())
    }

    /// Whether the state is older than the staleness window at `now_millis`
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        let max_age = chrono::Duration::hours(SESSION_MAX_AGE_HOURS).num_milliseconds();
        now_millis.saturating_sub(self.connected_at) > max_age
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp_millis())
    }
}
