//! Wallet session management for the on-chain proof client
//!
//! - `TransactionSigner`: the opaque signing service (`KeypairSigner` for
//!   local keys)
//! - `WalletProvider` / `ProviderBackend`: the four connection backends
//! - `SessionStore`: persistence of the `wallet_state` blob
//! - `WalletSessionManager`: connect, disconnect, reconnect, sign and broadcast

pub mod manager;
pub mod providers;
pub mod session_store;
pub mod signer;

pub use manager::WalletSessionManager;
pub use providers::{
    ExtensionProvider, LedgerProvider, ProviderBackend, ProviderRegistry, ProviderSettings,
    WalletConnectProvider, WalletProvider, WebWalletProvider,
};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore, WALLET_STATE_KEY};
pub use signer::{KeypairSigner, TransactionSigner};
