use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use multiversx_sdk::wallet::Wallet;
use sha2::{Digest, Sha256};

use onchain_proof_types::{Address, Transaction, WalletError};

/// The opaque signing service behind a wallet provider.
///
/// Backends differ in how they are reached (extension, hosted wallet, relay,
/// hardware device); all of them end up producing an ed25519 signature over
/// the transaction's signing payload.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign an unsigned transaction, returning the raw 64-byte signature.
    async fn sign_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, WalletError>;
}

/// Signer backed by an in-memory SDK wallet
pub struct KeypairSigner {
    wallet: Wallet,
}

impl KeypairSigner {
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Result<Self, WalletError> {
        Self::from_hex(&hex::encode(secret))
    }

    /// Parse a hex-encoded 32-byte secret key
    pub fn from_hex(secret_hex: &str) -> Result<Self, WalletError> {
        let secret_hex = secret_hex.trim();
        let bytes = hex::decode(secret_hex)
            .map_err(|e| WalletError::signing(format!("Invalid secret key hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(WalletError::signing(format!(
                "Secret key must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        let wallet = Wallet::from_private_key(secret_hex)
            .map_err(|e| WalletError::signing(format!("Invalid secret key: {}", e)))?;
        Ok(Self { wallet })
    }

    /// Deterministic key derived from a passphrase, for demos and tests
    pub fn from_passphrase(passphrase: &str) -> Result<Self, WalletError> {
        let secret: [u8; 32] = Sha256::digest(passphrase.as_bytes()).into();
        Self::from_secret_bytes(&secret)
    }

    /// Load a key file: a wallet PEM export or a hex secret key
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WalletError::signing(format!(
                "Failed to read key file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        if contents.trim_start().starts_with("-----BEGIN") {
            let wallet = Wallet::from_pem_file_contents(contents)
                .map_err(|e| WalletError::signing(format!("Invalid PEM key file: {}", e)))?;
            return Ok(Self { wallet });
        }
        Self::from_hex(&contents)
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("address", &self.address())
            .finish()
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn address(&self) -> Address {
        Address::from(self.wallet.address())
    }

    async fn sign_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, WalletError> {
        Ok(self.wallet.sign_tx(tx).to_vec())
    }
}
