//! Local persistent storage for the wallet session blob

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use onchain_proof_types::WalletError;

/// Storage key of the persisted `{providerId, address, connectedAt}` blob
pub const WALLET_STATE_KEY: &str = "wallet_state";

/// Key-value storage surviving between runs
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError>;

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), WalletError>;
}

/// In-memory store, for tests and one-shot runs
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, WalletError> {
        self.entries
            .lock()
            .map_err(|_| WalletError::storage("Session store lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WalletError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WalletError::storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            WalletError::storage(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;
        fs::write(self.path_for(key), value)
            .map_err(|e| WalletError::storage(format!("Failed to write {}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<(), WalletError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WalletError::storage(format!("Failed to remove {}: {}", key, e))),
        }
    }
}
