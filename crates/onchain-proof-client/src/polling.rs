//! Transaction finality polling
//!
//! A fixed-interval, fixed-attempt loop: no backoff, no jitter, no
//! cancellation.

use std::time::Duration;

use log::{debug, warn};

use onchain_proof_gateway::Gateway;
use onchain_proof_types::{ContractError, TransactionStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_retries: u32,
}

impl PollConfig {
    pub fn with_max_retries(self, max_retries: u32) -> Self {
        Self { max_retries, ..self }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Poll `hash` until it reaches a terminal status.
///
/// Returns the status on `executed`/`success`, fails immediately on
/// `failed`/`invalid`, and times out after `max_retries` non-terminal polls.
/// A status request that errors counts as a non-terminal poll.
pub async fn wait_for_transaction(
    gateway: &dyn Gateway,
    hash: &str,
    config: &PollConfig,
) -> Result<TransactionStatus, ContractError> {
    for attempt in 1..=config.max_retries {
        match gateway.get_transaction_status(hash).await {
            Ok(status) if status.is_success() => {
                debug!("Transaction {} reached {} after {} polls", hash, status, attempt);
                return Ok(status);
            }
            Ok(status) if status.is_failure() => {
                return Err(ContractError::TransactionFailed {
                    hash: hash.to_string(),
                    status: status.to_string(),
                });
            }
            Ok(status) => debug!("Transaction {} is {} (poll {}/{})", hash, status, attempt, config.max_retries),
            Err(e) => warn!("Status poll {}/{} for {} failed: {}", attempt, config.max_retries, hash, e),
        }

        if attempt < config.max_retries {
            tokio::time::sleep(config.interval).await;
        }
    }

    Err(ContractError::Timeout {
        hash: hash.to_string(),
        attempts: config.max_retries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use onchain_proof_gateway::{AccountInfo, VmQuery, VmQueryResult};
    use onchain_proof_types::{Address, GatewayError, Transaction, TransactionHash};

    /// Replays a script of status responses, then reports `pending` forever
    struct ScriptedGateway {
        script: Mutex<VecDeque<Result<TransactionStatus, GatewayError>>>,
        polls: AtomicU32,
    }

    impl ScriptedGateway {
        fn new(script: Vec<Result<TransactionStatus, GatewayError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: AtomicU32::new(0),
            }
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Gateway for ScriptedGateway {
        async fn query_contract(&self, _query: &VmQuery) -> Result<VmQueryResult, GatewayError> {
            unimplemented!()
        }

        async fn send_transaction(&self, _tx: &Transaction) -> Result<TransactionHash, GatewayError> {
            unimplemented!()
        }

        async fn get_transaction_status(&self, _hash: &str) -> Result<TransactionStatus, GatewayError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(TransactionStatus::Pending))
        }

        async fn get_account(&self, _address: &Address) -> Result<AccountInfo, GatewayError> {
            unimplemented!()
        }
    }

    fn fast(max_retries: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            max_retries,
        }
    }

    #[tokio::test]
    async fn test_returns_on_first_success() {
        let gateway = ScriptedGateway::new(vec![Ok(TransactionStatus::Executed)]);

        let status = wait_for_transaction(&gateway, "h", &fast(10)).await.unwrap();
        assert_eq!(status, TransactionStatus::Executed);
        assert_eq!(gateway.polls(), 1);
    }

    #[tokio::test]
    async fn test_success_after_pending() {
        let gateway = ScriptedGateway::new(vec![
            Ok(TransactionStatus::Pending),
            Ok(TransactionStatus::Received),
            Err(GatewayError::Request("connection reset".to_string())),
            Ok(TransactionStatus::Success),
        ]);

        let status = wait_for_transaction(&gateway, "h", &fast(10)).await.unwrap();
        assert_eq!(status, TransactionStatus::Success);
        assert_eq!(gateway.polls(), 4);
    }

    #[tokio::test]
    async fn test_failure_is_immediate() {
        for terminal in [TransactionStatus::Failed, TransactionStatus::Invalid] {
            let gateway = ScriptedGateway::new(vec![Ok(terminal.clone())]);

            let err = wait_for_transaction(&gateway, "h", &fast(10)).await.unwrap_err();
            match err {
                ContractError::TransactionFailed { status, .. } => assert_eq!(status, terminal.to_string()),
                other => panic!("unexpected error: {}", other),
            }
            assert_eq!(gateway.polls(), 1);
        }
    }

    #[tokio::test]
    async fn test_proxy_fail_status_is_terminal() {
        let gateway = ScriptedGateway::new(vec![
            Ok(TransactionStatus::parse("pending")),
            Ok(TransactionStatus::parse("fail")),
        ]);

        let err = wait_for_transaction(&gateway, "h", &fast(10)).await.unwrap_err();
        assert!(matches!(err, ContractError::TransactionFailed { .. }));
        assert_eq!(gateway.polls(), 2);
    }

    #[tokio::test]
    async fn test_times_out_after_max_retries() {
        let gateway = ScriptedGateway::new(vec![]);

        let err = wait_for_transaction(&gateway, "h", &fast(3)).await.unwrap_err();
        assert!(matches!(err, ContractError::Timeout { attempts: 3, .. }));
        assert_eq!(gateway.polls(), 3);
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.with_max_retries(4).max_retries, 4);
    }
}
