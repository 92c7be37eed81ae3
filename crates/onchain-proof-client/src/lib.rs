pub mod contract;
pub mod polling;

pub use contract::{ContractConfig, ProofContractClient, CREATE_PROOF_GAS_LIMIT, UPDATE_PROOF_GAS_LIMIT};
pub use polling::{wait_for_transaction, PollConfig, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL};
