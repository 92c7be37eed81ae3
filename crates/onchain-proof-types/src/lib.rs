pub mod address;
pub mod codec;
pub mod endpoints;
pub mod error;
pub mod network;
pub mod proof;
pub mod session;
pub mod transaction;

// Re-export the main types for convenience
pub use address::{Address, ADDRESS_HRP};
pub use codec::{top_decode, top_encode};
pub use error::{CodecError, ContractError, GatewayError, WalletError};
pub use network::Network;
pub use proof::{is_valid_proof_text, ProofRecord, MAX_PROOF_TEXT_LEN};

// Re-export session types
pub use session::{
    PersistedWalletState,
    ProviderId,
    WalletSession,
    SESSION_MAX_AGE_HOURS,
};

// Re-export transaction types
pub use transaction::{
    ContractCallBuilder,
    Transaction,
    TransactionExt,
    TransactionHash,
    TransactionOutcome,
    TransactionState,
    TransactionStatus,
    DEFAULT_GAS_PRICE,
    SUCCESS_DISPLAY_WINDOW,
    TRANSACTION_VERSION,
};

// Re-export codec helpers
pub use codec::{decode_call_data, encode_call_data};
