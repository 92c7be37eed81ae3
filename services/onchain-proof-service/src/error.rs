use thiserror::Error;

use onchain_proof_types::{CodecError, ContractError, GatewayError, WalletError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
