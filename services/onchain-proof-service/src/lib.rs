//! On-chain proof service library
//!
//! Configuration, error type and the service layer (dependency-injected
//! container plus `ProofService`) behind the `onchain-proof` command.

pub mod config;
pub mod error;
pub mod services;

// Re-export commonly used types
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use services::{Dashboard, ProofService, ServiceContainer, ServiceFactory, ServiceOptions};
