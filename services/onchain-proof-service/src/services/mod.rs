//! Service layer over the wallet session manager and the contract client

pub mod factory;
pub mod proof_service;

pub use factory::{ServiceContainer, ServiceFactory, ServiceOptions, LOCAL_DEMO_PASSPHRASE};
pub use proof_service::{Dashboard, ProofService};
