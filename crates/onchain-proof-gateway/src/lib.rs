//! Network gateways for the on-chain proof client
//!
//! This crate provides the `Gateway` trait and its implementations.
//!
//! ## Available Implementations
//!
//! - `HttpGateway`: REST proxy of a deployment environment
//! - `LocalLedger`: in-process ledger running the proof contract, for tests
//!   and offline use

pub mod gateway;
pub mod http;
pub mod local_ledger;

pub use gateway::{AccountInfo, Gateway, VmQuery, VmQueryResult};
pub use http::{HttpGateway, HttpGatewayConfig};
pub use local_ledger::{LocalLedger, DEFAULT_ACCOUNT_BALANCE, ROUND_DURATION_SECS};
