//! HTTP gateway (proxy) client
//!
//! Talks to the REST proxy of a deployment environment. Every response is
//! wrapped in a `{data, error, code}` envelope. Requests are issued once;
//! the only retry loop in the client is the transaction status poll.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use onchain_proof_types::codec::decode_base64;
use onchain_proof_types::{Address, GatewayError, Network, Transaction, TransactionHash, TransactionStatus};

use crate::gateway::{AccountInfo, Gateway, VmQuery, VmQueryResult};

/// Configuration for the HTTP gateway client.
#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    /// Base URL of the proxy, without a trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: Network::Devnet.default_gateway_url().to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Gateway backed by the network's HTTP proxy.
pub struct HttpGateway {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            config: HttpGatewayConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http_client,
        })
    }

    /// Client for a specific URL with default settings.
    pub fn with_url(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        Self::new(HttpGatewayConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HTTP HELPERS
    // ═══════════════════════════════════════════════════════════════════════════

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Self::read_envelope(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Self::read_envelope(response).await
    }

    async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !status.is_success() {
            // The proxy reports most failures inside the envelope
            if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
                if !envelope.error.is_empty() {
                    return Err(GatewayError::Rejected(envelope.error));
                }
            }
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_envelope(&body)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: String,
    #[serde(default)]
    #[allow(dead_code)]
    code: String,
}

#[derive(Deserialize)]
struct QueryData {
    data: QueryPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPayload {
    #[serde(default)]
    return_data: Option<Vec<Option<String>>>,
    #[serde(default)]
    return_code: String,
    #[serde(default)]
    return_message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendData {
    tx_hash: String,
}

#[derive(Deserialize)]
struct StatusData {
    status: String,
}

#[derive(Deserialize)]
struct AccountData {
    account: AccountPayload,
}

#[derive(Deserialize)]
struct AccountPayload {
    address: Address,
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    balance: String,
}

/// Unwrap a `{data, error, code}` envelope.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| GatewayError::invalid_response(e.to_string()))?;

    if !envelope.error.is_empty() {
        return Err(GatewayError::Rejected(envelope.error));
    }

    envelope
        .data
        .ok_or_else(|| GatewayError::invalid_response("Response has no data"))
}

fn into_query_result(payload: QueryPayload) -> Result<VmQueryResult, GatewayError> {
    let return_data = payload
        .return_data
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            Some(encoded) => decode_base64(&encoded),
            None => Ok(Vec::new()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VmQueryResult {
        return_data,
        return_code: payload.return_code,
        return_message: payload.return_message,
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn query_contract(&self, query: &VmQuery) -> Result<VmQueryResult, GatewayError> {
        let data: QueryData = self.post("/vm-values/query", query).await?;
        let result = into_query_result(data.data)?;

        if !result.is_ok() {
            return Err(GatewayError::Rejected(format!(
                "{}: {}",
                result.return_code, result.return_message
            )));
        }
        Ok(result)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<TransactionHash, GatewayError> {
        let data: SendData = self.post("/transaction/send", tx).await?;
        Ok(data.tx_hash)
    }

    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionStatus, GatewayError> {
        let data: StatusData = self.get(&format!("/transaction/{}/status", hash)).await?;
        Ok(TransactionStatus::parse(&data.status))
    }

    async fn get_account(&self, address: &Address) -> Result<AccountInfo, GatewayError> {
        let data: AccountData = self.get(&format!("/address/{}", address)).await?;
        Ok(AccountInfo {
            address: data.account.address,
            nonce: data.account.nonce,
            balance: data.account.balance,
        })
    }
}
