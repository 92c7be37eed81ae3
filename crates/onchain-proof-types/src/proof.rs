use multiversx_sc_codec as codec;
use serde::{Deserialize, Serialize};

/// Maximum proof text length accepted by the contract, in characters
pub const MAX_PROOF_TEXT_LEN: usize = 500;

/// A proof (certificate or badge) as stored by the contract
///
/// The client never mutates a record directly; it only requests
/// mutations through contract calls. Field order is the contract's
/// `ProofData` layout.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    codec::derive::TopEncode,
    codec::derive::TopDecode,
    codec::derive::NestedEncode,
    codec::derive::NestedDecode,
)]
pub struct ProofRecord {
    /// Attestation text
    pub proof_text: String,
    /// Unique identifier, immutable once created
    pub proof_id: String,
    /// Creation time in seconds, set by the contract
    pub timestamp: u64,
    /// Opaque metadata, typically JSON
    pub metadata: String,
}

impl ProofRecord {
    pub fn new(
        proof_text: impl Into<String>,
        proof_id: impl Into<String>,
        timestamp: u64,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            proof_text: proof_text.into(),
            proof_id: proof_id.into(),
            timestamp,
            metadata: metadata.into(),
        }
    }

    /// Parse the metadata as JSON, if it is JSON
    pub fn metadata_json(&self) -> Option<serde_json::Value> {
        if self.metadata.is_empty() {
            return None;
        }
        serde_json::from_str(&self.metadata).ok()
    }

    /// Creation time as a UTC datetime
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.timestamp as i64, 0)
    }
}

/// Check the proof text length rule enforced by the contract
pub fn is_valid_proof_text(text: &str) -> bool {
    let len = text.chars().count();
    (1..=MAX_PROOF_TEXT_LEN).contains(&len)
}
