//! Endpoint and view names of the proof contract

pub const CERTIFY_ACTION: &str = "certifyAction";
pub const UPDATE_PROOF: &str = "updateProof";
pub const GET_PROOF: &str = "getProof";
pub const GET_USER_PROOFS: &str = "getUserProofs";
pub const GET_USER_PROOF_IDS: &str = "getUserProofIds";
pub const GET_PROOF_OWNER: &str = "getProofOwner";
pub const GET_USER_PROOF_COUNT: &str = "getUserProofCount";
pub const GET_TOTAL_PROOFS: &str = "getTotalProofs";
pub const PROOF_EXISTS: &str = "proofExists";
