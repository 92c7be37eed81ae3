//! Contract argument and result codec
//!
//! Call data is `function@hex(arg)@hex(arg)...`. Results come back as a list
//! of raw buffers, each holding one top-encoded value. Value encoding is the
//! contract framework's own (`multiversx-sc-codec`); this module only adapts
//! its errors and the call-data string format.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use multiversx_sc_codec as codec;

use crate::error::CodecError;

pub use codec::{NestedDecode, NestedEncode, TopDecode, TopEncode};

//==============================================================================
// CALL DATA
//==============================================================================

/// Encode a contract call as `function@hex@hex...`
pub fn encode_call_data(function: &str, arguments: &[Vec<u8>]) -> Vec<u8> {
    let mut data = function.to_string();
    for arg in arguments {
        data.push('@');
        data.push_str(&hex::encode(arg));
    }
    data.into_bytes()
}

/// Split call data into the function name and its raw arguments
pub fn decode_call_data(data: &[u8]) -> Result<(String, Vec<Vec<u8>>), CodecError> {
    let text = std::str::from_utf8(data).map_err(|e| CodecError::InvalidUtf8(e.to_string()))?;
    let mut parts = text.split('@');

    let function = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CodecError::malformed("Missing function name"))?
        .to_string();

    let arguments = parts
        .map(|part| hex::decode(part).map_err(|e| CodecError::InvalidHex(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((function, arguments))
}

//==============================================================================
// VALUES
//==============================================================================

/// Top-encode one argument or return value
pub fn top_encode<T: TopEncode>(value: &T) -> Result<Vec<u8>, CodecError> {
    codec::top_encode_to_vec_u8(value)
        .map_err(|e| CodecError::malformed(String::from_utf8_lossy(e.message_bytes())))
}

/// Decode one top-encoded return value
pub fn top_decode<T: TopDecode>(bytes: &[u8]) -> Result<T, CodecError> {
    T::top_decode(bytes).map_err(|e| CodecError::malformed(String::from_utf8_lossy(e.message_bytes())))
}

/// Decode one base64 `returnData` entry
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ProofRecord;

    #[test]
    fn test_call_data_layout() {
        let data = encode_call_data("certifyAction", &[b"T".to_vec(), b"X".to_vec()]);
        assert_eq!(data, b"certifyAction@54@58".to_vec());

        let (function, args) = decode_call_data(&data).unwrap();
        assert_eq!(function, "certifyAction");
        assert_eq!(args, vec![b"T".to_vec(), b"X".to_vec()]);
    }

    #[test]
    fn test_call_data_empty_argument() {
        let data = encode_call_data("updateProof", &[b"id".to_vec(), Vec::new()]);
        assert_eq!(data, b"updateProof@6964@".to_vec());

        let (_, args) = decode_call_data(&data).unwrap();
        assert_eq!(args[1], Vec::<u8>::new());
    }

    #[test]
    fn test_call_data_rejects_bad_hex() {
        assert!(matches!(
            decode_call_data(b"certifyAction@zz"),
            Err(CodecError::InvalidHex(_))
        ));
        assert!(decode_call_data(b"@00").is_err());
    }

    #[test]
    fn test_numbers_are_minimal_big_endian() {
        assert_eq!(top_encode(&0u64).unwrap(), Vec::<u8>::new());
        assert_eq!(top_encode(&256u64).unwrap(), vec![1, 0]);
        assert_eq!(top_decode::<u64>(&[]).unwrap(), 0);
        assert_eq!(top_decode::<u64>(&[0x01, 0x00]).unwrap(), 256);
        assert!(top_decode::<u64>(&[1u8; 9]).is_err());
    }

    #[test]
    fn test_bool_values() {
        assert!(!top_decode::<bool>(&[]).unwrap());
        assert!(top_decode::<bool>(&top_encode(&true).unwrap()).unwrap());
        assert!(top_decode::<bool>(&[2]).is_err());
    }

    #[test]
    fn test_string_argument_is_raw_bytes() {
        assert_eq!(top_encode(&"hackathon_001".to_string()).unwrap(), b"hackathon_001".to_vec());
        assert!(top_decode::<String>(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_proof_record_layout() {
        let record = ProofRecord::new("T", "X", 0x0102, "{}");
        let encoded = top_encode(&record).unwrap();

        let expected: Vec<u8> = [
            &[0u8, 0, 0, 1][..], &b"T"[..],
            &[0, 0, 0, 1][..], &b"X"[..],
            &[0, 0, 0, 0, 0, 0, 1, 2][..],
            &[0, 0, 0, 2][..], &b"{}"[..],
        ]
        .concat();
        assert_eq!(encoded, expected);
        assert_eq!(top_decode::<ProofRecord>(&encoded).unwrap(), record);
    }

    #[test]
    fn test_proof_record_truncated() {
        let mut encoded = top_encode(&ProofRecord::new("text", "id", 7, "meta")).unwrap();
        encoded.truncate(encoded.len() - 2);

        assert!(matches!(
            top_decode::<ProofRecord>(&encoded),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_proof_record_trailing_bytes() {
        let mut encoded = top_encode(&ProofRecord::new("text", "id", 7, "")).unwrap();
        encoded.push(0);
        assert!(top_decode::<ProofRecord>(&encoded).is_err());
    }
}
