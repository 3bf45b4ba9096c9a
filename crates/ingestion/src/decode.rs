//! ERC-20 `Transfer` log decoding.

use alloy::primitives::{b256, Address, B256, U256};
use alloy_rpc_types::Log;

use crate::chain::DecodedLog;

/// `keccak256("Transfer(address,address,uint256)")`.
pub const TRANSFER_EVENT_SIGNATURE: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Reason a log could not be read as a `Transfer` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("topic0 {0:?} is not the Transfer event signature")]
    UnexpectedSignature(Option<B256>),
    #[error("expected 3 topics, found {0}")]
    MissingTopics(usize),
    #[error("expected a 32 byte value, found {0} bytes")]
    InvalidValue(usize),
    #[error("log has no block number")]
    MissingBlockNumber,
}

/// Decode `Transfer(address indexed from, address indexed to, uint256 value)`.
///
/// The indexed addresses are left-padded 32 byte topics; the value is the
/// big-endian log data.
pub fn decode_transfer_log(log: &Log) -> Result<DecodedLog, DecodeError> {
    let topics = log.inner.data.topics();
    let signature = topics.first().copied();
    if signature != Some(TRANSFER_EVENT_SIGNATURE) {
        return Err(DecodeError::UnexpectedSignature(signature));
    }
    if topics.len() != 3 {
        return Err(DecodeError::MissingTopics(topics.len()));
    }

    let data = &log.inner.data.data;
    if data.len() != 32 {
        return Err(DecodeError::InvalidValue(data.len()));
    }

    let block_number = log.block_number.ok_or(DecodeError::MissingBlockNumber)?;

    Ok(DecodedLog {
        from: Address::from_word(topics[1]),
        to: Address::from_word(topics[2]),
        value: U256::from_be_slice(data),
        block_number,
        transaction_hash: log.transaction_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;
    use serde_json::json;

    const TOKEN: &str = "0x4300000000000000000000000000000000000003";
    const FROM_TOPIC: &str = "0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045";
    const TO_TOPIC: &str = "0x000000000000000000000000ab5801a7d398351b8be11c439e05c5b3259aec9b";
    const TX_HASH: &str = "0x6c0d2c1e5e9e2b7c61c6c8f9a7a0cd8b2c6b5fa5f3ad1bf1a0b6f4d8d2f1e0aa";
    // 2^70, beyond u64
    const VALUE: &str = "0x0000000000000000000000000000000000000000000000400000000000000000";

    fn rpc_log(topics: Vec<&str>, data: &str, tx_hash: Option<&str>) -> Log {
        serde_json::from_value(json!({
            "address": TOKEN,
            "topics": topics,
            "data": data,
            "blockNumber": "0x3e8",
            "blockHash": "0x8f1b7f0a6c0c6e1de57d2f5f3b0b7c3d9c41d2c4a5e6f708192a3b4c5d6e7f80",
            "transactionHash": tx_hash,
            "transactionIndex": "0x1",
            "logIndex": "0x2",
            "removed": false
        }))
        .unwrap()
    }

    fn signature() -> String {
        TRANSFER_EVENT_SIGNATURE.to_string()
    }

    #[test]
    fn test_signature_matches_event_abi() {
        assert_eq!(keccak256("Transfer(address,address,uint256)"), TRANSFER_EVENT_SIGNATURE);
    }

    #[test]
    fn test_decodes_transfer() {
        let sig = signature();
        let log = rpc_log(vec![sig.as_str(), FROM_TOPIC, TO_TOPIC], VALUE, Some(TX_HASH));
        let decoded = decode_transfer_log(&log).unwrap();

        assert_eq!(
            decoded.from.to_string().to_lowercase(),
            "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
        );
        assert_eq!(
            decoded.to.to_string().to_lowercase(),
            "0xab5801a7d398351b8be11c439e05c5b3259aec9b"
        );
        assert_eq!(decoded.value.to_string(), "1180591620717411303424");
        assert_eq!(decoded.block_number, 1000);
        assert_eq!(decoded.transaction_hash.map(|h| h.to_string()), Some(TX_HASH.to_string()));
    }

    #[test]
    fn test_missing_transaction_hash_still_decodes() {
        let sig = signature();
        let log = rpc_log(vec![sig.as_str(), FROM_TOPIC, TO_TOPIC], VALUE, None);
        assert_eq!(decode_transfer_log(&log).unwrap().transaction_hash, None);
    }

    #[test]
    fn test_rejects_other_events() {
        let approval = keccak256("Approval(address,address,uint256)").to_string();
        let log = rpc_log(vec![approval.as_str(), FROM_TOPIC, TO_TOPIC], VALUE, Some(TX_HASH));
        assert!(matches!(
            decode_transfer_log(&log),
            Err(DecodeError::UnexpectedSignature(Some(_)))
        ));
    }

    #[test]
    fn test_rejects_non_indexed_layout() {
        // ERC-721 style Transfer carries the token id as a fourth topic.
        let sig = signature();
        let log = rpc_log(vec![sig.as_str(), FROM_TOPIC, TO_TOPIC, VALUE], "0x", Some(TX_HASH));
        assert_eq!(decode_transfer_log(&log), Err(DecodeError::MissingTopics(4)));
    }

    #[test]
    fn test_rejects_short_value() {
        let sig = signature();
        let log = rpc_log(vec![sig.as_str(), FROM_TOPIC, TO_TOPIC], "0x01", Some(TX_HASH));
        assert_eq!(decode_transfer_log(&log), Err(DecodeError::InvalidValue(1)));
    }
}
