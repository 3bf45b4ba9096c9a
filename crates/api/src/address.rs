//! Address validation for query requests.

use alloy::primitives::Address;

use crate::error::ApiError;

/// Validate an Ethereum address and return its lowercase form.
///
/// Accepts `0x` followed by 40 hex digits. Input that is not entirely
/// lowercase must carry a valid EIP-55 checksum.
pub fn validate_address(input: &str) -> Result<String, ApiError> {
    let invalid = || ApiError::InvalidAddress(input.to_string());

    let hex = input.strip_prefix("0x").ok_or_else(invalid)?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let lowercase = input.to_lowercase();
    if input != lowercase && Address::parse_checksummed(input, None).is_err() {
        return Err(invalid());
    }

    Ok(lowercase)
}
