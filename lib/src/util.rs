//! Helpers for reading logs exported as text.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexError {
    #[error("Invalid hex dump: {0}")]
    Decode(#[from] hex::FromHexError),
}

/// Decodes a hex dump as exported by QXDM and similar tools. Bytes may be
/// separated by whitespace, commas or colons, and may carry `0x` prefixes.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, HexError> {
    let digits: String = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();
    Ok(hex::decode(digits)?)
}
