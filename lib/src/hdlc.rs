//! HDLC stands for "High-level Data Link Control", which the diag protocol uses
//! to encapsulate its messages. QCSuper's docs describe this in more detail
//! here:
//! <https://github.com/P1sec/QCSuper/blob/master/docs/The%20Diag%20protocol.md#the-diag-protocol-over-usb>

use bytes::Buf;
use crc::Crc;
use thiserror::Error;

use crate::diag::{
    ESCAPED_MESSAGE_ESCAPE_CHAR, ESCAPED_MESSAGE_TERMINATOR, MESSAGE_ESCAPE_CHAR,
    MESSAGE_TERMINATOR,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HdlcError {
    #[error("Invalid checksum (expected {0}, got {1})")]
    InvalidChecksum(u16, u16),
    #[error("Invalid HDLC escape sequence: [0x7d, {0}]")]
    InvalidEscapeSequence(u8),
    #[error("No trailing character found (expected 0x7e, got {0}))")]
    NoTrailingCharacter(u8),
    #[error("Missing checksum")]
    MissingChecksum,
    #[error("Data too short to be HDLC encapsulated")]
    TooShort,
}

#[cfg(test)]
fn push_escaped(result: &mut Vec<u8>, b: u8) {
    match b {
        MESSAGE_TERMINATOR => result.extend([MESSAGE_ESCAPE_CHAR, ESCAPED_MESSAGE_TERMINATOR]),
        MESSAGE_ESCAPE_CHAR => result.extend([MESSAGE_ESCAPE_CHAR, ESCAPED_MESSAGE_ESCAPE_CHAR]),
        _ => result.push(b),
    }
}

/// Escapes `data`, appends its little endian CRC and the terminator. Builds
/// test captures.
#[cfg(test)]
pub fn hdlc_encapsulate(data: &[u8], crc: &Crc<u16>) -> Vec<u8> {
    let mut result: Vec<u8> = Vec::with_capacity(data.len() + 3);
    for &b in data.iter().chain(crc.checksum(data).to_le_bytes().iter()) {
        push_escaped(&mut result, b);
    }
    result.push(MESSAGE_TERMINATOR);
    result
}

pub fn hdlc_decapsulate(data: &[u8], crc: &Crc<u16>) -> Result<Vec<u8>, HdlcError> {
    if data.len() < 3 {
        return Err(HdlcError::TooShort);
    }

    if data[data.len() - 1] != MESSAGE_TERMINATOR {
        return Err(HdlcError::NoTrailingCharacter(data[data.len() - 1]));
    }

    let mut unescaped = Vec::with_capacity(data.len());
    let mut escaping = false;
    for &b in &data[..data.len() - 1] {
        if escaping {
            match b {
                ESCAPED_MESSAGE_TERMINATOR => unescaped.push(MESSAGE_TERMINATOR),
                ESCAPED_MESSAGE_ESCAPE_CHAR => unescaped.push(MESSAGE_ESCAPE_CHAR),
                _ => return Err(HdlcError::InvalidEscapeSequence(b)),
            }
            escaping = false;
        } else if b == MESSAGE_ESCAPE_CHAR {
            escaping = true
        } else {
            unescaped.push(b);
        }
    }

    // pop off the u16 checksum, check it against what we calculated
    let checksum_hi = unescaped.pop().ok_or(HdlcError::MissingChecksum)?;
    let checksum_lo = unescaped.pop().ok_or(HdlcError::MissingChecksum)?;
    let checksum = [checksum_lo, checksum_hi].as_slice().get_u16_le();
    if checksum != crc.checksum(&unescaped) {
        return Err(HdlcError::InvalidChecksum(
            checksum,
            crc.checksum(&unescaped),
        ));
    }

    Ok(unescaped)
}
