//! Diag protocol deserialization, as far as it's needed to pull log items out
//! of a capture.

use crc::{Algorithm, Crc};
use deku::prelude::*;

use crate::hdlc::{self, hdlc_decapsulate};
use log::warn;
use thiserror::Error;

pub const MESSAGE_TERMINATOR: u8 = 0x7e;
pub const MESSAGE_ESCAPE_CHAR: u8 = 0x7d;

pub const ESCAPED_MESSAGE_TERMINATOR: u8 = 0x5e;
pub const ESCAPED_MESSAGE_ESCAPE_CHAR: u8 = 0x5d;

/// Size of a log item's own header: length, log code and timestamp.
pub const LOG_HEADER_LEN: u16 = 12;

#[derive(Debug, Clone, PartialEq, DekuRead, DekuWrite)]
#[deku(id_type = "u32", endian = "little")]
pub enum DataType {
    #[deku(id = "32")]
    UserSpace,
    #[deku(id_pat = "_")]
    Other(u32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagParsingError {
    #[error("Failed to parse Message: {0}, data: {1:?}")]
    MessageParsingError(deku::DekuError, Vec<u8>),
    #[error("HDLC decapsulation of message failed: {0}, data: {1:?}")]
    HdlcDecapsulationError(hdlc::HdlcError, Vec<u8>),
}

// this is sorta based on the params qcsuper uses, plus what seems to be used in
// https://github.com/fgsect/scat/blob/f1538b397721df3ab8ba12acd26716abcf21f78b/util.py#L47
pub const CRC_CCITT_ALG: Algorithm<u16> = Algorithm {
    poly: 0x1021,
    init: 0xffff,
    refin: true,
    refout: true,
    width: 16,
    xorout: 0xffff,
    check: 0x2189,
    residue: 0x0000,
};

pub const CRC_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_CCITT_ALG);

#[derive(Debug, Clone, PartialEq, DekuRead, DekuWrite)]
pub struct MessagesContainer {
    pub data_type: DataType,
    pub num_messages: u32,
    #[deku(count = "num_messages")]
    pub messages: Vec<HdlcEncapsulatedMessage>,
}

impl MessagesContainer {
    pub fn into_messages(self) -> Vec<Result<Message, DiagParsingError>> {
        let mut result = Vec::new();
        for msg in self.messages {
            for sub_msg in msg.data.split_inclusive(|&b| b == MESSAGE_TERMINATOR) {
                match hdlc_decapsulate(sub_msg, &CRC_CCITT) {
                    Ok(data) => match Message::from_bytes((&data, 0)) {
                        Ok(((leftover_bytes, _), res)) => {
                            if !leftover_bytes.is_empty() {
                                warn!(
                                    "warning: {} leftover bytes when parsing Message",
                                    leftover_bytes.len()
                                );
                            }
                            result.push(Ok(res));
                        }
                        Err(e) => result.push(Err(DiagParsingError::MessageParsingError(e, data))),
                    },
                    Err(err) => result.push(Err(DiagParsingError::HdlcDecapsulationError(
                        err,
                        sub_msg.to_vec(),
                    ))),
                }
            }
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, DekuRead, DekuWrite)]
pub struct HdlcEncapsulatedMessage {
    pub len: u32,
    #[deku(count = "len")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, DekuRead, DekuWrite)]
#[deku(id_type = "u8", endian = "little")]
pub enum Message {
    #[deku(id = "16")]
    Log {
        pending_msgs: u8,
        outer_length: u16,
        inner_length: u16,
        log_type: u16,
        timestamp: Timestamp,
        // inner_length counts its own header
        #[deku(count = "inner_length.saturating_sub(LOG_HEADER_LEN)")]
        body: Vec<u8>,
    },

    // responses, events and everything else we don't look at
    #[deku(id_pat = "_")]
    Other {
        command_code: u8, // the "id" (from deku's POV) gets parsed into this field
        #[deku(read_all)]
        payload: Vec<u8>,
    },
}

impl Message {
    /// The log code and body, if this is a log item.
    pub fn as_log(&self) -> Option<(u16, &[u8])> {
        match self {
            Message::Log { log_type, body, .. } => Some((*log_type, body)),
            Message::Other { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(
    endian = "endian",
    ctx = "endian: deku::ctx::Endian",
    ctx_default = "deku::ctx::Endian::Little"
)]
pub struct Timestamp {
    pub ts: u64,
}

#[cfg(test)]
mod test {
    use super::*;

    // 0xB826 v2 log item with a single LTE combo
    fn b826_body() -> Vec<u8> {
        vec![
            0x02, 0x00, 0x00, 0x00, // version
            0x01, 0x00, // numCombos
            0x01, // numComponents
            0x03, 0x00, 0x02, 0x03, 0x02, 0x01, 0x02, 0x00, 0x00, 0x00,
        ]
    }

    fn get_test_message(body: &[u8]) -> (HdlcEncapsulatedMessage, Message) {
        let inner_length = LOG_HEADER_LEN + body.len() as u16;
        let message = Message::Log {
            pending_msgs: 0,
            outer_length: inner_length,
            inner_length,
            log_type: 0xb826,
            timestamp: Timestamp {
                ts: 72659535985485082,
            },
            body: body.to_vec(),
        };
        let serialized = message
            .to_bytes()
            .expect("failed to serialize test message");
        let encapsulated_data = hdlc::hdlc_encapsulate(&serialized, &CRC_CCITT);
        let encapsulated = HdlcEncapsulatedMessage {
            len: encapsulated_data.len() as u32,
            data: encapsulated_data,
        };
        (encapsulated, message)
    }

    fn make_container(data_type: DataType, message: HdlcEncapsulatedMessage) -> MessagesContainer {
        MessagesContainer {
            data_type,
            num_messages: 1,
            messages: vec![message],
        }
    }

    #[test]
    fn test_logs() {
        let mut data = vec![16, 0, 29, 0, 29, 0, 0x26, 0xb8];
        data.extend(72659535985485082u64.to_le_bytes());
        data.extend(b826_body());
        let msg = Message::from_bytes((&data, 0)).unwrap().1;
        assert_eq!(
            msg,
            Message::Log {
                pending_msgs: 0,
                outer_length: 29,
                inner_length: 29,
                log_type: 0xb826,
                timestamp: Timestamp {
                    ts: 72659535985485082
                },
                body: b826_body(),
            }
        );
        assert_eq!(msg.as_log(), Some((0xb826, b826_body().as_slice())));
    }

    #[test]
    fn test_non_log_messages() {
        let data = vec![0x73, 0x00, 0x00, 0x00, 0x01];
        let msg = Message::from_bytes((&data, 0)).unwrap().1;
        assert_eq!(
            msg,
            Message::Other {
                command_code: 0x73,
                payload: vec![0x00, 0x00, 0x00, 0x01],
            }
        );
        assert_eq!(msg.as_log(), None);
    }

    #[test]
    fn test_containers_with_multiple_messages() {
        let (encapsulated1, message1) = get_test_message(&[1]);
        let (encapsulated2, message2) = get_test_message(&[2]);
        let mut container = make_container(DataType::UserSpace, encapsulated1);
        container.messages.push(encapsulated2);
        container.num_messages += 1;
        assert_eq!(container.into_messages(), vec![Ok(message1), Ok(message2)]);
    }

    #[test]
    fn test_containers_with_concatenated_message() {
        let (mut encapsulated1, message1) = get_test_message(&b826_body());
        let (encapsulated2, message2) = get_test_message(&[2]);
        encapsulated1.data.extend(encapsulated2.data);
        encapsulated1.len += encapsulated2.len;
        let container = make_container(DataType::UserSpace, encapsulated1);
        assert_eq!(container.into_messages(), vec![Ok(message1), Ok(message2)]);
    }

    #[test]
    fn test_handles_parsing_errors() {
        let (encapsulated1, message1) = get_test_message(&[1]);
        // a log header that ends after the outer length
        let bad_message = hdlc::hdlc_encapsulate(&[16, 0, 26], &CRC_CCITT);
        let encapsulated2 = HdlcEncapsulatedMessage {
            len: bad_message.len() as u32,
            data: bad_message,
        };
        let mut container = make_container(DataType::UserSpace, encapsulated1);
        container.messages.push(encapsulated2);
        container.num_messages += 1;
        let result = container.into_messages();
        assert_eq!(result[0], Ok(message1));
        assert!(matches!(
            result[1],
            Err(DiagParsingError::MessageParsingError(_, _))
        ));
    }

    #[test]
    fn test_handles_encapsulation_errors() {
        let (encapsulated1, message1) = get_test_message(&[1]);
        let bad_encapsulation = HdlcEncapsulatedMessage {
            len: 4,
            data: vec![0x01, 0x02, 0x03, 0x04],
        };
        let mut container = make_container(DataType::UserSpace, encapsulated1);
        container.messages.push(bad_encapsulation);
        container.num_messages += 1;
        let result = container.into_messages();
        assert_eq!(result[0], Ok(message1));
        assert!(matches!(
            result[1],
            Err(DiagParsingError::HdlcDecapsulationError(_, _))
        ));
    }

    #[test]
    fn test_inner_length_underflow() {
        // inner_length smaller than the log header
        let mut data = vec![16, 0, 4, 0, 4, 0, 0x26, 0xb8];
        data.extend([0; 8]);
        let msg = Message::from_bytes((&data, 0)).unwrap().1;
        assert_eq!(msg.as_log(), Some((0xb826, &[][..])));
    }
}
