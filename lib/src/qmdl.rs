//! Qualcomm Mobile Diagnostic Log (QMDL) files have a very simple format: just
//! a series of of concatenated HDLC encapsulated diag::Message structs.
//! QmdlReader reads them back as MessagesContainers, and read_b826_logs picks
//! the supported CA combos logs out of a capture.

use std::future;
use std::pin::pin;

use crate::diag::{DataType, HdlcEncapsulatedMessage, MESSAGE_TERMINATOR, MessagesContainer};
use crate::log_codes::LOG_NR5G_RRC_SUPPORTED_CA_COMBOS_C;

use futures::{TryStream, TryStreamExt};
use log::{debug, error};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

pub struct QmdlReader<T>
where
    T: AsyncRead,
{
    reader: BufReader<T>,
    bytes_read: usize,
    max_bytes: Option<usize>,
}

impl<T> QmdlReader<T>
where
    T: AsyncRead + Unpin,
{
    pub fn new(reader: T, max_bytes: Option<usize>) -> Self {
        QmdlReader {
            reader: BufReader::new(reader),
            bytes_read: 0,
            max_bytes,
        }
    }

    pub fn as_stream(
        &mut self,
    ) -> impl TryStream<Ok = MessagesContainer, Error = std::io::Error> + '_ {
        futures::stream::try_unfold(self, |reader| async {
            let maybe_container = reader.get_next_messages_container().await?;
            match maybe_container {
                Some(container) => Ok(Some((container, reader))),
                None => Ok(None),
            }
        })
    }

    pub async fn get_next_messages_container(
        &mut self,
    ) -> Result<Option<MessagesContainer>, std::io::Error> {
        if let Some(max_bytes) = self.max_bytes {
            if self.bytes_read >= max_bytes {
                if self.bytes_read > max_bytes {
                    error!(
                        "warning: {} bytes read, but max_bytes was {}",
                        self.bytes_read, max_bytes
                    );
                }
                return Ok(None);
            }
        }

        let mut buf = Vec::new();
        let bytes_read = self.reader.read_until(MESSAGE_TERMINATOR, &mut buf).await?;
        if bytes_read == 0 {
            return Ok(None);
        }
        self.bytes_read += bytes_read;

        // A QMDL file doesn't keep the container structure messages were
        // read in, so every message gets a container of its own.
        Ok(Some(MessagesContainer {
            data_type: DataType::UserSpace,
            num_messages: 1,
            messages: vec![HdlcEncapsulatedMessage {
                len: bytes_read as u32,
                data: buf,
            }],
        }))
    }
}

/// Returns the body of every 0xB826 log in a QMDL capture, in capture order.
/// Messages that fail to decapsulate or parse are skipped.
pub async fn read_b826_logs<T>(reader: T, max_bytes: Option<usize>) -> std::io::Result<Vec<Vec<u8>>>
where
    T: AsyncRead + Unpin,
{
    let mut qmdl_reader = QmdlReader::new(reader, max_bytes);
    let mut qmdl_stream = pin!(
        qmdl_reader
            .as_stream()
            .try_filter(|container| future::ready(container.data_type == DataType::UserSpace))
    );

    let mut logs = Vec::new();
    let mut skipped = 0;
    while let Some(container) = qmdl_stream.try_next().await? {
        for maybe_msg in container.into_messages() {
            let msg = match maybe_msg {
                Ok(msg) => msg,
                Err(err) => {
                    debug!("skipping message: {err}");
                    skipped += 1;
                    continue;
                }
            };
            if let Some((log_type, body)) = msg.as_log() {
                if u32::from(log_type) == LOG_NR5G_RRC_SUPPORTED_CA_COMBOS_C {
                    logs.push(body.to_vec());
                }
            }
        }
    }
    debug!("found {} 0xB826 logs, skipped {skipped} messages", logs.len());
    Ok(logs)
}
