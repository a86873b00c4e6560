//! Async framed I/O with per-operation timeouts.
//!
//! Shared by the server connection loop and the `latestdoc call` client.

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::framing::{check_frame_len, encode_message};

/// Reads one framed message.
///
/// Returns `Ok(None)` if the peer closed the stream before sending a length
/// prefix.
pub async fn read_frame<R, T>(reader: &mut R, timeout: Duration) -> ProtocolResult<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    match tokio::time::timeout(timeout, reader.read_exact(&mut len_buf)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(ProtocolError::timeout("read frame length")),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    check_frame_len(len)?;

    let mut payload = vec![0u8; len];
    match tokio::time::timeout(timeout, reader.read_exact(&mut payload)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::IncompleteMessage {
                expected: len,
                received: 0,
            });
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(ProtocolError::timeout("read frame payload")),
    }

    Ok(Some(serde_json::from_slice(&payload)?))
}

/// Writes one framed message and flushes the stream.
pub async fn write_frame<W, T>(writer: &mut W, message: &T, timeout: Duration) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let buffer = encode_message(message)?;

    let write = async {
        writer.write_all(&buffer).await?;
        writer.flush().await
    };

    match tokio::time::timeout(timeout, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ProtocolError::timeout("write frame")),
    }
}
