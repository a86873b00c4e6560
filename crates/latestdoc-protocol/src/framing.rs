//! Frame layout: a big-endian `u32` byte count followed by that many bytes of
//! JSON. Zero-length and oversized frames are rejected in both directions.

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

const PREFIX_LEN: usize = 4;

pub(crate) fn check_frame_len(len: usize) -> ProtocolResult<()> {
    match len {
        0 => Err(ProtocolError::EmptyMessage),
        n if n > MAX_MESSAGE_SIZE as usize => Err(ProtocolError::MessageTooLarge {
            size: u32::try_from(n).unwrap_or(u32::MAX),
            max: MAX_MESSAGE_SIZE,
        }),
        _ => Ok(()),
    }
}

/// Serializes `message` into a complete frame.
pub fn encode_message<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let json = serde_json::to_vec(message)?;
    check_frame_len(json.len())?;

    // check_frame_len bounds the length to MAX_MESSAGE_SIZE, so it fits a u32.
    let prefix = (json.len() as u32).to_be_bytes();
    Ok([prefix.as_slice(), json.as_slice()].concat())
}

/// Parses one frame from the start of `data`. Trailing bytes are ignored.
pub fn decode_message<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<T> {
    let Some((prefix, rest)) = data.split_first_chunk::<PREFIX_LEN>() else {
        return Err(ProtocolError::IncompleteMessage {
            expected: PREFIX_LEN,
            received: data.len(),
        });
    };

    let len = u32::from_be_bytes(*prefix) as usize;
    check_frame_len(len)?;

    let payload = rest
        .get(..len)
        .ok_or(ProtocolError::IncompleteMessage {
            expected: PREFIX_LEN + len,
            received: data.len(),
        })?;
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Envelope, Request};

    #[test]
    fn prefix_counts_payload_bytes() {
        let envelope = Envelope::request("req-123", Request::ListTools);
        let frame = encode_message(&envelope).unwrap();

        let (prefix, payload) = frame.split_at(PREFIX_LEN);
        assert_eq!(u32::from_be_bytes(prefix.try_into().unwrap()) as usize, payload.len());
        assert!(payload.starts_with(b"{"));

        let decoded: Envelope<Request> = decode_message(&frame).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let envelope = Envelope::request("a", Request::Ping);
        let mut data = encode_message(&envelope).unwrap();
        data.extend(encode_message(&Envelope::request("b", Request::Shutdown)).unwrap());

        let first: Envelope<Request> = decode_message(&data).unwrap();
        assert_eq!(first.request_id, "a");
    }

    #[test]
    fn short_prefix_is_incomplete() {
        let result: ProtocolResult<Envelope<Request>> = decode_message(&[0, 0]);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 4, received: 2 })
        ));
    }

    #[test]
    fn short_payload_is_incomplete() {
        let mut data = 100u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[b' '; 10]);

        let result: ProtocolResult<Envelope<Request>> = decode_message(&data);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 104, received: 14 })
        ));
    }

    #[test]
    fn length_limits() {
        assert!(matches!(check_frame_len(0), Err(ProtocolError::EmptyMessage)));
        assert!(check_frame_len(MAX_MESSAGE_SIZE as usize).is_ok());
        assert!(matches!(
            check_frame_len(MAX_MESSAGE_SIZE as usize + 1),
            Err(ProtocolError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let mut data = 3u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"{{{");

        let result: ProtocolResult<Envelope<Request>> = decode_message(&data);
        assert!(matches!(result, Err(ProtocolError::Serialization(_))));
    }
}
