//! Peer-side decode of the wire framing produced by [`crate::writer`].

use std::io::Read;

use crate::endpoint::EndpointRef;
use crate::error::WireError;
use crate::header::{MessageHeader, MAX_HEADER_LEN};

/// Reads one length-prefixed header from `source`.
///
/// The length prefix is bounded by [`MAX_HEADER_LEN`] before any allocation
/// happens, so a corrupt or hostile prefix cannot trigger an oversized read.
pub fn read_header(
    endpoint: &EndpointRef,
    source: &mut dyn Read,
) -> Result<MessageHeader, WireError> {
    let mut prefix = [0u8; 4];
    source
        .read_exact(&mut prefix)
        .map_err(|e| WireError::io(endpoint.to_string(), e))?;
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_HEADER_LEN {
        return Err(WireError::HeaderTooLarge {
            len,
            max: MAX_HEADER_LEN,
        });
    }

    let mut encoded = vec![0u8; len];
    source
        .read_exact(&mut encoded)
        .map_err(|e| WireError::io(endpoint.to_string(), e))?;
    let header = MessageHeader::from_msgpack(&encoded)?;
    header.kind_enum()?;
    Ok(header)
}

/// Reads exactly `header.body_length` body bytes from `source`.
///
/// `max_body_len` bounds the declared length before any allocation happens,
/// mirroring the [`MAX_HEADER_LEN`] check on the header side. The limit is
/// the caller's policy: body sizes are an application concern, not a framing
/// one.
pub fn read_body(
    endpoint: &EndpointRef,
    source: &mut dyn Read,
    header: &MessageHeader,
    max_body_len: u64,
) -> Result<Vec<u8>, WireError> {
    if header.body_length > max_body_len {
        return Err(WireError::BodyTooLarge {
            len: header.body_length,
            max: max_body_len,
        });
    }
    let len = usize::try_from(header.body_length).map_err(|_| WireError::BodyTooLarge {
        len: header.body_length,
        max: max_body_len,
    })?;

    let mut body = vec![0u8; len];
    source
        .read_exact(&mut body)
        .map_err(|e| WireError::io(endpoint.to_string(), e))?;
    Ok(body)
}
