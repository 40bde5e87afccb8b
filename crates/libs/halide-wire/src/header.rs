//! Message header and its wire framing.
//!
//! Every message starts with a big-endian `u32` giving the length of the
//! MessagePack-encoded header, followed by the header itself and then
//! exactly `body_length` body bytes. The header carries routing ids and the
//! body length; body *content* encoding is the writer's concern.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// Upper bound for an encoded header, enforced on both sides of the wire.
pub const MAX_HEADER_LEN: usize = 64 * 1024;

/// Discriminates control headers from standard message headers.
///
/// Values `0x1f` and below are reserved for the framework itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HeaderKind {
    /// An ordinary application message.
    Standard = 0x00,
    /// Carries an update of the sender's node metadata.
    MetaDataUpdate = 0x01,
    /// Liveness probe for an idle endpoint connection.
    EndpointCheck = 0x02,
    /// Announces an orderly disconnect of the endpoint.
    Disconnect = 0x03,
    /// Carries a remote procedure call or its response.
    Rpc = 0x04,
    /// Reports that the peer failed to process a received message.
    ProcessingError = 0x05,
    /// Response sent when access to the node was denied.
    AccessDenied = 0x7f,
}

impl TryFrom<u8> for HeaderKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(Self::Standard),
            0x01 => Ok(Self::MetaDataUpdate),
            0x02 => Ok(Self::EndpointCheck),
            0x03 => Ok(Self::Disconnect),
            0x04 => Ok(Self::Rpc),
            0x05 => Ok(Self::ProcessingError),
            0x7f => Ok(Self::AccessDenied),
            other => Err(other),
        }
    }
}

/// Metadata record prefixed to every message body.
///
/// Headers are values: writers receive them read-only and frame an adjusted
/// copy (see [`with_body_length`](Self::with_body_length)) instead of
/// mutating the caller's instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Raw header kind; see [`kind_enum`](Self::kind_enum).
    pub kind: u8,
    /// Node id of the sender, stamped by the writer from the endpoint.
    pub sender_id: u64,
    /// Per-node unique id of this message.
    pub message_id: u64,
    /// Id of the message this one responds to, if any.
    pub response_to: Option<u64>,
    /// Application-defined message type used for receiver routing.
    pub message_type: i32,
    /// Exact number of body bytes following the header on the wire.
    pub body_length: u64,
    /// Optional human-readable description, for diagnostics only.
    pub description: Option<String>,
    /// Remaining time to live, if the dispatch layer set a deadline.
    pub time_to_live_ms: Option<u64>,
    /// `true` if no response is expected for this message.
    pub asynchronous: bool,
    /// Application-defined header fields, preserved verbatim on the wire.
    pub custom_fields: BTreeMap<String, rmpv::Value>,
}

impl MessageHeader {
    /// Creates a header of the given kind with empty routing state.
    pub fn new(kind: HeaderKind, message_type: i32) -> Self {
        Self {
            kind: kind as u8,
            sender_id: 0,
            message_id: 0,
            response_to: None,
            message_type,
            body_length: 0,
            description: None,
            time_to_live_ms: None,
            asynchronous: false,
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn kind_enum(&self) -> Result<HeaderKind, WireError> {
        HeaderKind::try_from(self.kind).map_err(|raw| WireError::HeaderDecode {
            reason: format!("unknown header kind 0x{raw:02x}"),
        })
    }

    /// Returns a copy with the body length set. Used by writers to frame
    /// the length they actually produced without touching the caller's
    /// header.
    pub fn with_body_length(&self, body_length: u64) -> Self {
        Self {
            body_length,
            ..self.clone()
        }
    }

    /// Returns a copy with the sender id set.
    pub fn with_sender_id(&self, sender_id: u64) -> Self {
        Self {
            sender_id,
            ..self.clone()
        }
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, WireError> {
        let mut out = Vec::new();
        let mut serializer = rmp_serde::Serializer::new(&mut out).with_struct_map();
        self.serialize(&mut serializer)
            .map_err(|e| WireError::Encode {
                reason: e.to_string(),
            })?;
        Ok(out)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(|e| WireError::HeaderDecode {
            reason: e.to_string(),
        })
    }

    /// Encodes the header with its `u32` big-endian length prefix.
    pub fn encode_framed(&self) -> Result<Vec<u8>, WireError> {
        let encoded = self.to_msgpack()?;
        if encoded.len() > MAX_HEADER_LEN {
            return Err(WireError::HeaderTooLarge {
                len: encoded.len(),
                max: MAX_HEADER_LEN,
            });
        }
        let mut framed = Vec::with_capacity(4 + encoded.len());
        framed.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
        framed.extend_from_slice(&encoded);
        Ok(framed)
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "message {} (kind 0x{:02x}, type {}, body {} bytes)",
            self.message_id, self.kind, self.message_type, self.body_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> MessageHeader {
        let mut header = MessageHeader::new(HeaderKind::Standard, 7);
        header.message_id = 42;
        header.response_to = Some(41);
        header.description = Some("sample".into());
        header
            .custom_fields
            .insert("route".into(), rmpv::Value::from("north"));
        header
    }

    #[test]
    fn msgpack_round_trip_preserves_all_fields() {
        let header = sample_header();
        let bytes = header.to_msgpack().expect("encode");
        let decoded = MessageHeader::from_msgpack(&bytes).expect("decode");
        assert_eq!(decoded, header);
    }

    #[test]
    fn framed_encoding_carries_exact_length_prefix() {
        let header = sample_header();
        let framed = header.encode_framed().expect("encode");
        let prefix = u32::from_be_bytes(framed[..4].try_into().expect("prefix"));
        assert_eq!(prefix as usize, framed.len() - 4);
        let decoded = MessageHeader::from_msgpack(&framed[4..]).expect("decode");
        assert_eq!(decoded, header);
    }

    #[test]
    fn oversized_header_is_rejected_on_encode() {
        let mut header = sample_header();
        header.custom_fields.insert(
            "blob".into(),
            rmpv::Value::from(vec![0u8; MAX_HEADER_LEN + 1]),
        );
        let err = header.encode_framed().expect_err("must reject");
        assert!(matches!(
            err,
            WireError::HeaderTooLarge { len, max } if len > MAX_HEADER_LEN && max == MAX_HEADER_LEN
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut header = sample_header();
        header.kind = 0x6e;
        assert!(header.kind_enum().is_err());
    }

    #[test]
    fn with_body_length_leaves_original_untouched() {
        let header = sample_header();
        let framed = header.with_body_length(128);
        assert_eq!(framed.body_length, 128);
        assert_eq!(header.body_length, 0);
        assert_eq!(framed.message_id, header.message_id);
    }
}
