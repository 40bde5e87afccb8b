use std::io;

/// Errors surfaced by wire framing and message writers.
///
/// Every variant is terminal for the message attempt: once `write_message`
/// fails, the number of bytes already on the sink is unknown and the owning
/// connection must be torn down rather than written to again.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WireError {
    #[error("i/o failure on {endpoint}: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode message body: {reason}")]
    Encode { reason: String },

    #[error("failed to decode message header: {reason}")]
    HeaderDecode { reason: String },

    #[error("message header of {len} bytes exceeds the {max} byte limit")]
    HeaderTooLarge { len: usize, max: usize },

    #[error("declared body of {len} bytes exceeds the {max} byte limit")]
    BodyTooLarge { len: u64, max: u64 },

    #[error("stream body ended after {written} of {expected} bytes")]
    TruncatedBody { expected: u64, written: u64 },
}

impl WireError {
    /// Convenience constructor for `Io`, tagging the failure with the
    /// endpoint's diagnostic identity.
    pub fn io(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Returns `true` if the failure came from the underlying byte channel
    /// rather than from encoding or decoding.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if the connection that produced this error must be
    /// discarded. Always holds: partial bytes may already be on the wire,
    /// so the peer can no longer trust the channel's framing.
    pub fn taints_connection(&self) -> bool {
        true
    }
}
