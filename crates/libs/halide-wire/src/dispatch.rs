//! Body-keyed writer selection, used by the dispatch layer above this crate.

use std::io::Read;

use crate::writer::{BytesMessageWriter, MessageWriter, MsgpackMessageWriter, StreamMessageWriter};

/// The body representations the dispatch layer can hand to the wire.
pub enum BodyPayload {
    /// A structured value, serialized as MessagePack by the writer.
    Msgpack(rmpv::Value),
    /// An already-encoded body, passed through verbatim.
    Bytes(Vec<u8>),
    /// A large body copied from a reader; `body_length` bytes must be
    /// available.
    Stream {
        source: Box<dyn Read>,
        body_length: u64,
    },
}

/// Selects the writer variant matching the payload's representation.
pub fn writer_for_payload(payload: BodyPayload) -> Box<dyn MessageWriter> {
    match payload {
        BodyPayload::Msgpack(value) => Box::new(MsgpackMessageWriter::new(value)),
        BodyPayload::Bytes(body) => Box::new(BytesMessageWriter::new(body)),
        BodyPayload::Stream {
            source,
            body_length,
        } => Box::new(StreamMessageWriter::new(source, body_length)),
    }
}
