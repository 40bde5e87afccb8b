//! The message-writer contract and its body-encoding variants.
//!
//! A writer is selected per outbound message by the dispatch layer and
//! invoked exactly once with the message header, the owning endpoint and
//! that endpoint's byte sink. All variants share one framing: the header
//! (length-prefixed MessagePack, with the sender id and the exact body
//! length stamped in) followed by `body_length` body bytes. They differ only
//! in how the body becomes bytes.

use std::io::{self, Read, Write};

use log::{debug, error};
use serde::Serialize;

use crate::endpoint::EndpointRef;
use crate::error::WireError;
use crate::header::MessageHeader;

/// Copy buffer for streamed bodies.
const STREAM_BUFFER_SIZE: usize = 8 * 1024;

/// Strategy contract for encoding and transmitting one message body.
///
/// # Contract
///
/// - `write_message` blocks until the complete message (header + body) is on
///   the sink, or fails. There is no partial success: any error means an
///   unknown number of bytes already reached the sink, so the caller must
///   treat the connection as desynchronized and close it.
/// - The writer only writes. It never reads from the sink, never closes it,
///   never mutates the caller's header and never touches endpoint lifecycle
///   state. Header adjustments (sender id, body length) are framed into an
///   internal copy.
/// - No internal retry, buffer reuse across calls must not leak bytes
///   between messages, and back-pressure is the sink's problem — the writer
///   adds no blocking of its own.
/// - Callers serialize invocations per sink: one message in flight per
///   endpoint output channel. The writer performs no locking.
pub trait MessageWriter {
    /// Encodes and writes one complete message onto `sink`.
    fn write_message(
        &mut self,
        header: &MessageHeader,
        endpoint: &EndpointRef,
        sink: &mut dyn Write,
    ) -> Result<(), WireError>;

    /// Short label for this writer's body-encoding strategy. Infallible and
    /// side-effect free; used in logs and error reports.
    fn description(&self) -> String;
}

/// Stamps the endpoint's client id and the given body length into a copy of
/// `header` and writes the framed result to the sink. Returns the copy so
/// callers can log exactly what went on the wire.
fn dispatch_header(
    header: &MessageHeader,
    endpoint: &EndpointRef,
    body_length: u64,
    sink: &mut dyn Write,
) -> Result<MessageHeader, WireError> {
    let framed = header
        .with_sender_id(endpoint.local_client_id())
        .with_body_length(body_length);
    let bytes = framed.encode_framed()?;
    sink.write_all(&bytes)
        .map_err(|e| WireError::io(endpoint.to_string(), e))?;
    Ok(framed)
}

/// Writes a body serialized from an in-memory value with MessagePack.
///
/// The body is serialized into an internal buffer first so the header can
/// carry the exact body length, then buffer and header go onto the sink.
pub struct MsgpackMessageWriter<T> {
    body: T,
}

impl<T: Serialize> MsgpackMessageWriter<T> {
    pub fn new(body: T) -> Self {
        Self { body }
    }

    fn serialize_body(&self, header: &MessageHeader, endpoint: &EndpointRef) -> Result<Vec<u8>, WireError> {
        let mut out = Vec::new();
        let mut serializer = rmp_serde::Serializer::new(&mut out).with_struct_map();
        self.body.serialize(&mut serializer).map_err(|e| {
            error!("failed to serialize body of {header} for {endpoint}: {e}");
            WireError::Encode {
                reason: e.to_string(),
            }
        })?;
        Ok(out)
    }
}

impl<T: Serialize> MessageWriter for MsgpackMessageWriter<T> {
    fn write_message(
        &mut self,
        header: &MessageHeader,
        endpoint: &EndpointRef,
        sink: &mut dyn Write,
    ) -> Result<(), WireError> {
        let body = self.serialize_body(header, endpoint)?;
        let framed = dispatch_header(header, endpoint, body.len() as u64, sink)?;
        debug!("sending msgpack {framed} to {endpoint}");
        sink.write_all(&body)
            .map_err(|e| WireError::io(endpoint.to_string(), e))?;
        sink.flush()
            .map_err(|e| WireError::io(endpoint.to_string(), e))?;
        debug!("done sending {framed} to {endpoint}");
        Ok(())
    }

    fn description(&self) -> String {
        format!("msgpack body ({})", std::any::type_name::<T>())
    }
}

/// Writes an already-encoded byte body verbatim.
pub struct BytesMessageWriter {
    body: Vec<u8>,
}

impl BytesMessageWriter {
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }
}

impl MessageWriter for BytesMessageWriter {
    fn write_message(
        &mut self,
        header: &MessageHeader,
        endpoint: &EndpointRef,
        sink: &mut dyn Write,
    ) -> Result<(), WireError> {
        let framed = dispatch_header(header, endpoint, self.body.len() as u64, sink)?;
        debug!("sending raw {framed} to {endpoint}");
        if !self.body.is_empty() {
            sink.write_all(&self.body)
                .map_err(|e| WireError::io(endpoint.to_string(), e))?;
        }
        sink.flush()
            .map_err(|e| WireError::io(endpoint.to_string(), e))?;
        debug!("done sending {framed} to {endpoint}");
        Ok(())
    }

    fn description(&self) -> String {
        format!("raw byte body ({} bytes)", self.body.len())
    }
}

/// Copies a body of known length from a reader without buffering it whole.
///
/// Intended for large payloads. The source must yield exactly `body_length`
/// bytes; running dry earlier aborts the write with
/// [`WireError::TruncatedBody`], leaving the sink tainted like any other
/// failure.
pub struct StreamMessageWriter<R> {
    source: R,
    body_length: u64,
}

impl<R: Read> StreamMessageWriter<R> {
    pub fn new(source: R, body_length: u64) -> Self {
        Self {
            source,
            body_length,
        }
    }
}

impl<R: Read> MessageWriter for StreamMessageWriter<R> {
    fn write_message(
        &mut self,
        header: &MessageHeader,
        endpoint: &EndpointRef,
        sink: &mut dyn Write,
    ) -> Result<(), WireError> {
        let framed = dispatch_header(header, endpoint, self.body_length, sink)?;
        debug!("sending streamed {framed} to {endpoint}");

        let mut buffer = [0u8; STREAM_BUFFER_SIZE];
        let mut remaining = self.body_length;
        while remaining > 0 {
            let want = remaining.min(buffer.len() as u64) as usize;
            let got = match self.source.read(&mut buffer[..want]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(WireError::io(endpoint.to_string(), e)),
            };
            if got == 0 {
                return Err(WireError::TruncatedBody {
                    expected: self.body_length,
                    written: self.body_length - remaining,
                });
            }
            sink.write_all(&buffer[..got])
                .map_err(|e| WireError::io(endpoint.to_string(), e))?;
            remaining -= got as u64;
        }

        sink.flush()
            .map_err(|e| WireError::io(endpoint.to_string(), e))?;
        debug!("done sending {framed} to {endpoint}");
        Ok(())
    }

    fn description(&self) -> String {
        format!("streamed body ({} bytes)", self.body_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderKind;
    use crate::reader::{read_body, read_header};

    fn endpoint() -> EndpointRef {
        EndpointRef::new(3, "10.0.0.7:4040", 9001)
    }

    #[test]
    fn bytes_writer_frames_body_length_and_sender_id() {
        let mut writer = BytesMessageWriter::new(vec![0xab; 10]);
        let header = MessageHeader::new(HeaderKind::Standard, 1);
        let mut sink = Vec::new();

        writer
            .write_message(&header, &endpoint(), &mut sink)
            .expect("write");

        let mut cursor = sink.as_slice();
        let decoded = read_header(&endpoint(), &mut cursor).expect("header");
        assert_eq!(decoded.body_length, 10);
        assert_eq!(decoded.sender_id, 9001);
        let body = read_body(&endpoint(), &mut cursor, &decoded, 1 << 20).expect("body");
        assert_eq!(body, vec![0xab; 10]);
        // caller's header stays untouched
        assert_eq!(header.body_length, 0);
        assert_eq!(header.sender_id, 0);
    }

    #[test]
    fn empty_byte_body_is_header_only() {
        let mut writer = BytesMessageWriter::new(Vec::new());
        let header = MessageHeader::new(HeaderKind::EndpointCheck, 0);
        let mut sink = Vec::new();

        writer
            .write_message(&header, &endpoint(), &mut sink)
            .expect("write");

        let mut cursor = sink.as_slice();
        let decoded = read_header(&endpoint(), &mut cursor).expect("header");
        assert_eq!(decoded.body_length, 0);
        assert!(cursor.is_empty());
    }

    #[test]
    fn stream_writer_rejects_short_source() {
        let source = std::io::Cursor::new(vec![1u8; 6]);
        let mut writer = StreamMessageWriter::new(source, 10);
        let header = MessageHeader::new(HeaderKind::Standard, 1);
        let mut sink = Vec::new();

        let err = writer
            .write_message(&header, &endpoint(), &mut sink)
            .expect_err("short source must fail");
        assert!(matches!(
            err,
            WireError::TruncatedBody {
                expected: 10,
                written: 6
            }
        ));
        assert!(err.taints_connection());
    }

    /// Source that fails with `Interrupted` before every successful read.
    struct InterruptingSource<R> {
        inner: R,
        interrupt_next: bool,
    }

    impl<R: Read> Read for InterruptingSource<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.interrupt_next = true;
            self.inner.read(buf)
        }
    }

    #[test]
    fn stream_writer_retries_interrupted_source_reads() {
        let source = InterruptingSource {
            inner: std::io::Cursor::new((0u8..100).collect::<Vec<u8>>()),
            interrupt_next: true,
        };
        let mut writer = StreamMessageWriter::new(source, 100);
        let header = MessageHeader::new(HeaderKind::Standard, 1);
        let mut sink = Vec::new();

        writer
            .write_message(&header, &endpoint(), &mut sink)
            .expect("interrupted reads must be retried");

        let mut cursor = sink.as_slice();
        let decoded = read_header(&endpoint(), &mut cursor).expect("header");
        assert_eq!(decoded.body_length, 100);
        let body = read_body(&endpoint(), &mut cursor, &decoded, 1 << 20).expect("body");
        assert_eq!(body, (0u8..100).collect::<Vec<u8>>());
    }

    #[test]
    fn descriptions_are_stable_and_pure() {
        let writer = BytesMessageWriter::new(vec![1, 2, 3]);
        let before = writer.description();
        assert_eq!(writer.description(), before);

        let stream = StreamMessageWriter::new(std::io::empty(), 0);
        assert_eq!(stream.description(), "streamed body (0 bytes)");
    }
}
