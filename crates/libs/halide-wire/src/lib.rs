//! Wire framing and the message-writer contract for the halide messaging layer.
//!
//! A halide node talks to each connected peer over a dedicated, ordered byte
//! channel. This crate owns the seam where an outbound message becomes bytes
//! on that channel:
//!
//! - [`MessageHeader`] — the metadata record prefixed to every body, framed
//!   as a big-endian `u32` length followed by its MessagePack encoding
//! - [`EndpointRef`] — read-only session context borrowed for the duration
//!   of a single write
//! - [`MessageWriter`] — the strategy contract for encoding and transmitting
//!   a body, with one variant per body representation
//! - [`reader`] — the peer-side decode of the same framing
//!
//! # Contract
//!
//! `write_message` is synchronous and runs to completion on the calling
//! thread. On success the sink holds exactly one complete, well-framed
//! message. On any error the sink's byte position is unknown and the caller
//! must discard the connection; the writer never retries and never leaves a
//! recoverable partial frame. Callers serialize writes per endpoint — two
//! concurrent `write_message` calls against the same sink corrupt framing.
//!
//! Connection establishment, queuing, retry and endpoint lifecycle all live
//! above this crate.

pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use dispatch::{writer_for_payload, BodyPayload};
pub use endpoint::EndpointRef;
pub use error::WireError;
pub use header::{HeaderKind, MessageHeader, MAX_HEADER_LEN};
pub use reader::{read_body, read_header};
pub use writer::{BytesMessageWriter, MessageWriter, MsgpackMessageWriter, StreamMessageWriter};
