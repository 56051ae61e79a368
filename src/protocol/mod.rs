//! Outbound RTMP protocol framing
//!
//! This module describes what the core hands to a `Connection`:
//! - Chunk envelopes with the correct timestamp mode (type 0 vs type 1)
//! - Media, data and command messages as structured values
//!
//! Handshake, chunk byte encoding and AMF serialization live behind the
//! [`Connection`](crate::connection::Connection) seam.

pub mod chunk;
pub mod constants;
pub mod message;

pub use chunk::{ChunkKind, RtmpChunk};
pub use message::{CommandArg, CommandMessage, RtmpMessage, StreamMetadata};
