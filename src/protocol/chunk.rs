//! Outbound RTMP chunk envelope
//!
//! RTMP messages are carried in chunks whose header timestamp is either a
//! full value or a delta from the previous chunk on the same chunk stream:
//!
//! ```text
//! Message Header formats (based on fmt):
//! - Type 0 (11 bytes): timestamp(3) + length(3) + type(1) + stream_id(4)
//! - Type 1 (7 bytes):  timestamp_delta(3) + length(3) + type(1)
//! ```
//!
//! This crate builds fully-described outbound chunks and hands them to the
//! [`Connection`](crate::connection::Connection) collaborator, which owns
//! the byte-level chunking, splitting and socket I/O. The first chunk of a
//! track after a reset is always `Type0` (absolute), everything after is
//! `Type1` (delta).
//!
//! Reference: RTMP Specification Section 5.3

use super::message::RtmpMessage;

/// Chunk header format for the timestamp field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Full message header, absolute timestamp
    Type0,
    /// Compressed header, timestamp is a delta from the previous chunk
    Type1,
}

/// A fully-described outbound chunk
#[derive(Debug, Clone)]
pub struct RtmpChunk {
    /// Header format to encode the timestamp with
    pub kind: ChunkKind,
    /// Chunk stream ID (for multiplexing lanes: command/audio/video/data)
    pub csid: u32,
    /// The message to carry
    pub message: RtmpMessage,
}

impl RtmpChunk {
    /// Create a chunk on the given chunk stream.
    pub fn new(kind: ChunkKind, csid: u32, message: RtmpMessage) -> Self {
        Self {
            kind,
            csid,
            message,
        }
    }

    /// Whether the timestamp is absolute.
    pub fn is_absolute(&self) -> bool {
        self.kind == ChunkKind::Type0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::CSID_AUDIO;
    use bytes::Bytes;

    #[test]
    fn test_chunk_kind() {
        let chunk = RtmpChunk::new(
            ChunkKind::Type0,
            CSID_AUDIO,
            RtmpMessage::Audio {
                stream_id: 1,
                timestamp: 0,
                payload: Bytes::from_static(&[0xAF, 0x00]),
            },
        );
        assert!(chunk.is_absolute());
        assert_eq!(chunk.csid, CSID_AUDIO);
    }
}
