//! rtmp-push: Outbound RTMP publishing core
//!
//! This library converts live encoded audio/video samples into correctly
//! framed RTMP/FLV protocol messages and replicates one encoded stream to
//! multiple destinations:
//! - FLV framing for AAC audio and H.264 video, plus Enhanced RTMP (E-RTMP)
//!   framing for H.265 with `hvc1` FOURCC signaling
//! - Sequence-header management: built on format changes, cached, and
//!   replayed to late-attached destinations
//! - Monotonic timestamp/delta reconciliation with correct chunk type 0/1
//!   selection per track
//! - Publish/play readiness state machine gating all transmission
//! - Multi-destination fan-out through connection-less source streams and
//!   relay streams
//!
//! Socket I/O, handshake and AMF encoding live behind the [`Connection`]
//! trait; capture and encoding live behind the sample types in [`mux`].
//!
//! # Example: publish and relay
//!
//! ```no_run
//! use std::sync::Arc;
//! use rtmp_push::RtmpStream;
//! use rtmp_push::media::aac::AacProfile;
//!
//! # fn connect(_url: &str) -> Arc<dyn rtmp_push::Connection> { unimplemented!() }
//! # async fn demo() {
//! // A connection-less source runs the encoder-facing muxer
//! let (source, ready) = RtmpStream::source();
//! source.muxer().start_running();
//! source.announce_audio_format(AacProfile::Lc, 44100, 2);
//! // ... announce video, append samples ...
//! ready.wait().await;
//!
//! // Each relay republishes the same encoded media to one destination
//! let relay = RtmpStream::relay(connect("rtmp://a.example/live/key"), &source);
//! relay.publish(Some("key"));
//! // ... drive relay.on_stream_created / relay.on_status from the connection
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod media;
pub mod mux;
pub mod protocol;
pub mod stats;
pub mod stream;

// Re-export main types for convenience
pub use connection::Connection;
pub use error::{Error, MediaError, Result};
pub use media::{AudioSpecificConfig, VideoFormat};
pub use mux::{AudioSample, CodedVideoFrame, MediaKind, MediaSink, MediaTimestamp, Muxer};
pub use protocol::{ChunkKind, CommandMessage, RtmpChunk, RtmpMessage, StreamMetadata};
pub use stream::{
    AudioSettings, PublishType, ReadyState, RtmpStream, SourceReady, StatusCode, StreamEvent,
    VideoSettings,
};
