//! Outbound media muxing
//!
//! This module turns encoded samples into framed RTMP/FLV message payloads:
//! - [`frame`] prepends the FLV codec headers (sequence header or data frame)
//! - [`timing`] reconciles absolute sample times into chunk timestamps
//! - [`muxer`] orchestrates both for one stream and fans buffers out to
//!   secondary destinations
//! - [`sink`] holds the fan-out destination set

pub mod frame;
pub mod muxer;
pub mod sink;
pub mod timing;

pub use muxer::{Muxer, MuxerId, MuxerOutput};
pub use sink::{MediaSink, SinkSet};
pub use timing::{MediaTimestamp, TimingTracker, TrackTimer};

use bytes::Bytes;

use crate::media::fourcc::VideoFourCc;

/// Which media lane a buffer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// One compressed audio sample from the upstream encoder
///
/// Timestamps are absolute milliseconds on the source's clock and
/// non-decreasing per source.
#[derive(Debug, Clone)]
pub struct AudioSample {
    /// Raw compressed payload (no ADTS header)
    pub data: Bytes,
    /// Absolute timestamp in milliseconds
    pub timestamp: f64,
}

/// One coded video frame from the upstream encoder
///
/// Decode timestamps are monotonic; presentation may lead or lag decode when
/// the encoder emits B-frames. The payload is one or more length-prefixed
/// NAL units.
#[derive(Debug, Clone)]
pub struct CodedVideoFrame {
    /// Length-prefixed NAL unit data
    pub data: Bytes,
    /// Codec the payload is coded with
    pub codec: VideoFourCc,
    /// Decode timestamp in milliseconds, when the encoder reports one
    pub decode_timestamp: Option<f64>,
    /// Presentation timestamp in milliseconds
    pub presentation_timestamp: f64,
    /// Whether this is a sync (IDR) frame
    pub keyframe: bool,
}

impl CodedVideoFrame {
    /// The timestamp that orders this frame on the wire: decode time when
    /// present, presentation time otherwise.
    pub fn effective_decode_timestamp(&self) -> f64 {
        self.decode_timestamp.unwrap_or(self.presentation_timestamp)
    }
}
