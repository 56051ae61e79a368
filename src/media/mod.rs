//! Media formats for outbound RTMP
//!
//! This module provides:
//! - FLV tag-byte layout for audio/video payloads (legacy and Enhanced RTMP)
//! - AAC AudioSpecificConfig building
//! - AVC/HEVC decoder configuration record building
//! - FOURCC codec identifiers for Enhanced RTMP

pub mod aac;
pub mod avc;
pub mod flv;
pub mod fourcc;
pub mod hevc;

pub use aac::AudioSpecificConfig;
pub use avc::AvcConfig;
pub use flv::{AacPacketType, AvcPacketType, VideoFrameType, VideoPacketType};
pub use fourcc::{FourCC, VideoFourCc};
pub use hevc::HevcConfig;

use bytes::Bytes;

use crate::error::{MediaError, Result};

/// Video codec configuration for the active format epoch
///
/// One of these exists per video format announced by the upstream encoder;
/// it is the source of the sequence-header configuration record.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoFormat {
    /// H.264 decoder configuration
    Avc(AvcConfig),
    /// H.265 decoder configuration
    Hevc(HevcConfig),
}

impl VideoFormat {
    /// Build a format from a codec id and its raw parameter sets.
    ///
    /// `vps` is ignored for AVC. Codecs outside {AVC, HEVC} are rejected
    /// with `UnsupportedVideoCodec`.
    pub fn new(
        codec: VideoFourCc,
        vps: Vec<Bytes>,
        sps: Vec<Bytes>,
        pps: Vec<Bytes>,
    ) -> Result<Self> {
        match codec {
            VideoFourCc::Avc => Ok(VideoFormat::Avc(AvcConfig::from_parameter_sets(sps, pps)?)),
            VideoFourCc::Hevc => Ok(VideoFormat::Hevc(HevcConfig::from_parameter_sets(
                vps, sps, pps,
            )?)),
            other => Err(MediaError::UnsupportedVideoCodec(other.fourcc()).into()),
        }
    }

    /// The codec this format describes.
    pub fn codec(&self) -> VideoFourCc {
        match self {
            VideoFormat::Avc(_) => VideoFourCc::Avc,
            VideoFormat::Hevc(_) => VideoFourCc::Hevc,
        }
    }

    /// Serialize the codec-specific decoder configuration record.
    pub fn config_record(&self) -> Bytes {
        match self {
            VideoFormat::Avc(config) => config.config_record(),
            VideoFormat::Hevc(config) => config.config_record(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_codec_rejected() {
        let sps = vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])];
        let pps = vec![Bytes::from_static(&[0x68, 0xEF, 0x38])];
        let err = VideoFormat::new(VideoFourCc::Av1, vec![], sps, pps).unwrap_err();
        assert!(err.to_string().contains("av01"));
    }

    #[test]
    fn test_avc_format() {
        let sps = vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])];
        let pps = vec![Bytes::from_static(&[0x68, 0xEF, 0x38])];
        let format = VideoFormat::new(VideoFourCc::Avc, vec![], sps, pps).unwrap();
        assert_eq!(format.codec(), VideoFourCc::Avc);
        assert_eq!(format.config_record()[0], 0x01);
    }
}
