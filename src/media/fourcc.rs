//! FOURCC codec identifiers for Enhanced RTMP
//!
//! FOURCC (Four Character Code) is a sequence of four bytes used to uniquely
//! identify data formats. E-RTMP uses FOURCC to signal modern codecs like
//! HEVC on the wire; this crate emits the `hvc1` signaling for H.265 output.
//!
//! Reference: E-RTMP v2 specification

use std::fmt;

/// A four-character ASCII code identifying a codec or format.
///
/// FOURCC values are stored as big-endian u32 (e.g., "hvc1" = 0x68766331).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC([u8; 4]);

impl FourCC {
    /// Create a FOURCC from 4 ASCII bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Create a FOURCC from a big-endian u32.
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// Convert to big-endian u32 (for metadata encoding).
    pub const fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Convert to string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", self.as_str())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video codec FOURCC values defined by E-RTMP.
///
/// Coded frames arrive tagged with one of these; only [`VideoFourCc::Avc`]
/// and [`VideoFourCc::Hevc`] can be muxed, everything else is rejected with
/// `UnsupportedVideoCodec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFourCc {
    /// H.264/AVC ("avc1")
    Avc,
    /// H.265/HEVC ("hvc1")
    Hevc,
    /// AV1 ("av01")
    Av1,
    /// VP9 ("vp09")
    Vp9,
    /// VP8 ("vp08")
    Vp8,
}

impl VideoFourCc {
    /// FOURCC for H.264/AVC
    pub const AVC_FOURCC: FourCC = FourCC::new(*b"avc1");
    /// FOURCC for H.265/HEVC
    pub const HEVC_FOURCC: FourCC = FourCC::new(*b"hvc1");
    /// FOURCC for AV1
    pub const AV1_FOURCC: FourCC = FourCC::new(*b"av01");
    /// FOURCC for VP9
    pub const VP9_FOURCC: FourCC = FourCC::new(*b"vp09");
    /// FOURCC for VP8
    pub const VP8_FOURCC: FourCC = FourCC::new(*b"vp08");

    /// Get the FOURCC for this codec.
    pub const fn fourcc(&self) -> FourCC {
        match self {
            VideoFourCc::Avc => Self::AVC_FOURCC,
            VideoFourCc::Hevc => Self::HEVC_FOURCC,
            VideoFourCc::Av1 => Self::AV1_FOURCC,
            VideoFourCc::Vp9 => Self::VP9_FOURCC,
            VideoFourCc::Vp8 => Self::VP8_FOURCC,
        }
    }

    /// Parse from a FOURCC value.
    pub fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match fourcc.as_bytes() {
            b"avc1" => Some(VideoFourCc::Avc),
            b"hvc1" => Some(VideoFourCc::Hevc),
            b"av01" => Some(VideoFourCc::Av1),
            b"vp09" => Some(VideoFourCc::Vp9),
            b"vp08" => Some(VideoFourCc::Vp8),
            _ => None,
        }
    }

    /// Whether this codec can be muxed by the outbound pipeline.
    pub const fn is_supported(&self) -> bool {
        matches!(self, VideoFourCc::Avc | VideoFourCc::Hevc)
    }
}
