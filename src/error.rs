//! Unified error types for rtmp-push

use std::fmt;

use crate::media::fourcc::FourCC;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all muxing operations
#[derive(Debug)]
pub enum Error {
    /// Media framing or codec configuration error
    Media(MediaError),
    /// Invalid configuration
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Media(e) => write!(f, "Media error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Media(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MediaError> for Error {
    fn from(err: MediaError) -> Self {
        Error::Media(err)
    }
}

/// Media framing and codec configuration errors
///
/// All of these are expected protocol-level anomalies: callers log the
/// condition and drop the offending sample or format, they never escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaError {
    /// Video codec outside the supported set (AVC, HEVC)
    UnsupportedVideoCodec(FourCC),
    /// Audio codec outside the supported set (AAC)
    UnsupportedAudioCodec,
    /// Malformed AudioSpecificConfig
    InvalidAacConfig,
    /// Malformed AVCDecoderConfigurationRecord or parameter sets
    InvalidAvcConfig,
    /// Malformed HEVCDecoderConfigurationRecord or parameter sets
    InvalidHevcConfig,
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::UnsupportedVideoCodec(fourcc) => {
                write!(f, "Unsupported video codec: {}", fourcc)
            }
            MediaError::UnsupportedAudioCodec => write!(f, "Unsupported audio codec"),
            MediaError::InvalidAacConfig => write!(f, "Invalid AudioSpecificConfig"),
            MediaError::InvalidAvcConfig => write!(f, "Invalid AVC configuration record"),
            MediaError::InvalidHevcConfig => write!(f, "Invalid HEVC configuration record"),
        }
    }
}

impl std::error::Error for MediaError {}
