//! FLV tag-byte layout
//!
//! FLV (Flash Video) is the container format used by RTMP for audio/video
//! data. Each outbound RTMP audio/video message payload starts with the FLV
//! codec header byte(s) built here.
//!
//! RTMP Video Data:
//! ```text
//! +----------+----------+
//! | FrameType| CodecID  | CodecData...
//! | (4 bits) | (4 bits) |
//! +----------+----------+
//! ```
//!
//! RTMP Audio Data:
//! ```text
//! +----------+----------+----------+----------+
//! |SoundFormat|SoundRate|SoundSize |SoundType | AudioData...
//! | (4 bits)  | (2 bits)| (1 bit)  | (1 bit)  |
//! +----------+----------+----------+----------+
//! ```
//!
//! Enhanced RTMP video is signaled by the `isExVideoHeader` bit (bit 7 of the
//! first byte); the lower 4 bits then carry a `VideoPacketType` instead of a
//! codec id, and a FOURCC follows.

/// Extended-header flag for Enhanced RTMP video (bit 7 of the first byte)
pub const EX_VIDEO_HEADER: u8 = 0b1000_0000;

/// Video frame type (upper 4 bits of the first byte, 3 bits in enhanced mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    /// Keyframe (for AVC/HEVC, a seekable frame)
    Key = 1,
    /// Inter frame
    Inter = 2,
    /// Disposable inter frame (H.263 only)
    Disposable = 3,
    /// Generated keyframe (reserved for server use)
    Generated = 4,
    /// Video info/command frame
    Command = 5,
}

impl VideoFrameType {
    /// Frame type for a coded frame given its keyframe flag.
    pub fn for_keyframe(keyframe: bool) -> Self {
        if keyframe {
            VideoFrameType::Key
        } else {
            VideoFrameType::Inter
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match (b >> 4) & 0x07 {
            1 => Some(VideoFrameType::Key),
            2 => Some(VideoFrameType::Inter),
            3 => Some(VideoFrameType::Disposable),
            4 => Some(VideoFrameType::Generated),
            5 => Some(VideoFrameType::Command),
            _ => None,
        }
    }
}

/// Video codec ID (lower 4 bits of the first byte, legacy mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// AVC (H.264)
    Avc = 7,
    /// HEVC (H.265), legacy non-standard id used by some servers
    Hevc = 12,
}

/// Audio codec (SoundFormat, upper 4 bits of the first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// MP3
    Mp3 = 2,
    /// AAC
    Aac = 10,
    /// Speex
    Speex = 11,
}

/// Audio sample rate (SoundRate, 2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundRate {
    Rate5512 = 0,
    Rate11025 = 1,
    Rate22050 = 2,
    Rate44100 = 3,
}

impl SoundRate {
    pub fn to_hz(&self) -> u32 {
        match self {
            SoundRate::Rate5512 => 5512,
            SoundRate::Rate11025 => 11025,
            SoundRate::Rate22050 => 22050,
            SoundRate::Rate44100 => 44100,
        }
    }
}

/// Audio sample size (SoundSize, 1 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSize {
    Bits8 = 0,
    Bits16 = 1,
}

/// Audio channel layout (SoundType, 1 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundType {
    Mono = 0,
    Stereo = 1,
}

/// AAC packet type (second byte of an AAC audio payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    /// Sequence header (AudioSpecificConfig)
    SequenceHeader = 0,
    /// Raw AAC frame data
    Raw = 1,
}

/// AVC packet type (second byte of a legacy video payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    /// Sequence header (AVCDecoderConfigurationRecord)
    SequenceHeader = 0,
    /// NAL units
    Nalu = 1,
    /// End of sequence
    EndOfSequence = 2,
}

/// Enhanced video packet type (lower 4 bits when `isExVideoHeader` is set)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPacketType {
    /// Sequence header (codec configuration)
    SequenceStart = 0,
    /// Coded video frames (with composition time)
    CodedFrames = 1,
    /// End of sequence
    SequenceEnd = 2,
    /// Coded frames with composition time = 0 (optimization)
    CodedFramesX = 3,
    /// Metadata (HDR info, etc.)
    Metadata = 4,
}

/// Build the audio tag byte: `codec<<4 | rate<<2 | size<<1 | channels`.
pub const fn audio_tag_byte(
    codec: AudioCodec,
    rate: SoundRate,
    size: SoundSize,
    channels: SoundType,
) -> u8 {
    (codec as u8) << 4 | (rate as u8) << 2 | (size as u8) << 1 | channels as u8
}

/// Build a legacy video tag byte: `frameType<<4 | codecId`.
pub const fn video_tag_byte(frame_type: VideoFrameType, codec: VideoCodec) -> u8 {
    (frame_type as u8) << 4 | codec as u8
}

/// Build an enhanced video tag byte: `0x80 | frameType<<4 | packetType`.
pub const fn ex_video_tag_byte(frame_type: VideoFrameType, packet_type: VideoPacketType) -> u8 {
    EX_VIDEO_HEADER | (frame_type as u8) << 4 | packet_type as u8
}
