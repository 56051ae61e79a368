//! FLV frame encoding
//!
//! Pure payload construction: every function takes already-resolved codec
//! and timing inputs and prepends the FLV codec header bytes. Nothing here
//! reads or mutates timing state; composition offsets come from
//! [`super::timing`].
//!
//! Audio payloads carry the fixed AAC/44.1kHz/16-bit/stereo tag byte (0xAF)
//! followed by the packet type. Legacy AVC payloads carry
//! `frameType<<4 | 7`, packet type and a signed 24-bit composition time.
//! HEVC payloads use the Enhanced RTMP extended header with `hvc1` FOURCC
//! signaling.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MediaError, Result};
use crate::media::flv::{
    audio_tag_byte, ex_video_tag_byte, video_tag_byte, AacPacketType, AudioCodec, AvcPacketType,
    SoundRate, SoundSize, SoundType, VideoCodec, VideoFrameType, VideoPacketType,
};
use crate::media::fourcc::VideoFourCc;
use crate::media::VideoFormat;

/// The audio tag byte every AAC payload starts with
pub const AAC_TAG: u8 = audio_tag_byte(
    AudioCodec::Aac,
    SoundRate::Rate44100,
    SoundSize::Bits16,
    SoundType::Stereo,
);

/// Build an AAC sequence header payload: `[0xAF, 0x00] ++ AudioSpecificConfig`.
pub fn audio_sequence_header(config: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(2 + config.len());
    buf.put_u8(AAC_TAG);
    buf.put_u8(AacPacketType::SequenceHeader as u8);
    buf.put_slice(config);
    buf.freeze()
}

/// Build a raw AAC data payload: `[0xAF, 0x01] ++ frame`.
pub fn audio_data(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(2 + payload.len());
    buf.put_u8(AAC_TAG);
    buf.put_u8(AacPacketType::Raw as u8);
    buf.put_slice(payload);
    buf.freeze()
}

/// Build a video sequence header payload from a codec configuration.
///
/// AVC uses the legacy 5-byte header (keyframe, SequenceHeader packet type,
/// three zeroed composition bytes); HEVC uses the extended header with
/// SequenceStart and the `hvc1` FOURCC, no composition bytes.
pub fn video_sequence_header(format: &VideoFormat) -> Bytes {
    let record = format.config_record();
    match format {
        VideoFormat::Avc(_) => {
            let mut buf = BytesMut::with_capacity(5 + record.len());
            buf.put_u8(video_tag_byte(VideoFrameType::Key, VideoCodec::Avc));
            buf.put_u8(AvcPacketType::SequenceHeader as u8);
            buf.put_slice(&[0, 0, 0]);
            buf.put_slice(&record);
            buf.freeze()
        }
        VideoFormat::Hevc(_) => {
            let mut buf = BytesMut::with_capacity(5 + record.len());
            buf.put_u8(ex_video_tag_byte(
                VideoFrameType::Key,
                VideoPacketType::SequenceStart,
            ));
            buf.put_slice(VideoFourCc::HEVC_FOURCC.as_bytes());
            buf.put_slice(&record);
            buf.freeze()
        }
    }
}

/// Build a coded video frame payload.
///
/// `composition_time` is the milliseconds offset between decode and
/// presentation order, encoded big-endian in 24 bits (signed). Codecs outside
/// {AVC, HEVC} are rejected with `UnsupportedVideoCodec`.
pub fn video_frame(
    codec: VideoFourCc,
    keyframe: bool,
    composition_time: i32,
    payload: &[u8],
) -> Result<Bytes> {
    let frame_type = VideoFrameType::for_keyframe(keyframe);
    match codec {
        VideoFourCc::Avc => {
            let mut buf = BytesMut::with_capacity(5 + payload.len());
            buf.put_u8(video_tag_byte(frame_type, VideoCodec::Avc));
            buf.put_u8(AvcPacketType::Nalu as u8);
            put_i24(&mut buf, composition_time);
            buf.put_slice(payload);
            Ok(buf.freeze())
        }
        VideoFourCc::Hevc => {
            let mut buf = BytesMut::with_capacity(8 + payload.len());
            buf.put_u8(ex_video_tag_byte(frame_type, VideoPacketType::CodedFrames));
            buf.put_slice(VideoFourCc::HEVC_FOURCC.as_bytes());
            put_i24(&mut buf, composition_time);
            buf.put_slice(payload);
            Ok(buf.freeze())
        }
        other => Err(MediaError::UnsupportedVideoCodec(other.fourcc()).into()),
    }
}

/// Write a signed 24-bit big-endian value.
fn put_i24(buf: &mut BytesMut, value: i32) {
    buf.put_slice(&value.to_be_bytes()[1..4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::AvcConfig;
    use crate::media::HevcConfig;

    fn avc_format() -> VideoFormat {
        let sps = vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])];
        let pps = vec![Bytes::from_static(&[0x68, 0xEF, 0x38])];
        VideoFormat::Avc(AvcConfig::from_parameter_sets(sps, pps).unwrap())
    }

    fn hevc_format() -> VideoFormat {
        VideoFormat::Hevc(
            HevcConfig::from_parameter_sets(
                vec![Bytes::from_static(&[0x40, 0x01, 0x0C])],
                vec![Bytes::from_static(&[0x42, 0x01, 0x01])],
                vec![Bytes::from_static(&[0x44, 0x01, 0xC0])],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_audio_sequence_header() {
        let buffer = audio_sequence_header(&[0x12, 0x10]);
        assert_eq!(&buffer[..], &[0xAF, 0x00, 0x12, 0x10]);
    }

    #[test]
    fn test_audio_data() {
        let buffer = audio_data(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&buffer[..], &[0xAF, 0x01, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_avc_sequence_header() {
        let buffer = video_sequence_header(&avc_format());
        assert_eq!(&buffer[..5], &[0x17, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(buffer[5], 0x01); // configurationVersion
    }

    #[test]
    fn test_hevc_sequence_header() {
        let buffer = video_sequence_header(&hevc_format());
        // Extended flag, keyframe, SequenceStart, then "hvc1"
        assert_eq!(&buffer[..5], &[0x90, 0x68, 0x76, 0x63, 0x31]);
        assert_eq!(buffer[5], 0x01);
    }

    #[test]
    fn test_avc_frame() {
        let buffer = video_frame(VideoFourCc::Avc, true, 0, &[0x65, 0x88]).unwrap();
        assert_eq!(&buffer[..], &[0x17, 0x01, 0x00, 0x00, 0x00, 0x65, 0x88]);

        let buffer = video_frame(VideoFourCc::Avc, false, 33, &[0x41]).unwrap();
        assert_eq!(&buffer[..], &[0x27, 0x01, 0x00, 0x00, 0x21, 0x41]);
    }

    #[test]
    fn test_avc_frame_negative_composition_time() {
        let buffer = video_frame(VideoFourCc::Avc, false, -1, &[0x41]).unwrap();
        assert_eq!(&buffer[2..5], &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_hevc_frame() {
        let buffer = video_frame(VideoFourCc::Hevc, true, 0, &[0x26, 0x01]).unwrap();
        assert_eq!(
            &buffer[..],
            &[0x91, 0x68, 0x76, 0x63, 0x31, 0x00, 0x00, 0x00, 0x26, 0x01]
        );

        let buffer = video_frame(VideoFourCc::Hevc, false, 100, &[0x02]).unwrap();
        assert_eq!(buffer[0], 0xA1);
        assert_eq!(&buffer[5..8], &[0x00, 0x00, 0x64]);
    }

    #[test]
    fn test_unsupported_codec() {
        assert!(video_frame(VideoFourCc::Av1, true, 0, &[0x00]).is_err());
        assert!(video_frame(VideoFourCc::Vp9, false, 0, &[0x00]).is_err());
    }
}
