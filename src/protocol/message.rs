//! Outbound RTMP message types
//!
//! The messages this core produces:
//! - Audio/Video Messages (types 8, 9): framed media payloads
//! - Data Messages (type 18): onMetaData push
//! - Command Messages (type 20): publish/play/closeStream and FMLE RPCs
//!
//! All of these are structured values; the `Connection` collaborator owns
//! AMF byte encoding and socket I/O.
//!
//! Reference: RTMP Specification Section 5.4

use bytes::Bytes;

use crate::media::fourcc::FourCC;
use crate::protocol::constants::*;

/// An outbound RTMP message
#[derive(Debug, Clone)]
pub enum RtmpMessage {
    /// Audio data (type 8)
    Audio {
        stream_id: u32,
        timestamp: u32,
        payload: Bytes,
    },

    /// Video data (type 9)
    Video {
        stream_id: u32,
        timestamp: u32,
        payload: Bytes,
    },

    /// AMF0 Data message (type 18) - @setDataFrame/onMetaData
    Data {
        stream_id: u32,
        timestamp: u32,
        /// Data handler, conventionally "@setDataFrame"
        handler: String,
        /// Frame name, conventionally "onMetaData"
        name: String,
        metadata: StreamMetadata,
    },

    /// AMF0 Command (type 20)
    Command(CommandMessage),
}

impl RtmpMessage {
    /// The RTMP message type id.
    pub fn type_id(&self) -> u8 {
        match self {
            RtmpMessage::Audio { .. } => MSG_AUDIO,
            RtmpMessage::Video { .. } => MSG_VIDEO,
            RtmpMessage::Data { .. } => MSG_DATA_AMF0,
            RtmpMessage::Command(_) => MSG_COMMAND_AMF0,
        }
    }

    /// Payload size for media messages, 0 for structured messages.
    pub fn payload_len(&self) -> usize {
        match self {
            RtmpMessage::Audio { payload, .. } | RtmpMessage::Video { payload, .. } => {
                payload.len()
            }
            _ => 0,
        }
    }
}

/// A command RPC sent to the remote peer
#[derive(Debug, Clone)]
pub struct CommandMessage {
    /// Command name ("publish", "play", "FCPublish", ...)
    pub name: String,
    /// Transaction id (0 for notifications)
    pub transaction_id: f64,
    /// Message stream the command applies to
    pub stream_id: u32,
    /// Positional arguments after the (null) command object
    pub arguments: Vec<CommandArg>,
}

impl CommandMessage {
    /// Create a command with arguments.
    pub fn new(name: impl Into<String>, stream_id: u32, arguments: Vec<CommandArg>) -> Self {
        Self {
            name: name.into(),
            transaction_id: 0.0,
            stream_id,
            arguments,
        }
    }

    /// `publish(name, type)`
    pub fn publish(stream_id: u32, name: &str, publish_type: &str) -> Self {
        Self::new(
            CMD_PUBLISH,
            stream_id,
            vec![
                CommandArg::String(name.to_string()),
                CommandArg::String(publish_type.to_string()),
            ],
        )
    }

    /// `play(name)`
    pub fn play(stream_id: u32, name: &str) -> Self {
        Self::new(
            CMD_PLAY,
            stream_id,
            vec![CommandArg::String(name.to_string())],
        )
    }

    /// `closeStream(id)`
    pub fn close_stream(stream_id: u32) -> Self {
        Self::new(
            CMD_CLOSE_STREAM,
            0,
            vec![CommandArg::Number(stream_id as f64)],
        )
    }

    /// `FCPublish(name)` - idle-publish announcement
    pub fn fc_publish(name: &str) -> Self {
        Self::new(
            CMD_FC_PUBLISH,
            0,
            vec![CommandArg::String(name.to_string())],
        )
    }

    /// `FCUnpublish(name)`
    pub fn fc_unpublish(name: &str) -> Self {
        Self::new(
            CMD_FC_UNPUBLISH,
            0,
            vec![CommandArg::String(name.to_string())],
        )
    }
}

/// A positional command argument (AMF0 scalar subset)
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

/// Stream metadata pushed as `@setDataFrame`/`onMetaData` when publishing
/// starts
///
/// Field names mirror the conventional onMetaData keys; absent fields are
/// omitted from the encoded object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamMetadata {
    /// Video width in pixels
    pub width: Option<u32>,
    /// Video height in pixels
    pub height: Option<u32>,
    /// Video frame rate
    pub framerate: Option<f64>,
    /// Legacy video codec id (7 = AVC)
    pub video_codec_id: Option<u8>,
    /// FOURCC for enhanced codecs (hvc1)
    pub video_fourcc: Option<FourCC>,
    /// Video bitrate in kbit/s
    pub video_data_rate: Option<f64>,
    /// Audio codec id (10 = AAC)
    pub audio_codec_id: Option<u8>,
    /// Audio bitrate in kbit/s
    pub audio_data_rate: Option<f64>,
    /// Audio sample rate in Hz
    pub audio_sample_rate: Option<f64>,
}

impl StreamMetadata {
    /// Whether any field is populated.
    pub fn is_empty(&self) -> bool {
        self == &StreamMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_ids() {
        let audio = RtmpMessage::Audio {
            stream_id: 1,
            timestamp: 0,
            payload: Bytes::from_static(&[0xAF, 0x01]),
        };
        assert_eq!(audio.type_id(), MSG_AUDIO);
        assert_eq!(audio.payload_len(), 2);

        let cmd = RtmpMessage::Command(CommandMessage::play(1, "stream"));
        assert_eq!(cmd.type_id(), MSG_COMMAND_AMF0);
        assert_eq!(cmd.payload_len(), 0);
    }

    #[test]
    fn test_publish_command() {
        let cmd = CommandMessage::publish(5, "key", "live");
        assert_eq!(cmd.name, "publish");
        assert_eq!(cmd.stream_id, 5);
        assert_eq!(
            cmd.arguments,
            vec![
                CommandArg::String("key".into()),
                CommandArg::String("live".into())
            ]
        );
    }

    #[test]
    fn test_close_stream_carries_id_argument() {
        let cmd = CommandMessage::close_stream(7);
        assert_eq!(cmd.stream_id, 0);
        assert_eq!(cmd.arguments, vec![CommandArg::Number(7.0)]);
    }

    #[test]
    fn test_metadata_empty() {
        assert!(StreamMetadata::default().is_empty());
        let meta = StreamMetadata {
            width: Some(1920),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }
}
