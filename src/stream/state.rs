//! Stream readiness states and NetStream status codes

use crate::mux::muxer::MuxerId;

/// Readiness of a stream over its connection
///
/// `Publishing` carries the identity token of the muxer whose output is
/// being transmitted, so the output gate can assert "publishing through our
/// own muxer" and not merely "some publish is active".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadyState {
    /// Created, stream not yet allocated on the connection
    #[default]
    Idle,
    /// Stream allocated (createStream completed)
    Open,
    /// Play requested
    Play,
    /// Playback running
    Playing,
    /// Publish requested
    Publish,
    /// Publishing media produced by the identified muxer
    Publishing(MuxerId),
}

impl ReadyState {
    /// Whether the stream has progressed past `Open` (an active play or
    /// publish exists that `close` must unwind).
    pub fn is_beyond_open(&self) -> bool {
        matches!(
            self,
            ReadyState::Play | ReadyState::Playing | ReadyState::Publish | ReadyState::Publishing(_)
        )
    }
}

/// How a publish is recorded server-side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishType {
    /// Publish without recording
    #[default]
    Live,
    /// Publish with server-side recording
    Record,
    /// Append to an existing recording
    Append,
    /// Append with gap adjustment
    AppendWithGap,
}

impl PublishType {
    /// The wire string carried on the publish command.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishType::Live => "live",
            PublishType::Record => "record",
            PublishType::Append => "append",
            PublishType::AppendWithGap => "appendWithGap",
        }
    }
}

/// Severity of a status notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Status,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Status => "status",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        }
    }
}

/// NetStream/NetConnection status codes this core emits or reacts to
///
/// The full Adobe table is much larger; these are the rows with behavior in
/// the outbound path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    ConnectSuccess,
    ConnectClosed,
    ConnectFailed,
    PlayReset,
    PlayStart,
    PlayStop,
    PlayFailed,
    PlayStreamNotFound,
    PlayInsufficientBandwidth,
    PublishStart,
    PublishBadName,
    PublishIdle,
    UnpublishSuccess,
    VideoDimensionChange,
}

impl StatusCode {
    /// The wire string for this code.
    pub fn as_code(&self) -> &'static str {
        match self {
            StatusCode::ConnectSuccess => "NetConnection.Connect.Success",
            StatusCode::ConnectClosed => "NetConnection.Connect.Closed",
            StatusCode::ConnectFailed => "NetConnection.Connect.Failed",
            StatusCode::PlayReset => "NetStream.Play.Reset",
            StatusCode::PlayStart => "NetStream.Play.Start",
            StatusCode::PlayStop => "NetStream.Play.Stop",
            StatusCode::PlayFailed => "NetStream.Play.Failed",
            StatusCode::PlayStreamNotFound => "NetStream.Play.StreamNotFound",
            StatusCode::PlayInsufficientBandwidth => "NetStream.Play.InsufficientBW",
            StatusCode::PublishStart => "NetStream.Publish.Start",
            StatusCode::PublishBadName => "NetStream.Publish.BadName",
            StatusCode::PublishIdle => "NetStream.Publish.Idle",
            StatusCode::UnpublishSuccess => "NetStream.Unpublish.Success",
            StatusCode::VideoDimensionChange => "NetStream.Video.DimensionChange",
        }
    }

    /// Parse a wire string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NetConnection.Connect.Success" => Some(StatusCode::ConnectSuccess),
            "NetConnection.Connect.Closed" => Some(StatusCode::ConnectClosed),
            "NetConnection.Connect.Failed" => Some(StatusCode::ConnectFailed),
            "NetStream.Play.Reset" => Some(StatusCode::PlayReset),
            "NetStream.Play.Start" => Some(StatusCode::PlayStart),
            "NetStream.Play.Stop" => Some(StatusCode::PlayStop),
            "NetStream.Play.Failed" => Some(StatusCode::PlayFailed),
            "NetStream.Play.StreamNotFound" => Some(StatusCode::PlayStreamNotFound),
            "NetStream.Play.InsufficientBW" => Some(StatusCode::PlayInsufficientBandwidth),
            "NetStream.Publish.Start" => Some(StatusCode::PublishStart),
            "NetStream.Publish.BadName" => Some(StatusCode::PublishBadName),
            "NetStream.Publish.Idle" => Some(StatusCode::PublishIdle),
            "NetStream.Unpublish.Success" => Some(StatusCode::UnpublishSuccess),
            "NetStream.Video.DimensionChange" => Some(StatusCode::VideoDimensionChange),
            _ => None,
        }
    }

    /// Severity of this code.
    pub fn level(&self) -> StatusLevel {
        match self {
            StatusCode::ConnectFailed
            | StatusCode::PlayFailed
            | StatusCode::PlayStreamNotFound
            | StatusCode::PublishBadName => StatusLevel::Error,
            StatusCode::PlayInsufficientBandwidth => StatusLevel::Warning,
            _ => StatusLevel::Status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_ordering() {
        assert!(!ReadyState::Idle.is_beyond_open());
        assert!(!ReadyState::Open.is_beyond_open());
        assert!(ReadyState::Play.is_beyond_open());
        assert!(ReadyState::Publish.is_beyond_open());
    }

    #[test]
    fn test_publish_type_strings() {
        assert_eq!(PublishType::Live.as_str(), "live");
        assert_eq!(PublishType::AppendWithGap.as_str(), "appendWithGap");
    }

    #[test]
    fn test_status_code_roundtrip() {
        for code in [
            StatusCode::ConnectSuccess,
            StatusCode::PlayReset,
            StatusCode::PlayStart,
            StatusCode::PublishStart,
            StatusCode::PublishIdle,
            StatusCode::UnpublishSuccess,
            StatusCode::VideoDimensionChange,
        ] {
            assert_eq!(StatusCode::from_code(code.as_code()), Some(code));
        }
        assert_eq!(StatusCode::from_code("NetStream.Unknown"), None);
    }

    #[test]
    fn test_status_levels() {
        assert_eq!(StatusCode::PublishStart.level(), StatusLevel::Status);
        assert_eq!(StatusCode::PublishBadName.level(), StatusLevel::Error);
        assert_eq!(
            StatusCode::PlayInsufficientBandwidth.level(),
            StatusLevel::Warning
        );
        assert_eq!(StatusLevel::Error.as_str(), "error");
    }
}
