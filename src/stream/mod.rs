//! Publishing stream over an RTMP connection
//!
//! An [`RtmpStream`] is the state machine between application code, the
//! [`Muxer`](crate::mux::Muxer) producing framed buffers, and the
//! [`Connection`](crate::connection::Connection) that owns the socket. It
//! decides when muxer output actually leaves the process: buffers flow only
//! while the stream is `Publishing` through its own muxer, everything else
//! is a silent no-op.
//!
//! All stream state mutates under one short-held lock; side effects
//! (commands, metadata push, sink registration) run after the lock is
//! released so a fan-out replay into this stream can never deadlock against
//! an in-flight transition.

pub mod relay;
pub mod state;

pub use relay::SourceReady;
pub use state::{PublishType, ReadyState, StatusCode, StatusLevel};

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::connection::Connection;
use crate::media::aac::AacProfile;
use crate::media::fourcc::VideoFourCc;
use crate::media::{AudioSpecificConfig, VideoFormat};
use crate::mux::muxer::{Muxer, MuxerId, MuxerOutput};
use crate::mux::sink::MediaSink;
use crate::mux::timing::MediaTimestamp;
use crate::mux::{AudioSample, CodedVideoFrame, MediaKind};
use crate::protocol::constants::{
    CMD_ON_METADATA, CMD_SET_DATA_FRAME, CSID_AUDIO, CSID_COMMAND, CSID_DATA, CSID_VIDEO,
};
use crate::protocol::{ChunkKind, CommandMessage, RtmpChunk, RtmpMessage, StreamMetadata};
use crate::stats::StreamInfo;

use relay::FirstOutputGate;

/// Notifications surfaced to application code
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The stream moved to a new ready state
    ReadyStateChanged(ReadyState),
    /// A status code arrived from the peer
    Status(StatusCode),
    /// A format announcement was accepted or rejected
    FormatChanged { kind: MediaKind, accepted: bool },
    /// Video dimensions changed while playing
    VideoDimensionChanged,
}

/// Encoder settings used for stream metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Bits per second
    pub bit_rate: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30.0,
            bit_rate: 2_500_000,
        }
    }
}

/// Audio encoder settings used for stream metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSettings {
    /// Bits per second
    pub bit_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { bit_rate: 128_000 }
    }
}

/// Per-track outbound chunk clock
///
/// Each connection re-derives chunk types from its own transmission history:
/// the first chunk of a track is always type 0 regardless of what timestamp
/// mode the producer supplied, and fractional milliseconds carry over so
/// rounded deltas never drift against the source clock.
#[derive(Debug, Default, Clone, Copy)]
struct TrackOutput {
    was_sent: bool,
    /// Absolute position of the track clock, including fractions
    clock: f64,
    /// Fractional milliseconds not yet emitted in a delta
    carry: f64,
}

impl TrackOutput {
    fn chunk_timestamp(&mut self, timestamp: MediaTimestamp) -> (ChunkKind, u32) {
        match timestamp {
            MediaTimestamp::Absolute(t) => {
                self.clock = t;
                self.carry = t - t.floor();
                (ChunkKind::Type0, t.floor() as u32)
            }
            MediaTimestamp::Delta(d) => {
                self.clock += d;
                if !self.was_sent {
                    self.carry = self.clock - self.clock.floor();
                    (ChunkKind::Type0, self.clock.floor() as u32)
                } else {
                    let total = d + self.carry;
                    let whole = total.floor();
                    self.carry = total - whole;
                    (ChunkKind::Type1, whole as u32)
                }
            }
        }
    }

    fn reset(&mut self) {
        *self = TrackOutput::default();
    }
}

struct StreamInner {
    ready_state: ReadyState,
    stream_id: u32,
    audio: TrackOutput,
    video: TrackOutput,
    pending: Vec<PendingCommand>,
    metadata: StreamMetadata,
    started_at: Instant,
    audio_sample_access: bool,
    video_sample_access: bool,
    publish_type: PublishType,
}

enum PendingCommand {
    Play { name: String },
    Publish { name: String },
}

/// Shared stream state: the output gate the muxer writes through
pub(crate) struct StreamCore {
    connection: Option<Arc<dyn Connection>>,
    muxer_id: MuxerId,
    info: StreamInfo,
    events: mpsc::UnboundedSender<StreamEvent>,
    first_output: FirstOutputGate,
    inner: Mutex<StreamInner>,
}

impl StreamCore {
    fn new(
        connection: Option<Arc<dyn Connection>>,
        muxer_id: MuxerId,
        events: mpsc::UnboundedSender<StreamEvent>,
    ) -> Self {
        Self {
            connection,
            muxer_id,
            info: StreamInfo::new(),
            events,
            first_output: FirstOutputGate::new(),
            inner: Mutex::new(StreamInner {
                ready_state: ReadyState::Idle,
                stream_id: 0,
                audio: TrackOutput::default(),
                video: TrackOutput::default(),
                pending: Vec::new(),
                metadata: StreamMetadata::default(),
                started_at: Instant::now(),
                audio_sample_access: true,
                video_sample_access: true,
                publish_type: PublishType::Live,
            }),
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.lock().ready_state
    }

    /// Gate + transmit for one track. Returns without output unless a
    /// connection exists and the stream is publishing through its own muxer;
    /// the first no-op ever seen on a track releases that track's permit on
    /// the first-output latch.
    fn output(&self, kind: MediaKind, buffer: &Bytes, timestamp: MediaTimestamp) {
        let Some(connection) = self.connection.as_ref() else {
            self.first_output.signal(kind);
            return;
        };

        let (chunk_kind, chunk_ts, stream_id, first_video) = {
            let mut inner = self.inner.lock();
            if inner.ready_state != ReadyState::Publishing(self.muxer_id) {
                drop(inner);
                self.first_output.signal(kind);
                return;
            }
            let track = match kind {
                MediaKind::Audio => &mut inner.audio,
                MediaKind::Video => &mut inner.video,
            };
            let (chunk_kind, chunk_ts) = track.chunk_timestamp(timestamp);
            let first = !track.was_sent;
            track.was_sent = true;
            (chunk_kind, chunk_ts, inner.stream_id, first && kind == MediaKind::Video)
        };

        if first_video {
            tracing::debug!("first video frame was sent");
        }

        let message = match kind {
            MediaKind::Audio => RtmpMessage::Audio {
                stream_id,
                timestamp: chunk_ts,
                payload: buffer.clone(),
            },
            MediaKind::Video => RtmpMessage::Video {
                stream_id,
                timestamp: chunk_ts,
                payload: buffer.clone(),
            },
        };
        let csid = match kind {
            MediaKind::Audio => CSID_AUDIO,
            MediaKind::Video => CSID_VIDEO,
        };
        let written = connection.do_output(RtmpChunk::new(chunk_kind, csid, message));
        self.info.add_bytes(written);
        if kind == MediaKind::Video {
            self.info.add_frame();
        }
    }
}

impl MediaSink for StreamCore {
    fn output_audio(&self, buffer: &Bytes, timestamp: MediaTimestamp) {
        self.output(MediaKind::Audio, buffer, timestamp);
    }

    fn output_video(&self, buffer: &Bytes, timestamp: MediaTimestamp) {
        self.output(MediaKind::Video, buffer, timestamp);
    }
}

impl MuxerOutput for StreamCore {
    fn current_ready_state(&self) -> ReadyState {
        self.ready_state()
    }

    fn dispatch(&self, event: StreamEvent) {
        let _ = self.events.send(event);
    }
}

/// A one-way media channel over an RTMP connection
///
/// Owns the muxer for its track pair and drives the readiness state
/// machine. Created against a live connection with [`RtmpStream::new`], as a
/// connection-less relay source with [`RtmpStream::source`], or as a relay
/// destination with [`RtmpStream::relay`].
pub struct RtmpStream {
    core: Arc<StreamCore>,
    muxer: Arc<Muxer>,
    /// Source muxer this stream forwards for, when it is a relay destination
    source: Option<Arc<Muxer>>,
    video_settings: Mutex<VideoSettings>,
    audio_settings: Mutex<AudioSettings>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<StreamEvent>>>,
}

impl RtmpStream {
    /// Create a stream on an established connection.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::build(Some(connection), None)
    }

    fn build(connection: Option<Arc<dyn Connection>>, source: Option<Arc<Muxer>>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (core, muxer) = match &source {
            // A relay destination never originates media; its muxer exists
            // only as an identity token for the output gate.
            Some(_) => {
                let muxer = Arc::new(Muxer::detached());
                let core = Arc::new(StreamCore::new(connection, muxer.id(), events_tx));
                (core, muxer)
            }
            None => {
                let muxer_id = MuxerId::next();
                let core = Arc::new(StreamCore::new(connection, muxer_id, events_tx));
                let muxer = Arc::new(Muxer::with_id(
                    muxer_id,
                    core.clone() as Arc<dyn MuxerOutput>,
                ));
                (core, muxer)
            }
        };

        Self {
            core,
            muxer,
            source,
            video_settings: Mutex::new(VideoSettings::default()),
            audio_settings: Mutex::new(AudioSettings::default()),
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Take the event receiver (once).
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<StreamEvent>> {
        self.events_rx.lock().take()
    }

    /// The muxer feeding this stream.
    pub fn muxer(&self) -> &Arc<Muxer> {
        &self.muxer
    }

    /// Stream accounting.
    pub fn info(&self) -> &StreamInfo {
        &self.core.info
    }

    /// Current readiness.
    pub fn ready_state(&self) -> ReadyState {
        self.core.ready_state()
    }

    /// The message stream id assigned by the connection.
    pub fn stream_id(&self) -> u32 {
        self.core.inner.lock().stream_id
    }

    /// Metadata sent with the most recent publish, empty before that.
    pub fn metadata(&self) -> StreamMetadata {
        self.core.inner.lock().metadata.clone()
    }

    /// Whether the peer allows audio sample access on this stream.
    pub fn audio_sample_access(&self) -> bool {
        self.core.inner.lock().audio_sample_access
    }

    /// Whether the peer allows video sample access on this stream.
    pub fn video_sample_access(&self) -> bool {
        self.core.inner.lock().video_sample_access
    }

    /// Record the peer's `|RtmpSampleAccess` announcement. Reset to allowed
    /// whenever the stream reopens.
    pub fn set_sample_access(&self, audio: bool, video: bool) {
        let mut inner = self.core.inner.lock();
        inner.audio_sample_access = audio;
        inner.video_sample_access = video;
    }

    pub fn set_video_settings(&self, settings: VideoSettings) {
        *self.video_settings.lock() = settings;
    }

    pub fn set_audio_settings(&self, settings: AudioSettings) {
        *self.audio_settings.lock() = settings;
    }

    /// This stream as a fan-out destination for another muxer.
    pub fn sink(&self) -> Arc<dyn MediaSink> {
        self.core.clone()
    }

    /// Announce the audio format from the upstream encoder.
    ///
    /// Rejected formats (nonstandard rate, bad channel count) are dropped
    /// with a notification, never escalated.
    pub fn announce_audio_format(&self, profile: AacProfile, sample_rate: u32, channels: u8) {
        match AudioSpecificConfig::new(profile, sample_rate, channels) {
            Ok(config) => self.muxer.set_audio_format(Some(config)),
            Err(e) => {
                tracing::warn!(error = %e, sample_rate, channels, "audio format rejected");
                self.core.dispatch(StreamEvent::FormatChanged {
                    kind: MediaKind::Audio,
                    accepted: false,
                });
            }
        }
    }

    /// Announce the video format from the upstream encoder.
    ///
    /// `vps` is ignored for AVC. Unsupported codecs are dropped with a
    /// notification.
    pub fn announce_video_format(
        &self,
        codec: VideoFourCc,
        vps: Vec<Bytes>,
        sps: Vec<Bytes>,
        pps: Vec<Bytes>,
    ) {
        match VideoFormat::new(codec, vps, sps, pps) {
            Ok(format) => self.muxer.set_video_format(Some(format)),
            Err(e) => {
                tracing::warn!(error = %e, "video format rejected");
                self.core.dispatch(StreamEvent::FormatChanged {
                    kind: MediaKind::Video,
                    accepted: false,
                });
            }
        }
    }

    /// Mux and (when publishing) transmit one audio sample.
    pub fn append_audio(&self, sample: &AudioSample) {
        self.muxer.append_audio(sample);
    }

    /// Mux and (when publishing) transmit one video frame.
    pub fn append_video(&self, frame: &CodedVideoFrame) {
        self.muxer.append_video(frame);
    }

    /// Request publishing under `name`. `None` closes an active publish.
    pub fn publish(&self, name: Option<&str>) {
        self.publish_typed(name, PublishType::Live);
    }

    /// Request publishing with an explicit publish type.
    pub fn publish_typed(&self, name: Option<&str>, publish_type: PublishType) {
        let Some(name) = name else {
            if self.ready_state().is_beyond_open() {
                self.close();
            }
            return;
        };

        {
            let mut inner = self.core.inner.lock();
            // Re-publishing the same resource only updates the type
            if inner.ready_state == ReadyState::Publishing(self.core.muxer_id)
                && self.core.info.resource_name().as_deref() == Some(name)
            {
                inner.publish_type = publish_type;
                return;
            }
            inner.publish_type = publish_type;
            self.core.info.set_resource_name(Some(name.to_string()));

            if inner.ready_state == ReadyState::Idle {
                inner.pending.push(PendingCommand::Publish {
                    name: name.to_string(),
                });
                return;
            }
        }

        self.transition(ReadyState::Publish);
        let (stream_id, publish_type) = {
            let inner = self.core.inner.lock();
            (inner.stream_id, inner.publish_type)
        };
        self.send_command(CommandMessage::publish(
            stream_id,
            name,
            publish_type.as_str(),
        ));
    }

    /// Request playback of `name`. `None` closes an active play.
    pub fn play(&self, name: Option<&str>) {
        let Some(name) = name else {
            if matches!(self.ready_state(), ReadyState::Play | ReadyState::Playing) {
                self.core.info.set_resource_name(None);
                self.close();
            }
            return;
        };

        {
            let mut inner = self.core.inner.lock();
            self.core.info.set_resource_name(Some(name.to_string()));
            if inner.ready_state == ReadyState::Idle {
                inner.pending.push(PendingCommand::Play {
                    name: name.to_string(),
                });
                return;
            }
        }

        self.transition(ReadyState::Play);
        let stream_id = self.core.inner.lock().stream_id;
        self.send_command(CommandMessage::play(stream_id, name));
    }

    /// Stop playing or publishing and return the stream to `Open`.
    pub fn close(&self) {
        let (beyond, stream_id) = {
            let inner = self.core.inner.lock();
            (inner.ready_state.is_beyond_open(), inner.stream_id)
        };
        self.transition(ReadyState::Open);
        if beyond {
            self.send_command(CommandMessage::close_stream(stream_id));
        }
    }

    /// The connection allocated a message stream for us.
    pub fn on_stream_created(&self, stream_id: u32) {
        self.core.inner.lock().stream_id = stream_id;
        self.transition(ReadyState::Open);
    }

    /// Feed a status notification from the connection.
    pub fn on_status(&self, code: StatusCode) {
        self.core.dispatch(StreamEvent::Status(code));
        match code {
            StatusCode::ConnectSuccess => self.transition(ReadyState::Idle),
            StatusCode::PlayReset => self.transition(ReadyState::Play),
            StatusCode::PlayStart => self.transition(ReadyState::Playing),
            StatusCode::PublishStart => {
                self.transition(ReadyState::Publishing(self.core.muxer_id))
            }
            _ => {}
        }
    }

    /// Build onMetaData fields from the muxer's cached formats and the
    /// configured encoder settings.
    pub fn make_metadata(&self) -> StreamMetadata {
        let mut metadata = StreamMetadata::default();

        if let Some(format) = self.muxer.video_format() {
            let settings = *self.video_settings.lock();
            metadata.width = Some(settings.width);
            metadata.height = Some(settings.height);
            metadata.framerate = Some(settings.frame_rate);
            metadata.video_data_rate = Some(settings.bit_rate as f64 / 1000.0);
            match format {
                VideoFormat::Avc(_) => {
                    metadata.video_codec_id = Some(crate::media::flv::VideoCodec::Avc as u8)
                }
                VideoFormat::Hevc(_) => {
                    metadata.video_fourcc = Some(VideoFourCc::HEVC_FOURCC)
                }
            }
        }

        if let Some(config) = self.muxer.audio_format() {
            let settings = *self.audio_settings.lock();
            metadata.audio_codec_id = Some(crate::media::flv::AudioCodec::Aac as u8);
            metadata.audio_data_rate = Some(settings.bit_rate as f64 / 1000.0);
            metadata.audio_sample_rate = Some(config.sampling_frequency as f64);
        }

        metadata
    }

    /// Serialized state transition with side effects run outside the lock.
    fn transition(&self, next: ReadyState) {
        let prev = {
            let mut inner = self.core.inner.lock();
            let prev = inner.ready_state;
            if prev == next {
                return;
            }
            inner.ready_state = next;
            prev
        };

        tracing::debug!(?prev, ?next, "ready state changed");
        self.core.dispatch(StreamEvent::ReadyStateChanged(next));

        // Leaving an active publish announces the unpublish first
        if matches!(prev, ReadyState::Publishing(_)) {
            if let Some(name) = self.core.info.resource_name() {
                self.send_command(CommandMessage::fc_unpublish(&name));
            }
        }

        match next {
            ReadyState::Open => self.did_open(),
            ReadyState::Play => {
                let mut inner = self.core.inner.lock();
                inner.started_at = Instant::now();
                inner.audio.reset();
                inner.video.reset();
            }
            ReadyState::Publish => {
                {
                    let mut inner = self.core.inner.lock();
                    inner.started_at = Instant::now();
                    inner.audio.reset();
                    inner.video.reset();
                }
                if let Some(name) = self.core.info.resource_name() {
                    self.send_command(CommandMessage::fc_publish(&name));
                }
            }
            ReadyState::Publishing(_) => self.did_start_publishing(),
            _ => {}
        }
    }

    /// `Idle -> Open`: reset session counters and flush queued commands.
    fn did_open(&self) {
        let pending = {
            let mut inner = self.core.inner.lock();
            inner.audio_sample_access = true;
            inner.video_sample_access = true;
            inner.metadata = StreamMetadata::default();
            std::mem::take(&mut inner.pending)
        };
        self.core.info.clear();

        for command in pending {
            match command {
                PendingCommand::Play { name } => {
                    self.transition(ReadyState::Play);
                    let stream_id = self.core.inner.lock().stream_id;
                    self.send_command(CommandMessage::play(stream_id, &name));
                }
                PendingCommand::Publish { name } => {
                    self.transition(ReadyState::Publish);
                    let (stream_id, publish_type) = {
                        let inner = self.core.inner.lock();
                        (inner.stream_id, inner.publish_type)
                    };
                    self.send_command(CommandMessage::publish(
                        stream_id,
                        &name,
                        publish_type.as_str(),
                    ));
                }
            }
        }
    }

    /// `-> Publishing`: push metadata, start the muxer, and register on the
    /// source muxer when this stream relays another.
    fn did_start_publishing(&self) {
        let metadata = self.make_metadata();
        self.core.inner.lock().metadata = metadata.clone();
        self.push_metadata(metadata);

        self.muxer.start_running();

        if let Some(root) = &self.source {
            // Only now: sequence-header catch-up must not replay before this
            // stream can actually forward it
            let sink: Arc<dyn MediaSink> = self.core.clone();
            root.add_sink(&sink);
            tracing::info!("relay attached to source muxer");
        }
    }

    fn push_metadata(&self, metadata: StreamMetadata) {
        let Some(connection) = self.core.connection.as_ref() else {
            return;
        };
        let (stream_id, timestamp) = {
            let inner = self.core.inner.lock();
            (
                inner.stream_id,
                inner.started_at.elapsed().as_millis() as u32,
            )
        };
        let written = connection.do_output(RtmpChunk::new(
            ChunkKind::Type0,
            CSID_DATA,
            RtmpMessage::Data {
                stream_id,
                timestamp,
                handler: CMD_SET_DATA_FRAME.to_string(),
                name: CMD_ON_METADATA.to_string(),
                metadata,
            },
        ));
        self.core.info.add_bytes(written);
    }

    fn send_command(&self, command: CommandMessage) {
        let Some(connection) = self.core.connection.as_ref() else {
            return;
        };
        let written = connection.do_output(RtmpChunk::new(
            ChunkKind::Type0,
            CSID_COMMAND,
            RtmpMessage::Command(command),
        ));
        self.core.info.add_bytes(written);
    }
}

impl Drop for RtmpStream {
    fn drop(&mut self) {
        self.muxer.stop_running();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::avc::AvcConfig;

    struct MockConnection {
        chunks: Mutex<Vec<RtmpChunk>>,
    }

    impl MockConnection {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                chunks: Mutex::new(Vec::new()),
            })
        }

        fn chunks(&self) -> Vec<RtmpChunk> {
            self.chunks.lock().clone()
        }

        fn media_chunks(&self) -> Vec<RtmpChunk> {
            self.chunks()
                .into_iter()
                .filter(|c| {
                    matches!(
                        c.message,
                        RtmpMessage::Audio { .. } | RtmpMessage::Video { .. }
                    )
                })
                .collect()
        }

        fn command_names(&self) -> Vec<String> {
            self.chunks()
                .iter()
                .filter_map(|c| match &c.message {
                    RtmpMessage::Command(cmd) => Some(cmd.name.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Connection for MockConnection {
        fn do_output(&self, chunk: RtmpChunk) -> usize {
            let n = chunk.message.payload_len() + 12;
            self.chunks.lock().push(chunk);
            n
        }
    }

    fn aac_config() -> AudioSpecificConfig {
        AudioSpecificConfig::new(AacProfile::Lc, 44100, 2).unwrap()
    }

    fn avc_format() -> VideoFormat {
        let sps = vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])];
        let pps = vec![Bytes::from_static(&[0x68, 0xEF, 0x38])];
        VideoFormat::Avc(AvcConfig::from_parameter_sets(sps, pps).unwrap())
    }

    fn audio_sample(timestamp: f64) -> AudioSample {
        AudioSample {
            data: Bytes::from_static(&[0x21, 0x00]),
            timestamp,
        }
    }

    /// Walk a stream to `Publishing` the way a connection would.
    fn start_publishing(stream: &RtmpStream) {
        stream.publish(Some("key"));
        stream.on_stream_created(1);
        stream.on_status(StatusCode::PublishStart);
    }

    #[test]
    fn test_publish_while_idle_queues_until_open() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());

        stream.publish(Some("key"));
        assert_eq!(stream.ready_state(), ReadyState::Idle);
        assert!(connection.chunks().is_empty());

        stream.on_stream_created(9);
        assert_eq!(stream.ready_state(), ReadyState::Publish);
        assert_eq!(stream.stream_id(), 9);

        // FCPublish announced before the publish command itself
        assert_eq!(connection.command_names(), vec!["FCPublish", "publish"]);
    }

    #[test]
    fn test_publish_after_open_sends_immediately() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        stream.on_stream_created(1);

        stream.publish(Some("key"));
        assert_eq!(stream.ready_state(), ReadyState::Publish);
        let names = connection.command_names();
        assert!(names.contains(&"publish".to_string()));
        assert_eq!(stream.info().resource_name().as_deref(), Some("key"));
    }

    #[test]
    fn test_publish_start_status_moves_to_publishing() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);

        assert_eq!(
            stream.ready_state(),
            ReadyState::Publishing(stream.muxer().id())
        );
        assert!(stream.muxer().is_running());
    }

    #[test]
    fn test_metadata_pushed_on_publishing() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);

        let data: Vec<_> = connection
            .chunks()
            .into_iter()
            .filter_map(|c| match c.message {
                RtmpMessage::Data { handler, name, .. } => Some((handler, name)),
                _ => None,
            })
            .collect();
        assert_eq!(
            data,
            vec![("@setDataFrame".to_string(), "onMetaData".to_string())]
        );
    }

    #[test]
    fn test_nothing_transmits_before_publishing() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        stream.publish(Some("key"));
        stream.on_stream_created(1);

        stream.muxer().start_running();
        stream.muxer().set_audio_format(Some(aac_config()));
        stream.append_audio(&audio_sample(0.0));

        assert!(connection.media_chunks().is_empty());
    }

    #[test]
    fn test_publish_flow_chunk_types() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);

        stream.muxer().set_audio_format(Some(aac_config()));
        stream.append_audio(&audio_sample(23.0));
        stream.append_audio(&audio_sample(46.0));

        let media = connection.media_chunks();
        assert_eq!(media.len(), 3);

        // Sequence header: first chunk on the track, absolute 0
        assert_eq!(media[0].kind, ChunkKind::Type0);
        let RtmpMessage::Audio {
            timestamp, payload, ..
        } = &media[0].message
        else {
            panic!("expected audio");
        };
        assert_eq!(*timestamp, 0);
        assert_eq!(&payload[..2], &[0xAF, 0x00]);

        // First data sample: timing was Reset, so absolute 23
        assert_eq!(media[1].kind, ChunkKind::Type0);
        let RtmpMessage::Audio { timestamp, .. } = &media[1].message else {
            panic!("expected audio");
        };
        assert_eq!(*timestamp, 23);

        // Second data sample: delta
        assert_eq!(media[2].kind, ChunkKind::Type1);
        let RtmpMessage::Audio { timestamp, .. } = &media[2].message else {
            panic!("expected audio");
        };
        assert_eq!(*timestamp, 23);
    }

    #[test]
    fn test_fractional_delta_carry() {
        let mut track = TrackOutput::default();
        track.was_sent = true;

        let (_, a) = track.chunk_timestamp(MediaTimestamp::Delta(33.3));
        let (_, b) = track.chunk_timestamp(MediaTimestamp::Delta(33.3));
        let (_, c) = track.chunk_timestamp(MediaTimestamp::Delta(33.4));
        assert_eq!((a, b, c), (33, 33, 34));
        assert_eq!(a + b + c, 100);
    }

    #[test]
    fn test_identity_gated_transmission() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);

        // A muxer that is not this stream's own writes into the same core
        let foreign = Muxer::new(stream.core.clone() as Arc<dyn MuxerOutput>);
        foreign.start_running();
        foreign.set_audio_format(Some(aac_config()));
        foreign.append_audio(&audio_sample(0.0));

        assert!(connection.media_chunks().is_empty());

        // While the stream's own muxer still transmits
        stream.muxer().set_audio_format(Some(aac_config()));
        assert_eq!(connection.media_chunks().len(), 1);
    }

    #[test]
    fn test_close_returns_to_open_and_sends_close_stream() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);

        stream.close();
        assert_eq!(stream.ready_state(), ReadyState::Open);
        let names = connection.command_names();
        // Unpublish announced on the way out
        assert!(names.contains(&"FCUnpublish".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("closeStream"));
    }

    #[test]
    fn test_close_below_open_sends_nothing() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        stream.close();
        assert_eq!(stream.ready_state(), ReadyState::Open);
        assert!(connection.command_names().is_empty());
    }

    #[test]
    fn test_republish_same_name_only_updates_type() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);
        let commands_before = connection.command_names().len();

        stream.publish_typed(Some("key"), PublishType::Record);
        assert_eq!(connection.command_names().len(), commands_before);
        assert_eq!(
            stream.ready_state(),
            ReadyState::Publishing(stream.muxer().id())
        );
    }

    #[test]
    fn test_publish_none_closes_active_publish() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);

        stream.publish(None);
        assert_eq!(stream.ready_state(), ReadyState::Open);
    }

    #[test]
    fn test_play_flow() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        stream.play(Some("show"));
        assert_eq!(stream.ready_state(), ReadyState::Idle); // queued

        stream.on_stream_created(2);
        assert_eq!(stream.ready_state(), ReadyState::Play);
        assert!(connection.command_names().contains(&"play".to_string()));

        stream.on_status(StatusCode::PlayStart);
        assert_eq!(stream.ready_state(), ReadyState::Playing);
    }

    #[test]
    fn test_events_emitted() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        let mut events = stream.take_events().unwrap();
        assert!(stream.take_events().is_none());

        start_publishing(&stream);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&StreamEvent::ReadyStateChanged(ReadyState::Open)));
        assert!(seen.contains(&StreamEvent::Status(StatusCode::PublishStart)));
        assert!(seen
            .iter()
            .any(|e| matches!(e, StreamEvent::ReadyStateChanged(ReadyState::Publishing(_)))));
    }

    #[test]
    fn test_rejected_formats_notify() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        let mut events = stream.take_events().unwrap();

        stream.announce_audio_format(AacProfile::Lc, 44000, 2);
        stream.announce_video_format(VideoFourCc::Av1, vec![], vec![], vec![]);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                StreamEvent::FormatChanged {
                    kind: MediaKind::Audio,
                    accepted: false
                },
                StreamEvent::FormatChanged {
                    kind: MediaKind::Video,
                    accepted: false
                },
            ]
        );
    }

    #[test]
    fn test_metadata_from_formats_and_settings() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        stream.set_video_settings(VideoSettings {
            width: 1920,
            height: 1080,
            frame_rate: 60.0,
            bit_rate: 6_000_000,
        });
        stream.muxer().start_running();
        stream.muxer().set_audio_format(Some(aac_config()));
        stream.muxer().set_video_format(Some(avc_format()));

        let metadata = stream.make_metadata();
        assert_eq!(metadata.width, Some(1920));
        assert_eq!(metadata.height, Some(1080));
        assert_eq!(metadata.framerate, Some(60.0));
        assert_eq!(metadata.video_codec_id, Some(7));
        assert_eq!(metadata.video_data_rate, Some(6000.0));
        assert_eq!(metadata.audio_codec_id, Some(10));
        assert_eq!(metadata.audio_sample_rate, Some(44100.0));
    }

    #[test]
    fn test_byte_accounting_from_do_output() {
        let connection = MockConnection::new();
        let stream = RtmpStream::new(connection.clone());
        start_publishing(&stream);
        let base = stream.info().byte_count();

        stream.muxer().set_audio_format(Some(aac_config()));
        // Header payload is 4 bytes, mock charges payload + 12
        assert_eq!(stream.info().byte_count(), base + 16);
    }
}
