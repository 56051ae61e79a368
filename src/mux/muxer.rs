//! Outbound media muxer
//!
//! One muxer translates a single track pair (audio, video) of encoded
//! samples into framed RTMP payloads and pushes them through its primary
//! output plus any number of secondary sinks. It owns the per-track timing
//! state, the cached codec formats, and the cached first-sent sequence
//! header buffers that let late-attached sinks start decoding without
//! waiting for the next format change.
//!
//! The muxer never decides on its own whether media actually leaves the
//! process: the primary output gates transmission on the owning stream's
//! ready state, compared against this muxer's identity token.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::media::{AudioSpecificConfig, VideoFormat};
use crate::stream::state::ReadyState;
use crate::stream::StreamEvent;

use super::frame;
use super::sink::{MediaSink, SinkSet};
use super::timing::{MediaTimestamp, TimingTracker};
use super::{AudioSample, CodedVideoFrame, MediaKind};

static NEXT_MUXER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity token for a muxer
///
/// `ReadyState::Publishing` carries one of these so that transmission can
/// assert "publishing through our own muxer" rather than "some publish is
/// active". Equality compares the token only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MuxerId(u64);

impl MuxerId {
    pub(crate) fn next() -> Self {
        MuxerId(NEXT_MUXER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Primary output capability handed to a muxer at construction
///
/// Read-only view of the owning stream: where buffers go, what the current
/// ready state is, and where notifications are dispatched. This replaces a
/// back-reference to the stream and keeps the dependency direction explicit.
pub trait MuxerOutput: MediaSink {
    /// Ready state of the owning stream, for transmit gating.
    fn current_ready_state(&self) -> ReadyState;

    /// Surface a notification to application code.
    fn dispatch(&self, event: StreamEvent);
}

/// Output that reports `Idle` and discards everything.
///
/// Backs [`Muxer::detached`]: a relay destination needs a muxer identity for
/// ready-state comparison but must never originate media of its own.
struct DiscardOutput;

impl MediaSink for DiscardOutput {
    fn output_audio(&self, _buffer: &Bytes, _timestamp: MediaTimestamp) {}
    fn output_video(&self, _buffer: &Bytes, _timestamp: MediaTimestamp) {}
}

impl MuxerOutput for DiscardOutput {
    fn current_ready_state(&self) -> ReadyState {
        ReadyState::Idle
    }

    fn dispatch(&self, _event: StreamEvent) {}
}

#[derive(Default)]
struct MuxState {
    audio_format: Option<AudioSpecificConfig>,
    video_format: Option<VideoFormat>,
    timing: TimingTracker,
    first_audio_buffer: Option<Bytes>,
    first_video_buffer: Option<Bytes>,
}

/// Single-stream media muxer with multi-destination fan-out
pub struct Muxer {
    id: MuxerId,
    target: Arc<dyn MuxerOutput>,
    running: AtomicBool,
    state: Mutex<MuxState>,
    sinks: SinkSet,
}

impl Muxer {
    /// Create a muxer writing to `target`.
    pub fn new(target: Arc<dyn MuxerOutput>) -> Self {
        Self::with_id(MuxerId::next(), target)
    }

    /// Create a muxer under a pre-allocated identity token.
    pub(crate) fn with_id(id: MuxerId, target: Arc<dyn MuxerOutput>) -> Self {
        Self {
            id,
            target,
            running: AtomicBool::new(false),
            state: Mutex::new(MuxState::default()),
            sinks: SinkSet::new(),
        }
    }

    /// Create an inert muxer that only provides an identity token.
    pub fn detached() -> Self {
        Self::new(Arc::new(DiscardOutput))
    }

    /// This muxer's identity token.
    pub fn id(&self) -> MuxerId {
        self.id
    }

    /// Cached audio format, if the source has announced one.
    pub fn audio_format(&self) -> Option<AudioSpecificConfig> {
        self.state.lock().audio_format.clone()
    }

    /// Cached video format, if the source has announced one.
    pub fn video_format(&self) -> Option<VideoFormat> {
        self.state.lock().video_format.clone()
    }

    /// Announce a new (or cleared) audio format.
    ///
    /// When the owning stream is publishing through this muxer, the AAC
    /// sequence header is rebuilt, transmitted to the primary output and
    /// every attached sink, and cached as the audio catch-up buffer.
    /// Otherwise the format is only cached.
    pub fn set_audio_format(&self, format: Option<AudioSpecificConfig>) {
        let ready = self.target.current_ready_state();
        self.state.lock().audio_format = format.clone();

        match ready {
            ReadyState::Publishing(id) if id == self.id => {
                let Some(config) = format else {
                    return;
                };
                let buffer = frame::audio_sequence_header(&config.bytes());
                tracing::debug!(
                    sample_rate = config.sampling_frequency,
                    channels = config.channel_configuration,
                    "audio sequence header sent"
                );
                self.transmit_audio(&buffer, MediaTimestamp::Delta(0.0));
                self.state.lock().first_audio_buffer = Some(buffer);
                self.target.dispatch(StreamEvent::FormatChanged {
                    kind: MediaKind::Audio,
                    accepted: true,
                });
            }
            ReadyState::Playing => {
                tracing::trace!("audio format changed while playing");
            }
            _ => {}
        }
    }

    /// Announce a new (or cleared) video format.
    ///
    /// Same contract as [`Muxer::set_audio_format`] for the video track.
    /// While playing, a video format change surfaces a dimension-change
    /// notification instead of transmitting anything.
    pub fn set_video_format(&self, format: Option<VideoFormat>) {
        let ready = self.target.current_ready_state();
        self.state.lock().video_format = format.clone();

        match ready {
            ReadyState::Publishing(id) if id == self.id => {
                let Some(format) = format else {
                    return;
                };
                let buffer = frame::video_sequence_header(&format);
                tracing::debug!(codec = %format.codec().fourcc(), "video sequence header sent");
                self.transmit_video(&buffer, MediaTimestamp::Delta(0.0));
                self.state.lock().first_video_buffer = Some(buffer);
                self.target.dispatch(StreamEvent::FormatChanged {
                    kind: MediaKind::Video,
                    accepted: true,
                });
            }
            ReadyState::Playing => {
                self.target.dispatch(StreamEvent::VideoDimensionChanged);
            }
            _ => {}
        }
    }

    /// Mux one audio sample.
    ///
    /// Drops silently when the muxer is stopped, the sequence header for the
    /// current format epoch has not been sent, or the sample is out of
    /// order.
    pub fn append_audio(&self, sample: &AudioSample) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        if sample.data.is_empty() {
            return;
        }

        let timestamp = {
            let mut state = self.state.lock();
            if state.first_audio_buffer.is_none() {
                tracing::trace!("audio sample before sequence header, dropped");
                return;
            }
            match state.timing.audio.advance(sample.timestamp) {
                Some(ts) => ts,
                None => {
                    tracing::debug!(
                        timestamp = sample.timestamp,
                        "non-monotonic audio timestamp, frame dropped"
                    );
                    return;
                }
            }
        };

        let buffer = frame::audio_data(&sample.data);
        self.transmit_audio(&buffer, timestamp);
    }

    /// Mux one coded video frame.
    ///
    /// Drops silently on the same conditions as [`Muxer::append_audio`],
    /// plus unsupported codecs.
    pub fn append_video(&self, video_frame: &CodedVideoFrame) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        if video_frame.data.is_empty() {
            return;
        }
        if !video_frame.codec.is_supported() {
            tracing::warn!(codec = %video_frame.codec.fourcc(), "unsupported video codec, frame dropped");
            return;
        }

        let (timestamp, composition_time) = {
            let mut state = self.state.lock();
            if state.first_video_buffer.is_none() {
                tracing::trace!("video frame before sequence header, dropped");
                return;
            }
            let composition_time = state.timing.composition_time(
                video_frame.decode_timestamp,
                video_frame.presentation_timestamp,
            );
            match state
                .timing
                .video
                .advance(video_frame.effective_decode_timestamp())
            {
                Some(ts) => (ts, composition_time),
                None => {
                    tracing::debug!(
                        timestamp = video_frame.effective_decode_timestamp(),
                        "non-monotonic video timestamp, frame dropped"
                    );
                    return;
                }
            }
        };

        let buffer = match frame::video_frame(
            video_frame.codec,
            video_frame.keyframe,
            composition_time,
            &video_frame.data,
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!(error = %e, "video frame rejected");
                return;
            }
        };
        self.transmit_video(&buffer, timestamp);
    }

    /// Attach a secondary destination.
    ///
    /// The sink immediately receives the cached audio and video sequence
    /// header buffers (whichever exist) at delta timestamp 0 so it can
    /// decode future data frames. When no video header is cached yet the
    /// sink starts audio-only and picks video up on the next format cycle.
    pub fn add_sink(&self, sink: &Arc<dyn MediaSink>) {
        self.sinks.add(sink);

        let (audio, video) = {
            let state = self.state.lock();
            (
                state.first_audio_buffer.clone(),
                state.first_video_buffer.clone(),
            )
        };

        if let Some(buffer) = audio {
            tracing::debug!("replaying audio sequence header to new sink");
            sink.output_audio(&buffer, MediaTimestamp::Delta(0.0));
        }
        if let Some(buffer) = video {
            tracing::debug!("replaying video sequence header to new sink");
            sink.output_video(&buffer, MediaTimestamp::Delta(0.0));
        } else {
            tracing::debug!("no video sequence header cached yet, sink starts audio-only");
        }
    }

    /// Detach a previously attached sink.
    pub fn remove_sink(&self, sink: &Arc<dyn MediaSink>) {
        self.sinks.remove(sink);
    }

    /// Start muxing. Idempotent; resets both track clocks and clears cached
    /// formats so the source re-announces them.
    pub fn start_running(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clear_state();
        tracing::debug!("muxer started");
    }

    /// Stop muxing. Idempotent; clears cached formats and timing state and
    /// does not wait for in-flight fan-out.
    pub fn stop_running(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.clear_state();
        tracing::debug!("muxer stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn clear_state(&self) {
        let mut state = self.state.lock();
        state.timing.reset();
        state.audio_format = None;
        state.video_format = None;
        state.first_audio_buffer = None;
        state.first_video_buffer = None;
    }

    /// Primary transmit first, then the sink snapshot in registration order.
    fn transmit_audio(&self, buffer: &Bytes, timestamp: MediaTimestamp) {
        self.target.output_audio(buffer, timestamp);
        for sink in self.sinks.snapshot() {
            sink.output_audio(buffer, timestamp);
        }
    }

    fn transmit_video(&self, buffer: &Bytes, timestamp: MediaTimestamp) {
        self.target.output_video(buffer, timestamp);
        for sink in self.sinks.snapshot() {
            sink.output_video(buffer, timestamp);
        }
    }
}
