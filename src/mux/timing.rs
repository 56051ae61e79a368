//! Per-track timestamp reconciliation
//!
//! RTMP chunk timestamps are absolute on the first chunk of a track and
//! deltas thereafter. Each track runs a tiny two-state clock: `Reset` until
//! the first sample is emitted (absolute, chunk type 0), then `Running`
//! (delta, chunk type 1). A delta that would come out negative means the
//! source delivered out of order or was reset underneath us; the frame is
//! dropped instead of emitting corrupt timing, and the clock is left alone
//! so the next in-order sample recovers.
//!
//! Video additionally needs a composition-time offset when B-frames reorder
//! presentation relative to decode order; that is computed against the last
//! emitted video time plus a fixed lookahead tolerance.

/// Timestamp to attach to an outbound buffer, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaTimestamp {
    /// Full timestamp; the first chunk of a track since a reset
    Absolute(f64),
    /// Offset from the previous chunk on the same track
    Delta(f64),
}

impl MediaTimestamp {
    /// The raw millisecond value regardless of mode.
    pub fn value(&self) -> f64 {
        match self {
            MediaTimestamp::Absolute(v) | MediaTimestamp::Delta(v) => *v,
        }
    }
}

/// Fixed composition-time lookahead: 3 frames at 30 fps, in milliseconds.
///
/// Tolerates B-frame reordering latency relative to the last emitted
/// reference video time.
const COMPOSITION_TIME_OFFSET: f64 = 100.0;

/// Two-state monotonic clock for one track
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TrackTimer {
    /// No chunk emitted yet; the next one carries an absolute timestamp
    #[default]
    Reset,
    /// Delta mode; `last` is the absolute time of the previous emitted chunk
    Running { last: f64 },
}

impl TrackTimer {
    /// Advance the clock to `timestamp` (absolute milliseconds).
    ///
    /// Returns the timestamp to emit, or `None` when the sample is out of
    /// order and must be dropped.
    pub fn advance(&mut self, timestamp: f64) -> Option<MediaTimestamp> {
        match *self {
            TrackTimer::Reset => {
                *self = TrackTimer::Running { last: timestamp };
                Some(MediaTimestamp::Absolute(timestamp))
            }
            TrackTimer::Running { last } => {
                let delta = timestamp - last;
                if delta < 0.0 {
                    return None;
                }
                *self = TrackTimer::Running { last: timestamp };
                Some(MediaTimestamp::Delta(delta))
            }
        }
    }

    /// Absolute time of the last emitted chunk, if any.
    pub fn last(&self) -> Option<f64> {
        match self {
            TrackTimer::Reset => None,
            TrackTimer::Running { last } => Some(*last),
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, TrackTimer::Reset)
    }
}

/// Clock pair for one muxer: independent audio and video lanes
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingTracker {
    pub audio: TrackTimer,
    pub video: TrackTimer,
}

impl TimingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composition-time offset in milliseconds for a video frame.
    ///
    /// Zero when the encoder reports no decode timestamp or decode equals
    /// presentation (no B-frames). Otherwise the presentation skew against
    /// the last emitted video time, padded by the fixed lookahead. Must be
    /// called before [`TrackTimer::advance`] moves the video clock to this
    /// frame.
    pub fn composition_time(&self, decode: Option<f64>, presentation: f64) -> i32 {
        let Some(decode) = decode else {
            return 0;
        };
        if decode == presentation {
            return 0;
        }
        let reference = self.video.last().unwrap_or(0.0);
        (presentation - reference + COMPOSITION_TIME_OFFSET).round() as i32
    }

    /// Return both tracks to `Reset`.
    pub fn reset(&mut self) {
        self.audio = TrackTimer::Reset;
        self.video = TrackTimer::Reset;
    }
}
