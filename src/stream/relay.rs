//! Connection-less source streams and relay destinations
//!
//! Multi-destination publishing splits one encode into:
//! - a **source** stream: no connection, forced into `Publishing` so its
//!   muxer builds and fans out buffers; every primary transmit is a no-op
//! - one or more **relay** streams: each over its own connection, attached
//!   as a sink on the source muxer once it is actually ready to forward
//!
//! The source constructor hands back a [`SourceReady`] signal that resolves
//! after the muxer has attempted output once on each track and found no
//! publishing target (two permits, audio and video, each released exactly
//! once). That is the point where the source is safe to hand to relays.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::connection::Connection;
use crate::mux::MediaKind;

use super::{ReadyState, RtmpStream, StreamCore};

/// Two-permit latch released by the first audio and first video no-op
pub(crate) struct FirstOutputGate {
    audio: AtomicBool,
    video: AtomicBool,
    notify: Notify,
}

impl FirstOutputGate {
    pub(crate) fn new() -> Self {
        Self {
            audio: AtomicBool::new(false),
            video: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Release the permit for one track. Only the first call per track has
    /// an effect.
    pub(crate) fn signal(&self, kind: MediaKind) {
        let flag = match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        };
        if flag.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(?kind, "first output attempt observed");
        if self.is_complete() {
            self.notify.notify_waiters();
        }
    }

    fn is_complete(&self) -> bool {
        self.audio.load(Ordering::SeqCst) && self.video.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before the completeness check so a signal landing in
            // between still wakes us
            notified.as_mut().enable();
            if self.is_complete() {
                return;
            }
            notified.await;
        }
    }
}

/// Completion signal for a connection-less source stream
///
/// Resolves once the source muxer has attempted output on both tracks,
/// i.e. formats are flowing and relays can attach with full catch-up.
pub struct SourceReady {
    core: Arc<StreamCore>,
}

impl SourceReady {
    /// Wait until both tracks have hit the output gate once.
    pub async fn wait(&self) {
        self.core.first_output.wait().await;
    }
}

impl RtmpStream {
    /// Create a connection-less source stream.
    ///
    /// Its sole purpose is to run a muxer whose buffers are forwarded to
    /// attached relay streams; nothing is transmitted directly. The stream
    /// enters `Publishing` immediately so format changes build sequence
    /// headers and fan out.
    pub fn source() -> (Self, SourceReady) {
        let stream = Self::build(None, None);
        let ready = SourceReady {
            core: stream.core.clone(),
        };
        tracing::debug!("source stream forced into publishing");
        stream.transition(ReadyState::Publishing(stream.core.muxer_id));
        (stream, ready)
    }

    /// Create a stream that republishes `source`'s encoded media over
    /// `connection`, with no re-encoding.
    ///
    /// The relay registers itself on the source muxer when it reaches
    /// `Publishing`; at that point it receives the cached sequence-header
    /// catch-up and starts forwarding.
    ///
    /// # Panics
    ///
    /// Panics if `source` has an upstream connection of its own. A relay
    /// must point at a connection-less source; anything else means the
    /// stream graph is miswired and no recovery is possible.
    pub fn relay(connection: Arc<dyn Connection>, source: &RtmpStream) -> Self {
        if source.core.connection.is_some() {
            panic!("relay source stream has an upstream connection");
        }
        Self::build(Some(connection), Some(source.muxer.clone()))
    }
}
