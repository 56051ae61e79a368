//! Fan-out destination sinks
//!
//! A muxer replicates every built buffer to a set of secondary destinations.
//! Sinks are held weakly: a destination that is torn down simply stops
//! upgrading and is pruned on the next snapshot, it is never owned or
//! force-removed by the muxer.
//!
//! The set is locked only for add/remove/snapshot. Transmission iterates a
//! snapshot so a slow sink can never stall the producer or other sinks, and
//! a sink added concurrently with an in-flight fan-out may or may not see
//! that particular buffer but always gets the cached catch-up buffers on
//! registration.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::timing::MediaTimestamp;

/// A destination for already-framed media buffers
///
/// Implementors receive each buffer exactly once per fan-out, in the
/// producer's build order within a lane. Audio and video are independent
/// lanes with no cross-lane ordering guarantee.
pub trait MediaSink: Send + Sync {
    /// Deliver a framed audio payload.
    fn output_audio(&self, buffer: &bytes::Bytes, timestamp: MediaTimestamp);

    /// Deliver a framed video payload.
    fn output_video(&self, buffer: &bytes::Bytes, timestamp: MediaTimestamp);
}

/// Ordered, mutex-guarded collection of weak sink references
#[derive(Default)]
pub struct SinkSet {
    sinks: Mutex<Vec<Weak<dyn MediaSink>>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Registration order is fan-out order.
    pub fn add(&self, sink: &Arc<dyn MediaSink>) {
        self.sinks.lock().push(Arc::downgrade(sink));
    }

    /// Remove a sink by identity. Dead entries are dropped as a side effect.
    pub fn remove(&self, sink: &Arc<dyn MediaSink>) {
        self.sinks
            .lock()
            .retain(|w| w.upgrade().is_some_and(|s| !Arc::ptr_eq(&s, sink)));
    }

    /// Snapshot the live sinks in registration order, pruning dead entries.
    pub fn snapshot(&self) -> Vec<Arc<dyn MediaSink>> {
        let mut sinks = self.sinks.lock();
        sinks.retain(|w| w.strong_count() > 0);
        sinks.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of registered (possibly dead) entries.
    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.lock().is_empty()
    }
}
