//! Stream statistics
//!
//! Provides observability into outbound streams: bytes written to the
//! connection, frames sent, and polled rates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

/// Per-stream accounting, fed by `Connection::do_output` return values
///
/// All counters are atomics so the output path never blocks on readers.
#[derive(Debug)]
pub struct StreamInfo {
    byte_count: AtomicU64,
    frame_count: AtomicU64,
    rates: Mutex<RateWindow>,
    resource_name: Mutex<Option<String>>,
}

#[derive(Debug)]
struct RateWindow {
    last_polled: Instant,
    last_byte_count: u64,
    last_frame_count: u64,
    bytes_per_second: u64,
    frames_per_second: u64,
}

impl Default for StreamInfo {
    fn default() -> Self {
        Self {
            byte_count: AtomicU64::new(0),
            frame_count: AtomicU64::new(0),
            rates: Mutex::new(RateWindow {
                last_polled: Instant::now(),
                last_byte_count: 0,
                last_frame_count: 0,
                bytes_per_second: 0,
                frames_per_second: 0,
            }),
            resource_name: Mutex::new(None),
        }
    }
}

impl StreamInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record bytes written to the connection.
    pub fn add_bytes(&self, n: usize) {
        self.byte_count.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Record one transmitted video frame.
    pub fn add_frame(&self) {
        self.frame_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Total bytes written to the connection.
    pub fn byte_count(&self) -> u64 {
        self.byte_count.load(Ordering::Relaxed)
    }

    /// Total video frames transmitted.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Resource name of the active publish/play, if any.
    pub fn resource_name(&self) -> Option<String> {
        self.resource_name.lock().clone()
    }

    pub fn set_resource_name(&self, name: Option<String>) {
        *self.resource_name.lock() = name;
    }

    /// Update the rate window. Call periodically (e.g. once per second);
    /// returns `(bytes_per_second, frames_per_second)` over the elapsed
    /// window.
    pub fn poll(&self) -> (u64, u64) {
        let bytes = self.byte_count();
        let frames = self.frame_count();
        let mut rates = self.rates.lock();

        let elapsed = rates.last_polled.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            rates.bytes_per_second =
                (bytes.saturating_sub(rates.last_byte_count) as f64 / elapsed).round() as u64;
            rates.frames_per_second =
                (frames.saturating_sub(rates.last_frame_count) as f64 / elapsed).round() as u64;
        }
        rates.last_polled = Instant::now();
        rates.last_byte_count = bytes;
        rates.last_frame_count = frames;

        (rates.bytes_per_second, rates.frames_per_second)
    }

    /// Reset counters and rates. The resource name survives: it belongs to
    /// the pending publish/play, not to the session window being reset.
    pub fn clear(&self) {
        self.byte_count.store(0, Ordering::Relaxed);
        self.frame_count.store(0, Ordering::Relaxed);
        let mut rates = self.rates.lock();
        rates.last_polled = Instant::now();
        rates.last_byte_count = 0;
        rates.last_frame_count = 0;
        rates.bytes_per_second = 0;
        rates.frames_per_second = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_accounting() {
        let info = StreamInfo::new();
        info.add_bytes(100);
        info.add_bytes(50);
        assert_eq!(info.byte_count(), 150);
    }

    #[test]
    fn test_clear() {
        let info = StreamInfo::new();
        info.add_bytes(100);
        info.add_frame();
        info.set_resource_name(Some("key".into()));
        info.clear();
        assert_eq!(info.byte_count(), 0);
        assert_eq!(info.frame_count(), 0);
        assert_eq!(info.resource_name().as_deref(), Some("key"));
    }

    #[test]
    fn test_poll_after_clear_is_sane() {
        let info = StreamInfo::new();
        info.add_bytes(1000);
        let _ = info.poll();
        info.clear();
        // Counter went backwards relative to the window; cleared window
        // restarts from zero rather than underflowing
        let (bps, _) = info.poll();
        assert_eq!(bps, 0);
    }
}
