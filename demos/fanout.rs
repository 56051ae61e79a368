//! Multi-destination fan-out demo
//!
//! Builds a connection-less source stream, attaches two relay streams with
//! stub connections, and feeds synthetic AAC/H.264 samples through the
//! muxer. Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example fanout
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rtmp_push::media::aac::AacProfile;
use rtmp_push::media::fourcc::VideoFourCc;
use rtmp_push::{
    AudioSample, CodedVideoFrame, Connection, RtmpChunk, RtmpMessage, RtmpStream, StatusCode,
};

/// Stand-in for a real RTMP connection: counts and logs outbound chunks.
struct LoggingConnection {
    label: &'static str,
    chunks: AtomicUsize,
}

impl LoggingConnection {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            chunks: AtomicUsize::new(0),
        })
    }
}

impl Connection for LoggingConnection {
    fn do_output(&self, chunk: RtmpChunk) -> usize {
        let n = self.chunks.fetch_add(1, Ordering::Relaxed) + 1;
        let (kind, size) = match &chunk.message {
            RtmpMessage::Audio { payload, .. } => ("audio", payload.len()),
            RtmpMessage::Video { payload, .. } => ("video", payload.len()),
            RtmpMessage::Data { .. } => ("data", 0),
            RtmpMessage::Command(cmd) => {
                tracing::info!(dest = self.label, command = %cmd.name, "rpc");
                ("command", 0)
            }
        };
        tracing::debug!(dest = self.label, n, kind, size, chunk_kind = ?chunk.kind, "chunk out");
        size + 12
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fanout=debug".parse().unwrap()),
        )
        .init();

    // Source: no connection, runs the encoder-facing muxer
    let (source, ready) = RtmpStream::source();
    source.muxer().start_running();
    source.announce_audio_format(AacProfile::Lc, 44100, 2);
    source.announce_video_format(
        VideoFourCc::Avc,
        vec![],
        vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])],
        vec![Bytes::from_static(&[0x68, 0xEF, 0x38])],
    );
    ready.wait().await;
    tracing::info!("source ready, attaching relays");

    // Two relay destinations forwarding the same encoded stream
    let mut relays = Vec::new();
    for label in ["dest-a", "dest-b"] {
        let connection = LoggingConnection::new(label);
        let relay = RtmpStream::relay(connection.clone(), &source);
        relay.publish(Some(label));
        // A real connection would drive these from createStream/onStatus
        relay.on_stream_created(1);
        relay.on_status(StatusCode::PublishStart);
        relays.push((relay, connection));
    }

    // Feed one second of synthetic media
    for i in 0u32..30 {
        let timestamp = f64::from(i) * 33.0;
        source.append_video(&CodedVideoFrame {
            data: Bytes::from_static(&[0x00, 0x00, 0x00, 0x02, 0x65, 0x88]),
            codec: VideoFourCc::Avc,
            decode_timestamp: Some(timestamp),
            presentation_timestamp: timestamp,
            keyframe: i % 30 == 0,
        });
        source.append_audio(&AudioSample {
            data: Bytes::from_static(&[0x21, 0x10, 0x04]),
            timestamp,
        });
        tokio::time::sleep(Duration::from_millis(33)).await;
    }

    for (relay, connection) in &relays {
        tracing::info!(
            dest = connection.label,
            chunks = connection.chunks.load(Ordering::Relaxed),
            bytes = relay.info().byte_count(),
            "relay totals"
        );
        relay.close();
    }
}
