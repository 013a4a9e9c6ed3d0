use bytes::BytesMut;
use chrono::Utc;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use scene_gate_common::frame::VideoFrame;
use scene_gate_common::orientation::ExifOrientation;
use scene_gate_pipeline::classify::ClassificationAdapter;
use scene_gate_pipeline::pipeline::{FramePipeline, PresentationSink};
use scene_gate_pipeline::registration::RegistrationAdapter;

use crate::WatcherError;

static SEQ_COUNTER: AtomicU64 = AtomicU64::new(0);

const BOUNDARY: &[u8] = b"--frame\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Parse state for the MJPEG multipart stream.
enum ParseState {
    /// Looking for the boundary marker `--frame\r\n`.
    SeekingBoundary,
    /// Found boundary, now looking for end of headers `\r\n\r\n`.
    SeekingHeaderEnd,
    /// Collecting JPEG bytes until the next boundary.
    CollectingJpeg,
}

/// Consume the MJPEG stream and run every frame through the pipeline, in
/// arrival order. Reconnects with exponential backoff on failure; every
/// reconnect restarts the frame chain, since the registration baseline is
/// gone.
pub async fn run_mjpeg_watch<R, C, P>(
    stream_url: &str,
    pipeline: &mut FramePipeline<R, C, P>,
    orientation: ExifOrientation,
) -> Result<(), WatcherError>
where
    R: RegistrationAdapter,
    C: ClassificationAdapter,
    P: PresentationSink,
{
    let mut backoff = Duration::from_secs(2);
    let max_backoff = Duration::from_secs(30);

    loop {
        info!(url = stream_url, "connecting to MJPEG stream");
        pipeline.reset();
        match consume_stream(stream_url, pipeline, orientation).await {
            Ok(()) => {
                info!("stream ended cleanly, reconnecting");
                backoff = Duration::from_secs(2);
            }
            Err(e) => {
                error!(error = %e, "stream error, reconnecting in {:?}", backoff);
            }
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(max_backoff);
    }
}

async fn consume_stream<R, C, P>(
    url: &str,
    pipeline: &mut FramePipeline<R, C, P>,
    orientation: ExifOrientation,
) -> Result<(), WatcherError>
where
    R: RegistrationAdapter,
    C: ClassificationAdapter,
    P: PresentationSink,
{
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(WatcherError::HttpConnect)?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(WatcherError::HttpConnect)?;

    if !response.status().is_success() {
        return Err(WatcherError::HttpStatus(response.status().as_u16()));
    }

    info!(status = %response.status(), "connected to MJPEG stream");

    let mut byte_stream = response.bytes_stream();
    let mut buffer = BytesMut::with_capacity(256 * 1024);
    let mut state = ParseState::SeekingBoundary;
    let mut jpeg_start: usize = 0;

    while let Some(chunk) = byte_stream.next().await {
        let chunk = chunk.map_err(WatcherError::HttpStream)?;
        buffer.extend_from_slice(&chunk);

        loop {
            match state {
                ParseState::SeekingBoundary => {
                    if let Some(pos) = find_subsequence(&buffer, BOUNDARY) {
                        // Discard everything up to and including the boundary
                        let _ = buffer.split_to(pos + BOUNDARY.len());
                        state = ParseState::SeekingHeaderEnd;
                    } else {
                        // Keep last few bytes in case boundary spans chunks
                        if buffer.len() > BOUNDARY.len() {
                            let _ = buffer.split_to(buffer.len() - BOUNDARY.len());
                        }
                        break;
                    }
                }
                ParseState::SeekingHeaderEnd => {
                    if let Some(pos) = find_subsequence(&buffer, HEADER_END) {
                        // Discard headers
                        let _ = buffer.split_to(pos + HEADER_END.len());
                        jpeg_start = 0;
                        state = ParseState::CollectingJpeg;
                    } else {
                        break;
                    }
                }
                ParseState::CollectingJpeg => {
                    // Look for the next boundary to know where JPEG ends
                    if let Some(pos) = find_subsequence(&buffer[jpeg_start..], BOUNDARY) {
                        let jpeg_end = jpeg_start + pos;
                        // Strip trailing \r\n before boundary
                        let end = if jpeg_end >= 2
                            && buffer[jpeg_end - 2] == b'\r'
                            && buffer[jpeg_end - 1] == b'\n'
                        {
                            jpeg_end - 2
                        } else {
                            jpeg_end
                        };

                        let jpeg_data = buffer[..end].to_vec();

                        // Advance past the boundary
                        let _ = buffer.split_to(jpeg_end + BOUNDARY.len());

                        if !jpeg_data.is_empty() {
                            let seq = SEQ_COUNTER.fetch_add(1, Ordering::Relaxed);
                            let now_ms = Utc::now().timestamp_millis();
                            let frame = VideoFrame::new(jpeg_data, now_ms, seq);
                            debug!(%frame, "frame received");
                            pipeline.process_frame(frame, orientation);
                        }

                        // Already past boundary, go to header parsing
                        state = ParseState::SeekingHeaderEnd;
                    } else {
                        // No boundary found yet, keep accumulating
                        // Update jpeg_start to avoid re-scanning old data
                        jpeg_start = if buffer.len() > BOUNDARY.len() {
                            buffer.len() - BOUNDARY.len()
                        } else {
                            0
                        };
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Polling-based fallback: periodically fetch single frames.
pub async fn run_polling_watch<R, C, P>(
    frame_url: &str,
    pipeline: &mut FramePipeline<R, C, P>,
    orientation: ExifOrientation,
    interval: Duration,
) -> Result<(), WatcherError>
where
    R: RegistrationAdapter,
    C: ClassificationAdapter,
    P: PresentationSink,
{
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        match client.get(frame_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let jpeg_data = resp
                    .bytes()
                    .await
                    .map_err(WatcherError::HttpStream)?
                    .to_vec();
                let seq = SEQ_COUNTER.fetch_add(1, Ordering::Relaxed);
                let now_ms = Utc::now().timestamp_millis();
                pipeline.process_frame(VideoFrame::new(jpeg_data, now_ms, seq), orientation);
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "non-success response from camera");
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch camera frame");
            }
        }
    }
}

/// Find the position of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
