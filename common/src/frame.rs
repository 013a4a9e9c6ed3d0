use std::fmt;

/// A camera frame as delivered by the capture layer.
///
/// Frames carry their arrival-order position (`seq`) alongside the capture
/// timestamp. The pipeline only ever compares consecutive `seq` values; wall
/// clock time is carried for logging and never drives any decision.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Raw JPEG bytes from the camera stream.
    pub jpeg: Vec<u8>,
    /// Capture timestamp (Unix millis).
    pub captured_at_ms: i64,
    /// Arrival-order sequence number, monotonically increasing per stream.
    pub seq: u64,
}

impl VideoFrame {
    pub fn new(jpeg: Vec<u8>, captured_at_ms: i64, seq: u64) -> Self {
        Self {
            jpeg,
            captured_at_ms,
            seq,
        }
    }

    /// Size of the JPEG payload in bytes.
    pub fn payload_size(&self) -> usize {
        self.jpeg.len()
    }
}

impl fmt::Display for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = chrono::DateTime::from_timestamp_millis(self.captured_at_ms)
            .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| self.captured_at_ms.to_string());
        write!(f, "frame #{} @ {} ({} bytes)", self.seq, ts, self.jpeg.len())
    }
}
