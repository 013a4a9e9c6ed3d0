use serde::Deserialize;
use std::future::Future;

use scene_gate_common::frame::VideoFrame;
use scene_gate_common::orientation::ExifOrientation;

/// A single label produced by the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("classifier setup failed: {0}")]
    Setup(String),
    #[error("classification request failed: {0}")]
    Request(String),
    #[error("malformed classifier response: {0}")]
    InvalidResponse(String),
}

/// Asynchronous label/confidence producer.
///
/// `classify` runs off the frame-delivery path; its future is spawned onto
/// the runtime and completes on an unspecified execution context. The only
/// pipeline state that context may touch is the dispatch permit it carries.
pub trait ClassificationAdapter: Send + Sync + 'static {
    fn classify(
        &self,
        frame: &VideoFrame,
        orientation: ExifOrientation,
    ) -> impl Future<Output = Result<Vec<Classification>, ClassificationError>> + Send;
}
