use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use scene_gate_common::config::ClassificationConfig;
use scene_gate_common::frame::VideoFrame;
use scene_gate_common::orientation::ExifOrientation;
use scene_gate_pipeline::classify::{
    Classification, ClassificationAdapter, ClassificationError,
};

/// Classifier backed by an HTTP inference endpoint.
///
/// POSTs the raw JPEG with the EXIF orientation tag in a header and expects a
/// JSON array of `{"label": ..., "confidence": ...}` objects in response.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpClassifier {
    /// Validates the endpoint and builds the client. An error here means
    /// inference can never run; callers must surface it rather than continue
    /// with a dead dispatch path.
    pub fn new(config: &ClassificationConfig) -> Result<Self, ClassificationError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            ClassificationError::Setup(format!("bad endpoint {}: {e}", config.endpoint))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClassificationError::Setup(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

impl ClassificationAdapter for HttpClassifier {
    fn classify(
        &self,
        frame: &VideoFrame,
        orientation: ExifOrientation,
    ) -> impl Future<Output = Result<Vec<Classification>, ClassificationError>> + Send {
        let request = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", "image/jpeg")
            .header("x-frame-orientation", orientation.tag().to_string())
            .body(frame.jpeg.clone());
        let seq = frame.seq;
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| ClassificationError::Request(e.to_string()))?;
            if !response.status().is_success() {
                return Err(ClassificationError::Request(format!(
                    "inference endpoint returned {}",
                    response.status()
                )));
            }
            let results: Vec<Classification> = response
                .json()
                .await
                .map_err(|e| ClassificationError::InvalidResponse(e.to_string()))?;
            debug!(seq, results = results.len(), "inference response parsed");
            Ok(results)
        }
    }
}
