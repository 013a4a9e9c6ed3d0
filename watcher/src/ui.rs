use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use scene_gate_pipeline::classify::Classification;
use scene_gate_pipeline::pipeline::{PresentationSink, ReviewingFlag};

/// Events crossing from the pipeline contexts onto the UI task.
#[derive(Debug)]
pub enum UiEvent {
    Overlay(bool),
    Results(Vec<Classification>),
}

/// Presentation sink that forwards every call onto the UI execution context.
/// Overlay updates arrive from the frame-delivery context, results from the
/// classification worker; the channel serializes both.
pub struct ChannelPresentation {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelPresentation {
    pub fn new() -> (Self, UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PresentationSink for ChannelPresentation {
    fn set_overlay_visible(&self, visible: bool) {
        if self.tx.send(UiEvent::Overlay(visible)).is_err() {
            warn!("UI task gone, dropping overlay update");
        }
    }

    fn show_results(&self, results: &[Classification]) {
        if self.tx.send(UiEvent::Results(results.to_vec())).is_err() {
            warn!("UI task gone, dropping classification results");
        }
    }
}

/// The watcher's stand-in for a main thread: applies visual state changes and
/// decides whether a classification is worth holding on screen. While a
/// result is held, the reviewing flag pauses stability tracking.
pub async fn run_ui_loop(
    mut rx: UnboundedReceiver<UiEvent>,
    reviewing: ReviewingFlag,
    min_confidence: f32,
    review_hold: Duration,
) {
    while let Some(event) = rx.recv().await {
        match event {
            UiEvent::Overlay(visible) => {
                info!(visible, "detection overlay");
            }
            UiEvent::Results(results) => {
                let Some(top) = results
                    .iter()
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                else {
                    debug!("empty classification result");
                    continue;
                };
                if top.confidence >= min_confidence {
                    info!(
                        label = top.label,
                        confidence = top.confidence,
                        "showing classification"
                    );
                    reviewing.set(true);
                    tokio::time::sleep(review_hold).await;
                    reviewing.set(false);
                    debug!("review hold finished, resuming stability tracking");
                } else {
                    debug!(
                        label = top.label,
                        confidence = top.confidence,
                        "classification below confidence threshold"
                    );
                }
            }
        }
    }
}
