use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use scene_gate_common::config::StabilityConfig;
use scene_gate_common::frame::VideoFrame;
use scene_gate_common::orientation::ExifOrientation;

use crate::classify::{Classification, ClassificationAdapter};
use crate::gate::DispatchGate;
use crate::overlay::{OverlayState, OverlayStateMachine};
use crate::registration::RegistrationAdapter;
use crate::stability::{StabilityEvaluator, TranspositionHistory};

/// Outbound boundary to whatever renders overlay state and results.
///
/// The two methods are called from different execution contexts
/// (`set_overlay_visible` from frame delivery, `show_results` from
/// classification completion), so implementations typically just forward
/// onto a UI channel.
pub trait PresentationSink: Send + Sync + 'static {
    fn set_overlay_visible(&self, visible: bool);
    fn show_results(&self, results: &[Classification]);
}

/// Shared toggle the presentation layer raises while a result is on screen.
/// While set, the pipeline skips frames entirely.
#[derive(Clone, Debug, Default)]
pub struct ReviewingFlag(Arc<AtomicBool>);

impl ReviewingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, reviewing: bool) {
        self.0.store(reviewing, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Orchestrates one pipeline pass per incoming frame: registration, history,
/// stability, overlay, and single-flight classification dispatch.
///
/// All pipeline state lives here and is touched only from the frame-delivery
/// context; the dispatch gate is the sole synchronization point with the
/// classification worker. `process_frame` must be called in strict arrival
/// order from within a Tokio runtime (classification work is spawned onto
/// it).
pub struct FramePipeline<R, C, P> {
    registration: R,
    classifier: Arc<C>,
    presentation: Arc<P>,
    history: TranspositionHistory,
    evaluator: StabilityEvaluator,
    overlay: OverlayStateMachine,
    gate: DispatchGate,
    previous: Option<Arc<VideoFrame>>,
    reviewing: ReviewingFlag,
}

impl<R, C, P> FramePipeline<R, C, P>
where
    R: RegistrationAdapter,
    C: ClassificationAdapter,
    P: PresentationSink,
{
    pub fn new(
        registration: R,
        classifier: Arc<C>,
        presentation: Arc<P>,
        stability: &StabilityConfig,
    ) -> Self {
        Self {
            registration,
            classifier,
            presentation,
            history: TranspositionHistory::new(stability.history_len),
            evaluator: StabilityEvaluator::new(stability.manhattan_threshold),
            overlay: OverlayStateMachine::new(),
            gate: DispatchGate::new(),
            previous: None,
            reviewing: ReviewingFlag::new(),
        }
    }

    /// Handle to the reviewing-results pause flag, shared with the
    /// presentation layer.
    pub fn reviewing_flag(&self) -> ReviewingFlag {
        self.reviewing.clone()
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay.state()
    }

    /// Drop the frame chain, e.g. after the capture stream reconnects. The
    /// next frame becomes a fresh registration baseline.
    pub fn reset(&mut self) {
        self.previous = None;
        self.history.reset();
        debug!("pipeline reset, frame chain restarts");
    }

    /// Run one pipeline pass for `frame`.
    pub fn process_frame(&mut self, frame: VideoFrame, orientation: ExifOrientation) {
        // While a result is on screen the user is moving the device freely;
        // tracking that motion would poison the history. Drop the chain so
        // resumption starts from a fresh baseline.
        if self.reviewing.is_set() {
            self.previous = None;
            return;
        }

        let frame = Arc::new(frame);

        let Some(previous) = self.previous.clone() else {
            self.history.reset();
            self.previous = Some(frame);
            return;
        };

        match self.registration.align(&previous, &frame) {
            Ok(sample) => self.history.record(sample),
            Err(e) => {
                warn!(seq = frame.seq, error = %e, "registration failed, no sample recorded");
            }
        }
        // The chain advances even when registration failed, so the next pair
        // is still consecutive.
        self.previous = Some(Arc::clone(&frame));

        let stable = self.evaluator.is_stable(&self.history);
        if let Some(state) = self.overlay.drive(stable) {
            self.presentation
                .set_overlay_visible(state == OverlayState::Visible);
        }

        if !stable {
            return;
        }
        let Some(permit) = self.gate.try_acquire() else {
            // A classification is already in flight; this frame is neither
            // queued nor does it supersede the in-flight one.
            return;
        };

        info!(seq = frame.seq, "scene stable, dispatching classification");
        let classifier = Arc::clone(&self.classifier);
        let presentation = Arc::clone(&self.presentation);
        tokio::spawn(async move {
            let _permit = permit;
            match classifier.classify(&frame, orientation).await {
                Ok(results) => {
                    debug!(
                        seq = frame.seq,
                        results = results.len(),
                        "classification complete"
                    );
                    presentation.show_results(&results);
                }
                Err(e) => {
                    warn!(seq = frame.seq, error = %e, "classification failed");
                }
            }
        });
    }
}
