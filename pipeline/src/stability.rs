use std::collections::VecDeque;
use tracing::debug;

use crate::registration::Displacement;

/// Bounded FIFO of frame-to-frame displacement samples.
///
/// Holds at most `capacity` samples; recording at capacity evicts the oldest.
/// Reset whenever the pipeline has no valid previous frame to register
/// against.
#[derive(Debug)]
pub struct TranspositionHistory {
    samples: VecDeque<Displacement>,
    capacity: usize,
}

impl TranspositionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, sample: Displacement) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Component-wise sum of every sample currently held. Deliberately the
    /// sum rather than the mean: the threshold applies to the whole window,
    /// so opposing jitters cancel while a steady drift accumulates.
    pub fn aggregate(&self) -> Displacement {
        self.samples
            .iter()
            .fold(Displacement::ZERO, |acc, s| Displacement {
                dx: acc.dx + s.dx,
                dy: acc.dy + s.dy,
            })
    }
}

/// Turns the displacement history into a boolean stability signal.
///
/// A full window whose aggregate Manhattan distance stays strictly below the
/// threshold means the camera has held still long enough to classify.
#[derive(Debug)]
pub struct StabilityEvaluator {
    threshold: f64,
}

impl StabilityEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn is_stable(&self, history: &TranspositionHistory) -> bool {
        if !history.is_full() {
            return false;
        }
        let distance = history.aggregate().manhattan();
        let stable = distance < self.threshold;
        debug!(
            distance = format!("{:.2}", distance),
            threshold = self.threshold,
            stable,
            "stability check"
        );
        stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(dx: f64, dy: f64) -> Displacement {
        Displacement { dx, dy }
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = TranspositionHistory::new(15);
        history.record(d(100.0, 100.0));
        for _ in 0..14 {
            history.record(Displacement::ZERO);
        }
        assert!(history.is_full());
        assert_eq!(history.aggregate(), d(100.0, 100.0));

        // The sixteenth sample pushes the outlier out of the window.
        history.record(Displacement::ZERO);
        assert_eq!(history.len(), 15);
        assert_eq!(history.aggregate(), Displacement::ZERO);
    }

    #[test]
    fn not_stable_until_window_is_full() {
        let evaluator = StabilityEvaluator::new(20.0);
        let mut history = TranspositionHistory::new(15);
        for _ in 0..14 {
            history.record(Displacement::ZERO);
            assert!(!evaluator.is_stable(&history));
        }
        history.record(Displacement::ZERO);
        assert!(evaluator.is_stable(&history));
    }

    #[test]
    fn threshold_is_strict() {
        let evaluator = StabilityEvaluator::new(20.0);
        let mut history = TranspositionHistory::new(2);
        history.record(d(5.0, 5.0));
        history.record(d(5.0, 5.0));
        // Manhattan of the aggregate is exactly 20, not strictly below.
        assert!(!evaluator.is_stable(&history));

        history.record(d(4.9, 5.0));
        assert!(evaluator.is_stable(&history));
    }

    #[test]
    fn opposing_jitter_cancels() {
        let evaluator = StabilityEvaluator::new(20.0);
        let mut history = TranspositionHistory::new(4);
        history.record(d(30.0, 0.0));
        history.record(d(-30.0, 0.0));
        history.record(d(0.0, 25.0));
        history.record(d(0.0, -25.0));
        assert!(evaluator.is_stable(&history));
    }

    #[test]
    fn drift_then_still_crosses_threshold_at_sixth_zero() {
        let evaluator = StabilityEvaluator::new(20.0);
        let mut history = TranspositionHistory::new(15);
        for _ in 0..15 {
            history.record(d(1.0, 1.0));
        }
        // Aggregate (15, 15), Manhattan 30.
        assert!(!evaluator.is_stable(&history));

        for zeros in 1..=15 {
            history.record(Displacement::ZERO);
            let expect_stable = zeros >= 6; // 2 * (15 - 6) = 18 < 20
            assert_eq!(
                evaluator.is_stable(&history),
                expect_stable,
                "after {zeros} zero samples"
            );
        }
    }

    #[test]
    fn reset_empties_the_window() {
        let mut history = TranspositionHistory::new(15);
        for _ in 0..15 {
            history.record(Displacement::ZERO);
        }
        history.reset();
        assert!(history.is_empty());
        assert!(!history.is_full());
    }
}
