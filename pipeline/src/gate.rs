use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Single-slot occupancy marker guaranteeing at most one classification in
/// flight.
///
/// `try_acquire` is called from the frame-delivery context; the returned
/// permit travels into the classification task and releases the slot when
/// dropped, whichever way the classification ends. The atomic is the only
/// state shared between the two contexts.
#[derive(Debug)]
pub struct DispatchGate {
    occupied: Arc<AtomicBool>,
}

/// Proof of ownership of the dispatch slot. Dropping it empties the gate.
#[derive(Debug)]
pub struct DispatchPermit {
    occupied: Arc<AtomicBool>,
}

impl DispatchGate {
    pub fn new() -> Self {
        Self {
            occupied: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Occupy the gate if it is currently empty. Returns None, with no side
    /// effects, when a classification is already in flight.
    pub fn try_acquire(&self) -> Option<DispatchPermit> {
        self.occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| DispatchPermit {
                occupied: Arc::clone(&self.occupied),
            })
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}

impl Default for DispatchGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DispatchPermit {
    fn drop(&mut self) {
        self.occupied.store(false, Ordering::Release);
        debug!("classification slot released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_permit_live() {
        let gate = DispatchGate::new();
        let permit = gate.try_acquire().expect("gate starts empty");
        assert!(gate.is_occupied());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(!gate.is_occupied());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn only_one_thread_wins() {
        let gate = DispatchGate::new();
        let wins = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| gate.try_acquire().map(std::mem::forget).is_some()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&won| won)
                .count()
        });
        assert_eq!(wins, 1);
    }
}
