//! Motion-stability gating and single-flight classification dispatch for a
//! live camera stream.
//!
//! The [`pipeline::FramePipeline`] controller runs one pass per delivered
//! frame: register it against its predecessor, fold the displacement into a
//! bounded history, derive a stability signal, and drive the overlay. When
//! the scene has held still long enough it hands the frame to the classifier,
//! with at most one classification in flight at any time.

pub mod classify;
pub mod gate;
pub mod overlay;
pub mod pipeline;
pub mod registration;
pub mod stability;
