use image::imageops::FilterType;
use image::{GrayImage, ImageReader};
use std::io::Cursor;
use tracing::debug;

use scene_gate_common::config::RegistrationConfig;
use scene_gate_common::frame::VideoFrame;

/// Translational offset aligning one frame to its predecessor, in source
/// pixel units. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
}

impl Displacement {
    pub const ZERO: Displacement = Displacement { dx: 0.0, dy: 0.0 };

    /// Manhattan distance: |dx| + |dy|.
    pub fn manhattan(&self) -> f64 {
        self.dx.abs() + self.dy.abs()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("failed to decode frame #{seq} for registration")]
    Decode { seq: u64 },
}

/// Computes frame-to-frame displacement.
///
/// `align` must be invoked synchronously and in strict arrival order:
/// implementations may carry alignment state from one frame pair to the next,
/// so overlapping pairs must never be in flight concurrently.
pub trait RegistrationAdapter {
    /// Returns the translational offset of `current` relative to `previous`.
    fn align(
        &mut self,
        previous: &VideoFrame,
        current: &VideoFrame,
    ) -> Result<Displacement, RegistrationError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

struct CachedLuma {
    seq: u64,
    luma: GrayImage,
}

/// Coarse translational registration by exhaustive block matching.
///
/// Both frames are decoded, converted to grayscale, and downsampled to
/// `downsample x downsample`; the integer offset within `±search_radius`
/// minimizing mean absolute pixel difference over the overlap wins, then gets
/// scaled back to source pixel units. The previous frame's downsampled luma
/// is cached keyed by `seq`, so sequential invocation decodes each frame
/// exactly once.
pub struct TranslationEstimator {
    downsample: u32,
    search_radius: i32,
    last: Option<CachedLuma>,
}

impl TranslationEstimator {
    pub fn new(config: &RegistrationConfig) -> Self {
        Self {
            downsample: config.downsample,
            search_radius: config.search_radius as i32,
            last: None,
        }
    }

    /// Decode to downsampled grayscale plus the downsample-to-source scale
    /// factors. None if the JPEG is undecodable.
    fn decode_luma(&self, frame: &VideoFrame) -> Option<(GrayImage, f64, f64)> {
        let img = ImageReader::new(Cursor::new(&frame.jpeg))
            .with_guessed_format()
            .ok()?
            .decode()
            .ok()?;
        let scale_x = img.width() as f64 / self.downsample as f64;
        let scale_y = img.height() as f64 / self.downsample as f64;
        let luma = img
            .resize_exact(self.downsample, self.downsample, FilterType::Nearest)
            .to_luma8();
        Some((luma, scale_x, scale_y))
    }
}

impl RegistrationAdapter for TranslationEstimator {
    fn align(
        &mut self,
        previous: &VideoFrame,
        current: &VideoFrame,
    ) -> Result<Displacement, RegistrationError> {
        let cached = self.last.take();
        let cached_prev = match cached {
            Some(c) if c.seq == previous.seq => Some(c.luma),
            _ => None,
        };

        // Decode the current frame first so a bad previous frame does not
        // cost us the decode we need on the next call.
        let Some((cur_luma, scale_x, scale_y)) = self.decode_luma(current) else {
            return Err(RegistrationError::Decode { seq: current.seq });
        };

        let prev_luma = match cached_prev {
            Some(luma) => luma,
            None => match self.decode_luma(previous) {
                Some((luma, _, _)) => luma,
                None => {
                    self.last = Some(CachedLuma {
                        seq: current.seq,
                        luma: cur_luma,
                    });
                    return Err(RegistrationError::Decode { seq: previous.seq });
                }
            },
        };

        let (dx, dy) = best_offset(&prev_luma, &cur_luma, self.search_radius);
        self.last = Some(CachedLuma {
            seq: current.seq,
            luma: cur_luma,
        });

        let displacement = Displacement {
            dx: dx as f64 * scale_x,
            dy: dy as f64 * scale_y,
        };
        debug!(
            prev = previous.seq,
            cur = current.seq,
            dx = format!("{:.1}", displacement.dx),
            dy = format!("{:.1}", displacement.dy),
            "frame registration"
        );
        Ok(displacement)
    }

    fn name(&self) -> &str {
        "translation"
    }
}

/// Exhaustive search for the integer offset minimizing mean absolute pixel
/// difference over the overlap. Ties favor the zero offset so a featureless
/// scene reads as motionless rather than snapping to the search edge.
fn best_offset(prev: &GrayImage, cur: &GrayImage, radius: i32) -> (i32, i32) {
    let mut best = (0, 0);
    let mut best_cost = offset_cost(prev, cur, 0, 0).unwrap_or(0.0);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx, dy) == (0, 0) {
                continue;
            }
            if let Some(cost) = offset_cost(prev, cur, dx, dy) {
                if cost < best_cost {
                    best_cost = cost;
                    best = (dx, dy);
                }
            }
        }
    }
    best
}

/// Mean absolute difference of `prev[x, y]` vs `cur[x + dx, y + dy]` over the
/// valid overlap, or None when the offset leaves no overlap.
fn offset_cost(prev: &GrayImage, cur: &GrayImage, dx: i32, dy: i32) -> Option<f64> {
    let (w, h) = (prev.width() as i32, prev.height() as i32);
    let x_range = (-dx).max(0)..(w - dx).min(w);
    let y_range = (-dy).max(0)..(h - dy).min(h);
    if x_range.is_empty() || y_range.is_empty() {
        return None;
    }
    let mut sum: u64 = 0;
    for y in y_range.clone() {
        for x in x_range.clone() {
            let a = prev.get_pixel(x as u32, y as u32).0[0] as i64;
            let b = cur.get_pixel((x + dx) as u32, (y + dy) as u32).0[0] as i64;
            sum += (a - b).unsigned_abs();
        }
    }
    let count =
        ((x_range.end - x_range.start) as f64) * ((y_range.end - y_range.start) as f64);
    Some(sum as f64 / count)
}
