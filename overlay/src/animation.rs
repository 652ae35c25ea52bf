//! Optional bounce effect when a marker gains focus. Pure and time-injected:
//! the rendering collaborator picks the frame times and applies the returned
//! positions; nothing here owns a clock or a timer.

use stopmap_shared::Point;

use crate::engine::MarkerHandle;

pub const BOUNCE_DURATION_MS: f64 = 300.0;

/// How far above its true position the marker starts, in screen pixels.
pub const BOUNCE_LIFT_PX: f64 = 10.0;

/// A time-boxed drop-and-settle interpolation from a lifted start point down
/// onto the marker's true position.
#[derive(Debug, Clone)]
pub struct BounceAnimation {
    pub handle: MarkerHandle,
    pub from: Point,
    pub to: Point,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl BounceAnimation {
    pub fn new(handle: MarkerHandle, from: Point, to: Point, start_ms: f64) -> Self {
        Self {
            handle,
            from,
            to,
            start_ms,
            duration_ms: BOUNCE_DURATION_MS,
        }
    }

    /// Interpolated position at `now_ms`, or `None` once the animation is
    /// complete and the marker should rest at its true position.
    pub fn position_at(&self, now_ms: f64) -> Option<Point> {
        let elapsed = now_ms - self.start_ms;
        if elapsed >= self.duration_ms {
            return None;
        }

        let t = bounce(elapsed.max(0.0) / self.duration_ms);
        Some(Point::new(
            t * self.to.lat + (1.0 - t) * self.from.lat,
            t * self.to.lon + (1.0 - t) * self.from.lon,
        ))
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms >= self.duration_ms
    }
}

/// Bounce easing: overshoots past 1.0 and settles with three diminishing
/// rebounds.
fn bounce(t: f64) -> f64 {
    fn square(t: f64) -> f64 {
        t * t * 8.0
    }

    let t = t * 1.1226;
    if t < 0.3535 {
        square(t)
    } else if t < 0.7408 {
        square(t - 0.54719) + 0.7
    } else if t < 0.9644 {
        square(t - 0.8526) + 0.9
    } else {
        square(t - 1.0435) + 0.95
    }
}
