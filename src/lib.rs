//! Crash Curve - round engine for an animated crash-curve game
//!
//! Core modules:
//! - `sim`: Round state machine, flight timing, curve and trail geometry
//! - `platform`: Host adapters (headless fixed-step loop, browser bridge)
//! - `settings`: Engine tuning and preferences

pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{EngineSettings, LayoutMode};
pub use sim::{FrameUpdate, RoundPhase, RoundState, TickInput, tick};

/// Engine configuration constants
pub mod consts {
    /// Crash targets never fall outside this range
    pub const CRASH_MIN: f64 = 1.10;
    pub const CRASH_MAX: f64 = 4.50;
    /// Upper bound of the "main" sampling bucket
    pub const CRASH_MAIN_TOP: f64 = 2.10;
    /// Probability of drawing from the main bucket
    pub const CRASH_MAIN_WEIGHT: f64 = 0.80;
    /// Shape exponent of the main bucket (biases toward the low end)
    pub const CRASH_MAIN_BETA: f64 = 1.35;
    /// Decay rate of the truncated-exponential tail
    pub const CRASH_TAIL_LAMBDA: f64 = 2.2;
    /// Fixed override queues must hold exactly this many values
    pub const FIXED_QUEUE_LEN: usize = 5;

    /// Coefficient reached exactly when the boost easing completes
    pub const BOOST_COEFFICIENT: f64 = 1.10;

    /// Stage widths at or below this are laid out as compact (phone)
    pub const COMPACT_MAX_WIDTH: f32 = 560.0;
    /// Height of the ground strip under the curve origin
    pub const GROUND_BASE: f32 = 16.0;

    /// Sprite heading at progress 0, and added tilt at progress 1 (degrees)
    pub const HEADING_BASE_DEG: f32 = 8.0;
    pub const HEADING_TILT_DEG: f32 = 12.0;
    /// Sprite translation relative to the curve point
    pub const SPRITE_OFFSET_X: f32 = 6.0;
    pub const SPRITE_OFFSET_Y: f32 = -2.0;

    /// Progress step used to estimate the exit tangent
    pub const EXIT_TANGENT_EPSILON: f32 = 0.002;

    /// Trail sampling: never fewer than this many segments
    pub const TRAIL_MIN_SAMPLES: usize = 18;
    /// Trail sampling density per unit of progress
    pub const TRAIL_SAMPLES_PER_PROGRESS: f32 = 120.0;
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Cubic ease-in-out over t in [0, 1]
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease_in_out_cubic(i as f64 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }
}
