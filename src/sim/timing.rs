//! Flight timing: elapsed time -> target progress, coefficient growth, playback scaling
//!
//! Progress and coefficient are both pure functions of scaled elapsed time and
//! never derive from each other.

use serde::{Deserialize, Serialize};

use super::curve::ViewportClass;
use crate::consts::BOOST_COEFFICIENT;
use crate::ease_in_out_cubic;

/// Playback speed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackRate {
    #[default]
    X1,
    X1_5,
    X2,
}

impl PlaybackRate {
    pub fn factor(self) -> f64 {
        match self {
            PlaybackRate::X1 => 1.0,
            PlaybackRate::X1_5 => 1.5,
            PlaybackRate::X2 => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackRate::X1 => "X1",
            PlaybackRate::X1_5 => "X1.5",
            PlaybackRate::X2 => "X2",
        }
    }

    /// X1 -> X1.5 -> X2 -> X1
    pub fn next(self) -> Self {
        match self {
            PlaybackRate::X1 => PlaybackRate::X1_5,
            PlaybackRate::X1_5 => PlaybackRate::X2,
            PlaybackRate::X2 => PlaybackRate::X1,
        }
    }
}

/// Maps real timestamps to scaled elapsed time for one phase.
///
/// A rate change re-anchors the clock, so scaled time stays continuous and
/// is always recomputed from the wall clock rather than accumulated per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledClock {
    anchor_real_ms: f64,
    anchor_scaled_ms: f64,
    factor: f64,
}

impl ScaledClock {
    pub fn start(now_ms: f64, rate: PlaybackRate) -> Self {
        Self {
            anchor_real_ms: now_ms,
            anchor_scaled_ms: 0.0,
            factor: rate.factor(),
        }
    }

    /// Scaled milliseconds since the phase began (never negative)
    pub fn scaled_ms(&self, now_ms: f64) -> f64 {
        self.anchor_scaled_ms + (now_ms - self.anchor_real_ms).max(0.0) * self.factor
    }

    pub fn set_rate(&mut self, now_ms: f64, rate: PlaybackRate) {
        self.anchor_scaled_ms = self.scaled_ms(now_ms);
        self.anchor_real_ms = now_ms.max(self.anchor_real_ms);
        self.factor = rate.factor();
    }
}

/// Exponential coefficient growth for one flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientGrowth {
    /// Growth rate per scaled second
    pub k: f64,
    /// Display cap
    pub cap: f64,
}

impl CoefficientGrowth {
    /// Rate chosen so the coefficient reads exactly 1.10 when the boost ends
    pub fn for_boost(boost_secs: f64, cap: f64) -> Self {
        Self {
            k: BOOST_COEFFICIENT.ln() / boost_secs,
            cap,
        }
    }

    /// Coefficient after `elapsed_secs` of scaled flight, clamped to [1, cap]
    pub fn coefficient(&self, elapsed_secs: f64) -> f64 {
        (self.k * elapsed_secs).exp().clamp(1.0, self.cap.max(1.0))
    }
}

/// Display string such as "x1.00"
pub fn coefficient_label(value: f64) -> String {
    format!("x{:.2}", value)
}

/// Per-flight timing constants, fixed when the flight starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightProfile {
    /// Length of the boost easing (scaled ms)
    pub boost_ms: f64,
    /// Progress reached at the end of the boost
    pub hold_progress: f64,
    pub sway_amplitude: f64,
    pub sway_frequency_hz: f64,
    pub sway_ramp_secs: f64,
    /// Upper bound on target progress during the hold
    pub max_progress: f64,
}

/// Lower bound on target progress during the hold
const HOLD_MIN_PROGRESS: f64 = 0.02;
const MAX_PROGRESS_CAP: f64 = 0.965;
const MAX_PROGRESS_MARGIN: f64 = 0.006;

impl FlightProfile {
    pub fn new(boost_ms: f64, viewport: ViewportClass) -> Self {
        let (hold_progress, sway_amplitude, sway_frequency_hz) = match viewport {
            ViewportClass::Compact => (0.945, 0.014, 0.40),
            ViewportClass::Standard => (0.935, 0.011, 0.36),
        };
        Self {
            boost_ms,
            hold_progress,
            sway_amplitude,
            sway_frequency_hz,
            sway_ramp_secs: 1.0,
            max_progress: (hold_progress + sway_amplitude + MAX_PROGRESS_MARGIN)
                .min(MAX_PROGRESS_CAP),
        }
    }

    /// Target progress after `elapsed_ms` of scaled flight; the flag is set once holding
    pub fn target_progress(&self, elapsed_ms: f64) -> (f32, bool) {
        let elapsed_ms = elapsed_ms.max(0.0);
        if elapsed_ms <= self.boost_ms {
            let t = if self.boost_ms > 0.0 {
                (elapsed_ms / self.boost_ms).clamp(0.0, 1.0)
            } else {
                1.0
            };
            return ((ease_in_out_cubic(t) * self.hold_progress) as f32, false);
        }

        let t = (elapsed_ms - self.boost_ms) / 1000.0;
        let ramp = if self.sway_ramp_secs > 0.0 {
            (t / self.sway_ramp_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let sway =
            self.sway_amplitude * ramp * (std::f64::consts::TAU * self.sway_frequency_hz * t).sin();
        let target = (self.hold_progress + sway).clamp(HOLD_MIN_PROGRESS, self.max_progress);
        (target as f32, true)
    }
}
