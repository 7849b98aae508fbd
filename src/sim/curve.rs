//! Flight curve geometry
//!
//! Progress `p` in [0, 1] maps to a stage point via two power curves:
//! - x = p^xγ * usable_width + padding (xγ < 1, fast early drift right)
//! - y = h - (p^yγ * h * height_scale + padding + ground_base) (yγ > 1, late climb)
//!
//! Stage space has y pointing down, so "higher" means smaller y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp01;
use crate::consts::{COMPACT_MAX_WIDTH, GROUND_BASE};
use crate::settings::LayoutMode;

/// A point in stage pixel space
pub type ScenePoint = Vec2;

/// Stage dimensions reported by the host each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub width: f32,
    pub height: f32,
}

impl Stage {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn viewport(&self) -> ViewportClass {
        ViewportClass::for_width(self.width)
    }

    /// Local UI unit: 16px at 900px stage width, scaled down to 8px
    pub fn ui_rem(&self) -> f32 {
        (self.width / 900.0 * 16.0).clamp(8.0, 16.0)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(900.0, 500.0)
    }
}

/// Viewport size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewportClass {
    /// Phone-sized stage (width <= 560px)
    Compact,
    Standard,
}

impl ViewportClass {
    pub fn for_width(width: f32) -> Self {
        if width <= COMPACT_MAX_WIDTH {
            ViewportClass::Compact
        } else {
            ViewportClass::Standard
        }
    }
}

/// Layout parameters of the flight curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfile {
    /// Left/bottom padding (pixels)
    pub padding: f32,
    /// Space kept free on the right edge (pixels)
    pub right_reserve: f32,
    /// Fraction of stage height the curve may climb
    pub height_scale: f32,
    pub x_gamma: f32,
    pub y_gamma: f32,
    pub ground_base: f32,
}

const BASE_PADDING: f32 = 24.0;
const BASE_HEIGHT_SCALE: f32 = 0.62;
const BASE_Y_GAMMA: f32 = 2.6;
const X_GAMMA_STANDARD: f32 = 0.82;
const X_GAMMA_COMPACT: f32 = 0.86;
const COMPACT_Y_GAMMA_SCALE: f32 = 1.06;

impl LayoutProfile {
    /// Profile for the current stage and layout mode
    pub fn for_stage(stage: Stage, mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Fixed => Self::fixed(stage.viewport()),
            LayoutMode::Adaptive => Self::adaptive(stage.width),
        }
    }

    /// Constant paddings per viewport class
    pub fn fixed(class: ViewportClass) -> Self {
        match class {
            ViewportClass::Standard => Self {
                padding: BASE_PADDING,
                right_reserve: 24.0,
                height_scale: BASE_HEIGHT_SCALE,
                x_gamma: X_GAMMA_STANDARD,
                y_gamma: BASE_Y_GAMMA,
                ground_base: GROUND_BASE,
            },
            ViewportClass::Compact => Self {
                padding: (BASE_PADDING - 6.0).max(14.0),
                right_reserve: 28.0,
                height_scale: (BASE_HEIGHT_SCALE + 0.08).min(0.70),
                x_gamma: X_GAMMA_COMPACT,
                y_gamma: BASE_Y_GAMMA * COMPACT_Y_GAMMA_SCALE,
                ground_base: GROUND_BASE,
            },
        }
    }

    /// Paddings proportional to the stage width
    pub fn adaptive(width: f32) -> Self {
        let padding = (width * 0.035).clamp(10.0, 22.0).round();
        match ViewportClass::for_width(width) {
            ViewportClass::Standard => Self {
                padding,
                right_reserve: (width * 0.035).clamp(18.0, 28.0).round(),
                height_scale: BASE_HEIGHT_SCALE,
                x_gamma: X_GAMMA_STANDARD,
                y_gamma: BASE_Y_GAMMA,
                ground_base: GROUND_BASE,
            },
            ViewportClass::Compact => Self {
                padding,
                right_reserve: (width * 0.05).clamp(16.0, 30.0).round(),
                height_scale: (BASE_HEIGHT_SCALE + 0.06).clamp(0.60, 0.72),
                x_gamma: X_GAMMA_COMPACT,
                y_gamma: BASE_Y_GAMMA * COMPACT_Y_GAMMA_SCALE,
                ground_base: GROUND_BASE,
            },
        }
    }

    /// Horizontal span available to the curve
    #[inline]
    pub fn usable_width(&self, stage: Stage) -> f32 {
        (stage.width - self.padding * 2.0 - self.right_reserve).max(0.0)
    }

    /// y of the ground line the curve launches from
    #[inline]
    pub fn ground_y(&self, stage: Stage) -> f32 {
        stage.height - (self.padding + self.ground_base)
    }
}

/// Curve evaluator bound to one stage size and profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightCurve {
    pub stage: Stage,
    pub profile: LayoutProfile,
}

impl FlightCurve {
    pub fn new(stage: Stage, profile: LayoutProfile) -> Self {
        Self { stage, profile }
    }

    pub fn for_stage(stage: Stage, mode: LayoutMode) -> Self {
        Self::new(stage, LayoutProfile::for_stage(stage, mode))
    }

    /// Stage point for normalized progress (clamped to [0, 1])
    pub fn point_for_progress(&self, progress: f32) -> ScenePoint {
        let p = clamp01(progress);
        let lp = &self.profile;
        let x = p.powf(lp.x_gamma) * lp.usable_width(self.stage) + lp.padding;
        let climb = p.powf(lp.y_gamma) * self.stage.height * lp.height_scale;
        let y = self.stage.height - (climb + lp.padding + lp.ground_base);
        Vec2::new(x, y)
    }

    /// Launch point on the ground line; anchors the trail fill
    pub fn origin_point(&self) -> ScenePoint {
        Vec2::new(self.profile.padding, self.profile.ground_y(self.stage))
    }

    /// Unit direction of travel at `progress`, from a point `epsilon` earlier.
    ///
    /// Falls back to +x when the two points coincide.
    pub fn tangent_at(&self, progress: f32, epsilon: f32, max_progress: f32) -> Vec2 {
        let earlier = (progress - epsilon).clamp(0.0, max_progress.max(0.0));
        let a = self.point_for_progress(earlier);
        let b = self.point_for_progress(progress);
        let v = b - a;
        let len = v.length();
        if len > f32::EPSILON && len.is_finite() {
            v / len
        } else {
            Vec2::X
        }
    }
}
