//! Sprite, flame and glow placement
//!
//! The flame and glow hang off an anchor near the sprite's visual centre and
//! follow its heading, so the three elements stay glued together both on the
//! curve and during the exit run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::curve::{ScenePoint, Stage};
use crate::consts::{HEADING_BASE_DEG, HEADING_TILT_DEG, SPRITE_OFFSET_X, SPRITE_OFFSET_Y};
use crate::settings::LayoutMode;

/// Anchor as a fraction of sprite size (matches the sprite's transform origin)
const ANCHOR_FRAC: Vec2 = Vec2::new(0.40, 0.50);

/// Flame offsets: sideways/back as fractions of width, down as fraction of height
const FLAME_SIDE: f32 = 0.22;
const FLAME_BACK: f32 = 0.16;
const FLAME_DOWN: f32 = 0.18;
/// Flame tilt relative to the sprite heading (degrees)
const FLAME_ANGLE_DEG: f32 = 32.0;

/// Glow sits this far behind the anchor (fraction of width)
const GLOW_BACK: f32 = 0.32;
const GLOW_STAGE_FRAC: f32 = 0.32;
const GLOW_MIN: f32 = 220.0;
const GLOW_MAX: f32 = 360.0;

/// Fallback sprite side in fixed layouts
const FALLBACK_SPRITE_PX: f32 = 150.0;
/// Fallback sprite side in adaptive layouts, in ui-rem units
const FALLBACK_SPRITE_REM: f32 = 7.5;

/// Sprite bounding size reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SpriteSize {
    pub width: f32,
    pub height: f32,
}

impl SpriteSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Substitute fallbacks for missing or zero dimensions
    pub fn resolve(self, stage: Stage, mode: LayoutMode) -> Self {
        let or = |v: f32, fallback: f32| if v.is_finite() && v > 0.0 { v } else { fallback };
        match mode {
            LayoutMode::Fixed => Self::new(
                or(self.width, FALLBACK_SPRITE_PX),
                or(self.height, FALLBACK_SPRITE_PX),
            ),
            LayoutMode::Adaptive => {
                let width = or(self.width, FALLBACK_SPRITE_REM * stage.ui_rem());
                Self::new(width, or(self.height, width))
            }
        }
    }
}

/// Heading for a given progress: a fixed tilt that grows with progress
#[inline]
pub fn heading_for_progress(progress: f32) -> f32 {
    HEADING_BASE_DEG + progress * HEADING_TILT_DEG
}

/// Sprite transform: translation then rotation about its origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SpritePose {
    pub translate: Vec2,
    pub rotation_deg: f32,
}

impl SpritePose {
    pub fn at_point(point: ScenePoint, heading_deg: f32) -> Self {
        Self {
            translate: point + Vec2::new(SPRITE_OFFSET_X, SPRITE_OFFSET_Y),
            rotation_deg: heading_deg,
        }
    }
}

/// Flame transform; the flame image is drawn vertically mirrored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FlamePose {
    pub position: Vec2,
    pub rotation_deg: f32,
    pub mirror_y: bool,
}

/// Square glow centred behind the sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GlowPose {
    pub center: Vec2,
    pub size: f32,
}

impl GlowPose {
    pub fn top_left(&self) -> Vec2 {
        self.center - Vec2::splat(self.size / 2.0)
    }
}

/// Sprite plus the decorations derived from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SpriteRig {
    pub sprite: SpritePose,
    pub flame: FlamePose,
    pub glow: GlowPose,
}

/// Glow side length for a stage width
pub fn glow_size(stage_width: f32) -> f32 {
    (stage_width * GLOW_STAGE_FRAC).clamp(GLOW_MIN, GLOW_MAX)
}

/// Place sprite, flame and glow for a scene point and heading
pub fn place_decorations(
    point: ScenePoint,
    heading_deg: f32,
    size: SpriteSize,
    stage_width: f32,
) -> SpriteRig {
    let sprite = SpritePose::at_point(point, heading_deg);
    let anchor = sprite.translate + Vec2::new(size.width, size.height) * ANCHOR_FRAC;

    let dir = Vec2::from_angle(heading_deg.to_radians());
    let right = Vec2::new(dir.y, -dir.x);

    let flame = FlamePose {
        position: anchor + right * (size.width * FLAME_SIDE) - dir * (size.width * FLAME_BACK)
            + Vec2::new(0.0, size.height * FLAME_DOWN),
        rotation_deg: heading_deg + FLAME_ANGLE_DEG,
        mirror_y: true,
    };

    let glow = GlowPose {
        center: anchor - dir * (size.width * GLOW_BACK),
        size: glow_size(stage_width),
    };

    SpriteRig {
        sprite,
        flame,
        glow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_heading_range() {
        assert_eq!(heading_for_progress(0.0), 8.0);
        assert_eq!(heading_for_progress(1.0), 20.0);
    }

    #[test]
    fn test_zero_heading_offsets() {
        let rig = place_decorations(Vec2::new(100.0, 200.0), 0.0, SpriteSize::new(100.0, 50.0), 900.0);
        assert_eq!(rig.sprite.translate, Vec2::new(106.0, 198.0));
        // anchor = (146, 223); dir = +x, right = (0, -1)
        assert!(approx(rig.flame.position, Vec2::new(146.0 - 16.0, 223.0 - 22.0 + 9.0)));
        assert!(approx(rig.glow.center, Vec2::new(146.0 - 32.0, 223.0)));
        assert_eq!(rig.flame.rotation_deg, 32.0);
        assert!(rig.flame.mirror_y);
    }

    #[test]
    fn test_glow_size_clamped() {
        assert_eq!(glow_size(300.0), 220.0);
        assert!((glow_size(900.0) - 288.0).abs() < 1e-3);
        assert_eq!(glow_size(2000.0), 360.0);
        let g = GlowPose { center: Vec2::new(300.0, 300.0), size: 220.0 };
        assert_eq!(g.top_left(), Vec2::new(190.0, 190.0));
    }

    #[test]
    fn test_rig_translates_with_point() {
        let size = SpriteSize::new(120.0, 120.0);
        let a = place_decorations(Vec2::new(10.0, 10.0), 14.0, size, 900.0);
        let b = place_decorations(Vec2::new(60.0, -30.0), 14.0, size, 900.0);
        let shift = Vec2::new(50.0, -40.0);
        assert!(approx(b.flame.position - a.flame.position, shift));
        assert!(approx(b.glow.center - a.glow.center, shift));
    }

    #[test]
    fn test_sprite_size_fallbacks() {
        let stage = Stage::new(900.0, 500.0);
        assert_eq!(
            SpriteSize::default().resolve(stage, LayoutMode::Fixed),
            SpriteSize::new(150.0, 150.0)
        );
        assert_eq!(
            SpriteSize::default().resolve(stage, LayoutMode::Adaptive),
            SpriteSize::new(120.0, 120.0)
        );
        assert_eq!(
            SpriteSize::new(80.0, 0.0).resolve(stage, LayoutMode::Adaptive),
            SpriteSize::new(80.0, 80.0)
        );
        assert_eq!(
            SpriteSize::new(80.0, 0.0).resolve(stage, LayoutMode::Fixed),
            SpriteSize::new(80.0, 150.0)
        );
        assert_eq!(
            SpriteSize::new(f32::NAN, 40.0).resolve(stage, LayoutMode::Fixed),
            SpriteSize::new(150.0, 40.0)
        );
    }
}
