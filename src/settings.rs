//! Engine settings and preferences
//!
//! Persisted in LocalStorage on the web; native builds always use defaults.

use serde::{Deserialize, Serialize};

use crate::consts::CRASH_MAX;

/// How the curve layout reacts to the stage size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutMode {
    /// Fixed paddings per viewport class
    Fixed,
    /// Paddings scale with stage width
    #[default]
    Adaptive,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Fixed => "Fixed",
            LayoutMode::Adaptive => "Adaptive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Some(LayoutMode::Fixed),
            "adaptive" | "responsive" => Some(LayoutMode::Adaptive),
            _ => None,
        }
    }
}

/// Round timing and presentation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Round timing ===
    /// Preround countdown (real seconds, unaffected by playback rate)
    pub preround_secs: f64,
    /// Cooldown before another round may start
    pub cooldown_secs: u32,
    /// Exit run after the crash fires (scaled milliseconds)
    pub exit_duration_ms: f64,
    /// Distance covered by the exit run (pixels)
    pub exit_distance_px: f32,
    /// Stage shake after the crash (real milliseconds)
    pub shake_ms: f64,
    /// Pause between crash and returning to idle (real milliseconds)
    pub crash_pause_ms: f64,

    // === Flight ===
    /// Coefficient display cap
    pub max_coefficient: f64,
    /// Boost duration is drawn uniformly from this range (seconds)
    pub boost_secs_min: f64,
    pub boost_secs_max: f64,
    /// Per-frame smoothing toward target progress
    pub smoothing_boost: f32,
    pub smoothing_hold: f32,

    // === Layout ===
    pub layout: LayoutMode,

    // === Accessibility ===
    /// Stage shake on crash
    pub screen_shake: bool,
    /// Reduced motion (suppresses shake)
    pub reduced_motion: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            preround_secs: 2.0,
            cooldown_secs: 10,
            exit_duration_ms: 180.0,
            exit_distance_px: 360.0,
            shake_ms: 360.0,
            crash_pause_ms: 280.0,

            max_coefficient: 50.0,
            boost_secs_min: 1.0,
            boost_secs_max: 1.5,
            smoothing_boost: 0.35,
            smoothing_hold: 0.14,

            layout: LayoutMode::Adaptive,

            screen_shake: true,
            reduced_motion: false,
        }
    }
}

impl EngineSettings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Exit run speed in pixels per scaled millisecond
    pub fn exit_speed(&self) -> f32 {
        if self.exit_duration_ms > 0.0 {
            self.exit_distance_px / self.exit_duration_ms as f32
        } else {
            0.0
        }
    }

    /// Sanitized boost range (min <= max, both positive)
    pub fn boost_range(&self) -> (f64, f64) {
        let lo = self.boost_secs_min.max(0.05);
        let hi = self.boost_secs_max.max(lo);
        (lo, hi)
    }

    /// Replace out-of-range values, logging each correction.
    ///
    /// The coefficient cap never drops below the highest crash target, so
    /// every round can reach its crash.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let mut s = self;

        let cap_ok = s.max_coefficient >= CRASH_MAX;
        let cap_fix = if s.max_coefficient.is_nan() { d.max_coefficient } else { CRASH_MAX };
        correct("max_coefficient", &mut s.max_coefficient, cap_ok, cap_fix);

        for (field, value, fallback) in [
            ("smoothing_boost", &mut s.smoothing_boost, d.smoothing_boost),
            ("smoothing_hold", &mut s.smoothing_hold, d.smoothing_hold),
        ] {
            let ok = *value > 0.0 && *value <= 1.0;
            correct(field, value, ok, fallback);
        }

        for (field, value, fallback) in [
            ("preround_secs", &mut s.preround_secs, d.preround_secs),
            ("exit_duration_ms", &mut s.exit_duration_ms, d.exit_duration_ms),
            ("shake_ms", &mut s.shake_ms, d.shake_ms),
            ("crash_pause_ms", &mut s.crash_pause_ms, d.crash_pause_ms),
            ("boost_secs_min", &mut s.boost_secs_min, d.boost_secs_min),
            ("boost_secs_max", &mut s.boost_secs_max, d.boost_secs_max),
        ] {
            let ok = value.is_finite() && *value >= 0.0;
            correct(field, value, ok, fallback);
        }

        let distance_ok = s.exit_distance_px.is_finite() && s.exit_distance_px >= 0.0;
        correct("exit_distance_px", &mut s.exit_distance_px, distance_ok, d.exit_distance_px);
        s
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "crash_curve_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Self>(&json) {
                    log::info!("Loaded engine settings from LocalStorage");
                    return settings.sanitized();
                }
            }
        }

        log::info!("Using default engine settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Engine settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Overwrite `value` with `fallback` unless `valid`
fn correct<T: Copy + std::fmt::Display>(field: &str, value: &mut T, valid: bool, fallback: T) {
    if !valid {
        log::warn!("Setting {field} = {value} is out of range, using {fallback}");
        *value = fallback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_round_timing() {
        let s = EngineSettings::default();
        assert_eq!(s.preround_secs, 2.0);
        assert_eq!(s.cooldown_secs, 10);
        assert_eq!(s.exit_duration_ms, 180.0);
        assert!((s.exit_speed() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let s = EngineSettings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!s.effective_screen_shake());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{"cooldown_secs": 15}"#).unwrap();
        assert_eq!(s.cooldown_secs, 15);
        assert_eq!(s.layout, LayoutMode::Adaptive);
    }

    #[test]
    fn test_low_coefficient_cap_is_raised() {
        let s: EngineSettings = serde_json::from_str(r#"{"max_coefficient": 2.0}"#).unwrap();
        let s = s.sanitized();
        assert_eq!(s.max_coefficient, CRASH_MAX);
    }

    #[test]
    fn test_sanitized_replaces_bad_values() {
        let s = EngineSettings {
            smoothing_boost: 0.0,
            smoothing_hold: 1.5,
            preround_secs: -1.0,
            shake_ms: f64::NAN,
            exit_distance_px: -5.0,
            max_coefficient: f64::NAN,
            ..Default::default()
        }
        .sanitized();
        let d = EngineSettings::default();
        assert_eq!(s.smoothing_boost, d.smoothing_boost);
        assert_eq!(s.smoothing_hold, d.smoothing_hold);
        assert_eq!(s.preround_secs, d.preround_secs);
        assert_eq!(s.shake_ms, d.shake_ms);
        assert_eq!(s.exit_distance_px, d.exit_distance_px);
        assert_eq!(s.max_coefficient, d.max_coefficient);
    }

    #[test]
    fn test_sanitized_keeps_valid_values() {
        let s = EngineSettings {
            max_coefficient: 10.0,
            smoothing_hold: 1.0,
            preround_secs: 0.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.max_coefficient, 10.0);
        assert_eq!(s.smoothing_hold, 1.0);
        assert_eq!(s.preround_secs, 0.0);
    }

    #[test]
    fn test_layout_mode_from_str() {
        assert_eq!(LayoutMode::from_str("FIXED"), Some(LayoutMode::Fixed));
        assert_eq!(LayoutMode::from_str("responsive"), Some(LayoutMode::Adaptive));
        assert_eq!(LayoutMode::from_str("other"), None);
    }
}
