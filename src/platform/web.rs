//! Browser bridge
//!
//! JS owns the DOM: each animation frame it measures the stage and sprite,
//! calls `tick`, and applies the returned JSON frame.

use std::sync::Once;

use wasm_bindgen::prelude::*;

use crate::settings::{EngineSettings, LayoutMode};
use crate::sim::{RoundState, SpriteSize, Stage, TickInput, tick};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&JsValue::from_str("logger already initialized"));
        }
    });
}

/// Round engine handle exported to JS
#[wasm_bindgen]
pub struct WebEngine {
    state: RoundState,
}

#[wasm_bindgen]
impl WebEngine {
    /// Create an engine; a zero seed picks one from the clock
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> WebEngine {
        init_logging();
        let seed = if seed > 0.0 {
            seed as u64
        } else {
            js_sys::Date::now() as u64
        };
        let settings = EngineSettings::load();
        log::info!("Crash curve engine starting (seed {seed}, layout {})", settings.layout.as_str());
        WebEngine {
            state: RoundState::with_settings(seed, settings),
        }
    }

    /// Advance to `now_ms` and return the frame as JSON
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        now_ms: f64,
        stage_width: f32,
        stage_height: f32,
        sprite_width: f32,
        sprite_height: f32,
        start: bool,
        cycle_rate: bool,
    ) -> String {
        let input = TickInput {
            start,
            cycle_rate,
            stage: Stage::new(stage_width, stage_height),
            sprite: SpriteSize::new(sprite_width, sprite_height),
        };
        let frame = tick(&mut self.state, &input, now_ms);
        match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize frame: {e}");
                String::new()
            }
        }
    }

    #[wasm_bindgen(getter)]
    pub fn rate_label(&self) -> String {
        self.state.playback_rate().label().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn start_enabled(&self) -> bool {
        self.state.start_enabled()
    }

    /// Switch between "fixed" and "adaptive" layouts and persist the choice
    pub fn set_layout(&mut self, mode: &str) -> bool {
        let Some(layout) = LayoutMode::from_str(mode) else {
            log::warn!("Unknown layout mode: {mode}");
            return false;
        };
        self.state.set_layout(layout);
        self.state.settings().save();
        true
    }

    pub fn set_reduced_motion(&mut self, enabled: bool) {
        let settings = self.state.settings_mut();
        settings.reduced_motion = enabled;
        settings.save();
    }

    /// Operator override: replay five crash targets in order
    #[cfg(feature = "operator-queue")]
    pub fn load_fixed_queue(&mut self, values: Vec<f64>) -> Result<(), JsValue> {
        self.state
            .load_fixed_queue(&values)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[cfg(feature = "operator-queue")]
    pub fn clear_fixed_queue(&mut self) {
        self.state.clear_fixed_queue();
    }
}
