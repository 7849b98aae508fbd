//! Platform abstraction layer
//!
//! Hosts own the clock and the stage; the engine only sees timestamps:
//! - `headless`: simulated fixed-rate clock for native runs and tests
//! - `web`: browser bridge driven by `requestAnimationFrame` (wasm32 only)

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::{HeadlessHost, RoundTrace};
