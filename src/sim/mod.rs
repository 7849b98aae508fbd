//! Deterministic round engine
//!
//! All round logic lives here. This module must stay pure:
//! - Time only enters through `tick` timestamps
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod curve;
pub mod decor;
pub mod sampler;
pub mod state;
pub mod tick;
pub mod timing;
pub mod trail;

pub use curve::{FlightCurve, LayoutProfile, ScenePoint, Stage, ViewportClass};
pub use decor::{SpriteRig, SpriteSize, place_decorations};
pub use sampler::{CoefficientSampler, CrashTarget, QueueError};
pub use state::{
    Cooldown, CooldownStatus, FrameUpdate, RoundEvent, RoundPhase, RoundState, Visibility,
};
pub use tick::{TickInput, tick};
pub use timing::{CoefficientGrowth, FlightProfile, PlaybackRate, ScaledClock};
pub use trail::{Path, PathCommand, TrailGeometry, build_paths};
