//! Round state and frame output types
//!
//! All state the engine mutates lives in `RoundState`; the host only feeds
//! timestamps and stage geometry in and applies `FrameUpdate`s out.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::curve::Stage;
use super::decor::SpriteRig;
use super::sampler::{CoefficientSampler, CrashTarget, QueueError};
use super::timing::{CoefficientGrowth, FlightProfile, PlaybackRate, ScaledClock};
use super::trail::TrailGeometry;
use crate::settings::{EngineSettings, LayoutMode};

/// Externally visible round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Waiting for a start request
    Idle,
    /// Countdown before launch (loader shown)
    Preround,
    /// Sprite on the curve, coefficient climbing (includes the exit run)
    Flying,
    /// Round over, stage shaking
    Crashed,
}

/// Active flight: timing constants fixed at launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FlightState {
    pub clock: ScaledClock,
    pub growth: CoefficientGrowth,
    pub profile: FlightProfile,
}

/// Straight-line exit run after the crash fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ExitingState {
    pub clock: ScaledClock,
    pub start_point: Vec2,
    /// Unit direction of travel
    pub direction: Vec2,
    pub heading_deg: f32,
}

/// Internal phase with per-phase data
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PhaseState {
    Idle,
    Preround { started_at: f64 },
    Flying(FlightState),
    Exiting(ExitingState),
    Crashed { crashed_at: f64 },
}

impl PhaseState {
    pub fn public(&self) -> RoundPhase {
        match self {
            PhaseState::Idle => RoundPhase::Idle,
            PhaseState::Preround { .. } => RoundPhase::Preround,
            PhaseState::Flying(_) | PhaseState::Exiting(_) => RoundPhase::Flying,
            PhaseState::Crashed { .. } => RoundPhase::Crashed,
        }
    }
}

/// Opacities of the animated elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub sprite: f32,
    pub flame: f32,
    pub glow: f32,
    /// Preround loader overlay
    pub loader: bool,
}

impl Visibility {
    pub const IDLE: Self = Self {
        sprite: 1.0,
        flame: 0.0,
        glow: 0.0,
        loader: false,
    };
    pub const PREROUND: Self = Self {
        sprite: 0.0,
        flame: 0.0,
        glow: 0.0,
        loader: true,
    };
    pub const FLYING: Self = Self {
        sprite: 1.0,
        flame: 1.0,
        glow: 0.9,
        loader: false,
    };
}

/// Handle of a started cooldown timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Snapshot of a running cooldown, refreshed once per elapsed second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownStatus {
    pub seconds_left: u32,
    pub percent_elapsed: f32,
}

/// Result of polling the cooldown timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CooldownPoll {
    Ticked(CooldownStatus),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CooldownTimer {
    id: TimerId,
    started_at: f64,
    duration_secs: u32,
    /// Whole seconds already reported
    fired: u32,
}

impl CooldownTimer {
    fn status(&self) -> CooldownStatus {
        let percent = self.fired as f32 / self.duration_secs as f32 * 100.0;
        CooldownStatus {
            seconds_left: self.duration_secs.saturating_sub(self.fired),
            percent_elapsed: percent.clamp(0.0, 100.0),
        }
    }
}

/// Repeating one-second timer gating the start affordance after a round
#[derive(Debug, Clone, Default)]
pub struct Cooldown {
    active: Option<CooldownTimer>,
    next_id: u64,
}

const COOLDOWN_INTERVAL_MS: f64 = 1000.0;

impl Cooldown {
    /// Start a cooldown, cancelling any that is still running
    pub fn begin(&mut self, now_ms: f64, duration_secs: u32) -> Option<TimerId> {
        if let Some(prev) = self.active.take() {
            log::debug!("Cooldown {:?} cancelled by a new cooldown", prev.id);
        }
        if duration_secs == 0 {
            return None;
        }
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.active = Some(CooldownTimer {
            id,
            started_at: now_ms,
            duration_secs,
            fired: 0,
        });
        Some(id)
    }

    /// Stop the running cooldown; returns whether one was running
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<TimerId> {
        self.active.map(|t| t.id)
    }

    pub fn status(&self) -> Option<CooldownStatus> {
        self.active.as_ref().map(CooldownTimer::status)
    }

    /// Advance the timer; reports at most once per call, catching up on missed seconds
    pub fn poll(&mut self, now_ms: f64) -> Option<CooldownPoll> {
        let timer = self.active.as_mut()?;
        let whole = ((now_ms - timer.started_at).max(0.0) / COOLDOWN_INTERVAL_MS).floor();
        let whole = (whole as u32).min(timer.duration_secs);
        if whole <= timer.fired {
            return None;
        }
        timer.fired = whole;
        if timer.fired >= timer.duration_secs {
            self.active = None;
            Some(CooldownPoll::Finished)
        } else {
            Some(CooldownPoll::Ticked(timer.status()))
        }
    }
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoundEvent {
    StartRejected,
    PreroundStarted,
    FlightStarted { boost_ms: f64 },
    CrashTriggered { coefficient: f64, target: f64 },
    Crashed,
    ReturnedToIdle,
    CooldownTick { seconds_left: u32 },
    CooldownFinished,
    RateChanged { label: String },
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameUpdate {
    pub phase: RoundPhase,
    /// Exit run in progress (reported as `Flying`)
    pub exiting: bool,
    pub coefficient: f64,
    pub coefficient_label: String,
    pub start_enabled: bool,
    pub preround_fill: f32,
    pub rate_label: &'static str,
    pub progress: f32,
    pub trail: TrailGeometry,
    pub rig: SpriteRig,
    pub visibility: Visibility,
    pub shake: bool,
    pub cooldown: Option<CooldownStatus>,
    pub events: Vec<RoundEvent>,
}

/// RNG state wrapper: one PCG stream per consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64, stream: u64) -> Self {
        Self { seed, stream }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// PCG stream feeding the crash sampler
const SAMPLER_STREAM: u64 = 0xC0FFEE;
/// PCG stream feeding per-flight boost durations
const FLIGHT_STREAM: u64 = 0xB00572;

/// Complete round engine state
#[derive(Debug, Clone)]
pub struct RoundState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub(crate) settings: EngineSettings,
    pub(crate) sampler: CoefficientSampler,
    pub(crate) flight_rng: Pcg32,
    pub(crate) rate: PlaybackRate,
    pub(crate) phase: PhaseState,
    /// Chosen at preround, consumed by the crash check
    pub(crate) crash_target: Option<CrashTarget>,
    /// Smoothed progress along the curve
    pub(crate) progress: f32,
    pub(crate) coefficient: f64,
    pub(crate) preround_fill: f32,
    pub(crate) trail: TrailGeometry,
    pub(crate) rig: SpriteRig,
    pub(crate) visibility: Visibility,
    pub(crate) cooldown: Cooldown,
    pub(crate) shake_until: Option<f64>,
    /// Stage size seen on the previous tick
    pub(crate) stage: Option<Stage>,
    /// Latest timestamp seen; earlier ones are treated as this
    pub(crate) last_now: f64,
}

impl RoundState {
    /// Create an idle engine with default settings
    pub fn new(seed: u64) -> Self {
        Self::with_settings(seed, EngineSettings::default())
    }

    /// Create an idle engine; out-of-range settings are corrected
    pub fn with_settings(seed: u64, settings: EngineSettings) -> Self {
        Self {
            seed,
            settings: settings.sanitized(),
            sampler: CoefficientSampler::new(RngState::new(seed, SAMPLER_STREAM).to_rng()),
            flight_rng: RngState::new(seed, FLIGHT_STREAM).to_rng(),
            rate: PlaybackRate::X1,
            phase: PhaseState::Idle,
            crash_target: None,
            progress: 0.0,
            coefficient: 1.0,
            preround_fill: 0.0,
            trail: TrailGeometry::default(),
            rig: SpriteRig::default(),
            visibility: Visibility::IDLE,
            cooldown: Cooldown::default(),
            shake_until: None,
            stage: None,
            last_now: f64::NEG_INFINITY,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase.public()
    }

    /// True during the straight-line exit run after the crash fired
    pub fn is_exiting(&self) -> bool {
        matches!(self.phase, PhaseState::Exiting(_))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Switch layout mode; the next tick redraws as if the stage had resized
    pub fn set_layout(&mut self, mode: LayoutMode) {
        self.settings.layout = mode;
        self.stage = None;
    }

    /// Tuning changes apply from the next phase that reads them
    pub fn settings_mut(&mut self) -> &mut EngineSettings {
        &mut self.settings
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Crash target of the round in progress (none once consumed)
    pub fn crash_target(&self) -> Option<CrashTarget> {
        self.crash_target
    }

    pub fn trail(&self) -> &TrailGeometry {
        &self.trail
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Start affordance: idle with no cooldown running
    pub fn start_enabled(&self) -> bool {
        matches!(self.phase, PhaseState::Idle) && !self.cooldown.is_active()
    }

    pub fn playback_rate(&self) -> PlaybackRate {
        self.rate
    }

    /// Change playback speed; running phase clocks re-anchor at `now_ms`
    pub fn set_playback_rate(&mut self, now_ms: f64, rate: PlaybackRate) {
        let now = now_ms.max(self.last_now);
        match &mut self.phase {
            PhaseState::Flying(flight) => flight.clock.set_rate(now, rate),
            PhaseState::Exiting(exit) => exit.clock.set_rate(now, rate),
            _ => {}
        }
        log::debug!("Playback rate {} -> {}", self.rate.label(), rate.label());
        self.rate = rate;
    }

    /// Operator override: replay five fixed crash targets round-robin
    pub fn load_fixed_queue(&mut self, values: &[f64]) -> Result<(), QueueError> {
        self.sampler.load_fixed_queue(values)
    }

    pub fn clear_fixed_queue(&mut self) {
        self.sampler.clear_fixed_queue();
    }

    /// Shake is still running at `now_ms`
    pub(crate) fn shaking(&self, now_ms: f64) -> bool {
        self.shake_until.is_some_and(|until| now_ms < until)
    }

    /// Assemble the frame record from current state
    pub(crate) fn frame(&self, now_ms: f64, events: Vec<RoundEvent>) -> FrameUpdate {
        FrameUpdate {
            phase: self.phase(),
            exiting: self.is_exiting(),
            coefficient: self.coefficient,
            coefficient_label: super::timing::coefficient_label(self.coefficient),
            start_enabled: self.start_enabled(),
            preround_fill: self.preround_fill,
            rate_label: self.rate.label(),
            progress: self.progress,
            trail: self.trail.clone(),
            rig: self.rig,
            visibility: self.visibility,
            shake: self.shaking(now_ms),
            cooldown: self.cooldown.status(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = RoundState::new(12345);
        assert_eq!(state.phase(), RoundPhase::Idle);
        assert!(state.start_enabled());
        assert_eq!(state.coefficient(), 1.0);
        assert_eq!(state.playback_rate(), PlaybackRate::X1);
    }

    #[test]
    fn test_same_seed_same_targets() {
        let mut a = RoundState::new(99999);
        let mut b = RoundState::new(99999);
        for _ in 0..10 {
            assert_eq!(a.sampler.sample(), b.sampler.sample());
        }
    }

    #[test]
    fn test_cooldown_counts_down_each_second() {
        let mut cd = Cooldown::default();
        cd.begin(0.0, 3);
        assert_eq!(cd.status().unwrap().seconds_left, 3);
        assert_eq!(cd.poll(500.0), None);
        match cd.poll(1000.0) {
            Some(CooldownPoll::Ticked(s)) => {
                assert_eq!(s.seconds_left, 2);
                assert!((s.percent_elapsed - 100.0 / 3.0).abs() < 1e-3);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cd.poll(1999.0), None);
        assert_eq!(cd.poll(3000.0), Some(CooldownPoll::Finished));
        assert!(!cd.is_active());
        assert_eq!(cd.poll(4000.0), None);
    }

    #[test]
    fn test_cooldown_begin_cancels_previous() {
        let mut cd = Cooldown::default();
        let first = cd.begin(0.0, 10).unwrap();
        let second = cd.begin(5000.0, 10).unwrap();
        assert_ne!(first, second);
        assert_eq!(cd.active_id(), Some(second));
        // The old timer would have finished at 10s; the new one keeps going
        assert!(matches!(cd.poll(10_000.0), Some(CooldownPoll::Ticked(_))));
        assert!(cd.is_active());
        assert_eq!(cd.poll(15_000.0), Some(CooldownPoll::Finished));
    }

    #[test]
    fn test_cooldown_cancel() {
        let mut cd = Cooldown::default();
        cd.begin(0.0, 10);
        assert!(cd.cancel());
        assert!(!cd.cancel());
        assert_eq!(cd.poll(20_000.0), None);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_string(&RoundEvent::CooldownTick { seconds_left: 4 }).unwrap();
        assert_eq!(json, r#"{"type":"CooldownTick","seconds_left":4}"#);
    }
}
