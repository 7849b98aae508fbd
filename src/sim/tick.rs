//! Per-frame round update
//!
//! The host calls `tick` once per animation frame with a real-time timestamp.
//! Every time-dependent quantity is recomputed from that timestamp, so frame
//! rate only affects smoothing, never the coefficient or crash timing.

use rand::Rng;

use super::curve::{FlightCurve, Stage};
use super::decor::{SpriteSize, heading_for_progress, place_decorations};
use super::state::{
    CooldownPoll, ExitingState, FlightState, FrameUpdate, PhaseState, RoundEvent, RoundState,
    Visibility,
};
use super::timing::{CoefficientGrowth, FlightProfile, ScaledClock};
use super::trail::{TrailGeometry, trail_for_progress};
use crate::clamp01;
use crate::consts::EXIT_TANGENT_EPSILON;

/// Host input for one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Start button pressed
    pub start: bool,
    /// Playback-rate button pressed
    pub cycle_rate: bool,
    /// Current stage size
    pub stage: Stage,
    /// Sprite bounding size as rendered (zero when unknown)
    pub sprite: SpriteSize,
}

/// Geometry shared by every step of one frame
struct FrameCtx {
    now: f64,
    stage: Stage,
    curve: FlightCurve,
    sprite: SpriteSize,
}

/// Advance the round to `now_ms` and report what to draw
pub fn tick(state: &mut RoundState, input: &TickInput, now_ms: f64) -> FrameUpdate {
    let now = now_ms.max(state.last_now);
    state.last_now = now;

    let mode = state.settings.layout;
    let ctx = FrameCtx {
        now,
        stage: input.stage,
        curve: FlightCurve::for_stage(input.stage, mode),
        sprite: input.sprite.resolve(input.stage, mode),
    };
    let resized = state.stage != Some(input.stage);
    state.stage = Some(input.stage);

    let mut events = Vec::new();

    if input.cycle_rate {
        let rate = state.rate.next();
        state.set_playback_rate(now, rate);
        events.push(RoundEvent::RateChanged {
            label: rate.label().to_string(),
        });
    }

    match state.cooldown.poll(now) {
        Some(CooldownPoll::Ticked(status)) => events.push(RoundEvent::CooldownTick {
            seconds_left: status.seconds_left,
        }),
        Some(CooldownPoll::Finished) => {
            log::debug!("Cooldown finished");
            events.push(RoundEvent::CooldownFinished);
        }
        None => {}
    }

    if state.shake_until.is_some_and(|until| now >= until) {
        state.shake_until = None;
    }

    if input.start {
        request_start(state, &ctx, &mut events);
    }

    match state.phase {
        PhaseState::Idle => {
            if resized {
                render_static(state, &ctx);
            }
        }
        PhaseState::Preround { started_at } => {
            step_preround(state, &ctx, started_at, resized, &mut events)
        }
        PhaseState::Flying(flight) => step_flying(state, &ctx, flight, &mut events),
        PhaseState::Exiting(exit) => step_exiting(state, &ctx, exit, &mut events),
        PhaseState::Crashed { crashed_at } => {
            if resized {
                render_static(state, &ctx);
            }
            if now - crashed_at >= state.settings.crash_pause_ms {
                return_to_idle(state, now, &mut events);
            }
        }
    }

    state.frame(now, events)
}

/// Begin a preround if idle and no cooldown is running
fn request_start(state: &mut RoundState, ctx: &FrameCtx, events: &mut Vec<RoundEvent>) {
    if !state.start_enabled() {
        log::debug!(
            "Start ignored: phase {:?}, cooldown active {}",
            state.phase(),
            state.cooldown.is_active()
        );
        events.push(RoundEvent::StartRejected);
        return;
    }

    let target = state.sampler.sample();
    log::info!("Round started, crash target x{:.2}", target.value());

    state.crash_target = Some(target);
    state.phase = PhaseState::Preround { started_at: ctx.now };
    state.progress = 0.0;
    state.coefficient = 1.0;
    state.preround_fill = 0.0;
    state.trail = TrailGeometry::default();
    state.visibility = Visibility::PREROUND;
    place_on_curve(state, ctx);
    events.push(RoundEvent::PreroundStarted);
}

fn step_preround(
    state: &mut RoundState,
    ctx: &FrameCtx,
    started_at: f64,
    resized: bool,
    events: &mut Vec<RoundEvent>,
) {
    let duration_ms = state.settings.preround_secs * 1000.0;
    let fill = if duration_ms > 0.0 {
        clamp01(((ctx.now - started_at) / duration_ms) as f32)
    } else {
        1.0
    };
    state.preround_fill = fill;

    if fill >= 1.0 {
        let flight = launch(state, ctx, events);
        step_flying(state, ctx, flight, events);
    } else if resized {
        render_static(state, ctx);
    }
}

/// Fix this flight's timing and enter `Flying`
fn launch(state: &mut RoundState, ctx: &FrameCtx, events: &mut Vec<RoundEvent>) -> FlightState {
    let (lo, hi) = state.settings.boost_range();
    let boost_secs = state.flight_rng.random_range(lo..=hi);
    let boost_ms = boost_secs * 1000.0;

    let flight = FlightState {
        clock: ScaledClock::start(ctx.now, state.rate),
        growth: CoefficientGrowth::for_boost(boost_secs, state.settings.max_coefficient),
        profile: FlightProfile::new(boost_ms, ctx.stage.viewport()),
    };
    log::debug!("Launch: boost {:.0}ms, rate {}", boost_ms, state.rate.label());

    state.phase = PhaseState::Flying(flight);
    state.visibility = Visibility::FLYING;
    events.push(RoundEvent::FlightStarted { boost_ms });
    flight
}

fn step_flying(
    state: &mut RoundState,
    ctx: &FrameCtx,
    flight: FlightState,
    events: &mut Vec<RoundEvent>,
) {
    let elapsed_ms = flight.clock.scaled_ms(ctx.now);
    let coefficient = flight.growth.coefficient(elapsed_ms / 1000.0);
    let (target, holding) = flight.profile.target_progress(elapsed_ms);

    let alpha = if holding {
        state.settings.smoothing_hold
    } else {
        state.settings.smoothing_boost
    };
    let smoothed = state.progress + (target - state.progress) * alpha;
    // Sway can pull the target back; the sprite never retreats along the curve
    state.progress = state.progress.max(smoothed);
    state.coefficient = coefficient;

    place_on_curve(state, ctx);
    state.trail = trail_for_progress(&ctx.curve, state.progress);

    let Some(crash) = state.crash_target else {
        return;
    };
    if coefficient < crash.value() {
        return;
    }

    // Crash: freeze the trail and leave along the current tangent
    state.crash_target = None;
    let heading_deg = heading_for_progress(state.progress);
    let direction = ctx.curve.tangent_at(
        state.progress,
        EXIT_TANGENT_EPSILON,
        flight.profile.max_progress as f32,
    );
    state.phase = PhaseState::Exiting(ExitingState {
        clock: ScaledClock::start(ctx.now, state.rate),
        start_point: ctx.curve.point_for_progress(state.progress),
        direction,
        heading_deg,
    });
    log::info!(
        "Crash at x{:.2} (target x{:.2}) after {:.0}ms",
        coefficient,
        crash.value(),
        elapsed_ms
    );
    events.push(RoundEvent::CrashTriggered {
        coefficient,
        target: crash.value(),
    });
}

fn step_exiting(
    state: &mut RoundState,
    ctx: &FrameCtx,
    exit: ExitingState,
    events: &mut Vec<RoundEvent>,
) {
    let elapsed_ms = exit.clock.scaled_ms(ctx.now);
    let travelled = state.settings.exit_speed() * elapsed_ms as f32;
    let point = exit.start_point + exit.direction * travelled;
    state.rig = place_decorations(point, exit.heading_deg, ctx.sprite, ctx.stage.width);

    if elapsed_ms >= state.settings.exit_duration_ms {
        state.phase = PhaseState::Crashed { crashed_at: ctx.now };
        if state.settings.effective_screen_shake() {
            state.shake_until = Some(ctx.now + state.settings.shake_ms);
        }
        log::debug!("Exit run finished after {:.0}ms", elapsed_ms);
        events.push(RoundEvent::Crashed);
    }
}

fn return_to_idle(state: &mut RoundState, now: f64, events: &mut Vec<RoundEvent>) {
    state.phase = PhaseState::Idle;
    state.cooldown.begin(now, state.settings.cooldown_secs);
    log::debug!("Round over, cooldown {}s", state.settings.cooldown_secs);
    events.push(RoundEvent::ReturnedToIdle);
}

/// Sprite and decorations at the current progress
fn place_on_curve(state: &mut RoundState, ctx: &FrameCtx) {
    let point = ctx.curve.point_for_progress(state.progress);
    state.rig = place_decorations(
        point,
        heading_for_progress(state.progress),
        ctx.sprite,
        ctx.stage.width,
    );
}

/// Redraw sprite and trail for a new stage size while nothing is flying
fn render_static(state: &mut RoundState, ctx: &FrameCtx) {
    place_on_curve(state, ctx);
    state.trail = trail_for_progress(&ctx.curve, state.progress);
}
