//! Headless host with a simulated frame clock

use crate::sim::{FrameUpdate, RoundEvent, RoundPhase, RoundState, SpriteSize, Stage, TickInput, tick};

/// Default simulated frame rate
pub const DEFAULT_FRAME_HZ: f64 = 60.0;

/// Events of one round with the timestamps they were reported at
#[derive(Debug, Clone, Default)]
pub struct RoundTrace {
    pub events: Vec<(f64, RoundEvent)>,
    /// Final frame of the run
    pub last_frame: Option<FrameUpdate>,
}

impl RoundTrace {
    /// Timestamp of the first event matching `pred`
    pub fn time_of(&self, pred: impl Fn(&RoundEvent) -> bool) -> Option<f64> {
        self.events.iter().find(|(_, e)| pred(e)).map(|(t, _)| *t)
    }
}

/// Drives a `RoundState` at a fixed frame rate without a browser
pub struct HeadlessHost {
    pub state: RoundState,
    pub input: TickInput,
    now_ms: f64,
    frame_ms: f64,
}

impl HeadlessHost {
    pub fn new(state: RoundState, stage: Stage) -> Self {
        Self {
            state,
            input: TickInput {
                stage,
                ..Default::default()
            },
            now_ms: 0.0,
            frame_ms: 1000.0 / DEFAULT_FRAME_HZ,
        }
    }

    pub fn with_frame_rate(mut self, hz: f64) -> Self {
        if hz > 0.0 {
            self.frame_ms = 1000.0 / hz;
        }
        self
    }

    pub fn with_sprite(mut self, sprite: SpriteSize) -> Self {
        self.input.sprite = sprite;
        self
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Press start on the next frame
    pub fn press_start(&mut self) {
        self.input.start = true;
    }

    /// Press the playback-rate button on the next frame
    pub fn press_rate(&mut self) {
        self.input.cycle_rate = true;
    }

    pub fn resize(&mut self, stage: Stage) {
        self.input.stage = stage;
    }

    /// Tick at the current time, then advance the clock one frame
    pub fn step(&mut self) -> FrameUpdate {
        let frame = tick(&mut self.state, &self.input, self.now_ms);
        // Button presses are one-shot
        self.input.start = false;
        self.input.cycle_rate = false;
        self.now_ms += self.frame_ms;
        frame
    }

    /// Step until `done` holds or `max_ms` of simulated time passes
    pub fn run_until(
        &mut self,
        max_ms: f64,
        mut done: impl FnMut(&FrameUpdate) -> bool,
    ) -> Option<FrameUpdate> {
        let deadline = self.now_ms + max_ms;
        while self.now_ms <= deadline {
            let frame = self.step();
            if done(&frame) {
                return Some(frame);
            }
        }
        None
    }

    /// Start a round and run it until the engine is back in `Idle`
    pub fn run_round(&mut self, max_ms: f64) -> RoundTrace {
        let mut trace = RoundTrace::default();
        self.press_start();
        let deadline = self.now_ms + max_ms;
        while self.now_ms <= deadline {
            let at = self.now_ms;
            let frame = self.step();
            trace.events.extend(frame.events.iter().cloned().map(|e| (at, e)));
            let finished = frame.events.contains(&RoundEvent::ReturnedToIdle)
                || frame.events.contains(&RoundEvent::StartRejected);
            trace.last_frame = Some(frame);
            if finished {
                break;
            }
        }
        if trace.last_frame.as_ref().is_some_and(|f| f.phase != RoundPhase::Idle) {
            log::warn!("Round did not finish within {:.0}ms", max_ms);
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_advances_clock_and_clears_buttons() {
        let mut host = HeadlessHost::new(RoundState::new(5), Stage::default()).with_frame_rate(50.0);
        host.press_start();
        let frame = host.step();
        assert_eq!(frame.phase, RoundPhase::Preround);
        assert_eq!(host.now_ms(), 20.0);
        assert!(!host.input.start);
    }

    #[test]
    fn test_run_round_returns_to_idle() {
        let mut state = RoundState::new(5);
        state.load_fixed_queue(&[1.25; 5]).unwrap();
        let mut host = HeadlessHost::new(state, Stage::new(1280.0, 720.0));
        let trace = host.run_round(60_000.0);
        let last = trace.last_frame.as_ref().unwrap();
        assert_eq!(last.phase, RoundPhase::Idle);
        assert!(trace.time_of(|e| matches!(e, RoundEvent::Crashed)).is_some());
    }
}
