//! End-to-end rounds through the headless host

use crash_curve::platform::{HeadlessHost, RoundTrace};
use crash_curve::EngineSettings;
use crash_curve::sim::{QueueError, RoundEvent, RoundPhase, RoundState, Stage};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn host_with_queue(seed: u64, queue: &[f64]) -> HeadlessHost {
    let mut state = RoundState::new(seed);
    state.load_fixed_queue(queue).unwrap();
    HeadlessHost::new(state, Stage::new(900.0, 500.0))
}

fn crash_of(trace: &RoundTrace) -> (f64, f64, f64) {
    trace
        .events
        .iter()
        .find_map(|(t, e)| match e {
            RoundEvent::CrashTriggered { coefficient, target } => Some((*t, *coefficient, *target)),
            _ => None,
        })
        .expect("round crashed")
}

fn wait_for_cooldown(host: &mut HeadlessHost) {
    host.run_until(20_000.0, |f| f.start_enabled)
        .expect("cooldown finished");
}

#[test]
fn test_full_round_event_order_and_timing() {
    let mut host = host_with_queue(11, &[1.5; 5]);
    let trace = host.run_round(60_000.0);

    let kinds: Vec<&str> = trace
        .events
        .iter()
        .filter_map(|(_, e)| match e {
            RoundEvent::PreroundStarted => Some("preround"),
            RoundEvent::FlightStarted { .. } => Some("flight"),
            RoundEvent::CrashTriggered { .. } => Some("crash"),
            RoundEvent::Crashed => Some("crashed"),
            RoundEvent::ReturnedToIdle => Some("idle"),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, ["preround", "flight", "crash", "crashed", "idle"]);

    let preround = trace.time_of(|e| *e == RoundEvent::PreroundStarted).unwrap();
    let flight = trace
        .time_of(|e| matches!(e, RoundEvent::FlightStarted { .. }))
        .unwrap();
    let (crash, coefficient, target) = crash_of(&trace);
    let crashed = trace.time_of(|e| *e == RoundEvent::Crashed).unwrap();
    let idle = trace.time_of(|e| *e == RoundEvent::ReturnedToIdle).unwrap();

    assert!((flight - preround - 2000.0).abs() <= FRAME_MS);
    assert_eq!(target, 1.5);
    assert!(coefficient >= 1.5 && coefficient < 1.52);
    assert!((crashed - crash - 180.0).abs() <= FRAME_MS);
    assert!(idle - crashed >= 280.0 && idle - crashed <= 280.0 + FRAME_MS);

    // Start stays disabled for the whole cooldown
    host.run_until(15_000.0, |f| f.start_enabled)
        .expect("start re-enabled");
    let enabled_at = host.now_ms() - host.frame_ms();
    assert!(enabled_at - idle >= 10_000.0 - 1e-6);
    assert!(enabled_at - idle <= 10_000.0 + FRAME_MS);
}

#[test]
fn test_fixed_queue_replays_round_robin() {
    let queue = [1.5, 2.0, 1.1, 3.2, 4.5];
    let mut host = host_with_queue(3, &queue);
    let mut seen = Vec::new();
    for _ in 0..6 {
        let trace = host.run_round(60_000.0);
        seen.push(crash_of(&trace).2);
        wait_for_cooldown(&mut host);
    }
    assert_eq!(seen, [1.5, 2.0, 1.1, 3.2, 4.5, 1.5]);
}

#[test]
fn test_invalid_queue_keeps_random_targets() {
    let mut state = RoundState::new(21);
    assert_eq!(
        state.load_fixed_queue(&[1.5, 2.0]),
        Err(QueueError::WrongLength { len: 2 })
    );
    assert!(matches!(
        state.load_fixed_queue(&[1.5, 2.0, 1.0, 3.0, 4.0]),
        Err(QueueError::OutOfRange { index: 2, .. })
    ));

    let mut host = HeadlessHost::new(state, Stage::new(1280.0, 720.0));
    for _ in 0..3 {
        let trace = host.run_round(60_000.0);
        let (_, coefficient, target) = crash_of(&trace);
        assert!((1.10..=4.50).contains(&target));
        assert!(coefficient >= target);
        wait_for_cooldown(&mut host);
    }
}

/// Run one round, switching to X2 on the first flying frame when `fast`
fn round_with_rate_switch(fast: bool) -> RoundTrace {
    let mut host = host_with_queue(42, &[2.0; 5]);
    let mut trace = RoundTrace::default();
    let mut presses = 0;
    host.press_start();
    while host.now_ms() < 60_000.0 {
        let at = host.now_ms();
        let frame = host.step();
        if fast && frame.phase == RoundPhase::Flying && presses < 2 {
            // X1 -> X1.5 -> X2
            host.press_rate();
            presses += 1;
        }
        trace.events.extend(frame.events.iter().cloned().map(|e| (at, e)));
        let done = frame.events.contains(&RoundEvent::ReturnedToIdle);
        trace.last_frame = Some(frame);
        if done {
            break;
        }
    }
    trace
}

#[test]
fn test_double_rate_mid_flight_halves_time_to_crash() {
    let a = round_with_rate_switch(false);
    let b = round_with_rate_switch(true);

    let flight_time = |trace: &RoundTrace| {
        let launch = trace
            .time_of(|e| matches!(e, RoundEvent::FlightStarted { .. }))
            .unwrap();
        crash_of(trace).0 - launch
    };
    let (ta, tb) = (flight_time(&a), flight_time(&b));
    assert!((tb - ta / 2.0).abs() <= 3.0 * FRAME_MS, "x1 {ta}ms vs x2 {tb}ms");
    assert_eq!(crash_of(&a).2, crash_of(&b).2);
    assert_eq!(b.last_frame.as_ref().unwrap().rate_label, "X2");

    // Preround is real time and unaffected by the rate
    let pre = |t: &RoundTrace| {
        t.time_of(|e| matches!(e, RoundEvent::FlightStarted { .. })).unwrap()
            - t.time_of(|e| *e == RoundEvent::PreroundStarted).unwrap()
    };
    assert!((pre(&a) - pre(&b)).abs() <= FRAME_MS);
}

#[test]
fn test_double_rate_keeps_final_trail_shape() {
    // X2 at 120 Hz advances the same scaled time per frame as X1 at 60 Hz,
    // so the smoothed flight must end at the same spot
    let mut normal = host_with_queue(42, &[2.0; 5]);
    let mut fast = host_with_queue(42, &[2.0; 5]).with_frame_rate(120.0);
    fast.press_rate();
    fast.step();
    fast.press_rate();
    fast.step();
    assert_eq!(fast.state.playback_rate().label(), "X2");

    let a = normal.run_round(60_000.0);
    let b = fast.run_round(60_000.0);
    assert_eq!(crash_of(&a).2, crash_of(&b).2);

    let (fa, fb) = (a.last_frame.unwrap(), b.last_frame.unwrap());
    assert!((fa.progress - fb.progress).abs() < 1e-4);
    let end_a = fa.trail.stroke.last_point().unwrap();
    let end_b = fb.trail.stroke.last_point().unwrap();
    assert!((end_a - end_b).length() < 0.5, "{end_a} vs {end_b}");
    assert_eq!(fa.trail.stroke.commands.len(), fb.trail.stroke.commands.len());
}

#[test]
fn test_stored_low_coefficient_cap_still_crashes() {
    let settings: EngineSettings = serde_json::from_str(r#"{"max_coefficient": 2.0}"#).unwrap();
    let mut state = RoundState::with_settings(9, settings);
    state.load_fixed_queue(&[3.0; 5]).unwrap();
    let mut host = HeadlessHost::new(state, Stage::new(900.0, 500.0));
    host.press_start();
    let frame = host
        .run_until(120_000.0, |f| f.exiting || f.phase == RoundPhase::Crashed)
        .expect("round crashed");
    assert!(frame.coefficient >= 3.0);
}

#[test]
fn test_rate_change_mid_flight_is_continuous() {
    let mut host = host_with_queue(8, &[4.5; 5]);
    host.press_start();
    host.run_until(5_000.0, |f| f.phase == RoundPhase::Flying)
        .unwrap();
    host.run_until(1_000.0, |_| false);

    let before = host.step();
    host.press_rate();
    let after = host.step();
    assert_eq!(after.rate_label, "X1.5");
    assert!(after.coefficient >= before.coefficient);
    // One frame at 1.5x cannot add more than a few hundredths
    assert!(after.coefficient - before.coefficient < 0.05);
}

#[test]
fn test_same_seed_same_rounds() {
    let run = |seed| {
        let mut host = HeadlessHost::new(RoundState::new(seed), Stage::new(900.0, 500.0));
        let trace = host.run_round(60_000.0);
        trace.events
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn test_frame_serializes_for_the_browser() {
    let mut host = host_with_queue(1, &[1.5; 5]);
    let frame = host.step();
    let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["phase"], "Idle");
    assert_eq!(json["coefficient_label"], "x1.00");
    assert_eq!(json["rate_label"], "X1");
    assert!(json["trail"]["stroke"].as_str().unwrap().starts_with("M "));
    assert_eq!(json["start_enabled"], true);
}
