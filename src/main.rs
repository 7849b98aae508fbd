//! Crash Curve entry point
//!
//! In the browser the engine is driven through `platform::web::WebEngine`.
//! Natively this plays headless rounds and logs what happened.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::{SystemTime, UNIX_EPOCH};

    use crash_curve::platform::HeadlessHost;
    use crash_curve::sim::{RoundEvent, RoundState, Stage};
    use crash_curve::EngineSettings;

    env_logger::init();
    log::info!("Crash Curve (native) starting...");

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let settings = EngineSettings::load();
    let mut host = HeadlessHost::new(RoundState::with_settings(seed, settings), Stage::new(900.0, 500.0));

    for round in 1..=3 {
        let trace = host.run_round(120_000.0);
        let crash = trace.events.iter().find_map(|(t, e)| match e {
            RoundEvent::CrashTriggered { coefficient, target } => Some((*t, *coefficient, *target)),
            _ => None,
        });
        match crash {
            Some((at, coefficient, target)) => println!(
                "round {round}: crashed at x{coefficient:.2} (target x{target:.2}) at {:.2}s",
                at / 1000.0
            ),
            None => println!("round {round}: no crash recorded"),
        }
        // Sit out the cooldown before the next round
        host.run_until(60_000.0, |f| f.start_enabled);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is WebEngine, this is just to satisfy the compiler
}
