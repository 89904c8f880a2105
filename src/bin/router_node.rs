//! Router node entry point.
//!
//! # Startup sequence
//!
//! 1. Load [`RouterNodeConfig`] (argv\[1\] or `router_node.toml`; missing
//!    file → defaults).
//! 2. Initialise logging at the configured level.
//! 3. Validate the configuration — refuses to run on any invalid range.
//! 4. Install the Ctrl-C → stop-flag handler.
//! 5. Open both MIDI output ports.
//! 6. Bind the telemetry receiver feeding the single-slot inbox.
//! 7. Spawn the observation capture source feeding the mailbox.
//! 8. Run recognizer + router on the fixed-rate tick grid until stopped.
//! 9. Tear down in reverse order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use theremidi::config::RouterNodeConfig;
use theremidi::gesture::{
    spawn_observation_source, GestureRecognizer, IdleObservationSource, ObservationMailbox,
};
use theremidi::midi::open_outputs;
use theremidi::router::{MusicRouter, RouterConfig};
use theremidi::sched::FixedRateScheduler;
use theremidi::telemetry::{SensorInbox, TelemetryReceiver};

fn main() -> anyhow::Result<()> {
    // 1. Configuration
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("router_node.toml"));
    let config = RouterNodeConfig::load_from(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    // 2. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    // 3. Validation
    config.validate().context("invalid router configuration")?;
    log::info!(
        "router: starting at {} Hz, listening on {}:{}",
        config.router.tick_hz,
        config.link.host,
        config.link.port
    );

    // 4. Cooperative stop flag
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            log::info!("router: stop requested");
            stop.store(true, Ordering::Relaxed);
        })
        .context("installing Ctrl-C handler")?;
    }

    // 5. MIDI outputs
    let midi = open_outputs(&config.midi.musical_port, &config.midi.control_port)
        .context("opening MIDI outputs")?;

    // 6. Telemetry inbox + receiver thread
    let inbox = Arc::new(SensorInbox::new());
    let mut receiver = TelemetryReceiver::bind(&config.link.host, config.link.port, Arc::clone(&inbox))
        .context("binding telemetry receiver")?;

    // 7. Observation mailbox + capture source.  The vision capability is
    //    external; without one wired in, the idle source keeps the node
    //    running headless.
    let mailbox = Arc::new(ObservationMailbox::new());
    let capture = spawn_observation_source(
        IdleObservationSource,
        Arc::clone(&mailbox),
        Arc::clone(&stop),
    );

    // 8. Recognizer + router on one logical tick
    let mut recognizer =
        GestureRecognizer::new(&config.gesture, config.instruments.len(), Instant::now());
    let router_config = RouterConfig::from_node_config(&config)?;
    let mut router = MusicRouter::new(midi, router_config);

    let scheduler = FixedRateScheduler::new(config.router.tick_hz, Arc::clone(&stop));
    scheduler.run(|now| {
        let observation = mailbox.latest();
        let gesture = recognizer.update(observation.as_ref(), now);
        let snapshot = inbox.take_snapshot();
        // A failed tick is isolated: router state only advances on
        // successful sends, so the next tick starts clean.
        if let Err(e) = router.process_tick(&gesture, &snapshot, now) {
            log::error!("router: tick failed: {e}");
        }
    });

    // 9. Teardown
    receiver.stop();
    let _ = capture.join();
    log::info!("router: stopped");
    Ok(())
}
