//! Sensor node entry point.
//!
//! # Startup sequence
//!
//! 1. Load [`SensorNodeConfig`] (argv\[1\] or `sensor_node.toml`; missing
//!    file → defaults).
//! 2. Initialise logging at the configured level.
//! 3. Validate the configuration — refuses to run on any invalid range.
//! 4. Install the Ctrl-C → stop-flag handler.
//! 5. Connect the telemetry transport and spawn the drain worker.
//! 6. Build the pulse source, conditioning pipeline and hit detector.
//! 7. Run the acquisition loop on the fixed-rate grid until stopped.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use theremidi::config::SensorNodeConfig;
use theremidi::sched::{FixedRateScheduler, Heartbeat};
use theremidi::signal::{DistancePipeline, HitDetector, PulseSource, SimPulseSource};
use theremidi::telemetry::{OscUdpTransport, TelemetrySender};

fn main() -> anyhow::Result<()> {
    // 1. Configuration
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sensor_node.toml"));
    let config = SensorNodeConfig::load_from(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    // 2. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    // 3. Validation — fatal before anything touches the network.
    config.validate().context("invalid sensor configuration")?;
    log::info!(
        "sensor: starting at {} Hz, telemetry -> {}:{}",
        config.cycle_hz,
        config.telemetry.host,
        config.telemetry.port
    );

    // 4. Cooperative stop flag
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            log::info!("sensor: stop requested");
            stop.store(true, Ordering::Relaxed);
        })
        .context("installing Ctrl-C handler")?;
    }

    // 5. Telemetry
    let transport = OscUdpTransport::connect(&config.telemetry.host, config.telemetry.port)
        .context("connecting telemetry transport")?;
    let mut sender = TelemetrySender::start(Box::new(transport), config.telemetry.queue_size);

    // 6. Signal path.  Real GPIO is an external capability; the simulated
    //    source drives the same echo latch a hardware driver would.
    let mut sensor: Box<dyn PulseSource> = Box::new(SimPulseSource::new(
        &config.simulator.waveform_cm,
        config.distance.temp_c,
        config.echo_timeout_us,
    ));
    let mut pipeline = DistancePipeline::new(&config.distance, &config.filters)
        .context("building distance pipeline")?;
    let mut hit_detector = config
        .hit
        .enabled
        .then(|| HitDetector::from_config(&config.hit));

    // 7. Acquisition loop
    let scheduler = FixedRateScheduler::new(config.cycle_hz, Arc::clone(&stop));
    let mut heartbeat = Heartbeat::new(Instant::now());
    let mut last_cm: Option<f64> = None;

    sensor.trigger();
    scheduler.run(|now| {
        // A missing echo is a transient miss; the loop continues with the
        // previous reading.
        if let Some(cm) = pipeline.process(sensor.take_echo()) {
            last_cm = Some(cm);
        }

        if let Some(cm) = last_cm {
            sender.send_distance(cm as f32);
            if let Some(detector) = hit_detector.as_mut() {
                if let Some(hit) = detector.update(cm, now) {
                    log::info!("sensor: hit at {cm:.1} cm, velocity {}", hit.velocity);
                    sender.send_hit(hit.velocity);
                }
            }
        }

        for seq in heartbeat.due(now) {
            sender.send_alive(seq);
        }

        sensor.trigger();
    });

    // 8. Teardown: drain and join the telemetry worker.
    sender.close();
    log::info!("sensor: stopped");
    Ok(())
}
