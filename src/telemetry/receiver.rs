//! Inbound telemetry: the single-slot receive buffer and the UDP listener.
//!
//! [`SensorInbox`] holds one slot per message class.  Distance readings
//! overwrite in place — no queue, latest wins.  A pending hit is consumed
//! **at most once**: [`SensorInbox::take_snapshot`] returns and clears it in
//! the same locked operation, so an immediately following read sees no hit.
//! Every successful receipt stamps `last_rx`, which the router's watchdog
//! compares against.
//!
//! [`TelemetryReceiver`] owns the socket thread.  The socket uses a short
//! read timeout so the cooperative stop flag is polled between datagrams;
//! malformed datagrams are logged and dropped without aborting the loop.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::message::{TelemetryError, TelemetryMsg};

// ---------------------------------------------------------------------------
// SensorSnapshot
// ---------------------------------------------------------------------------

/// The router's per-tick view of the sensor node.
#[derive(Debug, Clone, Copy)]
pub struct SensorSnapshot {
    /// Latest distance reading (cm); `None` until the first `/dist` arrives.
    pub dist_cm: Option<f64>,
    /// Pending hit velocity; cleared by the read that returned it.
    pub hit_velocity: Option<u8>,
    /// When any telemetry last arrived — the watchdog reference.
    pub last_rx: Instant,
}

// ---------------------------------------------------------------------------
// SensorInbox
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct InboxState {
    dist_cm: Option<f64>,
    pending_hit: Option<u8>,
    last_rx: Instant,
    last_alive_seq: Option<u64>,
}

/// Single-slot, latest-wins receive buffer shared between the socket thread
/// and the router tick.
#[derive(Debug)]
pub struct SensorInbox {
    inner: Mutex<InboxState>,
}

impl SensorInbox {
    /// `last_rx` starts at construction time so the watchdog measures from
    /// node startup, not from the epoch.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InboxState {
                dist_cm: None,
                pending_hit: None,
                last_rx: Instant::now(),
                last_alive_seq: None,
            }),
        }
    }

    /// Store one received message, overwriting per-class slots.
    pub fn accept(&self, msg: TelemetryMsg, now: Instant) {
        let mut state = self.inner.lock().unwrap();
        match msg {
            TelemetryMsg::Distance(cm) => state.dist_cm = Some(cm as f64),
            TelemetryMsg::Hit(velocity) => state.pending_hit = Some(velocity),
            TelemetryMsg::Alive(seq) => {
                if let Some(last) = state.last_alive_seq {
                    if seq <= last {
                        log::debug!("telemetry: heartbeat regressed {last} -> {seq}");
                    }
                }
                state.last_alive_seq = Some(seq);
            }
        }
        state.last_rx = now;
    }

    /// Read the current snapshot, atomically clearing the pending hit.
    pub fn take_snapshot(&self) -> SensorSnapshot {
        let mut state = self.inner.lock().unwrap();
        SensorSnapshot {
            dist_cm: state.dist_cm,
            hit_velocity: state.pending_hit.take(),
            last_rx: state.last_rx,
        }
    }
}

impl Default for SensorInbox {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TelemetryReceiver
// ---------------------------------------------------------------------------

/// Poll interval for the stop flag while the socket is idle.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Owns the UDP listener thread feeding a [`SensorInbox`].
pub struct TelemetryReceiver {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TelemetryReceiver {
    /// Bind `host:port` and start the listener thread.
    pub fn bind(host: &str, port: u16, inbox: Arc<SensorInbox>) -> Result<Self, TelemetryError> {
        let socket = UdpSocket::bind((host, port))?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        log::info!("telemetry: listening on {host}:{port}");

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("telemetry-rx".into())
            .spawn(move || {
                let mut buf = [0u8; 1024];
                while !stop_flag.load(Ordering::Relaxed) {
                    let len = match socket.recv_from(&mut buf) {
                        Ok((len, _from)) => len,
                        Err(e)
                            if e.kind() == std::io::ErrorKind::WouldBlock
                                || e.kind() == std::io::ErrorKind::TimedOut =>
                        {
                            continue;
                        }
                        Err(e) => {
                            log::warn!("telemetry: recv error: {e}");
                            continue;
                        }
                    };
                    match TelemetryMsg::decode(&buf[..len]) {
                        Ok(msg) => inbox.accept(msg, Instant::now()),
                        // One bad datagram never aborts the receive loop.
                        Err(e) => log::warn!("telemetry: dropping malformed datagram: {e}"),
                    }
                }
            })
            .expect("failed to spawn telemetry-rx thread");

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the listener thread to stop and join it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TelemetryReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
