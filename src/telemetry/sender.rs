//! Outbound telemetry: bounded non-blocking queue + drain worker.
//!
//! The acquisition loop must never block on the network, so enqueueing is
//! always non-blocking with a per-class drop policy standing in for
//! backpressure:
//!
//! * **Distance** readings coalesce — on a full queue the oldest queued
//!   distance is evicted to make room, so the latest value always eventually
//!   wins.
//! * **Hit** and **Alive** messages never displace older events — a full
//!   queue drops the *new* message, logged.
//!
//! One worker thread drains the queue in FIFO order, woken by a condition
//! variable.  Transport failures are logged and swallowed: telemetry is
//! best-effort and must never take the acquisition loop down with it.

use std::collections::VecDeque;
use std::net::UdpSocket;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use super::message::{TelemetryError, TelemetryMsg};

// ---------------------------------------------------------------------------
// TelemetryTransport
// ---------------------------------------------------------------------------

/// The datagram send capability the worker is written against.
pub trait TelemetryTransport: Send {
    fn send(&mut self, msg: &TelemetryMsg) -> Result<(), TelemetryError>;
}

/// UDP transport encoding each message as an OSC datagram.
pub struct OscUdpTransport {
    socket: UdpSocket,
}

impl OscUdpTransport {
    /// Bind an ephemeral local port and aim at the router node.
    pub fn connect(host: &str, port: u16) -> Result<Self, TelemetryError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect((host, port))?;
        Ok(Self { socket })
    }
}

impl TelemetryTransport for OscUdpTransport {
    fn send(&mut self, msg: &TelemetryMsg) -> Result<(), TelemetryError> {
        let bytes = msg.encode()?;
        self.socket.send(&bytes)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Offer — queue admission outcome
// ---------------------------------------------------------------------------

/// What happened to a message offered to the bounded queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Queued with room to spare.
    Accepted,
    /// Queued after evicting the oldest queued distance reading.
    CoalescedOldest,
    /// The queue was full and the new message was discarded.
    DroppedNew,
}

/// Bounded FIFO with the per-class admission policy.  Kept separate from the
/// locking so the policy itself is directly testable.
#[derive(Debug)]
pub struct TxQueue {
    items: VecDeque<TelemetryMsg>,
    capacity: usize,
}

impl TxQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Apply the admission policy and enqueue if permitted.
    pub fn offer(&mut self, msg: TelemetryMsg) -> Offer {
        let mut outcome = Offer::Accepted;
        if self.items.len() >= self.capacity {
            if msg.is_coalescing() && self.evict_oldest_distance() {
                outcome = Offer::CoalescedOldest;
            } else {
                return Offer::DroppedNew;
            }
        }
        self.items.push_back(msg);
        outcome
    }

    pub fn pop(&mut self) -> Option<TelemetryMsg> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn evict_oldest_distance(&mut self) -> bool {
        if let Some(pos) = self.items.iter().position(TelemetryMsg::is_coalescing) {
            self.items.remove(pos);
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// TelemetrySender
// ---------------------------------------------------------------------------

struct Shared {
    queue: Mutex<SenderState>,
    not_empty: Condvar,
}

struct SenderState {
    queue: TxQueue,
    closed: bool,
}

/// Handle to the outbound telemetry queue and its drain worker.
///
/// All `send_*` methods are non-blocking.  [`close`](Self::close) (also run
/// on drop) wakes the worker, lets it drain what is queued, and joins it.
pub struct TelemetrySender {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl TelemetrySender {
    /// Spawn the drain worker over `transport`.
    pub fn start(mut transport: Box<dyn TelemetryTransport>, capacity: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(SenderState {
                queue: TxQueue::new(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("telemetry-tx".into())
            .spawn(move || {
                loop {
                    let msg = {
                        let mut state = worker_shared.queue.lock().unwrap();
                        while state.queue.is_empty() && !state.closed {
                            state = worker_shared.not_empty.wait(state).unwrap();
                        }
                        match state.queue.pop() {
                            Some(msg) => msg,
                            None => return, // closed and drained
                        }
                    };
                    // Best-effort: a failed send is logged, never fatal.
                    if let Err(e) = transport.send(&msg) {
                        log::warn!("telemetry: send failed on {}: {e}", msg.address());
                    }
                }
            })
            .expect("failed to spawn telemetry-tx thread");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    pub fn send_distance(&self, cm: f32) {
        match self.enqueue(TelemetryMsg::Distance(cm)) {
            Offer::CoalescedOldest => {
                log::debug!("telemetry: queue full, coalesced oldest distance")
            }
            Offer::DroppedNew => log::debug!("telemetry: queue full, dropped distance"),
            Offer::Accepted => {}
        }
    }

    pub fn send_hit(&self, velocity: u8) {
        let velocity = velocity.min(127);
        if self.enqueue(TelemetryMsg::Hit(velocity)) == Offer::DroppedNew {
            log::warn!("telemetry: queue full, dropped hit velocity={velocity}");
        }
    }

    pub fn send_alive(&self, seq: u64) {
        if self.enqueue(TelemetryMsg::Alive(seq)) == Offer::DroppedNew {
            log::warn!("telemetry: queue full, dropped heartbeat seq={seq}");
        }
    }

    /// Stop accepting messages, let the worker drain, and join it.
    pub fn close(&mut self) {
        {
            let mut state = self.shared.queue.lock().unwrap();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.shared.not_empty.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        log::info!("telemetry: sender stopped");
    }

    fn enqueue(&self, msg: TelemetryMsg) -> Offer {
        let outcome = {
            let mut state = self.shared.queue.lock().unwrap();
            if state.closed {
                return Offer::DroppedNew;
            }
            state.queue.offer(msg)
        };
        if outcome != Offer::DroppedNew {
            self.shared.not_empty.notify_one();
        }
        outcome
    }
}

impl Drop for TelemetrySender {
    fn drop(&mut self) {
        self.close();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
