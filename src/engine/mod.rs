//! # Remapping Engine Module
//!
//! The fixed-cadence core that turns paddle edges into key events.
//!
//! Every poll tick runs the same pipeline: drain hotplug notifications,
//! verify (or restore) gamepad readiness, fetch a reading, detect edges
//! against the previous reading, and emit one key transition per edge for
//! every bound paddle. All remapping state lives here; the scheduler in
//! `main` only owns the interval timer.
//!
//! The [`AssignmentStateMachine`] is shared with UI-side callers through
//! an [`AssignmentHandle`]; the tick locks it once per cycle to snapshot
//! the bindings it needs, and never holds the lock across an await.

pub mod assign;
pub mod edges;

pub use assign::{AssignmentHandle, AssignmentState, BindingEvent, SelectOutcome};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use crate::gamepad::button::{ButtonMask, GamepadReading};
use crate::gamepad::GamepadSession;
use crate::inject::KeyInjector;
use crate::keys::KeyCode;
use assign::AssignmentStateMachine;
use edges::detect_edges;

/// Default poll cadence in milliseconds (125 Hz).
pub const DEFAULT_POLL_PERIOD_MS: u64 = 8;

/// Counters exposed for the scheduler's periodic status log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Ticks that ran the full pipeline (device ready, reading fetched).
    pub processed_ticks: u64,
    /// Readings skipped as duplicates of the previous one.
    pub skipped_readings: u64,
    /// Key transitions handed to the injector.
    pub emitted_transitions: u64,
}

/// Receiving ends handed to contexts outside the tick.
pub struct EngineHandles {
    /// Shared access to the assignment state machine.
    pub assignment: AssignmentHandle,
    /// Latest gamepad reading, for display observers.
    pub readings: watch::Receiver<Option<GamepadReading>>,
    /// Binding change notifications.
    pub binding_events: mpsc::Receiver<BindingEvent>,
}

/// Clears the busy flag when the tick body exits, on every path.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns all remapping state and runs the per-tick pipeline.
pub struct RemappingEngine {
    session: GamepadSession,
    injector: KeyInjector,
    shared: Arc<Mutex<AssignmentStateMachine>>,
    /// Paddles currently considered down (a key-down has been emitted and
    /// no matching key-up yet).
    pressed: ButtonMask,
    last_mask: ButtonMask,
    last_timestamp: u64,
    busy: Arc<AtomicBool>,
    readings_tx: watch::Sender<Option<GamepadReading>>,
    stats: EngineStats,
}

impl RemappingEngine {
    /// Creates the engine around a session, an injector, and the
    /// assignment machine (which carries the restored bindings).
    pub fn new(
        session: GamepadSession,
        injector: KeyInjector,
        machine: AssignmentStateMachine,
        binding_events: mpsc::Receiver<BindingEvent>,
    ) -> (Self, EngineHandles) {
        let shared = Arc::new(Mutex::new(machine));
        let (readings_tx, readings_rx) = watch::channel(None);

        let engine = Self {
            session,
            injector,
            shared: Arc::clone(&shared),
            pressed: ButtonMask::EMPTY,
            last_mask: ButtonMask::EMPTY,
            last_timestamp: 0,
            busy: Arc::new(AtomicBool::new(false)),
            readings_tx,
            stats: EngineStats::default(),
        };

        let handles = EngineHandles {
            assignment: AssignmentHandle::new(shared),
            readings: readings_rx,
            binding_events,
        };

        (engine, handles)
    }

    /// Current counters, read by the scheduler for status logging.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// True once the session holds a device.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Runs one poll cycle.
    ///
    /// Every failure mode inside the cycle degrades to "do nothing this
    /// tick": no device, a duplicate reading, or a read error all leave
    /// the engine waiting for the next tick. A read error additionally
    /// invalidates the session so the next tick rediscovers.
    pub async fn tick(&mut self) {
        // A cycle that outlives its period must not interleave with the
        // next one
        if self.busy.swap(true, Ordering::Acquire) {
            trace!("Previous cycle still running, skipping tick");
            return;
        }
        let _guard = TickGuard(&self.busy);

        self.session.drain_hotplug();
        if !self.session.is_ready() && !self.session.try_bind() {
            return;
        }

        let reading = match self.session.read() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Gamepad read failed ({}), invalidating", e);
                self.session.invalidate();
                return;
            }
        };

        let report = detect_edges(
            self.last_mask,
            reading.buttons,
            self.last_timestamp,
            reading.timestamp,
            self.pressed,
        );
        if report.skip {
            self.stats.skipped_readings += 1;
            return;
        }

        self.last_mask = reading.buttons;
        self.last_timestamp = reading.timestamp;
        self.stats.processed_ticks += 1;

        // Track every edge, bound or not, so a paddle bound mid-hold
        // still releases cleanly
        for paddle in report.pressed.iter() {
            self.pressed.insert(paddle);
        }
        for paddle in report.released.iter() {
            self.pressed.remove(paddle);
        }

        // Snapshot bound keys under the lock, deliver after releasing it
        let (downs, ups): (Vec<Option<KeyCode>>, Vec<Option<KeyCode>>) = {
            let machine = self.shared.lock().unwrap();
            (
                report
                    .pressed
                    .iter()
                    .map(|paddle| machine.bound_key(paddle))
                    .collect(),
                report
                    .released
                    .iter()
                    .map(|paddle| machine.bound_key(paddle))
                    .collect(),
            )
        };

        for key in downs.into_iter().flatten() {
            debug!("Paddle press, emitting key-down {}", key);
            self.injector.send_key_down(key).await;
            self.stats.emitted_transitions += 1;
        }
        for key in ups.into_iter().flatten() {
            debug!("Paddle release, emitting key-up {}", key);
            self.injector.send_key_up(key).await;
            self.stats.emitted_transitions += 1;
        }

        self.readings_tx.send_replace(Some(reading));
    }
}
