//! # Assignment State Machine
//!
//! Interactive (re)binding of paddles to keyboard keys.
//!
//! The machine owns the live binding map and its persistence. It is
//! shared between the poll tick (which reads bindings) and the UI-bound
//! context (which selects paddles and captures keys) behind a single
//! mutex, so a tick never observes a half-updated binding.
//!
//! At most one paddle can be awaiting a key at a time. Selecting the
//! awaiting paddle again cancels and unassigns it (toggle semantics);
//! selecting a different paddle while one is awaiting is refused - the UI
//! boundary is expected to disable other selectors meanwhile.
//!
//! Some capture paths deliver the same physical key twice within one
//! logical user action (a key that both triggers capture and echoes as a
//! selection). The one-shot `defer_clear` flag absorbs the echo: the
//! follow-up selection or capture clears the assignment state without
//! unbinding or rebinding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bindings::BindingStore;
use crate::gamepad::button::PaddleButton;
use crate::keys::KeyCode;

/// Capacity of the binding notification channel. Notifications are
/// best-effort; a full channel drops them.
pub const BINDING_EVENT_CAPACITY: usize = 16;

/// Whether the machine is currently capturing a key for a paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentState {
    Idle,
    Awaiting(PaddleButton),
}

/// Notification to observers (the bound-key indicators) that a binding
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEvent {
    Bound { paddle: PaddleButton, key: KeyCode },
    Unbound { paddle: PaddleButton },
}

/// Outcome of a paddle selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The machine is now awaiting a key for this paddle.
    Awaiting,
    /// The paddle was awaiting and has been unassigned (toggle).
    Unassigned,
    /// A deferred capture echo was absorbed; assignment state cleared,
    /// the binding made by the capture stands.
    Cleared,
    /// A different paddle is already awaiting; selection refused.
    Refused,
}

/// The binding map plus the interactive assignment state.
pub struct AssignmentStateMachine {
    bindings: HashMap<PaddleButton, KeyCode>,
    store: BindingStore,
    state: AssignmentState,
    defer_clear: bool,
    events: mpsc::Sender<BindingEvent>,
}

impl AssignmentStateMachine {
    /// Creates the machine, restoring persisted bindings from the store.
    ///
    /// Returns the machine and the receiver for binding notifications.
    pub fn new(store: BindingStore) -> (Self, mpsc::Receiver<BindingEvent>) {
        let (events, events_rx) = mpsc::channel(BINDING_EVENT_CAPACITY);
        let bindings = store.load_all();
        if !bindings.is_empty() {
            info!("Restored {} persisted binding(s)", bindings.len());
        }

        (
            Self {
                bindings,
                store,
                state: AssignmentState::Idle,
                defer_clear: false,
                events,
            },
            events_rx,
        )
    }

    /// The key bound to `paddle`, if any.
    #[must_use]
    pub fn bound_key(&self, paddle: PaddleButton) -> Option<KeyCode> {
        self.bindings.get(&paddle).copied()
    }

    /// A snapshot of the current binding map.
    #[must_use]
    pub fn bindings(&self) -> HashMap<PaddleButton, KeyCode> {
        self.bindings.clone()
    }

    /// The current assignment state.
    #[must_use]
    pub fn state(&self) -> AssignmentState {
        self.state
    }

    /// Handles the user selecting a paddle to (re)bind.
    pub fn select_paddle(&mut self, paddle: PaddleButton) -> SelectOutcome {
        match self.state {
            AssignmentState::Idle => {
                debug!("Awaiting key for {}", paddle);
                self.state = AssignmentState::Awaiting(paddle);
                SelectOutcome::Awaiting
            }
            AssignmentState::Awaiting(awaiting) if awaiting == paddle => {
                self.state = AssignmentState::Idle;
                if self.defer_clear {
                    // Echo of a deferred capture; the bind already happened
                    self.defer_clear = false;
                    SelectOutcome::Cleared
                } else {
                    self.unassign(paddle);
                    SelectOutcome::Unassigned
                }
            }
            AssignmentState::Awaiting(_) => SelectOutcome::Refused,
        }
    }

    /// Handles a captured key while a paddle is awaiting.
    ///
    /// `defer_clear` marks captures whose physical key will be delivered a
    /// second time within the same user action; the machine stays armed
    /// and absorbs the duplicate instead of treating it as a new action.
    ///
    /// Returns true if a binding was made.
    pub fn capture_key(&mut self, key: KeyCode, defer_clear: bool) -> bool {
        let AssignmentState::Awaiting(paddle) = self.state else {
            return false;
        };

        if self.defer_clear {
            // Duplicate delivery of the capture that set the flag:
            // idempotent, no second bind
            self.defer_clear = false;
            self.state = AssignmentState::Idle;
            return false;
        }

        self.assign(paddle, key);
        self.defer_clear = defer_clear;
        if !defer_clear {
            self.state = AssignmentState::Idle;
        }
        true
    }

    fn assign(&mut self, paddle: PaddleButton, key: KeyCode) {
        info!("Bound {} to {}", paddle, key);
        self.bindings.insert(paddle, key);
        self.store.save(paddle, key);
        let _ = self.events.try_send(BindingEvent::Bound { paddle, key });
    }

    fn unassign(&mut self, paddle: PaddleButton) {
        info!("Unbound {}", paddle);
        self.bindings.remove(&paddle);
        self.store.remove(paddle);
        let _ = self.events.try_send(BindingEvent::Unbound { paddle });
    }
}

/// Cloneable front for callers outside the poll tick.
///
/// Each call locks the machine for its own duration only; the tick takes
/// the same lock once per cycle.
#[derive(Clone)]
pub struct AssignmentHandle {
    shared: Arc<Mutex<AssignmentStateMachine>>,
}

impl AssignmentHandle {
    pub(crate) fn new(shared: Arc<Mutex<AssignmentStateMachine>>) -> Self {
        Self { shared }
    }

    /// See [`AssignmentStateMachine::select_paddle`].
    pub fn select_paddle(&self, paddle: PaddleButton) -> SelectOutcome {
        self.shared.lock().unwrap().select_paddle(paddle)
    }

    /// See [`AssignmentStateMachine::capture_key`].
    pub fn capture_key(&self, key: KeyCode, defer_clear: bool) -> bool {
        self.shared.lock().unwrap().capture_key(key, defer_clear)
    }

    /// The key bound to `paddle`, if any.
    #[must_use]
    pub fn bound_key(&self, paddle: PaddleButton) -> Option<KeyCode> {
        self.shared.lock().unwrap().bound_key(paddle)
    }

    /// A snapshot of the current binding map.
    #[must_use]
    pub fn bindings(&self) -> HashMap<PaddleButton, KeyCode> {
        self.shared.lock().unwrap().bindings()
    }

    /// The current assignment state.
    #[must_use]
    pub fn state(&self) -> AssignmentState {
        self.shared.lock().unwrap().state()
    }
}
