//! Key capture bridge
//!
//! Turns global key-down/key-up events into push-to-talk commands. Two slots
//! can each be bound to a key; PTT is active while at least one bound key is
//! held. A slot can be put into capture mode, in which case the next key-down
//! becomes its new binding instead of being evaluated as PTT.
//!
//! The bridge is called directly from the key hook thread and talks to the
//! engine through a [`PttSink`], so PTT never waits on the session actor.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use afv_protocol::KeyCode;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatcher::CommandDispatcher;

/// One of the two independently bindable PTT keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PttSlot {
    One,
    Two,
}

impl PttSlot {
    pub const ALL: [PttSlot; 2] = [PttSlot::One, PttSlot::Two];

    /// 1-based slot number as shown to the user
    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

impl fmt::Display for PttSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PTT {}", self.number())
    }
}

/// Per-slot capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Evaluating key events against `key`
    Idle { key: KeyCode },
    /// Waiting for the next key-down; `previous` is restored on cancel
    Capturing { previous: KeyCode },
}

impl SlotState {
    /// The key currently bound (the previous one while capturing)
    pub fn key(&self) -> KeyCode {
        match *self {
            Self::Idle { key } => key,
            Self::Capturing { previous } => previous,
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }
}

/// Receiver of PTT on/off commands
pub trait PttSink: Send + Sync {
    fn set_ptt(&self, active: bool);
}

impl PttSink for CommandDispatcher {
    fn set_ptt(&self, active: bool) {
        CommandDispatcher::set_ptt(self, active);
    }
}

impl<T: PttSink + ?Sized> PttSink for Arc<T> {
    fn set_ptt(&self, active: bool) {
        (**self).set_ptt(active);
    }
}

/// Get/set contract for persisted key bindings
pub trait BindingStore: Send + Sync {
    /// Load the binding for a slot (unbound if none is stored)
    fn load(&self, slot: PttSlot) -> KeyCode;

    /// Persist a new binding
    fn store(&self, slot: PttSlot, key: KeyCode) -> Result<(), String>;
}

impl<T: BindingStore + ?Sized> BindingStore for Arc<T> {
    fn load(&self, slot: PttSlot) -> KeyCode {
        (**self).load(slot)
    }

    fn store(&self, slot: PttSlot, key: KeyCode) -> Result<(), String> {
        (**self).store(slot, key)
    }
}

/// Binding store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryBindingStore {
    keys: Mutex<HashMap<PttSlot, KeyCode>>,
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate bindings
    pub fn with_bindings(bindings: &[(PttSlot, KeyCode)]) -> Self {
        Self {
            keys: Mutex::new(bindings.iter().copied().collect()),
        }
    }
}

impl BindingStore for MemoryBindingStore {
    fn load(&self, slot: PttSlot) -> KeyCode {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&slot)
            .copied()
            .unwrap_or(KeyCode::UNBOUND)
    }

    fn store(&self, slot: PttSlot, key: KeyCode) -> Result<(), String> {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot, key);
        Ok(())
    }
}

/// A slot just learned a new key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBound {
    pub slot: PttSlot,
    pub key: KeyCode,
    /// Human-readable key name
    pub name: String,
}

/// What a key event resulted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// The key-down was consumed as a new binding
    Bound(KeyBound),
    /// PTT was switched on or off
    Ptt(bool),
    /// Nothing to do
    Ignored,
}

#[derive(Debug)]
struct BridgeState {
    slots: [SlotState; 2],
    /// Whether each slot's bound key is currently held
    held: [bool; 2],
    /// Release of the key-down consumed by capture
    swallow_release: Option<KeyCode>,
    ptt_active: bool,
    /// No further key events are evaluated
    closed: bool,
}

impl BridgeState {
    fn any_held(&self) -> bool {
        self.held.iter().any(|h| *h)
    }

    /// Recompute PTT from the held keys; returns the transition, if any
    fn update_ptt(&mut self) -> Option<bool> {
        let active = self.any_held();
        if active == self.ptt_active {
            return None;
        }
        self.ptt_active = active;
        Some(active)
    }
}

/// Maps global key events to PTT and handles "bind next key"
pub struct KeyCaptureBridge<S: PttSink, B: BindingStore> {
    state: Mutex<BridgeState>,
    sink: S,
    store: B,
    notifier: Option<mpsc::UnboundedSender<KeyBound>>,
}

impl<S: PttSink, B: BindingStore> KeyCaptureBridge<S, B> {
    /// Create a bridge with bindings loaded from `store`
    pub fn new(sink: S, store: B) -> Self {
        let slots = PttSlot::ALL.map(|slot| SlotState::Idle {
            key: store.load(slot),
        });
        for slot in PttSlot::ALL {
            debug!("{} bound to {}", slot, slots[slot.index()].key());
        }

        Self {
            state: Mutex::new(BridgeState {
                slots,
                held: [false; 2],
                swallow_release: None,
                ptt_active: false,
                closed: false,
            }),
            sink,
            store,
            notifier: None,
        }
    }

    /// Send [`KeyBound`] notifications to an observer channel
    pub fn with_notifier(mut self, notifier: mpsc::UnboundedSender<KeyBound>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put a slot into capture mode
    ///
    /// The slot stops contributing to PTT until it is bound again.
    pub fn begin_capture(&self, slot: PttSlot) {
        {
            let mut state = self.lock();
            let i = slot.index();
            let previous = state.slots[i].key();
            state.slots[i] = SlotState::Capturing { previous };
            state.held[i] = false;
            if let Some(active) = state.update_ptt() {
                self.sink.set_ptt(active);
            }
        }
        info!("{}: waiting for the next key", slot);
    }

    /// Leave capture mode keeping the previous binding
    ///
    /// Returns false if the slot was not capturing.
    pub fn cancel_capture(&self, slot: PttSlot) -> bool {
        let mut state = self.lock();
        let i = slot.index();
        match state.slots[i] {
            SlotState::Capturing { previous } => {
                state.slots[i] = SlotState::Idle { key: previous };
                debug!("{}: capture cancelled", slot);
                true
            }
            SlotState::Idle { .. } => false,
        }
    }

    pub fn slot_state(&self, slot: PttSlot) -> SlotState {
        self.lock().slots[slot.index()]
    }

    /// Key currently bound to a slot
    pub fn binding(&self, slot: PttSlot) -> KeyCode {
        self.slot_state(slot).key()
    }

    /// Human-readable name of the key bound to a slot
    pub fn key_name_for(&self, slot: PttSlot) -> String {
        self.binding(slot).name()
    }

    pub fn ptt_active(&self) -> bool {
        self.lock().ptt_active
    }

    /// Handle a global key-down
    pub fn key_down(&self, key: KeyCode) -> KeyAction {
        let action = {
            let mut state = self.lock();
            if state.closed {
                return KeyAction::Ignored;
            }

            let capturing = PttSlot::ALL
                .into_iter()
                .find(|s| state.slots[s.index()].is_capturing());

            if let Some(slot) = capturing {
                state.slots[slot.index()] = SlotState::Idle { key };
                state.swallow_release = Some(key);
                KeyAction::Bound(KeyBound {
                    slot,
                    key,
                    name: key.name(),
                })
            } else {
                if state.swallow_release == Some(key) {
                    // Pressed again, so the release we were waiting for was missed
                    state.swallow_release = None;
                }
                let mut matched = false;
                for slot in PttSlot::ALL {
                    if Self::matches(&state.slots[slot.index()], key) {
                        state.held[slot.index()] = true;
                        matched = true;
                    }
                }
                match state.update_ptt() {
                    Some(active) if matched => self.send_ptt(active),
                    _ => KeyAction::Ignored,
                }
            }
        };

        self.apply(&action);
        action
    }

    /// Handle a global key-up
    pub fn key_up(&self, key: KeyCode) -> KeyAction {
        let action = {
            let mut state = self.lock();

            if state.closed {
                KeyAction::Ignored
            } else if state.swallow_release == Some(key) {
                state.swallow_release = None;
                KeyAction::Ignored
            } else {
                for slot in PttSlot::ALL {
                    if Self::matches(&state.slots[slot.index()], key) {
                        state.held[slot.index()] = false;
                    }
                }
                match state.update_ptt() {
                    Some(active) => self.send_ptt(active),
                    None => KeyAction::Ignored,
                }
            }
        };

        self.apply(&action);
        action
    }

    /// Forget held keys and switch PTT off if it was on
    pub fn release_all(&self) {
        let mut state = self.lock();
        Self::release_locked(&mut state, &self.sink);
    }

    /// Release PTT and ignore every key event from now on
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.closed = true;
        Self::release_locked(&mut state, &self.sink);
        debug!("Key capture bridge closed");
    }

    fn release_locked(state: &mut BridgeState, sink: &S) {
        state.held = [false; 2];
        state.swallow_release = None;
        if let Some(active) = state.update_ptt() {
            sink.set_ptt(active);
        }
    }

    /// Forward a PTT transition; called with the state lock held so the
    /// engine sees transitions in the order they were decided
    fn send_ptt(&self, active: bool) -> KeyAction {
        debug!("PTT {}", if active { "on" } else { "off" });
        self.sink.set_ptt(active);
        KeyAction::Ptt(active)
    }

    fn matches(slot: &SlotState, key: KeyCode) -> bool {
        matches!(*slot, SlotState::Idle { key: bound } if bound.is_bound() && bound == key)
    }

    /// Persist and announce a new binding, outside the state lock
    fn apply(&self, action: &KeyAction) {
        if let KeyAction::Bound(bound) = action {
            info!("{} bound to {}", bound.slot, bound.name);
            if let Err(e) = self.store.store(bound.slot, bound.key) {
                warn!("Failed to persist {} binding: {}", bound.slot, e);
            }
            if let Some(notifier) = &self.notifier {
                let _ = notifier.send(bound.clone());
            }
        }
    }
}
