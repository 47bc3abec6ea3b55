//! Integration tests for the session layer
//!
//! These tests drive the session engine against the simulated voice engine,
//! with events travelling through the real string wire format and the event
//! demultiplexer:
//! - Connection lifecycle (network login, voice connect/disconnect)
//! - Radio registry behavior under late and stale engine events
//! - Station lookups and PTT
//! - Key capture bridge end to end
//! - The async actor and its observer stream

use std::sync::Arc;

use afv_protocol::{keys::vc, KeyCode, UNSET_FREQUENCY_HZ};
use afv_session::{
    CommandDispatcher, CommandError, EventDemultiplexer, FrequencyState, KeyAction,
    KeyCaptureBridge, MemoryBindingStore, PttSlot, SessionEngine, SessionEvent, VoiceState,
};
use afv_sim::{EngineCall, SimStation, SimulatedEngine, SimulatedEngineConfig};
use tokio::sync::mpsc;

const TWR: u32 = 118_500_000;
const GUARD: u32 = 121_500_000;
const APP: u32 = 119_725_000;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;
    use afv_protocol::EngineEvent;

    /// A session engine wired to a simulated engine through the demultiplexer
    pub struct Rig {
        pub sim: Arc<SimulatedEngine>,
        pub dispatcher: Arc<CommandDispatcher>,
        pub engine: SessionEngine,
        pub demux: Arc<EventDemultiplexer>,
        rx: mpsc::UnboundedReceiver<EngineEvent>,
    }

    impl Rig {
        /// Apply every queued engine event, as the actor would
        pub fn pump(&mut self) {
            while let Ok(event) = self.rx.try_recv() {
                self.engine.apply_engine_event(event);
            }
        }

        /// Pump, then drain observer events
        pub fn events(&mut self) -> Vec<SessionEvent> {
            self.pump();
            self.engine.drain_events()
        }
    }

    pub fn rig_with(config: SimulatedEngineConfig) -> Rig {
        let sim = Arc::new(SimulatedEngine::from_config(config));
        let dispatcher = Arc::new(CommandDispatcher::new(sim.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        let demux = Arc::new(EventDemultiplexer::new(tx));
        dispatcher.register_callback(demux.clone().into_callback());
        let engine = SessionEngine::new(dispatcher.clone());
        Rig {
            sim,
            dispatcher,
            engine,
            demux,
            rx,
        }
    }

    /// Fresh rig with credentials configured
    pub fn rig() -> Rig {
        let rig = rig_with(SimulatedEngineConfig::default());
        rig.dispatcher.set_cid("1234567");
        rig.dispatcher.set_password("secret");
        rig
    }

    /// Rig logged in to the network and voice connected
    pub fn connected_rig(is_atc: bool) -> Rig {
        let mut rig = rig();
        rig.sim.network_login("EGLL_TWR", is_atc, TWR);
        rig.pump();
        rig.engine.connect().unwrap();
        rig.pump();
        assert_eq!(rig.engine.session().voice, VoiceState::Connected);
        rig.engine.drain_events();
        rig.sim.clear_calls();
        rig
    }

    pub fn has_error(events: &[SessionEvent]) -> bool {
        events.iter().any(SessionEvent::is_error)
    }

    pub fn ptt_calls(sim: &SimulatedEngine) -> Vec<bool> {
        sim.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::SetPtt(active) => Some(active),
                _ => None,
            })
            .collect()
    }
}

use helpers::*;

// ============================================================================
// Connection Lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_connect_with_empty_password_is_rejected() {
        let mut rig = rig_with(SimulatedEngineConfig::default());
        rig.dispatcher.set_cid("1234567");
        rig.sim.network_login("EGLL_TWR", false, TWR);
        rig.pump();
        rig.sim.clear_calls();

        assert_eq!(rig.engine.connect(), Err(CommandError::MissingCredentials));
        assert_eq!(rig.engine.session().voice, VoiceState::Disconnected);
        assert!(rig.sim.calls().is_empty());
        assert!(has_error(&rig.events()));
    }

    #[test]
    fn test_connect_applies_audio_then_connects() {
        let mut rig = rig();
        rig.sim.network_login("EGLL_TWR", false, TWR);
        rig.pump();
        rig.sim.clear_calls();

        rig.engine.connect().unwrap();

        let calls = rig.sim.calls();
        assert!(matches!(calls[0], EngineCall::SetAudioSettings(_)));
        assert!(matches!(calls[1], EngineCall::SetHardwareType(_)));
        assert_eq!(calls[2], EngineCall::Connect);

        // Connecting until the engine's event has been applied
        assert_eq!(rig.engine.session().voice, VoiceState::Connecting);
        rig.pump();
        assert_eq!(rig.engine.session().voice, VoiceState::Connected);
    }

    #[test]
    fn test_engine_rejects_connect() {
        let mut rig = rig();
        rig.sim.set_reject_connect(true);
        rig.sim.network_login("EGLL_TWR", false, TWR);
        rig.pump();

        assert_eq!(
            rig.engine.connect(),
            Err(CommandError::Rejected { command: "connect" })
        );
        let events = rig.events();
        assert_eq!(rig.engine.session().voice, VoiceState::Disconnected);
        assert!(has_error(&events));
    }

    #[test]
    fn test_connect_twice_is_rejected() {
        let mut rig = connected_rig(false);
        assert_eq!(rig.engine.connect(), Err(CommandError::AlreadyConnected));
        assert!(rig.sim.calls().is_empty());
    }

    #[test]
    fn test_atc_voice_connect_requests_own_station() {
        let mut rig = rig();
        rig.sim.network_login("EGLL_TWR", true, TWR);
        rig.pump();
        rig.engine.connect().unwrap();
        rig.pump();
        assert!(rig
            .sim
            .calls()
            .contains(&EngineCall::GetStation("EGLL_TWR".to_string())));
    }

    #[test]
    fn test_user_disconnect_resets_registry() {
        let mut rig = connected_rig(false);
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();
        rig.engine.add_frequency(APP, "EGLL_APP").unwrap();

        rig.engine.disconnect().unwrap();
        let events = rig.events();

        assert!(rig.engine.registry().is_empty());
        assert_eq!(rig.engine.session().voice, VoiceState::Disconnected);
        assert!(events.contains(&SessionEvent::RadiosCleared));
        // Network login survives a voice disconnect
        assert!(rig.engine.session().can_connect());
    }

    #[test]
    fn test_network_disconnect_resets_to_sentinel() {
        let mut rig = connected_rig(true);
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();

        rig.sim.network_logout();
        rig.pump();

        let session = rig.engine.session();
        assert!(!session.network_connected);
        assert!(session.callsign.is_empty());
        assert!(!session.is_atc);
        assert_eq!(session.primary_frequency_hz, UNSET_FREQUENCY_HZ);
        assert_eq!(session.voice, VoiceState::Disconnected);
        assert!(!session.can_connect());
        assert!(rig.engine.registry().is_empty());
    }
}

// ============================================================================
// Radio Registry
// ============================================================================

mod registry_tests {
    use super::*;

    #[test]
    fn test_add_receive_remove_scenario() {
        let mut rig = connected_rig(false);

        let radio = rig.engine.add_frequency(GUARD, "EGLL_TWR").unwrap();
        assert_eq!(rig.engine.registry().len(), 1);
        assert!(!radio.rx);
        assert!(!radio.tx);
        assert!(!radio.currently_receiving);

        rig.engine
            .set_frequency_state(GUARD, FrequencyState::rx_only())
            .unwrap();
        rig.sim.rx_begin(GUARD);
        rig.pump();
        assert!(rig.engine.radio(GUARD).unwrap().currently_receiving);

        rig.engine.remove_frequency(GUARD).unwrap();
        assert!(rig.engine.registry().is_empty());
        assert!(rig.sim.frequencies().is_empty());

        rig.engine.drain_events();
        rig.sim.rx_end(GUARD);
        assert!(rig.events().is_empty());
        assert!(rig.engine.registry().is_empty());
    }

    #[test]
    fn test_rx_ignored_for_inactive_radio() {
        let mut rig = connected_rig(false);
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();

        rig.sim.rx_begin(GUARD);
        rig.sim.station_rx_begin(GUARD, "BAW123");
        rig.pump();

        let radio = rig.engine.radio(GUARD).unwrap();
        assert!(!radio.currently_receiving);
        assert!(radio.last_heard_callsign.is_empty());
    }

    #[test]
    fn test_rx_for_unknown_frequency_is_noop() {
        let mut rig = connected_rig(false);
        rig.sim.rx_begin(APP);
        rig.sim.station_rx_begin(APP, "BAW123");
        assert!(rig.events().is_empty());
        assert!(rig.engine.registry().is_empty());
    }

    #[test]
    fn test_disabling_radio_clears_activity() {
        let mut rig = connected_rig(false);
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();
        rig.engine
            .set_frequency_state(GUARD, FrequencyState::rx_only())
            .unwrap();
        rig.sim.rx_begin(GUARD);
        rig.pump();

        rig.engine
            .set_frequency_state(GUARD, FrequencyState::default())
            .unwrap();

        // A late rx end and a new rx begin both land on an inactive radio
        rig.sim.rx_end(GUARD);
        rig.sim.rx_begin(GUARD);
        rig.pump();
        assert!(!rig.engine.radio(GUARD).unwrap().currently_receiving);
    }

    #[test]
    fn test_duplicate_add_keeps_first_radio() {
        let mut rig = connected_rig(false);
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();
        rig.sim.clear_calls();

        assert_eq!(
            rig.engine.add_frequency(GUARD, "OTHER"),
            Err(CommandError::DuplicateFrequency(GUARD))
        );
        assert!(rig.sim.calls().is_empty());
        assert_eq!(rig.engine.radio(GUARD).unwrap().station_callsign, "GUARD");
    }

    #[test]
    fn test_rejected_add_surfaces_error() {
        let mut rig = connected_rig(false);
        rig.sim.set_reject_frequencies(true);

        assert_eq!(
            rig.engine.add_frequency(GUARD, "GUARD"),
            Err(CommandError::Rejected {
                command: "add frequency"
            })
        );
        assert!(rig.engine.registry().is_empty());
        assert!(has_error(&rig.events()));
    }

    #[test]
    fn test_add_before_voice_connected() {
        let mut rig = rig();
        assert_eq!(
            rig.engine.add_frequency(GUARD, "GUARD"),
            Err(CommandError::NotConnected)
        );
        assert!(rig.engine.registry().is_empty());
    }
}

// ============================================================================
// Station Lookups and PTT
// ============================================================================

mod station_tests {
    use super::*;

    fn atc_config() -> SimulatedEngineConfig {
        SimulatedEngineConfig {
            stations: vec![
                SimStation {
                    callsign: "EGLL_TWR".to_string(),
                    frequencies_hz: vec![TWR],
                    transceivers: 3,
                },
                SimStation {
                    callsign: "EGLL_APP".to_string(),
                    frequencies_hz: vec![APP],
                    transceivers: 0,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_atc_gets_primary_radio_on_connect() {
        let mut rig = rig_with(atc_config());
        rig.dispatcher.set_cid("1234567");
        rig.dispatcher.set_password("secret");
        rig.sim.network_login("EGLL_TWR", true, TWR);
        rig.pump();

        rig.engine.connect().unwrap();
        rig.pump();

        let radio = rig.engine.radio(TWR).unwrap();
        assert!(radio.primary);
        assert_eq!(radio.transceiver_count, 3);
        assert_eq!(rig.sim.frequencies(), vec![TWR]);
        // Gain re-applied after the frequency was added
        assert_eq!(rig.sim.gain(), 0.5);
    }

    #[test]
    fn test_station_lookup_adds_other_station() {
        let mut rig = rig_with(atc_config());
        rig.dispatcher.set_cid("1234567");
        rig.dispatcher.set_password("secret");
        rig.sim.network_login("EGLL_TWR", true, TWR);
        rig.pump();
        rig.engine.connect().unwrap();
        rig.pump();

        rig.engine.request_station("EGLL_APP").unwrap();
        rig.pump();

        let radio = rig.engine.radio(APP).unwrap();
        assert!(!radio.primary);
        assert_eq!(rig.engine.registry().len(), 2);

        // Looking up again does not duplicate anything
        rig.engine.refresh_station("EGLL_APP").unwrap();
        rig.pump();
        assert_eq!(rig.engine.registry().len(), 2);
    }

    #[test]
    fn test_ptt_marks_transmitting_radios() {
        let mut rig = connected_rig(false);
        rig.engine.add_frequency(TWR, "EGLL_TWR").unwrap();
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();
        rig.engine
            .set_frequency_state(TWR, FrequencyState::rx_tx())
            .unwrap();

        rig.dispatcher.set_ptt(true);
        rig.pump();
        assert!(rig.engine.radio(TWR).unwrap().currently_transmitting);
        assert!(!rig.engine.radio(GUARD).unwrap().currently_transmitting);

        rig.dispatcher.set_ptt(false);
        rig.pump();
        assert!(!rig.engine.radio(TWR).unwrap().currently_transmitting);
    }

    #[test]
    fn test_engine_error_does_not_change_state() {
        let mut rig = connected_rig(false);
        rig.engine.add_frequency(GUARD, "GUARD").unwrap();
        let before = rig.engine.snapshot();

        rig.sim.report_error("Audio device lost");
        let events = rig.events();

        assert_eq!(
            events,
            vec![SessionEvent::Error {
                source: "Voice engine".to_string(),
                message: "Audio device lost".to_string(),
            }]
        );
        assert_eq!(rig.engine.snapshot(), before);
    }

    #[test]
    fn test_malformed_wire_events_are_dropped() {
        let mut rig = connected_rig(false);
        rig.sim.emit_raw("FrequencyRxBegin", "", "");
        rig.sim.emit_raw("network-connected", "EGLL_TWR", "1");
        rig.sim.emit_raw("NotAnEvent", "x", "y");

        assert!(rig.events().is_empty());
        assert_eq!(rig.demux.dropped_count(), 3);
        assert_eq!(rig.engine.session().voice, VoiceState::Connected);
    }
}

// ============================================================================
// Key Capture Bridge
// ============================================================================

mod key_bridge_tests {
    use super::*;

    #[test]
    fn test_bind_and_transmit_through_engine() {
        let rig = connected_rig(false);
        let store = Arc::new(MemoryBindingStore::new());
        let bridge = KeyCaptureBridge::new(rig.dispatcher.clone(), store.clone());
        let space = KeyCode(vc::SPACE);

        bridge.begin_capture(PttSlot::One);
        assert!(matches!(bridge.key_down(space), KeyAction::Bound(_)));
        bridge.key_up(space);
        assert!(ptt_calls(&rig.sim).is_empty());

        bridge.key_down(space);
        assert!(rig.sim.ptt());
        bridge.key_up(space);
        assert!(!rig.sim.ptt());

        assert_eq!(ptt_calls(&rig.sim), vec![true, false]);
        assert_eq!(bridge.key_name_for(PttSlot::One), "Space");
    }
}

// ============================================================================
// Actor
// ============================================================================

mod actor_tests {
    use super::*;
    use afv_session::spawn_session;
    use tokio::time::{timeout, Duration};

    async fn next_matching(
        events: &mut mpsc::Receiver<SessionEvent>,
        pred: impl Fn(&SessionEvent) -> bool,
    ) -> SessionEvent {
        timeout(Duration::from_secs(2), async {
            loop {
                let event = events.recv().await.expect("event stream closed");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out")
    }

    #[tokio::test]
    async fn test_full_session_through_actor() {
        let sim = Arc::new(SimulatedEngine::new());
        let dispatcher = Arc::new(CommandDispatcher::new(sim.clone()));
        dispatcher.set_cid("1234567");
        dispatcher.set_password("secret");
        let mut session = spawn_session(dispatcher);

        sim.network_login("EGLL_TWR", false, TWR);
        next_matching(&mut session.events, |e| {
            matches!(e, SessionEvent::NetworkStateChanged { connected: true, .. })
        })
        .await;

        session.handle.connect().await.unwrap();
        next_matching(&mut session.events, |e| {
            *e == SessionEvent::VoiceStateChanged {
                state: VoiceState::Connected,
            }
        })
        .await;

        session.handle.add_frequency(GUARD, "GUARD").await.unwrap();
        session
            .handle
            .set_frequency_state(GUARD, FrequencyState::rx_only())
            .await
            .unwrap();

        sim.rx_begin(GUARD);
        let event = next_matching(&mut session.events, |e| {
            matches!(e, SessionEvent::RadioUpdated { radio } if radio.currently_receiving)
        })
        .await;
        assert_eq!(event.frequency_hz(), Some(GUARD));

        sim.network_logout();
        next_matching(&mut session.events, |e| {
            matches!(e, SessionEvent::NetworkStateChanged { connected: false, .. })
        })
        .await;

        let snapshot = session.handle.snapshot().await.unwrap();
        assert!(snapshot.radios.is_empty());
        assert_eq!(snapshot.session.primary_frequency_hz, UNSET_FREQUENCY_HZ);

        session.handle.shutdown().await;
        session.task.await.unwrap();
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use afv_session::{RadioRegistry, SessionStateMachine};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum RegistryOp {
        Add(u32),
        Remove(u32),
        Rx(u32, bool),
        LastHeard(u32),
        State(u32, bool, bool),
        Reset,
    }

    fn frequency() -> impl Strategy<Value = u32> {
        prop_oneof![Just(TWR), Just(GUARD), Just(APP), 118_000_000u32..137_000_000u32]
    }

    fn registry_op() -> impl Strategy<Value = RegistryOp> {
        prop_oneof![
            frequency().prop_map(RegistryOp::Add),
            frequency().prop_map(RegistryOp::Remove),
            (frequency(), any::<bool>()).prop_map(|(f, a)| RegistryOp::Rx(f, a)),
            frequency().prop_map(RegistryOp::LastHeard),
            (frequency(), any::<bool>(), any::<bool>())
                .prop_map(|(f, rx, tx)| RegistryOp::State(f, rx, tx)),
            Just(RegistryOp::Reset),
        ]
    }

    fn apply(registry: &mut RadioRegistry, op: &RegistryOp) {
        match *op {
            RegistryOp::Add(f) => {
                let _ = registry.add_radio(f, "STN", "");
            }
            RegistryOp::Remove(f) => {
                registry.remove_radio(f);
            }
            RegistryOp::Rx(f, active) => {
                registry.set_receiving(f, active);
            }
            RegistryOp::LastHeard(f) => {
                registry.set_last_heard(f, "BAW123");
            }
            RegistryOp::State(f, rx, tx) => {
                let _ = registry.set_radio_state(
                    f,
                    FrequencyState {
                        rx,
                        tx,
                        ..Default::default()
                    },
                );
            }
            RegistryOp::Reset => {
                registry.reset();
            }
        }
    }

    proptest! {
        #[test]
        fn frequencies_stay_unique(ops in prop::collection::vec(registry_op(), 0..64)) {
            let mut registry = RadioRegistry::new();
            for op in &ops {
                apply(&mut registry, op);
            }
            let mut freqs: Vec<u32> = registry.radios().map(|r| r.frequency_hz).collect();
            let total = freqs.len();
            freqs.sort_unstable();
            freqs.dedup();
            prop_assert_eq!(freqs.len(), total);
        }

        #[test]
        fn events_after_reset_are_noops(
            setup in prop::collection::vec(registry_op(), 0..32),
            late in prop::collection::vec((frequency(), any::<bool>()), 0..32),
        ) {
            let mut registry = RadioRegistry::new();
            for op in &setup {
                apply(&mut registry, op);
            }
            registry.reset();
            for (f, active) in late {
                registry.set_receiving(f, active);
                registry.set_last_heard(f, "LATE");
            }
            prop_assert!(registry.is_empty());
        }

        #[test]
        fn inactive_radio_never_receives(
            f in frequency(),
            ops in prop::collection::vec(registry_op(), 0..32),
        ) {
            let mut registry = RadioRegistry::new();
            for op in &ops {
                apply(&mut registry, op);
            }
            if let Some(radio) = registry.get(f) {
                if radio.is_inactive() {
                    let before = radio.currently_receiving;
                    registry.set_receiving(f, true);
                    prop_assert_eq!(registry.get(f).unwrap().currently_receiving, before);
                }
            }
        }

        #[test]
        fn bound_key_issues_one_ptt_each_way(code in 1u32..0xE05D, repeats in 1usize..5) {
            let rig = helpers::rig();
            let store = Arc::new(MemoryBindingStore::new());
            let bridge = KeyCaptureBridge::new(rig.dispatcher.clone(), store);
            let key = KeyCode(code);

            bridge.begin_capture(PttSlot::Two);
            bridge.key_down(key);
            bridge.key_up(key);
            prop_assert!(!bridge.slot_state(PttSlot::Two).is_capturing());
            prop_assert_eq!(bridge.binding(PttSlot::Two), key);

            for _ in 0..repeats {
                bridge.key_down(key);
            }
            bridge.key_up(key);
            prop_assert_eq!(ptt_calls(&rig.sim), vec![true, false]);
        }

        #[test]
        fn network_disconnect_always_resets(
            callsign in "[A-Z]{4}_[A-Z]{3}",
            is_atc in any::<bool>(),
            hz in 118_000_000u32..137_000_000u32,
            connect in any::<bool>(),
        ) {
            let mut machine = SessionStateMachine::new();
            machine.network_connected(&callsign, is_atc, hz);
            if connect {
                machine.connect_accepted();
                machine.voice_connected();
            }
            machine.network_disconnected();
            prop_assert_eq!(machine.session().primary_frequency_hz, UNSET_FREQUENCY_HZ);
            prop_assert!(machine.session().callsign.is_empty());
            prop_assert_eq!(machine.voice(), VoiceState::Disconnected);
        }
    }
}
