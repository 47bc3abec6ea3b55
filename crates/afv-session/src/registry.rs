//! Radio registry
//!
//! The set of monitored frequencies keyed by frequency. Radios are only
//! created by an explicit add and only destroyed by an explicit remove or a
//! full reset.
//!
//! Receive/last-heard updates for a frequency that is absent or has both
//! receive and transmit disabled are ignored. Engine events can arrive after
//! the user switched a radio off or removed it, and those must not bring
//! stale activity back.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CommandError;
use crate::state::Radio;
use crate::voice::FrequencyState;

/// Mapping from frequency to radio
#[derive(Debug, Default)]
pub struct RadioRegistry {
    radios: HashMap<u32, Radio>,
}

impl RadioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a radio
    ///
    /// A duplicate frequency is rejected; the existing radio is untouched.
    /// The radio is marked primary when its station is our own callsign.
    pub fn add_radio(
        &mut self,
        frequency_hz: u32,
        station_callsign: &str,
        self_callsign: &str,
    ) -> Result<&Radio, CommandError> {
        if self.radios.contains_key(&frequency_hz) {
            return Err(CommandError::DuplicateFrequency(frequency_hz));
        }

        let primary = !self_callsign.is_empty() && station_callsign == self_callsign;
        let radio = Radio::new(frequency_hz, station_callsign.to_string(), primary);
        debug!("Added radio {} ({})", frequency_hz, station_callsign);

        Ok(self.radios.entry(frequency_hz).or_insert(radio))
    }

    /// Remove a radio, returning it if it existed
    pub fn remove_radio(&mut self, frequency_hz: u32) -> Option<Radio> {
        let removed = self.radios.remove(&frequency_hz);
        if removed.is_some() {
            debug!("Removed radio {}", frequency_hz);
        }
        removed
    }

    pub fn contains(&self, frequency_hz: u32) -> bool {
        self.radios.contains_key(&frequency_hz)
    }

    pub fn get(&self, frequency_hz: u32) -> Option<&Radio> {
        self.radios.get(&frequency_hz)
    }

    /// Iterate over all radios (unordered)
    pub fn radios(&self) -> impl Iterator<Item = &Radio> {
        self.radios.values()
    }

    /// Clone all radios ordered by frequency
    pub fn snapshot(&self) -> Vec<Radio> {
        let mut radios: Vec<Radio> = self.radios.values().cloned().collect();
        radios.sort_by_key(|r| r.frequency_hz);
        radios
    }

    pub fn len(&self) -> usize {
        self.radios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radios.is_empty()
    }

    /// Absent, or present with receive and transmit both off
    pub fn is_inactive(&self, frequency_hz: u32) -> bool {
        self.radios
            .get(&frequency_hz)
            .map_or(true, Radio::is_inactive)
    }

    /// Update the transceiver count on every radio of a station
    ///
    /// Returns the frequencies that changed.
    pub fn set_transceiver_count(&mut self, station_callsign: &str, count: u32) -> Vec<u32> {
        let mut changed: Vec<u32> = self
            .radios
            .values_mut()
            .filter(|r| r.station_callsign == station_callsign && r.transceiver_count != count)
            .map(|r| {
                r.transceiver_count = count;
                r.frequency_hz
            })
            .collect();
        changed.sort_unstable();
        changed
    }

    /// Mark a frequency as receiving or idle
    ///
    /// Ignored for inactive frequencies. Returns true if the radio changed.
    pub fn set_receiving(&mut self, frequency_hz: u32, active: bool) -> bool {
        let Some(radio) = self.active_radio_mut(frequency_hz) else {
            debug!("Ignoring rx={} for inactive frequency {}", active, frequency_hz);
            return false;
        };
        if radio.currently_receiving == active {
            return false;
        }
        radio.currently_receiving = active;
        true
    }

    /// Record the last callsign heard on a frequency
    ///
    /// Ignored for inactive frequencies. Returns true if the radio changed.
    pub fn set_last_heard(&mut self, frequency_hz: u32, callsign: &str) -> bool {
        let Some(radio) = self.active_radio_mut(frequency_hz) else {
            debug!(
                "Ignoring last heard {} for inactive frequency {}",
                callsign, frequency_hz
            );
            return false;
        };
        if radio.last_heard_callsign == callsign {
            return false;
        }
        radio.last_heard_callsign = callsign.to_string();
        true
    }

    /// Apply the global transmit state
    ///
    /// PTT is not per frequency: transmit-enabled radios follow `active`,
    /// everything else is forced off. Returns the frequencies that changed.
    pub fn set_transmitting(&mut self, active: bool) -> Vec<u32> {
        let mut changed: Vec<u32> = self
            .radios
            .values_mut()
            .filter_map(|r| {
                let transmitting = active && r.tx;
                if r.currently_transmitting == transmitting {
                    return None;
                }
                r.currently_transmitting = transmitting;
                Some(r.frequency_hz)
            })
            .collect();
        changed.sort_unstable();
        changed
    }

    /// Mirror an accepted engine frequency state
    ///
    /// Turning receive off clears receive activity, turning transmit off
    /// clears transmit activity.
    pub fn set_radio_state(
        &mut self,
        frequency_hz: u32,
        state: FrequencyState,
    ) -> Result<&Radio, CommandError> {
        let radio = self
            .radios
            .get_mut(&frequency_hz)
            .ok_or(CommandError::FrequencyNotFound(frequency_hz))?;

        radio.rx = state.rx;
        radio.tx = state.tx;
        radio.xc = state.xc;
        radio.on_speaker = state.on_speaker;
        radio.cross_couple_across = state.cross_couple_across;
        if !radio.rx {
            radio.currently_receiving = false;
        }
        if !radio.tx {
            radio.currently_transmitting = false;
        }

        Ok(radio)
    }

    /// Remove every radio. Returns how many were removed.
    pub fn reset(&mut self) -> usize {
        let count = self.radios.len();
        self.radios.clear();
        if count > 0 {
            debug!("Radio registry reset ({} radios removed)", count);
        }
        count
    }

    fn active_radio_mut(&mut self, frequency_hz: u32) -> Option<&mut Radio> {
        self.radios
            .get_mut(&frequency_hz)
            .filter(|r| !r.is_inactive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWR: u32 = 118_500_000;
    const GUARD: u32 = 121_500_000;

    fn registry_with(freqs: &[u32]) -> RadioRegistry {
        let mut registry = RadioRegistry::new();
        for &f in freqs {
            registry.add_radio(f, "EGLL_TWR", "EGLL_TWR").unwrap();
        }
        registry
    }

    #[test]
    fn test_duplicate_add_is_rejected_not_overwritten() {
        let mut registry = registry_with(&[TWR]);
        registry.set_last_heard(TWR, "X");
        registry
            .set_radio_state(TWR, FrequencyState::rx_only())
            .unwrap();

        assert_eq!(
            registry.add_radio(TWR, "OTHER", "").unwrap_err(),
            CommandError::DuplicateFrequency(TWR)
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(TWR).unwrap().station_callsign, "EGLL_TWR");
        assert!(registry.get(TWR).unwrap().rx);
    }

    #[test]
    fn test_primary_flag() {
        let mut registry = RadioRegistry::new();
        assert!(registry.add_radio(TWR, "EGLL_TWR", "EGLL_TWR").unwrap().primary);
        assert!(!registry.add_radio(GUARD, "GUARD", "EGLL_TWR").unwrap().primary);
    }

    #[test]
    fn test_receiving_ignored_when_inactive() {
        let mut registry = registry_with(&[TWR]);

        assert!(!registry.set_receiving(TWR, true));
        assert!(!registry.get(TWR).unwrap().currently_receiving);

        registry
            .set_radio_state(TWR, FrequencyState::rx_only())
            .unwrap();
        assert!(registry.set_receiving(TWR, true));
        assert!(registry.get(TWR).unwrap().currently_receiving);
    }

    #[test]
    fn test_receiving_ignored_when_absent() {
        let mut registry = RadioRegistry::new();
        assert!(!registry.set_receiving(GUARD, true));
        assert!(!registry.set_last_heard(GUARD, "BAW123"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_disabling_rx_clears_activity() {
        let mut registry = registry_with(&[TWR]);
        registry
            .set_radio_state(TWR, FrequencyState::rx_only())
            .unwrap();
        registry.set_receiving(TWR, true);

        registry
            .set_radio_state(TWR, FrequencyState::default())
            .unwrap();
        let radio = registry.get(TWR).unwrap();
        assert!(!radio.currently_receiving);
        assert!(radio.is_inactive());
    }

    #[test]
    fn test_transmitting_follows_tx_subset() {
        let mut registry = registry_with(&[TWR, GUARD]);
        registry.set_radio_state(TWR, FrequencyState::rx_tx()).unwrap();
        registry
            .set_radio_state(GUARD, FrequencyState::rx_only())
            .unwrap();

        assert_eq!(registry.set_transmitting(true), vec![TWR]);
        assert!(registry.get(TWR).unwrap().currently_transmitting);
        assert!(!registry.get(GUARD).unwrap().currently_transmitting);

        assert_eq!(registry.set_transmitting(true), Vec::<u32>::new());
        assert_eq!(registry.set_transmitting(false), vec![TWR]);
    }

    #[test]
    fn test_transceiver_count_by_station() {
        let mut registry = RadioRegistry::new();
        registry.add_radio(TWR, "EGLL_TWR", "").unwrap();
        registry.add_radio(GUARD, "GUARD", "").unwrap();

        assert_eq!(registry.set_transceiver_count("EGLL_TWR", 3), vec![TWR]);
        assert_eq!(registry.get(TWR).unwrap().transceiver_count, 3);
        assert_eq!(registry.get(GUARD).unwrap().transceiver_count, 0);
        assert!(registry.set_transceiver_count("EGLL_TWR", 3).is_empty());
    }

    #[test]
    fn test_reset_then_events_are_noops() {
        let mut registry = registry_with(&[TWR, GUARD]);
        assert_eq!(registry.reset(), 2);

        registry.set_receiving(TWR, true);
        registry.set_last_heard(GUARD, "BAW123");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_state_for_missing_radio() {
        let mut registry = RadioRegistry::new();
        assert_eq!(
            registry
                .set_radio_state(TWR, FrequencyState::rx_only())
                .unwrap_err(),
            CommandError::FrequencyNotFound(TWR)
        );
    }

    #[test]
    fn test_snapshot_sorted() {
        let registry = registry_with(&[GUARD, TWR]);
        let freqs: Vec<u32> = registry.snapshot().iter().map(|r| r.frequency_hz).collect();
        assert_eq!(freqs, vec![TWR, GUARD]);
    }
}
