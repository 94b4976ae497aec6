//! Light bank: the in-memory truth for every output channel.
//!
//! Each channel couples a name, an output pin and an on/off state. A toggle
//! always updates memory and the pin; writing the new state to the `light`
//! namespace is optional, so preview toggles neither wear the flash nor
//! change what a reboot restores.

mod pins;

pub use pins::SimulatedPin;

use crate::config::DeviceConfig;
use crate::storage::{ConfigStore, Namespace, Storage};
use embedded_hal::digital::{OutputPin, PinState};
use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// Storage key for the persisted state of light `index`.
pub fn light_state_key(index: usize) -> String {
    format!("state{}", index)
}

struct LightChannel<P> {
    name: String,
    gpio: u8,
    pin: P,
    state: bool,
}

/// Read-only view of one active channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightStatus {
    pub index: usize,
    pub name: String,
    pub state: bool,
}

/// Fixed-capacity bank of output channels, of which the first
/// `active()` are in use.
pub struct LightBank<P> {
    channels: Vec<LightChannel<P>>,
    active: usize,
}

impl<P: OutputPin> LightBank<P> {
    /// Build the bank from the loaded config and `(gpio, pin)` pairs.
    ///
    /// Every channel starts off. Channels beyond the number of pins are
    /// dropped, so the active count never exceeds the hardware.
    pub fn new(config: &DeviceConfig, pins: Vec<(u8, P)>) -> Self {
        let channels: Vec<_> = pins
            .into_iter()
            .zip(&config.light_names)
            .map(|((gpio, pin), name)| LightChannel {
                name: name.clone(),
                gpio,
                pin,
                state: false,
            })
            .collect();
        let active = config.num_lights.min(channels.len());
        Self { channels, active }
    }

    /// Number of active channels.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Drive every active channel to its persisted state without writing
    /// anything back.
    pub fn restore<S: Storage>(&mut self, store: &ConfigStore<S>) {
        for index in 0..self.active {
            let state = store.get_bool(Namespace::Light, &light_state_key(index), false);
            if let Err(e) = self.toggle(store, index, state, false) {
                warn!("Failed to restore light {}: {}", index, e);
            }
        }
    }

    /// Set channel `index` to `on`, drive its pin and, with `persist`, save
    /// the state.
    ///
    /// Nothing changes when the index is out of range or the pin refuses
    /// the write. A failed save is logged; the output still changes.
    pub fn toggle<S: Storage>(
        &mut self,
        store: &ConfigStore<S>,
        index: usize,
        on: bool,
        persist: bool,
    ) -> Result<(), LightError> {
        if index >= self.active {
            return Err(LightError::OutOfRange {
                index,
                len: self.active,
            });
        }
        let channel = &mut self.channels[index];

        channel
            .pin
            .set_state(PinState::from(on))
            .map_err(|e| LightError::Pin {
                index,
                gpio: channel.gpio,
                reason: format!("{:?}", e),
            })?;
        channel.state = on;

        if persist {
            if let Err(e) = store.set_bool(Namespace::Light, &light_state_key(index), on) {
                warn!("Failed to save state of light {}: {}", index, e);
            }
        }
        info!(
            "Light {} ({}): {}",
            index,
            channel.name,
            if on { "ON" } else { "OFF" }
        );
        Ok(())
    }

    /// Current state of a channel, if active.
    pub fn state(&self, index: usize) -> Option<bool> {
        self.channels[..self.active].get(index).map(|c| c.state)
    }

    /// Name of a channel, if active.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.channels[..self.active].get(index).map(|c| c.name.as_str())
    }

    /// Active channels in index order, as currently held in memory.
    pub fn snapshot(&self) -> Vec<LightStatus> {
        self.channels[..self.active]
            .iter()
            .enumerate()
            .map(|(index, c)| LightStatus {
                index,
                name: c.name.clone(),
                state: c.state,
            })
            .collect()
    }

    /// Resolve a route segment to an active channel.
    ///
    /// An exact name match wins; otherwise a decimal index is accepted.
    pub fn find(&self, segment: &str) -> Option<usize> {
        let active = &self.channels[..self.active];
        active
            .iter()
            .position(|c| c.name == segment)
            .or_else(|| segment.parse::<usize>().ok().filter(|i| *i < active.len()))
    }

    /// Borrow the pin of channel `index` (any channel, active or not).
    pub fn pin(&self, index: usize) -> Option<&P> {
        self.channels.get(index).map(|c| &c.pin)
    }

    /// Give back every `(gpio, pin)` pair, in channel order.
    pub fn into_pins(self) -> Vec<(u8, P)> {
        self.channels.into_iter().map(|c| (c.gpio, c.pin)).collect()
    }
}

/// Errors from light operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightError {
    /// Index is not an active channel.
    OutOfRange { index: usize, len: usize },
    /// The output pin rejected the write.
    Pin { index: usize, gpio: u8, reason: String },
}

impl fmt::Display for LightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "light index {} out of range (0..{})", index, len)
            }
            Self::Pin { index, gpio, reason } => {
                write!(f, "light {} (GPIO{}) write failed: {}", index, gpio, reason)
            }
        }
    }
}

impl std::error::Error for LightError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_LIGHT_PINS, MAX_LIGHTS};
    use crate::storage::MemoryStorage;

    fn store() -> ConfigStore<MemoryStorage> {
        ConfigStore::new(MemoryStorage::new())
    }

    fn pins() -> Vec<(u8, SimulatedPin)> {
        SimulatedPin::bank(&DEFAULT_LIGHT_PINS)
    }

    fn bank_with(num_lights: usize) -> LightBank<SimulatedPin> {
        let config = DeviceConfig {
            num_lights,
            ..DeviceConfig::default()
        };
        LightBank::new(&config, pins())
    }

    // ==================== Toggle Tests ====================

    #[test]
    fn test_persisted_toggle() {
        let store = store();
        let mut bank = bank_with(MAX_LIGHTS);

        bank.toggle(&store, 0, true, true).unwrap();

        assert_eq!(bank.state(0), Some(true));
        assert!(bank.pin(0).unwrap().is_high());
        assert!(store.get_bool(Namespace::Light, "state0", false));
    }

    #[test]
    fn test_ephemeral_toggle_not_saved() {
        let store = store();
        let mut bank = bank_with(MAX_LIGHTS);

        bank.toggle(&store, 1, true, false).unwrap();

        assert_eq!(bank.state(1), Some(true));
        assert!(bank.pin(1).unwrap().is_high());
        assert_eq!(store.backend().key_count(Namespace::Light), 0);
    }

    #[test]
    fn test_out_of_range_leaves_bank_unchanged() {
        let store = store();
        let mut bank = bank_with(2);

        let before = bank.snapshot();
        assert_eq!(
            bank.toggle(&store, 2, true, true),
            Err(LightError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(bank.snapshot(), before);
        assert_eq!(bank.pin(2).unwrap().writes(), 0);
        assert_eq!(store.backend().key_count(Namespace::Light), 0);
    }

    // ==================== Restore Tests ====================

    #[test]
    fn test_restore_does_not_write() {
        let store = store();
        store.set_bool(Namespace::Light, "state2", true).unwrap();
        let mut bank = bank_with(MAX_LIGHTS);

        bank.restore(&store);

        assert_eq!(bank.state(2), Some(true));
        assert!(bank.pin(2).unwrap().is_high());
        assert_eq!(bank.state(0), Some(false));
        assert_eq!(store.backend().key_count(Namespace::Light), 1);
    }

    #[test]
    fn test_restore_only_active_channels() {
        let store = store();
        store.set_bool(Namespace::Light, "state3", true).unwrap();
        let mut bank = bank_with(2);

        bank.restore(&store);
        assert_eq!(bank.pin(3).unwrap().writes(), 0);
        assert_eq!(bank.pin(0).unwrap().writes(), 1);
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_snapshot_order_and_names() {
        let bank = bank_with(3);
        let names: Vec<_> = bank.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Light 1", "Light 2", "Light 3"]);
    }

    #[test]
    fn test_find_by_name_then_index() {
        let mut config = DeviceConfig::default();
        config.light_names[0] = "Kitchen".into();
        config.light_names[1] = "0".into();
        let bank = LightBank::new(&config, pins());

        assert_eq!(bank.find("Kitchen"), Some(0));
        // A light literally named "0" shadows index 0.
        assert_eq!(bank.find("0"), Some(1));
        assert_eq!(bank.find("2"), Some(2));
        assert_eq!(bank.find("4"), None);
        assert_eq!(bank.find("Garage"), None);
    }

    #[test]
    fn test_find_ignores_inactive_names() {
        let mut config = DeviceConfig::default();
        config.num_lights = 1;
        config.light_names[3] = "Porch".into();
        let bank = LightBank::new(&config, pins());
        assert_eq!(bank.find("Porch"), None);
        assert_eq!(bank.find("1"), None);
    }

    #[test]
    fn test_fewer_pins_than_configured() {
        let config = DeviceConfig::default();
        let bank = LightBank::new(&config, vec![(2, SimulatedPin::new(2))]);
        assert_eq!(bank.active(), 1);
        assert_eq!(bank.into_pins().len(), 1);
    }
}
