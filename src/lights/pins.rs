//! Simulated output pins for host builds and tests.

use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;
use std::convert::Infallible;

/// An output pin that only remembers its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedPin {
    gpio: u8,
    high: bool,
    writes: usize,
}

impl SimulatedPin {
    /// A pin standing in for GPIO `gpio`, initially low.
    pub fn new(gpio: u8) -> Self {
        Self {
            gpio,
            high: false,
            writes: 0,
        }
    }

    /// One low pin per GPIO number, paired with that number as
    /// [`LightBank::new`](super::LightBank::new) expects.
    pub fn bank(gpios: &[u8]) -> Vec<(u8, Self)> {
        gpios.iter().map(|&gpio| (gpio, Self::new(gpio))).collect()
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Number of level writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn write(&mut self, high: bool) {
        self.high = high;
        self.writes += 1;
        debug!("GPIO{} -> {}", self.gpio, if high { "HIGH" } else { "LOW" });
    }
}

impl ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_levels() {
        let mut pin = SimulatedPin::new(2);
        assert!(!pin.is_high());
        pin.set_high().unwrap();
        assert!(pin.is_high());
        pin.set_state(false.into()).unwrap();
        assert!(!pin.is_high());
        assert_eq!(pin.writes(), 2);
    }

    #[test]
    fn test_bank() {
        let pins = SimulatedPin::bank(&[2, 4, 5]);
        assert_eq!(pins.len(), 3);
        assert!(pins.iter().all(|(gpio, pin)| pin.gpio() == *gpio && !pin.is_high()));
    }
}
