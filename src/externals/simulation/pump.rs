//! Simulated pump controller for running without hardware.

use std::time::{Duration, Instant};

use tracing::info;

use crate::{
    internals::core::ports::{DriverError, PumpDriver},
    models::{
        readings::{LinkReading, SpeedState, TemperatureReading},
        status_bits::StatusBits,
    },
};

/// Full rotational speed of the simulated pump.
pub const FULL_SPEED_HZ: f64 = 1500.0;
const ACCELERATION_HZ_PER_S: f64 = 50.0;
const DECELERATION_HZ_PER_S: f64 = 25.0;
const STOPPED_SPEED_HZ: f64 = 50.0;
const SUPPLY_VOLTAGE_V: f64 = 48.0;
const AMBIENT_C: f64 = 25.0;

const BIT_BELOW_STOPPED_SPEED: u8 = 1;
const BIT_ABOVE_NORMAL_SPEED: u8 = 2;
const BIT_START_COMMAND: u8 = 4;
const BIT_SERIAL_ENABLE: u8 = 6;
const BIT_ABOVE_HALF_SPEED: u8 = 7;

/// Deterministic pump model. Spins up while started and coasts down once
/// stopped; every reading is derived from the current speed.
#[derive(Debug)]
pub struct SimulatedPump {
    started: bool,
    frequency_hz: f64,
    last_update: Instant,
}

impl SimulatedPump {
    pub fn new() -> Self {
        Self {
            started: false,
            frequency_hz: 0.0,
            last_update: Instant::now(),
        }
    }

    /// Move the model forward by `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) {
        let dt = elapsed.as_secs_f64();
        self.frequency_hz = if self.started {
            (self.frequency_hz + ACCELERATION_HZ_PER_S * dt).min(FULL_SPEED_HZ)
        } else {
            (self.frequency_hz - DECELERATION_HZ_PER_S * dt).max(0.0)
        };
    }

    fn update(&mut self) {
        let now = Instant::now();
        self.advance(now.saturating_duration_since(self.last_update));
        self.last_update = now;
    }

    fn accelerating(&self) -> bool {
        self.started && self.frequency_hz < FULL_SPEED_HZ
    }

    pub fn status(&self) -> StatusBits {
        let mut bits = vec![BIT_SERIAL_ENABLE];
        if self.started {
            bits.push(BIT_START_COMMAND);
        }
        if self.frequency_hz < STOPPED_SPEED_HZ {
            bits.push(BIT_BELOW_STOPPED_SPEED);
        }
        if self.frequency_hz > FULL_SPEED_HZ * 0.5 {
            bits.push(BIT_ABOVE_HALF_SPEED);
        }
        if self.frequency_hz >= FULL_SPEED_HZ * 0.8 {
            bits.push(BIT_ABOVE_NORMAL_SPEED);
        }
        StatusBits::from_bits(&bits)
    }

    fn power_w(&self) -> f64 {
        if self.accelerating() {
            80.0
        } else if self.frequency_hz > 0.0 {
            10.0 + self.frequency_hz * 0.005
        } else {
            0.0
        }
    }
}

impl Default for SimulatedPump {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpDriver for SimulatedPump {
    fn speed_state(&mut self) -> Result<SpeedState, DriverError> {
        self.update();
        Ok(SpeedState {
            frequency_hz: self.frequency_hz.round(),
            status: self.status(),
        })
    }

    fn link(&mut self) -> Result<LinkReading, DriverError> {
        self.update();
        let power_w = self.power_w();
        Ok(LinkReading {
            voltage_v: SUPPLY_VOLTAGE_V,
            current_a: power_w / SUPPLY_VOLTAGE_V,
            power_w,
        })
    }

    fn temperatures(&mut self) -> Result<TemperatureReading, DriverError> {
        self.update();
        Ok(TemperatureReading {
            motor_c: AMBIENT_C + self.frequency_hz / 100.0,
            controller_c: AMBIENT_C + 3.0 + self.power_w() * 0.05,
        })
    }

    fn start(&mut self) -> Result<(), DriverError> {
        self.update();
        self.started = true;
        info!("[Sim] Pump started.");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.update();
        self.started = false;
        info!("[Sim] Pump stopped.");
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        info!("[Sim] Pump link closed.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{internals::core::classifier::classify, models::coarse_state::CoarseState};

    #[test]
    fn test_idle_pump() {
        let pump = SimulatedPump::new();
        assert_eq!(pump.status(), StatusBits::from_bits(&[1, 6]));
        assert_eq!(classify(pump.status()), CoarseState::Unknown);
    }

    #[test]
    fn test_spin_up_and_coast_down() {
        let mut pump = SimulatedPump::new();
        pump.started = true;

        pump.advance(Duration::from_secs(10));
        assert_eq!(pump.frequency_hz, 500.0);
        assert_eq!(classify(pump.status()), CoarseState::Moving);

        pump.advance(Duration::from_secs(60));
        assert_eq!(pump.frequency_hz, FULL_SPEED_HZ);
        assert!(pump.status().contains(BIT_ABOVE_NORMAL_SPEED));
        assert!(pump.status().contains(BIT_ABOVE_HALF_SPEED));
        assert_eq!(classify(pump.status()), CoarseState::Running);

        pump.started = false;
        pump.advance(Duration::from_secs(20));
        assert_eq!(pump.frequency_hz, 1000.0);
        assert!(!pump.status().contains(BIT_ABOVE_NORMAL_SPEED));

        pump.advance(Duration::from_secs(120));
        assert_eq!(pump.frequency_hz, 0.0);
    }

    #[test]
    fn test_power_follows_speed() {
        let mut pump = SimulatedPump::new();
        assert_eq!(pump.power_w(), 0.0);

        pump.started = true;
        pump.advance(Duration::from_secs(1));
        assert_eq!(pump.power_w(), 80.0);

        pump.advance(Duration::from_secs(60));
        assert_eq!(pump.power_w(), 10.0 + FULL_SPEED_HZ * 0.005);
    }
}
