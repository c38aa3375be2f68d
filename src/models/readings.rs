use std::fmt::Display;

use serde::Serialize;

use super::{poll_group::PollGroup, status_bits::StatusBits};

/// Result of one speed/state poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpeedState {
    pub frequency_hz: f64,
    pub status: StatusBits,
}

/// Result of one electrical link poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LinkReading {
    pub voltage_v: f64,
    pub current_a: f64,
    pub power_w: f64,
}

/// Result of one temperature poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub motor_c: f64,
    pub controller_c: f64,
}

/// The subset of the snapshot belonging to a single poll group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GroupReading {
    SpeedState(SpeedState),
    Link(LinkReading),
    Temperature(TemperatureReading),
}

impl GroupReading {
    pub fn group(&self) -> PollGroup {
        match self {
            Self::SpeedState(_) => PollGroup::SpeedState,
            Self::Link(_) => PollGroup::Link,
            Self::Temperature(_) => PollGroup::Temperature,
        }
    }
}

/// Latest known value of every sensor quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub frequency: f64,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub motor_temperature: f64,
    pub controller_temperature: f64,
    pub status_bits: StatusBits,
}

impl SensorSnapshot {
    pub fn assemble(
        speed_state: SpeedState,
        link: LinkReading,
        temperatures: TemperatureReading,
    ) -> Self {
        Self {
            frequency: speed_state.frequency_hz,
            voltage: link.voltage_v,
            current: link.current_a,
            power: link.power_w,
            motor_temperature: temperatures.motor_c,
            controller_temperature: temperatures.controller_c,
            status_bits: speed_state.status,
        }
    }
}

impl Display for SensorSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(SensorSnapshot: frequency={:.2} Hz, voltage={:.2} V, current={:.2} A, power={:.2} W, motor={:.2} degC, controller={:.2} degC, status={})",
            self.frequency,
            self.voltage,
            self.current,
            self.power,
            self.motor_temperature,
            self.controller_temperature,
            self.status_bits
        )
    }
}
