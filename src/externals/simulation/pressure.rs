use std::time::Instant;

use tracing::debug;

use crate::internals::core::ports::{DriverError, PressureConnector, PressureSource};

/// References starting with this prefix resolve to a simulated gauge.
pub const SIMULATED_PREFIX: &str = "sim/";

const ATMOSPHERE_MBAR: f64 = 1013.25;
const BASE_PRESSURE_MBAR: f64 = 1e-7;
/// Time constant of the pump-down curve in seconds.
const PUMP_DOWN_TAU_S: f64 = 20.0;

/// Gauge whose reading decays from atmosphere towards base pressure.
pub struct SimulatedGauge {
    since: Instant,
}

impl SimulatedGauge {
    pub fn new() -> Self {
        Self {
            since: Instant::now(),
        }
    }

    pub fn pressure_after(seconds: f64) -> f64 {
        BASE_PRESSURE_MBAR
            + (ATMOSPHERE_MBAR - BASE_PRESSURE_MBAR) * (-seconds / PUMP_DOWN_TAU_S).exp()
    }
}

impl Default for SimulatedGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureSource for SimulatedGauge {
    fn pressure(&self) -> Result<f64, DriverError> {
        Ok(Self::pressure_after(self.since.elapsed().as_secs_f64()))
    }
}

/// Resolves `sim/...` references. Every other reference is unreachable.
#[derive(Debug, Default)]
pub struct SimulatedPressureConnector;

impl PressureConnector for SimulatedPressureConnector {
    fn connect(&self, reference: &str) -> Result<Box<dyn PressureSource>, DriverError> {
        if !reference.starts_with(SIMULATED_PREFIX) {
            return Err(DriverError::Unreachable(reference.to_string()));
        }
        debug!("Resolved '{}' to a simulated gauge.", reference);
        Ok(Box::new(SimulatedGauge::new()))
    }
}
