//! Hand-written port implementations for unit tests.

use std::{
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::models::{
    readings::{LinkReading, SpeedState, TemperatureReading},
    status_bits::StatusBits,
};

use super::ports::{Clock, DriverError, PressureConnector, PressureSource, PumpDriver};

#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounts {
    pub speed_state: usize,
    pub link: usize,
    pub temperatures: usize,
    pub start: usize,
    pub stop: usize,
    pub close: usize,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: CallCounts,
    pub status: StatusBits,
    pub failing: bool,
}

/// Driver whose readings change on every fetch so a refresh is observable.
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn with_status(status: StatusBits) -> Self {
        let driver = Self::new();
        driver.state.lock().unwrap().status = status;
        driver
    }

    pub fn state(&self) -> Arc<Mutex<FakeState>> {
        self.state.clone()
    }

    fn check(state: &FakeState) -> Result<(), DriverError> {
        if state.failing {
            return Err(DriverError::Transport(io::Error::new(
                io::ErrorKind::TimedOut,
                "no reply",
            )));
        }
        Ok(())
    }
}

impl PumpDriver for FakeDriver {
    fn speed_state(&mut self) -> Result<SpeedState, DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.calls.speed_state += 1;
        Ok(SpeedState {
            frequency_hz: state.calls.speed_state as f64,
            status: state.status,
        })
    }

    fn link(&mut self) -> Result<LinkReading, DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.calls.link += 1;
        let n = state.calls.link as f64;
        Ok(LinkReading {
            voltage_v: 48.0,
            current_a: n,
            power_w: 48.0 * n,
        })
    }

    fn temperatures(&mut self) -> Result<TemperatureReading, DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.calls.temperatures += 1;
        Ok(TemperatureReading {
            motor_c: 20.0 + state.calls.temperatures as f64,
            controller_c: 30.0,
        })
    }

    fn start(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.calls.start += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.calls.stop += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.state.lock().unwrap().calls.close += 1;
        Ok(())
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

pub struct FixedPressure(pub f64);

impl PressureSource for FixedPressure {
    fn pressure(&self) -> Result<f64, DriverError> {
        Ok(self.0)
    }
}

/// Connector that knows exactly one reachable reference.
pub struct FakeConnector {
    pub reachable: &'static str,
}

impl PressureConnector for FakeConnector {
    fn connect(&self, reference: &str) -> Result<Box<dyn PressureSource>, DriverError> {
        if reference == self.reachable {
            Ok(Box::new(FixedPressure(1.5e-6)))
        } else {
            Err(DriverError::Unreachable(reference.to_string()))
        }
    }
}
