use std::{io, time::Instant};

use thiserror::Error;

use crate::models::readings::{LinkReading, SpeedState, TemperatureReading};

/// Errors reported by anything sitting behind a driver port: the pump link
/// itself or a downstream device.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The underlying serial port or socket failed.
    #[error("Transport failure: {0}")]
    Transport(#[from] io::Error),

    /// The controller answered with an error code.
    #[error("Controller rejected '{command}' with code {code}.")]
    Rejected { command: String, code: u8 },

    /// The controller answered with something that could not be parsed.
    #[error("Malformed reply to '{command}': '{reply}'.")]
    Malformed { command: String, reply: String },

    /// A downstream device could not be reached.
    #[error("Device '{0}' is unreachable.")]
    Unreachable(String),
}

impl From<serialport::Error> for DriverError {
    fn from(value: serialport::Error) -> Self {
        Self::Transport(value.into())
    }
}

/// Fetch and control operations offered by the pump controller driver.
pub trait PumpDriver: Send {
    fn speed_state(&mut self) -> Result<SpeedState, DriverError>;

    fn link(&mut self) -> Result<LinkReading, DriverError>;

    fn temperatures(&mut self) -> Result<TemperatureReading, DriverError>;

    fn start(&mut self) -> Result<(), DriverError>;

    fn stop(&mut self) -> Result<(), DriverError>;

    /// Release the connection to the controller.
    fn close(&mut self) -> Result<(), DriverError>;
}

impl<T: PumpDriver + ?Sized> PumpDriver for Box<T> {
    fn speed_state(&mut self) -> Result<SpeedState, DriverError> {
        (**self).speed_state()
    }

    fn link(&mut self) -> Result<LinkReading, DriverError> {
        (**self).link()
    }

    fn temperatures(&mut self) -> Result<TemperatureReading, DriverError> {
        (**self).temperatures()
    }

    fn start(&mut self) -> Result<(), DriverError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        (**self).stop()
    }

    fn close(&mut self) -> Result<(), DriverError> {
        (**self).close()
    }
}

/// A downstream device reporting the pressure of the evacuated volume.
pub trait PressureSource: Send + Sync {
    /// Pressure in mbar.
    fn pressure(&self) -> Result<f64, DriverError>;
}

/// Resolves a downstream device reference. Implementations must check that
/// the device actually answers before handing out a source.
pub trait PressureConnector {
    fn connect(&self, reference: &str) -> Result<Box<dyn PressureSource>, DriverError>;
}

/// Source of monotonic time for the polling cache.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
