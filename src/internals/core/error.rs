use thiserror::Error;

use super::{classifier::StatusError, ports::DriverError};

/// Errors surfaced by the pump device to whoever reads attributes or runs
/// commands.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// A fetch or command failed in the driver. Fatal for this read cycle.
    #[error("Driver failure: {0}")]
    Driver(#[from] DriverError),

    #[error("Failed to build status text: {0}")]
    Status(#[from] StatusError),

    /// The connection to the controller has already been released.
    #[error("Connection to the pump controller is closed.")]
    Closed,

    #[error("Unknown attribute '{0}'.")]
    UnknownAttribute(String),

    #[error("Unknown command '{0}'.")]
    UnknownCommand(String),

    /// The optional pressure attribute was not enabled at startup.
    #[error("No pressure device is attached.")]
    PressureUnavailable,
}
