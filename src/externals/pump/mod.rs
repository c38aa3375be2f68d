use tracing::info;

use crate::internals::core::ports::DriverError;

use self::{
    adapters::NextPumpAdapter,
    services::{Connection, NextLinkService},
};

pub mod adapters;
pub mod services;

/// Open the controller link and wrap it in a driver.
pub fn open_next_pump(connection: &Connection) -> Result<NextPumpAdapter, DriverError> {
    let service = NextLinkService::open(connection)?;
    info!("Connected to pump controller over {}.", connection);
    Ok(NextPumpAdapter::new(service))
}
