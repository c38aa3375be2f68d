use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{
    error::DeviceError,
    ports::{DriverError, PumpDriver},
};

/// Exclusive owner of the pump driver. Serializes access to the link and
/// releases it exactly once.
pub struct DriverHandle<D: PumpDriver> {
    driver: Mutex<Option<D>>,
}

impl<D: PumpDriver> DriverHandle<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver: Mutex::new(Some(driver)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<D>> {
        // A panic while holding the link leaves the driver itself usable.
        self.driver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a driver operation. Fails with `Closed` once the handle was released.
    pub fn with<T>(
        &self,
        operation: impl FnOnce(&mut D) -> Result<T, DriverError>,
    ) -> Result<T, DeviceError> {
        match self.lock().as_mut() {
            None => Err(DeviceError::Closed),
            Some(driver) => Ok(operation(driver)?),
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Release the driver. Returns `Ok(true)` when this call closed the link
    /// and `Ok(false)` when it had already been released.
    pub fn close(&self) -> Result<bool, DeviceError> {
        let Some(mut driver) = self.lock().take() else {
            warn!("Driver was already released.");
            return Ok(false);
        };
        driver.close()?;
        debug!("Released driver.");
        Ok(true)
    }
}
