use tracing::{debug, error, info, instrument};

use crate::models::{coarse_state::CoarseState, readings::SensorSnapshot, status_bits::StatusBits};

use super::{
    attributes::{self, AttributeDescriptor, AttributeValue, Command},
    cache::{PollingCache, Thresholds},
    classifier::{classify, status_text, StatusTable},
    error::DeviceError,
    handle::DriverHandle,
    ports::{Clock, PressureConnector, PressureSource, PumpDriver, SystemClock},
};

/// Everything the pump device needs besides its driver.
#[derive(Debug, Clone, Default)]
pub struct DeviceSettings {
    pub thresholds: Thresholds,
    /// Reference of the downstream device reporting chamber pressure.
    pub pressure_device: Option<String>,
    pub status_table: StatusTable,
}

/// Control system facing view of one turbomolecular pump.
///
/// Reads go through the polling cache, so the controller is queried at most
/// once per threshold per poll group no matter how often attributes are
/// read. The driver is owned exclusively and released once by
/// [`PumpDevice::shutdown`] (or on drop).
pub struct PumpDevice<D: PumpDriver, C: Clock = SystemClock> {
    driver: DriverHandle<D>,
    cache: PollingCache<C>,
    status_table: StatusTable,
    pressure: Option<Box<dyn PressureSource>>,
}

impl<D: PumpDriver> PumpDevice<D, SystemClock> {
    pub fn init(driver: D, settings: DeviceSettings, connector: &dyn PressureConnector) -> Self {
        Self::init_with_clock(driver, SystemClock, settings, connector)
    }
}

impl<D: PumpDriver, C: Clock> PumpDevice<D, C> {
    /// Build the device. Never fails: an unreachable pressure device only
    /// disables the pressure attribute.
    #[instrument(skip_all)]
    pub fn init_with_clock(
        driver: D,
        clock: C,
        settings: DeviceSettings,
        connector: &dyn PressureConnector,
    ) -> Self {
        let pressure = settings
            .pressure_device
            .as_deref()
            .and_then(|reference| resolve_pressure(connector, reference));

        info!(
            "Pump device initialized. Pressure attribute {}.",
            if pressure.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );

        Self {
            driver: DriverHandle::new(driver),
            cache: PollingCache::with_clock(settings.thresholds, clock),
            status_table: settings.status_table,
            pressure,
        }
    }

    pub fn frequency(&self) -> Result<f64, DeviceError> {
        Ok(self.cache.speed_state(&self.driver)?.frequency_hz)
    }

    pub fn status_bits(&self) -> Result<StatusBits, DeviceError> {
        Ok(self.cache.speed_state(&self.driver)?.status)
    }

    pub fn voltage(&self) -> Result<f64, DeviceError> {
        Ok(self.cache.link(&self.driver)?.voltage_v)
    }

    pub fn current(&self) -> Result<f64, DeviceError> {
        Ok(self.cache.link(&self.driver)?.current_a)
    }

    pub fn power(&self) -> Result<f64, DeviceError> {
        Ok(self.cache.link(&self.driver)?.power_w)
    }

    pub fn motor_temperature(&self) -> Result<f64, DeviceError> {
        Ok(self.cache.temperatures(&self.driver)?.motor_c)
    }

    pub fn controller_temperature(&self) -> Result<f64, DeviceError> {
        Ok(self.cache.temperatures(&self.driver)?.controller_c)
    }

    /// Coarse state of the pump, derived from the status word.
    pub fn state(&self) -> Result<CoarseState, DeviceError> {
        Ok(classify(self.status_bits()?))
    }

    /// One line per active status condition.
    pub fn status(&self) -> Result<String, DeviceError> {
        let bits = self.status_bits()?;
        Ok(status_text(&self.status_table, bits)?)
    }

    pub fn snapshot(&self) -> Result<SensorSnapshot, DeviceError> {
        Ok(SensorSnapshot::assemble(
            self.cache.speed_state(&self.driver)?,
            self.cache.link(&self.driver)?,
            self.cache.temperatures(&self.driver)?,
        ))
    }

    pub fn has_pressure(&self) -> bool {
        self.pressure.is_some()
    }

    /// Pressure of the evacuated volume in mbar, read through to the
    /// downstream device.
    pub fn pressure(&self) -> Result<f64, DeviceError> {
        match &self.pressure {
            None => Err(DeviceError::PressureUnavailable),
            Some(source) => Ok(source.pressure()?),
        }
    }

    #[instrument(skip_all)]
    pub fn enable(&self) -> Result<(), DeviceError> {
        self.driver.with(|driver| driver.start())?;
        self.cache.invalidate();
        info!("Pump start requested.");
        Ok(())
    }

    #[instrument(skip_all)]
    pub fn disable(&self) -> Result<(), DeviceError> {
        self.driver.with(|driver| driver.stop())?;
        self.cache.invalidate();
        info!("Pump stop requested.");
        Ok(())
    }

    /// Attributes currently exposed, pressure included only when attached.
    pub fn attributes(&self) -> Vec<AttributeDescriptor> {
        let mut exposed = attributes::SENSOR_ATTRIBUTES.to_vec();
        if self.has_pressure() {
            exposed.push(attributes::PRESSURE);
        }
        exposed
    }

    pub fn read_attribute(&self, name: &str) -> Result<AttributeValue, DeviceError> {
        let value = match name {
            attributes::STATE => return Ok(AttributeValue::State(self.state()?)),
            attributes::STATUS => return Ok(AttributeValue::Text(self.status()?)),
            n if n == attributes::FREQUENCY.name => self.frequency()?,
            n if n == attributes::MOTOR_TEMPERATURE.name => self.motor_temperature()?,
            n if n == attributes::CONTROLLER_TEMPERATURE.name => self.controller_temperature()?,
            n if n == attributes::CURRENT.name => self.current()?,
            n if n == attributes::VOLTAGE.name => self.voltage()?,
            n if n == attributes::POWER.name => self.power()?,
            n if n == attributes::PRESSURE.name && self.has_pressure() => self.pressure()?,
            other => return Err(DeviceError::UnknownAttribute(other.to_string())),
        };
        Ok(AttributeValue::Double(value))
    }

    pub fn execute(&self, name: &str) -> Result<(), DeviceError> {
        match Command::from_name(name) {
            Some(Command::Enable) => self.enable(),
            Some(Command::Disable) => self.disable(),
            None => Err(DeviceError::UnknownCommand(name.to_string())),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_open()
    }

    /// Release the controller connection. Later calls do nothing.
    #[instrument(skip_all)]
    pub fn shutdown(&self) -> Result<(), DeviceError> {
        if self.driver.close()? {
            info!("Connection to pump controller closed.");
        }
        Ok(())
    }
}

impl<D: PumpDriver, C: Clock> Drop for PumpDevice<D, C> {
    fn drop(&mut self) {
        if !self.driver.is_open() {
            return;
        }
        debug!("Pump device dropped without shutdown. Closing connection.");
        if let Err(e) = self.driver.close() {
            error!("Failed to close pump controller connection. Error: {}", e);
        }
    }
}

/// Connect to the optional pressure device. Unreachable is not fatal.
fn resolve_pressure(
    connector: &dyn PressureConnector,
    reference: &str,
) -> Option<Box<dyn PressureSource>> {
    match connector.connect(reference) {
        Ok(source) => {
            info!("Connected to pressure device '{}'.", reference);
            Some(source)
        }
        Err(e) => {
            info!(
                "Could not connect to pressure device '{}'. Error: {}",
                reference, e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::internals::core::fakes::{FakeConnector, FakeDriver, ManualClock};

    const GAUGE: &str = "vacuum/gauge/1";

    fn settings(pressure_device: Option<&str>) -> DeviceSettings {
        DeviceSettings {
            pressure_device: pressure_device.map(str::to_string),
            ..DeviceSettings::default()
        }
    }

    fn device_with(
        driver: FakeDriver,
        pressure_device: Option<&str>,
    ) -> (PumpDevice<FakeDriver, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let device = PumpDevice::init_with_clock(
            driver,
            clock.clone(),
            settings(pressure_device),
            &FakeConnector { reachable: GAUGE },
        );
        (device, clock)
    }

    fn names(device: &PumpDevice<FakeDriver, ManualClock>) -> Vec<&'static str> {
        device.attributes().into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_unreachable_pressure_device_is_omitted() {
        let (device, _) = device_with(FakeDriver::new(), Some("vacuum/gauge/missing"));

        assert!(!device.has_pressure());
        assert_eq!(names(&device).len(), 6);
        assert!(!names(&device).contains(&"pressure"));
        assert!(matches!(
            device.read_attribute("pressure"),
            Err(DeviceError::UnknownAttribute(_))
        ));
        assert!(matches!(device.pressure(), Err(DeviceError::PressureUnavailable)));
    }

    #[test]
    fn test_reachable_pressure_device_is_exposed() {
        let (device, _) = device_with(FakeDriver::new(), Some(GAUGE));

        assert!(device.has_pressure());
        assert!(names(&device).contains(&"pressure"));
        assert_eq!(
            device.read_attribute("pressure").expect("Failed to read pressure."),
            AttributeValue::Double(1.5e-6)
        );
    }

    #[test]
    fn test_no_pressure_reference() {
        let (device, _) = device_with(FakeDriver::new(), None);
        assert!(!device.has_pressure());
    }

    #[test]
    fn test_state_and_status() {
        let driver = FakeDriver::with_status(StatusBits::from_bits(&[2, 4]));
        let (device, _) = device_with(driver, None);

        assert_eq!(
            device.state().expect("Failed to read state."),
            CoarseState::Running
        );
        assert_eq!(
            device.status().expect("Failed to read status."),
            "Above normal speed\nStart command active"
        );
        assert_eq!(
            device.read_attribute("state").expect("Failed to read state."),
            AttributeValue::State(CoarseState::Running)
        );
    }

    #[test]
    fn test_status_with_unmapped_bit_is_error() {
        let (device, _) = device_with(FakeDriver::with_status(StatusBits::from_bits(&[5])), None);

        assert_eq!(
            device.state().expect("Failed to read state."),
            CoarseState::Moving
        );
        assert!(matches!(device.status(), Err(DeviceError::Status(_))));
    }

    #[test]
    fn test_failed_fetch_propagates_from_state() {
        let driver = FakeDriver::with_status(StatusBits::from_bits(&[11]));
        let state = driver.state();
        state.lock().unwrap().failing = true;
        let (device, _) = device_with(driver, None);

        assert!(matches!(device.state(), Err(DeviceError::Driver(_))));
        assert!(matches!(device.read_attribute("state"), Err(DeviceError::Driver(_))));
        state.lock().unwrap().failing = false;
        assert_eq!(
            device.state().expect("Failed to read state."),
            CoarseState::On
        );
        assert!(matches!(device.status(), Err(DeviceError::Driver(_))));
        assert!(matches!(device.frequency(), Err(DeviceError::Driver(_))));
    }

    #[test]
    fn test_reads_share_the_cache() {
        let driver = FakeDriver::new();
        let state = driver.state();
        let (device, clock) = device_with(driver, None);

        device.voltage().expect("Failed to read voltage.");
        device.current().expect("Failed to read current.");
        device.power().expect("Failed to read power.");
        device.state().expect("Failed to read state.");
        device.frequency().expect("Failed to read frequency.");
        assert_eq!(state.lock().unwrap().calls.link, 1);
        assert_eq!(state.lock().unwrap().calls.speed_state, 1);

        clock.advance(Duration::from_millis(300));
        device.snapshot().expect("Failed to read snapshot.");
        let calls = state.lock().unwrap().calls;
        assert_eq!(calls.link, 2);
        assert_eq!(calls.speed_state, 2);
        assert_eq!(calls.temperatures, 1);
    }

    #[test]
    fn test_commands_reach_the_driver_and_invalidate() {
        let driver = FakeDriver::new();
        let state = driver.state();
        let (device, _) = device_with(driver, None);

        device.frequency().expect("Failed to read frequency.");
        device.execute("enable").expect("Failed to enable.");
        device.frequency().expect("Failed to read frequency.");
        device.execute("disable").expect("Failed to disable.");

        let calls = state.lock().unwrap().calls;
        assert_eq!(calls.start, 1);
        assert_eq!(calls.stop, 1);
        assert_eq!(calls.speed_state, 2);
        assert!(matches!(
            device.execute("explode"),
            Err(DeviceError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_read_every_exposed_attribute() {
        let (device, _) = device_with(FakeDriver::new(), Some(GAUGE));

        for descriptor in device.attributes() {
            let value = device
                .read_attribute(descriptor.name)
                .expect("Failed to read attribute.");
            assert!(matches!(value, AttributeValue::Double(_)));
        }
        assert!(matches!(
            device.read_attribute("speed"),
            Err(DeviceError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_shutdown_releases_once() {
        let driver = FakeDriver::new();
        let state = driver.state();
        let (device, _) = device_with(driver, None);

        device.shutdown().expect("Failed to shut down.");
        device.shutdown().expect("Failed to shut down twice.");
        assert!(!device.is_connected());
        assert!(matches!(device.frequency(), Err(DeviceError::Closed)));
        assert!(matches!(device.enable(), Err(DeviceError::Closed)));

        drop(device);
        assert_eq!(state.lock().unwrap().calls.close, 1);
    }

    #[test]
    fn test_drop_releases_connection() {
        let driver = FakeDriver::new();
        let state = driver.state();
        let (device, _) = device_with(driver, None);

        drop(device);
        assert_eq!(state.lock().unwrap().calls.close, 1);
    }
}
