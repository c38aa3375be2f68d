use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::trace;

use crate::models::{
    poll_group::PollGroup,
    readings::{GroupReading, LinkReading, SpeedState, TemperatureReading},
};

use super::{
    error::DeviceError,
    handle::DriverHandle,
    ports::{Clock, PumpDriver, SystemClock},
};

/// Maximum age of each poll group before the next read goes to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub speed_state: Duration,
    pub link: Duration,
    pub temperature: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            speed_state: Duration::from_millis(200),
            link: Duration::from_millis(300),
            temperature: Duration::from_millis(300),
        }
    }
}

impl Thresholds {
    pub fn for_group(&self, group: PollGroup) -> Duration {
        match group {
            PollGroup::SpeedState => self.speed_state,
            PollGroup::Link => self.link,
            PollGroup::Temperature => self.temperature,
        }
    }
}

/// Last value of one poll group and when it was fetched.
#[derive(Debug)]
struct CacheEntry<T> {
    value: Option<T>,
    polled_at: Option<Instant>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            value: None,
            polled_at: None,
        }
    }
}

impl<T: Copy> CacheEntry<T> {
    /// Return the cached value while it is younger than `threshold`,
    /// otherwise fetch, store and stamp a new one. A failed fetch leaves the
    /// entry untouched.
    fn get_or_refresh<E>(
        &mut self,
        now: Instant,
        threshold: Duration,
        fetch: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if let (Some(value), Some(polled_at)) = (self.value, self.polled_at) {
            if now.saturating_duration_since(polled_at) < threshold {
                return Ok(value);
            }
        }
        let value = fetch()?;
        self.value = Some(value);
        self.polled_at = Some(now);
        Ok(value)
    }

    fn clear(&mut self) {
        self.value = None;
        self.polled_at = None;
    }
}

fn lock<T>(entry: &Mutex<T>) -> MutexGuard<'_, T> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Time based cache in front of the pump driver. Each poll group has its
/// own entry and lock, so a group is never observed half updated.
pub struct PollingCache<C: Clock = SystemClock> {
    clock: C,
    thresholds: Thresholds,
    speed_state: Mutex<CacheEntry<SpeedState>>,
    link: Mutex<CacheEntry<LinkReading>>,
    temperature: Mutex<CacheEntry<TemperatureReading>>,
}

impl PollingCache<SystemClock> {
    pub fn new(thresholds: Thresholds) -> Self {
        Self::with_clock(thresholds, SystemClock)
    }
}

impl<C: Clock> PollingCache<C> {
    pub fn with_clock(thresholds: Thresholds, clock: C) -> Self {
        Self {
            clock,
            thresholds,
            speed_state: Mutex::default(),
            link: Mutex::default(),
            temperature: Mutex::default(),
        }
    }

    /// Read one poll group, refreshing it from the driver when stale.
    pub fn get<D: PumpDriver>(
        &self,
        group: PollGroup,
        driver: &DriverHandle<D>,
    ) -> Result<GroupReading, DeviceError> {
        Ok(match group {
            PollGroup::SpeedState => GroupReading::SpeedState(self.speed_state(driver)?),
            PollGroup::Link => GroupReading::Link(self.link(driver)?),
            PollGroup::Temperature => GroupReading::Temperature(self.temperatures(driver)?),
        })
    }

    pub fn speed_state<D: PumpDriver>(
        &self,
        driver: &DriverHandle<D>,
    ) -> Result<SpeedState, DeviceError> {
        let now = self.clock.now();
        let threshold = self.thresholds.for_group(PollGroup::SpeedState);
        lock(&self.speed_state).get_or_refresh(now, threshold, || {
            trace!("Refreshing speed/state group.");
            driver.with(|d| d.speed_state())
        })
    }

    pub fn link<D: PumpDriver>(
        &self,
        driver: &DriverHandle<D>,
    ) -> Result<LinkReading, DeviceError> {
        let now = self.clock.now();
        let threshold = self.thresholds.for_group(PollGroup::Link);
        lock(&self.link).get_or_refresh(now, threshold, || {
            trace!("Refreshing link group.");
            driver.with(|d| d.link())
        })
    }

    pub fn temperatures<D: PumpDriver>(
        &self,
        driver: &DriverHandle<D>,
    ) -> Result<TemperatureReading, DeviceError> {
        let now = self.clock.now();
        let threshold = self.thresholds.for_group(PollGroup::Temperature);
        lock(&self.temperature).get_or_refresh(now, threshold, || {
            trace!("Refreshing temperature group.");
            driver.with(|d| d.temperatures())
        })
    }

    /// When the group was last refreshed, if ever.
    pub fn last_polled(&self, group: PollGroup) -> Option<Instant> {
        match group {
            PollGroup::SpeedState => lock(&self.speed_state).polled_at,
            PollGroup::Link => lock(&self.link).polled_at,
            PollGroup::Temperature => lock(&self.temperature).polled_at,
        }
    }

    /// Forget every cached value so the next read of each group hits the driver.
    pub fn invalidate(&self) {
        lock(&self.speed_state).clear();
        lock(&self.link).clear();
        lock(&self.temperature).clear();
    }
}
