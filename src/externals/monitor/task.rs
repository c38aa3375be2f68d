use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    internals::core::{
        attributes::{render, PRESSURE},
        device::PumpDevice,
        error::DeviceError,
        ports::{Clock, PumpDriver},
    },
    models::{coarse_state::CoarseState, readings::SensorSnapshot},
};

/// Everything read from the device in one monitor cycle.
#[derive(Debug)]
pub struct MonitorReport {
    pub snapshot: Result<SensorSnapshot, DeviceError>,
    pub state: Result<CoarseState, DeviceError>,
    pub status: Result<String, DeviceError>,
    pub pressure: Option<Result<f64, DeviceError>>,
}

/// Read every exposed quantity once. Blocks on the driver.
pub fn read_report<D: PumpDriver, C: Clock>(device: &PumpDevice<D, C>) -> MonitorReport {
    MonitorReport {
        snapshot: device.snapshot(),
        state: device.state(),
        status: device.status(),
        pressure: device.has_pressure().then(|| device.pressure()),
    }
}

/// Task: Runs periodically to read the pump and log what it reports.
/// Read failures are logged and the next cycle tries again.
/// Can be cancelled.
#[tracing::instrument(skip_all)]
pub async fn task_monitor_pump<D, C>(
    token: CancellationToken,
    device: Arc<PumpDevice<D, C>>,
    interval: Duration,
) where
    D: PumpDriver + 'static,
    C: Clock + 'static,
{
    info!("Started.");
    loop {
        business_logic(&device).await;

        tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            _ = tokio::time::sleep(interval) => {}
        };
    }
}

/// Perform task business logic.
/// Read a report off the async runtime and log it.
#[tracing::instrument(skip_all)]
async fn business_logic<D, C>(device: &Arc<PumpDevice<D, C>>)
where
    D: PumpDriver + 'static,
    C: Clock + 'static,
{
    trace!("Executing business logic.");
    let device = device.clone();
    let report = match tokio::task::spawn_blocking(move || read_report(&device)).await {
        Ok(report) => report,
        Err(e) => {
            error!("Monitor read panicked. Error: {}", e);
            return;
        }
    };
    log_report(&report);
}

fn log_report(report: &MonitorReport) {
    match &report.snapshot {
        Ok(snapshot) => info!("{}", snapshot),
        Err(e) => error!("Failed to read pump snapshot. Error: {}", e),
    }
    match &report.state {
        Ok(state) => info!("Pump state: {}", state),
        Err(e) => error!("Failed to read pump state. Error: {}", e),
    }
    match &report.status {
        Ok(status) if status.is_empty() => debug!("No status flags active."),
        Ok(status) => debug!("Status flags:\n{}", status),
        Err(e) => error!("Failed to read pump status. Error: {}", e),
    }
    match &report.pressure {
        None => {}
        Some(Ok(pressure)) => info!("Chamber pressure: {}", render(&PRESSURE, *pressure)),
        Some(Err(e)) => error!("Failed to read chamber pressure. Error: {}", e),
    }
}
