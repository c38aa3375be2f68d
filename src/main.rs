use std::{
    io::{self, BufReader},
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use edwards_next_control::{
    config::DeviceProperties,
    externals::{
        console::{services::spawn_line_reader, task::task_operator_console},
        monitor::task::task_monitor_pump,
        pump::open_next_pump,
        simulation::{SimulatedPressureConnector, SimulatedPump},
    },
    internals::core::{device::PumpDevice, ports::PumpDriver},
};
use tokio::signal;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let properties = DeviceProperties::parse();

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_max_level(properties.log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let driver: Box<dyn PumpDriver> = if properties.simulate {
        info!("Using simulated pump.");
        Box::new(SimulatedPump::new())
    } else {
        let connection = properties.connection();
        Box::new(tokio::task::spawn_blocking(move || open_next_pump(&connection)).await??)
    };

    let device = Arc::new(PumpDevice::init(
        driver,
        properties.device_settings(),
        &SimulatedPressureConnector,
    ));

    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    let token_clone = token.clone();
    let device_clone = device.clone();
    let interval = properties.monitor_interval();
    tracker.spawn(async move { task_monitor_pump(token_clone, device_clone, interval).await });

    if properties.no_console {
        info!("Console disabled.");
    } else {
        let lines = ReceiverStream::new(spawn_line_reader(BufReader::new(io::stdin()))?);
        let token_clone = token.clone();
        let device_clone = device.clone();
        tracker.spawn(async move { task_operator_console(token_clone, device_clone, lines).await });
    }

    let token_clone = token.clone();

    tokio::select! {
        _ = token_clone.cancelled() => {}
        res = signal::ctrl_c() => {
            match res {
                Ok(_) => {
                    info!("Received shutdown signal.");
                    token.cancel();
                },
                Err(e) => {
                    error!("Failed to listen for ctrl_c. Error: {}", e);
                    token.cancel();
                }
            };
        },
    }

    tracker.close();
    tracker.wait().await;

    tokio::task::spawn_blocking(move || device.shutdown()).await??;
    info!("Stopped.");

    Ok(())
}
