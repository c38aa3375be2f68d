use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::internals::core::{
    device::PumpDevice,
    ports::{Clock, PumpDriver},
};

use super::commands::{handle_line, ConsoleOutcome};

/// Task: Takes operator requests one line at a time and runs them against
/// the pump device. Cancels the token on `quit` or when the input ends.
/// Can be cancelled.
#[tracing::instrument(skip_all)]
pub async fn task_operator_console<D, C, L>(
    token: CancellationToken,
    device: Arc<PumpDevice<D, C>>,
    mut lines: L,
) where
    D: PumpDriver + 'static,
    C: Clock + 'static,
    L: Stream<Item = String> + Unpin,
{
    info!("Started.");

    loop {
        let line = tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            line = lines.next() => line,
        };

        let Some(line) = line else {
            info!("Console input closed. Shutting down.");
            token.cancel();
            break;
        };

        debug!("Console request: '{}'", line);
        let device = device.clone();
        match tokio::task::spawn_blocking(move || handle_line(&device, &line)).await {
            Ok(ConsoleOutcome::Quit) => {
                info!("Quit requested from console.");
                token.cancel();
                break;
            }
            Ok(ConsoleOutcome::Reply(text)) if text.is_empty() => {}
            Ok(ConsoleOutcome::Reply(text)) => println!("{}", text),
            Ok(ConsoleOutcome::Failed(reason)) => {
                warn!("Console request failed: {}", reason);
                println!("error: {}", reason);
            }
            Err(e) => error!("Console request panicked. Error: {}", e),
        }
    }
}
