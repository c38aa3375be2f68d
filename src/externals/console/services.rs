use std::{
    io::{self, BufRead},
    thread,
};

use tokio::sync::mpsc;
use tracing::{debug, error};

/// Lines buffered between the reader thread and the console task.
const LINE_BUFFER: usize = 16;

/// Read `input` line by line on a dedicated OS thread and forward each line
/// over a channel. The channel closes when the input ends, fails or the
/// receiver is dropped.
///
/// The read blocks in the kernel and cannot be cancelled, so it must not run
/// on a runtime thread the runtime waits for on shutdown.
pub fn spawn_line_reader<R>(input: R) -> io::Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Failed to read console input. Error: {}", e);
                        return;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    debug!("Console closed. Reader thread exiting.");
                    return;
                }
            }
            debug!("Console input reached end of file.");
        })?;
    Ok(rx)
}
