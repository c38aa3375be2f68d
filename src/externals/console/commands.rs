use thiserror::Error;

use crate::internals::core::{
    attributes::{render, AttributeValue},
    device::PumpDevice,
    error::DeviceError,
    ports::{Clock, PumpDriver},
};

/// One line typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleRequest {
    Empty,
    Help,
    /// Run a device command such as `enable` or `disable`.
    Execute(String),
    Read(String),
    Attributes,
    Snapshot,
    Quit,
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("'read' needs an attribute name.")]
    MissingAttribute,

    #[error("Unknown request '{0}'. Type 'help' for a list.")]
    UnknownRequest(String),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

pub const HELP: &str =
    "enable | disable | state | status | read <attribute> | attributes | snapshot | quit";

pub fn parse_console_line(line: &str) -> Result<ConsoleRequest, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(ConsoleRequest::Empty);
    };
    Ok(match first {
        "help" | "?" => ConsoleRequest::Help,
        "enable" | "disable" => ConsoleRequest::Execute(first.to_string()),
        "state" | "status" => ConsoleRequest::Read(first.to_string()),
        "read" => ConsoleRequest::Read(
            words
                .next()
                .ok_or(ConsoleError::MissingAttribute)?
                .to_string(),
        ),
        "attributes" => ConsoleRequest::Attributes,
        "snapshot" => ConsoleRequest::Snapshot,
        "quit" | "exit" => ConsoleRequest::Quit,
        other => return Err(ConsoleError::UnknownRequest(other.to_string())),
    })
}

/// What the console should do after handling a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Reply(String),
    Failed(String),
    Quit,
}

/// Parse and handle one line against the device. Blocks on the driver.
pub fn handle_line<D: PumpDriver, C: Clock>(
    device: &PumpDevice<D, C>,
    line: &str,
) -> ConsoleOutcome {
    let result = parse_console_line(line).and_then(|request| match request {
        ConsoleRequest::Quit => Ok(None),
        other => respond(device, other).map(Some),
    });
    match result {
        Ok(None) => ConsoleOutcome::Quit,
        Ok(Some(text)) => ConsoleOutcome::Reply(text),
        Err(e) => ConsoleOutcome::Failed(e.to_string()),
    }
}

fn respond<D: PumpDriver, C: Clock>(
    device: &PumpDevice<D, C>,
    request: ConsoleRequest,
) -> Result<String, ConsoleError> {
    Ok(match request {
        ConsoleRequest::Empty | ConsoleRequest::Quit => String::new(),
        ConsoleRequest::Help => HELP.to_string(),
        ConsoleRequest::Execute(command) => {
            device.execute(&command)?;
            format!("{} done.", command)
        }
        ConsoleRequest::Read(name) => {
            let value = device.read_attribute(&name)?;
            let descriptor = device.attributes().into_iter().find(|d| d.name == name);
            match (value, descriptor) {
                (AttributeValue::Double(value), Some(descriptor)) => render(&descriptor, value),
                (value, _) => value.to_string(),
            }
        }
        ConsoleRequest::Attributes => device
            .attributes()
            .iter()
            .map(|d| format!("{} ({}, {})", d.name, d.label, d.unit))
            .collect::<Vec<_>>()
            .join("\n"),
        ConsoleRequest::Snapshot => serde_json::to_string_pretty(&device.snapshot()?)?,
    })
}
