use std::fmt::Display;

use serde::Serialize;

use crate::models::coarse_state::CoarseState;

/// Attribute exposed to the control system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    /// printf style display format.
    pub format: &'static str,
}

pub const FREQUENCY: AttributeDescriptor = AttributeDescriptor {
    name: "frequency",
    label: "frequency",
    unit: "Hz",
    format: "%2.2f",
};

pub const MOTOR_TEMPERATURE: AttributeDescriptor = AttributeDescriptor {
    name: "motor_temperature",
    label: "motor temp",
    unit: "C",
    format: "%2.2f",
};

pub const CONTROLLER_TEMPERATURE: AttributeDescriptor = AttributeDescriptor {
    name: "controller_temperature",
    label: "controller temp",
    unit: "C",
    format: "%2.2f",
};

pub const CURRENT: AttributeDescriptor = AttributeDescriptor {
    name: "current",
    label: "current",
    unit: "A",
    format: "%2.2f",
};

pub const VOLTAGE: AttributeDescriptor = AttributeDescriptor {
    name: "voltage",
    label: "voltage",
    unit: "V",
    format: "%2.2f",
};

pub const POWER: AttributeDescriptor = AttributeDescriptor {
    name: "power",
    label: "power",
    unit: "W",
    format: "%2.2f",
};

/// Only exposed when a pressure device was reachable at startup.
pub const PRESSURE: AttributeDescriptor = AttributeDescriptor {
    name: "pressure",
    label: "pressure",
    unit: "mbar",
    format: "%7.3e",
};

/// Attributes every pump device exposes.
pub const SENSOR_ATTRIBUTES: [AttributeDescriptor; 6] = [
    FREQUENCY,
    MOTOR_TEMPERATURE,
    CONTROLLER_TEMPERATURE,
    CURRENT,
    VOLTAGE,
    POWER,
];

pub const STATE: &str = "state";
pub const STATUS: &str = "status";

/// Commands the control system may run on the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the pump.
    Enable,
    /// Stop the pump.
    Disable,
}

impl Command {
    pub const ALL: [Command; 2] = [Self::Enable, Self::Disable];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

/// Value returned by an attribute read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    Double(f64),
    State(CoarseState),
    Text(String),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Double(value) => write!(f, "{}", value),
            Self::State(state) => write!(f, "{}", state),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Render a value with the descriptor's display format. Only the two
/// formats used by the pump attributes are understood; anything else falls
/// back to the plain value.
pub fn render(descriptor: &AttributeDescriptor, value: f64) -> String {
    match descriptor.format {
        "%2.2f" => format!("{:.2} {}", value, descriptor.unit),
        "%7.3e" => format!("{:>7} {}", scientific(value, 3), descriptor.unit),
        _ => format!("{} {}", value, descriptor.unit),
    }
}

/// C style scientific notation: signed exponent of at least two digits.
fn scientific(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}
