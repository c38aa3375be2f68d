use derive_more::Display;
use serde::Serialize;

/// Coarse operational state derived from the controller status word.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CoarseState {
    #[default]
    #[display(fmt = "UNKNOWN")]
    Unknown,

    #[display(fmt = "INIT")]
    Init,

    /// Pump is accelerating or decelerating.
    #[display(fmt = "MOVING")]
    Moving,

    /// Pump is above normal speed.
    #[display(fmt = "RUNNING")]
    Running,

    #[display(fmt = "ON")]
    On,

    #[display(fmt = "ALARM")]
    Alarm,

    #[display(fmt = "FAULT")]
    Fault,
}
