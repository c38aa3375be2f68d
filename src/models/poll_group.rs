use derive_more::Display;
use serde::Serialize;

/// Independently throttled category of sensor readings.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PollGroup {
    /// Rotational frequency and the status word.
    #[display(fmt = "speed_state")]
    SpeedState,

    /// Electrical link voltage, current and power.
    #[display(fmt = "link")]
    Link,

    /// Motor and controller temperatures.
    #[display(fmt = "temperature")]
    Temperature,
}

impl PollGroup {
    pub const ALL: [PollGroup; 3] = [Self::SpeedState, Self::Link, Self::Temperature];
}
