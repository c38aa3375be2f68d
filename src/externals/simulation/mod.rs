pub mod pressure;
pub mod pump;

pub use pressure::SimulatedPressureConnector;
pub use pump::SimulatedPump;
