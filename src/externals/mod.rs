pub mod console;
pub mod monitor;
pub mod pump;
pub mod simulation;
