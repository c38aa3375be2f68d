//! Control system adapter for Edwards nEXT turbomolecular pumps.
//!
//! `internals` holds the domain: a time based polling cache in front of the
//! pump driver, the status word classifier and the device facade exposing
//! attributes and commands. `externals` holds the adapters: the controller
//! link, a simulated pump and the long running tasks.

pub mod config;
pub mod externals;
pub mod internals;
pub mod models;
