pub mod attributes;
pub mod cache;
pub mod classifier;
pub mod device;
pub mod error;
pub mod handle;
pub mod ports;

#[cfg(test)]
pub(crate) mod fakes;
