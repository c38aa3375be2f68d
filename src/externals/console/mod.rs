pub mod commands;
pub mod services;
pub mod task;
