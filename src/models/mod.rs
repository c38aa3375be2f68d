pub mod coarse_state;
pub mod poll_group;
pub mod readings;
pub mod status_bits;
