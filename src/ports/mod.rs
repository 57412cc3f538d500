//! Port traits: the boundaries between the domain and the outside world.

pub mod config_port;
pub mod export_port;
pub mod history_port;
pub mod indicator_port;
