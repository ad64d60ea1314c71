//! Port traits: the seams between domain logic and the outside world.

pub mod catalog_port;
pub mod config_port;
pub mod data_port;
