//! Port traits the domain talks through.

pub mod annotation_port;
pub mod config_port;
pub mod data_port;
