//! Core domain types and logic.

pub mod bar;
pub mod structure;
pub mod classifier;
pub mod order_block;
pub mod analysis;
pub mod sample_data;
pub mod config_validation;
pub mod error;
