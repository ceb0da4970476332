//! Core business logic for amoria-rs.

pub mod services;

pub use services::*;
