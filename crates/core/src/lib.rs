//! Core business logic for memoriaviva.

pub mod services;

pub use services::*;
