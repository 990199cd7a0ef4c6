//! Configuration utilities.

/// Layered research configuration and per-run overrides.
pub mod config;
