//! API request handlers.

/// Liveness handler.
pub mod health;
/// Research run handler.
pub mod research;
