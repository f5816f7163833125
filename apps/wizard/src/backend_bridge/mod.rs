//! Bridge between the controller's command queue and the HTTP backend.

pub mod commands;
pub mod runtime;
