//! Rendering side of the wizard: view model, terminal surface, and the event loop tying them together.

pub mod app;
pub mod terminal;
pub mod view;
