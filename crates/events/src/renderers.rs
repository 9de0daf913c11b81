//! Event renderers.

pub mod actions;

pub use actions::ActionsRenderer;
