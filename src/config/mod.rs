//! Configuration models for the booking core.

pub mod studio;

pub use studio::{CoordinatorConfig, StudioConfig};
