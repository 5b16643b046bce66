//! Builders to construct the booking core from configuration.

pub mod coordinator_builder;

pub use coordinator_builder::build_coordinator;
