//! Freight train simulation engine.
//!
//! Places scheduled freight services on the map for any simulated instant
//! of the week, along real rail geometry where it can be resolved and along
//! synthesized arcs otherwise.

pub mod config;
pub mod geometry;
pub mod rail;
pub mod simulation;

pub use config::{ClockConfig, ResolverConfig};

// Re-export the data model from the transit crate
pub use fretmap_transit as transit;
