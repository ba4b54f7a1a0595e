//! Test fixtures for itinerary-planner.
//!
//! Provides realistic test data including:
//! - Real downtown Toronto locations
//! - Builders for stops and constraint sets

pub mod toronto_locations;

pub use toronto_locations::*;
