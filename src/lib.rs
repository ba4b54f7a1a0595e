//! itinerary-planner core
//!
//! Single-day itinerary optimization: scored greedy construction, bounded
//! segment-reversal improvement and mode personalization.

pub mod config;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod osrm;
pub mod personalization;
pub mod planner;
pub mod scoring;
pub mod solver;
pub mod time;
pub mod traits;

pub use config::{PlannerConfig, TieBreak};
pub use model::{Constraints, Leg, LocationRef, Plan, PlanWithAlternatives, PreferenceWeights, Stop, TravelMode};
pub use planner::{plan_itinerary, plan_with_oracle};
pub use time::TimeOfDay;
