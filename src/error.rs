//! Error types for the planner.
//!
//! None of these abort a planning call: oracle and personalization failures
//! are recovered where they happen, and time/config errors only surface while
//! parsing caller input.

use thiserror::Error;

use crate::model::TravelMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("expected HH:MM, got {0:?}")]
    Format(String),
    #[error("time of day out of range: {0:?}")]
    OutOfRange(String),
}

/// Failure of a travel-time lookup for one pair and mode.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no {mode} route found")]
    NoRoute { mode: TravelMode },
    #[error("{mode} travel time unavailable: {reason}")]
    Unavailable { mode: TravelMode, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersonalizationError {
    #[error("invalid trip distance: {0}")]
    InvalidDistance(f64),
    #[error("preference statistics unavailable: {0}")]
    StatsUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid planner config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("max_improvement_passes must be greater than zero")]
    ZeroPasses,
    #[error("fallback speed for {0} must be positive")]
    NonPositiveSpeed(TravelMode),
}
