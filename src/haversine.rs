//! Straight-line travel estimates (fallback when the routing oracle fails).
//!
//! Uses great-circle distance and an assumed average speed per mode.
//! Less accurate than a routing engine (ignores the network) but always available.

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::model::TravelMode;
use crate::traits::TravelTimeOracle;

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two (lat, lon) points in meters.
pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Assumed average speeds in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackSpeeds {
    pub walk_kmh: f64,
    pub transit_kmh: f64,
    pub drive_kmh: f64,
}

impl Default for FallbackSpeeds {
    fn default() -> Self {
        Self {
            walk_kmh: 5.0,
            transit_kmh: 20.0,
            drive_kmh: 30.0,
        }
    }
}

impl FallbackSpeeds {
    pub fn for_mode(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walk => self.walk_kmh,
            TravelMode::Transit => self.transit_kmh,
            TravelMode::Drive => self.drive_kmh,
        }
    }
}

/// Haversine-based travel-time estimator.
#[derive(Debug, Clone, Default)]
pub struct HaversineEstimator {
    pub speeds: FallbackSpeeds,
}

impl HaversineEstimator {
    pub fn new(speeds: FallbackSpeeds) -> Self {
        Self { speeds }
    }

    /// Convert a distance in meters to whole travel minutes.
    pub fn estimate_minutes(&self, meters: f64, mode: TravelMode) -> u32 {
        let hours = (meters / 1000.0) / self.speeds.for_mode(mode);
        (hours * 60.0).round() as u32
    }
}

impl TravelTimeOracle for HaversineEstimator {
    fn travel_minutes(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        mode: TravelMode,
    ) -> Result<u32, OracleError> {
        Ok(self.estimate_minutes(haversine_m(from, to), mode))
    }
}
