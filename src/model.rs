//! Data model for a single-day planning request and its result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::TimeOfDay;

/// Service time assumed for a stop that does not declare one.
pub const DEFAULT_SERVICE_MINUTES: u32 = 10;

/// Transport mode for one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walk,
    Transit,
    Drive,
}

impl TravelMode {
    /// Default order in which modes are tried for a stop with no fixed mode.
    pub const ALL: [TravelMode; 3] = [TravelMode::Transit, TravelMode::Drive, TravelMode::Walk];

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walk => "walk",
            TravelMode::Transit => "transit",
            TravelMode::Drive => "drive",
        }
    }

    /// Human-readable label used in leg annotations.
    pub fn label(self) -> &'static str {
        match self {
            TravelMode::Walk => "Walking",
            TravelMode::Transit => "Public transit",
            TravelMode::Drive => "Driving",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named place. Only places with both coordinates take part in matrix lookups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl LocationRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn at(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat: Some(lat),
            lon: Some(lon),
            address: None,
        }
    }

    /// Coordinates (lat, lon) when both are present.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<LocationKey> {
        self.coords().map(LocationKey::from_coords)
    }
}

/// Matrix identity of a location, derived from its coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn from_coords(coords: (f64, f64)) -> Self {
        Self(format!("{:.6},{:.6}", coords.0, coords.1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Priority tier: 1 is high, 3 is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub fn tier(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(format!("priority must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.tier()
    }
}

/// A wishlist entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stop {
    #[serde(flatten)]
    pub location: LocationRef,
    /// Fixed mode for reaching this stop; `None` means any mode.
    #[serde(default, rename = "by", skip_serializing_if = "Option::is_none")]
    pub mode: Option<TravelMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrive_window: Option<(TimeOfDay, TimeOfDay)>,
    #[serde(default, rename = "service_min", skip_serializing_if = "Option::is_none")]
    pub service_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Stop {
    pub fn new(location: LocationRef) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.location.name
    }

    pub fn service_duration(&self) -> u32 {
        self.service_minutes.unwrap_or(DEFAULT_SERVICE_MINUTES)
    }
}

/// Trip-level preferences carried on the constraint set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPreferences {
    /// Order in which modes are tried for stops without a fixed mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_priority: Option<Vec<TravelMode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimize_transfers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimize_cost: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_highways: Option<bool>,
}

impl TripPreferences {
    /// Modes to try for a stop, honoring a fixed mode first.
    pub fn modes_for(&self, stop: &Stop) -> Vec<TravelMode> {
        if let Some(mode) = stop.mode {
            return vec![mode];
        }

        let mut modes: Vec<TravelMode> = Vec::with_capacity(TravelMode::ALL.len());
        if let Some(priority) = &self.mode_priority {
            for mode in priority {
                if !modes.contains(mode) {
                    modes.push(*mode);
                }
            }
        }
        for mode in TravelMode::ALL {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        modes
    }
}

/// The caller's constraint set for one day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LocationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_end_by: Option<TimeOfDay>,
    /// Wishlist order, not visiting order.
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub preferences: TripPreferences,
    /// Scorer penalties for this request.
    #[serde(default)]
    pub weights: PreferenceWeights,
}

/// Tunable scalar penalties supplied per planning request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceWeights {
    /// Added to the cost of every transit option.
    pub transfer_penalty: f64,
    /// Driving adds `cost_weight * 5`.
    pub cost_weight: f64,
    /// Multiplier on raw minutes in the plan-level scorer.
    pub time_weight: f64,
    /// Walking legs longer than this are penalized.
    pub walk_tolerance_min: f64,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            transfer_penalty: 5.0,
            cost_weight: 1.0,
            time_weight: 1.0,
            walk_tolerance_min: 15.0,
        }
    }
}

/// One travel segment of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub from: LocationRef,
    pub to: LocationRef,
    pub mode: TravelMode,
    pub depart_time: TimeOfDay,
    pub arrive_time: TimeOfDay,
    pub minutes: u32,
    #[serde(default, rename = "notes", skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub legs: Vec<Leg>,
    pub total_minutes: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feasibility_notes: Vec<String>,
}

impl Plan {
    /// Builds a plan whose total is the sum of leg durations.
    pub fn from_legs(legs: Vec<Leg>, feasibility_notes: Vec<String>) -> Self {
        let total_minutes = total_minutes(&legs);
        Self {
            legs,
            total_minutes,
            feasibility_notes,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.feasibility_notes.is_empty()
    }
}

/// Sum of leg travel minutes. Service time is never included.
pub fn total_minutes(legs: &[Leg]) -> u32 {
    legs.iter().map(|leg| leg.minutes).sum()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alternatives {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faster: Option<Plan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheaper: Option<Plan>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanWithAlternatives {
    pub plan: Plan,
    pub alternatives: Alternatives,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feasibility_notes: Vec<String>,
}
