//! Mode-choice personalization.
//!
//! Historical mode selections are bucketed by trip distance and turned into
//! multiplicative weights. Where the history is stored is up to the caller;
//! this module only consumes counts.

use serde::{Deserialize, Serialize};

use crate::error::PersonalizationError;
use crate::haversine::haversine_m;
use crate::model::{Plan, TravelMode};
use crate::traits::{ModeWeightSource, ModeWeights};

/// Trips shorter than this get the short-walk bias when it is enabled.
pub const DEFAULT_SHORT_WALK_THRESHOLD_M: f64 = 2000.0;

const WEIGHT_FLOOR: f64 = 0.75;
const WEIGHT_CEIL: f64 = 1.25;
const SHORT_WALK_WALK_CEIL: f64 = 1.3;
const SHORT_WALK_OTHER_FLOOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    PlanChosen,
    ModeOverridden,
    StopReordered,
}

/// One recorded user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Epoch milliseconds.
    pub ts: i64,
    pub event: TelemetryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_mode: Option<TravelMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceBucket {
    #[serde(rename = "lt1")]
    UnderOneKm,
    #[serde(rename = "lt2")]
    UnderTwoKm,
    #[serde(rename = "lt5")]
    UnderFiveKm,
    #[serde(rename = "gte5")]
    FiveKmOrMore,
}

impl DistanceBucket {
    pub fn for_distance(distance_m: f64) -> Self {
        let km = distance_m / 1000.0;
        if km < 1.0 {
            DistanceBucket::UnderOneKm
        } else if km < 2.0 {
            DistanceBucket::UnderTwoKm
        } else if km < 5.0 {
            DistanceBucket::UnderFiveKm
        } else {
            DistanceBucket::FiveKmOrMore
        }
    }

    fn index(self) -> usize {
        match self {
            DistanceBucket::UnderOneKm => 0,
            DistanceBucket::UnderTwoKm => 1,
            DistanceBucket::UnderFiveKm => 2,
            DistanceBucket::FiveKmOrMore => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeCounts {
    pub walk: u32,
    pub transit: u32,
    pub drive: u32,
}

impl ModeCounts {
    pub fn new(walk: u32, transit: u32, drive: u32) -> Self {
        Self { walk, transit, drive }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.walk) + u64::from(self.transit) + u64::from(self.drive)
    }

    pub fn get(&self, mode: TravelMode) -> u32 {
        match mode {
            TravelMode::Walk => self.walk,
            TravelMode::Transit => self.transit,
            TravelMode::Drive => self.drive,
        }
    }

    fn increment(&mut self, mode: TravelMode) {
        let slot = match mode {
            TravelMode::Walk => &mut self.walk,
            TravelMode::Transit => &mut self.transit,
            TravelMode::Drive => &mut self.drive,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Aggregated mode selections, overall and per distance bucket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrefStats {
    pub totals: ModeCounts,
    /// Indexed lt1, lt2, lt5, gte5.
    pub by_distance: [ModeCounts; 4],
    pub last_updated: i64,
}

impl PrefStats {
    pub fn from_events(events: &[TelemetryEvent]) -> Self {
        let mut stats = Self::default();
        for event in events {
            stats.record(event);
        }
        stats
    }

    /// Count one event. Events without a chosen mode are ignored; events
    /// without a distance only count towards the totals.
    pub fn record(&mut self, event: &TelemetryEvent) {
        let Some(mode) = event.chosen_mode else {
            return;
        };
        self.totals.increment(mode);
        if let Some(distance_m) = event.distance_m {
            self.by_distance[DistanceBucket::for_distance(distance_m).index()].increment(mode);
        }
        self.last_updated = self.last_updated.max(event.ts);
    }

    pub fn bucket(&self, bucket: DistanceBucket) -> &ModeCounts {
        &self.by_distance[bucket.index()]
    }

    pub fn bucket_mut(&mut self, bucket: DistanceBucket) -> &mut ModeCounts {
        &mut self.by_distance[bucket.index()]
    }
}

/// Map a smoothed preference in [0.25, 0.75] linearly onto [0.75, 1.25].
fn preference_to_weight(preference: f64) -> f64 {
    let clamped = preference.clamp(0.25, 0.75);
    WEIGHT_FLOOR + (clamped - 0.25) * ((WEIGHT_CEIL - WEIGHT_FLOOR) / 0.5)
}

/// Weights for a trip of `distance_m`, from the counts of its distance bucket.
///
/// An empty bucket yields exactly 1.0 for every mode.
pub fn compute_mode_weights(stats: &PrefStats, distance_m: f64, short_walk_bias: bool) -> ModeWeights {
    compute_mode_weights_with_threshold(stats, distance_m, short_walk_bias, DEFAULT_SHORT_WALK_THRESHOLD_M)
}

pub fn compute_mode_weights_with_threshold(
    stats: &PrefStats,
    distance_m: f64,
    short_walk_bias: bool,
    short_walk_threshold_m: f64,
) -> ModeWeights {
    let counts = stats.bucket(DistanceBucket::for_distance(distance_m));
    let total = counts.total();
    if total == 0 {
        return ModeWeights::NEUTRAL;
    }

    let smoothed = |count: u32| (f64::from(count) + 1.0) / (total as f64 + 3.0);
    let mut weights = ModeWeights {
        walk: preference_to_weight(smoothed(counts.walk)),
        transit: preference_to_weight(smoothed(counts.transit)),
        drive: preference_to_weight(smoothed(counts.drive)),
    };

    if short_walk_bias && distance_m < short_walk_threshold_m {
        weights.walk = (weights.walk * 1.1).min(SHORT_WALK_WALK_CEIL);
        weights.transit = (weights.transit * 0.95).max(SHORT_WALK_OTHER_FLOOR);
        weights.drive = (weights.drive * 0.95).max(SHORT_WALK_OTHER_FLOOR);
    }

    weights
}

/// Mode weights backed by a snapshot of historical statistics.
#[derive(Debug, Clone)]
pub struct HistoricalModeWeights {
    pub stats: PrefStats,
    pub short_walk_bias: bool,
    pub short_walk_threshold_m: f64,
}

impl HistoricalModeWeights {
    pub fn new(stats: PrefStats) -> Self {
        Self {
            stats,
            short_walk_bias: false,
            short_walk_threshold_m: DEFAULT_SHORT_WALK_THRESHOLD_M,
        }
    }

    pub fn with_short_walk_bias(mut self, enabled: bool) -> Self {
        self.short_walk_bias = enabled;
        self
    }
}

impl Default for HistoricalModeWeights {
    fn default() -> Self {
        Self::new(PrefStats::default())
    }
}

impl ModeWeightSource for HistoricalModeWeights {
    fn mode_weights(&self, distance_m: f64) -> Result<ModeWeights, PersonalizationError> {
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(PersonalizationError::InvalidDistance(distance_m));
        }
        Ok(compute_mode_weights_with_threshold(
            &self.stats,
            distance_m,
            self.short_walk_bias,
            self.short_walk_threshold_m,
        ))
    }
}

/// Most used mode across a plan's legs. Ties resolve walk, transit, drive.
pub fn primary_mode(plan: &Plan) -> Option<TravelMode> {
    if plan.legs.is_empty() {
        return None;
    }
    let mut counts = ModeCounts::default();
    for leg in &plan.legs {
        counts.increment(leg.mode);
    }
    [TravelMode::Walk, TravelMode::Transit, TravelMode::Drive]
        .into_iter()
        .fold(None, |best: Option<TravelMode>, mode| match best {
            Some(current) if counts.get(current) >= counts.get(mode) => Some(current),
            _ => Some(mode),
        })
}

/// Straight-line length of a plan in whole meters. Legs with an endpoint
/// lacking coordinates contribute nothing.
pub fn total_distance_m(plan: &Plan) -> u64 {
    let meters: f64 = plan
        .legs
        .iter()
        .filter_map(|leg| Some(haversine_m(leg.from.coords()?, leg.to.coords()?)))
        .sum();
    meters.round() as u64
}
