//! Collaborator interfaces consumed by the planner.
//!
//! Routing services and personalization stores live outside this crate; the
//! planner only needs a travel-time lookup and a mode-weight function.

use tracing::warn;

use crate::error::{OracleError, PersonalizationError};
use crate::model::TravelMode;

/// Expected travel time between two coordinates (lat, lon) by one mode.
///
/// Implementations are called from worker threads while the travel table is
/// built, hence `Sync`.
pub trait TravelTimeOracle: Sync {
    fn travel_minutes(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        mode: TravelMode,
    ) -> Result<u32, OracleError>;
}

/// Lower bound of a personalization multiplier.
pub const MODE_WEIGHT_MIN: f64 = 0.75;
/// Upper bound of a personalization multiplier (short-walk bias included).
pub const MODE_WEIGHT_MAX: f64 = 1.3;

/// Per-mode multiplicative bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeWeights {
    pub walk: f64,
    pub transit: f64,
    pub drive: f64,
}

impl ModeWeights {
    pub const NEUTRAL: ModeWeights = ModeWeights {
        walk: 1.0,
        transit: 1.0,
        drive: 1.0,
    };

    pub fn get(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walk => self.walk,
            TravelMode::Transit => self.transit,
            TravelMode::Drive => self.drive,
        }
    }
}

/// Source of personalization multipliers derived from historical mode choice.
pub trait ModeWeightSource {
    fn mode_weights(&self, distance_m: f64) -> Result<ModeWeights, PersonalizationError>;

    /// Multiplier for one mode. Never fails: errors and out-of-range values
    /// degrade to the neutral 1.0.
    fn mode_weight(&self, mode: TravelMode, distance_m: f64) -> f64 {
        match self.mode_weights(distance_m) {
            Ok(weights) => {
                let weight = weights.get(mode);
                if weight.is_finite() && (MODE_WEIGHT_MIN..=MODE_WEIGHT_MAX).contains(&weight) {
                    weight
                } else {
                    warn!(%mode, weight, "mode weight out of bounds, using neutral weight");
                    1.0
                }
            }
            Err(err) => {
                warn!(%mode, distance_m, error = %err, "failed to apply personalization");
                1.0
            }
        }
    }
}

impl<T: ModeWeightSource + ?Sized> ModeWeightSource for &T {
    fn mode_weights(&self, distance_m: f64) -> Result<ModeWeights, PersonalizationError> {
        (**self).mode_weights(distance_m)
    }
}

/// Personalization switched off: every mode weighs 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralModeWeights;

impl ModeWeightSource for NeutralModeWeights {
    fn mode_weights(&self, _distance_m: f64) -> Result<ModeWeights, PersonalizationError> {
        Ok(ModeWeights::NEUTRAL)
    }
}
