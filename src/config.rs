//! Planner configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::haversine::FallbackSpeeds;
use crate::model::TravelMode;

/// How the constructor picks between (stop, mode) options with equal cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the first option found (wishlist order, then mode order).
    #[default]
    FirstEncountered,
    /// Smallest stop name, then smallest mode name.
    ByNameThenMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum local-search passes.
    pub max_improvement_passes: usize,
    /// Apply mode weights from the personalization source.
    pub personalization_enabled: bool,
    pub tie_break: TieBreak,
    /// Also build the "faster" and "cheaper" plans.
    pub generate_alternatives: bool,
    /// Re-read the travel table when a leg is reversed instead of carrying
    /// its duration over.
    pub requery_reversed_legs: bool,
    /// Speeds used when the oracle fails for a pair.
    pub fallback_speeds: FallbackSpeeds,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_improvement_passes: 10,
            personalization_enabled: true,
            tie_break: TieBreak::FirstEncountered,
            generate_alternatives: true,
            requery_reversed_legs: false,
            fallback_speeds: FallbackSpeeds::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_improvement_passes == 0 {
            return Err(ConfigError::ZeroPasses);
        }
        for mode in TravelMode::ALL {
            let speed = self.fallback_speeds.for_mode(mode);
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::NonPositiveSpeed(mode));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.max_improvement_passes, 10);
        assert!(config.personalization_enabled);
        assert!(config.generate_alternatives);
        assert!(!config.requery_reversed_legs);
        assert_eq!(config.tie_break, TieBreak::FirstEncountered);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = PlannerConfig::from_json(
            r#"{"tie_break": "by_name_then_mode", "fallback_speeds": {"walk_kmh": 4.5, "transit_kmh": 18, "drive_kmh": 25}}"#,
        )
        .unwrap();
        assert_eq!(config.tie_break, TieBreak::ByNameThenMode);
        assert_eq!(config.fallback_speeds.walk_kmh, 4.5);
        assert_eq!(config.max_improvement_passes, 10);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            PlannerConfig::from_json(r#"{"max_improvement_passes": 0}"#),
            Err(ConfigError::ZeroPasses)
        ));
        assert!(matches!(
            PlannerConfig::from_json(r#"{"fallback_speeds": {"walk_kmh": 0, "transit_kmh": 18, "drive_kmh": 25}}"#),
            Err(ConfigError::NonPositiveSpeed(TravelMode::Walk))
        ));
        assert!(matches!(PlannerConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
