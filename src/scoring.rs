//! Cost of visiting a stop next, plus plan-level scoring and weight adaptation.

use crate::haversine::haversine_m;
use crate::matrix::TravelTable;
use crate::model::{LocationRef, Plan, PreferenceWeights, Stop, TravelMode};
use crate::time::TimeOfDay;
use crate::traits::ModeWeightSource;

/// Cost per minute of waiting for a window to open.
pub const EARLY_PENALTY_PER_MIN: f64 = 0.5;
/// Cost per minute of arriving after a window closes.
pub const LATE_PENALTY_PER_MIN: f64 = 30.0;
// TODO: confirm with product whether high-priority stops should be favored;
// the formula currently penalizes tier 1 the most.
/// Cost per priority step. Applied as `(4 - tier) * PRIORITY_STEP`, so tier 1
/// stops carry the largest penalty.
pub const PRIORITY_STEP: f64 = 10.0;
/// Cost per minute of walking beyond the walk tolerance.
pub const WALK_OVERAGE_PER_MIN: f64 = 2.0;
/// Driving adds `cost_weight * DRIVE_COST_FACTOR`.
pub const DRIVE_COST_FACTOR: f64 = 5.0;

/// A scored (stop, mode) option from the current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredOption {
    pub cost: f64,
    pub minutes: u32,
    pub arrival: TimeOfDay,
}

/// Cost of arriving at `stop` by `mode` after `minutes` of travel, before
/// personalization. Steps: travel minutes, window adjustment, priority,
/// mode-specific penalty.
pub fn base_cost(
    stop: &Stop,
    mode: TravelMode,
    minutes: u32,
    arrival: TimeOfDay,
    weights: &PreferenceWeights,
) -> f64 {
    let travel = f64::from(minutes);
    let mut cost = travel;

    if let Some((start, end)) = stop.arrive_window {
        if arrival < start {
            cost += start.minutes_since(arrival) as f64 * EARLY_PENALTY_PER_MIN;
        } else if arrival > end {
            cost += arrival.minutes_since(end) as f64 * LATE_PENALTY_PER_MIN;
        }
    }

    if let Some(priority) = stop.priority {
        cost += f64::from(4 - priority.tier()) * PRIORITY_STEP;
    }

    match mode {
        TravelMode::Transit => cost += weights.transfer_penalty,
        TravelMode::Walk => {
            if travel > weights.walk_tolerance_min {
                cost += (travel - weights.walk_tolerance_min) * WALK_OVERAGE_PER_MIN;
            }
        }
        TravelMode::Drive => cost += weights.cost_weight * DRIVE_COST_FACTOR,
    }

    cost
}

/// Scores candidate stops against a travel table.
pub struct StopScorer<'a, W: ModeWeightSource> {
    table: &'a TravelTable,
    weights: &'a PreferenceWeights,
    mode_weights: Option<&'a W>,
}

impl<'a, W: ModeWeightSource> StopScorer<'a, W> {
    /// `mode_weights = None` disables personalization.
    pub fn new(table: &'a TravelTable, weights: &'a PreferenceWeights, mode_weights: Option<&'a W>) -> Self {
        Self {
            table,
            weights,
            mode_weights,
        }
    }

    /// Cost of going from `current` to `stop` by `mode`, departing at `depart`.
    ///
    /// `None` when either end has no coordinates or the table has no entry
    /// for the pair and mode.
    pub fn score(
        &self,
        stop: &Stop,
        mode: TravelMode,
        depart: TimeOfDay,
        current: &LocationRef,
    ) -> Option<ScoredOption> {
        let from = current.coords()?;
        let to = stop.location.coords()?;
        let from_key = current.key()?;
        let to_key = stop.location.key()?;
        let minutes = self.table.get(&from_key, &to_key, mode)?;
        let arrival = depart.add_minutes(minutes);

        let mut cost = base_cost(stop, mode, minutes, arrival, self.weights);
        if let Some(source) = self.mode_weights {
            cost *= source.mode_weight(mode, haversine_m(from, to));
        }

        Some(ScoredOption {
            cost,
            minutes,
            arrival,
        })
    }
}

/// Number of mode changes between consecutive legs.
pub fn count_transfers(plan: &Plan) -> usize {
    plan.legs
        .windows(2)
        .filter(|pair| pair[0].mode != pair[1].mode)
        .count()
}

/// Plan-level cost: weighted minutes plus per-leg mode penalties.
pub fn plan_cost(plan: &Plan, weights: &PreferenceWeights) -> f64 {
    plan.legs
        .iter()
        .map(|leg| {
            let time = f64::from(leg.minutes) * weights.time_weight;
            match leg.mode {
                TravelMode::Transit => time + weights.transfer_penalty,
                TravelMode::Drive => time + weights.cost_weight * DRIVE_COST_FACTOR,
                TravelMode::Walk => time,
            }
        })
        .sum()
}

const LEARNING_RATE: f64 = 0.1;

/// What the rider changed after seeing a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOverrides {
    pub mode: Option<TravelMode>,
    pub dropped_stops: Vec<String>,
}

impl PreferenceWeights {
    /// New weight record nudged towards the rider's choice between two plans.
    ///
    /// Pure: the caller owns the record and decides when to persist it.
    pub fn adapted(&self, chosen: &Plan, rejected: &Plan, overrides: &UserOverrides) -> PreferenceWeights {
        let mut next = *self;

        let chosen_transfers = count_transfers(chosen);
        let rejected_transfers = count_transfers(rejected);
        if chosen_transfers > rejected_transfers {
            next.transfer_penalty *= 1.0 - LEARNING_RATE;
        } else if chosen_transfers < rejected_transfers {
            next.transfer_penalty *= 1.0 + LEARNING_RATE;
        }

        match overrides.mode {
            Some(TravelMode::Transit) => next.transfer_penalty *= 1.0 - LEARNING_RATE,
            Some(TravelMode::Drive) => next.cost_weight *= 1.0 - LEARNING_RATE,
            Some(TravelMode::Walk) => next.walk_tolerance_min *= 1.0 + LEARNING_RATE,
            None => {}
        }

        if !overrides.dropped_stops.is_empty() {
            next.time_weight *= 1.0 + LEARNING_RATE;
        }

        next.transfer_penalty = next.transfer_penalty.clamp(0.0, 20.0);
        next.cost_weight = next.cost_weight.clamp(0.1, 5.0);
        next.time_weight = next.time_weight.clamp(0.1, 5.0);
        next.walk_tolerance_min = next.walk_tolerance_min.clamp(5.0, 60.0);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersonalizationError;
    use crate::model::{Leg, Priority};
    use crate::traits::{ModeWeights, NeutralModeWeights};

    const HOME: (f64, f64) = (43.6532, -79.3832);
    const CAFE: (f64, f64) = (43.6544, -79.3806);

    fn cafe() -> Stop {
        Stop::new(LocationRef::at("Cafe", CAFE.0, CAFE.1))
    }

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    #[test]
    fn test_base_cost_per_mode() {
        let w = PreferenceWeights::default();
        let stop = cafe();
        assert_eq!(base_cost(&stop, TravelMode::Drive, 5, t("09:05"), &w), 10.0);
        assert_eq!(base_cost(&stop, TravelMode::Transit, 8, t("09:08"), &w), 13.0);
        assert_eq!(base_cost(&stop, TravelMode::Walk, 15, t("09:15"), &w), 15.0);
        assert_eq!(base_cost(&stop, TravelMode::Walk, 20, t("09:20"), &w), 30.0);
    }

    #[test]
    fn test_window_penalties_are_asymmetric() {
        let w = PreferenceWeights::default();
        let stop = Stop {
            arrive_window: Some((t("10:00"), t("10:30"))),
            ..cafe()
        };
        // 20 minutes early: 5 + 20 * 0.5 + drive 5
        assert_eq!(base_cost(&stop, TravelMode::Drive, 5, t("09:40"), &w), 20.0);
        // inside window
        assert_eq!(base_cost(&stop, TravelMode::Drive, 5, t("10:10"), &w), 10.0);
        // 2 minutes late: 5 + 60 + 5
        assert_eq!(base_cost(&stop, TravelMode::Drive, 5, t("10:32"), &w), 70.0);
    }

    #[test]
    fn test_priority_penalty_is_largest_for_tier_one() {
        let w = PreferenceWeights::default();
        let cost = |priority| {
            let stop = Stop {
                priority: Some(priority),
                ..cafe()
            };
            base_cost(&stop, TravelMode::Walk, 5, t("09:05"), &w)
        };
        assert_eq!(cost(Priority::High), 35.0);
        assert_eq!(cost(Priority::Medium), 25.0);
        assert_eq!(cost(Priority::Low), 15.0);
    }

    #[test]
    fn test_score_missing_entry_is_unreachable() {
        let table = TravelTable::new().with(HOME, CAFE, TravelMode::Drive, 5);
        let weights = PreferenceWeights::default();
        let scorer: StopScorer<'_, NeutralModeWeights> = StopScorer::new(&table, &weights, None);
        let home = LocationRef::at("Home", HOME.0, HOME.1);

        let drive = scorer.score(&cafe(), TravelMode::Drive, t("09:00"), &home).unwrap();
        assert_eq!(drive.minutes, 5);
        assert_eq!(drive.arrival, t("09:05"));
        assert!(scorer.score(&cafe(), TravelMode::Walk, t("09:00"), &home).is_none());
        assert!(
            scorer
                .score(&cafe(), TravelMode::Drive, t("09:00"), &LocationRef::named("Home"))
                .is_none()
        );
    }

    struct Fixed(f64);

    impl ModeWeightSource for Fixed {
        fn mode_weights(&self, _distance_m: f64) -> Result<ModeWeights, PersonalizationError> {
            Ok(ModeWeights {
                walk: 1.0,
                transit: 1.0,
                drive: self.0,
            })
        }
    }

    #[test]
    fn test_personalization_multiplies_accumulated_cost() {
        let table = TravelTable::new().with(HOME, CAFE, TravelMode::Drive, 5);
        let weights = PreferenceWeights::default();
        let source = Fixed(0.8);
        let scorer = StopScorer::new(&table, &weights, Some(&source));
        let home = LocationRef::at("Home", HOME.0, HOME.1);
        let option = scorer.score(&cafe(), TravelMode::Drive, t("09:00"), &home).unwrap();
        assert!((option.cost - 8.0).abs() < 1e-9);
    }

    fn leg(mode: TravelMode, minutes: u32) -> Leg {
        Leg {
            from: LocationRef::named("a"),
            to: LocationRef::named("b"),
            mode,
            depart_time: TimeOfDay::MIDNIGHT,
            arrive_time: TimeOfDay::MIDNIGHT,
            minutes,
            annotation: None,
        }
    }

    #[test]
    fn test_plan_cost_and_transfers() {
        let plan = Plan::from_legs(
            vec![
                leg(TravelMode::Walk, 10),
                leg(TravelMode::Transit, 20),
                leg(TravelMode::Transit, 5),
                leg(TravelMode::Drive, 7),
            ],
            Vec::new(),
        );
        assert_eq!(count_transfers(&plan), 2);
        // 42 minutes + 2 * 5 transit + 1 * 5 drive
        assert_eq!(plan_cost(&plan, &PreferenceWeights::default()), 57.0);
    }

    #[test]
    fn test_adapted_weights() {
        let base = PreferenceWeights::default();
        let many = Plan::from_legs(
            vec![leg(TravelMode::Walk, 1), leg(TravelMode::Transit, 1), leg(TravelMode::Walk, 1)],
            Vec::new(),
        );
        let none = Plan::from_legs(vec![leg(TravelMode::Drive, 1)], Vec::new());

        let next = base.adapted(&many, &none, &UserOverrides::default());
        assert!((next.transfer_penalty - 4.5).abs() < 1e-9);

        let next = base.adapted(
            &none,
            &many,
            &UserOverrides {
                mode: Some(TravelMode::Walk),
                dropped_stops: vec!["Museum".to_string()],
            },
        );
        assert!((next.transfer_penalty - 5.5).abs() < 1e-9);
        assert!((next.walk_tolerance_min - 16.5).abs() < 1e-9);
        assert!((next.time_weight - 1.1).abs() < 1e-9);
        assert_eq!(next.cost_weight, 1.0);
    }

    #[test]
    fn test_adapted_weights_stay_clamped() {
        let extreme = PreferenceWeights {
            transfer_penalty: 100.0,
            cost_weight: 0.0,
            time_weight: 50.0,
            walk_tolerance_min: 1.0,
        };
        let empty = Plan::default();
        let next = extreme.adapted(&empty, &empty, &UserOverrides::default());
        assert_eq!(next.transfer_penalty, 20.0);
        assert_eq!(next.cost_weight, 0.1);
        assert_eq!(next.time_weight, 5.0);
        assert_eq!(next.walk_tolerance_min, 5.0);
    }
}
