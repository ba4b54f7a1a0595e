//! Planning entry points: primary plan plus "faster" and "cheaper" alternatives.

use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::haversine::HaversineEstimator;
use crate::matrix::TravelTable;
use crate::model::{
    Alternatives, Constraints, Plan, PlanWithAlternatives, PreferenceWeights, TravelMode, TripPreferences,
};
use crate::scoring::StopScorer;
use crate::solver::{CarryOverDuration, RequeryTable, construct, improve};
use crate::traits::{ModeWeightSource, TravelTimeOracle};

/// Service time never drops below this in the faster profile.
const FASTER_MIN_SERVICE_MINUTES: u32 = 5;
const FASTER_SERVICE_REDUCTION: u32 = 5;

/// Perturbed inputs for an alternative plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Drive by default, shorter stops, transit relatively dearer.
    Faster,
    /// Transit by default, driving relatively dearer.
    Cheaper,
}

impl Profile {
    pub fn default_mode(self) -> TravelMode {
        match self {
            Profile::Faster => TravelMode::Drive,
            Profile::Cheaper => TravelMode::Transit,
        }
    }

    pub fn mode_priority(self) -> Vec<TravelMode> {
        match self {
            Profile::Faster => vec![TravelMode::Drive, TravelMode::Transit, TravelMode::Walk],
            Profile::Cheaper => vec![TravelMode::Transit, TravelMode::Walk, TravelMode::Drive],
        }
    }

    /// Multipliers applied to (transfer_penalty, cost_weight).
    pub fn weight_factors(self) -> (f64, f64) {
        match self {
            Profile::Faster => (2.0, 0.5),
            Profile::Cheaper => (1.0, 2.0),
        }
    }

    pub fn weights(self, base: &PreferenceWeights) -> PreferenceWeights {
        let (transfer, cost) = self.weight_factors();
        PreferenceWeights {
            transfer_penalty: base.transfer_penalty * transfer,
            cost_weight: base.cost_weight * cost,
            ..*base
        }
    }

    /// A fresh constraint set for this profile; `base` is left untouched.
    pub fn constraints(self, base: &Constraints) -> Constraints {
        let stops = base
            .stops
            .iter()
            .map(|stop| {
                let mut stop = stop.clone();
                stop.mode = Some(stop.mode.unwrap_or(self.default_mode()));
                if self == Profile::Faster {
                    stop.service_minutes = Some(
                        stop.service_duration()
                            .saturating_sub(FASTER_SERVICE_REDUCTION)
                            .max(FASTER_MIN_SERVICE_MINUTES),
                    );
                }
                stop
            })
            .collect();

        let preferences = TripPreferences {
            mode_priority: Some(self.mode_priority()),
            minimize_cost: match self {
                Profile::Faster => base.preferences.minimize_cost,
                Profile::Cheaper => Some(true),
            },
            ..base.preferences.clone()
        };

        Constraints {
            stops,
            preferences,
            weights: self.weights(&base.weights),
            ..base.clone()
        }
    }
}

/// Construct then improve one plan.
fn run_pipeline<W: ModeWeightSource>(
    constraints: &Constraints,
    table: &TravelTable,
    mode_weights: &W,
    config: &PlannerConfig,
) -> Plan {
    let personalization = config.personalization_enabled.then_some(mode_weights);
    let scorer = StopScorer::new(table, &constraints.weights, personalization);
    let initial = construct(constraints, &scorer, config.tie_break);
    let initial_total = initial.total_minutes;

    let (plan, stats) = if config.requery_reversed_legs {
        improve(initial, &RequeryTable { table }, config.max_improvement_passes)
    } else {
        improve(initial, &CarryOverDuration, config.max_improvement_passes)
    };

    debug!(
        initial_total,
        final_total = plan.total_minutes,
        passes = stats.passes,
        improvements = stats.improvements,
        "pipeline finished"
    );
    plan
}

/// Plan one day against a prebuilt travel table.
///
/// Every degraded condition ends up as a feasibility note; a structurally
/// valid plan is always returned.
pub fn plan_itinerary<W>(
    constraints: &Constraints,
    table: &TravelTable,
    mode_weights: &W,
    config: &PlannerConfig,
) -> PlanWithAlternatives
where
    W: ModeWeightSource + Sync,
{
    info!(stops = constraints.stops.len(), "planning itinerary");

    let plan = run_pipeline(constraints, table, mode_weights, config);

    let alternatives = if config.generate_alternatives {
        let faster = Profile::Faster.constraints(constraints);
        let cheaper = Profile::Cheaper.constraints(constraints);
        let (faster, cheaper) = rayon::join(
            || run_pipeline(&faster, table, mode_weights, config),
            || run_pipeline(&cheaper, table, mode_weights, config),
        );
        Alternatives {
            faster: Some(faster),
            cheaper: Some(cheaper),
        }
    } else {
        Alternatives::default()
    };

    info!(
        legs = plan.legs.len(),
        total_minutes = plan.total_minutes,
        notes = plan.feasibility_notes.len(),
        "itinerary planned"
    );

    PlanWithAlternatives {
        feasibility_notes: plan.feasibility_notes.clone(),
        plan,
        alternatives,
    }
}

/// Build the travel table from `oracle` (falling back to straight-line
/// estimates per failed lookup), then plan.
pub fn plan_with_oracle<O, W>(
    constraints: &Constraints,
    oracle: &O,
    mode_weights: &W,
    config: &PlannerConfig,
) -> PlanWithAlternatives
where
    O: TravelTimeOracle + ?Sized,
    W: ModeWeightSource + Sync,
{
    let fallback = HaversineEstimator::new(config.fallback_speeds);
    let table = TravelTable::for_constraints(constraints, oracle, &fallback);
    plan_itinerary(constraints, &table, mode_weights, config)
}
