//! Pairwise travel-time table built before optimization starts.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::haversine::{HaversineEstimator, haversine_m};
use crate::model::{Constraints, LocationKey, LocationRef, TravelMode};
use crate::traits::TravelTimeOracle;

/// Travel minutes keyed by (from, to, mode).
///
/// The table may be partially populated; a missing entry means the option
/// does not exist, never that it is free.
#[derive(Debug, Clone, Default)]
pub struct TravelTable {
    entries: HashMap<(LocationKey, LocationKey, TravelMode), u32>,
}

impl TravelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: LocationKey, to: LocationKey, mode: TravelMode, minutes: u32) {
        self.entries.insert((from, to, mode), minutes);
    }

    /// Builder-style insert between two coordinate pairs.
    pub fn with(mut self, from: (f64, f64), to: (f64, f64), mode: TravelMode, minutes: u32) -> Self {
        self.insert(
            LocationKey::from_coords(from),
            LocationKey::from_coords(to),
            mode,
            minutes,
        );
        self
    }

    pub fn get(&self, from: &LocationKey, to: &LocationKey, mode: TravelMode) -> Option<u32> {
        self.entries
            .get(&(from.clone(), to.clone(), mode))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Query the oracle for every ordered pair of distinct locations and mode.
    ///
    /// Locations without coordinates are skipped. A failed lookup is replaced
    /// by the straight-line estimate of `fallback`. Each location reaches
    /// itself in 0 minutes, so stops sharing coordinates stay reachable.
    pub fn build<O>(locations: &[LocationRef], oracle: &O, fallback: &HaversineEstimator) -> Self
    where
        O: TravelTimeOracle + ?Sized,
    {
        let points = dedupe_locations(locations);

        let mut pairs = Vec::new();
        for (i, (from_key, from)) in points.iter().enumerate() {
            for (j, (to_key, to)) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                for mode in TravelMode::ALL {
                    pairs.push((from_key, *from, to_key, *to, mode));
                }
            }
        }

        let mut entries: HashMap<_, _> = pairs
            .into_par_iter()
            .map(|(from_key, from, to_key, to, mode)| {
                let minutes = match oracle.travel_minutes(from, to, mode) {
                    Ok(minutes) => minutes,
                    Err(err) => {
                        let estimate = fallback.estimate_minutes(haversine_m(from, to), mode);
                        warn!(
                            from = %from_key,
                            to = %to_key,
                            %mode,
                            error = %err,
                            estimate,
                            "travel time lookup failed, using straight-line estimate"
                        );
                        estimate
                    }
                };
                ((from_key.clone(), to_key.clone(), mode), minutes)
            })
            .collect();

        for (key, _) in &points {
            for mode in TravelMode::ALL {
                entries.insert((key.clone(), key.clone(), mode), 0);
            }
        }

        debug!(locations = points.len(), entries = entries.len(), "built travel table");

        Self { entries }
    }

    /// Build the table for a constraint set's origin and stops.
    pub fn for_constraints<O>(constraints: &Constraints, oracle: &O, fallback: &HaversineEstimator) -> Self
    where
        O: TravelTimeOracle + ?Sized,
    {
        let locations = constraints
            .origin
            .iter()
            .cloned()
            .chain(constraints.stops.iter().map(|stop| stop.location.clone()))
            .collect::<Vec<_>>();
        Self::build(&locations, oracle, fallback)
    }
}

fn dedupe_locations(locations: &[LocationRef]) -> Vec<(LocationKey, (f64, f64))> {
    let mut unique: Vec<(LocationKey, (f64, f64))> = Vec::new();
    for location in locations {
        let Some(coords) = location.coords() else {
            debug!(name = %location.name, "location has no coordinates, not matrix-matched");
            continue;
        };
        let key = LocationKey::from_coords(coords);
        if unique.iter().any(|(seen, _)| *seen == key) {
            continue;
        }
        unique.push((key, coords));
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;

    struct FailingDrive;

    impl TravelTimeOracle for FailingDrive {
        fn travel_minutes(
            &self,
            _from: (f64, f64),
            _to: (f64, f64),
            mode: TravelMode,
        ) -> Result<u32, OracleError> {
            match mode {
                TravelMode::Drive => Err(OracleError::Unavailable {
                    mode,
                    reason: "quota exceeded".to_string(),
                }),
                _ => Ok(7),
            }
        }
    }

    fn locations() -> Vec<LocationRef> {
        vec![
            LocationRef::at("Origin", 43.6532, -79.3832),
            LocationRef::at("Stop 1", 43.6544, -79.3806),
            LocationRef::at("Stop 2", 43.6519, -79.3861),
            LocationRef::named("Nowhere"),
        ]
    }

    #[test]
    fn test_missing_entry_is_none() {
        let table = TravelTable::new().with((1.0, 1.0), (2.0, 2.0), TravelMode::Walk, 12);
        let a = LocationKey::from_coords((1.0, 1.0));
        let b = LocationKey::from_coords((2.0, 2.0));
        assert_eq!(table.get(&a, &b, TravelMode::Walk), Some(12));
        assert_eq!(table.get(&b, &a, TravelMode::Walk), None);
        assert_eq!(table.get(&a, &b, TravelMode::Drive), None);
    }

    #[test]
    fn test_build_covers_every_ordered_pair_and_mode() {
        let table = TravelTable::build(&locations(), &HaversineEstimator::default(), &HaversineEstimator::default());
        // 3 located places -> (6 ordered pairs + 3 self entries) x 3 modes
        assert_eq!(table.len(), 27);
    }

    #[test]
    fn test_build_falls_back_on_lookup_failure() {
        let fallback = HaversineEstimator::default();
        let table = TravelTable::build(&locations(), &FailingDrive, &fallback);
        let from = LocationKey::from_coords((43.6532, -79.3832));
        let to = LocationKey::from_coords((43.6544, -79.3806));

        assert_eq!(table.get(&from, &to, TravelMode::Walk), Some(7));
        let expected = fallback.estimate_minutes(
            haversine_m((43.6532, -79.3832), (43.6544, -79.3806)),
            TravelMode::Drive,
        );
        assert_eq!(table.get(&from, &to, TravelMode::Drive), Some(expected));
    }

    #[test]
    fn test_build_dedupes_shared_coordinates() {
        let mut locs = locations();
        locs.push(LocationRef::at("Same as origin", 43.6532, -79.3832));
        let table = TravelTable::build(&locs, &FailingDrive, &HaversineEstimator::default());
        assert_eq!(table.len(), 27);
    }

    #[test]
    fn test_build_maps_each_location_to_itself_in_zero_minutes() {
        let table = TravelTable::build(&locations(), &FailingDrive, &HaversineEstimator::default());
        let origin = LocationKey::from_coords((43.6532, -79.3832));
        for mode in TravelMode::ALL {
            assert_eq!(table.get(&origin, &origin, mode), Some(0));
        }
    }
}
