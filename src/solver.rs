//! Itinerary construction (scored greedy) and local-search improvement.

use tracing::{debug, warn};

use crate::config::TieBreak;
use crate::matrix::TravelTable;
use crate::model::{Constraints, Leg, LocationRef, Plan, Stop, TravelMode, total_minutes};
use crate::scoring::{ScoredOption, StopScorer};
use crate::time::TimeOfDay;
use crate::traits::ModeWeightSource;

/// Where and when the day begins.
#[derive(Debug, Clone)]
struct Cursor {
    location: LocationRef,
    time: TimeOfDay,
}

/// Pick the starting cursor and, when the start is itself a stop, its index.
///
/// With an origin the day starts there at `start_after` (midnight when
/// unset). Without one, the stop whose window opens first is the start;
/// failing that, the first stop with coordinates.
fn initial_cursor(constraints: &Constraints) -> (Cursor, Option<usize>) {
    let start_time = constraints.start_after.unwrap_or(TimeOfDay::MIDNIGHT);

    if let Some(origin) = &constraints.origin {
        return (
            Cursor {
                location: origin.clone(),
                time: start_time,
            },
            None,
        );
    }

    let earliest_window = constraints
        .stops
        .iter()
        .enumerate()
        .filter_map(|(idx, stop)| stop.arrive_window.map(|(start, _)| (idx, start)))
        .min_by_key(|&(idx, start)| (start, idx));

    if let Some((idx, window_start)) = earliest_window {
        return (
            Cursor {
                location: constraints.stops[idx].location.clone(),
                time: window_start,
            },
            Some(idx),
        );
    }

    if let Some(idx) = constraints
        .stops
        .iter()
        .position(|stop| stop.location.coords().is_some())
    {
        return (
            Cursor {
                location: constraints.stops[idx].location.clone(),
                time: start_time,
            },
            Some(idx),
        );
    }

    (
        Cursor {
            location: LocationRef::named("Origin"),
            time: start_time,
        },
        None,
    )
}

fn leg_annotation(mode: TravelMode, stop: &Stop) -> String {
    match stop.arrive_window {
        Some((start, end)) => format!("{} • Arrive between {}-{}", mode.label(), start, end),
        None => mode.label().to_string(),
    }
}

/// True when `candidate` should replace `best` on an exact cost tie.
fn wins_tie(tie_break: TieBreak, candidate: (&Stop, TravelMode), best: (&Stop, TravelMode)) -> bool {
    match tie_break {
        TieBreak::FirstEncountered => false,
        TieBreak::ByNameThenMode => {
            (candidate.0.name(), candidate.1.as_str()) < (best.0.name(), best.1.as_str())
        }
    }
}

/// Build an itinerary by repeatedly taking the cheapest next (stop, mode).
///
/// Never fails: unreachable stops, missed windows and deadline overruns are
/// reported as feasibility notes on the returned plan.
pub fn construct<W: ModeWeightSource>(
    constraints: &Constraints,
    scorer: &StopScorer<'_, W>,
    tie_break: TieBreak,
) -> Plan {
    let stops = &constraints.stops;
    let mut visited = vec![false; stops.len()];
    let mut legs: Vec<Leg> = Vec::with_capacity(stops.len());
    let mut notes: Vec<String> = Vec::new();

    let (mut cursor, start_stop) = initial_cursor(constraints);
    if let Some(idx) = start_stop {
        visited[idx] = true;
        debug!(stop = %stops[idx].name(), time = %cursor.time, "no origin, starting at stop");
    }

    while visited.iter().any(|done| !done) {
        let mut best: Option<(usize, TravelMode, ScoredOption)> = None;

        for (idx, stop) in stops.iter().enumerate() {
            if visited[idx] {
                continue;
            }

            for mode in constraints.preferences.modes_for(stop) {
                let Some(option) = scorer.score(stop, mode, cursor.time, &cursor.location) else {
                    continue;
                };

                let replace = match &best {
                    None => true,
                    Some((best_idx, best_mode, best_option)) => {
                        option.cost < best_option.cost
                            || (option.cost == best_option.cost
                                && wins_tie(tie_break, (stop, mode), (&stops[*best_idx], *best_mode)))
                    }
                };

                if replace {
                    best = Some((idx, mode, option));
                }
            }
        }

        let Some((idx, mode, option)) = best else {
            let missing = stops
                .iter()
                .zip(&visited)
                .filter(|(_, done)| !**done)
                .map(|(stop, _)| stop.name())
                .collect::<Vec<_>>();
            warn!(unreachable = ?missing, "no reachable stop from {}", cursor.location.name);
            notes.push(format!(
                "Unable to reach all stops - unreachable: {}",
                missing.join(", ")
            ));
            break;
        };

        let stop = &stops[idx];
        if let Some((_, window_end)) = stop.arrive_window {
            if option.arrival > window_end {
                let late = option.arrival.minutes_since(window_end);
                warn!(stop = %stop.name(), arrival = %option.arrival, late, "arrival window missed");
                notes.push(format!(
                    "Arrives at {} at {}, {} min after its window closes at {}",
                    stop.name(),
                    option.arrival,
                    late,
                    window_end
                ));
            }
        }

        legs.push(Leg {
            from: cursor.location.clone(),
            to: stop.location.clone(),
            mode,
            depart_time: cursor.time,
            arrive_time: option.arrival,
            minutes: option.minutes,
            annotation: Some(leg_annotation(mode, stop)),
        });
        visited[idx] = true;

        cursor = Cursor {
            location: stop.location.clone(),
            time: option.arrival.add_minutes(stop.service_duration()),
        };
    }

    if let Some(deadline) = constraints.must_end_by {
        if cursor.time > deadline {
            warn!(%deadline, end = %cursor.time, "plan overruns end time");
            notes.push(format!(
                "Cannot meet end time of {} - current plan ends at {}",
                deadline, cursor.time
            ));
        }
    }

    debug!(legs = legs.len(), notes = notes.len(), "constructed plan");
    Plan::from_legs(legs, notes)
}

// ============================================================================
// Local Search
// ============================================================================

/// Rebuilds one leg when its segment is reversed.
pub trait LegReversal {
    fn reverse(&self, leg: &Leg) -> Leg;
}

fn swapped(leg: &Leg, minutes: u32) -> Leg {
    Leg {
        from: leg.to.clone(),
        to: leg.from.clone(),
        mode: leg.mode,
        depart_time: leg.arrive_time,
        arrive_time: leg.depart_time,
        minutes,
        annotation: leg.annotation.clone(),
    }
}

/// Swap endpoints and times, keep the forward duration.
///
/// Only accurate when travel time is the same in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarryOverDuration;

impl LegReversal for CarryOverDuration {
    fn reverse(&self, leg: &Leg) -> Leg {
        swapped(leg, leg.minutes)
    }
}

/// Swap endpoints and times, reading the reversed duration from the table.
/// Falls back to the forward duration when the table has no entry.
#[derive(Debug, Clone, Copy)]
pub struct RequeryTable<'a> {
    pub table: &'a TravelTable,
}

impl LegReversal for RequeryTable<'_> {
    fn reverse(&self, leg: &Leg) -> Leg {
        let minutes = match (leg.to.key(), leg.from.key()) {
            (Some(from), Some(to)) => self.table.get(&from, &to, leg.mode),
            _ => None,
        };
        swapped(leg, minutes.unwrap_or(leg.minutes))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImprovementStats {
    /// Scans performed, including the final one that found nothing.
    pub passes: usize,
    /// Moves accepted.
    pub improvements: usize,
}

/// Legs with the segment `[i, j]` reversed in order, each leg rebuilt by `reversal`.
pub fn reverse_segment<R: LegReversal + ?Sized>(legs: &[Leg], i: usize, j: usize, reversal: &R) -> Vec<Leg> {
    let mut candidate = Vec::with_capacity(legs.len());
    candidate.extend_from_slice(&legs[..i]);
    candidate.extend(legs[i..=j].iter().rev().map(|leg| reversal.reverse(leg)));
    candidate.extend_from_slice(&legs[j + 1..]);
    candidate
}

/// Two-opt style improvement with first-improvement acceptance.
///
/// Each pass scans `(i, j)` with `j >= i + 2`; the first candidate with a
/// strictly lower total is applied and the next pass starts from the
/// beginning. Stops after a pass with no improvement or after `max_passes`.
/// Feasibility notes are kept.
pub fn improve<R: LegReversal + ?Sized>(plan: Plan, reversal: &R, max_passes: usize) -> (Plan, ImprovementStats) {
    let Plan {
        mut legs,
        feasibility_notes,
        ..
    } = plan;
    let mut stats = ImprovementStats::default();
    let mut current_total = total_minutes(&legs);
    let n = legs.len();

    while stats.passes < max_passes {
        stats.passes += 1;
        let mut improved = false;

        'scan: for i in 0..n.saturating_sub(1) {
            for j in i + 2..n {
                let candidate = reverse_segment(&legs, i, j, reversal);
                let candidate_total = total_minutes(&candidate);
                if candidate_total < current_total {
                    debug!(i, j, from = current_total, to = candidate_total, "accepted segment reversal");
                    legs = candidate;
                    current_total = candidate_total;
                    stats.improvements += 1;
                    improved = true;
                    break 'scan;
                }
            }
        }

        if !improved {
            break;
        }
    }

    (Plan::from_legs(legs, feasibility_notes), stats)
}
