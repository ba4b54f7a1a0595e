//! Downtown Toronto locations and builders for realistic test fixtures.

#![allow(dead_code)]

use itinerary_planner::model::{Constraints, LocationRef, Priority, Stop, TravelMode};
use itinerary_planner::time::TimeOfDay;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn to_ref(&self) -> LocationRef {
        LocationRef::at(self.name, self.lat, self.lng)
    }
}

// ============================================================================
// Start points
// ============================================================================

pub const ORIGIN: Location = Location::new("Origin", 43.6532, -79.3832);
pub const UNION_STATION: Location = Location::new("Union Station", 43.6453, -79.3806);

// ============================================================================
// Places to visit
// ============================================================================

pub const ATTRACTIONS: &[Location] = &[
    Location::new("CN Tower", 43.6426, -79.3871),
    Location::new("Royal Ontario Museum", 43.6677, -79.3948),
    Location::new("St. Lawrence Market", 43.6487, -79.3716),
    Location::new("Art Gallery of Ontario", 43.6536, -79.3925),
    Location::new("Casa Loma", 43.6780, -79.4094),
    Location::new("Distillery District", 43.6503, -79.3596),
    Location::new("Kensington Market", 43.6547, -79.4005),
    Location::new("High Park", 43.6465, -79.4637),
];

pub const NEARBY: &[Location] = &[
    Location::new("Stop 1", 43.6544, -79.3806),
    Location::new("Stop 2", 43.6519, -79.3861),
];

pub fn time(value: &str) -> TimeOfDay {
    TimeOfDay::parse(value).expect("valid fixture time")
}

/// Builder for test stops with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestStop {
    stop: Stop,
}

impl TestStop {
    pub fn at(location: &Location) -> Self {
        Self {
            stop: Stop::new(location.to_ref()),
        }
    }

    pub fn unlocated(name: &str) -> Self {
        Self {
            stop: Stop::new(LocationRef::named(name)),
        }
    }

    pub fn by(mut self, mode: TravelMode) -> Self {
        self.stop.mode = Some(mode);
        self
    }

    pub fn window(mut self, start: &str, end: &str) -> Self {
        self.stop.arrive_window = Some((time(start), time(end)));
        self
    }

    pub fn service(mut self, minutes: u32) -> Self {
        self.stop.service_minutes = Some(minutes);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.stop.priority = Some(priority);
        self
    }

    pub fn build(self) -> Stop {
        self.stop
    }
}

/// Constraint set starting at `origin` at `start`.
pub fn day_from(origin: &Location, start: &str, stops: Vec<TestStop>) -> Constraints {
    Constraints {
        origin: Some(origin.to_ref()),
        start_after: Some(time(start)),
        stops: stops.into_iter().map(TestStop::build).collect(),
        ..Constraints::default()
    }
}
