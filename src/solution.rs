//! Route representation and manipulation.
//!
//! A route is a visiting order over the stops of an instance. Position 0
//! always holds the origin; the moves below never displace it.

use crate::instance::RouteInstance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an ordered delivery route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Stop indices in visiting order, origin first
    pub order: Vec<usize>,
    /// Total length in kilometres
    pub distance_km: f64,
    /// Whether the route returns to the origin
    pub closed: bool,
    /// Every stop visited exactly once, starting at the origin
    pub complete: bool,
    /// Algorithm that generated this route
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of improvement iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Route {
    pub fn new() -> Self {
        Route {
            order: Vec::new(),
            distance_km: f64::INFINITY,
            closed: false,
            complete: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a route from a visiting order
    pub fn from_order(instance: &RouteInstance, order: Vec<usize>, algorithm: &str) -> Self {
        let mut route = Route {
            order,
            distance_km: 0.0,
            closed: instance.closed_route,
            complete: false,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        };
        route.validate(instance);
        route
    }

    /// Recompute distance and completeness
    pub fn validate(&mut self, instance: &RouteInstance) {
        self.closed = instance.closed_route;
        self.distance_km = instance.route_length(&self.order, self.closed);
        self.complete = self.is_complete(instance);
    }

    /// Check that every stop is visited exactly once and the origin leads
    pub fn is_complete(&self, instance: &RouteInstance) -> bool {
        if self.order.len() != instance.len() {
            return false;
        }
        if self.order.is_empty() {
            return true;
        }

        let mut seen = vec![false; instance.len()];
        for &s in &self.order {
            if s >= seen.len() || seen[s] {
                return false;
            }
            seen[s] = true;
        }
        self.order[0] == 0
    }

    /// Get the position of a stop in the route
    pub fn position(&self, stop: usize) -> Option<usize> {
        self.order.iter().position(|&s| s == stop)
    }

    /// Length change of reversing `order[i + 1..=j]`
    pub fn two_opt_delta(&self, instance: &RouteInstance, i: usize, j: usize) -> f64 {
        let n = self.order.len();
        if i >= j || j >= n {
            return 0.0;
        }

        let a = self.order[i];
        let b = self.order[i + 1];
        let c = self.order[j];

        let mut delta = instance.distance(a, c) - instance.distance(a, b);
        if j + 1 < n {
            let d = self.order[j + 1];
            delta += instance.distance(b, d) - instance.distance(c, d);
        } else if self.closed {
            let d = self.order[0];
            delta += instance.distance(b, d) - instance.distance(c, d);
        }
        delta
    }

    /// Apply a 2-opt move (reverse segment between i+1 and j)
    pub fn apply_two_opt(&mut self, i: usize, j: usize) {
        self.order[i + 1..=j].reverse();
    }

    /// Length change of moving the segment `[start, start + len)` so that it
    /// follows the stop currently at position `after`.
    pub fn relocate_delta(&self, instance: &RouteInstance, start: usize, len: usize, after: usize) -> f64 {
        let n = self.order.len();
        if !is_legal_relocation(n, start, len, after) {
            return 0.0;
        }

        let successor = |pos: usize| {
            if pos + 1 < n {
                Some(self.order[pos + 1])
            } else if self.closed {
                Some(self.order[0])
            } else {
                None
            }
        };

        let first = self.order[start];
        let last = self.order[start + len - 1];
        let prev = self.order[start - 1];
        let a = self.order[after];

        // Unlink the segment.
        let mut delta = -instance.distance(prev, first);
        if let Some(next) = successor(start + len - 1) {
            delta += instance.distance(prev, next) - instance.distance(last, next);
        }

        // Splice it in between `a` and its successor.
        delta += instance.distance(a, first);
        if let Some(b) = successor(after) {
            delta += instance.distance(last, b) - instance.distance(a, b);
        }
        delta
    }

    /// Apply a segment relocation, returning false when the move is not legal
    pub fn apply_relocate(&mut self, start: usize, len: usize, after: usize) -> bool {
        relocate_in_place(&mut self.order, start, len, after)
    }

    /// Break the route into legs with distances and estimated arrival times
    pub fn legs(&self, instance: &RouteInstance, speed_kmh: f64) -> Vec<Leg> {
        if self.order.len() < 2 || speed_kmh <= 0.0 {
            return Vec::new();
        }

        let mut pairs: Vec<(usize, usize)> = self.order.windows(2).map(|w| (w[0], w[1])).collect();
        if self.closed {
            pairs.push((self.order[self.order.len() - 1], self.order[0]));
        }

        let mut cumulative_km = 0.0;
        let mut clock_minutes = 0.0;
        pairs
            .into_iter()
            .map(|(from, to)| {
                let distance_km = instance.distance(from, to);
                cumulative_km += distance_km;
                if from != self.order[0] {
                    clock_minutes += instance.stops[from].service_minutes;
                }
                clock_minutes += distance_km / speed_kmh * 60.0;
                Leg {
                    from: instance.stops[from].id.clone(),
                    to: instance.stops[to].id.clone(),
                    distance_km,
                    cumulative_km,
                    arrival_minute: clock_minutes,
                }
            })
            .collect()
    }

    /// Snapshot for serialisation together with legs and a timestamp
    pub fn report(&self, instance: &RouteInstance, speed_kmh: f64) -> RouteReport {
        RouteReport {
            instance: instance.name.clone(),
            generated_at: Utc::now(),
            stop_ids: self.order.iter().map(|&s| instance.stops[s].id.clone()).collect(),
            legs: self.legs(instance, speed_kmh),
            route: self.clone(),
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Route ({})", self.algorithm)?;
        writeln!(f, "  Distance: {:.2} km", self.distance_km)?;
        writeln!(f, "  Closed: {}", self.closed)?;
        writeln!(f, "  Complete: {}", self.complete)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Order: {:?}", self.order)
    }
}

/// One leg of a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub cumulative_km: f64,
    /// Minutes after departure at which `to` is reached
    pub arrival_minute: f64,
}

/// Serialisable output of a solve run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteReport {
    pub instance: String,
    pub generated_at: DateTime<Utc>,
    pub stop_ids: Vec<String>,
    pub legs: Vec<Leg>,
    pub route: Route,
}

fn is_legal_relocation(n: usize, start: usize, len: usize, after: usize) -> bool {
    if len == 0 || start == 0 || start + len > n || after >= n {
        return false;
    }
    // Target inside the segment or the stop right before it is a no-op.
    !(after + 1 >= start && after < start + len)
}

fn relocate_in_place(order: &mut Vec<usize>, start: usize, len: usize, after: usize) -> bool {
    if !is_legal_relocation(order.len(), start, len, after) {
        return false;
    }

    let segment: Vec<usize> = order.drain(start..start + len).collect();
    let insert_at = if after > start { after + 1 - len } else { after + 1 };
    for (k, stop) in segment.into_iter().enumerate() {
        order.insert(insert_at + k, stop);
    }
    true
}
