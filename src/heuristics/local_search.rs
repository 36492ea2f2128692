//! Local search improvement heuristics for delivery routes.
//!
//! This module implements:
//! - 2-opt (segment reversal)
//! - Or-opt (relocation of segments of 1 to 3 consecutive stops)
//! - Variable Neighborhood Descent over both
//!
//! The origin at position 0 is never moved, and a move is only applied
//! when it shortens the route.

use crate::instance::RouteInstance;
use crate::solution::Route;

const EPSILON: f64 = 1e-9;

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &RouteInstance, route: &mut Route) -> bool;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// Reverses segments of the route to reduce total distance.
pub struct TwoOptSearch {
    /// Use first improvement instead of best improvement
    pub first_improvement: bool,
    /// Upper bound on improving passes
    pub max_iterations: usize,
}

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch {
            first_improvement: false,
            max_iterations: 1_000,
        }
    }

    pub fn first_improvement() -> Self {
        TwoOptSearch {
            first_improvement: true,
            max_iterations: 1_000,
        }
    }

    fn find_move(&self, instance: &RouteInstance, route: &Route) -> Option<(usize, usize, f64)> {
        let n = route.order.len();
        let mut best: Option<(usize, usize, f64)> = None;

        for i in 0..n.saturating_sub(2) {
            for j in i + 2..n {
                let delta = route.two_opt_delta(instance, i, j);
                if delta >= -EPSILON {
                    continue;
                }
                if self.first_improvement {
                    return Some((i, j, delta));
                }
                if best.map_or(true, |(_, _, d)| delta < d) {
                    best = Some((i, j, delta));
                }
            }
        }

        best
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, instance: &RouteInstance, route: &mut Route) -> bool {
        if route.order.len() < 4 {
            return false;
        }

        let mut iterations = 0;
        while iterations < self.max_iterations {
            match self.find_move(instance, route) {
                Some((i, j, delta)) => {
                    log::debug!("2-opt reverse {}..={} saves {:.4} km", i + 1, j, -delta);
                    route.apply_two_opt(i, j);
                    route.distance_km += delta;
                    iterations += 1;
                }
                None => break,
            }
        }

        route.validate(instance);
        route.iterations = Some(route.iterations.unwrap_or(0) + iterations);
        iterations > 0
    }

    fn name(&self) -> &str {
        if self.first_improvement {
            "2-Opt-FI"
        } else {
            "2-Opt-BI"
        }
    }
}

/// Or-Opt Local Search
///
/// Relocates segments of 1, 2, or 3 consecutive stops to other positions.
pub struct OrOptSearch {
    /// Maximum segment length to consider
    pub max_segment_length: usize,
    /// Upper bound on improving passes
    pub max_iterations: usize,
}

impl OrOptSearch {
    pub fn new() -> Self {
        OrOptSearch {
            max_segment_length: 3,
            max_iterations: 1_000,
        }
    }

    fn find_move(&self, instance: &RouteInstance, route: &Route) -> Option<(usize, usize, usize, f64)> {
        let n = route.order.len();
        let mut best: Option<(usize, usize, usize, f64)> = None;

        for len in 1..=self.max_segment_length {
            for start in 1..n {
                if start + len > n {
                    break;
                }
                for after in 0..n {
                    let delta = route.relocate_delta(instance, start, len, after);
                    if delta < -EPSILON && best.map_or(true, |(_, _, _, d)| delta < d) {
                        best = Some((start, len, after, delta));
                    }
                }
            }
        }

        best
    }
}

impl Default for OrOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for OrOptSearch {
    fn improve(&self, instance: &RouteInstance, route: &mut Route) -> bool {
        if route.order.len() < 3 {
            return false;
        }

        let mut iterations = 0;
        while iterations < self.max_iterations {
            match self.find_move(instance, route) {
                Some((start, len, after, delta)) => {
                    log::debug!("or-opt move {}+{} after {} saves {:.4} km", start, len, after, -delta);
                    route.apply_relocate(start, len, after);
                    iterations += 1;
                }
                None => break,
            }
        }

        route.validate(instance);
        route.iterations = Some(route.iterations.unwrap_or(0) + iterations);
        iterations > 0
    }

    fn name(&self) -> &str {
        "Or-Opt"
    }
}

/// Variable Neighborhood Descent
///
/// Cycles through the operators, restarting from the first one whenever
/// any of them improves the route.
pub struct Vnd {
    operators: Vec<Box<dyn LocalSearch + Send + Sync>>,
}

impl Vnd {
    pub fn new(operators: Vec<Box<dyn LocalSearch + Send + Sync>>) -> Self {
        Vnd { operators }
    }

    pub fn with_standard_operators() -> Self {
        let operators: Vec<Box<dyn LocalSearch + Send + Sync>> =
            vec![Box::new(TwoOptSearch::new()), Box::new(OrOptSearch::new())];
        Self::new(operators)
    }
}

impl Default for Vnd {
    fn default() -> Self {
        Self::with_standard_operators()
    }
}

impl LocalSearch for Vnd {
    fn improve(&self, instance: &RouteInstance, route: &mut Route) -> bool {
        let mut improved_any = false;
        let mut k = 0;

        while k < self.operators.len() {
            if self.operators[k].improve(instance, route) {
                improved_any = true;
                k = 0;
            } else {
                k += 1;
            }
        }

        improved_any
    }

    fn name(&self) -> &str {
        "VND"
    }
}
