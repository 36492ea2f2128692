//! Runs the configured algorithm against an instance.

use crate::config::{AlgorithmKind, SolverConfig};
use crate::heuristics::construction::{ConstructionHeuristic, MultiStartConstruction, NearestNeighborHeuristic};
use crate::heuristics::local_search::{LocalSearch, TwoOptSearch, Vnd};
use crate::instance::RouteInstance;
use crate::solution::Route;
use std::time::Instant;

pub struct RoutePlanner {
    config: SolverConfig,
}

impl RoutePlanner {
    pub fn new(config: SolverConfig) -> Self {
        RoutePlanner { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Plan a route with the configured algorithm.
    ///
    /// A closed route requested by either the instance or the
    /// configuration is kept closed.
    pub fn plan(&self, instance: &mut RouteInstance) -> Route {
        instance.closed_route |= self.config.closed_route;
        self.run(self.config.algorithm, instance, self.config.seed)
    }

    /// Run `kind` with an explicit seed, leaving the instance untouched.
    pub fn run(&self, kind: AlgorithmKind, instance: &RouteInstance, seed: u64) -> Route {
        let start = Instant::now();
        log::info!(
            "Planning {} ({} stops, closed={}) with {}",
            instance.name,
            instance.len(),
            instance.closed_route,
            kind.label()
        );

        let mut route = match kind {
            AlgorithmKind::NearestNeighbor => NearestNeighborHeuristic::new().construct(instance),
            AlgorithmKind::NearestNeighborRandom => NearestNeighborHeuristic::randomized(seed)
                .with_candidate_pool(self.config.candidate_pool)
                .construct(instance),
            AlgorithmKind::MultiStart => self.multi_start(seed).construct(instance),
            AlgorithmKind::TwoOpt => {
                let mut route = self.multi_start(seed).construct(instance);
                TwoOptSearch::new().improve(instance, &mut route);
                route
            }
            AlgorithmKind::Vnd => {
                let mut route = self.multi_start(seed).construct(instance);
                Vnd::with_standard_operators().improve(instance, &mut route);
                route
            }
        };

        route.algorithm = kind.label().to_string();
        route.computation_time = start.elapsed().as_secs_f64();
        log::info!(
            "{}: {:.3} km in {:.4}s",
            route.algorithm,
            route.distance_km,
            route.computation_time
        );
        route
    }

    fn multi_start(&self, seed: u64) -> MultiStartConstruction {
        MultiStartConstruction::with_randomized_runs(seed, self.config.multi_start_runs, self.config.candidate_pool)
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Stop;

    fn instance() -> RouteInstance {
        let coords = [
            (-22.9068, -43.1729),
            (-22.9519, -43.2105),
            (-22.9711, -43.1822),
            (-22.9035, -43.2096),
            (-22.9249, -43.2311),
            (-22.8850, -43.1150),
            (-22.9838, -43.2044),
        ];
        let stops = coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| Stop::new(format!("rj-{}", i), "", lat, lng))
            .collect();
        RouteInstance::new("rio", stops).unwrap()
    }

    #[test]
    fn test_plan_sets_closed_flag() {
        let mut inst = instance();
        let planner = RoutePlanner::new(SolverConfig {
            closed_route: true,
            ..Default::default()
        });
        let route = planner.plan(&mut inst);
        assert!(inst.closed_route);
        assert!(route.closed);
        assert!(route.complete);
        assert_eq!(route.algorithm, "NearestNeighbor");
    }

    #[test]
    fn test_plan_keeps_closed_flag_from_instance_json() {
        let text = r#"{
            "closed_route": true,
            "stops": [
                { "lat": -22.9068, "lng": -43.1729 },
                { "lat": -22.9519, "lng": -43.2105 },
                { "lat": -22.9711, "lng": -43.1822 }
            ]
        }"#;
        let mut inst = RouteInstance::from_json_str(text).unwrap();
        let route = RoutePlanner::default().plan(&mut inst);

        assert!(inst.closed_route);
        assert!(route.closed);
        let open = inst.route_length(&route.order, false);
        let back = inst.distance(route.order[route.order.len() - 1], 0);
        assert!((route.distance_km - (open + back)).abs() < 1e-9);
        assert!(route.distance_km > open);
    }

    #[test]
    fn test_improving_algorithms_are_not_worse() {
        let inst = instance();
        let planner = RoutePlanner::default();
        let nn = planner.run(AlgorithmKind::NearestNeighbor, &inst, 0);
        let multi = planner.run(AlgorithmKind::MultiStart, &inst, 0);
        let two_opt = planner.run(AlgorithmKind::TwoOpt, &inst, 0);
        let vnd = planner.run(AlgorithmKind::Vnd, &inst, 0);

        assert!(multi.distance_km <= nn.distance_km + 1e-9);
        assert!(two_opt.distance_km <= multi.distance_km + 1e-9);
        assert!(vnd.distance_km <= multi.distance_km + 1e-9);
        for route in [&nn, &multi, &two_opt, &vnd] {
            assert!(route.complete);
        }
    }

    #[test]
    fn test_sample_data_plans() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_stops.json");
        let mut inst = RouteInstance::from_file(path).unwrap();
        assert_eq!(inst.stops[0].id, "cd");

        let planner = RoutePlanner::new(SolverConfig {
            algorithm: AlgorithmKind::Vnd,
            ..Default::default()
        });
        let route = planner.plan(&mut inst);
        assert!(route.complete);
        assert_eq!(route.order[0], 0);
        assert_eq!(route.legs(&inst, 30.0).len(), inst.len() - 1);
    }
}
