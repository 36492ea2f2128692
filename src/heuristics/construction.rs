use crate::instance::RouteInstance;
use crate::solution::Route;
use crate::tsp::nearest_neighbor_order;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &RouteInstance) -> Route;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Builds a route by repeatedly visiting the nearest unvisited stop,
/// starting from the origin. The randomized variant picks uniformly among
/// the `candidate_pool` closest unvisited stops instead.
pub struct NearestNeighborHeuristic {
    pub randomized: bool,
    pub seed: u64,
    pub candidate_pool: usize,
}

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic {
            randomized: false,
            seed: 42,
            candidate_pool: 3,
        }
    }

    pub fn randomized(seed: u64) -> Self {
        NearestNeighborHeuristic {
            randomized: true,
            seed,
            candidate_pool: 3,
        }
    }

    pub fn with_candidate_pool(mut self, k: usize) -> Self {
        self.candidate_pool = k.max(1);
        self
    }

    fn randomized_order(&self, instance: &RouteInstance, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let n = instance.len();
        let mut order = vec![0];
        let mut visited = vec![false; n];
        visited[0] = true;
        let mut current = 0;

        while order.len() < n {
            let mut candidates: Vec<(usize, f64)> = (0..n)
                .filter(|&s| !visited[s])
                .map(|s| (s, instance.distance(current, s)))
                .collect();

            // Stable sort keeps the lowest index first among equal distances.
            candidates.sort_by_key(|&(_, d)| OrderedFloat(d));

            let top_k = candidates.len().min(self.candidate_pool);
            let next = candidates[rng.gen_range(0..top_k)].0;

            visited[next] = true;
            order.push(next);
            current = next;
        }

        order
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, instance: &RouteInstance) -> Route {
        let start = std::time::Instant::now();

        let order = if instance.is_empty() {
            Vec::new()
        } else if self.randomized {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            self.randomized_order(instance, &mut rng)
        } else {
            nearest_neighbor_order(&instance.distance_matrix, 0)
        };

        let mut route = Route::from_order(instance, order, self.name());
        route.computation_time = start.elapsed().as_secs_f64();
        log::debug!("{}: {:.3} km over {} stops", self.name(), route.distance_km, instance.len());
        route
    }

    fn name(&self) -> &str {
        if self.randomized {
            "NearestNeighbor-Randomized"
        } else {
            "NearestNeighbor"
        }
    }
}

/// Multi-start construction
///
/// Runs several construction heuristics in parallel and keeps the
/// shortest complete route.
pub struct MultiStartConstruction {
    heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>>,
}

impl MultiStartConstruction {
    pub fn new() -> Self {
        MultiStartConstruction {
            heuristics: Vec::new(),
        }
    }

    /// Deterministic nearest neighbor plus `runs` randomized seeds
    /// derived from `seed`.
    pub fn with_randomized_runs(seed: u64, runs: usize, candidate_pool: usize) -> Self {
        let mut multi = Self::new();
        multi.add_heuristic(NearestNeighborHeuristic::new());
        for r in 0..runs as u64 {
            multi.add_heuristic(
                NearestNeighborHeuristic::randomized(seed.wrapping_add(r)).with_candidate_pool(candidate_pool),
            );
        }
        multi
    }

    pub fn add_heuristic<H: ConstructionHeuristic + Send + Sync + 'static>(&mut self, h: H) {
        self.heuristics.push(Box::new(h));
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }
}

impl Default for MultiStartConstruction {
    fn default() -> Self {
        Self::with_randomized_runs(42, 8, 3)
    }
}

impl ConstructionHeuristic for MultiStartConstruction {
    fn construct(&self, instance: &RouteInstance) -> Route {
        let start = std::time::Instant::now();

        // min_by_key keeps the first of equal routes, so the deterministic
        // start wins ties and results stay reproducible.
        let best = self
            .heuristics
            .par_iter()
            .map(|h| h.construct(instance))
            .filter(|r| r.complete)
            .collect::<Vec<_>>()
            .into_iter()
            .min_by_key(|r| OrderedFloat(r.distance_km));

        let mut route = best.unwrap_or_else(|| NearestNeighborHeuristic::new().construct(instance));
        route.algorithm = self.name().to_string();
        route.computation_time = start.elapsed().as_secs_f64();
        route
    }

    fn name(&self) -> &str {
        "MultiStart"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Stop;
    use crate::tsp::TspSolver;

    fn city_instance() -> RouteInstance {
        let coords = [
            (-23.5505, -46.6333),
            (-23.5614, -46.6559),
            (-23.5329, -46.6395),
            (-23.5874, -46.6576),
            (-23.5431, -46.6291),
            (-23.6000, -46.6700),
            (-23.5200, -46.6100),
            (-23.5700, -46.6400),
        ];
        let stops = coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| Stop::new(i.to_string(), format!("stop {}", i), lat, lng))
            .collect();
        RouteInstance::new("sp", stops).unwrap()
    }

    #[test]
    fn test_nearest_neighbor_matches_solver() {
        let instance = city_instance();
        let route = NearestNeighborHeuristic::new().construct(&instance);
        let solver = TspSolver::new(instance.points()).unwrap();

        assert!(route.complete);
        assert_eq!(route.order, solver.solve());
        assert_eq!(route.algorithm, "NearestNeighbor");
    }

    #[test]
    fn test_randomized_is_reproducible_and_complete() {
        let instance = city_instance();
        let a = NearestNeighborHeuristic::randomized(7).construct(&instance);
        let b = NearestNeighborHeuristic::randomized(7).construct(&instance);

        assert!(a.complete);
        assert_eq!(a.order, b.order);
        assert_eq!(a.order[0], 0);
    }

    #[test]
    fn test_pool_of_one_is_deterministic() {
        let instance = city_instance();
        let random = NearestNeighborHeuristic::randomized(3).with_candidate_pool(1).construct(&instance);
        let plain = NearestNeighborHeuristic::new().construct(&instance);
        assert_eq!(random.order, plain.order);
    }

    #[test]
    fn test_multi_start_never_worse_than_nearest_neighbor() {
        let instance = city_instance();
        let nn = NearestNeighborHeuristic::new().construct(&instance);
        let multi = MultiStartConstruction::with_randomized_runs(1, 16, 3).construct(&instance);

        assert!(multi.complete);
        assert!(multi.distance_km <= nn.distance_km + 1e-9);
        assert_eq!(multi.algorithm, "MultiStart");
    }

    #[test]
    fn test_empty_instance() {
        let instance = RouteInstance::new("empty", Vec::new()).unwrap();
        let route = NearestNeighborHeuristic::randomized(1).construct(&instance);
        assert!(route.order.is_empty());
        assert!(route.complete);
        assert_eq!(route.distance_km, 0.0);
    }
}
