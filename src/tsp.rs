//! Nearest-neighbor TSP ordering over a small set of geographic stops.
//!
//! The solver precomputes the pairwise haversine matrix and then builds a
//! visiting order greedily: from the current stop, always move to the
//! closest stop that has not been visited yet.
//!
//! ```
//! use delivery_route_solver::geo::GeoPoint;
//! use delivery_route_solver::tsp::TspSolver;
//!
//! let solver = TspSolver::new(vec![
//!     GeoPoint::new(-23.55, -46.63),
//!     GeoPoint::new(-23.50, -46.60),
//!     GeoPoint::new(-23.56, -46.64),
//! ]).unwrap();
//!
//! assert_eq!(solver.solve(), vec![0, 2, 1]);
//! ```

use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use rayon::prelude::*;

/// Haversine distance matrix in kilometres. Row `i` holds distances from
/// point `i`; the diagonal is zero.
pub fn compute_distance_matrix(points: &[GeoPoint]) -> Vec<Vec<f64>> {
    points
        .par_iter()
        .enumerate()
        .map(|(i, a)| {
            points
                .iter()
                .enumerate()
                .map(|(j, b)| if i == j { 0.0 } else { a.haversine_km(b) })
                .collect()
        })
        .collect()
}

/// Greedy nearest-unvisited order starting at `start`.
///
/// Ties go to the lowest index. `start` must be a valid row of `matrix`.
pub fn nearest_neighbor_order(matrix: &[Vec<f64>], start: usize) -> Vec<usize> {
    let n = matrix.len();
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];

    let mut current = start;
    visited[current] = true;
    order.push(current);

    while order.len() < n {
        let mut best: Option<(usize, f64)> = None;
        for (j, &d) in matrix[current].iter().enumerate() {
            if visited[j] {
                continue;
            }
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((j, d));
            }
        }

        match best {
            Some((next, _)) => {
                visited[next] = true;
                order.push(next);
                current = next;
            }
            None => break,
        }
    }

    order
}

/// Sum of consecutive leg distances, plus the leg back to `order[0]` when
/// `closed` is set.
pub fn order_length(matrix: &[Vec<f64>], order: &[usize], closed: bool) -> f64 {
    if order.len() < 2 {
        return 0.0;
    }

    let mut length: f64 = order.windows(2).map(|w| matrix[w[0]][w[1]]).sum();
    if closed {
        length += matrix[order[order.len() - 1]][order[0]];
    }
    length
}

/// Orders delivery stops with the nearest-neighbor heuristic.
#[derive(Debug, Clone)]
pub struct TspSolver {
    points: Vec<GeoPoint>,
    matrix: Vec<Vec<f64>>,
}

impl TspSolver {
    /// Build a solver over `points`; the first point is the origin.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self> {
        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(Error::InvalidCoordinate {
                stop: i.to_string(),
                lat: p.lat,
                lng: p.lng,
            });
        }

        let matrix = compute_distance_matrix(&points);
        Ok(TspSolver { points, matrix })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn distance_matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.matrix[i][j]
    }

    /// Visiting order starting from the origin (index 0).
    pub fn solve(&self) -> Vec<usize> {
        if self.points.is_empty() {
            return Vec::new();
        }
        nearest_neighbor_order(&self.matrix, 0)
    }

    /// Visiting order starting from `start`.
    pub fn solve_from(&self, start: usize) -> Result<Vec<usize>> {
        if start >= self.points.len() {
            return Err(Error::invalid_input(format!(
                "start index {} out of range for {} points",
                start,
                self.points.len()
            )));
        }
        Ok(nearest_neighbor_order(&self.matrix, start))
    }

    pub fn total_distance(&self, order: &[usize], closed: bool) -> f64 {
        order_length(&self.matrix, order, closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> Vec<GeoPoint> {
        // Points along the equator at 0, 3, 1, 2 degrees of longitude.
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
        ]
    }

    #[test]
    fn test_empty_and_single() {
        let empty = TspSolver::new(Vec::new()).unwrap();
        assert!(empty.solve().is_empty());
        assert!(empty.distance_matrix().is_empty());

        let single = TspSolver::new(vec![GeoPoint::new(-23.5, -46.6)]).unwrap();
        assert_eq!(single.solve(), vec![0]);
        assert_eq!(single.total_distance(&[0], true), 0.0);
    }

    #[test]
    fn test_nearest_neighbor_walks_the_line() {
        let solver = TspSolver::new(line_points()).unwrap();
        assert_eq!(solver.solve(), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_matrix_is_symmetric_with_zero_diagonal() {
        let solver = TspSolver::new(line_points()).unwrap();
        let m = solver.distance_matrix();
        for i in 0..m.len() {
            assert_eq!(m[i][i], 0.0);
            for j in 0..m.len() {
                assert!((m[i][j] - m[j][i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, -1.0),
        ];
        let solver = TspSolver::new(points).unwrap();
        assert_eq!(solver.solve()[1], 1);
    }

    #[test]
    fn test_duplicate_points_are_consecutive() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 5.0),
            GeoPoint::new(0.0, 2.0),
        ];
        let solver = TspSolver::new(points).unwrap();
        assert_eq!(solver.solve(), vec![0, 1, 3, 2]);
    }

    #[test]
    fn test_order_is_a_permutation() {
        let points: Vec<GeoPoint> = (0..12)
            .map(|i| GeoPoint::new(-23.0 - (i as f64 * 0.37) % 1.0, -46.0 - (i as f64 * 0.53) % 1.0))
            .collect();
        let solver = TspSolver::new(points).unwrap();
        let mut order = solver.solve();
        assert_eq!(order[0], 0);
        order.sort_unstable();
        assert_eq!(order, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_solve_from() {
        let solver = TspSolver::new(line_points()).unwrap();
        assert_eq!(solver.solve_from(1).unwrap(), vec![1, 3, 2, 0]);
        assert!(solver.solve_from(4).is_err());
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let result = TspSolver::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(120.0, 0.0)]);
        assert!(matches!(result, Err(Error::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_total_distance_open_and_closed() {
        let solver = TspSolver::new(line_points()).unwrap();
        let order = solver.solve();
        let one_degree = crate::geo::EARTH_RADIUS_KM * 1.0_f64.to_radians();

        let open = solver.total_distance(&order, false);
        let closed = solver.total_distance(&order, true);

        assert!((open - 3.0 * one_degree).abs() < 1e-6);
        assert!((closed - 6.0 * one_degree).abs() < 1e-6);
    }
}
