//! Delivery Route Solver Library
//!
//! Orders a handful of delivery stops for a single vehicle leaving a
//! warehouse. Distances are haversine great-circle distances; the core
//! ordering is the nearest-neighbor TSP heuristic, optionally polished by
//! local search.
//!
//! # Features
//!
//! - Haversine distance matrix over lat/lng stops
//! - Nearest neighbor construction (deterministic, randomized, multi-start)
//! - Local search (2-opt, Or-opt, VND)
//! - Leg-by-leg distances and estimated arrival times
//! - Algorithm comparison with CSV export
//!
//! # Example
//!
//! ```no_run
//! use delivery_route_solver::instance::RouteInstance;
//! use delivery_route_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
//! use delivery_route_solver::heuristics::local_search::{LocalSearch, Vnd};
//!
//! let instance = RouteInstance::from_file("stops.json").unwrap();
//!
//! let mut route = NearestNeighborHeuristic::new().construct(&instance);
//! Vnd::with_standard_operators().improve(&instance, &mut route);
//!
//! println!("Route length: {:.2} km", route.distance_km);
//! ```

pub mod compare;
pub mod config;
pub mod error;
pub mod geo;
pub mod heuristics;
pub mod instance;
pub mod planner;
pub mod solution;
pub mod tsp;

pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use instance::{RouteInstance, Stop};
pub use solution::Route;
pub use tsp::TspSolver;
