//! Module for loading and representing delivery route instances.
//!
//! An instance is a named list of stops. The first stop is the origin
//! (the warehouse) where every route starts; the remaining stops are
//! deliveries. Stop lists are read from JSON.

use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::tsp::{compute_distance_matrix, order_length};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single stop on a delivery route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    /// Stop identifier (defaults to the position in the input list)
    pub id: String,
    /// Human readable label, usually the customer or address
    pub label: String,
    /// Coordinates of the stop, written as top-level `lat`/`lng`
    #[serde(flatten)]
    pub point: GeoPoint,
    /// Brazilian postal code, kept as metadata only
    pub cep: Option<String>,
    /// Time spent at the stop, in minutes
    pub service_minutes: f64,
}

impl Stop {
    pub fn new(id: impl Into<String>, label: impl Into<String>, lat: f64, lng: f64) -> Self {
        Stop {
            id: id.into(),
            label: label.into(),
            point: GeoPoint::new(lat, lng),
            cep: None,
            service_minutes: 0.0,
        }
    }

    pub fn with_cep(mut self, cep: impl Into<String>) -> Self {
        self.cep = Some(cep.into());
        self
    }

    pub fn with_service_minutes(mut self, minutes: f64) -> Self {
        self.service_minutes = minutes;
        self
    }
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    id: Option<String>,
    #[serde(default)]
    label: String,
    lat: f64,
    lng: f64,
    cep: Option<String>,
    #[serde(default)]
    service_minutes: f64,
}

#[derive(Debug, Deserialize)]
struct InstanceFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    closed_route: bool,
    stops: Vec<StopRecord>,
}

impl TryFrom<InstanceFile> for RouteInstance {
    type Error = Error;

    fn try_from(file: InstanceFile) -> Result<Self> {
        let stops = file
            .stops
            .into_iter()
            .enumerate()
            .map(|(i, r)| Stop {
                id: r.id.unwrap_or_else(|| i.to_string()),
                label: r.label,
                point: GeoPoint::new(r.lat, r.lng),
                cep: r.cep,
                service_minutes: r.service_minutes,
            })
            .collect();

        let mut instance = RouteInstance::new(file.name, stops)?;
        instance.closed_route = file.closed_route;
        Ok(instance)
    }
}

/// A delivery route instance with its precomputed distance matrix
///
/// Deserializing goes through the same validation as [`RouteInstance::new`],
/// so the distance matrix is always rebuilt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "InstanceFile")]
pub struct RouteInstance {
    /// Name of the instance
    pub name: String,
    /// Stops, origin first
    pub stops: Vec<Stop>,
    /// Haversine distances in kilometres
    #[serde(skip)]
    pub distance_matrix: Vec<Vec<f64>>,
    /// Whether routes return to the origin after the last delivery
    pub closed_route: bool,
}

impl RouteInstance {
    /// Build an instance, validating every coordinate.
    pub fn new(name: impl Into<String>, stops: Vec<Stop>) -> Result<Self> {
        for stop in &stops {
            if !stop.point.is_valid() {
                return Err(Error::InvalidCoordinate {
                    stop: stop.id.clone(),
                    lat: stop.point.lat,
                    lng: stop.point.lng,
                });
            }
            if !stop.service_minutes.is_finite() || stop.service_minutes < 0.0 {
                return Err(Error::invalid_input(format!(
                    "stop {} has invalid service time {}",
                    stop.id, stop.service_minutes
                )));
            }
        }

        let points: Vec<GeoPoint> = stops.iter().map(|s| s.point).collect();
        let distance_matrix = compute_distance_matrix(&points);

        Ok(RouteInstance {
            name: name.into(),
            stops,
            distance_matrix,
            closed_route: false,
        })
    }

    /// Parse an instance from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)?;
        let mut instance = Self::from_json_str(&text)?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    /// Parse an instance from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: InstanceFile = serde_json::from_str(text)?;
        file.try_into()
    }

    /// Get the distance between two stops in kilometres
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Number of stops including the origin
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.stops.iter().map(|s| s.point).collect()
    }

    /// Length of a visiting order in kilometres
    pub fn route_length(&self, order: &[usize], closed: bool) -> f64 {
        order_length(&self.distance_matrix, order, closed)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.len();
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                distances.push(self.distance(i, j));
            }
        }

        let (avg_distance, min_distance, max_distance) = if distances.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                distances.iter().sum::<f64>() / distances.len() as f64,
                distances.iter().cloned().fold(f64::INFINITY, f64::min),
                distances.iter().cloned().fold(0.0, f64::max),
            )
        };

        let farthest_from_origin = (1..n)
            .map(|j| (j, self.distance(0, j)))
            .fold(None, |best: Option<(usize, f64)>, (j, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((j, d)),
            })
            .map(|(j, d)| (self.stops[j].id.clone(), d));

        InstanceStatistics {
            name: self.name.clone(),
            num_stops: n,
            avg_distance,
            min_distance,
            max_distance,
            farthest_from_origin,
            total_service_minutes: self.stops.iter().map(|s| s.service_minutes).sum(),
        }
    }
}

/// Statistics about a route instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_stops: usize,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub farthest_from_origin: Option<(String, f64)>,
    pub total_service_minutes: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(
            f,
            "  Stops: {} (1 origin + {} deliveries)",
            self.num_stops,
            self.num_stops.saturating_sub(1)
        )?;
        writeln!(f, "  Avg distance: {:.2} km", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2} km", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2} km", self.max_distance)?;
        if let Some((id, d)) = &self.farthest_from_origin {
            writeln!(f, "  Farthest from origin: {} ({:.2} km)", id, d)?;
        }
        writeln!(f, "  Total service time: {:.0} min", self.total_service_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "zona-sul",
        "stops": [
            { "id": "cd", "label": "Distribution centre", "lat": -23.6500, "lng": -46.7000 },
            { "label": "Cliente A", "lat": -23.6000, "lng": -46.6800, "cep": "04571-010", "service_minutes": 15 },
            { "id": "b", "label": "Cliente B", "lat": -23.7000, "lng": -46.7200 }
        ]
    }"#;

    #[test]
    fn test_parse_json() {
        let instance = RouteInstance::from_json_str(SAMPLE).unwrap();
        assert_eq!(instance.name, "zona-sul");
        assert_eq!(instance.len(), 3);
        assert_eq!(instance.stops[0].id, "cd");
        assert_eq!(instance.stops[1].id, "1");
        assert_eq!(instance.stops[1].cep.as_deref(), Some("04571-010"));
        assert_eq!(instance.stops[1].service_minutes, 15.0);
        assert_eq!(instance.stops[2].service_minutes, 0.0);
        assert_eq!(instance.distance_matrix.len(), 3);
        assert!(!instance.closed_route);
    }

    #[test]
    fn test_parse_closed_route_flag() {
        let text = r#"{ "closed_route": true, "stops": [ { "lat": 0.0, "lng": 0.0 } ] }"#;
        let instance = RouteInstance::from_json_str(text).unwrap();
        assert!(instance.closed_route);
        assert_eq!(instance.stops[0].id, "0");
    }

    #[test]
    fn test_serialized_instance_reloads() {
        let mut instance = RouteInstance::from_json_str(SAMPLE).unwrap();
        instance.closed_route = true;

        let json = serde_json::to_string(&instance).unwrap();
        let reloaded: RouteInstance = serde_json::from_str(&json).unwrap();

        assert_eq!(reloaded.name, "zona-sul");
        assert!(reloaded.closed_route);
        assert_eq!(reloaded.stops[1].cep.as_deref(), Some("04571-010"));
        assert_eq!(reloaded.distance_matrix.len(), 3);
        assert!((reloaded.distance(0, 1) - instance.distance(0, 1)).abs() < 1e-12);
        assert!(reloaded.distance(0, 1) > 0.0);
    }

    #[test]
    fn test_deserialize_rejects_invalid_coordinate() {
        let text = r#"{ "stops": [ { "lat": 0.0, "lng": 0.0 }, { "id": "x", "lat": 95.0, "lng": 0.0 } ] }"#;
        assert!(serde_json::from_str::<RouteInstance>(text).is_err());
        assert!(matches!(
            RouteInstance::from_json_str(text),
            Err(Error::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_invalid_coordinate() {
        let stops = vec![Stop::new("0", "origin", 0.0, 0.0), Stop::new("x", "bad", 0.0, 200.0)];
        match RouteInstance::new("bad", stops) {
            Err(Error::InvalidCoordinate { stop, .. }) => assert_eq!(stop, "x"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_negative_service_time_rejected() {
        let stops = vec![Stop::new("0", "origin", 0.0, 0.0).with_service_minutes(-1.0)];
        assert!(RouteInstance::new("bad", stops).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RouteInstance::from_json_str("{ \"stops\": [ { \"lat\": 1.0 } ] }"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_statistics() {
        let instance = RouteInstance::from_json_str(SAMPLE).unwrap();
        let stats = instance.statistics();
        assert_eq!(stats.num_stops, 3);
        assert!(stats.min_distance <= stats.avg_distance);
        assert!(stats.avg_distance <= stats.max_distance);
        assert_eq!(stats.total_service_minutes, 15.0);
        assert!(stats.farthest_from_origin.is_some());
        assert!(stats.to_string().contains("zona-sul"));
    }

    #[test]
    fn test_statistics_empty() {
        let instance = RouteInstance::new("empty", Vec::new()).unwrap();
        let stats = instance.statistics();
        assert_eq!(stats.num_stops, 0);
        assert_eq!(stats.avg_distance, 0.0);
        assert!(stats.farthest_from_origin.is_none());
    }
}
