//! Engine configuration
//!
//! The only tunable input besides the snapshot is the route speed table, which
//! maps a day's route type to an average driving speed. Unknown route types
//! fall back to the default speed.

use crate::error::MetricsError;
use crate::types::Day;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Speed used for route types missing from the table (km/h)
pub const DEFAULT_SPEED_KMH: f64 = 80.0;

/// Built-in route types and their average speed (km/h)
///
/// The names are the values trip snapshots store in `routeType`.
pub const ROUTE_TYPES: &[(&str, f64)] = &[
    ("Strada statale", 80.0),
    ("Strada ad alta percorrenza", 110.0),
    ("Strada con molte curve", 50.0),
    ("Strada di campagna", 60.0),
    ("Strada di montagna", 40.0),
];

/// English names accepted alongside the built-in route types
pub const ROUTE_ALIASES: &[(&str, f64)] = &[
    ("State road", 80.0),
    ("Highway", 110.0),
    ("Winding road", 50.0),
    ("Country road", 60.0),
    ("Mountain road", 40.0),
];

/// Configuration for metric computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Route type name to average speed (km/h)
    pub route_speeds: BTreeMap<String, f64>,
    /// Speed for unknown route types (km/h)
    pub default_speed_kmh: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            route_speeds: ROUTE_TYPES
                .iter()
                .chain(ROUTE_ALIASES)
                .map(|(name, speed)| (name.to_string(), *speed))
                .collect(),
            default_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl MetricsConfig {
    /// Add or replace a route type
    pub fn with_route_speed(mut self, route_type: impl Into<String>, speed_kmh: f64) -> Self {
        self.route_speeds.insert(route_type.into(), speed_kmh);
        self
    }

    /// Whether a route type is in the table, ignoring surrounding whitespace
    pub fn is_known_route(&self, route_type: &str) -> bool {
        self.route_speeds.contains_key(route_type.trim())
    }

    /// Average speed for a route type, ignoring surrounding whitespace
    pub fn speed_for(&self, route_type: &str) -> f64 {
        self.route_speeds
            .get(route_type.trim())
            .copied()
            .unwrap_or(self.default_speed_kmh)
    }

    /// Driving time for a day in hours; days on a zero-speed route contribute nothing
    pub fn driving_hours(&self, day: &Day) -> f64 {
        let speed = self.speed_for(&day.route_type);
        if speed > 0.0 {
            day.distance / speed
        } else {
            0.0
        }
    }

    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, MetricsError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, MetricsError> {
        serde_json::to_string_pretty(self).map_err(MetricsError::JsonError)
    }

    fn check(&self) -> Result<(), MetricsError> {
        if !self.default_speed_kmh.is_finite() || self.default_speed_kmh < 0.0 {
            return Err(MetricsError::InvalidConfig(format!(
                "default_speed_kmh must be a non-negative number, got {}",
                self.default_speed_kmh
            )));
        }
        for (route_type, speed) in &self.route_speeds {
            if !speed.is_finite() || *speed < 0.0 {
                return Err(MetricsError::InvalidConfig(format!(
                    "speed for route type '{route_type}' must be a non-negative number, got {speed}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_route_uses_default_speed() {
        let config = MetricsConfig::default();
        assert_eq!(config.speed_for("Highway"), 110.0);
        assert_eq!(config.speed_for("Ferry"), DEFAULT_SPEED_KMH);
        assert_eq!(config.speed_for(""), DEFAULT_SPEED_KMH);
    }

    #[test]
    fn test_stored_route_names() {
        let config = MetricsConfig::default();
        let day = Day::driving("d1", 110.0, "Strada ad alta percorrenza");
        assert!((config.driving_hours(&day) - 1.0).abs() < 1e-9);
        assert_eq!(config.speed_for("Strada di montagna"), 40.0);
        assert_eq!(config.speed_for("Strada con molte curve"), 50.0);

        for (name, speed) in ROUTE_ALIASES {
            assert_eq!(config.speed_for(name), *speed);
        }
        assert_eq!(
            config.route_speeds.len(),
            ROUTE_TYPES.len() + ROUTE_ALIASES.len()
        );
    }

    #[test]
    fn test_padded_route_type_matches_table() {
        let config = MetricsConfig::default();
        assert!(config.is_known_route("Highway "));
        assert!(config.is_known_route("  Strada statale"));
        assert_eq!(config.speed_for("Highway "), 110.0);

        let day = Day::driving("d1", 110.0, " Highway ");
        assert!((config.driving_hours(&day) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_speed_route_contributes_no_driving_time() {
        let config = MetricsConfig::default().with_route_speed("Ferry", 0.0);
        let day = Day::driving("d1", 120.0, "Ferry");
        assert_eq!(config.driving_hours(&day), 0.0);

        let day = Day::driving("d2", 120.0, "Country road");
        assert!((config.driving_hours(&day) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MetricsConfig::from_json(r#"{"default_speed_kmh": 70}"#).unwrap();
        assert_eq!(config.default_speed_kmh, 70.0);
        assert_eq!(config.speed_for("Mountain road"), 40.0);
    }

    #[test]
    fn test_negative_speed_rejected() {
        let result = MetricsConfig::from_json(r#"{"route_speeds": {"Highway": -5}}"#);
        assert!(matches!(result, Err(MetricsError::InvalidConfig(_))));
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = MetricsConfig::default().with_route_speed("Gravel", 30.0);
        let loaded = MetricsConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }
}
