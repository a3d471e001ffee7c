//! Pipeline orchestration
//!
//! This module provides the public API for trip-metrics.
//! It runs a trip snapshot through every stage and returns the derived metrics.

use crate::aggregator::MetricsAggregator;
use crate::charts::ChartSeriesBuilder;
use crate::config::MetricsConfig;
use crate::encoder::MetricsEncoder;
use crate::error::MetricsError;
use crate::fuel::FuelEstimator;
use crate::normalizer::{ExpenseNormalizer, ParticipantDirectory};
use crate::quality::PlanningQualityClassifier;
use crate::settlement::BalanceCalculator;
use crate::types::{DailySeries, MetricsResult, TripSnapshot};
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Compute every metric for a snapshot with the built-in route table.
///
/// # Example
/// ```ignore
/// let snapshot = parse_snapshot(json)?;
/// let metrics = compute_metrics(&snapshot);
/// println!("{}", metrics.totals.total_cost);
/// ```
pub fn compute_metrics(snapshot: &TripSnapshot) -> MetricsResult {
    compute_metrics_with(snapshot, &MetricsConfig::default())
}

/// Compute every metric for a snapshot.
///
/// Pipeline stages:
/// 1. FuelEstimator - Distance and fuel estimate
/// 2. ExpenseNormalizer - Flatten expenses and resolve payers
/// 3. MetricsAggregator - Totals and per-day series
/// 4. BalanceCalculator - Balances and settlement transactions
/// 5. PlanningQualityClassifier - Consistency, pacing and intensity
/// 6. ChartSeriesBuilder - Label/value series
pub fn compute_metrics_with(snapshot: &TripSnapshot, config: &MetricsConfig) -> MetricsResult {
    let directory = ParticipantDirectory::new(&snapshot.participants);

    // Stage 1: Fuel estimate
    let fuel = FuelEstimator::estimate(&snapshot.days, &snapshot.fuel, directory.headcount());

    // Stage 2: Normalize expenses
    let expenses = ExpenseNormalizer::new(&directory).normalize_all(snapshot, &fuel);

    // Stage 3: Aggregate
    let daily = DailySeries::collect(snapshot, &expenses, config);
    let totals = MetricsAggregator::aggregate(snapshot, directory.len(), &fuel, &expenses, &daily);

    // Stage 4: Settle
    let settlement = BalanceCalculator::calculate(&directory, &expenses);

    // Stage 5: Classify
    let planning = PlanningQualityClassifier::classify(&daily, &totals);

    // Stage 6: Charts
    let charts = ChartSeriesBuilder::build(&totals, &daily, &directory, &expenses);

    tracing::debug!(
        participants = totals.participant_count,
        days = totals.day_count,
        expenses = expenses.len(),
        total_cost = totals.total_cost,
        "computed trip metrics"
    );

    MetricsResult {
        fuel,
        totals,
        expenses,
        settlement,
        planning,
        charts,
    }
}

/// Parse a snapshot from its JSON form
pub fn parse_snapshot(json: &str) -> Result<TripSnapshot, MetricsError> {
    serde_json::from_str(json).map_err(|e| MetricsError::ParseError(e.to_string()))
}

/// Convert a snapshot JSON document into a metrics JSON document.
///
/// # Arguments
/// * `snapshot_json` - Trip snapshot in camelCase JSON
///
/// # Returns
/// The serialized `MetricsResult`
pub fn snapshot_json_to_metrics(snapshot_json: String) -> Result<String, MetricsError> {
    let snapshot = parse_snapshot(&snapshot_json)?;
    let metrics = compute_metrics(&snapshot);
    serde_json::to_string(&metrics).map_err(MetricsError::JsonError)
}

/// XxHash64 of the snapshot's serialized form
///
/// Equal snapshots always produce the same fingerprint. Formatting and key
/// order of the input JSON do not matter since the parsed value is hashed.
/// serde_json writes NaN and both infinities as `null`, so the bit patterns
/// of the numeric fields are hashed too.
pub fn snapshot_fingerprint(snapshot: &TripSnapshot) -> Result<u64, MetricsError> {
    let bytes = serde_json::to_vec(snapshot)?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hash_numbers(&mut hasher, snapshot);
    Ok(hasher.finish())
}

fn hash_numbers(hasher: &mut XxHash64, snapshot: &TripSnapshot) {
    let mut write = |value: f64| {
        // All NaNs hash alike
        let value = if value.is_nan() { f64::NAN } else { value };
        hasher.write_u64(value.to_bits());
    };

    write(snapshot.fuel.cost_per_liter);
    write(snapshot.fuel.km_per_liter);
    for expense in &snapshot.general_expenses {
        write(expense.amount);
    }
    for day in &snapshot.days {
        write(day.distance);
        for expense in &day.expenses {
            write(expense.amount);
        }
    }
}

/// Stateful processor that reuses the last result while the snapshot is unchanged.
///
/// Use this when the same trip is recomputed on every edit and most calls see
/// an identical snapshot.
pub struct MetricsProcessor {
    config: MetricsConfig,
    encoder: MetricsEncoder,
    cached: Option<(u64, MetricsResult)>,
    hits: u64,
    misses: u64,
}

impl Default for MetricsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProcessor {
    /// Create a new processor with the built-in route table
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            config,
            encoder: MetricsEncoder::new(),
            cached: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Load configuration from JSON; drops the cached result
    pub fn load_config(&mut self, json: &str) -> Result<(), MetricsError> {
        self.config = MetricsConfig::from_json(json)?;
        self.invalidate();
        Ok(())
    }

    /// Save configuration to JSON
    pub fn save_config(&self) -> Result<String, MetricsError> {
        self.config.to_json()
    }

    /// Compute metrics, reusing the cached result for an identical snapshot
    pub fn process(&mut self, snapshot: &TripSnapshot) -> Result<&MetricsResult, MetricsError> {
        let fingerprint = snapshot_fingerprint(snapshot)?;

        let stale = self
            .cached
            .as_ref()
            .map_or(true, |(cached, _)| *cached != fingerprint);
        if stale {
            tracing::debug!(fingerprint, "snapshot changed, recomputing");
            self.cached = None;
            self.misses += 1;
        } else {
            self.hits += 1;
        }

        let config = &self.config;
        let (_, metrics) = self
            .cached
            .get_or_insert_with(|| (fingerprint, compute_metrics_with(snapshot, config)));
        Ok(&*metrics)
    }

    /// Process snapshot JSON and return an encoded report
    pub fn process_json(&mut self, snapshot_json: &str) -> Result<String, MetricsError> {
        let snapshot = parse_snapshot(snapshot_json)?;
        self.process(&snapshot)?;

        match &self.cached {
            Some((fingerprint, metrics)) => self.encoder.encode_to_json(metrics, *fingerprint),
            None => Err(MetricsError::EncodingError(
                "no metrics available after processing".to_string(),
            )),
        }
    }

    /// Cache hits and misses since creation
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Drop the cached result
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QualityTier, ScheduleIntensity};

    fn sample_snapshot_json() -> &'static str {
        r#"{
            "participants": [
                {"id": "p1", "name": "Anna"},
                {"id": "p2", "name": "Marco", "email": "marco@example.com"}
            ],
            "generalExpenses": [
                {"id": "g1", "description": "Ferry", "amount": 100, "paidById": "p1"}
            ],
            "days": [
                {
                    "id": "d1",
                    "city": "Florence",
                    "distance": 100,
                    "routeType": "Strada statale",
                    "expenses": [{"id": "e1", "description": "Lunch", "amount": 10, "perPerson": true, "paidById": "p2"}],
                    "activities": [{"id": "a1", "description": "Uffizi"}]
                },
                {
                    "id": "d2",
                    "city": "Siena",
                    "distance": 150,
                    "routeType": "Strada ad alta percorrenza",
                    "expenses": [],
                    "activities": []
                }
            ],
            "fuel": {"costPerLiter": 2.0, "kmPerLiter": 10.0}
        }"#
    }

    #[test]
    fn test_snapshot_json_to_metrics() {
        let result = snapshot_json_to_metrics(sample_snapshot_json().to_string());
        assert!(result.is_ok());

        let metrics: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();
        assert_eq!(metrics["totals"]["total_distance_km"], 250.0);
        assert_eq!(metrics["fuel"]["estimated_cost"], 50.0);
        assert_eq!(metrics["totals"]["total_cost"], 170.0);
        assert_eq!(metrics["expenses"][0]["id"], "fuel_cost");
        assert_eq!(metrics["expenses"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_full_pipeline_metrics() {
        let snapshot = parse_snapshot(sample_snapshot_json()).unwrap();
        let metrics = compute_metrics(&snapshot);

        assert!((metrics.totals.cost_per_person - 85.0).abs() < 1e-9);
        assert!((metrics.totals.cost_per_day - 85.0).abs() < 1e-9);

        // 100 km at 80 km/h, 150 km at 110 km/h
        let expected_hours = 100.0 / 80.0 + 150.0 / 110.0;
        assert!((metrics.totals.total_driving_hours - expected_hours).abs() < 1e-9);

        // Ferry 100 by Anna, lunch 20 by Marco: share 60 each
        assert_eq!(metrics.settlement.total_shared, 120.0);
        assert_eq!(metrics.settlement.transactions.len(), 1);
        assert_eq!(metrics.settlement.transactions[0].from, "Marco");
        assert_eq!(metrics.settlement.transactions[0].to, "Anna");
        assert_eq!(metrics.settlement.transactions[0].amount, 40.0);

        assert_eq!(
            metrics.planning.schedule_intensity,
            Some(ScheduleIntensity::Relaxed)
        );
        assert_eq!(metrics.charts.participant_spending.values, vec![100.0, 20.0]);
    }

    #[test]
    fn test_simple_split_scenario() {
        let snapshot = parse_snapshot(
            r#"{
                "participants": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
                "generalExpenses": [{"id": "g1", "amount": 100, "paidById": "a"}]
            }"#,
        )
        .unwrap();
        let metrics = compute_metrics(&snapshot);

        assert_eq!(metrics.settlement.transactions.len(), 1);
        let transaction = &metrics.settlement.transactions[0];
        assert_eq!(transaction.from, "B");
        assert_eq!(transaction.to, "A");
        assert_eq!(transaction.amount, 50.0);
    }

    #[test]
    fn test_flat_daily_costs_are_very_good() {
        let snapshot = parse_snapshot(
            r#"{
                "participants": [{"id": "a", "name": "A"}],
                "days": [
                    {"id": "d1", "expenses": [{"id": "e1", "amount": 10, "paidById": "a"}]},
                    {"id": "d2", "expenses": [{"id": "e2", "amount": 10, "paidById": "a"}]},
                    {"id": "d3", "expenses": [{"id": "e3", "amount": 10, "paidById": "a"}]}
                ]
            }"#,
        )
        .unwrap();
        let metrics = compute_metrics(&snapshot);

        assert_eq!(metrics.planning.cost_consistency, Some(QualityTier::VeryGood));
        assert_eq!(metrics.planning.pacing, None);
    }

    #[test]
    fn test_unpaid_day_expense_skipped_by_cost_consistency() {
        let snapshot = parse_snapshot(
            r#"{
                "participants": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
                "days": [
                    {"id": "d1", "expenses": [{"id": "e1", "amount": 10, "paidById": "a"}]},
                    {"id": "d2", "expenses": [{"id": "e2", "amount": 10}]},
                    {"id": "d3", "expenses": [{"id": "e3", "amount": 10, "paidById": "b"}]}
                ]
            }"#,
        )
        .unwrap();
        let metrics = compute_metrics(&snapshot);

        // Shareable series [10, 0, 10] against a cost per day of 10
        let cv = metrics.planning.cost_cv_pct.unwrap();
        assert!((cv - 100.0 * (200.0_f64 / 9.0).sqrt() / 10.0).abs() < 1e-9);
        assert_eq!(metrics.planning.cost_consistency, Some(QualityTier::Good));

        // The chart still shows every day expense
        assert_eq!(metrics.charts.daily_cost.values, vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let snapshot = parse_snapshot(sample_snapshot_json()).unwrap();
        assert_eq!(compute_metrics(&snapshot), compute_metrics(&snapshot));
    }

    #[test]
    fn test_empty_snapshot() {
        let metrics = compute_metrics(&TripSnapshot::default());

        assert_eq!(metrics.totals.total_cost, 0.0);
        assert!(metrics.totals.cost_per_person.is_finite());
        assert!(metrics.expenses.is_empty());
        assert!(metrics.settlement.transactions.is_empty());
        assert_eq!(metrics.planning.cost_consistency, None);
    }

    #[test]
    fn test_invalid_json() {
        let result = snapshot_json_to_metrics("not valid json".to_string());
        assert!(matches!(result, Err(MetricsError::ParseError(_))));
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let compact = parse_snapshot(r#"{"participants":[{"id":"a","name":"A"}]}"#).unwrap();
        let spaced = parse_snapshot(
            r#"{
                "participants": [ { "name": "A", "id": "a" } ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            snapshot_fingerprint(&compact).unwrap(),
            snapshot_fingerprint(&spaced).unwrap()
        );
    }

    #[test]
    fn test_processor_caches_unchanged_snapshot() {
        let mut processor = MetricsProcessor::new();
        let mut snapshot = parse_snapshot(sample_snapshot_json()).unwrap();

        let first = processor.process(&snapshot).unwrap().clone();
        let second = processor.process(&snapshot).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(processor.cache_stats(), (1, 1));

        snapshot.days[0].distance = 200.0;
        let third = processor.process(&snapshot).unwrap();
        assert_eq!(third.totals.total_distance_km, 350.0);
        assert_eq!(processor.cache_stats(), (1, 2));
    }

    #[test]
    fn test_fingerprint_tells_non_finite_values_apart() {
        let mut snapshot = parse_snapshot(sample_snapshot_json()).unwrap();
        let mut fingerprints = Vec::new();
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            snapshot.general_expenses[0].amount = amount;
            fingerprints.push(snapshot_fingerprint(&snapshot).unwrap());
        }

        assert_ne!(fingerprints[0], fingerprints[1]);
        assert_ne!(fingerprints[1], fingerprints[2]);
        assert_ne!(fingerprints[0], fingerprints[2]);

        snapshot.general_expenses[0].amount = f64::NAN;
        assert_eq!(snapshot_fingerprint(&snapshot).unwrap(), fingerprints[0]);
    }

    #[test]
    fn test_processor_recomputes_when_nan_becomes_infinite() {
        let mut processor = MetricsProcessor::new();
        let mut snapshot = parse_snapshot(sample_snapshot_json()).unwrap();

        snapshot.days[0].distance = f64::NAN;
        let first = processor.process(&snapshot).unwrap();
        assert!(first.totals.total_distance_km.is_nan());

        snapshot.days[0].distance = f64::INFINITY;
        let second = processor.process(&snapshot).unwrap();
        assert_eq!(second.totals.total_distance_km, f64::INFINITY);
        assert_eq!(processor.cache_stats(), (0, 2));
    }

    #[test]
    fn test_processor_config_roundtrip() {
        let processor = MetricsProcessor::with_config(
            MetricsConfig::default().with_route_speed("Ferry", 30.0),
        );
        let saved = processor.save_config().unwrap();

        let mut restored = MetricsProcessor::new();
        restored.load_config(&saved).unwrap();
        assert_eq!(restored.config().speed_for("Ferry"), 30.0);
        assert!(restored.load_config("not json").is_err());
    }

    #[test]
    fn test_processor_json_report() {
        let mut processor = MetricsProcessor::new();
        let report = processor.process_json(sample_snapshot_json()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(parsed["producer"]["name"], "trip-metrics");
        assert_eq!(parsed["metrics"]["totals"]["day_count"], 2);
        assert!(parsed["snapshot_fingerprint"].is_string());
    }
}
