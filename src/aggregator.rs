//! Metrics aggregation
//!
//! This module derives trip-wide statistics from normalized expenses and days:
//! - Total cost, split by fuel, general and daily expenses
//! - Per-person and per-day averages (divisors floored at 1)
//! - Total distance and driving time
//! - Per-day series for the classifier and charts

use crate::config::MetricsConfig;
use crate::types::{
    DailySeries, ExpenseOrigin, FuelEstimate, NormalizedExpense, TripSnapshot, TripTotals,
};

/// Aggregator for computing trip totals
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Aggregate totals for a snapshot
    ///
    /// `participant_count` is the number of distinct participants, possibly 0.
    pub fn aggregate(
        snapshot: &TripSnapshot,
        participant_count: usize,
        fuel: &FuelEstimate,
        expenses: &[NormalizedExpense],
        daily: &DailySeries,
    ) -> TripTotals {
        let day_count = snapshot.days.len();

        let general_expenses_total = sum_where(expenses, |origin| origin == ExpenseOrigin::General);
        let daily_expenses_total =
            sum_where(expenses, |origin| matches!(origin, ExpenseOrigin::Day { .. }));

        // Fuel is taken from the estimate rather than the expense list, which
        // omits it when the estimate is zero.
        let total_cost = fuel.estimated_cost + general_expenses_total + daily_expenses_total;

        TripTotals {
            participant_count,
            day_count,
            total_distance_km: fuel.total_distance_km,
            estimated_fuel_cost: fuel.estimated_cost,
            estimated_fuel_cost_per_person: fuel.cost_per_person,
            general_expenses_total,
            daily_expenses_total,
            total_cost,
            cost_per_person: per_unit(total_cost, participant_count),
            cost_per_day: per_unit(total_cost, day_count),
            avg_distance_per_day_km: per_unit(fuel.total_distance_km, day_count),
            total_driving_hours: daily.driving_hours.iter().sum(),
        }
    }
}

impl DailySeries {
    /// Collect per-day cost, distance, driving time and activity series
    pub fn collect(
        snapshot: &TripSnapshot,
        expenses: &[NormalizedExpense],
        config: &MetricsConfig,
    ) -> Self {
        let day_count = snapshot.days.len();
        let mut costs = vec![0.0; day_count];
        let mut shared_costs = vec![0.0; day_count];

        for expense in expenses {
            let ExpenseOrigin::Day { index } = expense.origin else {
                continue;
            };
            if index >= day_count {
                continue;
            }
            costs[index] += expense.calculated_amount;
            if expense.is_shareable() {
                shared_costs[index] += expense.calculated_amount;
            }
        }

        DailySeries {
            costs,
            shared_costs,
            distances_km: snapshot.days.iter().map(|day| day.distance).collect(),
            driving_hours: snapshot
                .days
                .iter()
                .map(|day| config.driving_hours(day))
                .collect(),
            activity_counts: snapshot.days.iter().map(|day| day.activities.len()).collect(),
        }
    }
}

/// Divide by a count floored at 1
fn per_unit(total: f64, count: usize) -> f64 {
    total / count.max(1) as f64
}

fn sum_where(expenses: &[NormalizedExpense], keep: impl Fn(ExpenseOrigin) -> bool) -> f64 {
    expenses
        .iter()
        .filter(|expense| keep(expense.origin))
        .map(|expense| expense.calculated_amount)
        .sum()
}
