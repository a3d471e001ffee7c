//! Chart series
//!
//! Reshapes totals and per-day series into label/value pairs. Colors, axes
//! and chart types are left to the presentation layer.

use crate::normalizer::ParticipantDirectory;
use crate::types::{
    day_label, ChartSeries, DailySeries, NormalizedExpense, TripCharts, TripTotals,
};

/// Builder for chart series
pub struct ChartSeriesBuilder;

impl ChartSeriesBuilder {
    pub fn build(
        totals: &TripTotals,
        daily: &DailySeries,
        directory: &ParticipantDirectory<'_>,
        expenses: &[NormalizedExpense],
    ) -> TripCharts {
        let day_labels: Vec<String> = (0..daily.costs.len()).map(day_label).collect();

        TripCharts {
            expense_distribution: ChartSeries {
                label: "Expense distribution".to_string(),
                labels: vec![
                    "Fuel".to_string(),
                    "General expenses".to_string(),
                    "Daily expenses".to_string(),
                ],
                values: vec![
                    totals.estimated_fuel_cost,
                    totals.general_expenses_total,
                    totals.daily_expenses_total,
                ],
            },
            daily_cost: ChartSeries {
                label: "Daily cost".to_string(),
                labels: day_labels.clone(),
                values: daily.costs.clone(),
            },
            daily_distance: ChartSeries {
                label: "Daily distance (km)".to_string(),
                labels: day_labels.clone(),
                values: daily.distances_km.clone(),
            },
            daily_driving_hours: ChartSeries {
                label: "Driving hours".to_string(),
                labels: day_labels.clone(),
                values: daily.driving_hours.clone(),
            },
            daily_activities: ChartSeries {
                label: "Activities".to_string(),
                labels: day_labels,
                values: daily
                    .activity_counts
                    .iter()
                    .map(|count| *count as f64)
                    .collect(),
            },
            participant_spending: participant_spending(directory, expenses),
        }
    }
}

/// Amount paid by each participant, in directory order
fn participant_spending(
    directory: &ParticipantDirectory<'_>,
    expenses: &[NormalizedExpense],
) -> ChartSeries {
    let mut values = vec![0.0; directory.len()];

    for expense in expenses {
        let payer = expense
            .paid_by_id
            .as_deref()
            .and_then(|id| directory.position(id));
        if let Some(idx) = payer {
            values[idx] += expense.calculated_amount;
        }
    }

    ChartSeries {
        label: "Spending by participant".to_string(),
        labels: directory
            .iter()
            .map(|participant| participant.display_name().to_string())
            .collect(),
        values,
    }
}
