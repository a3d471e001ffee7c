//! Fuel cost estimation
//!
//! Estimates fuel expenditure from the total distance of the itinerary and the
//! fuel parameters, and synthesizes it as an expense without a payer.

use crate::types::{
    Day, ExpenseOrigin, FuelConfig, FuelEstimate, NormalizedExpense, PayerResolution,
    FUEL_EXPENSE_DESCRIPTION, FUEL_EXPENSE_ID, NOT_APPLICABLE,
};

/// Estimator for the fuel pseudo-expense
pub struct FuelEstimator;

impl FuelEstimator {
    /// Estimate fuel cost for the given days
    ///
    /// `participant_count` must already be floored at 1.
    pub fn estimate(days: &[Day], fuel: &FuelConfig, participant_count: usize) -> FuelEstimate {
        let total_distance_km = total_distance(days);
        let liters = if fuel.km_per_liter > 0.0 {
            total_distance_km / fuel.km_per_liter
        } else {
            0.0
        };
        let estimated_cost = liters * fuel.cost_per_liter;

        FuelEstimate {
            total_distance_km,
            liters,
            estimated_cost,
            cost_per_person: estimated_cost / participant_count.max(1) as f64,
        }
    }
}

/// Sum of all day distances (km)
pub fn total_distance(days: &[Day]) -> f64 {
    days.iter().map(|day| day.distance).sum()
}

impl FuelEstimate {
    /// The fuel estimate as an expense, omitted when there is nothing to pay
    pub fn to_expense(&self) -> Option<NormalizedExpense> {
        if self.estimated_cost <= 0.0 || self.estimated_cost.is_nan() {
            return None;
        }

        Some(NormalizedExpense {
            id: FUEL_EXPENSE_ID.to_string(),
            description: FUEL_EXPENSE_DESCRIPTION.to_string(),
            origin: ExpenseOrigin::Fuel,
            day_label: ExpenseOrigin::Fuel.label(),
            amount: self.estimated_cost,
            per_person: false,
            paid_by_id: None,
            paid_by_name: NOT_APPLICABLE.to_string(),
            payer: PayerResolution::Unassigned,
            calculated_amount: self.estimated_cost,
        })
    }
}
