//! Snapshot validation
//!
//! Flags data-entry problems in a snapshot. Validation never blocks
//! computation: every snapshot still produces metrics, the issues only explain
//! why some of them may look wrong.

use crate::config::MetricsConfig;
use crate::types::{Expense, TripSnapshot};
use std::collections::HashSet;
use thiserror::Error;

/// A problem found in a trip snapshot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("{field} is not a finite number")]
    NonFiniteNumber { field: String },

    #[error("{field} is negative ({value})")]
    NegativeAmount { field: String, value: f64 },

    #[error("Participant id '{id}' appears more than once")]
    DuplicateParticipant { id: String },

    #[error("{field} references unknown participant '{payer_id}'")]
    UnknownPayer { field: String, payer_id: String },

    #[error("{field} has unknown route type '{route_type}'")]
    UnknownRouteType { field: String, route_type: String },

    #[error("Fuel efficiency must be positive, got {km_per_liter}; fuel cost will be 0")]
    NonPositiveFuelEfficiency { km_per_liter: f64 },
}

impl ValidationIssue {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationIssue::NonFiniteNumber { .. } => "NON_FINITE_NUMBER",
            ValidationIssue::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            ValidationIssue::DuplicateParticipant { .. } => "DUPLICATE_PARTICIPANT",
            ValidationIssue::UnknownPayer { .. } => "UNKNOWN_PAYER",
            ValidationIssue::UnknownRouteType { .. } => "UNKNOWN_ROUTE_TYPE",
            ValidationIssue::NonPositiveFuelEfficiency { .. } => "NON_POSITIVE_FUEL_EFFICIENCY",
        }
    }
}

/// Check a snapshot against the configured route table
///
/// Fields are named by their JSON path, e.g. `days[1].expenses[0].amount`.
pub fn validate_snapshot(snapshot: &TripSnapshot, config: &MetricsConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for participant in &snapshot.participants {
        let id = participant.id.as_str();
        if !seen.insert(id) && reported.insert(id) {
            issues.push(ValidationIssue::DuplicateParticipant { id: id.to_string() });
        }
    }

    check_number(&mut issues, "fuel.costPerLiter".to_string(), snapshot.fuel.cost_per_liter);
    let km_per_liter = snapshot.fuel.km_per_liter;
    if km_per_liter.is_finite() {
        if km_per_liter <= 0.0 {
            issues.push(ValidationIssue::NonPositiveFuelEfficiency { km_per_liter });
        }
    } else {
        issues.push(ValidationIssue::NonFiniteNumber {
            field: "fuel.kmPerLiter".to_string(),
        });
    }

    for (idx, expense) in snapshot.general_expenses.iter().enumerate() {
        check_expense(&mut issues, &seen, &format!("generalExpenses[{idx}]"), expense);
    }

    for (day_idx, day) in snapshot.days.iter().enumerate() {
        let path = format!("days[{day_idx}]");
        check_number(&mut issues, format!("{path}.distance"), day.distance);

        if !day.route_type.trim().is_empty() && !config.is_known_route(&day.route_type) {
            issues.push(ValidationIssue::UnknownRouteType {
                field: format!("{path}.routeType"),
                route_type: day.route_type.clone(),
            });
        }

        for (idx, expense) in day.expenses.iter().enumerate() {
            check_expense(&mut issues, &seen, &format!("{path}.expenses[{idx}]"), expense);
        }
    }

    tracing::debug!(issues = issues.len(), "validated snapshot");
    issues
}

fn check_expense(
    issues: &mut Vec<ValidationIssue>,
    participant_ids: &HashSet<&str>,
    path: &str,
    expense: &Expense,
) {
    check_number(issues, format!("{path}.amount"), expense.amount);

    if let Some(payer_id) = expense.payer_id() {
        if !participant_ids.contains(payer_id) {
            issues.push(ValidationIssue::UnknownPayer {
                field: format!("{path}.paidById"),
                payer_id: payer_id.to_string(),
            });
        }
    }
}

fn check_number(issues: &mut Vec<ValidationIssue>, field: String, value: f64) {
    if !value.is_finite() {
        issues.push(ValidationIssue::NonFiniteNumber { field });
    } else if value < 0.0 {
        issues.push(ValidationIssue::NegativeAmount { field, value });
    }
}
