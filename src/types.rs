//! Core types for the trip metrics engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: the read-only trip snapshot (input, camelCase JSON as held by the
//! planning application), normalized expenses, aggregate totals, the settlement
//! ledger, planning-quality tiers and chart series (output, snake_case JSON).

use serde::{Deserialize, Serialize};

/// Payer label for an expense whose payer id matches no participant
pub const UNKNOWN_PAYER: &str = "Unknown";

/// Payer label for an expense with no payer (the fuel pseudo-expense)
pub const NOT_APPLICABLE: &str = "N/A";

/// Display name for a participant with neither a name nor an email
pub const UNNAMED_PARTICIPANT: &str = "Unknown";

/// Identifier of the synthesized fuel expense
pub const FUEL_EXPENSE_ID: &str = "fuel_cost";

/// Description of the synthesized fuel expense
pub const FUEL_EXPENSE_DESCRIPTION: &str = "Estimated fuel cost";

/// Label used for expenses that are not tied to a day
pub const GENERAL_LABEL: &str = "General";

/// Label for a day, 1-based as shown to users
pub fn day_label(index: usize) -> String {
    format!("Day {}", index + 1)
}

// ============================================================================
// Trip snapshot (input)
// ============================================================================

/// A person taking part in the trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    /// Name shown in balances and charts: name, then email, then a placeholder
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return &self.name;
        }
        match self.email.as_deref() {
            Some(email) if !email.trim().is_empty() => email,
            _ => UNNAMED_PARTICIPANT,
        }
    }
}

/// A raw expense record, either general or attached to a day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Base amount; multiplied by the participant count when `per_person` is set
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub per_person: bool,
    #[serde(default)]
    pub paid_by_id: Option<String>,
}

impl Expense {
    pub fn shared(id: impl Into<String>, amount: f64, paid_by_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            amount,
            paid_by_id: paid_by_id.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn per_person(id: impl Into<String>, amount: f64, paid_by_id: Option<&str>) -> Self {
        Self {
            per_person: true,
            ..Self::shared(id, amount, paid_by_id)
        }
    }

    /// Payer id, treating a blank id as no payer
    pub fn payer_id(&self) -> Option<&str> {
        self.paid_by_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// A planned activity; the engine only counts them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// One day of the itinerary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub city: String,
    /// Distance driven on this day (km)
    #[serde(default)]
    pub distance: f64,
    /// Route type, looked up in the route speed table
    #[serde(default)]
    pub route_type: String,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Day {
    pub fn driving(id: impl Into<String>, distance: f64, route_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            distance,
            route_type: route_type.into(),
            ..Default::default()
        }
    }
}

/// Fuel parameters used to estimate the fuel expense
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelConfig {
    #[serde(default)]
    pub cost_per_liter: f64,
    /// Fuel efficiency (km per liter); 0 or less disables the estimate
    #[serde(default)]
    pub km_per_liter: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            cost_per_liter: 1.8,
            km_per_liter: 15.0,
        }
    }
}

/// Read-only snapshot of the trip state handed to the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripSnapshot {
    pub days: Vec<Day>,
    pub participants: Vec<Participant>,
    pub general_expenses: Vec<Expense>,
    pub fuel: FuelConfig,
}

// ============================================================================
// Normalized expenses
// ============================================================================

/// Where a normalized expense came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpenseOrigin {
    /// The synthesized fuel expense
    Fuel,
    /// A general (trip-wide) expense
    General,
    /// An expense attached to the day at `index` (zero-based)
    Day { index: usize },
}

impl ExpenseOrigin {
    pub fn label(&self) -> String {
        match self {
            ExpenseOrigin::Fuel | ExpenseOrigin::General => GENERAL_LABEL.to_string(),
            ExpenseOrigin::Day { index } => day_label(*index),
        }
    }
}

/// How the payer of an expense was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayerResolution {
    /// The payer id matches a participant
    Participant,
    /// A payer id is set but matches no participant
    Unknown,
    /// No payer (fuel estimate, or expense recorded without a payer)
    Unassigned,
}

/// An expense with its calculated cost and resolved payer name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedExpense {
    pub id: String,
    pub description: String,
    pub origin: ExpenseOrigin,
    /// "General" or "Day N"
    pub day_label: String,
    /// Base amount as entered
    pub amount: f64,
    pub per_person: bool,
    pub paid_by_id: Option<String>,
    pub paid_by_name: String,
    pub payer: PayerResolution,
    /// Amount after applying the per-person multiplier
    pub calculated_amount: f64,
}

impl NormalizedExpense {
    /// Whether this expense takes part in balance settlement
    pub fn is_shareable(&self) -> bool {
        self.payer == PayerResolution::Participant && self.origin != ExpenseOrigin::Fuel
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Fuel estimate derived from total distance and fuel parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelEstimate {
    pub total_distance_km: f64,
    pub liters: f64,
    pub estimated_cost: f64,
    pub cost_per_person: f64,
}

/// Per-day series shared by the classifier and the chart builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    /// Sum of calculated day-expense amounts
    pub costs: Vec<f64>,
    /// Same as `costs`, restricted to shareable expenses
    pub shared_costs: Vec<f64>,
    pub distances_km: Vec<f64>,
    pub driving_hours: Vec<f64>,
    pub activity_counts: Vec<usize>,
}

/// Aggregate travel and cost statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripTotals {
    pub participant_count: usize,
    pub day_count: usize,
    pub total_distance_km: f64,
    pub estimated_fuel_cost: f64,
    pub estimated_fuel_cost_per_person: f64,
    pub general_expenses_total: f64,
    pub daily_expenses_total: f64,
    pub total_cost: f64,
    pub cost_per_person: f64,
    pub cost_per_day: f64,
    pub avg_distance_per_day_km: f64,
    pub total_driving_hours: f64,
}

// ============================================================================
// Settlement
// ============================================================================

/// A participant's position in the shared expenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantBalance {
    pub participant_id: String,
    pub name: String,
    /// Total of shareable expenses this participant paid
    pub paid: f64,
    /// Fair share of all shareable expenses
    pub share: f64,
    /// `paid - share`; positive means the participant is owed money
    pub balance: f64,
}

/// A directed payment that settles part of a debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub from_id: String,
    pub from: String,
    pub to_id: String,
    pub to: String,
    pub amount: f64,
}

/// Net balances and the transactions that zero them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub total_shared: f64,
    pub share_per_person: f64,
    pub balances: Vec<ParticipantBalance>,
    pub transactions: Vec<SettlementTransaction>,
}

// ============================================================================
// Planning quality
// ============================================================================

/// Qualitative tier for cost consistency and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    NeedsReview,
    Good,
    VeryGood,
}

impl QualityTier {
    /// Map a 0-2 score to a tier (anything above 2 is very good)
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => QualityTier::NeedsReview,
            1 => QualityTier::Good,
            _ => QualityTier::VeryGood,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::VeryGood => "very good",
            QualityTier::Good => "good",
            QualityTier::NeedsReview => "needs review",
        }
    }
}

/// How packed the daily schedule is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleIntensity {
    Relaxed,
    Moderate,
    Intense,
}

impl ScheduleIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleIntensity::Relaxed => "relaxed",
            ScheduleIntensity::Moderate => "moderate",
            ScheduleIntensity::Intense => "intense",
        }
    }
}

/// Planning quality classification; `None` tiers mean not applicable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningQuality {
    pub cost_consistency: Option<QualityTier>,
    pub pacing: Option<QualityTier>,
    pub schedule_intensity: Option<ScheduleIntensity>,
    /// Coefficient of variation of daily costs (percentage)
    pub cost_cv_pct: Option<f64>,
    /// Coefficient of variation of daily driving time (percentage)
    pub driving_time_cv_pct: Option<f64>,
    pub max_daily_driving_hours: f64,
    pub avg_activities_per_day: f64,
}

// ============================================================================
// Charts and result
// ============================================================================

/// A labelled numeric series ready for a chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// All chart series derived from a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripCharts {
    pub expense_distribution: ChartSeries,
    pub daily_cost: ChartSeries,
    pub daily_distance: ChartSeries,
    pub daily_driving_hours: ChartSeries,
    pub daily_activities: ChartSeries,
    pub participant_spending: ChartSeries,
}

/// Everything the engine derives from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub fuel: FuelEstimate,
    pub totals: TripTotals,
    /// Flattened list: fuel (when non-zero), general expenses, then day expenses
    pub expenses: Vec<NormalizedExpense>,
    pub settlement: Settlement,
    pub planning: PlanningQuality,
    pub charts: TripCharts,
}
