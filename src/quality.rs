//! Planning quality classification
//!
//! Three independent heuristics over per-day series:
//! - Cost consistency: dispersion of shareable daily costs relative to the cost per day
//! - Pacing: dispersion and peak of daily driving time
//! - Schedule intensity: mean number of activities per day
//!
//! Each heuristic yields `None` when its series is degenerate.

use crate::types::{DailySeries, PlanningQuality, QualityTier, ScheduleIntensity, TripTotals};

/// Cost CV (percent) below which spending is very consistent
const COST_CV_VERY_GOOD: f64 = 30.0;
/// Cost CV (percent) below which spending is consistent
const COST_CV_GOOD: f64 = 60.0;

/// Driving time CV (percent) thresholds for the balance score
const DRIVING_CV_BALANCED: f64 = 35.0;
const DRIVING_CV_UNEVEN: f64 = 70.0;

/// Longest daily drive (hours) thresholds for the peak score
const MAX_HOURS_COMFORTABLE: f64 = 6.0;
const MAX_HOURS_TIRING: f64 = 8.0;

/// Mean activities per day thresholds
const ACTIVITIES_RELAXED: f64 = 2.5;
const ACTIVITIES_MODERATE: f64 = 4.5;

/// Classifier for planning quality indicators
pub struct PlanningQualityClassifier;

impl PlanningQualityClassifier {
    /// Classify a trip from its per-day series and totals
    pub fn classify(daily: &DailySeries, totals: &TripTotals) -> PlanningQuality {
        let cost = cost_consistency(&daily.shared_costs, totals.cost_per_day);
        let pacing = pacing(
            &daily.driving_hours,
            totals.total_driving_hours,
            totals.day_count,
        );
        let schedule = schedule_intensity(&daily.activity_counts, totals.day_count);

        PlanningQuality {
            cost_consistency: cost.map(|(tier, _)| tier),
            pacing: pacing.tier,
            schedule_intensity: schedule.map(|(intensity, _)| intensity),
            cost_cv_pct: cost.map(|(_, cv)| cv),
            driving_time_cv_pct: pacing.cv_pct,
            max_daily_driving_hours: pacing.max_hours,
            avg_activities_per_day: schedule.map_or(0.0, |(_, avg)| avg),
        }
    }
}

/// Arithmetic mean, 0 for an empty series
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for fewer than two samples
pub fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Cost consistency tier and the cost CV
///
/// The CV is taken against the overall cost per day, which also carries fuel
/// and general expenses, not against the mean of the daily series.
pub fn cost_consistency(daily_costs: &[f64], cost_per_day: f64) -> Option<(QualityTier, f64)> {
    if cost_per_day.is_nan() || cost_per_day <= 0.0 {
        return None;
    }

    let cv = std_deviation(daily_costs) / cost_per_day * 100.0;
    let tier = if cv < COST_CV_VERY_GOOD {
        QualityTier::VeryGood
    } else if cv < COST_CV_GOOD {
        QualityTier::Good
    } else {
        QualityTier::NeedsReview
    };

    Some((tier, cv))
}

/// Pacing result with its diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingAssessment {
    pub tier: Option<QualityTier>,
    pub cv_pct: Option<f64>,
    pub max_hours: f64,
}

/// Pacing tier from the spread and peak of daily driving time
///
/// Each dimension scores 0-2 and the lower score decides the tier.
pub fn pacing(daily_hours: &[f64], total_hours: f64, day_count: usize) -> PacingAssessment {
    let max_hours = daily_hours.iter().copied().fold(0.0, f64::max);

    if total_hours.is_nan() || total_hours <= 0.0 {
        return PacingAssessment {
            tier: None,
            cv_pct: None,
            max_hours,
        };
    }

    let avg_hours = total_hours / day_count.max(1) as f64;
    let cv = if avg_hours > 0.0 {
        std_deviation(daily_hours) / avg_hours * 100.0
    } else {
        0.0
    };

    let balance_score = if cv < DRIVING_CV_BALANCED {
        2
    } else if cv < DRIVING_CV_UNEVEN {
        1
    } else {
        0
    };
    let peak_score = if max_hours <= MAX_HOURS_COMFORTABLE {
        2
    } else if max_hours <= MAX_HOURS_TIRING {
        1
    } else {
        0
    };

    PacingAssessment {
        tier: Some(QualityTier::from_score(balance_score.min(peak_score))),
        cv_pct: Some(cv),
        max_hours,
    }
}

/// Schedule intensity and the mean activities per day
pub fn schedule_intensity(
    activity_counts: &[usize],
    day_count: usize,
) -> Option<(ScheduleIntensity, f64)> {
    let total: usize = activity_counts.iter().sum();
    if total == 0 {
        return None;
    }

    let avg = total as f64 / day_count.max(1) as f64;
    let intensity = if avg <= ACTIVITIES_RELAXED {
        ScheduleIntensity::Relaxed
    } else if avg <= ACTIVITIES_MODERATE {
        ScheduleIntensity::Moderate
    } else {
        ScheduleIntensity::Intense
    };

    Some((intensity, avg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_deviation() {
        assert_eq!(std_deviation(&[]), 0.0);
        assert_eq!(std_deviation(&[42.0]), 0.0);
        // Population std of 2, 4, 4, 4, 5, 5, 7, 9 is 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_deviation(&values) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_daily_costs_are_very_good() {
        let (tier, cv) = cost_consistency(&[10.0, 10.0, 10.0], 10.0).unwrap();
        assert_eq!(tier, QualityTier::VeryGood);
        assert_eq!(cv, 0.0);
    }

    #[test]
    fn test_cost_consistency_thresholds() {
        // std of [0, 100] is 50
        assert_eq!(
            cost_consistency(&[0.0, 100.0], 100.0).map(|(t, _)| t),
            Some(QualityTier::Good)
        );
        assert_eq!(
            cost_consistency(&[0.0, 100.0], 50.0).map(|(t, _)| t),
            Some(QualityTier::NeedsReview)
        );
        assert_eq!(
            cost_consistency(&[0.0, 100.0], 200.0).map(|(t, _)| t),
            Some(QualityTier::VeryGood)
        );
    }

    #[test]
    fn test_cost_consistency_undefined_without_costs() {
        assert!(cost_consistency(&[0.0, 0.0], 0.0).is_none());
        assert!(cost_consistency(&[], f64::NAN).is_none());
    }

    #[test]
    fn test_even_short_drives_pace_very_good() {
        let result = pacing(&[3.0, 3.0, 3.0], 9.0, 3);
        assert_eq!(result.tier, Some(QualityTier::VeryGood));
        assert_eq!(result.cv_pct, Some(0.0));
        assert_eq!(result.max_hours, 3.0);
    }

    #[test]
    fn test_long_day_caps_pacing() {
        // Perfectly even but every day is 9 hours
        let result = pacing(&[9.0, 9.0], 18.0, 2);
        assert_eq!(result.tier, Some(QualityTier::NeedsReview));

        // Even, 7 hours max
        let result = pacing(&[7.0, 7.0], 14.0, 2);
        assert_eq!(result.tier, Some(QualityTier::Good));
    }

    #[test]
    fn test_uneven_drives_cap_pacing() {
        // mean 2, std 2 -> CV 100%
        let result = pacing(&[0.0, 4.0], 4.0, 2);
        assert_eq!(result.tier, Some(QualityTier::NeedsReview));
        assert_eq!(result.cv_pct, Some(100.0));
    }

    #[test]
    fn test_pacing_undefined_without_driving() {
        let result = pacing(&[0.0, 0.0], 0.0, 2);
        assert_eq!(result.tier, None);
        assert_eq!(result.cv_pct, None);
    }

    #[test]
    fn test_schedule_intensity_tiers() {
        assert_eq!(schedule_intensity(&[0, 0], 2), None);
        assert_eq!(
            schedule_intensity(&[2, 3], 2),
            Some((ScheduleIntensity::Relaxed, 2.5))
        );
        assert_eq!(
            schedule_intensity(&[4, 5], 2),
            Some((ScheduleIntensity::Moderate, 4.5))
        );
        assert_eq!(
            schedule_intensity(&[5, 6], 2),
            Some((ScheduleIntensity::Intense, 5.5))
        );
    }
}
