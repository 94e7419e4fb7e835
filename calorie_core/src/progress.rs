//! Daily progress against the calorie goal.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{MealEntry, Profile};

/// Sum of calories across a day's meals.
///
/// Non-finite or negative values count as 0.
pub fn meal_total(meals: &[MealEntry]) -> f64 {
    meals
        .iter()
        .map(|m| m.calories)
        .filter(|c| c.is_finite() && *c > 0.0)
        .sum()
}

/// Percentage of `goal` reached, rounded and clamped to 0..=100.
///
/// A goal of 0 (or less) yields 0 rather than a division error.
pub fn progress_pct(total: f64, goal: f64) -> u32 {
    if goal <= 0.0 || !goal.is_finite() {
        return 0;
    }
    let pct = (total / goal * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// What the summary card shows for one date
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub consumed: f64,
    pub goal: f64,
    pub progress_pct: u32,
}

impl DailySummary {
    /// Combine a meal snapshot with whatever profile is cached.
    ///
    /// The two are read independently; a missing profile means a goal of 0.
    pub fn compute(date: NaiveDate, meals: &[MealEntry], profile: Option<&Profile>) -> Self {
        let consumed = meal_total(meals);
        let goal = profile.map(Profile::goal_or_zero).unwrap_or(0.0);
        Self {
            date,
            consumed,
            goal,
            progress_pct: progress_pct(consumed, goal),
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.goal - self.consumed).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meals() -> Vec<MealEntry> {
        let json = r#"[
            {"id":"1","name":"Eggs","calories":300,"time":"08:00","date":"2024-05-01"},
            {"id":"2","name":"Mystery","calories":"bad","time":"12:00","date":"2024-05-01"},
            {"id":"3","name":"Pasta","calories":450,"time":"19:00","date":"2024-05-01"}
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_total_ignores_malformed_calories() {
        assert_eq!(meal_total(&sample_meals()), 750.0);
    }

    #[test]
    fn test_progress_pct() {
        assert_eq!(progress_pct(750.0, 0.0), 0);
        assert_eq!(progress_pct(750.0, 1000.0), 75);
        assert_eq!(progress_pct(750.0, 500.0), 100);
        assert_eq!(progress_pct(0.0, 2000.0), 0);
    }

    #[test]
    fn test_progress_pct_rounds_to_nearest() {
        assert_eq!(progress_pct(1.0, 3.0), 33);
        assert_eq!(progress_pct(2.0, 3.0), 67);
    }

    #[test]
    fn test_summary_without_profile_has_zero_goal() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = DailySummary::compute(date, &sample_meals(), None);
        assert_eq!(summary.consumed, 750.0);
        assert_eq!(summary.goal, 0.0);
        assert_eq!(summary.progress_pct, 0);
    }

    #[test]
    fn test_summary_with_profile_goal() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let profile = Profile {
            daily_goal: Some(1000.0),
            ..Default::default()
        };
        let summary = DailySummary::compute(date, &sample_meals(), Some(&profile));
        assert_eq!(summary.progress_pct, 75);
        assert_eq!(summary.remaining(), 250.0);
    }
}
