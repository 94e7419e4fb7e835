//! Energy expenditure estimates.
//!
//! BMR uses the gender-specific Mifflin–St Jeor coefficients; TDEE scales
//! it by the activity factor. Nothing here rounds or validates: callers
//! round for display/storage and check ranges before calling.

use crate::{ActivityLevel, BiometricInput, EnergyEstimate, Gender};

/// Basal metabolic rate in kcal/day
pub fn calc_bmr(input: &BiometricInput) -> f64 {
    let age = f64::from(input.age);
    match input.gender {
        Gender::Male => 88.36 + 13.4 * input.weight_kg + 4.8 * input.height_cm - 5.7 * age,
        Gender::Female => 447.6 + 9.2 * input.weight_kg + 3.1 * input.height_cm - 4.3 * age,
    }
}

/// Total daily energy expenditure for a given BMR
pub fn calc_tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.factor()
}

/// BMR and TDEE in one pass, unrounded
pub fn estimate(input: &BiometricInput, activity: ActivityLevel) -> EnergyEstimate {
    let bmr = calc_bmr(input);
    EnergyEstimate {
        bmr,
        daily_goal: calc_tdee(bmr, activity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn input(gender: Gender) -> BiometricInput {
        BiometricInput {
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 25,
            gender,
        }
    }

    #[test]
    fn test_male_bmr() {
        assert!(approx(calc_bmr(&input(Gender::Male)), 1723.86));
    }

    #[test]
    fn test_female_bmr() {
        assert!(approx(calc_bmr(&input(Gender::Female)), 1526.6));
    }

    #[test]
    fn test_sedentary_tdee() {
        assert!(approx(calc_tdee(1723.86, ActivityLevel::Sedentary), 2068.632));
    }

    #[test]
    fn test_tdee_is_bmr_times_factor_for_every_level() {
        let bmr = 1526.6;
        for level in ActivityLevel::ALL {
            assert_eq!(calc_tdee(bmr, level), bmr * level.factor());
        }
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = estimate(&input(Gender::Male), ActivityLevel::Moderate);
        let b = estimate(&input(Gender::Male), ActivityLevel::Moderate);
        assert_eq!(a, b);
        assert!(approx(a.daily_goal, 1723.86 * 1.55));
    }
}
