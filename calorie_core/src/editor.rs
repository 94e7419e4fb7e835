//! Profile editor state and daily-goal reconciliation.
//!
//! Weight, height, age and the daily goal are held as raw text so a field
//! can be cleared without snapping back to a stale number. Every change to
//! a biometric field or selector recomputes the BMR. The suggested goal is
//! written into the goal field only while that field reads `""` or `"0"`;
//! any other content counts as a manual override and is left alone. The
//! latch is keyed purely on the text in the field, so clearing it (or
//! typing 0) is the way back to auto-fill.

use crate::bmr::{calc_bmr, calc_tdee};
use crate::config::ProfileDefaults;
use crate::input::{parse_number, parse_positive, parse_whole, trim_leading_zeros};
use crate::storage::ProfileStore;
use crate::{ActivityLevel, BiometricInput, Error, Gender, Profile, ProfileUpdate, Result, User};

/// Shown when a save is attempted with incomplete or out-of-range fields
pub const INVALID_PROFILE: &str =
    "Please enter a positive weight and height and an age between 10 and 120.";

pub const MIN_AGE: u32 = 10;
pub const MAX_AGE: u32 = 120;

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileEditor {
    weight: String,
    height: String,
    age: String,
    gender: Gender,
    activity: ActivityLevel,
    bmr: f64,
    daily_goal: String,
    saving: bool,
}

fn number_text(n: f64) -> String {
    format!("{}", n)
}

impl ProfileEditor {
    /// Fresh editor seeded from configured defaults.
    ///
    /// The goal starts empty, so the first recalculation fills it.
    pub fn new(defaults: &ProfileDefaults) -> Self {
        let mut editor = Self {
            weight: number_text(defaults.weight),
            height: number_text(defaults.height),
            age: defaults.age.to_string(),
            gender: defaults.gender,
            activity: defaults.activity,
            bmr: 0.0,
            daily_goal: String::new(),
            saving: false,
        };
        editor.recalculate();
        editor
    }

    /// Editor for a stored profile, falling back to defaults per field
    pub fn from_profile(profile: Option<&Profile>, defaults: &ProfileDefaults) -> Self {
        let mut editor = Self::new(defaults);
        if let Some(profile) = profile {
            editor.load(profile, defaults);
        }
        editor
    }

    /// Replace the form with a pushed profile snapshot, then recalculate.
    ///
    /// A stored goal of 0 (or none) leaves the latch open, so the
    /// recalculation fills it in.
    pub fn load(&mut self, profile: &Profile, defaults: &ProfileDefaults) {
        self.weight = number_text(profile.weight.unwrap_or(defaults.weight));
        self.height = number_text(profile.height.unwrap_or(defaults.height));
        self.age = profile.age.unwrap_or(defaults.age).to_string();
        self.gender = profile.gender.unwrap_or(defaults.gender);
        self.activity = profile.activity.unwrap_or(defaults.activity);
        self.bmr = profile.bmr.unwrap_or(0.0);
        self.daily_goal = number_text(profile.goal_or_zero());
        self.recalculate();
    }

    pub fn weight(&self) -> &str {
        &self.weight
    }

    pub fn height(&self) -> &str {
        &self.height
    }

    pub fn age(&self) -> &str {
        &self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn activity(&self) -> ActivityLevel {
        self.activity
    }

    /// Rounded BMR, 0 while the inputs are incomplete
    pub fn bmr(&self) -> f64 {
        self.bmr
    }

    pub fn daily_goal(&self) -> &str {
        &self.daily_goal
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn set_weight(&mut self, text: &str) {
        self.weight = trim_leading_zeros(text);
        self.recalculate();
    }

    pub fn set_height(&mut self, text: &str) {
        self.height = trim_leading_zeros(text);
        self.recalculate();
    }

    pub fn set_age(&mut self, text: &str) {
        self.age = trim_leading_zeros(text);
        self.recalculate();
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = gender;
        self.recalculate();
    }

    pub fn set_activity(&mut self, activity: ActivityLevel) {
        self.activity = activity;
        self.recalculate();
    }

    /// Manual goal entry; never triggers a recalculation
    pub fn set_daily_goal(&mut self, text: &str) {
        self.daily_goal = trim_leading_zeros(text);
    }

    fn goal_is_unset(&self) -> bool {
        self.daily_goal.is_empty() || self.daily_goal == "0"
    }

    fn biometrics(&self) -> Option<BiometricInput> {
        Some(BiometricInput {
            weight_kg: parse_positive(&self.weight)?,
            height_cm: parse_positive(&self.height)?,
            age: parse_whole(&self.age)?,
            gender: self.gender,
        })
    }

    fn recalculate(&mut self) {
        let Some(input) = self.biometrics() else {
            self.bmr = 0.0;
            tracing::debug!("Biometrics incomplete, BMR reset");
            return;
        };

        // extreme but valid inputs can push the formula below zero
        let raw_bmr = calc_bmr(&input).max(0.0);
        let suggested = calc_tdee(raw_bmr, self.activity).round();
        self.bmr = raw_bmr.round();

        if self.goal_is_unset() {
            self.daily_goal = number_text(suggested);
            tracing::debug!("BMR {} → auto goal {}", self.bmr, suggested);
        } else {
            tracing::debug!(
                "BMR {} → suggested {}, keeping manual goal {}",
                self.bmr,
                suggested,
                self.daily_goal
            );
        }
    }

    /// Check every field and build the full update a save would write.
    ///
    /// An unparsable goal is written as 0.
    pub fn validated_update(&self) -> Result<ProfileUpdate> {
        let weight = parse_positive(&self.weight);
        let height = parse_positive(&self.height);
        let age = parse_whole(&self.age).filter(|a| (MIN_AGE..=MAX_AGE).contains(a));

        let (Some(weight), Some(height), Some(age)) = (weight, height, age) else {
            return Err(Error::Validation(INVALID_PROFILE.to_string()));
        };

        Ok(ProfileUpdate {
            weight: Some(weight),
            height: Some(height),
            age: Some(age),
            gender: Some(self.gender),
            activity: Some(self.activity),
            bmr: Some(self.bmr),
            daily_goal: Some(parse_number(&self.daily_goal).unwrap_or(0.0)),
        })
    }

    /// Validate and merge-upsert the profile.
    ///
    /// Refused with [`Error::Busy`] while another save is in flight. On any
    /// failure nothing is written and the form is left as it was.
    pub fn save<S: ProfileStore + ?Sized>(&mut self, store: &mut S, user: &User) -> Result<Profile> {
        if self.saving {
            return Err(Error::Busy);
        }
        let update = self.validated_update()?;

        self.saving = true;
        let result = store.upsert_merge(&user.uid, &update);
        self.saving = false;

        match &result {
            Ok(_) => tracing::info!("Profile saved for {}", user.uid),
            Err(e) => tracing::warn!("Profile save failed for {}: {}", user.uid, e),
        }
        result
    }
}
