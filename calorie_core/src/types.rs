//! Core domain types for the calorie tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Biometric inputs and activity levels
//! - Energy estimates (BMR / TDEE)
//! - The stored profile document and partial updates to it
//! - Meal entries and the signed-in user

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ============================================================================
// Biometric Types
// ============================================================================

/// Gender used to pick the BMR formula
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(Error::Validation(format!("Unknown gender: {}", other))),
        }
    }
}

/// Self-reported activity level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    /// Multiplier applied to BMR to get TDEE
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ActivityLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| Error::Validation(format!("Unknown activity level: {}", s.trim())))
    }
}

/// Inputs to the BMR formula, built fresh from form state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiometricInput {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub gender: Gender,
}

/// Derived energy expenditure, in kcal/day
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub bmr: f64,
    pub daily_goal: f64,
}

// ============================================================================
// Profile Types
// ============================================================================

/// Stored profile document for one user.
///
/// Fields are optional because writes merge: a document only ever holds
/// the fields that some save has supplied.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<f64>,
}

/// Partial write against a [`Profile`]; `None` leaves the stored value alone
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity: Option<ActivityLevel>,
    pub bmr: Option<f64>,
    pub daily_goal: Option<f64>,
}

impl Profile {
    /// Apply a partial update, keeping every field the update omits
    pub fn merge(&mut self, update: &ProfileUpdate) {
        if update.weight.is_some() {
            self.weight = update.weight;
        }
        if update.height.is_some() {
            self.height = update.height;
        }
        if update.age.is_some() {
            self.age = update.age;
        }
        if update.gender.is_some() {
            self.gender = update.gender;
        }
        if update.activity.is_some() {
            self.activity = update.activity;
        }
        if update.bmr.is_some() {
            self.bmr = update.bmr;
        }
        if update.daily_goal.is_some() {
            self.daily_goal = update.daily_goal;
        }
    }

    /// Daily goal, or 0 when none was ever saved
    pub fn goal_or_zero(&self) -> f64 {
        self.daily_goal.unwrap_or(0.0)
    }
}

// ============================================================================
// Meal Types
// ============================================================================

/// A logged meal, scoped under a user and calendar date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MealEntry {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_calories")]
    pub calories: f64,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub date: NaiveDate,
}

/// A meal as submitted, before storage assigns an id
#[derive(Clone, Debug, PartialEq)]
pub struct NewMeal {
    pub name: String,
    pub calories: f64,
    pub time: NaiveTime,
    pub date: NaiveDate,
}

impl NewMeal {
    pub fn into_entry(self, id: String) -> MealEntry {
        MealEntry {
            id,
            name: self.name,
            calories: self.calories,
            time: self.time,
            date: self.date,
        }
    }
}

/// Read a calorie value from a stored record.
///
/// Numbers and numeric strings are accepted; anything else counts as 0 so
/// a malformed record never breaks aggregation.
fn lenient_calories<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(parsed.filter(|c| c.is_finite() && *c >= 0.0).unwrap_or(0.0))
}

/// `HH:MM` wall-clock time
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s.trim(), FORMAT).ok()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {}", s)))
    }
}

// ============================================================================
// Identity
// ============================================================================

/// The signed-in account
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}
