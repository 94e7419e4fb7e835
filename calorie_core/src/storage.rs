//! Storage collaborator: meal lists and profile documents.
//!
//! Views talk to storage only through [`MealStore`] and [`ProfileStore`].
//! [`LocalStore`] implements both on top of JSON documents in a data
//! directory:
//!
//! ```text
//! <root>/users/<uid>/profile.json
//! <root>/users/<uid>/meals/<YYYY-MM-DD>.json
//! ```

use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::live::{Feed, Subscription};
use crate::persist::{load_json, load_json_strict, save_json};
use crate::{Error, MealEntry, NewMeal, Profile, ProfileUpdate, Result};

/// Per-user, per-date ordered meal collection
pub trait MealStore {
    /// Store a new meal and return its assigned id
    fn create(&mut self, uid: &str, meal: NewMeal) -> Result<String>;

    /// Remove a meal; unknown ids are a storage error
    fn delete(&mut self, uid: &str, date: NaiveDate, id: &str) -> Result<()>;

    /// Meals for one date, ordered by time
    fn list(&self, uid: &str, date: NaiveDate) -> Result<Vec<MealEntry>>;

    /// Live meal snapshots for one date
    fn subscribe_meals(&mut self, uid: &str, date: NaiveDate)
        -> Result<Subscription<Vec<MealEntry>>>;
}

/// Single profile document per user
pub trait ProfileStore {
    fn read_profile(&self, uid: &str) -> Result<Option<Profile>>;

    /// Create the document if absent, otherwise update only supplied fields
    fn upsert_merge(&mut self, uid: &str, update: &ProfileUpdate) -> Result<Profile>;

    /// Live profile snapshots; `None` while no profile exists
    fn subscribe_profile(&mut self, uid: &str) -> Result<Subscription<Option<Profile>>>;
}

/// File-backed store rooted at a data directory
pub struct LocalStore {
    root: PathBuf,
    meal_feed: Feed<(String, NaiveDate), Vec<MealEntry>>,
    profile_feed: Feed<String, Option<Profile>>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            meal_feed: Feed::new(),
            profile_feed: Feed::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, uid: &str) -> Result<PathBuf> {
        // uids become directory names
        let valid = !uid.is_empty()
            && uid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Storage(format!("Invalid user id: {:?}", uid)));
        }
        Ok(self.root.join("users").join(uid))
    }

    fn profile_path(&self, uid: &str) -> Result<PathBuf> {
        Ok(self.user_dir(uid)?.join("profile.json"))
    }

    fn meals_path(&self, uid: &str, date: NaiveDate) -> Result<PathBuf> {
        Ok(self
            .user_dir(uid)?
            .join("meals")
            .join(format!("{}.json", date.format("%Y-%m-%d"))))
    }

    fn load_meals(&self, uid: &str, date: NaiveDate) -> Result<Vec<MealEntry>> {
        let path = self.meals_path(uid, date)?;
        let records: Vec<Value> = load_json(&path)?.unwrap_or_default();
        Ok(MealDay::decode(&path, records).sorted_meals())
    }

    /// Load a day for modification; fails rather than read a bad file as empty
    fn load_day(&self, uid: &str, date: NaiveDate) -> Result<MealDay> {
        let path = self.meals_path(uid, date)?;
        let records: Vec<Value> = load_json_strict(&path)?.unwrap_or_default();
        Ok(MealDay::decode(&path, records))
    }

    fn save_day(&mut self, uid: &str, date: NaiveDate, day: MealDay) -> Result<()> {
        let path = self.meals_path(uid, date)?;
        save_json(&path, &day.records()?)?;

        self.meal_feed
            .publish(&(uid.to_string(), date), day.sorted_meals());
        Ok(())
    }
}

/// One stored day: decoded meals plus records that failed to decode.
///
/// Undecodable records are skipped when listing but written back verbatim,
/// so a single bad record neither hides the rest of the day nor gets lost
/// on the next write.
struct MealDay {
    meals: Vec<MealEntry>,
    unreadable: Vec<Value>,
}

impl MealDay {
    fn decode(path: &Path, records: Vec<Value>) -> Self {
        let mut meals = Vec::with_capacity(records.len());
        let mut unreadable = Vec::new();

        for record in records {
            match serde_json::from_value::<MealEntry>(record.clone()) {
                Ok(meal) => meals.push(meal),
                Err(e) => {
                    tracing::warn!("Skipping malformed meal in {:?}: {}", path, e);
                    unreadable.push(record);
                }
            }
        }

        Self { meals, unreadable }
    }

    fn sorted_meals(&self) -> Vec<MealEntry> {
        let mut meals = self.meals.clone();
        meals.sort_by(|a, b| a.time.cmp(&b.time));
        meals
    }

    fn records(&self) -> Result<Vec<Value>> {
        let mut records = Vec::with_capacity(self.meals.len() + self.unreadable.len());
        for meal in self.sorted_meals() {
            records.push(serde_json::to_value(&meal)?);
        }
        records.extend(self.unreadable.iter().cloned());
        Ok(records)
    }

    /// Drop every record carrying `id`; returns how many went
    fn remove(&mut self, id: &str) -> usize {
        let before = self.meals.len() + self.unreadable.len();
        self.meals.retain(|m| m.id != id);
        self.unreadable
            .retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        before - self.meals.len() - self.unreadable.len()
    }
}

impl MealStore for LocalStore {
    fn create(&mut self, uid: &str, meal: NewMeal) -> Result<String> {
        let date = meal.date;
        let id = Uuid::new_v4().simple().to_string();

        let mut day = self.load_day(uid, date)?;
        day.meals.push(meal.into_entry(id.clone()));
        self.save_day(uid, date, day)?;

        tracing::debug!("Created meal {} for {} on {}", id, uid, date);
        Ok(id)
    }

    fn delete(&mut self, uid: &str, date: NaiveDate, id: &str) -> Result<()> {
        let mut day = self.load_day(uid, date)?;
        if day.remove(id) == 0 {
            return Err(Error::Storage(format!("No meal {} on {}", id, date)));
        }
        self.save_day(uid, date, day)?;

        tracing::debug!("Deleted meal {} for {} on {}", id, uid, date);
        Ok(())
    }

    fn list(&self, uid: &str, date: NaiveDate) -> Result<Vec<MealEntry>> {
        self.load_meals(uid, date)
    }

    fn subscribe_meals(
        &mut self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Subscription<Vec<MealEntry>>> {
        let current = self.load_meals(uid, date)?;
        Ok(self.meal_feed.subscribe((uid.to_string(), date), current))
    }
}

impl ProfileStore for LocalStore {
    fn read_profile(&self, uid: &str) -> Result<Option<Profile>> {
        load_json(&self.profile_path(uid)?)
    }

    fn upsert_merge(&mut self, uid: &str, update: &ProfileUpdate) -> Result<Profile> {
        let path = self.profile_path(uid)?;
        let mut profile: Profile = load_json_strict(&path)?.unwrap_or_default();
        profile.merge(update);
        save_json(&path, &profile)?;

        tracing::info!("Saved profile for {}", uid);
        self.profile_feed
            .publish(&uid.to_string(), Some(profile.clone()));
        Ok(profile)
    }

    fn subscribe_profile(&mut self, uid: &str) -> Result<Subscription<Option<Profile>>> {
        let current = self.read_profile(uid)?;
        Ok(self.profile_feed.subscribe(uid.to_string(), current))
    }
}
