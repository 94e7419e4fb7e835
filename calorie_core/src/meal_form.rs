//! Meal entry form.
//!
//! Input is checked before the store is touched; a storage failure leaves
//! the form exactly as the user typed it so the add can be retried.

use chrono::{Local, NaiveDate, NaiveTime};

use crate::input::{parse_positive, trim_leading_zeros};
use crate::notice::Notice;
use crate::storage::MealStore;
use crate::types::hhmm;
use crate::{Error, MealEntry, NewMeal, Result, User};

pub const INVALID_MEAL: &str = "Please fill all fields correctly.";
pub const MEAL_ADDED: &str = "Meal added successfully.";

#[derive(Clone, Debug, PartialEq)]
pub struct MealForm {
    date: NaiveDate,
    name: String,
    calories: String,
    time: String,
    saving: bool,
}

impl MealForm {
    /// Empty form for `date`, time preset to `time`
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            name: String::new(),
            calories: String::new(),
            time: time.format(hhmm::FORMAT).to_string(),
            saving: false,
        }
    }

    /// Empty form for today at the current local time
    pub fn now() -> Self {
        let now = Local::now();
        Self::new(now.date_naive(), now.time())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calories(&self) -> &str {
        &self.calories
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_calories(&mut self, text: &str) {
        self.calories = trim_leading_zeros(text);
    }

    pub fn set_time(&mut self, text: &str) {
        self.time = text.to_string();
    }

    fn validated(&self) -> Result<NewMeal> {
        let name = self.name.trim();
        let calories = parse_positive(&self.calories);
        let time = hhmm::parse(&self.time);

        match (name.is_empty(), calories, time) {
            (false, Some(calories), Some(time)) => Ok(NewMeal {
                name: name.to_string(),
                calories,
                time,
                date: self.date,
            }),
            _ => Err(Error::Validation(INVALID_MEAL.to_string())),
        }
    }

    /// Add the meal; on success clears name and calories and returns the
    /// notice to show. Date and time stay as they were.
    pub fn submit<S: MealStore + ?Sized>(
        &mut self,
        store: &mut S,
        user: &User,
    ) -> Result<(MealEntry, Notice)> {
        if self.saving {
            return Err(Error::Busy);
        }
        let meal = self.validated()?;

        self.saving = true;
        let result = store.create(&user.uid, meal.clone());
        self.saving = false;

        let id = result?;
        tracing::info!("Logged {} ({} kcal) on {}", meal.name, meal.calories, meal.date);

        self.name.clear();
        self.calories.clear();
        Ok((meal.into_entry(id), Notice::success(MEAL_ADDED)))
    }

    /// Delete a meal on the form's date
    pub fn remove<S: MealStore + ?Sized>(&mut self, store: &mut S, user: &User, id: &str) -> Result<()> {
        if self.saving {
            return Err(Error::Busy);
        }

        self.saving = true;
        let result = store.delete(&user.uid, self.date, id);
        self.saving = false;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;
    use crate::storage::LocalStore;
    use crate::live::Subscription;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    fn form() -> MealForm {
        MealForm::new(day(), NaiveTime::from_hms_opt(12, 30, 0).unwrap())
    }

    fn user() -> User {
        User {
            uid: "u1".into(),
            email: None,
        }
    }

    /// Store whose writes always fail
    struct OfflineStore;

    impl MealStore for OfflineStore {
        fn create(&mut self, _uid: &str, _meal: NewMeal) -> Result<String> {
            Err(Error::Storage("You appear to be offline.".into()))
        }

        fn delete(&mut self, _uid: &str, _date: NaiveDate, _id: &str) -> Result<()> {
            Err(Error::Storage("You appear to be offline.".into()))
        }

        fn list(&self, _uid: &str, _date: NaiveDate) -> Result<Vec<MealEntry>> {
            Ok(vec![])
        }

        fn subscribe_meals(
            &mut self,
            _uid: &str,
            _date: NaiveDate,
        ) -> Result<Subscription<Vec<MealEntry>>> {
            Err(Error::Storage("You appear to be offline.".into()))
        }
    }

    #[test]
    fn test_time_preset_formats_as_hhmm() {
        assert_eq!(form().time(), "12:30");
    }

    #[test]
    fn test_submit_adds_meal_and_clears_inputs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(temp_dir.path());

        let mut form = form();
        form.set_name("Chicken salad");
        form.set_calories("0450");
        assert_eq!(form.calories(), "450");

        let (entry, notice) = form.submit(&mut store, &user()).unwrap();
        assert_eq!(entry.name, "Chicken salad");
        assert_eq!(entry.calories, 450.0);
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, MEAL_ADDED);

        assert_eq!(form.name(), "");
        assert_eq!(form.calories(), "");
        assert_eq!(form.time(), "12:30");
        assert_eq!(form.date(), day());

        let stored = store.list("u1", day()).unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[test]
    fn test_invalid_input_never_reaches_store() {
        let mut store = OfflineStore;
        let cases = [
            ("", "300", "08:00"),
            ("   ", "300", "08:00"),
            ("Toast", "", "08:00"),
            ("Toast", "0", "08:00"),
            ("Toast", "-20", "08:00"),
            ("Toast", "abc", "08:00"),
            ("Toast", "300", "25:00"),
            ("Toast", "300", ""),
        ];

        for (name, calories, time) in cases {
            let mut form = form();
            form.set_name(name);
            form.set_calories(calories);
            form.set_time(time);

            match form.submit(&mut store, &user()) {
                Err(Error::Validation(msg)) => assert_eq!(msg, INVALID_MEAL),
                other => panic!("{:?} accepted: {:?}", (name, calories, time), other),
            }
        }
    }

    #[test]
    fn test_storage_failure_keeps_form() {
        let mut store = OfflineStore;
        let mut form = form();
        form.set_name("Soup");
        form.set_calories("250");

        let err = form.submit(&mut store, &user()).unwrap_err();
        assert_eq!(Notice::from_error(&err).message, "You appear to be offline.");
        assert_eq!(form.name(), "Soup");
        assert_eq!(form.calories(), "250");
        assert!(!form.is_saving());
    }

    #[test]
    fn test_remove_meal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(temp_dir.path());

        let mut form = form();
        form.set_name("Snack");
        form.set_calories("120");
        let (entry, _) = form.submit(&mut store, &user()).unwrap();

        form.remove(&mut store, &user(), &entry.id).unwrap();
        assert!(store.list("u1", day()).unwrap().is_empty());
    }

    #[test]
    fn test_busy_form_refuses_second_submit() {
        let mut store = OfflineStore;
        let mut form = form();
        form.set_name("Snack");
        form.set_calories("120");
        form.saving = true;

        assert!(matches!(form.submit(&mut store, &user()), Err(Error::Busy)));
        assert!(matches!(form.remove(&mut store, &user(), "x"), Err(Error::Busy)));
    }
}
