//! CSV export of logged meals.

use chrono::NaiveDate;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::storage::MealStore;
use crate::types::hhmm;
use crate::{Error, MealEntry, Result, User};

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    time: String,
    name: String,
    calories: f64,
    id: String,
}

impl From<&MealEntry> for CsvRow {
    fn from(meal: &MealEntry) -> Self {
        CsvRow {
            date: meal.date.format("%Y-%m-%d").to_string(),
            time: meal.time.format(hhmm::FORMAT).to_string(),
            name: meal.name.clone(),
            calories: meal.calories,
            id: meal.id.clone(),
        }
    }
}

/// Write every meal from `from` through `to` (inclusive) to a CSV file
///
/// Rows are ordered by date, then time. The file is replaced atomically,
/// so a failed export never leaves a half-written file behind.
/// Returns the number of meals written.
pub fn export_meals_csv<S: MealStore + ?Sized>(
    store: &S,
    user: &User,
    from: NaiveDate,
    to: NaiveDate,
    path: &Path,
) -> Result<usize> {
    if from > to {
        return Err(Error::Validation(format!(
            "Export range starts after it ends ({} > {})",
            from, to
        )));
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp.as_file());

    let mut count = 0;
    for date in from.iter_days().take_while(|d| *d <= to) {
        for meal in store.list(&user.uid, date)? {
            writer.serialize(CsvRow::from(&meal))?;
            count += 1;
        }
    }

    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} meals ({} to {}) to {:?}", count, from, to, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use crate::NewMeal;
    use chrono::NaiveTime;

    fn user() -> User {
        User {
            uid: "u1".into(),
            email: None,
        }
    }

    fn meal(date: NaiveDate, name: &str, calories: f64, hh: u32) -> NewMeal {
        NewMeal {
            name: name.into(),
            calories,
            time: NaiveTime::from_hms_opt(hh, 0, 0).unwrap(),
            date,
        }
    }

    #[test]
    fn test_export_range() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(temp_dir.path().join("data"));

        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        store.create("u1", meal(d1, "Porridge", 300.0, 8)).unwrap();
        store.create("u1", meal(d2, "Curry, mild", 650.0, 19)).unwrap();
        store.create("u1", meal(d2, "Bagel", 280.0, 9)).unwrap();
        store.create("u1", meal(d3, "Outside range", 100.0, 9)).unwrap();

        let out = temp_dir.path().join("out/meals.csv");
        let count = export_meals_csv(&store, &user(), d1, d2, &out).unwrap();
        assert_eq!(count, 3);

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["date", "time", "name", "calories", "id"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][2], "Porridge");
        assert_eq!(&rows[1][2], "Bagel");
        assert_eq!(&rows[2][2], "Curry, mild");
        assert_eq!(&rows[2][1], "19:00");
    }

    #[test]
    fn test_export_rejects_inverted_range() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let result = export_meals_csv(&store, &user(), d1, d0, &temp_dir.path().join("x.csv"));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(!temp_dir.path().join("x.csv").exists());
    }
}
