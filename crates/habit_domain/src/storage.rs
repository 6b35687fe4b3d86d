use std::collections::HashSet;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::category::Category;
use crate::error::StoreError;
use crate::habit::{Habit, StoredHabit};

pub const HABITS_KEY: &str = "habits";
pub const CATEGORIES_KEY: &str = "categories";

/// String key-value persistence. Platform adapters implement this.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Everything the tracker persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collection {
    pub habits: Vec<Habit>,
    pub categories: Vec<Category>,
}

/// Reads both collections, repairing what it can. Unreadable values yield an
/// empty list and individual bad records are skipped; nothing here fails.
pub fn load_collection(store: &dyn KeyValueStore, today: NaiveDate) -> Collection {
    let mut seen = HashSet::new();
    let habits = load_records::<StoredHabit>(store, HABITS_KEY)
        .into_iter()
        .filter_map(|stored| Habit::normalize(stored, today))
        .filter(|habit| {
            let fresh = seen.insert(habit.id);
            if !fresh {
                warn!(id = %habit.id, "dropping habit with duplicate id");
            }
            fresh
        })
        .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    let categories = load_records::<Category>(store, CATEGORIES_KEY)
        .into_iter()
        .filter(|category| seen.insert(category.id))
        .collect::<Vec<_>>();

    debug!(
        habits = habits.len(),
        categories = categories.len(),
        "loaded habit collection"
    );
    Collection { habits, categories }
}

pub fn save_collection(store: &dyn KeyValueStore, collection: &Collection) -> Result<(), StoreError> {
    save_value(store, HABITS_KEY, &collection.habits)?;
    save_value(store, CATEGORIES_KEY, &collection.categories)?;
    debug!(
        habits = collection.habits.len(),
        categories = collection.categories.len(),
        "saved habit collection"
    );
    Ok(())
}

fn save_value<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &json)
}

fn load_records<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(key, %err, "could not read stored records");
            return Vec::new();
        }
    };

    let entries = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!(key, "stored value is not a list; starting empty");
            return Vec::new();
        }
        Err(err) => {
            warn!(key, %err, "stored value is not valid JSON; starting empty");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<T>(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(key, index, %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;
    use crate::category::CategoryId;
    use crate::habit::HabitId;

    #[derive(Default)]
    pub(crate) struct MapStore {
        pub(crate) values: Mutex<HashMap<String, String>>,
        pub(crate) fail_writes: bool,
    }

    impl MapStore {
        pub(crate) fn with(key: &str, value: &str) -> Self {
            let store = Self::default();
            store.values.lock().insert(key.to_string(), value.to_string());
            store
        }
    }

    impl KeyValueStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.lock().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Backend("quota exceeded".into()));
            }
            self.values.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 7).unwrap()
    }

    #[test]
    fn missing_keys_load_empty() {
        let collection = load_collection(&MapStore::default(), today());
        assert_eq!(collection, Collection::default());
    }

    #[test]
    fn corrupt_json_loads_empty() {
        let store = MapStore::with(HABITS_KEY, "{not json");
        assert!(load_collection(&store, today()).habits.is_empty());
        let store = MapStore::with(HABITS_KEY, r#"{"id": 1}"#);
        assert!(load_collection(&store, today()).habits.is_empty());
    }

    #[test]
    fn bad_records_are_skipped_individually() {
        let store = MapStore::with(
            HABITS_KEY,
            r#"[
                {"id": 1, "name": "Run", "days": {"2025-11-06": 1}},
                {"id": "oops", "name": 5},
                {"name": "No id"},
                {"id": 1, "name": "Duplicate"},
                {"id": 2, "name": "Read", "dailyGoal": 3, "activeDays": [1, 3, 5], "categoryId": 7, "createdAt": "2025-10-01"}
            ]"#,
        );
        let collection = load_collection(&store, today());
        let names: Vec<&str> = collection.habits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Run", "Read"]);
        let read = &collection.habits[1];
        assert_eq!(read.daily_goal, 3);
        assert_eq!(read.category_id, Some(CategoryId(7)));
        assert_eq!(collection.habits[0].created_at, today());
    }

    #[test]
    fn save_then_load_preserves_collection() {
        let store = MapStore::default();
        let mut habit = Habit::from_new(
            HabitId(9),
            crate::habit::NewHabit::named("Journal").with_goal(2),
            today(),
        );
        habit.days.insert("2025-11-07".into(), 2);
        let collection = Collection {
            habits: vec![habit],
            categories: vec![Category {
                id: CategoryId(1),
                name: "Mind".into(),
                color: "#6366f1".into(),
            }],
        };
        save_collection(&store, &collection).unwrap();
        assert_eq!(load_collection(&store, today()), collection);
    }
}
