use std::collections::BTreeSet;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::{
    analytics::{AnalyticsReport, TodaySummary},
    calendar::{self, CalendarCell, RecentDay},
    category::{find_category, Category, CategoryId},
    clock::{Clock, SystemClock},
    error::{HabitError, Result, StoreError},
    habit::{Habit, HabitId, NewHabit, ToggleOutcome},
    milestone::{classify_completion, Milestone},
    storage::{load_collection, save_collection, Collection, KeyValueStore},
    streak::streak,
};

/// Result of toggling a habit for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggled {
    pub count: u32,
    pub milestone: Option<Milestone>,
}

/// Owns the habit collection. Reads hand out cloned snapshots; every mutation
/// replaces the collection under the write lock and persists it.
pub struct HabitTracker {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    state: RwLock<TrackerState>,
}

struct TrackerState {
    collection: Collection,
    last_id: u64,
}

pub struct HabitTrackerBuilder {
    store: Option<Box<dyn KeyValueStore>>,
    clock: Box<dyn Clock>,
}

impl Default for HabitTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitTrackerBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Loads the stored collection. Without a store the tracker keeps its
    /// data in memory only.
    pub fn build(self) -> HabitTracker {
        let store = self.store.unwrap_or_else(|| Box::new(NullStore));
        let collection = load_collection(store.as_ref(), self.clock.today());
        let last_id = highest_id(&collection);
        HabitTracker {
            store,
            clock: self.clock,
            state: RwLock::new(TrackerState {
                collection,
                last_id,
            }),
        }
    }
}

impl HabitTracker {
    pub fn builder() -> HabitTrackerBuilder {
        HabitTrackerBuilder::new()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn snapshot(&self) -> Collection {
        self.state.read().collection.clone()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.state.read().collection.habits.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.state.read().collection.categories.clone()
    }

    pub fn habit(&self, id: HabitId) -> Result<Habit> {
        self.state
            .read()
            .collection
            .habits
            .iter()
            .find(|habit| habit.id == id)
            .cloned()
            .ok_or(HabitError::HabitNotFound(id))
    }

    pub fn add_habit(&self, new: NewHabit) -> Result<HabitId> {
        let name = non_blank(&new.name)?;
        check_weekdays(&new.active_days)?;
        let today = self.clock.today();
        let millis = self.clock.now().and_utc().timestamp_millis();

        let id = self.mutate(|state| {
            if let Some(category) = new.category_id {
                find_category(&state.collection.categories, category)
                    .ok_or(HabitError::CategoryNotFound(category))?;
            }
            let id = HabitId(next_id(state.last_id, millis)?);
            state.last_id = id.0;
            let habit = Habit::from_new(id, NewHabit { name, ..new }, today);
            state.collection.habits.push(habit);
            Ok(id)
        })?;
        debug!(%id, "habit added");
        Ok(id)
    }

    pub fn rename_habit(&self, id: HabitId, name: &str) -> Result<()> {
        let name = non_blank(name)?;
        self.update_habit(id, |habit| {
            habit.name = name;
            Ok(())
        })
    }

    pub fn set_habit_icon(&self, id: HabitId, icon: &str) -> Result<()> {
        self.update_habit(id, |habit| {
            habit.icon = icon.to_string();
            Ok(())
        })
    }

    /// A goal of 0 is stored as 1.
    pub fn set_daily_goal(&self, id: HabitId, goal: u32) -> Result<()> {
        self.update_habit(id, |habit| {
            habit.daily_goal = goal.max(1);
            Ok(())
        })
    }

    pub fn set_active_days(&self, id: HabitId, days: impl IntoIterator<Item = u8>) -> Result<()> {
        let days: BTreeSet<u8> = days.into_iter().collect();
        check_weekdays(&days)?;
        if days.is_empty() {
            return Err(HabitError::LastActiveDay);
        }
        self.update_habit(id, |habit| {
            habit.active_days = days;
            Ok(())
        })
    }

    /// Adds or removes one weekday. Removing the only remaining day fails.
    pub fn toggle_day_of_week(&self, id: HabitId, weekday: u8) -> Result<()> {
        check_weekdays(&BTreeSet::from([weekday]))?;
        self.update_habit(id, |habit| {
            if habit.active_days.contains(&weekday) {
                if habit.active_days.len() == 1 {
                    return Err(HabitError::LastActiveDay);
                }
                habit.active_days.remove(&weekday);
            } else {
                habit.active_days.insert(weekday);
            }
            Ok(())
        })
    }

    pub fn assign_category(&self, id: HabitId, category: Option<CategoryId>) -> Result<()> {
        self.mutate(|state| {
            if let Some(category) = category {
                find_category(&state.collection.categories, category)
                    .ok_or(HabitError::CategoryNotFound(category))?;
            }
            let habit = find_habit_mut(&mut state.collection.habits, id)?;
            habit.category_id = category;
            Ok(())
        })
    }

    pub fn toggle_today(&self, id: HabitId) -> Result<Option<Toggled>> {
        self.toggle_on(id, self.clock.today())
    }

    /// Advances the completion count of `id` on `date`. Returns `None` when the
    /// habit is not scheduled that day; nothing is changed or saved then.
    pub fn toggle_on(&self, id: HabitId, date: NaiveDate) -> Result<Option<Toggled>> {
        let mut state = self.state.write();
        let habit = find_habit_mut(&mut state.collection.habits, id)?;
        let count = match habit.toggle(date) {
            ToggleOutcome::Updated { count, .. } => count,
            ToggleOutcome::NotScheduled => return Ok(None),
        };
        let updated = habit.clone();
        self.persist(&state.collection);

        let milestone = classify_completion(&state.collection.habits, &updated, count, date);
        Ok(Some(Toggled { count, milestone }))
    }

    pub fn remove_habit(&self, id: HabitId) -> Result<Habit> {
        self.mutate(|state| {
            let index = state
                .collection
                .habits
                .iter()
                .position(|habit| habit.id == id)
                .ok_or(HabitError::HabitNotFound(id))?;
            Ok(state.collection.habits.remove(index))
        })
    }

    pub fn add_category(&self, name: &str, color: &str) -> Result<CategoryId> {
        let name = non_blank(name)?;
        self.mutate(|state| {
            let highest = state.collection.categories.iter().map(|c| c.id.0).max();
            let id = match highest {
                Some(max) => max
                    .checked_add(1)
                    .ok_or(HabitError::IdsExhausted("category"))?,
                None => 1,
            };
            let id = CategoryId(id);
            state.collection.categories.push(Category {
                id,
                name,
                color: color.to_string(),
            });
            Ok(id)
        })
    }

    pub fn update_category(&self, id: CategoryId, name: &str, color: &str) -> Result<()> {
        let name = non_blank(name)?;
        self.mutate(|state| {
            let category = state
                .collection
                .categories
                .iter_mut()
                .find(|category| category.id == id)
                .ok_or(HabitError::CategoryNotFound(id))?;
            category.name = name;
            category.color = color.to_string();
            Ok(())
        })
    }

    /// Deletes a category and detaches its habits; the habits themselves stay.
    pub fn remove_category(&self, id: CategoryId) -> Result<Category> {
        self.mutate(|state| {
            let index = state
                .collection
                .categories
                .iter()
                .position(|category| category.id == id)
                .ok_or(HabitError::CategoryNotFound(id))?;
            for habit in state
                .collection
                .habits
                .iter_mut()
                .filter(|habit| habit.category_id == Some(id))
            {
                habit.category_id = None;
            }
            Ok(state.collection.categories.remove(index))
        })
    }

    pub fn streak_for(&self, id: HabitId) -> Result<u32> {
        let habit = self.habit(id)?;
        Ok(streak(&habit, self.clock.today()))
    }

    pub fn report(&self) -> AnalyticsReport {
        let snapshot = self.snapshot();
        AnalyticsReport::compute(&snapshot.habits, &snapshot.categories, self.clock.today())
    }

    pub fn today_summary(&self) -> TodaySummary {
        TodaySummary::compute(&self.habits(), self.clock.today())
    }

    pub fn month_grid(&self, year: i32, month: u32) -> Result<Vec<CalendarCell>> {
        calendar::month_grid(&self.habits(), year, month, self.clock.today())
    }

    pub fn recent_days(&self) -> Vec<RecentDay> {
        calendar::recent_days(
            &self.habits(),
            self.clock.today(),
            calendar::RECENT_DAYS_SPAN,
        )
    }
}

impl HabitTracker {
    fn update_habit(
        &self,
        id: HabitId,
        apply: impl FnOnce(&mut Habit) -> Result<()>,
    ) -> Result<()> {
        self.mutate(|state| apply(find_habit_mut(&mut state.collection.habits, id)?))
    }

    /// Runs `apply` against a working copy and commits it only on success,
    /// then saves.
    fn mutate<T>(&self, apply: impl FnOnce(&mut TrackerState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let mut draft = TrackerState {
            collection: state.collection.clone(),
            last_id: state.last_id,
        };
        let value = apply(&mut draft)?;
        *state = draft;
        self.persist(&state.collection);
        Ok(value)
    }

    #[instrument(skip_all)]
    fn persist(&self, collection: &Collection) {
        if let Err(err) = save_collection(self.store.as_ref(), collection) {
            warn!(%err, "could not save habit collection");
        }
    }
}

struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> std::result::Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StoreError> {
        Ok(())
    }
}

fn find_habit_mut(habits: &mut [Habit], id: HabitId) -> Result<&mut Habit> {
    habits
        .iter_mut()
        .find(|habit| habit.id == id)
        .ok_or(HabitError::HabitNotFound(id))
}

fn non_blank(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitError::BlankName);
    }
    Ok(trimmed.to_string())
}

fn check_weekdays(days: &BTreeSet<u8>) -> Result<()> {
    match days.iter().find(|day| **day > 6) {
        Some(day) => Err(HabitError::InvalidWeekday(*day)),
        None => Ok(()),
    }
}

fn highest_id(collection: &Collection) -> u64 {
    collection
        .habits
        .iter()
        .map(|habit| habit.id.0)
        .max()
        .unwrap_or(0)
}

/// Ids follow the wall clock in milliseconds but always move past the last
/// issued id.
fn next_id(last_id: u64, now_millis: i64) -> Result<u64> {
    let following = last_id
        .checked_add(1)
        .ok_or(HabitError::IdsExhausted("habit"))?;
    Ok(u64::try_from(now_millis).unwrap_or(0).max(following))
}
