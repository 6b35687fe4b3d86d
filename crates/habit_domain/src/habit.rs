use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::date::{date_key, day_of_week, parse_date_key};

pub const ALL_DAYS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];
pub const DEFAULT_ICON: &str = "💪";
/// Substituted when a stored record has no icon.
pub const FALLBACK_ICON: &str = "⭐";
/// Substituted when a stored record has no usable name.
pub const FALLBACK_NAME: &str = "Untitled habit";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct HabitId(pub u64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized habit. Every field is present and valid, so callers never
/// re-apply defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub icon: String,
    pub daily_goal: u32,
    pub active_days: BTreeSet<u8>,
    pub days: BTreeMap<String, u32>,
    pub category_id: Option<CategoryId>,
    pub created_at: NaiveDate,
}

/// Shape of a habit as it may appear in storage, including records written
/// before goals, schedules, categories or creation dates existed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredHabit {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub daily_goal: Option<u32>,
    pub active_days: Option<Vec<u8>>,
    pub days: Option<BTreeMap<String, u32>>,
    pub category_id: Option<u64>,
    pub created_at: Option<String>,
}

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub icon: String,
    pub daily_goal: u32,
    pub active_days: BTreeSet<u8>,
    pub category_id: Option<CategoryId>,
}

impl NewHabit {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: DEFAULT_ICON.to_string(),
            daily_goal: 1,
            active_days: ALL_DAYS.into_iter().collect(),
            category_id: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_goal(mut self, daily_goal: u32) -> Self {
        self.daily_goal = daily_goal;
        self
    }

    pub fn with_active_days(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.active_days = days.into_iter().collect();
        self
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category_id = Some(category);
        self
    }
}

/// Result of a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Updated { previous: u32, count: u32 },
    NotScheduled,
}

impl Habit {
    pub fn from_new(id: HabitId, new: NewHabit, created_at: NaiveDate) -> Self {
        Self {
            id,
            name: new.name.trim().to_string(),
            icon: new.icon,
            daily_goal: new.daily_goal.max(1),
            active_days: normalize_active_days(new.active_days),
            days: BTreeMap::new(),
            category_id: new.category_id,
            created_at,
        }
    }

    /// Applies every default a legacy or partial record may be missing.
    /// Returns `None` only when the record has no id to key it by.
    pub fn normalize(stored: StoredHabit, today: NaiveDate) -> Option<Self> {
        let id = HabitId(stored.id?);
        let icon = stored
            .icon
            .filter(|icon| !icon.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ICON.to_string());
        let created_at = stored
            .created_at
            .as_deref()
            .and_then(parse_date_key)
            .unwrap_or(today);
        let name = stored
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        Some(Self {
            id,
            name,
            icon,
            daily_goal: stored.daily_goal.unwrap_or(1).max(1),
            active_days: normalize_active_days(stored.active_days.unwrap_or_default()),
            days: normalize_day_keys(stored.days.unwrap_or_default()),
            category_id: stored.category_id.map(CategoryId),
            created_at,
        })
    }

    /// Completions required on an active day; never below 1.
    pub fn goal(&self) -> u32 {
        self.daily_goal.max(1)
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active_days.contains(&day_of_week(date))
    }

    /// Whether the habit had been created by `date`.
    pub fn existed_on(&self, date: NaiveDate) -> bool {
        self.created_at <= date
    }

    pub fn completions_on(&self, date: NaiveDate) -> u32 {
        self.days.get(&date_key(date)).copied().unwrap_or(0)
    }

    pub fn is_goal_met(&self, date: NaiveDate) -> bool {
        self.completions_on(date) >= self.goal()
    }

    pub fn progress_percent(&self, date: NaiveDate) -> f64 {
        f64::from(self.completions_on(date)) / f64::from(self.goal()) * 100.0
    }

    /// Advances the count for `date` one step around 0 -> 1 -> .. -> goal -> 0.
    pub fn toggle(&mut self, date: NaiveDate) -> ToggleOutcome {
        if !self.is_active_on(date) {
            return ToggleOutcome::NotScheduled;
        }
        let previous = self.completions_on(date);
        let count = if previous >= self.goal() {
            0
        } else {
            previous + 1
        };
        self.days.insert(date_key(date), count);
        ToggleOutcome::Updated { previous, count }
    }
}

pub fn is_active_on_key(habit: &Habit, key: &str) -> bool {
    parse_date_key(key).is_some_and(|date| habit.is_active_on(date))
}

pub fn is_goal_met_key(habit: &Habit, key: &str) -> bool {
    habit.days.get(key).copied().unwrap_or(0) >= habit.goal()
}

/// Re-keys every parseable entry to `YYYY-MM-DD`. Entries that collapse onto
/// the same day keep the higher count.
fn normalize_day_keys(raw: BTreeMap<String, u32>) -> BTreeMap<String, u32> {
    let mut days = BTreeMap::new();
    for (key, count) in raw {
        let Some(date) = parse_date_key(&key) else {
            continue;
        };
        let slot = days.entry(date_key(date)).or_insert(0);
        *slot = (*slot).max(count);
    }
    days
}

fn normalize_active_days(days: impl IntoIterator<Item = u8>) -> BTreeSet<u8> {
    let valid: BTreeSet<u8> = days.into_iter().filter(|day| *day < 7).collect();
    if valid.is_empty() {
        ALL_DAYS.into_iter().collect()
    } else {
        valid
    }
}
