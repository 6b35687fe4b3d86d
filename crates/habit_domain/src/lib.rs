//! Habit tracking domain: the habit model, streaks, rolling completion
//! rates and the analytics built on them, plus the tracker service that owns
//! and persists the collection.

pub mod analytics;
pub mod calendar;
pub mod category;
pub mod clock;
pub mod date;
pub mod error;
pub mod habit;
pub mod milestone;
pub mod rollup;
pub mod service;
pub mod storage;
pub mod streak;

pub use crate::analytics::AnalyticsReport;
pub use crate::category::{Category, CategoryId};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::error::{HabitError, Result, StoreError};
pub use crate::habit::{Habit, HabitId, NewHabit};
pub use crate::service::{HabitTracker, HabitTrackerBuilder};
pub use crate::storage::{Collection, KeyValueStore};
