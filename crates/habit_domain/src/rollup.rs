use chrono::NaiveDate;
use serde::Serialize;

use crate::date::days_before;
use crate::habit::Habit;

/// Completion tally for one calendar day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DayCompletion {
    pub completed: usize,
    pub total: usize,
    pub rate: f64,
}

impl DayCompletion {
    fn new(completed: usize, total: usize) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };
        Self {
            completed,
            total,
            rate,
        }
    }

    pub fn has_habits(&self) -> bool {
        self.total > 0
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Mean of per-day rates over the days that had at least one scheduled habit.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct WindowAverage {
    pub mean: f64,
    pub qualifying_days: usize,
}

impl WindowAverage {
    pub fn has_data(&self) -> bool {
        self.qualifying_days > 0
    }
}

/// Inclusive span `[today - end_offset, today - start_offset]`, clipped so it
/// never starts before `tracking_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub today: NaiveDate,
    pub start_offset: u32,
    pub end_offset: u32,
    pub tracking_start: NaiveDate,
}

impl Window {
    pub fn new(
        today: NaiveDate,
        start_offset: u32,
        end_offset: u32,
        tracking_start: NaiveDate,
    ) -> Self {
        Self {
            today,
            start_offset,
            end_offset,
            tracking_start,
        }
    }

    /// The `len` most recent days, today included.
    pub fn trailing(today: NaiveDate, len: u32, tracking_start: NaiveDate) -> Self {
        Self::new(today, 0, len.saturating_sub(1), tracking_start)
    }

    /// Dates in the window, oldest first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (self.start_offset..=self.end_offset)
            .rev()
            .filter_map(move |offset| days_before(self.today, offset))
            .filter(move |date| *date >= self.tracking_start)
    }
}

/// Tally of habits scheduled on `date` that already existed, and how many of
/// them met their goal.
pub fn day_completion<'a, I>(habits: I, date: NaiveDate) -> DayCompletion
where
    I: IntoIterator<Item = &'a Habit>,
{
    let (completed, total) = habits
        .into_iter()
        .filter(|habit| habit.is_active_on(date) && habit.existed_on(date))
        .fold((0, 0), |(completed, total), habit| {
            let done = usize::from(habit.is_goal_met(date));
            (completed + done, total + 1)
        });
    DayCompletion::new(completed, total)
}

/// Per-day tallies for every date in the window, oldest first.
pub fn window_days<'a, I>(habits: I, window: &Window) -> Vec<(NaiveDate, DayCompletion)>
where
    I: IntoIterator<Item = &'a Habit> + Clone,
{
    window
        .dates()
        .map(|date| (date, day_completion(habits.clone(), date)))
        .collect()
}

pub fn window_average<'a, I>(habits: I, window: &Window) -> WindowAverage
where
    I: IntoIterator<Item = &'a Habit> + Clone,
{
    mean_of_days(window_days(habits, window).iter().map(|(_, day)| day))
}

pub fn average_over_window<'a, I>(
    habits: I,
    today: NaiveDate,
    start_offset: u32,
    end_offset: u32,
    tracking_start: NaiveDate,
) -> f64
where
    I: IntoIterator<Item = &'a Habit> + Clone,
{
    let window = Window::new(today, start_offset, end_offset, tracking_start);
    window_average(habits, &window).mean
}

/// Averages the rates of days with scheduled habits; empty days are left out
/// rather than counted as 0%.
pub(crate) fn mean_of_days<'a>(days: impl Iterator<Item = &'a DayCompletion>) -> WindowAverage {
    let (sum, qualifying_days) = days
        .filter(|day| day.has_habits())
        .fold((0.0, 0), |(sum, n), day| (sum + day.rate, n + 1));
    let mean = if qualifying_days == 0 {
        0.0
    } else {
        sum / qualifying_days as f64
    };
    WindowAverage {
        mean,
        qualifying_days,
    }
}
