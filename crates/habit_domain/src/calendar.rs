use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::date::days_before;
use crate::error::{HabitError, Result};
use crate::habit::Habit;
use crate::rollup::day_completion;

/// Days shown in the recent-days strip.
pub const RECENT_DAYS_SPAN: u32 = 15;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum CalendarCell {
    /// Padding before the first of the month in a Monday-first grid.
    #[serde(rename = "blank")]
    Blank,
    #[serde(rename = "day")]
    Day {
        date: NaiveDate,
        day: u32,
        is_today: bool,
        completed: usize,
        total: usize,
        rate: f64,
    },
}

/// Month view laid out Monday-first: leading blanks, then one cell per day.
pub fn month_grid(
    habits: &[Habit],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<Vec<CalendarCell>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(HabitError::InvalidMonth { year, month })?;
    let leading = first.weekday().num_days_from_monday() as usize;

    let mut cells = vec![CalendarCell::Blank; leading];
    cells.extend(
        first
            .iter_days()
            .take_while(|date| date.month() == month)
            .map(|date| {
                let tally = day_completion(habits, date);
                CalendarCell::Day {
                    date,
                    day: date.day(),
                    is_today: date == today,
                    completed: tally.completed,
                    total: tally.total,
                    rate: tally.rate,
                }
            }),
    );
    Ok(cells)
}

/// Moves `(year, month)` by `delta` months, wrapping years.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentDay {
    pub date: NaiveDate,
    pub day: u32,
    pub is_today: bool,
    pub rate: f64,
    pub has_habits: bool,
}

/// The `span` days ending `today`, oldest first.
pub fn recent_days(habits: &[Habit], today: NaiveDate, span: u32) -> Vec<RecentDay> {
    (0..span)
        .rev()
        .filter_map(|offset| days_before(today, offset))
        .map(|date| {
            let tally = day_completion(habits, date);
            RecentDay {
                date,
                day: date.day(),
                is_today: date == today,
                rate: tally.rate,
                has_habits: tally.has_habits(),
            }
        })
        .collect()
}
