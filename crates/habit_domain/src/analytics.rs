//! Dashboard analytics derived from the rolling aggregator.
//!
//! Every function takes an immutable snapshot plus the reference date, so
//! results are deterministic for a given input.

use chrono::NaiveDate;
use serde::Serialize;

use crate::category::{
    find_category, Category, CategoryId, UNCATEGORIZED_COLOR, UNCATEGORIZED_NAME,
};
use crate::date::day_of_week;
use crate::habit::Habit;
use crate::rollup::{day_completion, mean_of_days, window_average, window_days, Window};
use crate::streak::{best_streak, total_completions};

/// Longest look-back for averages, best day and perfect days.
pub const ANALYSIS_WINDOW_DAYS: u32 = 30;
/// Look-back for the weekly series, trend and category breakdown.
pub const WEEK_DAYS: u32 = 7;

/// Earliest creation date in the collection, or `today` when it is empty.
pub fn tracking_start(habits: &[Habit], today: NaiveDate) -> NaiveDate {
    habits
        .iter()
        .map(|habit| habit.created_at)
        .min()
        .unwrap_or(today)
}

/// Calendar days from the tracking start through `today`, inclusive.
pub fn days_since_start(tracking_start: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - tracking_start).num_days() + 1;
    u32::try_from(days.max(1)).unwrap_or(u32::MAX)
}

fn capped_window_days(habits: &[Habit], today: NaiveDate, cap: u32) -> u32 {
    cap.min(days_since_start(tracking_start(habits, today), today))
}

fn analysis_window(habits: &[Habit], today: NaiveDate) -> Window {
    let len = capped_window_days(habits, today, ANALYSIS_WINDOW_DAYS);
    Window::trailing(today, len, tracking_start(habits, today))
}

fn to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklyPoint {
    pub date: NaiveDate,
    pub weekday: u8,
    pub completed: usize,
    pub total: usize,
    pub rate: f64,
    /// The date precedes the tracking start; `rate` is a placeholder 0.
    pub no_data: bool,
}

/// Seven daily points ending `today`, oldest first.
pub fn weekly_series(habits: &[Habit], today: NaiveDate) -> Vec<WeeklyPoint> {
    let start = tracking_start(habits, today);
    let window = Window::trailing(today, WEEK_DAYS, NaiveDate::MIN);
    window
        .dates()
        .map(|date| {
            let no_data = date < start;
            let day = day_completion(habits, date);
            WeeklyPoint {
                date,
                weekday: day_of_week(date),
                completed: day.completed,
                total: day.total,
                rate: if no_data { 0.0 } else { day.rate },
                no_data,
            }
        })
        .collect()
}

/// Change in average completion between this week and the week before, in
/// whole percentage points. Reports 0 when the previous week has nothing to
/// compare against.
pub fn trend(habits: &[Habit], today: NaiveDate) -> i32 {
    let start = tracking_start(habits, today);
    let this_week = window_average(habits, &Window::new(today, 0, WEEK_DAYS - 1, start));
    let last_week = window_average(
        habits,
        &Window::new(today, WEEK_DAYS, 2 * WEEK_DAYS - 1, start),
    );
    if !last_week.has_data() {
        return 0;
    }
    to_percent(this_week.mean - last_week.mean).round() as i32
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BestDay {
    /// Sunday = 0.
    pub weekday: u8,
    pub average: f64,
}

/// Weekday with the highest average rate in the analysis window. Ties go to
/// the lowest weekday index.
pub fn best_day_of_week(habits: &[Habit], today: NaiveDate) -> Option<BestDay> {
    let days = window_days(habits, &analysis_window(habits, today));
    let mut best: Option<BestDay> = None;

    for weekday in 0..7u8 {
        let average = mean_of_days(
            days.iter()
                .filter(|(date, _)| day_of_week(*date) == weekday)
                .map(|(_, day)| day),
        );
        if !average.has_data() {
            continue;
        }
        if best.map_or(true, |current| average.mean > current.average) {
            best = Some(BestDay {
                weekday,
                average: average.mean,
            });
        }
    }

    best
}

/// Mean daily rate over the analysis window as a rounded percentage.
pub fn average_completion_rate(habits: &[Habit], today: NaiveDate) -> u32 {
    let average = window_average(habits, &analysis_window(habits, today));
    to_percent(average.mean).round() as u32
}

/// Days in the analysis window where every scheduled habit met its goal.
pub fn perfect_days(habits: &[Habit], today: NaiveDate) -> u32 {
    window_days(habits, &analysis_window(habits, today))
        .iter()
        .filter(|(_, day)| day.is_perfect())
        .count() as u32
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryStat {
    /// `None` for habits without a category or whose category is gone.
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub color: String,
    pub habit_count: usize,
    pub rate: u32,
}

/// Weekly average per category, restricted to that category's habits.
/// Categories without habits are omitted.
pub fn category_breakdown(
    habits: &[Habit],
    categories: &[Category],
    today: NaiveDate,
) -> Vec<CategoryStat> {
    let window = Window::trailing(
        today,
        capped_window_days(habits, today, WEEK_DAYS),
        tracking_start(habits, today),
    );

    let mut stats: Vec<CategoryStat> = categories
        .iter()
        .filter_map(|category| {
            let members = habits
                .iter()
                .filter(move |habit| habit.category_id == Some(category.id));
            let habit_count = members.clone().count();
            if habit_count == 0 {
                return None;
            }
            Some(CategoryStat {
                category_id: Some(category.id),
                name: category.name.clone(),
                color: category.color.clone(),
                habit_count,
                rate: to_percent(window_average(members, &window).mean).round() as u32,
            })
        })
        .collect();

    let loose = habits.iter().filter(|habit| {
        habit
            .category_id
            .and_then(|id| find_category(categories, id))
            .is_none()
    });
    let habit_count = loose.clone().count();
    if habit_count > 0 {
        stats.push(CategoryStat {
            category_id: None,
            name: UNCATEGORIZED_NAME.to_string(),
            color: UNCATEGORIZED_COLOR.to_string(),
            habit_count,
            rate: to_percent(window_average(loose, &window).mean).round() as u32,
        });
    }

    stats
}

/// Header figures for the current day.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub completed: usize,
    pub total: usize,
    pub total_habits: usize,
    pub best_streak: u32,
    pub total_completions: usize,
}

impl TodaySummary {
    pub fn compute(habits: &[Habit], today: NaiveDate) -> Self {
        let scheduled = habits.iter().filter(|habit| habit.is_active_on(today));
        Self {
            date: today,
            completed: scheduled
                .clone()
                .filter(|habit| habit.is_goal_met(today))
                .count(),
            total: scheduled.count(),
            total_habits: habits.len(),
            best_streak: best_streak(habits, today),
            total_completions: total_completions(habits),
        }
    }

    pub fn all_done(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Everything the statistics view shows, computed from one snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsReport {
    pub tracking_start: NaiveDate,
    pub days_since_start: u32,
    pub weekly: Vec<WeeklyPoint>,
    pub trend: i32,
    pub best_day: Option<BestDay>,
    pub average_rate: u32,
    pub perfect_days: u32,
    pub categories: Vec<CategoryStat>,
    pub today: TodaySummary,
}

impl AnalyticsReport {
    pub fn compute(habits: &[Habit], categories: &[Category], today: NaiveDate) -> Self {
        let start = tracking_start(habits, today);
        Self {
            tracking_start: start,
            days_since_start: days_since_start(start, today),
            weekly: weekly_series(habits, today),
            trend: trend(habits, today),
            best_day: best_day_of_week(habits, today),
            average_rate: average_completion_rate(habits, today),
            perfect_days: perfect_days(habits, today),
            categories: category_breakdown(habits, categories, today),
            today: TodaySummary::compute(habits, today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{date_key, days_before};
    use crate::habit::{HabitId, NewHabit};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Friday.
    fn today() -> NaiveDate {
        day(2025, 11, 7)
    }

    fn habit(id: u64, created: NaiveDate) -> Habit {
        Habit::from_new(HabitId(id), NewHabit::named(format!("h{id}")), created)
    }

    fn complete_back(habit: &mut Habit, offsets: impl IntoIterator<Item = u32>) {
        for offset in offsets {
            habit
                .days
                .insert(date_key(days_before(today(), offset).unwrap()), 1);
        }
    }

    fn category(id: u64, name: &str) -> Category {
        Category {
            id: CategoryId(id),
            name: name.into(),
            color: "#000".into(),
        }
    }

    #[test]
    fn tracking_start_is_earliest_creation() {
        let habits = [habit(1, day(2025, 10, 1)), habit(2, day(2025, 9, 15))];
        assert_eq!(tracking_start(&habits, today()), day(2025, 9, 15));
        assert_eq!(tracking_start(&[], today()), today());
    }

    #[test]
    fn days_since_start_includes_start_day() {
        assert_eq!(days_since_start(today(), today()), 1);
        assert_eq!(days_since_start(day(2025, 11, 5), today()), 3);
        assert_eq!(days_since_start(day(2025, 11, 9), today()), 1);
    }

    #[test]
    fn weekly_series_flags_days_before_tracking() {
        let mut h = habit(1, day(2025, 11, 5));
        complete_back(&mut h, [0, 1, 2]);
        let series = weekly_series(&[h], today());
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, day(2025, 11, 1));
        assert_eq!(series[6].date, today());
        assert!(series[..4].iter().all(|point| point.no_data && point.rate == 0.0));
        assert!(series[4..].iter().all(|point| !point.no_data && point.rate == 1.0));
    }

    #[test]
    fn trend_compares_weeks() {
        let mut h = habit(1, day(2025, 1, 1));
        complete_back(&mut h, 0..7);
        complete_back(&mut h, [7, 8, 9, 10]);
        // This week 100%, last week 4/7.
        assert_eq!(trend(&[h], today()), 43);
    }

    #[test]
    fn trend_is_zero_without_previous_week() {
        let mut h = habit(1, day(2025, 11, 4));
        complete_back(&mut h, 0..4);
        assert_eq!(trend(&[h], today()), 0);
    }

    #[test]
    fn best_day_prefers_highest_then_lowest_index() {
        let mut h = habit(1, day(2025, 1, 1));
        // Only Fridays and Tuesdays are completed, all within 30 days.
        for offset in 0..30 {
            let date = days_before(today(), offset).unwrap();
            if matches!(day_of_week(date), 2 | 5) {
                h.days.insert(date_key(date), 1);
            }
        }
        let best = best_day_of_week(&[h], today()).unwrap();
        assert_eq!(best.weekday, 2);
        assert_eq!(best.average, 1.0);
    }

    #[test]
    fn best_day_is_none_without_data() {
        assert_eq!(best_day_of_week(&[], today()), None);
    }

    #[test]
    fn averages_only_cover_days_since_creation() {
        let mut h = habit(1, day(2025, 11, 5));
        complete_back(&mut h, [0, 1]);
        let habits = [h];
        assert_eq!(average_completion_rate(&habits, today()), 67);
        assert_eq!(perfect_days(&habits, today()), 2);
    }

    #[test]
    fn perfect_days_need_every_habit() {
        let mut a = habit(1, day(2025, 10, 1));
        let mut b = habit(2, day(2025, 10, 1));
        complete_back(&mut a, 0..5);
        complete_back(&mut b, [0, 2]);
        assert_eq!(perfect_days(&[a, b], today()), 2);
    }

    #[test]
    fn breakdown_skips_empty_categories() {
        let mut fit = habit(1, day(2025, 10, 1));
        fit.category_id = Some(CategoryId(1));
        complete_back(&mut fit, 0..7);
        let mut stray = habit(2, day(2025, 10, 1));
        stray.category_id = Some(CategoryId(42));
        let categories = [category(1, "Fitness"), category(2, "Reading")];

        let stats = category_breakdown(&[fit, stray], &categories, today());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "Fitness");
        assert_eq!(stats[0].rate, 100);
        assert_eq!(stats[0].habit_count, 1);
        assert_eq!(stats[1].category_id, None);
        assert_eq!(stats[1].rate, 0);
        assert!(stats.iter().all(|stat| stat.name != "Reading"));
    }

    #[test]
    fn breakdown_without_habits_is_empty() {
        let categories = [category(1, "Fitness")];
        assert!(category_breakdown(&[], &categories, today()).is_empty());
    }

    #[test]
    fn today_summary_counts_scheduled_habits() {
        let mut a = habit(1, day(2025, 10, 1));
        let b = habit(2, day(2025, 10, 1));
        let mut weekend = habit(3, day(2025, 10, 1));
        weekend.active_days = [0, 6].into_iter().collect();
        complete_back(&mut a, [0]);
        let summary = TodaySummary::compute(&[a, b, weekend], today());
        assert_eq!((summary.completed, summary.total), (1, 2));
        assert_eq!(summary.total_habits, 3);
        assert_eq!(summary.best_streak, 1);
        assert!(!summary.all_done());
    }

    #[test]
    fn report_is_idempotent() {
        let mut a = habit(1, day(2025, 9, 1));
        a.category_id = Some(CategoryId(1));
        complete_back(&mut a, [0, 1, 3, 5, 8, 13, 21]);
        let habits = [a, habit(2, day(2025, 10, 20))];
        let categories = [category(1, "Mind")];
        let first = AnalyticsReport::compute(&habits, &categories, today());
        let second = AnalyticsReport::compute(&habits, &categories, today());
        assert_eq!(first, second);
        assert_eq!(first.days_since_start, 68);
    }
}
