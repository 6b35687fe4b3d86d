use chrono::NaiveDate;

use crate::habit::Habit;

/// Longest streak ever reported.
pub const STREAK_CAP: u32 = 365;
/// Upper bound on days walked, so sparse schedules still terminate.
const LOOKBACK_GUARD_DAYS: u32 = STREAK_CAP * 7;

/// Consecutive scheduled days with the goal met, walking backward from
/// `as_of`. Unscheduled days are skipped. A scheduled day that is not yet
/// complete, `as_of` included, ends the walk.
pub fn streak(habit: &Habit, as_of: NaiveDate) -> u32 {
    let mut count = 0;
    let mut cursor = Some(as_of);
    let mut walked = 0;

    while let Some(date) = cursor {
        if count >= STREAK_CAP || walked >= LOOKBACK_GUARD_DAYS {
            break;
        }
        walked += 1;
        cursor = date.pred_opt();

        if !habit.is_active_on(date) {
            continue;
        }
        if !habit.is_goal_met(date) {
            break;
        }
        count += 1;
    }

    count
}

/// Highest current streak across the collection.
pub fn best_streak(habits: &[Habit], as_of: NaiveDate) -> u32 {
    habits
        .iter()
        .map(|habit| streak(habit, as_of))
        .max()
        .unwrap_or(0)
}

/// Number of recorded days, across all habits, that were scheduled and met
/// the goal.
pub fn total_completions(habits: &[Habit]) -> usize {
    habits
        .iter()
        .map(|habit| {
            habit
                .days
                .iter()
                .filter(|(key, count)| {
                    crate::habit::is_active_on_key(habit, key) && **count >= habit.goal()
                })
                .count()
        })
        .sum()
}
