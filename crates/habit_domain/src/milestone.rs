use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::TodaySummary;
use crate::habit::Habit;
use crate::streak::streak;

/// What a completion toggle achieved, for the presentation layer to announce.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    /// Every habit scheduled today is done.
    AllDone,
    /// The streak reached a whole number of weeks.
    WeeklyStreak { days: u32 },
    StreakStarted,
    StreakContinued { days: u32 },
    Completed,
    /// A multi-count goal moved forward without being reached.
    Progress { count: u32, goal: u32 },
}

/// Classifies the count `habit` just reached on `today`. `habits` must already
/// contain the updated habit. Resets to 0 produce nothing.
pub fn classify_completion(
    habits: &[Habit],
    habit: &Habit,
    new_count: u32,
    today: NaiveDate,
) -> Option<Milestone> {
    let goal = habit.goal();
    if new_count == 0 {
        return None;
    }
    if new_count != goal {
        return (goal > 1).then_some(Milestone::Progress {
            count: new_count,
            goal,
        });
    }

    if TodaySummary::compute(habits, today).all_done() {
        return Some(Milestone::AllDone);
    }
    let days = streak(habit, today);
    let milestone = match days {
        0 => Milestone::Completed,
        1 => Milestone::StreakStarted,
        n if n % 7 == 0 => Milestone::WeeklyStreak { days: n },
        n => Milestone::StreakContinued { days: n },
    };
    Some(milestone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{date_key, days_before};
    use crate::habit::{HabitId, NewHabit};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 7).unwrap()
    }

    fn habit(id: u64, goal: u32) -> Habit {
        Habit::from_new(
            HabitId(id),
            NewHabit::named(format!("h{id}")).with_goal(goal),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
    }

    fn complete_back(habit: &mut Habit, offsets: std::ops::Range<u32>) {
        for offset in offsets {
            let key = date_key(days_before(today(), offset).unwrap());
            habit.days.insert(key, habit.goal());
        }
    }

    #[test]
    fn finishing_the_last_habit_is_all_done() {
        let mut only = habit(1, 1);
        complete_back(&mut only, 0..3);
        let habits = vec![only.clone()];
        assert_eq!(
            classify_completion(&habits, &only, 1, today()),
            Some(Milestone::AllDone)
        );
    }

    #[test]
    fn streak_milestones() {
        let other = habit(2, 1);
        let mut target = habit(1, 1);

        complete_back(&mut target, 0..1);
        let habits = vec![target.clone(), other.clone()];
        assert_eq!(
            classify_completion(&habits, &target, 1, today()),
            Some(Milestone::StreakStarted)
        );

        complete_back(&mut target, 0..7);
        let habits = vec![target.clone(), other.clone()];
        assert_eq!(
            classify_completion(&habits, &target, 1, today()),
            Some(Milestone::WeeklyStreak { days: 7 })
        );

        complete_back(&mut target, 0..9);
        let habits = vec![target.clone(), other];
        assert_eq!(
            classify_completion(&habits, &target, 1, today()),
            Some(Milestone::StreakContinued { days: 9 })
        );
    }

    #[test]
    fn partial_progress_and_reset() {
        let mut target = habit(1, 3);
        target.days.insert(date_key(today()), 2);
        let habits = vec![target.clone(), habit(2, 1)];
        assert_eq!(
            classify_completion(&habits, &target, 2, today()),
            Some(Milestone::Progress { count: 2, goal: 3 })
        );
        assert_eq!(classify_completion(&habits, &target, 0, today()), None);
    }
}
