//! crates/dashboard_core/src/streak.rs
//!
//! Consecutive-day study tracking.

use crate::domain::User;
use chrono::NaiveDate;

/// The streak counters stored on a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub total_days: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl StreakState {
    pub fn from_user(user: &User) -> Self {
        Self {
            current: user.current_streak,
            longest: user.longest_streak,
            total_days: user.total_study_days,
            last_study_date: user.last_study_date,
        }
    }

    /// Records study activity on `day`.
    ///
    /// `first_session_that_day` must be true when the user had no session on
    /// `day` before this one. Days earlier than the last recorded study day
    /// only count towards the total; they never rewrite the streak.
    pub fn record_study_day(&mut self, day: NaiveDate, first_session_that_day: bool) {
        if first_session_that_day {
            self.total_days += 1;
        }

        match self.last_study_date {
            Some(last) if day <= last => {}
            Some(last) if last.succ_opt() == Some(day) => {
                self.current += 1;
                self.last_study_date = Some(day);
            }
            _ => {
                self.current = 1;
                self.last_study_date = Some(day);
            }
        }

        self.longest = self.longest.max(self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn first_ever_session_starts_a_streak() {
        let mut streak = StreakState::default();
        streak.record_study_day(day(4), true);
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 1);
        assert_eq!(streak.total_days, 1);
        assert_eq!(streak.last_study_date, Some(day(4)));
    }

    #[test]
    fn consecutive_days_extend_and_gaps_reset() {
        let mut streak = StreakState::default();
        streak.record_study_day(day(1), true);
        streak.record_study_day(day(2), true);
        streak.record_study_day(day(3), true);
        assert_eq!(streak.current, 3);

        streak.record_study_day(day(6), true);
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 3);
        assert_eq!(streak.total_days, 4);
    }

    #[test]
    fn second_session_on_the_same_day_changes_nothing() {
        let mut streak = StreakState::default();
        streak.record_study_day(day(1), true);
        let before = streak;
        streak.record_study_day(day(1), false);
        assert_eq!(streak, before);
    }

    #[test]
    fn backfilled_day_counts_only_towards_total() {
        let mut streak = StreakState {
            current: 5,
            longest: 9,
            total_days: 40,
            last_study_date: Some(day(10)),
        };
        streak.record_study_day(day(2), true);
        assert_eq!(streak.current, 5);
        assert_eq!(streak.total_days, 41);
        assert_eq!(streak.last_study_date, Some(day(10)));
    }
}
