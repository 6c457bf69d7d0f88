//! Home-screen summary computed from the goal and workout lists.

use crate::{Goal, Workout};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Workouts dated within this many days count towards "this week"
const WEEK_WINDOW_DAYS: i64 = 7;

/// Aggregate counts shown on the dashboard
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub active_goals: usize,
    pub total_goals: usize,
    pub total_workouts: usize,
    pub completed_workouts: usize,
    pub workouts_this_week: usize,
    /// Mean goal progress, rounded to a whole percent
    pub average_progress_percent: u32,
}

impl DashboardSummary {
    pub fn summarize(goals: &[Goal], workouts: &[Workout], today: NaiveDate) -> Self {
        let week_start = today - Duration::days(WEEK_WINDOW_DAYS);

        let average_progress_percent = if goals.is_empty() {
            0
        } else {
            let total: f64 = goals.iter().map(Goal::progress_percent).sum();
            (total / goals.len() as f64).round() as u32
        };

        Self {
            active_goals: goals.iter().filter(|g| g.is_active()).count(),
            total_goals: goals.len(),
            total_workouts: workouts.len(),
            completed_workouts: workouts.iter().filter(|w| w.completed).count(),
            workouts_this_week: workouts.iter().filter(|w| w.date >= week_start).count(),
            average_progress_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(current: f64, target: f64) -> Goal {
        Goal {
            id: format!("g-{}-{}", current, target),
            title: "Goal".into(),
            description: None,
            target,
            current,
            unit: "x".into(),
            deadline: None,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn workout(date: NaiveDate, completed: bool) -> Workout {
        Workout {
            id: date.to_string(),
            name: "Treino".into(),
            description: None,
            duration_minutes: 30,
            exercises: vec![],
            completed,
            date,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_empty_summary() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let summary = DashboardSummary::summarize(&[], &[], today);
        assert_eq!(summary.active_goals, 0);
        assert_eq!(summary.total_workouts, 0);
        assert_eq!(summary.average_progress_percent, 0);
    }

    #[test]
    fn test_summary_counts() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let goals = vec![goal(5.0, 10.0), goal(10.0, 10.0), goal(0.0, 4.0)];
        let workouts = vec![
            workout(today, true),
            workout(today - Duration::days(7), false),
            workout(today - Duration::days(8), true),
        ];

        let summary = DashboardSummary::summarize(&goals, &workouts, today);
        assert_eq!(summary.active_goals, 2);
        assert_eq!(summary.total_goals, 3);
        assert_eq!(summary.total_workouts, 3);
        assert_eq!(summary.completed_workouts, 2);
        assert_eq!(summary.workouts_this_week, 2);
        assert_eq!(summary.average_progress_percent, 50);
    }
}
