//! Core domain types for the FourFitness tracker.
//!
//! This module defines the records exchanged with the REST backend and
//! mirrored into local storage:
//! - Goals ("metas") with numeric progress
//! - Workouts ("treinos") with a completion flag
//! - BMI records
//!
//! Field names on the wire follow the backend (camelCase for goals,
//! Portuguese names for workouts).

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Goals
// ============================================================================

/// A user-defined goal with numeric progress towards a target
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target: f64,
    pub current: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// A goal stays active until current progress reaches the target
    pub fn is_active(&self) -> bool {
        self.current < self.target
    }

    /// Progress as a percentage in `[0, 100]`
    pub fn progress_percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.current / self.target * 100.0).clamp(0.0, 100.0)
    }
}

/// User-supplied fields for a new goal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target: f64,
    #[serde(default)]
    pub current: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl NewGoal {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("goal title is required".into()));
        }
        if self.unit.trim().is_empty() {
            return Err(Error::Validation("goal unit is required".into()));
        }
        check_non_negative("target", self.target)?;
        check_non_negative("current", self.current)
    }
}

/// Partial update for a goal; `None` fields are left untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl GoalPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("goal title cannot be empty".into()));
            }
        }
        if let Some(target) = self.target {
            check_non_negative("target", target)?;
        }
        if let Some(current) = self.current {
            check_non_negative("current", current)?;
        }
        Ok(())
    }

    pub fn apply(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(description) = &self.description {
            goal.description = Some(description.clone());
        }
        if let Some(target) = self.target {
            goal.target = target;
        }
        if let Some(current) = self.current {
            goal.current = current;
        }
        if let Some(unit) = &self.unit {
            goal.unit = unit.clone();
        }
        if let Some(deadline) = self.deadline {
            goal.deadline = Some(deadline);
        }
    }
}

// ============================================================================
// Workouts
// ============================================================================

/// A workout entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "duracao")]
    pub duration_minutes: u32,
    #[serde(rename = "exercicios", default)]
    pub exercises: Vec<String>,
    #[serde(rename = "concluido", default)]
    pub completed: bool,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// User-supplied fields for a new workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewWorkout {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "duracao")]
    pub duration_minutes: u32,
    #[serde(rename = "exercicios", default)]
    pub exercises: Vec<String>,
    #[serde(rename = "concluido", default)]
    pub completed: bool,
    #[serde(rename = "data")]
    pub date: NaiveDate,
}

impl NewWorkout {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("workout name is required".into()));
        }
        if self.exercises.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::Validation("exercise names cannot be empty".into()));
        }
        Ok(())
    }
}

/// Partial update for a workout; `None` fields are left untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPatch {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "duracao", default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "exercicios", default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<String>>,
    #[serde(rename = "concluido", default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl WorkoutPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("workout name cannot be empty".into()));
            }
        }
        Ok(())
    }

    pub fn apply(&self, workout: &mut Workout) {
        if let Some(name) = &self.name {
            workout.name = name.clone();
        }
        if let Some(description) = &self.description {
            workout.description = Some(description.clone());
        }
        if let Some(duration) = self.duration_minutes {
            workout.duration_minutes = duration;
        }
        if let Some(exercises) = &self.exercises {
            workout.exercises = exercises.clone();
        }
        if let Some(completed) = self.completed {
            workout.completed = completed;
        }
        if let Some(date) = self.date {
            workout.date = date;
        }
    }
}

// ============================================================================
// BMI
// ============================================================================

/// The most recent BMI computation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BmiRecord {
    /// Kilograms
    pub weight: f64,
    /// Metres, already normalised
    pub height: f64,
    pub bmi: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(current: f64, target: f64) -> Goal {
        Goal {
            id: "g1".into(),
            title: "Run".into(),
            description: None,
            target,
            current,
            unit: "km".into(),
            deadline: None,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_goal_active_until_target_reached() {
        assert!(goal(3.0, 10.0).is_active());
        assert!(!goal(10.0, 10.0).is_active());
        assert!(!goal(12.0, 10.0).is_active());
    }

    #[test]
    fn test_goal_progress_clamped() {
        assert_eq!(goal(5.0, 10.0).progress_percent(), 50.0);
        assert_eq!(goal(15.0, 10.0).progress_percent(), 100.0);
        assert_eq!(goal(5.0, 0.0).progress_percent(), 0.0);
    }

    #[test]
    fn test_new_goal_validation() {
        let mut draft = NewGoal {
            title: "Lose weight".into(),
            description: None,
            target: 5.0,
            current: 0.0,
            unit: "kg".into(),
            deadline: None,
        };
        assert!(draft.validate().is_ok());

        draft.current = -1.0;
        assert!(matches!(draft.validate(), Err(Error::Validation(_))));

        draft.current = 0.0;
        draft.title = "   ".into();
        assert!(matches!(draft.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_goal_patch_only_touches_set_fields() {
        let mut g = goal(1.0, 10.0);
        let patch = GoalPatch {
            current: Some(4.0),
            ..Default::default()
        };
        patch.apply(&mut g);
        assert_eq!(g.current, 4.0);
        assert_eq!(g.target, 10.0);
        assert_eq!(g.title, "Run");
    }

    #[test]
    fn test_workout_wire_names() {
        let json = r#"{
            "id": "w1",
            "nome": "Treino A",
            "duracao": 45,
            "exercicios": ["Agachamento", "Supino"],
            "concluido": false,
            "data": "2025-03-10"
        }"#;
        let workout: Workout = serde_json::from_str(json).unwrap();
        assert_eq!(workout.name, "Treino A");
        assert_eq!(workout.duration_minutes, 45);
        assert_eq!(workout.exercises.len(), 2);
        assert!(workout.description.is_none());

        let back = serde_json::to_value(&workout).unwrap();
        assert_eq!(back["nome"], "Treino A");
        assert!(back.get("descricao").is_none());
    }

    #[test]
    fn test_goal_wire_names_are_camel_case() {
        let mut g = goal(1.0, 2.0);
        g.user_id = Some("u1".into());
        let value = serde_json::to_value(&g).unwrap();
        assert_eq!(value["userId"], "u1");
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_new_workout_rejects_blank_exercise() {
        let draft = NewWorkout {
            name: "Full body".into(),
            description: None,
            duration_minutes: 30,
            exercises: vec!["Burpee".into(), " ".into()],
            completed: false,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        assert!(draft.validate().is_err());
    }
}
