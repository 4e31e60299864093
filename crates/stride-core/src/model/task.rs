//! Task library entries and the per-day task set.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Diet,
    Exercise,
    Lifestyle,
}

impl TaskCategory {
    /// Wire name, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diet => "diet",
            Self::Exercise => "exercise",
            Self::Lifestyle => "lifestyle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskDifficulty {
    Easy,
    Medium,
    Hard,
}

impl TaskDifficulty {
    /// Wire name, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// A task template from the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TaskCategory,
    pub difficulty: TaskDifficulty,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One task materialized for a calendar day.
///
/// A task can only be completed after being selected for that date, and the
/// server caps how many tasks may be selected per day; both rules are
/// mirrored client-side before a request goes out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub user_id: String,
    pub task_id: String,
    #[serde(default)]
    pub task: Option<Task>,
    pub date: NaiveDate,
    pub is_selected: bool,
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of `GET /tasks/daily`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSelection {
    pub tasks: Vec<DailyTask>,
    pub date: NaiveDate,
    pub selected_count: u32,
}

/// Payload of `GET /tasks/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStats {
    pub period: String,
    pub overall: serde_json::Value,
    #[serde(default)]
    pub by_category: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_task_parses_calendar_date() {
        let json = r#"{
            "id": "dt-1",
            "user_id": "u-1",
            "task_id": "t-1",
            "date": "2026-03-15",
            "is_selected": true,
            "is_completed": false,
            "created_at": "2026-03-15T06:00:00Z",
            "updated_at": "2026-03-15T06:00:00Z"
        }"#;
        let task: DailyTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert!(task.is_selected);
        assert!(task.completed_at.is_none());
    }
}
