//! User profile and aggregate user statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseLevel {
    None,
    Light,
    Medium,
    Heavy,
}

/// The logged-in user's profile as the server sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub nickname: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub current_weight: Option<f64>,
    #[serde(default)]
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub exercise_level: Option<ExerciseLevel>,
    #[serde(default)]
    pub dietary_preferences: Option<Vec<String>>,
    /// Preferred bedtime, `HH:MM`.
    #[serde(default)]
    pub sleep_time: Option<String>,
    /// Preferred wake-up time, `HH:MM`.
    #[serde(default)]
    pub wake_time: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-derived aggregate statistics shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_checkins: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_tasks_completed: u32,
    pub total_points: u64,
    pub weight_loss: f64,
    pub achievements_count: u32,
    pub friends_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_deserializes_from_wire_shape() {
        let json = r#"{
            "id": "u-1",
            "nickname": "ada",
            "gender": "female",
            "exercise_level": "light",
            "is_active": true,
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-02T03:04:05Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.nickname, "ada");
        assert_eq!(user.gender, Some(Gender::Female));
        assert_eq!(user.exercise_level, Some(ExerciseLevel::Light));
        assert!(user.phone.is_none());
    }
}
