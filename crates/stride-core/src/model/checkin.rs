//! Check-in records, statistics, and streak payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day's check-in summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub tasks_completed: u32,
    pub tasks_selected: u32,
    pub streak_days: u32,
    pub points_earned: u32,
    pub total_points: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub monthly_checkins: u32,
    pub monthly_points: u64,
    pub monthly_perfect_days: u32,
}

/// Aggregate read model derived server-side.
///
/// The client caches a snapshot and never mutates it locally, except for
/// the two streak fields a dedicated streak fetch patches in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInStats {
    pub total_checkins: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_points: u64,
    pub avg_completion_rate: String,
    pub perfect_days: u32,
    pub monthly: MonthlyStats,
}

/// Payload of `GET /checkin/streak`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakInfo {
    pub current_streak: u32,
    pub max_streak: u32,
    #[serde(default)]
    pub streak_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub streak_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub this_week: Vec<serde_json::Value>,
}

/// Payload of `POST /checkin/complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub points_earned: u32,
    pub completed_count: u32,
    pub selected_count: u32,
    pub all_completed: bool,
}

/// Payload of `POST /checkin/makeup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeupResult {
    pub remaining_makeup: u32,
}
