//! Friends, leaderboard, and the post feed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    #[serde(default)]
    pub friend: Option<User>,
    pub status: FriendStatus,
    pub requested_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl LeaderboardPeriod {
    /// Wire name, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user: Option<User>,
    pub period_type: LeaderboardPeriod,
    pub period_date: NaiveDate,
    pub points: u64,
    #[serde(default)]
    pub rank: Option<u32>,
    pub tasks_completed: u32,
    pub streak_days: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of `GET /leaderboard/my-rank`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyRank {
    pub rank: u32,
    pub points: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Checkin,
    Experience,
    Recipe,
    Exercise,
}

impl PostKind {
    /// Wire name, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::Experience => "experience",
            Self::Recipe => "recipe",
            Self::Exercise => "exercise",
        }
    }
}

/// A feed post.
///
/// `is_liked` and `likes_count` move together: the like toggle is its own
/// inverse, so flipping twice without an intervening fetch restores both
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user: Option<User>,
    pub content: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    pub post_type: PostKind,
    pub likes_count: u32,
    pub comments_count: u32,
    pub is_public: bool,
    #[serde(default)]
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user: Option<User>,
    pub post_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
