//! Test doubles and JSON fixtures shared by the store tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};

use stride_core::error::ErrorKind;
use stride_core::transport::{HttpMethod, Transport};

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// A scripted [`Transport`]: responses are popped in FIFO order and every
/// call is recorded for assertions.
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, ErrorKind>>>,
    calls: Mutex<Vec<RecordedCall>>,
    token: RwLock<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            token: RwLock::new(None),
        })
    }

    pub async fn push_ok(&self, data: Value) {
        self.responses.lock().await.push_back(Ok(data));
    }

    pub async fn push_err(&self, kind: ErrorKind) {
        self.responses.lock().await.push_back(Err(kind));
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ErrorKind> {
        self.calls.lock().await.push(RecordedCall {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body,
        });
        self.responses
            .lock()
            .await
            .pop_front()
            .expect("MockTransport: no scripted response left")
    }

    async fn set_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
    }

    async fn clear_token(&self) {
        *self.token.write().await = None;
    }
}

const STAMP: &str = "2026-03-01T08:00:00Z";

pub(crate) fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "nickname": "ada",
        "is_active": true,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

pub(crate) fn daily_task_json(task_id: &str, date: &str, selected: bool, completed: bool) -> Value {
    json!({
        "id": format!("dt-{task_id}"),
        "user_id": "u-1",
        "task_id": task_id,
        "date": date,
        "is_selected": selected,
        "is_completed": completed,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

pub(crate) fn task_selection_json(date: &str, tasks: Vec<Value>) -> Value {
    let selected_count = tasks
        .iter()
        .filter(|task| task["is_selected"] == json!(true))
        .count();
    json!({ "tasks": tasks, "date": date, "selected_count": selected_count })
}

pub(crate) fn page_json(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({
        "data": items,
        "pagination": {
            "page": 1,
            "limit": 20,
            "total": total,
            "total_pages": 1,
            "has_next": false,
            "has_prev": false
        }
    })
}

pub(crate) fn checkin_json(id: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u-1",
        "date": "2026-03-01",
        "tasks_completed": 2,
        "tasks_selected": 3,
        "streak_days": 4,
        "points_earned": 20,
        "total_points": 200,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

pub(crate) fn checkin_stats_json(current_streak: u32, max_streak: u32) -> Value {
    json!({
        "total_checkins": 42,
        "current_streak": current_streak,
        "max_streak": max_streak,
        "total_points": 420,
        "avg_completion_rate": "86%",
        "perfect_days": 7,
        "monthly": {
            "monthly_checkins": 12,
            "monthly_points": 120,
            "monthly_perfect_days": 3
        }
    })
}

pub(crate) fn post_json(id: &str, likes_count: u32, is_liked: bool) -> Value {
    json!({
        "id": id,
        "user_id": "u-2",
        "content": "down 2kg this month",
        "post_type": "checkin",
        "likes_count": likes_count,
        "comments_count": 0,
        "is_public": true,
        "is_liked": is_liked,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

pub(crate) fn comment_json(id: &str, post_id: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u-1",
        "post_id": post_id,
        "content": "nice streak!",
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

pub(crate) fn friend_json(id: &str, friend_id: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u-1",
        "friend_id": friend_id,
        "status": "accepted",
        "requested_by": "u-1",
        "created_at": STAMP,
        "updated_at": STAMP
    })
}
