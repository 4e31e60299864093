//! Social domain store: friends, leaderboard, and the post feed.
//!
//! Like toggles and comment-count bumps are optimistic: the collection is
//! mutated before the server confirms. What happens when confirmation
//! fails is decided by the configured [`RollbackPolicy`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use stride_core::config::RollbackPolicy;
use stride_core::envelope::Page;
use stride_core::error::ErrorKind;
use stride_core::model::social::{
    Comment, Friend, LeaderboardEntry, LeaderboardPeriod, MyRank, Post, PostKind,
};
use stride_core::model::user::User;
use stride_core::transport::{Transport, TransportExt, query_of};

/// Everything the social slice holds.
#[derive(Debug, Clone, Default)]
pub struct SocialState {
    pub friends: Vec<Friend>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub my_rank: Option<MyRank>,
    pub posts: Vec<Post>,
    /// Comments per post id, replaced wholesale per post on fetch.
    pub comments: HashMap<String, Vec<Comment>>,
    pub loading: bool,
    pub error: Option<ErrorKind>,
}

/// Answer to an incoming friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendAction {
    Accept,
    Reject,
}

impl FriendAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

/// Query for `GET /leaderboard`.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardQuery {
    pub period: Option<LeaderboardPeriod>,
    pub friends_only: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query for `GET /posts`.
#[derive(Debug, Clone, Default)]
pub struct PostsQuery {
    pub kind: Option<PostKind>,
    pub user_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewPost {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// The like toggle: a pure flip that is its own inverse. Applying it twice
/// without an intervening fetch restores both fields.
fn toggle_like(post: &mut Post) {
    if post.is_liked {
        post.likes_count = post.likes_count.saturating_sub(1);
        post.is_liked = false;
    } else {
        post.likes_count += 1;
        post.is_liked = true;
    }
}

pub struct SocialStore {
    transport: Arc<dyn Transport>,
    state: Arc<RwLock<SocialState>>,
    rollback: RollbackPolicy,
}

impl SocialStore {
    pub fn new(transport: Arc<dyn Transport>, rollback: RollbackPolicy) -> Self {
        Self {
            transport,
            state: Arc::new(RwLock::new(SocialState::default())),
            rollback,
        }
    }

    pub async fn state(&self) -> SocialState {
        self.state.read().await.clone()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(&self) {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = None;
    }

    async fn fail(&self, kind: ErrorKind) -> ErrorKind {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(kind);
        kind
    }

    pub async fn fetch_friends(&self) -> Result<Vec<Friend>, ErrorKind> {
        self.begin().await;
        match self
            .transport
            .get_json::<Vec<Friend>>("/social/friends", &[])
            .await
        {
            Ok(friends) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.friends = friends.clone();
                Ok(friends)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Searches users by keyword. Results go to the caller; the collection
    /// is not retained.
    pub async fn search_users(&self, keyword: &str) -> Result<Vec<User>, ErrorKind> {
        self.begin().await;
        let query = query_of([("q", Some(keyword.to_string()))]);
        match self
            .transport
            .get_json::<Vec<User>>("/social/search", &query)
            .await
        {
            Ok(users) => {
                self.finish().await;
                Ok(users)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn send_friend_request(&self, user_id: &str) -> Result<(), ErrorKind> {
        self.begin().await;
        let body = serde_json::json!({ "user_id": user_id });
        match self
            .transport
            .post_unit("/social/friends/request", &body)
            .await
        {
            Ok(()) => {
                self.finish().await;
                Ok(())
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn respond_friend_request(
        &self,
        friendship_id: &str,
        action: FriendAction,
    ) -> Result<(), ErrorKind> {
        self.begin().await;
        let body = serde_json::json!({ "action": action.as_str() });
        match self
            .transport
            .put_unit(&format!("/social/friends/{friendship_id}"), &body)
            .await
        {
            Ok(()) => {
                self.finish().await;
                Ok(())
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Deletes a friendship and drops it from the collection on success.
    pub async fn remove_friend(&self, friend_id: &str) -> Result<(), ErrorKind> {
        self.begin().await;
        match self
            .transport
            .delete_unit(&format!("/social/friends/{friend_id}"))
            .await
        {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.friends.retain(|f| f.friend_id != friend_id);
                Ok(())
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<Vec<LeaderboardEntry>, ErrorKind> {
        self.begin().await;
        let query = query_of([
            ("type", query.period.map(|p| p.as_str().to_string())),
            ("friends_only", query.friends_only.map(|b| b.to_string())),
            ("page", query.page.map(|p| p.to_string())),
            ("limit", query.limit.map(|l| l.to_string())),
        ]);
        match self
            .transport
            .get_json::<Page<LeaderboardEntry>>("/leaderboard", &query)
            .await
        {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.leaderboard = page.data.clone();
                Ok(page.data)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_my_rank(
        &self,
        period: Option<LeaderboardPeriod>,
    ) -> Result<MyRank, ErrorKind> {
        let query = query_of([("type", period.map(|p| p.as_str().to_string()))]);
        match self
            .transport
            .get_json::<MyRank>("/leaderboard/my-rank", &query)
            .await
        {
            Ok(rank) => {
                self.state.write().await.my_rank = Some(rank.clone());
                Ok(rank)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_posts(&self, query: &PostsQuery) -> Result<Vec<Post>, ErrorKind> {
        self.begin().await;
        let query = query_of([
            ("type", query.kind.map(|k| k.as_str().to_string())),
            ("user_id", query.user_id.clone()),
            ("page", query.page.map(|p| p.to_string())),
            ("limit", query.limit.map(|l| l.to_string())),
        ]);
        match self.transport.get_json::<Page<Post>>("/posts", &query).await {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.posts = page.data.clone();
                Ok(page.data)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Publishes a post and prepends the confirmed entity to the feed.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ErrorKind> {
        self.begin().await;
        match self.transport.post_json::<_, Post>("/posts", post).await {
            Ok(created) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.posts.insert(0, created.clone());
                Ok(created)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Fetches one post and refreshes the feed entry in place.
    pub async fn fetch_post_detail(&self, post_id: &str) -> Result<Post, ErrorKind> {
        match self
            .transport
            .get_json::<Post>(&format!("/posts/{post_id}"), &[])
            .await
        {
            Ok(post) => {
                let mut state = self.state.write().await;
                if let Some(entry) = state.posts.iter_mut().find(|p| p.id == post.id) {
                    *entry = post.clone();
                }
                Ok(post)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Toggles the like flag optimistically, then confirms with the
    /// server. On failure the configured rollback policy decides whether
    /// the flip is undone or left for the next fetch to reconcile.
    pub async fn like_post(&self, post_id: &str) -> Result<(), ErrorKind> {
        {
            let mut state = self.state.write().await;
            state.error = None;
            let post = state
                .posts
                .iter_mut()
                .find(|p| p.id == post_id)
                .ok_or(ErrorKind::NotFound)?;
            toggle_like(post);
        }

        match self
            .transport
            .post_empty(&format!("/posts/{post_id}/like"))
            .await
        {
            Ok(()) => Ok(()),
            Err(kind) => {
                let mut state = self.state.write().await;
                if self.rollback == RollbackPolicy::Revert {
                    debug!(post_id, "reverting optimistic like");
                    if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
                        toggle_like(post);
                    }
                }
                state.error = Some(kind);
                Err(kind)
            }
        }
    }

    /// Posts a comment with an optimistic comment-count bump.
    pub async fn comment_post(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment, ErrorKind> {
        {
            let mut state = self.state.write().await;
            state.error = None;
            let post = state
                .posts
                .iter_mut()
                .find(|p| p.id == post_id)
                .ok_or(ErrorKind::NotFound)?;
            post.comments_count += 1;
        }

        let body = serde_json::json!({ "content": content, "parent_id": parent_id });
        match self
            .transport
            .post_json::<_, Comment>(&format!("/posts/{post_id}/comments"), &body)
            .await
        {
            Ok(comment) => {
                let mut state = self.state.write().await;
                state
                    .comments
                    .entry(post_id.to_string())
                    .or_default()
                    .push(comment.clone());
                Ok(comment)
            }
            Err(kind) => {
                let mut state = self.state.write().await;
                if self.rollback == RollbackPolicy::Revert {
                    if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
                        post.comments_count = post.comments_count.saturating_sub(1);
                    }
                }
                state.error = Some(kind);
                Err(kind)
            }
        }
    }

    pub async fn fetch_post_comments(
        &self,
        post_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Comment>, ErrorKind> {
        let query = query_of([
            ("page", page.map(|p| p.to_string())),
            ("limit", limit.map(|l| l.to_string())),
        ]);
        match self
            .transport
            .get_json::<Page<Comment>>(&format!("/posts/{post_id}/comments"), &query)
            .await
        {
            Ok(comments) => {
                let mut state = self.state.write().await;
                state
                    .comments
                    .insert(post_id.to_string(), comments.data.clone());
                Ok(comments.data)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, comment_json, friend_json, page_json, post_json};

    fn store(rollback: RollbackPolicy) -> (SocialStore, Arc<MockTransport>) {
        let transport = MockTransport::new();
        let store = SocialStore::new(transport.clone(), rollback);
        (store, transport)
    }

    async fn load_posts(store: &SocialStore, transport: &MockTransport) {
        transport
            .push_ok(page_json(vec![post_json("p-1", 5, false)]))
            .await;
        store.fetch_posts(&PostsQuery::default()).await.unwrap();
    }

    #[tokio::test]
    async fn double_like_restores_the_original_state() {
        let (store, transport) = store(RollbackPolicy::Manual);
        load_posts(&store, &transport).await;

        transport.push_ok(serde_json::Value::Null).await;
        store.like_post("p-1").await.unwrap();
        let post = &store.state().await.posts[0];
        assert!(post.is_liked);
        assert_eq!(post.likes_count, 6);

        transport.push_ok(serde_json::Value::Null).await;
        store.like_post("p-1").await.unwrap();
        let post = &store.state().await.posts[0];
        assert!(!post.is_liked);
        assert_eq!(post.likes_count, 5);
    }

    #[tokio::test]
    async fn failed_like_with_manual_policy_keeps_the_flip() {
        let (store, transport) = store(RollbackPolicy::Manual);
        load_posts(&store, &transport).await;

        transport.push_err(ErrorKind::Server).await;
        let err = store.like_post("p-1").await.unwrap_err();
        assert_eq!(err, ErrorKind::Server);

        let state = store.state().await;
        // The optimistic flip stays; the caller re-fetches to reconcile.
        assert!(state.posts[0].is_liked);
        assert_eq!(state.posts[0].likes_count, 6);
        assert_eq!(state.error, Some(ErrorKind::Server));
    }

    #[tokio::test]
    async fn failed_like_with_revert_policy_restores_the_snapshot() {
        let (store, transport) = store(RollbackPolicy::Revert);
        load_posts(&store, &transport).await;

        transport.push_err(ErrorKind::Server).await;
        store.like_post("p-1").await.unwrap_err();

        let state = store.state().await;
        assert!(!state.posts[0].is_liked);
        assert_eq!(state.posts[0].likes_count, 5);
        assert_eq!(state.error, Some(ErrorKind::Server));
    }

    #[tokio::test]
    async fn liking_an_unknown_post_is_not_found() {
        let (store, transport) = store(RollbackPolicy::Manual);
        load_posts(&store, &transport).await;
        let err = store.like_post("missing").await.unwrap_err();
        assert_eq!(err, ErrorKind::NotFound);
        assert_eq!(transport.call_count().await, 1); // only the feed fetch
    }

    #[tokio::test]
    async fn comment_bumps_count_and_appends_on_confirmation() {
        let (store, transport) = store(RollbackPolicy::Manual);
        load_posts(&store, &transport).await;

        transport.push_ok(comment_json("c-1", "p-1")).await;
        let comment = store.comment_post("p-1", "nice streak!", None).await.unwrap();
        assert_eq!(comment.id, "c-1");

        let state = store.state().await;
        assert_eq!(state.posts[0].comments_count, 1);
        assert_eq!(state.comments["p-1"].len(), 1);
    }

    #[tokio::test]
    async fn failed_comment_with_revert_policy_undoes_the_bump() {
        let (store, transport) = store(RollbackPolicy::Revert);
        load_posts(&store, &transport).await;

        transport.push_err(ErrorKind::Timeout).await;
        store.comment_post("p-1", "hello", None).await.unwrap_err();

        let state = store.state().await;
        assert_eq!(state.posts[0].comments_count, 0);
        assert_eq!(state.error, Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn remove_friend_drops_the_entry_on_success() {
        let (store, transport) = store(RollbackPolicy::Manual);
        transport
            .push_ok(serde_json::json!([friend_json("f-1", "u-2"), friend_json("f-2", "u-3")]))
            .await;
        store.fetch_friends().await.unwrap();

        transport.push_ok(serde_json::Value::Null).await;
        store.remove_friend("u-2").await.unwrap();

        let state = store.state().await;
        assert_eq!(state.friends.len(), 1);
        assert_eq!(state.friends[0].friend_id, "u-3");
    }

    #[tokio::test]
    async fn failed_friends_fetch_keeps_the_stale_collection() {
        let (store, transport) = store(RollbackPolicy::Manual);
        transport
            .push_ok(serde_json::json!([friend_json("f-1", "u-2")]))
            .await;
        store.fetch_friends().await.unwrap();

        transport.push_err(ErrorKind::NetworkUnreachable).await;
        store.fetch_friends().await.unwrap_err();

        let state = store.state().await;
        assert_eq!(state.friends.len(), 1);
        assert!(!state.loading);
        assert_eq!(state.error, Some(ErrorKind::NetworkUnreachable));
    }

    #[tokio::test]
    async fn created_post_is_prepended_to_the_feed() {
        let (store, transport) = store(RollbackPolicy::Manual);
        load_posts(&store, &transport).await;

        transport.push_ok(post_json("p-2", 0, false)).await;
        store
            .create_post(&NewPost {
                content: "day 30".into(),
                images: None,
                post_type: Some(PostKind::Checkin),
                is_public: Some(true),
            })
            .await
            .unwrap();

        let state = store.state().await;
        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.posts[0].id, "p-2");
    }
}
