//! HTTP mutation gateway
//!
//! Thin reqwest client for the collaborator REST API. Every call resolves
//! to a confirmed result or a typed failure; a request timeout maps to
//! [`GatewayError::Timeout`] and is handled upstream exactly like any other
//! remote failure.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use feed_common::ApiConfig;
use feed_core::{
    Comment, CommentDraft, CommentId, GatewayError, GatewayResult, MutationGateway, Notification,
    NotificationSink, PostId, SinkError, SinkResult, UserId, XpReason, XpSink,
};

/// Error body shape the collaborator API uses for rejections
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Map a non-success status to the typed failure taxonomy
fn error_for_status(status: u16, message: String, resource: &str) -> GatewayError {
    match status {
        401 | 403 => GatewayError::Unauthorized,
        404 => GatewayError::NotFound(resource.to_owned()),
        400..=499 => GatewayError::Rejected { status, message },
        _ => GatewayError::Transport(format!("server error: {status}")),
    }
}

/// Map a reqwest transport error
fn error_for_send(e: &reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

/// reqwest-backed implementation of the mutation gateway and both
/// fire-and-forget sinks
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway from the API configuration
    pub fn new(config: &ApiConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Resolve a response to success or a typed failure
    async fn check(response: reqwest::Response, resource: &str) -> GatewayResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());

        Err(error_for_status(status.as_u16(), message, resource))
    }
}

#[async_trait]
impl MutationGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn toggle_reaction(
        &self,
        post_id: PostId,
        viewer_id: UserId,
        emoji: &str,
    ) -> GatewayResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/posts/{post_id}/reactions/toggle")))
            .json(&json!({ "viewer_id": viewer_id, "emoji": emoji }))
            .send()
            .await
            .map_err(|e| error_for_send(&e))?;

        Self::check(response, "Post").await?;
        debug!(post_id = %post_id, emoji = %emoji, "Reaction toggle confirmed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_comment_like(
        &self,
        comment_id: CommentId,
        viewer_id: UserId,
    ) -> GatewayResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/comments/{comment_id}/likes/toggle")))
            .json(&json!({ "viewer_id": viewer_id }))
            .send()
            .await
            .map_err(|e| error_for_send(&e))?;

        Self::check(response, "Comment").await?;
        debug!(comment_id = %comment_id, "Comment like toggle confirmed");
        Ok(())
    }

    #[instrument(skip(self, draft))]
    async fn create_comment(&self, draft: &CommentDraft) -> GatewayResult<Comment> {
        let response = self
            .client
            .post(self.url(&format!("/posts/{}/comments", draft.post_id)))
            .json(&json!({
                "author_id": draft.author_id,
                "content": draft.content,
                "reply_to_comment_id": draft.reply_to.as_ref().map(|t| t.comment_id),
                "reply_to_author_name": draft.reply_to.as_ref().map(|t| t.author_name.clone()),
            }))
            .send()
            .await
            .map_err(|e| error_for_send(&e))?;

        let comment: Comment = Self::check(response, "Post")
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        debug!(comment_id = %comment.id, "Comment created");
        Ok(comment)
    }

    #[instrument(skip(self, content))]
    async fn edit_comment(
        &self,
        comment_id: CommentId,
        editor_id: UserId,
        content: &str,
    ) -> GatewayResult<Comment> {
        let response = self
            .client
            .put(self.url(&format!("/comments/{comment_id}")))
            .json(&json!({ "editor_id": editor_id, "content": content }))
            .send()
            .await
            .map_err(|e| error_for_send(&e))?;

        let comment: Comment = Self::check(response, "Comment")
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        debug!(comment_id = %comment_id, "Comment edited");
        Ok(comment)
    }

    #[instrument(skip(self))]
    async fn delete_comment(&self, comment_id: CommentId, editor_id: UserId) -> GatewayResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/comments/{comment_id}")))
            .json(&json!({ "editor_id": editor_id }))
            .send()
            .await
            .map_err(|e| error_for_send(&e))?;

        Self::check(response, "Comment").await?;
        debug!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_comments(
        &self,
        post_id: PostId,
        viewer_id: UserId,
    ) -> GatewayResult<Vec<Comment>> {
        let response = self
            .client
            .get(self.url(&format!("/posts/{post_id}/comments")))
            .query(&[("viewer_id", viewer_id.to_string())])
            .send()
            .await
            .map_err(|e| error_for_send(&e))?;

        let comments: Vec<Comment> = Self::check(response, "Post")
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(comments)
    }
}

// The XP and notification endpoints are fire-and-forget from the engine's
// point of view; failures still come back typed so the dispatcher can log
// them.

#[async_trait]
impl XpSink for HttpGateway {
    #[instrument(skip(self))]
    async fn award(&self, user_id: UserId, amount: u32, reason: XpReason) -> SinkResult<()> {
        self.xp_call("award", user_id, amount, reason).await
    }

    #[instrument(skip(self))]
    async fn deduct(&self, user_id: UserId, amount: u32, reason: XpReason) -> SinkResult<()> {
        self.xp_call("deduct", user_id, amount, reason).await
    }
}

impl HttpGateway {
    async fn xp_call(
        &self,
        verb: &str,
        user_id: UserId,
        amount: u32,
        reason: XpReason,
    ) -> SinkResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/users/{user_id}/xp/{verb}")))
            .json(&json!({ "amount": amount, "reason": reason.as_str() }))
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Rejected(response.status().to_string()))
        }
    }
}

#[async_trait]
impl NotificationSink for HttpGateway {
    #[instrument(skip(self, notification))]
    async fn deliver(&self, notification: Notification) -> SinkResult<()> {
        let response = self
            .client
            .post(self.url("/notifications"))
            .json(&notification)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Rejected(response.status().to_string()))
        }
    }
}
