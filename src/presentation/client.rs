use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delivery::http::v1::comments::{MessageResponse, UpdateCommentResponse};
use crate::domain::comment::{parent_ref, Comment};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("another submission is still in flight")]
    Busy,
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Server { status: 404, .. })
    }
}

/// Body of `POST /comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateCommentBody {
    pub author: String,
    #[serde(with = "parent_ref")]
    pub parent: Option<i64>,
    pub text: String,
    pub image: String,
}

#[derive(Serialize)]
struct UpdateCommentBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ServerError {
    error: String,
}

#[derive(Clone)]
pub struct CommentsClient {
    client: Client,
    base_url: String,
}

impl CommentsClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("comment-board/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Comment>, ClientError> {
        let response = self.client.get(self.url("comments")).send().await?;
        let comments: Vec<Comment> = check(response).await?.json().await?;

        tracing::debug!(count = comments.len(), "fetched comments");
        Ok(comments)
    }

    #[tracing::instrument(skip(self, body), fields(parent = ?body.parent))]
    pub async fn create(&self, body: &CreateCommentBody) -> Result<Comment, ClientError> {
        let response = self.client.post(self.url("comments")).json(body).send().await?;
        let comment: Comment = check(response).await?.json().await?;

        tracing::debug!(comment_id = comment.id, "comment posted");
        Ok(comment)
    }

    #[tracing::instrument(skip(self, text))]
    pub async fn update(&self, id: i64, text: &str) -> Result<UpdateCommentResponse, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("comments/{id}")))
            .json(&UpdateCommentBody { text })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<MessageResponse, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("comments/{id}")))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServerError>(&raw)
        .map(|body| body.error)
        .unwrap_or(raw);

    tracing::warn!(status = status.as_u16(), %message, "comments request failed");
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}
