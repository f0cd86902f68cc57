use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::comment::{parent_ref::ParentInput, Comment};
use crate::domain::comment_tree::forest_to_json;
use crate::usecase::comments::{CreateComment, UpdateComment};
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 255))]
    pub author: String,
    #[serde(default)]
    pub parent: Option<ParentInput>,
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CreateCommentRequest {
    fn into_command(self) -> Result<CreateComment, UsecaseError> {
        let parent = match self.parent {
            Some(parent) => parent.resolve().map_err(UsecaseError::Validation)?,
            None => None,
        };

        Ok(CreateComment {
            author: self.author,
            parent,
            text: self.text,
            image: self.image,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentResponse {
    pub message: String,
    pub comment: Comment,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validate<T: Validate>(payload: &T) -> Result<(), UsecaseError> {
    payload.validate().map_err(|validation_errors| {
        tracing::warn!(?validation_errors, "validation failed");
        UsecaseError::Validation(validation_errors.to_string())
    })
}

#[tracing::instrument(skip(state))]
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling list comments request");

    let comments = state.comments_usecase.get_all_comments().await?.into_vec();

    tracing::debug!(count = comments.len(), "comments listed successfully");
    Ok((StatusCode::OK, Json(comments)))
}

#[tracing::instrument(skip(state))]
pub async fn comment_tree(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling comment tree request");

    let forest = state.comments_usecase.get_comment_tree().await?;

    let body = forest_to_json(&forest).map_err(|e| UsecaseError::Internal(e.to_string()))?;

    tracing::debug!(roots = forest.len(), "comment tree built");
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling create comment request");

    validate(&payload)?;
    let command = payload.into_command()?;

    let comment = state.comments_usecase.create_comment(command).await?;

    tracing::debug!(comment_id = comment.id, "comment created successfully");
    Ok((StatusCode::CREATED, Json(comment)))
}

#[tracing::instrument(skip(state, payload), fields(comment_id = id))]
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling update comment request");

    validate(&payload)?;

    let outcome = state
        .comments_usecase
        .update_comment(UpdateComment {
            id,
            text: payload.text,
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(UpdateCommentResponse {
            message: outcome.message,
            comment: outcome.comment,
        }),
    ))
}

#[tracing::instrument(skip(state), fields(comment_id = id))]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling delete comment request");

    let message = state.comments_usecase.delete_comment(id).await?;

    Ok((StatusCode::OK, Json(MessageResponse { message })))
}
