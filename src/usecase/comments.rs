use crate::domain::comment::{Comment, NewComment};
use crate::domain::comment_tree::{build_forest, forest_size, CommentTreeNode};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::CommentRepository;
use crate::usecase::error::UsecaseError;

pub const UPDATED_MESSAGE: &str = "Comment updated successfully";
pub const DELETED_MESSAGE: &str = "Comment deleted successfully";

/// Result of listing comments. An empty store is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentListing {
    Empty,
    Comments(Vec<Comment>),
}

impl CommentListing {
    pub fn into_vec(self) -> Vec<Comment> {
        match self {
            CommentListing::Empty => Vec::new(),
            CommentListing::Comments(comments) => comments,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub author: String,
    pub parent: Option<i64>,
    pub text: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateComment {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub message: String,
    pub comment: Comment,
}

pub struct CommentsUseCase<C>
where
    C: CommentRepository,
{
    comment_repository: C,
}

impl<C> CommentsUseCase<C>
where
    C: CommentRepository,
{
    pub fn new(comment_repository: C) -> Self {
        Self { comment_repository }
    }

    async fn ensure_connected(&self) -> Result<(), UsecaseError> {
        self.comment_repository.check_connection().await.map_err(|e| {
            metrics::counter!("comments_store_unavailable_total").increment(1);
            UsecaseError::from(e)
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all_comments(&self) -> Result<CommentListing, UsecaseError> {
        tracing::debug!("listing comments");
        self.ensure_connected().await?;

        let comments = self.comment_repository.list_all().await?;
        if comments.is_empty() {
            tracing::debug!("no comments found");
            return Ok(CommentListing::Empty);
        }

        tracing::debug!(count = comments.len(), "retrieved comments");
        Ok(CommentListing::Comments(comments))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_comment_tree(&self) -> Result<Vec<CommentTreeNode>, UsecaseError> {
        let comments = self.get_all_comments().await?.into_vec();
        let total = comments.len();

        let forest = build_forest(comments);
        let visible = forest_size(&forest);
        metrics::histogram!("comments_tree_size").record(visible as f64);

        if visible < total {
            tracing::debug!(total, visible, "replies with dangling parents hidden");
        }
        Ok(forest)
    }

    #[tracing::instrument(skip(self, request), fields(parent = ?request.parent))]
    pub async fn create_comment(&self, request: CreateComment) -> Result<Comment, UsecaseError> {
        tracing::debug!("creating comment");

        let author = required(request.author, "author")?;
        let text = required(request.text, "text")?;

        self.ensure_connected().await?;

        let new_comment = NewComment::new(author, text, request.parent, request.image);
        let comment = self.comment_repository.create(&new_comment).await?;

        metrics::counter!("comments_created_total").increment(1);
        tracing::info!(comment_id = comment.id, "comment created successfully");
        Ok(comment)
    }

    #[tracing::instrument(skip(self, request), fields(comment_id = request.id))]
    pub async fn update_comment(&self, request: UpdateComment) -> Result<UpdateOutcome, UsecaseError> {
        tracing::debug!("updating comment");

        let text = required(request.text, "text")?;

        self.ensure_connected().await?;

        let comment = self
            .comment_repository
            .update_text(request.id, &text)
            .await?;

        metrics::counter!("comments_updated_total").increment(1);
        tracing::info!(comment_id = comment.id, "comment updated successfully");
        Ok(UpdateOutcome {
            message: UPDATED_MESSAGE.to_string(),
            comment,
        })
    }

    /// Deletes a comment. Deleting an id that does not exist succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(&self, id: i64) -> Result<String, UsecaseError> {
        tracing::debug!("deleting comment");

        self.ensure_connected().await?;

        match self.comment_repository.delete(id).await {
            Ok(()) => {
                metrics::counter!("comments_deleted_total").increment(1);
                tracing::info!(comment_id = id, "comment deleted successfully");
            }
            Err(RepositoryError::NotFound) => {
                tracing::info!(comment_id = id, "comment already absent, nothing to delete");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(DELETED_MESSAGE.to_string())
    }
}

fn required(value: String, field: &str) -> Result<String, UsecaseError> {
    if value.trim().is_empty() {
        return Err(UsecaseError::Validation(format!("{field} is required")));
    }
    Ok(value)
}
