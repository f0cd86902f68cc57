use crate::{
    domain::comment::{Comment, NewComment},
    repository::errors::RepositoryError,
};

#[cfg_attr(test, mockall::automock)]
pub trait CommentRepository: Send + Sync {
    /// Fails with `ConnectionUnavailable` when the store cannot be reached right now.
    async fn check_connection(&self) -> Result<(), RepositoryError>;
    /// All comments, newest first.
    async fn list_all(&self) -> Result<Vec<Comment>, RepositoryError>;
    async fn create(&self, comment: &NewComment) -> Result<Comment, RepositoryError>;
    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, RepositoryError>;
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<i64, RepositoryError>;
}
