use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    domain::comment::{Comment, NewComment},
    repository::errors::RepositoryError,
    usecase::contracts::CommentRepository,
};

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CommentRepository for PostgresCommentRepository {
    #[tracing::instrument(skip(self))]
    async fn check_connection(&self) -> Result<(), RepositoryError> {
        match self.pool.acquire().await {
            Ok(_connection) => {
                tracing::debug!("database connection available");
                Ok(())
            }
            Err(e) => {
                let options = self.pool.connect_options();
                tracing::error!(
                    error = %e,
                    host = options.get_host(),
                    port = options.get_port(),
                    database = options.get_database().unwrap_or_default(),
                    "database connection unavailable"
                );
                Err(RepositoryError::ConnectionUnavailable)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Comment>, RepositoryError> {
        tracing::debug!("listing comments");

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, author, text, parent, created_at, likes, image
            FROM comments
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = comments.len(), "found comments");
        Ok(comments)
    }

    #[tracing::instrument(skip(self, comment), fields(parent = ?comment.parent))]
    async fn create(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        tracing::debug!("creating comment");

        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (author, text, parent, created_at, likes, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, author, text, parent, created_at, likes, image
            "#,
        )
        .bind(&comment.author)
        .bind(&comment.text)
        .bind(comment.parent)
        .bind(comment.created_at)
        .bind(comment.likes)
        .bind(&comment.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(comment_id = created.id, "comment created successfully");
        Ok(created)
    }

    #[tracing::instrument(skip(self, text), fields(comment_id = id))]
    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, RepositoryError> {
        tracing::debug!("updating comment text");

        let updated = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET text = $2
            WHERE id = $1
            RETURNING id, author, text, parent, created_at, likes, image
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        tracing::debug!(comment_id = id, "comment updated successfully");
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(comment_id = id))]
    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        tracing::debug!("deleting comment");

        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(comment_id = id, "comment deleted successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = count.0, "counted comments");
        Ok(count.0)
    }
}

pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

/// Builds a pool without connecting. Connections are opened on first use.
pub fn create_lazy_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)
}
