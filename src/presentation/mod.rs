//! Client side of the board: an HTTP client for the comments API, a view
//! model that keeps local state consistent with the server, and a text
//! renderer for the reply tree.

pub mod board;
pub mod client;
pub mod render;

use board::CommentBoard;
use client::{ClientError, CommentsClient};

/// How the board catches up with the server after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reconcile {
    /// Patch the single affected record locally.
    #[default]
    Patch,
    /// Refetch the whole list.
    Refetch,
}

/// Drives a [`CommentBoard`] against a [`CommentsClient`].
pub struct BoardSession {
    client: CommentsClient,
    board: CommentBoard,
    reconcile: Reconcile,
}

impl BoardSession {
    pub fn new(client: CommentsClient, reconcile: Reconcile) -> Self {
        Self {
            client,
            board: CommentBoard::new(),
            reconcile,
        }
    }

    pub fn board(&self) -> &CommentBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut CommentBoard {
        &mut self.board
    }

    pub fn render(&self) -> String {
        render::render_text(&self.board)
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let comments = self.client.list().await?;
        self.board.replace_all(comments);
        Ok(())
    }

    /// The change is already stored and patched locally, so a failed
    /// refetch is logged and the patched list is kept.
    async fn after_success(&mut self) {
        if self.reconcile == Reconcile::Refetch {
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = %e, "refetch after a stored change failed, keeping the patched list");
            }
        }
    }

    pub async fn post(&mut self) -> Result<(), ClientError> {
        let body = self.board.begin_post()?;
        let mut pending = InFlight(&mut self.board);
        let result = self.client.create(&body).await;
        pending.0.finish_post(result)?;
        drop(pending);
        self.after_success().await;
        Ok(())
    }

    pub async fn reply(&mut self) -> Result<(), ClientError> {
        let body = self.board.begin_reply()?;
        let parent_id = body.parent.unwrap_or_default();
        let mut pending = InFlight(&mut self.board);
        let result = self.client.create(&body).await;
        pending.0.finish_reply(parent_id, result)?;
        drop(pending);
        self.after_success().await;
        Ok(())
    }

    pub async fn save_edit(&mut self) -> Result<(), ClientError> {
        let (id, text) = self.board.begin_edit()?;
        let mut pending = InFlight(&mut self.board);
        let result = self.client.update(id, &text).await.map(|updated| updated.comment);
        pending.0.finish_edit(id, result)?;
        drop(pending);
        self.after_success().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        self.board.begin_delete(id)?;
        let mut pending = InFlight(&mut self.board);
        let result = self.client.delete(id).await.map(|_| ());
        pending.0.finish_delete(id, result)?;
        drop(pending);
        self.after_success().await;
        Ok(())
    }
}

/// Holds the board while a request is outstanding. If the request future is
/// dropped before `finish_*` runs, the in-flight marker is cleared.
struct InFlight<'a>(&'a mut CommentBoard);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.abandon_submission();
    }
}
