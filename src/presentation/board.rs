use crate::domain::comment::Comment;
use crate::domain::comment_tree::{build_forest, CommentTreeNode};
use crate::presentation::client::{ClientError, CreateCommentBody};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub comment_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub parent_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Post,
    Reply(i64),
    Edit(i64),
    Delete(i64),
}

/// Client-side view of the board.
///
/// Holds the flat comment list (newest first) and the ephemeral composition
/// state. Every mutation goes through `begin_*`, which validates the draft and
/// marks a submission in flight, and `finish_*`, which patches the list with
/// the server's answer. The forest is rebuilt from the flat list on demand.
#[derive(Debug, Default)]
pub struct CommentBoard {
    comments: Vec<Comment>,
    pub author: String,
    pub new_text: String,
    editing: Option<EditDraft>,
    replying: Option<ReplyDraft>,
    in_flight: Option<Submission>,
}

impl CommentBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn editing(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    pub fn replying(&self) -> Option<&ReplyDraft> {
        self.replying.as_ref()
    }

    pub fn in_flight(&self) -> Option<Submission> {
        self.in_flight
    }

    /// The post button is enabled only with a non-blank author and text and
    /// nothing in flight.
    pub fn can_post(&self) -> bool {
        self.in_flight.is_none() && !self.author.trim().is_empty() && !self.new_text.trim().is_empty()
    }

    pub fn forest(&self) -> Vec<CommentTreeNode> {
        build_forest(self.comments.clone())
    }

    /// Replaces the local list with a fresh server listing.
    pub fn replace_all(&mut self, mut comments: Vec<Comment>) {
        comments.sort_by(newest_first);
        self.comments = comments;

        let ids: Vec<i64> = self.comments.iter().map(|c| c.id).collect();
        if self.editing.as_ref().is_some_and(|d| !ids.contains(&d.comment_id)) {
            self.editing = None;
        }
        if self.replying.as_ref().is_some_and(|d| !ids.contains(&d.parent_id)) {
            self.replying = None;
        }
    }

    pub fn start_edit(&mut self, comment_id: i64) {
        if let Some(comment) = self.comments.iter().find(|c| c.id == comment_id) {
            self.editing = Some(EditDraft {
                comment_id,
                text: comment.text.clone(),
            });
        }
    }

    pub fn set_edit_text(&mut self, text: impl Into<String>) {
        if let Some(draft) = self.editing.as_mut() {
            draft.text = text.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn start_reply(&mut self, parent_id: i64) {
        self.replying = Some(ReplyDraft {
            parent_id,
            text: String::new(),
        });
    }

    pub fn set_reply_text(&mut self, text: impl Into<String>) {
        if let Some(draft) = self.replying.as_mut() {
            draft.text = text.into();
        }
    }

    pub fn cancel_reply(&mut self) {
        self.replying = None;
    }

    fn begin(&mut self, submission: Submission) -> Result<(), ClientError> {
        if self.in_flight.is_some() {
            return Err(ClientError::Busy);
        }
        self.in_flight = Some(submission);
        Ok(())
    }

    /// Clears the in-flight marker when a request is abandoned before its
    /// `finish_*` call. Drafts are kept so the user can resubmit.
    pub fn abandon_submission(&mut self) {
        if let Some(submission) = self.in_flight.take() {
            tracing::debug!(?submission, "submission abandoned");
        }
    }

    fn end(&mut self, submission: Submission) {
        if self.in_flight == Some(submission) {
            self.in_flight = None;
        }
    }

    pub fn begin_post(&mut self) -> Result<CreateCommentBody, ClientError> {
        let author = non_blank(&self.author, "author")?;
        let text = non_blank(&self.new_text, "text")?;
        self.begin(Submission::Post)?;

        Ok(CreateCommentBody {
            author,
            parent: None,
            text,
            image: String::new(),
        })
    }

    pub fn finish_post(&mut self, result: Result<Comment, ClientError>) -> Result<(), ClientError> {
        self.end(Submission::Post);
        let comment = result.inspect_err(|e| tracing::warn!(error = %e, "error creating comment"))?;

        self.insert(comment);
        self.author.clear();
        self.new_text.clear();
        Ok(())
    }

    pub fn begin_reply(&mut self) -> Result<CreateCommentBody, ClientError> {
        let draft = self
            .replying
            .clone()
            .ok_or_else(|| ClientError::Validation("no reply in progress".to_string()))?;
        let author = non_blank(&self.author, "author")?;
        let text = non_blank(&draft.text, "text")?;
        self.begin(Submission::Reply(draft.parent_id))?;

        Ok(CreateCommentBody {
            author,
            parent: Some(draft.parent_id),
            text,
            image: String::new(),
        })
    }

    pub fn finish_reply(&mut self, parent_id: i64, result: Result<Comment, ClientError>) -> Result<(), ClientError> {
        self.end(Submission::Reply(parent_id));
        let comment = result.inspect_err(|e| tracing::warn!(error = %e, "error creating reply"))?;

        self.insert(comment);
        self.replying = None;
        self.author.clear();
        self.new_text.clear();
        Ok(())
    }

    /// Returns the comment id and the new text to send.
    pub fn begin_edit(&mut self) -> Result<(i64, String), ClientError> {
        let draft = self
            .editing
            .clone()
            .ok_or_else(|| ClientError::Validation("no edit in progress".to_string()))?;
        let text = non_blank(&draft.text, "text")?;
        self.begin(Submission::Edit(draft.comment_id))?;

        Ok((draft.comment_id, text))
    }

    pub fn finish_edit(&mut self, comment_id: i64, result: Result<Comment, ClientError>) -> Result<(), ClientError> {
        self.end(Submission::Edit(comment_id));
        let comment = result.inspect_err(|e| tracing::warn!(error = %e, "error updating comment"))?;

        self.replace(comment);
        self.editing = None;
        Ok(())
    }

    pub fn begin_delete(&mut self, comment_id: i64) -> Result<(), ClientError> {
        self.begin(Submission::Delete(comment_id))
    }

    pub fn finish_delete(&mut self, comment_id: i64, result: Result<(), ClientError>) -> Result<(), ClientError> {
        self.end(Submission::Delete(comment_id));
        match result {
            Ok(()) => {}
            // Already gone on the server: converge by removing it locally too.
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                tracing::warn!(error = %e, "error deleting comment");
                return Err(e);
            }
        }

        self.remove(comment_id);
        Ok(())
    }

    fn insert(&mut self, comment: Comment) {
        self.comments.retain(|c| c.id != comment.id);
        let position = self
            .comments
            .partition_point(|existing| newest_first(existing, &comment).is_lt());
        self.comments.insert(position, comment);
    }

    fn replace(&mut self, comment: Comment) {
        match self.comments.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) => *existing = comment,
            None => self.insert(comment),
        }
    }

    fn remove(&mut self, comment_id: i64) {
        self.comments.retain(|c| c.id != comment_id);
        if self.editing.as_ref().is_some_and(|d| d.comment_id == comment_id) {
            self.editing = None;
        }
        if self.replying.as_ref().is_some_and(|d| d.parent_id == comment_id) {
            self.replying = None;
        }
    }
}

fn newest_first(a: &Comment, b: &Comment) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

fn non_blank(value: &str, field: &str) -> Result<String, ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn comment(id: i64, parent: Option<i64>, text: &str) -> Comment {
        Comment {
            id,
            author: "Kate".to_string(),
            text: text.to_string(),
            parent,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
            likes: 0,
            image: None,
        }
    }

    fn board_with(comments: Vec<Comment>) -> CommentBoard {
        let mut board = CommentBoard::new();
        board.replace_all(comments);
        board
    }

    fn ids(board: &CommentBoard) -> Vec<i64> {
        board.comments().iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_replace_all_sorts_newest_first() {
        let board = board_with(vec![comment(1, None, "a"), comment(3, None, "c"), comment(2, None, "b")]);
        assert_eq!(ids(&board), vec![3, 2, 1]);
    }

    #[test]
    fn test_post_requires_author_and_text() {
        let mut board = CommentBoard::new();
        board.new_text = "hello".to_string();
        assert!(!board.can_post());
        assert!(matches!(board.begin_post(), Err(ClientError::Validation(_))));

        board.author = "Kate".to_string();
        assert!(board.can_post());
        let body = board.begin_post().unwrap();
        assert_eq!(body.parent, None);
        assert_eq!(body.image, "");
    }

    #[test]
    fn test_second_submit_is_busy_until_finished() {
        let mut board = CommentBoard::new();
        board.author = "Kate".to_string();
        board.new_text = "hello".to_string();

        board.begin_post().unwrap();
        assert!(!board.can_post());
        assert!(matches!(board.begin_post(), Err(ClientError::Busy)));

        board.finish_post(Ok(comment(10, None, "hello"))).unwrap();
        assert_eq!(board.in_flight(), None);
        assert_eq!(ids(&board), vec![10]);
        assert!(board.author.is_empty());
        assert!(board.new_text.is_empty());
    }

    #[test]
    fn test_failed_post_keeps_drafts() {
        let mut board = CommentBoard::new();
        board.author = "Kate".to_string();
        board.new_text = "hello".to_string();

        board.begin_post().unwrap();
        let result = board.finish_post(Err(ClientError::Server {
            status: 503,
            message: "The database is not connected.".to_string(),
        }));

        assert!(result.is_err());
        assert_eq!(board.in_flight(), None);
        assert_eq!(board.new_text, "hello");
        assert!(board.comments().is_empty());
    }

    #[test]
    fn test_reply_is_nested_under_parent() {
        let mut board = board_with(vec![comment(1, None, "root")]);
        board.author = "Tom".to_string();
        board.start_reply(1);
        board.set_reply_text("reply");

        let body = board.begin_reply().unwrap();
        assert_eq!(body.parent, Some(1));

        board.finish_reply(1, Ok(comment(2, Some(1), "reply"))).unwrap();
        assert_eq!(board.replying(), None);

        let forest = board.forest();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].replies[0].comment.id, 2);
    }

    #[test]
    fn test_blank_reply_is_rejected() {
        let mut board = board_with(vec![comment(1, None, "root")]);
        board.author = "Tom".to_string();
        board.start_reply(1);
        board.set_reply_text("   ");

        assert!(matches!(board.begin_reply(), Err(ClientError::Validation(_))));
        assert_eq!(board.in_flight(), None);
    }

    #[test]
    fn test_edit_replaces_single_comment() {
        let mut board = board_with(vec![comment(1, None, "one"), comment(2, None, "two")]);
        board.start_edit(2);
        assert_eq!(board.editing().unwrap().text, "two");
        board.set_edit_text("two, edited");

        let (id, text) = board.begin_edit().unwrap();
        assert_eq!((id, text.as_str()), (2, "two, edited"));

        board.finish_edit(2, Ok(comment(2, None, "two, edited"))).unwrap();

        assert_eq!(board.editing(), None);
        assert_eq!(board.comments()[0].text, "two, edited");
        assert_eq!(board.comments()[1].text, "one");
    }

    #[test]
    fn test_cancel_resets_drafts() {
        let mut board = board_with(vec![comment(1, None, "one")]);
        board.start_edit(1);
        board.start_reply(1);
        board.cancel_edit();
        board.cancel_reply();

        assert_eq!(board.editing(), None);
        assert_eq!(board.replying(), None);
    }

    #[test]
    fn test_delete_removes_only_target_and_orphans_hide() {
        let mut board = board_with(vec![
            comment(1, None, "root"),
            comment(2, Some(1), "reply"),
            comment(3, None, "other"),
        ]);

        board.begin_delete(1).unwrap();
        board.finish_delete(1, Ok(())).unwrap();

        assert_eq!(ids(&board), vec![3, 2]);
        let forest = board.forest();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, 3);
    }

    #[test]
    fn test_delete_not_found_converges() {
        let mut board = board_with(vec![comment(1, None, "root")]);
        board.start_edit(1);

        board.begin_delete(1).unwrap();
        board
            .finish_delete(
                1,
                Err(ClientError::Server {
                    status: 404,
                    message: "Comment not found".to_string(),
                }),
            )
            .unwrap();

        assert!(board.comments().is_empty());
        assert_eq!(board.editing(), None);
    }

    #[test]
    fn test_patch_and_refetch_converge() {
        let initial = vec![comment(1, None, "root"), comment(2, Some(1), "reply")];
        let mut patched = board_with(initial.clone());
        patched.author = "Kate".to_string();
        patched.new_text = "new root".to_string();
        patched.begin_post().unwrap();
        patched.finish_post(Ok(comment(3, None, "new root"))).unwrap();

        let mut server_side = initial;
        server_side.push(comment(3, None, "new root"));
        let refetched = board_with(server_side);

        assert_eq!(patched.comments(), refetched.comments());
        assert_eq!(patched.forest(), refetched.forest());
    }
}
