use std::fmt::Write;

use crate::domain::comment_tree::CommentTreeNode;
use crate::presentation::board::CommentBoard;

const INDENT: &str = "    ";

/// Renders the board's forest as indented plain text, one block per comment.
/// A comment under edit shows its draft text.
pub fn render_text(board: &CommentBoard) -> String {
    let forest = board.forest();
    let mut out = String::new();

    let mut stack: Vec<(&CommentTreeNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let indent = INDENT.repeat(depth);
        let comment = &node.comment;

        let _ = writeln!(
            out,
            "{indent}#{} {} ({}) likes: {}",
            comment.id,
            comment.author,
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.likes
        );

        match board.editing() {
            Some(draft) if draft.comment_id == comment.id => {
                let _ = writeln!(out, "{indent}  [editing] {}", draft.text);
            }
            _ => {
                for line in comment.text.lines() {
                    let _ = writeln!(out, "{indent}  {line}");
                }
            }
        }

        if board.replying().is_some_and(|draft| draft.parent_id == comment.id) {
            let _ = writeln!(out, "{indent}  [replying]");
        }

        stack.extend(node.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }

    out
}
