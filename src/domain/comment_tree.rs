use std::collections::HashMap;

use crate::domain::comment::Comment;

/// A comment with its nested replies.
///
/// Reply chains have no depth limit, so dropping, comparing and serializing
/// a node all walk the tree with an explicit stack.
#[derive(Debug)]
pub struct CommentTreeNode {
    pub comment: Comment,
    pub replies: Vec<CommentTreeNode>,
}

impl CommentTreeNode {
    /// Number of descendants below this node.
    pub fn reply_count(&self) -> usize {
        forest_size(&self.replies)
    }
}

impl Drop for CommentTreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

impl PartialEq for CommentTreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.comment != right.comment || left.replies.len() != right.replies.len() {
                return false;
            }
            pending.extend(left.replies.iter().zip(right.replies.iter()));
        }
        true
    }
}

impl Eq for CommentTreeNode {}

/// Total number of nodes in a forest.
pub fn forest_size(forest: &[CommentTreeNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CommentTreeNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.replies.iter());
    }
    count
}

enum JsonStep<'a> {
    Open { node: &'a CommentTreeNode, separated: bool },
    Close,
}

/// Writes a forest as a JSON array. Each node is the comment's own object
/// with a trailing `replies` array.
pub fn forest_to_json(forest: &[CommentTreeNode]) -> Result<String, serde_json::Error> {
    let mut out = String::from("[");
    let mut stack: Vec<JsonStep<'_>> = forest
        .iter()
        .enumerate()
        .rev()
        .map(|(i, node)| JsonStep::Open { node, separated: i > 0 })
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            JsonStep::Close => out.push_str("]}"),
            JsonStep::Open { node, separated } => {
                if separated {
                    out.push(',');
                }
                // A comment always serializes to a non-empty object.
                let object = serde_json::to_string(&node.comment)?;
                out.push_str(object.strip_suffix('}').unwrap_or(&object));
                out.push_str(",\"replies\":[");

                stack.push(JsonStep::Close);
                stack.extend(
                    node.replies
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(i, node)| JsonStep::Open { node, separated: i > 0 }),
                );
            }
        }
    }

    out.push(']');
    Ok(out)
}

/// Nests a flat comment list into a forest of reply trees.
///
/// Roots and siblings keep the order they have in `comments`, so a list
/// sorted newest first yields newest-first roots and replies.
///
/// A comment whose parent is not part of the batch is dropped together with
/// its replies. Orphans are never promoted to roots.
pub fn build_forest(comments: Vec<Comment>) -> Vec<CommentTreeNode> {
    let index: HashMap<i64, usize> = comments
        .iter()
        .enumerate()
        .map(|(position, comment)| (comment.id, position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();

    for (position, comment) in comments.iter().enumerate() {
        match comment.parent {
            None => roots.push(position),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent_position) => children[parent_position].push(position),
                None => {
                    tracing::debug!(
                        comment_id = comment.id,
                        parent_id,
                        "dropping reply with dangling parent"
                    );
                }
            },
        }
    }

    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentTreeNode>> = (0..slots.len()).map(|_| None).collect();

    // Post-order walk with an explicit stack; depth is unbounded.
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&root| (root, false)).collect();
    while let Some((position, expanded)) = stack.pop() {
        if expanded {
            let Some(comment) = slots[position].take() else {
                continue;
            };
            let replies = children[position]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[position] = Some(CommentTreeNode { comment, replies });
        } else {
            stack.push((position, true));
            stack.extend(children[position].iter().rev().map(|&child| (child, false)));
        }
    }

    roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn comment(id: i64, parent: Option<i64>, text: &str) -> Comment {
        Comment {
            id,
            author: "Author".to_string(),
            text: text.to_string(),
            parent,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() - Duration::minutes(id),
            likes: 0,
            image: None,
        }
    }

    fn ids(forest: &[CommentTreeNode]) -> Vec<i64> {
        forest.iter().map(|node| node.comment.id).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_forest() {
        assert!(build_forest(Vec::new()).is_empty());
    }

    #[test]
    fn test_dangling_parent_scenario() {
        let forest = build_forest(vec![
            comment(1, None, "A"),
            comment(2, Some(1), "B"),
            comment(3, Some(99), "C"),
        ]);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, 1);
        assert_eq!(ids(&forest[0].replies), vec![2]);
        assert!(forest[0].replies[0].replies.is_empty());
        assert_eq!(forest_size(&forest), 2);
    }

    #[test]
    fn test_roots_keep_input_order() {
        let forest = build_forest(vec![
            comment(5, None, "newest"),
            comment(3, None, "middle"),
            comment(1, None, "oldest"),
        ]);

        assert_eq!(ids(&forest), vec![5, 3, 1]);
    }

    #[test]
    fn test_siblings_keep_input_order() {
        let forest = build_forest(vec![
            comment(9, Some(1), "third reply"),
            comment(4, Some(1), "second reply"),
            comment(2, Some(1), "first reply"),
            comment(1, None, "root"),
        ]);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].replies), vec![9, 4, 2]);
    }

    #[test]
    fn test_child_listed_before_parent_is_still_attached() {
        let forest = build_forest(vec![comment(2, Some(1), "reply"), comment(1, None, "root")]);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].replies), vec![2]);
    }

    #[test]
    fn test_reply_is_nested_once_and_not_duplicated() {
        let forest = build_forest(vec![
            comment(1, None, "root"),
            comment(2, Some(1), "reply"),
            comment(3, Some(2), "nested reply"),
            comment(4, None, "other root"),
        ]);

        assert_eq!(ids(&forest), vec![1, 4]);
        assert_eq!(ids(&forest[0].replies), vec![2]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec![3]);
        assert!(forest[1].replies.is_empty());
        assert_eq!(forest_size(&forest), 4);
        assert_eq!(forest[0].reply_count(), 2);
    }

    #[test]
    fn test_orphan_subtree_is_dropped() {
        let forest = build_forest(vec![
            comment(1, None, "root"),
            comment(5, Some(42), "orphan"),
            comment(6, Some(5), "reply to orphan"),
        ]);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(forest_size(&forest), 1);
    }

    #[test]
    fn test_parent_cycle_is_unreachable() {
        let forest = build_forest(vec![
            comment(1, Some(2), "a"),
            comment(2, Some(1), "b"),
            comment(3, Some(3), "self"),
            comment(4, None, "root"),
        ]);

        assert_eq!(ids(&forest), vec![4]);
        assert_eq!(forest_size(&forest), 1);
    }

    fn chain(depth: i64) -> Vec<Comment> {
        let mut comments = vec![comment(1, None, "root")];
        comments.extend((2..=depth).map(|id| comment(id, Some(id - 1), "deeper")));
        comments
    }

    // Tokio worker threads default to a 2 MiB stack.
    fn on_small_stack<F: FnOnce() + Send + 'static>(f: F) {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn test_deep_chain_builds_and_drops() {
        on_small_stack(|| {
            let depth = 50_000;
            let forest = build_forest(chain(depth));

            assert_eq!(forest_size(&forest), depth as usize);
            let mut node = &forest[0];
            let mut levels = 1;
            while let Some(next) = node.replies.first() {
                node = next;
                levels += 1;
            }
            assert_eq!(levels, depth as usize);

            drop(forest);
        });
    }

    #[test]
    fn test_deep_chain_serializes_and_compares() {
        on_small_stack(|| {
            let depth = 50_000;
            let forest = build_forest(chain(depth));

            let json = forest_to_json(&forest).unwrap();
            assert!(json.starts_with(r#"[{"id":1,"#));
            assert_eq!(json.matches(r#""replies":["#).count(), depth as usize);
            assert!(json.ends_with(&format!("[{}]", "]}".repeat(depth as usize))));

            assert!(forest == build_forest(chain(depth)));
        });
    }

    #[test]
    fn test_build_is_idempotent() {
        let input = vec![
            comment(1, None, "A"),
            comment(2, Some(1), "B"),
            comment(3, Some(2), "C"),
            comment(4, Some(77), "D"),
            comment(5, None, "E"),
        ];

        assert_eq!(build_forest(input.clone()), build_forest(input));
    }

    #[test]
    fn test_node_never_exceeds_input_count() {
        let input: Vec<Comment> = (1..=20)
            .map(|id| comment(id, if id % 3 == 0 { Some(id / 3) } else { None }, "x"))
            .collect();
        let total = input.len();

        assert!(forest_size(&build_forest(input)) <= total);
    }

    #[test]
    fn test_forest_json_separates_siblings() {
        let forest = build_forest(vec![
            comment(1, None, "A"),
            comment(2, Some(1), "B"),
            comment(3, Some(1), "C"),
            comment(4, None, "D"),
        ]);
        let json: serde_json::Value = serde_json::from_str(&forest_to_json(&forest).unwrap()).unwrap();

        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["replies"].as_array().unwrap().len(), 2);
        assert_eq!(json[0]["replies"][1]["text"], "C");
        assert_eq!(json[1]["id"], 4);
        assert_eq!(forest_to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_node_serializes_flattened_with_replies() {
        let forest = build_forest(vec![comment(1, None, "A"), comment(2, Some(1), "B")]);
        let json: serde_json::Value = serde_json::from_str(&forest_to_json(&forest).unwrap()).unwrap();

        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["parent"], "");
        assert_eq!(json[0]["replies"][0]["id"], 2);
        assert_eq!(json[0]["replies"][0]["parent"], "1");
        assert_eq!(json[0]["replies"][0]["replies"], serde_json::json!([]));
    }
}
