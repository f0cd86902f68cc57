use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub text: String,
    #[serde(default, with = "parent_ref")]
    pub parent: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub likes: i32,
    pub image: Option<String>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A comment that has not been persisted yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author: String,
    pub text: String,
    pub parent: Option<i64>,
    pub image: Option<String>,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn new(author: String, text: String, parent: Option<i64>, image: Option<String>) -> Self {
        Self {
            author,
            text,
            parent,
            image: image.filter(|i| !i.trim().is_empty()),
            likes: 0,
            created_at: Utc::now(),
        }
    }
}

/// Wire form of a parent reference: a string holding the parent id, empty
/// for root comments. Numbers and null are accepted on input too.
pub mod parent_ref {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Parent reference as it arrives from a client, before validation.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(untagged)]
    pub enum ParentInput {
        Id(i64),
        Text(String),
    }

    impl ParentInput {
        pub fn resolve(self) -> Result<Option<i64>, String> {
            match self {
                ParentInput::Id(id) => parse_id(id).map(Some),
                ParentInput::Text(text) => parse(&text),
            }
        }
    }

    pub fn serialize<S: Serializer>(parent: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match parent {
            Some(id) => serializer.serialize_str(&id.to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<ParentInput>::deserialize(deserializer)? {
            None => Ok(None),
            Some(input) => input.resolve().map_err(D::Error::custom),
        }
    }

    /// Parses the textual form: empty means "no parent".
    pub fn parse(text: &str) -> Result<Option<i64>, String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let id = trimmed
            .parse::<i64>()
            .map_err(|_| format!("parent must be a comment id, got {trimmed:?}"))?;
        parse_id(id).map(Some)
    }

    fn parse_id(id: i64) -> Result<i64, String> {
        if id <= 0 {
            return Err(format!("parent must be a positive comment id, got {id}"));
        }
        Ok(id)
    }
}
