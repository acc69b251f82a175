use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A row of `tbl_notes`, with `pk_note` exposed as `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: u64,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Column values taken from a create/update payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NoteDraft {
    /// Pull `title` and `body` out of an arbitrary JSON payload.
    ///
    /// Nothing is validated: absent or null fields bind as NULL, strings
    /// pass through, and any other value is bound as its JSON text so the
    /// database decides whether it fits the column.
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            title: column_text(payload.get("title")),
            body: column_text(payload.get("body")),
        }
    }
}

fn column_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}
