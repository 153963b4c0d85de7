use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: bool,
    pub completed_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /todos` and `PUT /todos/{id}`.
///
/// Fields are never required or rejected. Scalars are coerced to text, so
/// `{"title": 42}` stores `"42"`; anything else becomes absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TodoPayload {
    #[serde(default, deserialize_with = "coerce_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "coerce_text")]
    pub description: Option<String>,
}

fn coerce_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // arrays and objects have no text form; they are stored as absent
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Null | Value::Array(_) | Value::Object(_)) | None => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
