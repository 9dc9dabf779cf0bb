//! Wire payloads of the two job queues.
//!
//! Field names are camelCase on the wire (`{"fileId": .., "userId": ..}`).
//! Every field is optional at the type level; consumers validate presence
//! and report the missing one. Blank strings count as missing.
//!
//! Producers other than this API may put numbers or other values in id
//! fields. Those decode to their JSON text so the consumer can report the
//! field as invalid instead of rejecting the whole payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Payload of a thumbnail generation job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailJob {
    /// File to generate thumbnails for.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_id: Option<String>,
    /// Owner of the file.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    /// File name, used for logging only.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
}

impl ThumbnailJob {
    /// Build a payload for a file owned by a user.
    pub fn new(file_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            file_id: Some(file_id.into()),
            user_id: Some(user_id.into()),
            name: None,
        }
    }

    /// The file id, if present and non-blank.
    pub fn file_id(&self) -> Option<&str> {
        non_blank(&self.file_id)
    }

    /// The user id, if present and non-blank.
    pub fn user_id(&self) -> Option<&str> {
        non_blank(&self.user_id)
    }
}

/// Payload of a welcome email job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailJob {
    /// Recipient user.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
}

impl EmailJob {
    /// Build a payload for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// The user id, if present and non-blank.
    pub fn user_id(&self) -> Option<&str> {
        non_blank(&self.user_id)
    }
}

/// Decode any JSON value as an optional string. `null`, `false` and `0`
/// are absent; other non-strings keep their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
