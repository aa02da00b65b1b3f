use serde::{Deserialize, Serialize};

use crate::error::{FerryError, Result};

/// Sentinel payload returned by the chat backend when its queue is empty.
pub const NO_MESSAGES: &str = "NO_MESSAGES";

/// One inbound chat message, decoded from the chat backend's payload.
///
/// Lives only for the duration of a single pipeline pass. `chat_id` is the
/// reply target and must be present; `user` and `text` default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_id: i64,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    /// Strict schema decode of an inbound payload.
    ///
    /// The payload must be a JSON object with at least a `chat_id`; anything
    /// else is a [`FerryError::Decode`], never a best-effort evaluation of
    /// untrusted text.
    pub fn decode(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| FerryError::Decode(e.to_string()))
    }
}

/// Per-message pipeline outcome, assembled for logging and discarded once
/// the reply has been sent.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// The completion text (or the substituted error description).
    pub llm_response: String,
    /// Status string from the append stage, if it succeeded.
    pub sheet_status: Option<String>,
    /// Status string from the notification stage, if it ran and succeeded.
    pub email_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_message() {
        let msg =
            ChatMessage::decode(r#"{"chat_id": 42, "user": "Ana", "text": "status?"}"#).unwrap();
        assert_eq!(msg.chat_id, 42);
        assert_eq!(msg.user, "Ana");
        assert_eq!(msg.text, "status?");
    }

    #[test]
    fn test_decode_empty_text_is_allowed() {
        let msg = ChatMessage::decode(r#"{"chat_id": 7, "user": "Bo"}"#).unwrap();
        assert_eq!(msg.chat_id, 7);
        assert!(msg.text.is_empty());
    }

    #[test]
    fn test_decode_missing_chat_id_fails() {
        let err = ChatMessage::decode(r#"{"user": "Ana", "text": "hi"}"#).unwrap_err();
        assert!(matches!(err, FerryError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        // The source evaluated Python dict reprs; we only accept JSON.
        let err = ChatMessage::decode("{'chat_id': 42, 'user': 'Ana'}").unwrap_err();
        assert!(matches!(err, FerryError::Decode(_)));
    }
}
