use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::api::BankingClient;

/// First assistant line of every conversation
pub const WELCOME_MESSAGE: &str =
    "Welcome to Bank of Anthos chat assistant. How can I help you today?";

/// Assistant line shown when the chat endpoint could not be reached
pub const ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub message: String,
    /// Missing or unreadable timestamps become the time of receipt
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// RFC 3339, or an ISO datetime without offset taken as UTC. Anything else
/// falls back to now so the reply text is never lost.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(Utc::now());
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    warn!(timestamp = %raw, "Unreadable chat timestamp, using time of receipt");
    Ok(Utc::now())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

/// Running conversation with the assistant, oldest message first.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTranscript {
    pub fn new() -> Self {
        let mut transcript = Self {
            messages: Vec::new(),
            next_id: 0,
        };
        transcript.push(WELCOME_MESSAGE.to_string(), false, Utc::now());
        transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    fn push(&mut self, text: String, is_user: bool, timestamp: DateTime<Utc>) -> &ChatMessage {
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id: self.next_id,
            text,
            is_user,
            timestamp,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Send `text` for `user_id` and record both sides of the exchange.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the assistant's
    /// line is returned: the reply, or `ERROR_MESSAGE` if the call failed.
    pub async fn send(
        &mut self,
        client: &BankingClient,
        user_id: &str,
        text: &str,
    ) -> Option<&ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }

        self.push(text.to_string(), true, Utc::now());

        match client.send_chat_message(user_id, text).await {
            Ok(reply) => Some(self.push(reply.message, false, reply.timestamp)),
            Err(e) => {
                warn!(error = %e, "Chat message failed");
                Some(self.push(ERROR_MESSAGE.to_string(), false, Utc::now()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_with, MockTransport};
    use reqwest::StatusCode;

    #[test]
    fn test_transcript_starts_with_welcome() {
        let transcript = ChatTranscript::new();
        assert_eq!(transcript.messages().len(), 1);
        let first = &transcript.messages()[0];
        assert_eq!(first.text, WELCOME_MESSAGE);
        assert!(!first.is_user);
    }

    #[test]
    fn test_parse_chat_reply() {
        let json = r#"{"message":"Your balance is $10.","timestamp":"2024-05-01T12:30:00Z"}"#;
        let reply: ChatReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.message, "Your balance is $10.");
        assert_eq!(reply.timestamp.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_parse_chat_reply_naive_timestamp() {
        let json = r#"{"message":"Hi","timestamp":"2024-05-01T12:30:00.123456"}"#;
        let reply: ChatReply = serde_json::from_str(json).unwrap();
        assert_eq!(
            reply.timestamp.to_rfc3339(),
            "2024-05-01T12:30:00.123456+00:00"
        );

        let json = r#"{"message":"Hi","timestamp":"2024-05-01T14:30:00+02:00"}"#;
        let reply: ChatReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.timestamp.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_bad_timestamp_keeps_message() {
        let before = Utc::now();
        for json in [
            r#"{"message":"Hi","timestamp":"yesterday"}"#,
            r#"{"message":"Hi","timestamp":null}"#,
            r#"{"message":"Hi"}"#,
        ] {
            let reply: ChatReply = serde_json::from_str(json).unwrap();
            assert_eq!(reply.message, "Hi");
            assert!(reply.timestamp >= before);
        }
    }

    #[tokio::test]
    async fn test_send_with_naive_timestamp_shows_reply() {
        let transport = MockTransport::new();
        transport.respond(
            StatusCode::OK,
            r#"{"message":"Your balance is $10.","timestamp":"2024-05-01T12:30:00.123456"}"#,
        );
        let (client, _session) = client_with(transport.clone());
        let mut transcript = ChatTranscript::new();

        let reply = transcript.send(&client, "u-1", "balance?").await.unwrap();
        assert_eq!(reply.text, "Your balance is $10.");
    }

    #[tokio::test]
    async fn test_send_records_reply() {
        let transport = MockTransport::new();
        transport.respond(
            StatusCode::OK,
            r#"{"message":"Hello!","timestamp":"2024-05-01T12:30:00Z"}"#,
        );
        let (client, _session) = client_with(transport.clone());
        let mut transcript = ChatTranscript::new();

        let reply = transcript.send(&client, "u-1", "hi").await.unwrap();
        assert_eq!(reply.text, "Hello!");
        assert!(!reply.is_user);

        let messages = transcript.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "hi");
        assert!(messages[1].is_user);
        assert!(messages[1].id < messages[2].id);
    }

    #[tokio::test]
    async fn test_send_failure_appends_apology() {
        let transport = MockTransport::new();
        transport.fail_network("connection refused");
        let (client, _session) = client_with(transport.clone());
        let mut transcript = ChatTranscript::new();

        let reply = transcript.send(&client, "u-1", "hi").await.unwrap();
        assert_eq!(reply.text, ERROR_MESSAGE);
        assert_eq!(transcript.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_message_is_not_sent() {
        let transport = MockTransport::new();
        let (client, _session) = client_with(transport.clone());
        let mut transcript = ChatTranscript::new();

        assert!(transcript.send(&client, "u-1", "   ").await.is_none());
        assert_eq!(transcript.messages().len(), 1);
        assert!(transport.requests().is_empty());
    }
}
