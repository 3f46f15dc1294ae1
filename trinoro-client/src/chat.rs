//! Chat popup session

use tracing::warn;
use trinoro_common::chat::{Recommendation, RecommendationAction};

use crate::ambient::AmbientMixer;
use crate::client::TrinoroClient;
use crate::timer::MeditationTimer;

pub const GREETING: &str = "Hi! How are you feeling today?";
pub const FALLBACK_REPLY: &str = "I'm having a little trouble connecting right now. But remember, just taking a deep breath can help.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub recommendations: Vec<Recommendation>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: content.to_string(),
            recommendations: Vec::new(),
        }
    }

    fn assistant(content: String, recommendations: Vec<Recommendation>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            recommendations,
        }
    }
}

#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING.to_string(), Vec::new())],
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send `text` and append the reply. Blank input is ignored; any failure
    /// is answered with [`FALLBACK_REPLY`].
    pub async fn send(&mut self, client: &TrinoroClient, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.messages.push(ChatMessage::user(text));

        let reply = match client.chat(text).await {
            Ok(reply) => ChatMessage::assistant(reply.message, reply.recommendations),
            Err(e) => {
                warn!("Chat request failed: {}", e);
                ChatMessage::assistant(FALLBACK_REPLY.to_string(), Vec::new())
            }
        };
        self.messages.push(reply);
    }

    /// Set the timer to the suggested length and queue the suggested sound
    /// in the mixer without starting it.
    pub async fn apply_action(
        action: &RecommendationAction,
        timer: &mut MeditationTimer,
        mixer: &mut AmbientMixer,
        client: &TrinoroClient,
    ) {
        timer.set_duration(action.duration);
        if let Some(tag) = action.ambient_sound.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            mixer.add_sound(client, tag).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use trinoro_common::chat::ActionKind;
    use crate::timer::MAX_DURATION_MINUTES;

    #[test]
    fn test_starts_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::Assistant);
        assert_eq!(session.messages()[0].content, GREETING);
    }

    #[tokio::test]
    async fn test_send_appends_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .match_body(Matcher::Json(serde_json::json!({"message": "I feel tired"})))
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": {"message": "Rest is allowed.", "recommendations": [
                    {"type": "meditation", "title": "Yoga Nidra", "description": "Deep rest.",
                     "duration": "20 min", "action": {"type": "set-timer", "label": "Start Session", "duration": 20}}
                ]}}"#,
            )
            .create_async()
            .await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let mut session = ChatSession::new();
        session.send(&client, "  I feel tired ").await;

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "I feel tired");
        assert_eq!(messages[2].content, "Rest is allowed.");
        assert_eq!(messages[2].recommendations[0].title, "Yoga Nidra");
    }

    #[tokio::test]
    async fn test_send_failure_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(502)
            .with_body(r#"{"success": false, "error": "Failed to generate response"}"#)
            .create_async()
            .await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let mut session = ChatSession::new();
        session.send(&client, "hello").await;
        assert_eq!(session.messages().last().unwrap().content, FALLBACK_REPLY);

        session.send(&client, "   ").await;
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_apply_action_sets_timer_and_queues_sound() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/sounds")
            .match_query(Matcher::UrlEncoded("query".into(), "waves".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"id": 3, "name": "Waves", "preview": "https://cdn/3.mp3"}}"#)
            .create_async()
            .await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let action = RecommendationAction {
            kind: ActionKind::SetTimer,
            label: "Start Session".to_string(),
            duration: 15,
            ambient_sound: Some("waves".to_string()),
        };

        let mut timer = MeditationTimer::new();
        let mut mixer = AmbientMixer::new();
        ChatSession::apply_action(&action, &mut timer, &mut mixer, &client).await;

        assert_eq!(timer.duration(), 15);
        assert_eq!(timer.seconds_left(), 900);
        assert!(!timer.is_running());
        let waves = mixer.get("waves").unwrap();
        assert!(!waves.is_playing);
    }

    #[tokio::test]
    async fn test_apply_action_clamps_oversized_duration() {
        let client = TrinoroClient::new("http://localhost:1").unwrap().with_token("tok");
        let action: RecommendationAction = serde_json::from_str(
            r#"{"type": "set-timer", "label": "Start Session", "duration": 4000000000}"#,
        )
        .unwrap();

        let mut timer = MeditationTimer::new();
        let mut mixer = AmbientMixer::new();
        ChatSession::apply_action(&action, &mut timer, &mut mixer, &client).await;

        assert_eq!(timer.duration(), MAX_DURATION_MINUTES);
        assert_eq!(timer.seconds_left(), MAX_DURATION_MINUTES * 60);
        assert!(mixer.sounds().is_empty());
    }
}
