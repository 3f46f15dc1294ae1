//! HTTP client for the Trinoro service
//!
//! Every response is an envelope; [`TrinoroClient`] unwraps `data` on success
//! and turns `{"success": false, "error": ...}` into [`ClientError::Api`].

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use trinoro_common::api::{
    Ack, ApiEnvelope, ChatRequest, CreateJournalRequest, ErrorBody, RecordSessionRequest,
    SoundPreview,
};
use trinoro_common::chat::ChatReply;
use trinoro_common::models::{JournalEntry, Mood, StreakRecord, User, UserStats};

use crate::error::{ClientError, Result};

const USER_AGENT: &str = concat!("trinoro-client/", env!("CARGO_PKG_VERSION"));
const NO_QUERY: &[(&str, &str)] = &[];

pub struct TrinoroClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TrinoroClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Use the session token issued by `/api/auth/callback`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
        Ok(self
            .http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice::<ApiEnvelope<T>>(&bytes)
            .map(|envelope| envelope.data)
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        let response = self.request(Method::GET, path)?.query(query).send().await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.request(Method::POST, path)?.json(body).send().await?;
        Self::decode(response).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get("/api/auth/session", NO_QUERY).await
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        let _: Ack = self.post("/api/auth/signout", &serde_json::json!({})).await?;
        self.token = None;
        Ok(())
    }

    pub async fn create_entry(&self, mood: Mood, text: &str, tags: &[String]) -> Result<JournalEntry> {
        let body = CreateJournalRequest {
            mood: Some(mood.to_string()),
            text: Some(text.to_string()),
            tags: Some(tags.to_vec()),
        };
        self.post("/api/journal", &body).await
    }

    pub async fn list_entries(&self, limit: Option<i64>, skip: Option<i64>) -> Result<Vec<JournalEntry>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(skip) = skip {
            query.push(("skip", skip.to_string()));
        }
        self.get("/api/journal", &query).await
    }

    pub async fn search_entries(&self, text: &str) -> Result<Vec<JournalEntry>> {
        self.get("/api/journal", &[("q", text)]).await
    }

    pub async fn record_session(&self, minutes: i64, has_journal_entry: bool) -> Result<Ack> {
        let body = RecordSessionRequest {
            minutes: Some(minutes),
            has_journal_entry,
        };
        self.post("/api/streak", &body).await
    }

    pub async fn calendar(&self, year: i32, month: u32) -> Result<Vec<StreakRecord>> {
        self.get(
            "/api/streak",
            &[("year", year.to_string()), ("month", month.to_string())],
        )
        .await
    }

    pub async fn stats(&self) -> Result<UserStats> {
        self.get("/api/user/stats", NO_QUERY).await
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply> {
        let body = ChatRequest {
            message: Some(message.to_string()),
        };
        self.post("/api/chat", &body).await
    }

    /// First preview for `query`; `None` when the library has nothing
    pub async fn search_sound(&self, query: &str) -> Result<Option<SoundPreview>> {
        match self.get("/api/sounds", &[("query", query)]).await {
            Ok(sound) => Ok(Some(sound)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_requires_token() {
        let client = TrinoroClient::new("http://localhost:1").unwrap();
        assert!(matches!(client.stats().await, Err(ClientError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_unwraps_envelope_and_sends_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/user/stats")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": {"currentStreak": 2, "longestStreak": 5,
                    "totalSessions": 9, "totalMinutes": 90, "averageSessionLength": 10.0,
                    "journalEntries": 1, "moodDistribution": {"calm": 1}}}"#,
            )
            .create_async()
            .await;

        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");
        let stats = client.stats().await.unwrap();
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 5);
        assert_eq!(stats.mood_distribution.get(&Mood::Calm), Some(&1));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_envelope_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/streak")
            .with_status(400)
            .with_body(r#"{"success": false, "error": "Valid minutes are required"}"#)
            .create_async()
            .await;

        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");
        let err = client.record_session(0, false).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Valid minutes are required");
    }

    #[tokio::test]
    async fn test_search_sound_not_found_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/sounds")
            .match_query(Matcher::UrlEncoded("query".into(), "void".into()))
            .with_status(404)
            .with_body(r#"{"success": false, "error": "No sound found"}"#)
            .create_async()
            .await;

        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");
        assert_eq!(client.search_sound("void").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/signout")
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"message": "Signed out"}}"#)
            .create_async()
            .await;

        let mut client = TrinoroClient::new(server.url()).unwrap().with_token("tok");
        client.sign_out().await.unwrap();
        assert!(!client.is_signed_in());
    }
}
