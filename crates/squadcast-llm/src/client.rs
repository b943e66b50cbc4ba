// Claude API streaming client using reqwest-eventsource.
//
// Sends messages to the Anthropic Messages API with `stream: true` and parses
// the Server-Sent Events into `LlmEvent` variants forwarded over an mpsc
// channel. `LlmClient::complete` drains that channel for callers that only
// want the finished text.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use squadcast_core::config::Config;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Buffer between the SSE reader and whoever drains it.
const EVENT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Events and messages
// ---------------------------------------------------------------------------

/// One step of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    Token {
        text: String,
    },
    Complete {
        full_text: String,
        input_tokens: u32,
        output_tokens: u32,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A finished completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("LLM not configured")]
    Disabled,

    #[error("{0}")]
    Stream(String),
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

/// Low-level Claude API streaming client.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl ClaudeClient {
    /// Create a new client with the given API key and model identifier.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            api_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Point the client at a different Messages endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a whole conversation and stream the response as `LlmEvent`s
    /// over `tx`.
    ///
    /// Returns when the stream is complete, an error occurs, or the receiver
    /// is dropped. Failures are reported as `LlmEvent::Error`, not as `Err`.
    pub async fn stream_conversation(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "API key not configured".to_string(),
                })
                .await;
            return Ok(());
        }

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "stream": true,
            "system": system,
            "messages": messages,
        });

        let request = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let mut es = match request.eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                    })
                    .await;
                return Ok(());
            }
        };

        let mut full_text = String::new();
        let mut input_tokens: u32 = 0;
        let mut output_tokens: u32 = 0;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    let event_type = msg.event.as_str();
                    let data = &msg.data;

                    match event_type {
                        "message_start" => {
                            match parse_input_tokens(data) {
                                Some(n) => input_tokens = n,
                                None => warn!("failed to parse input_tokens from message_start"),
                            }
                            debug!(input_tokens, "message_start");
                        }
                        "content_block_delta" => {
                            if let Some(text) = parse_delta_text(data) {
                                full_text.push_str(&text);
                                if tx.send(LlmEvent::Token { text }).await.is_err() {
                                    es.close();
                                    return Ok(());
                                }
                            }
                        }
                        "message_delta" => {
                            match parse_output_tokens(data) {
                                Some(n) => output_tokens = n,
                                None => warn!("failed to parse output_tokens from message_delta"),
                            }
                            debug!(output_tokens, "message_delta");
                        }
                        "message_stop" => {
                            debug!("message_stop, streaming complete");
                            let _ = tx
                                .send(LlmEvent::Complete {
                                    full_text,
                                    input_tokens,
                                    output_tokens,
                                })
                                .await;
                            es.close();
                            return Ok(());
                        }
                        "error" => {
                            let message = parse_api_error(data)
                                .unwrap_or_else(|| "API reported an error".to_string());
                            warn!(%message, "API error event");
                            let _ = tx.send(LlmEvent::Error { message }).await;
                            es.close();
                            return Ok(());
                        }
                        // ping, content_block_start, content_block_stop
                        _ => {
                            debug!(event_type, "ignoring SSE event");
                        }
                    }
                }
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    let _ = tx
                        .send(LlmEvent::Error {
                            message: extract_error_message(&err),
                        })
                        .await;
                    es.close();
                    return Ok(());
                }
            }
        }

        // Stream ended without message_stop.
        if full_text.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "Stream ended unexpectedly without any content".to_string(),
                })
                .await;
        } else {
            let _ = tx
                .send(LlmEvent::Complete {
                    full_text,
                    input_tokens,
                    output_tokens,
                })
                .await;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active Claude client or disabled.
pub enum LlmClient {
    /// Claude API is configured and ready.
    Active(ClaudeClient),
    /// No API key configured.
    Disabled,
}

impl LlmClient {
    /// `Active` when an API key is available from the environment or
    /// credentials.toml, otherwise `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match config.credentials.api_key() {
            Some(key) => LlmClient::Active(ClaudeClient::new(key, config.llm.model.clone())),
            None => LlmClient::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    /// Stream a conversation, delegating to the inner `ClaudeClient` or
    /// immediately sending an error if disabled.
    pub async fn stream_conversation(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => {
                client
                    .stream_conversation(system, messages, max_tokens, tx)
                    .await
            }
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: LlmError::Disabled.to_string(),
                    })
                    .await;
                Ok(())
            }
        }
    }

    /// Run a single-message completion to the end and return the text.
    pub async fn complete(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
    ) -> Result<Completion, LlmError> {
        self.converse(system, &[ChatMessage::user(user_content)], max_tokens)
            .await
    }

    /// Run a conversation to the end and return the reply.
    pub async fn converse(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<Completion, LlmError> {
        if !self.is_enabled() {
            return Err(LlmError::Disabled);
        }

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let stream = self.stream_conversation(system, messages, max_tokens, tx);
        let collect = async {
            while let Some(event) = rx.recv().await {
                match event {
                    LlmEvent::Token { .. } => {}
                    LlmEvent::Complete {
                        full_text,
                        input_tokens,
                        output_tokens,
                    } => {
                        return Ok(Completion {
                            text: full_text,
                            input_tokens,
                            output_tokens,
                        })
                    }
                    LlmEvent::Error { message } => return Err(LlmError::Stream(message)),
                }
            }
            Err(LlmError::Stream("stream closed without a result".to_string()))
        };

        let (streamed, collected) = tokio::join!(stream, collect);
        if let Err(e) = streamed {
            return Err(LlmError::Stream(e.to_string()));
        }
        collected
    }
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Extract `input_tokens` from a `message_start` event's JSON.
///
/// Expected shape: `{ "type": "message_start", "message": { "usage": { "input_tokens": N } } }`
pub(crate) fn parse_input_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("message")?
        .get("usage")?
        .get("input_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract `delta.text` from a `content_block_delta` event's JSON.
pub(crate) fn parse_delta_text(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("delta")?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract `output_tokens` from a `message_delta` event's JSON.
pub(crate) fn parse_output_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("usage")?
        .get("output_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract `error.message` from an in-stream `error` event.
///
/// Expected shape: `{ "type": "error", "error": { "type": "overloaded_error", "message": "..." } }`
pub(crate) fn parse_api_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract a human-readable error message from an SSE error.
fn extract_error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            format!("API returned status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => {
            format!("Network error: {e}")
        }
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // -- SSE JSON parsing tests --

    #[test]
    fn parse_message_start_input_tokens() {
        let data = r#"{
            "type": "message_start",
            "message": {
                "id": "msg_123",
                "type": "message",
                "role": "assistant",
                "content": [],
                "model": "claude-sonnet-4-5-20250929",
                "usage": { "input_tokens": 42, "output_tokens": 0 }
            }
        }"#;
        assert_eq!(parse_input_tokens(data), Some(42));
    }

    #[test]
    fn parse_message_start_missing_usage() {
        let data = r#"{ "type": "message_start", "message": { "id": "msg_1" } }"#;
        assert_eq!(parse_input_tokens(data), None);
        assert_eq!(parse_input_tokens("not json"), None);
    }

    #[test]
    fn parse_content_block_delta_text() {
        let data = r#"{
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": "Salah (C)" }
        }"#;
        assert_eq!(parse_delta_text(data), Some("Salah (C)".to_string()));
        assert_eq!(
            parse_delta_text(r#"{ "type": "content_block_delta", "index": 0 }"#),
            None
        );
        assert_eq!(parse_delta_text("{broken"), None);
    }

    #[test]
    fn parse_delta_text_with_unicode() {
        let data = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Ødegaard → Palmer"}}"#;
        assert_eq!(
            parse_delta_text(data),
            Some("Ødegaard \u{2192} Palmer".to_string())
        );
    }

    #[test]
    fn parse_message_delta_output_tokens() {
        let data = r#"{
            "type": "message_delta",
            "delta": { "stop_reason": "end_turn", "stop_sequence": null },
            "usage": { "output_tokens": 128 }
        }"#;
        assert_eq!(parse_output_tokens(data), Some(128));
        assert_eq!(
            parse_output_tokens(r#"{ "type": "message_delta", "delta": {} }"#),
            None
        );
    }

    #[test]
    fn parse_error_event_message() {
        let data = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(parse_api_error(data), Some("Overloaded".to_string()));
        assert_eq!(parse_api_error(r#"{"type":"error"}"#), None);
    }

    #[test]
    fn chat_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    // -- Disabled and keyless paths --

    #[tokio::test]
    async fn disabled_client_sends_error_event() {
        let client = LlmClient::Disabled;
        let (tx, mut rx) = mpsc::channel(8);

        client
            .stream_conversation("system", &[ChatMessage::user("user")], 100, tx)
            .await
            .expect("should not fail");

        let event = rx.recv().await.expect("should receive an event");
        assert_eq!(
            event,
            LlmEvent::Error {
                message: "LLM not configured".to_string(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disabled_client_complete_is_disabled_error() {
        let err = LlmClient::Disabled
            .complete("system", "user", 100)
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::Disabled);
    }

    #[tokio::test]
    async fn empty_api_key_sends_error_event() {
        let client = ClaudeClient::new(String::new(), "model".to_string());
        let (tx, mut rx) = mpsc::channel(8);

        client
            .stream_conversation("system", &[ChatMessage::user("user")], 100, tx)
            .await
            .expect("should not fail");

        assert_eq!(
            rx.recv().await,
            Some(LlmEvent::Error {
                message: "API key not configured".to_string(),
            })
        );
    }

    // -- Against a mock SSE server --

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            String::from_utf8_lossy(&buf[..n]).to_string()
        });

        (format!("http://{addr}/v1/messages"), task)
    }

    const SSE_OK: &str = concat!(
        "HTTP/1.1 200 OK\r\n",
        "Content-Type: text/event-stream\r\n",
        "Cache-Control: no-cache\r\n",
        "\r\n",
        "event: message_start\r\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"type\":\"message\",\"role\":\"assistant\",\"content\":[],\"model\":\"test\",\"usage\":{\"input_tokens\":15}}}\r\n",
        "\r\n",
        "event: content_block_start\r\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\r\n",
        "\r\n",
        "event: content_block_delta\r\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Captain\"}}\r\n",
        "\r\n",
        "event: content_block_delta\r\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" Haaland\"}}\r\n",
        "\r\n",
        "event: content_block_stop\r\n",
        "data: {\"type\":\"content_block_stop\",\"index\":0}\r\n",
        "\r\n",
        "event: message_delta\r\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":7}}\r\n",
        "\r\n",
        "event: message_stop\r\n",
        "data: {\"type\":\"message_stop\"}\r\n",
        "\r\n",
    );

    #[tokio::test]
    async fn stream_conversation_emits_tokens_then_complete() {
        let (url, server) = serve_once(SSE_OK).await;
        let client = ClaudeClient::new("sk-test".into(), "test-model".into()).with_api_url(url);

        let (tx, mut rx) = mpsc::channel(32);
        client
            .stream_conversation("sys", &[ChatMessage::user("who?")], 50, tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        assert_eq!(
            events,
            vec![
                LlmEvent::Token {
                    text: "Captain".into()
                },
                LlmEvent::Token {
                    text: " Haaland".into()
                },
                LlmEvent::Complete {
                    full_text: "Captain Haaland".into(),
                    input_tokens: 15,
                    output_tokens: 7,
                },
            ]
        );

        let request = server.await.unwrap();
        assert!(request.contains("x-api-key: sk-test"));
    }

    #[tokio::test]
    async fn complete_collects_full_text() {
        let (url, _server) = serve_once(SSE_OK).await;
        let client = LlmClient::Active(
            ClaudeClient::new("sk-test".into(), "test-model".into()).with_api_url(url),
        );
        let done = client.complete("sys", "who?", 50).await.unwrap();
        assert_eq!(done.text, "Captain Haaland");
        assert_eq!(done.output_tokens, 7);
    }

    #[tokio::test]
    async fn error_status_becomes_stream_error() {
        let (url, _server) = serve_once(concat!(
            "HTTP/1.1 401 Unauthorized\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: 2\r\n",
            "\r\n",
            "{}",
        ))
        .await;
        let client = LlmClient::Active(
            ClaudeClient::new("sk-bad".into(), "test-model".into()).with_api_url(url),
        );
        match client.complete("sys", "hi", 50).await {
            Err(LlmError::Stream(msg)) => assert!(msg.contains("401"), "got: {msg}"),
            other => panic!("expected stream error, got: {other:?}"),
        }
    }
}
