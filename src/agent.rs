//! Generative-agent boundary: one streaming request, typed events out.
//!
//! The provider's wire protocol is dynamically shaped (JSON objects whose
//! fields depend on an event-type tag). Rather than letting that shape-
//! sniffing leak through the crate, this module defines the closed
//! [`AgentEvent`] variant set and a single conversion function,
//! [`wire_to_agent_event`], from wire frames into it. Everything downstream
//! of this file only ever sees `AgentEvent`.
//!
//! [`AgentClient`] is the seam the report streamer works against; production
//! uses [`AnthropicClient`] (Messages API with `stream: true`), tests use
//! in-memory stubs.

use crate::config::AppConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use futures::stream::{self, TryStreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::debug;

/// A boxed stream of agent events.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send>>;

/// One event emitted by the agent during generation.
///
/// Serialises to the one-line JSON carried in each SSE frame, e.g.
/// `{"type":"text","text":"…"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Incremental report text.
    Text { text: String },
    /// The agent invoked a tool.
    ToolUse { name: String, input: Value },
    /// The provider reported an error mid-stream.
    Error { error: String },
    /// Generation finished normally.
    Done,
}

/// A client able to run one streaming generation.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Issue exactly one request and return the event stream.
    ///
    /// A returned `Err` means the request never started (configuration or
    /// transport failure); errors after that point travel inside the stream.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AgentEventStream, AgentError>;
}

// ── Anthropic Messages API client ────────────────────────────────────────

/// Streaming client for the Anthropic Messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: usize,
}

impl AnthropicClient {
    /// Build a client from the service config.
    ///
    /// Fails fast when no API key is configured so the problem surfaces at
    /// startup rather than on the first upload.
    pub fn new(config: &AppConfig) -> Result<Self, AgentError> {
        if config.api_key.is_empty() {
            return Err(AgentError::NotConfigured(
                "no API key set (see ANTHROPIC_API_KEY)".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl AgentClient for AnthropicClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AgentEventStream, AgentError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "stream": true,
            "system": system_prompt,
            "messages": [{ "role": "user", "content": user_prompt }],
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parser = SseParser::default();
        let events = response
            .bytes_stream()
            .map_err(AgentError::from)
            .map_ok(move |chunk| {
                let converted: Vec<Result<AgentEvent, AgentError>> = parser
                    .push(&chunk)
                    .iter()
                    .filter_map(|frame| wire_to_agent_event(frame).transpose())
                    .collect();
                stream::iter(converted)
            })
            .try_flatten();

        Ok(Box::pin(events))
    }
}

// ── Wire decoding ────────────────────────────────────────────────────────

/// One decoded `event:`/`data:` pair from the provider's SSE stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WireFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE frame splitter.
///
/// Buffers raw bytes (network chunks can split frames, and even multi-byte
/// characters, anywhere) and yields complete frames as they arrive.
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    /// Feed one network chunk; return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<WireFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = find_frame_end(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..pos + 2).collect();
            let text = String::from_utf8_lossy(&raw[..pos.min(raw.len())]);

            let mut event = None;
            let mut data_lines = Vec::new();
            for line in text.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    event = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data_lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
                }
                // Comment lines (":") and unknown fields are ignored per the
                // SSE spec.
            }
            if !data_lines.is_empty() {
                frames.push(WireFrame {
                    event,
                    data: data_lines.join("\n"),
                });
            }
        }

        frames
    }
}

fn find_frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

/// Convert one wire frame into an [`AgentEvent`].
///
/// The single place where the provider's event-type tags are interpreted.
/// Returns `Ok(None)` for housekeeping events (`ping`, `message_start`,
/// block boundaries) that carry nothing the client needs to relay.
pub(crate) fn wire_to_agent_event(frame: &WireFrame) -> Result<Option<AgentEvent>, AgentError> {
    let value: Value = serde_json::from_str(&frame.data)
        .map_err(|e| AgentError::Decode(format!("{e}: {}", frame.data)))?;

    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .or(frame.event.as_deref())
        .unwrap_or_default();

    match event_type {
        "content_block_delta" => {
            let delta = value.get("delta");
            match delta.and_then(|d| d.get("type")).and_then(Value::as_str) {
                Some("text_delta") => {
                    let text = delta
                        .and_then(|d| d.get("text"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    Ok(Some(AgentEvent::Text { text }))
                }
                // Tool-input deltas and other delta kinds carry nothing the
                // report consumer renders.
                _ => Ok(None),
            }
        }
        "content_block_start" => {
            let block = value.get("content_block");
            match block.and_then(|b| b.get("type")).and_then(Value::as_str) {
                Some("tool_use") => Ok(Some(AgentEvent::ToolUse {
                    name: block
                        .and_then(|b| b.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input: block
                        .and_then(|b| b.get("input"))
                        .cloned()
                        .unwrap_or(Value::Null),
                })),
                _ => Ok(None),
            }
        }
        "message_stop" => Ok(Some(AgentEvent::Done)),
        "error" => {
            let message = value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown agent error")
                .to_string();
            Ok(Some(AgentEvent::Error { error: message }))
        }
        "ping" | "message_start" | "message_delta" | "content_block_stop" => Ok(None),
        other => {
            debug!(event_type = other, "skipping unrecognised agent event");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> WireFrame {
        WireFrame {
            event: Some(event.to_string()),
            data: data.to_string(),
        }
    }

    #[test]
    fn parser_splits_complete_frames() {
        let mut p = SseParser::default();
        let frames = p.push(b"event: ping\ndata: {\"type\":\"ping\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("ping"));
        assert_eq!(frames[0].data, "{\"type\":\"ping\"}");
    }

    #[test]
    fn parser_buffers_partial_frames_across_chunks() {
        let mut p = SseParser::default();
        assert!(p.push(b"data: {\"type\":").is_empty());
        let frames = p.push(b"\"message_stop\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"type\":\"message_stop\"}");
    }

    #[test]
    fn parser_yields_multiple_frames_from_one_chunk() {
        let mut p = SseParser::default();
        let frames = p.push(b"data: 1\n\ndata: 2\n\ndata: 3");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].data, "2");
        // Trailing partial stays buffered.
        let frames = p.push(b"\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "3");
    }

    #[test]
    fn parser_survives_multibyte_chars_split_across_chunks() {
        let payload = "data: {\"text\":\"語\"}\n\n".as_bytes();
        let (a, b) = payload.split_at(16); // splits inside the 3-byte char
        let mut p = SseParser::default();
        assert!(p.push(a).is_empty());
        let frames = p.push(b);
        assert_eq!(frames[0].data, "{\"text\":\"語\"}");
    }

    #[test]
    fn text_delta_becomes_text_event() {
        let f = frame(
            "content_block_delta",
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"Hello"}}"#,
        );
        assert_eq!(
            wire_to_agent_event(&f).unwrap(),
            Some(AgentEvent::Text {
                text: "Hello".to_string()
            })
        );
    }

    #[test]
    fn tool_use_start_becomes_tool_use_event() {
        let f = frame(
            "content_block_start",
            r#"{"type":"content_block_start","content_block":{"type":"tool_use","name":"read_file","input":{}}}"#,
        );
        let ev = wire_to_agent_event(&f).unwrap().unwrap();
        assert_eq!(
            ev,
            AgentEvent::ToolUse {
                name: "read_file".to_string(),
                input: json!({}),
            }
        );
    }

    #[test]
    fn message_stop_becomes_done() {
        let f = frame("message_stop", r#"{"type":"message_stop"}"#);
        assert_eq!(wire_to_agent_event(&f).unwrap(), Some(AgentEvent::Done));
    }

    #[test]
    fn error_event_carries_provider_message() {
        let f = frame(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert_eq!(
            wire_to_agent_event(&f).unwrap(),
            Some(AgentEvent::Error {
                error: "Overloaded".to_string()
            })
        );
    }

    #[test]
    fn housekeeping_events_are_skipped() {
        for (ev, data) in [
            ("ping", r#"{"type":"ping"}"#),
            ("message_start", r#"{"type":"message_start","message":{}}"#),
            ("content_block_stop", r#"{"type":"content_block_stop","index":0}"#),
            ("message_delta", r#"{"type":"message_delta","delta":{}}"#),
        ] {
            assert_eq!(wire_to_agent_event(&frame(ev, data)).unwrap(), None, "{ev}");
        }
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let f = frame("content_block_delta", "{not json");
        assert!(matches!(
            wire_to_agent_event(&f),
            Err(AgentError::Decode(_))
        ));
    }

    #[test]
    fn event_json_shapes_match_the_sse_contract() {
        let text = serde_json::to_string(&AgentEvent::Text {
            text: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(text, r#"{"type":"text","text":"hi"}"#);

        let err = serde_json::to_string(&AgentEvent::Error {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(err, r#"{"type":"error","error":"boom"}"#);

        let done = serde_json::to_string(&AgentEvent::Done).unwrap();
        assert_eq!(done, r#"{"type":"done"}"#);
    }

    #[test]
    fn client_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            AnthropicClient::new(&config),
            Err(AgentError::NotConfigured(_))
        ));
    }
}
