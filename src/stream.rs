//! Report streaming: relay agent events to the client as SSE frames.
//!
//! ## Why stream?
//!
//! A full compliance report takes the agent tens of seconds to write. A
//! stream lets the frontend render findings as they are produced instead of
//! staring at a spinner, and keeps this service's memory flat: no frame is
//! buffered beyond the one in flight.
//!
//! Not a state machine: exactly one request is issued per upload, and
//! whatever events the agent emits are relayed verbatim, one JSON frame each.
//! The stream ends with the literal `data: [DONE]` sentinel on success, or
//! with a single error frame (which is then the last frame) on any failure.
//! No retries: a generation failure is terminal for that request.

use crate::agent::{AgentClient, AgentEvent, AgentEventStream};
use crate::prompts::{user_prompt, CheckType};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of SSE frames, ready to be used as a response body.
pub type FrameStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// The terminal sentinel frame.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Run one analysis and stream its report.
///
/// Selects the instruction template for `check`, wraps `structure_report`
/// into the user prompt, issues a single generation request, and yields one
/// SSE frame per agent event.
pub fn stream_analysis(
    client: Arc<dyn AgentClient>,
    check: CheckType,
    structure_report: String,
) -> FrameStream {
    let frames = stream::once(async move {
        info!(check_type = %check, "starting report generation");
        let prompt = user_prompt(check, &structure_report);
        match client.generate(check.system_prompt(), &prompt).await {
            Ok(events) => relay(events),
            Err(e) => {
                warn!("generation request failed: {e}");
                one_frame(error_frame(&e.to_string()))
            }
        }
    })
    .flatten();

    Box::pin(frames)
}

/// Relay agent events until exhaustion or the first failure.
///
/// Normal exhaustion appends the sentinel. Both failure shapes end the relay
/// immediately with the error frame as the last frame, sentinel omitted: a
/// stream `Err` (transport or decode) and an [`AgentEvent::Error`] event,
/// which is the provider reporting that it aborted the generation.
fn relay(events: AgentEventStream) -> FrameStream {
    enum Relay {
        Streaming(AgentEventStream),
        Finished,
    }

    let frames = stream::unfold(Relay::Streaming(events), |state| async move {
        match state {
            Relay::Streaming(mut events) => match events.next().await {
                Some(Ok(event @ AgentEvent::Error { .. })) => {
                    warn!("provider aborted generation mid-stream");
                    Some((event_frame(&event), Relay::Finished))
                }
                Some(Ok(event)) => Some((event_frame(&event), Relay::Streaming(events))),
                Some(Err(e)) => {
                    warn!("generation failed mid-stream: {e}");
                    Some((error_frame(&e.to_string()), Relay::Finished))
                }
                None => Some((Bytes::from_static(DONE_FRAME.as_bytes()), Relay::Finished)),
            },
            Relay::Finished => None,
        }
    });

    Box::pin(frames)
}

/// One SSE frame: `data: <json>\n\n`.
fn event_frame(event: &AgentEvent) -> Bytes {
    // AgentEvent serialisation cannot fail: all payloads are strings and
    // already-parsed JSON values.
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Bytes::from(format!("data: {json}\n\n"))
}

fn error_frame(message: &str) -> Bytes {
    event_frame(&AgentEvent::Error {
        error: message.to_string(),
    })
}

fn one_frame(frame: Bytes) -> FrameStream {
    Box::pin(stream::iter(vec![frame]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use async_trait::async_trait;

    /// Stub emitting a fixed event script.
    struct ScriptedAgent {
        script: Vec<Result<AgentEvent, AgentError>>,
    }

    #[async_trait]
    impl AgentClient for ScriptedAgent {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<AgentEventStream, AgentError> {
            let script: Vec<_> = self
                .script
                .iter()
                .map(|r| match r {
                    Ok(ev) => Ok(ev.clone()),
                    Err(e) => Err(AgentError::Transport(e.to_string())),
                })
                .collect();
            Ok(Box::pin(stream::iter(script)))
        }
    }

    /// Stub whose request never starts.
    struct RefusingAgent;

    #[async_trait]
    impl AgentClient for RefusingAgent {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<AgentEventStream, AgentError> {
            Err(AgentError::Api {
                status: 401,
                message: "bad key".to_string(),
            })
        }
    }

    async fn collect_frames(stream: FrameStream) -> Vec<String> {
        stream
            .collect::<Vec<Bytes>>()
            .await
            .into_iter()
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect()
    }

    fn text(t: &str) -> AgentEvent {
        AgentEvent::Text {
            text: t.to_string(),
        }
    }

    #[tokio::test]
    async fn successful_run_ends_with_sentinel() {
        let client = Arc::new(ScriptedAgent {
            script: vec![Ok(text("Report ")), Ok(text("body.")), Ok(AgentEvent::Done)],
        });
        let frames = collect_frames(stream_analysis(client, CheckType::Both, "report".into())).await;

        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], "data: {\"type\":\"text\",\"text\":\"Report \"}\n\n");
        assert_eq!(frames[2], "data: {\"type\":\"done\"}\n\n");
        assert_eq!(frames[3], DONE_FRAME);
    }

    #[tokio::test]
    async fn every_frame_is_well_formed_sse() {
        let client = Arc::new(ScriptedAgent {
            script: vec![Ok(text("x")), Ok(AgentEvent::Done)],
        });
        let frames =
            collect_frames(stream_analysis(client, CheckType::Accessibility, String::new())).await;
        for f in &frames {
            assert!(f.starts_with("data: "), "frame missing prefix: {f:?}");
            assert!(f.ends_with("\n\n"), "frame missing terminator: {f:?}");
        }
    }

    #[tokio::test]
    async fn mid_stream_failure_yields_terminal_error_frame() {
        let client = Arc::new(ScriptedAgent {
            script: vec![
                Ok(text("partial")),
                Err(AgentError::Transport("connection reset".to_string())),
                // Anything after the failure must never be relayed.
                Ok(text("unreachable")),
            ],
        });
        let frames = collect_frames(stream_analysis(client, CheckType::Both, "r".into())).await;

        assert_eq!(frames.len(), 2);
        assert!(frames[1].starts_with("data: {\"type\":\"error\""));
        assert!(frames[1].contains("connection reset"));
        // Error frame is last: no sentinel after it.
        assert!(!frames.iter().any(|f| f == DONE_FRAME));
    }

    #[tokio::test]
    async fn provider_error_event_is_terminal_with_no_sentinel() {
        // The provider aborting generation (e.g. overloaded) arrives as a
        // well-formed Error event, not a stream failure. It must still be
        // the last frame the client sees.
        let client = Arc::new(ScriptedAgent {
            script: vec![
                Ok(text("partial")),
                Ok(AgentEvent::Error {
                    error: "Overloaded".to_string(),
                }),
                Ok(text("unreachable")),
                Ok(AgentEvent::Done),
            ],
        });
        let frames = collect_frames(stream_analysis(client, CheckType::Both, "r".into())).await;

        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[1],
            "data: {\"type\":\"error\",\"error\":\"Overloaded\"}\n\n"
        );
        assert!(!frames.iter().any(|f| f == DONE_FRAME));
    }

    #[tokio::test]
    async fn request_failure_yields_single_error_frame() {
        let frames = collect_frames(stream_analysis(
            Arc::new(RefusingAgent),
            CheckType::Formatting,
            "r".into(),
        ))
        .await;

        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("\"type\":\"error\""));
        assert!(frames[0].contains("401"));
    }
}
