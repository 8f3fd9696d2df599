/*!
SSE + JSON-RPC session client for the DeepWiki MCP endpoint.

Protocol shape (one tool call per process):
  1. GET the fixed SSE endpoint and hold the stream open.
  2. Wait for the server-pushed `endpoint` event; its data is a relative
     path that resolves against the base URL into the per-session POST
     target. Nothing may be sent before it arrives.
  3. POST `initialize` (id 1) to the callback URL. Its reply is never
     awaited on the stream; a failed POST is still fatal.
  4. POST `tools/call` (id 2) with {name, arguments}.
  5. Every `message` frame is parsed as JSON; frames that fail to parse
     are dropped. The frame whose id is 2 is the reply we are waiting for.

The session is an explicit state machine
(Connecting -> AwaitingEndpoint -> Ready -> AwaitingResponse -> Done) and
the whole thing runs under a single `tokio::time::timeout`, so exactly one
of {matching frame, transport error, timeout} can win.

No retries anywhere. Every failure is terminal for the process.
*/

use futures_util::StreamExt;
use serde_json::{Value, json};
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::log_debug;

/// Fixed SSE endpoint for the DeepWiki MCP service.
pub const MCP_ENDPOINT: &str = "https://mcp.deepwiki.com/sse";

/// MCP protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Wall-clock budget for the whole session.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

const INITIALIZE_ID: u64 = 1;
const CALL_ID: u64 = 2;

/* ---- Failure Taxonomy ---- */

#[derive(Debug, Error)]
pub enum McpError {
    #[error("SSE connect failed: {0}")]
    Connect(String),

    #[error("SSE stream ended before the endpoint event arrived")]
    NoEndpoint,

    #[error("invalid session endpoint path: {0}")]
    BadEndpoint(String),

    #[error("POST {method} failed: {detail}")]
    Request {
        method: &'static str,
        detail: String,
    },

    #[error("SSE stream ended before the tool responded")]
    StreamClosed,

    #[error("no response within {}s", RESPONSE_TIMEOUT.as_secs())]
    Timeout,
}

/// Terminal outcome of a correlated id-2 reply.
#[derive(Debug, PartialEq)]
pub enum CallOutcome {
    /// `result.content[].text`, joined by newlines.
    Text(String),
    /// JSON-RPC level `error` object.
    ToolError(Value),
    /// An id-2 frame with neither content nor error; surfaced raw.
    Other(Value),
}

/* ---- SSE Framing ---- */

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental SSE decoder: feed byte chunks, pull complete frames.
///
/// Only the `event:` and `data:` fields matter here; comment lines and
/// unknown fields are ignored, multiple data lines are joined with `\n`.
#[derive(Default)]
pub struct SseDecoder {
    buf: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
        // Normalize CRLF once the pair is fully buffered.
        if self.buf.contains('\r') {
            self.buf = self.buf.replace("\r\n", "\n");
        }
    }

    /// Pop the next complete frame, if a blank-line terminator is buffered.
    pub fn next_frame(&mut self) -> Option<SseFrame> {
        while let Some(pos) = self.buf.find("\n\n") {
            let raw: String = self.buf.drain(..pos + 2).collect();

            let mut event = String::from("message");
            let mut data: Vec<&str> = Vec::new();

            for line in raw.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (field, value) = line.split_once(':').unwrap_or((line, ""));
                let value = value.strip_prefix(' ').unwrap_or(value);
                match field {
                    "event" => event = value.to_string(),
                    "data" => data.push(value),
                    _ => {}
                }
            }

            // Comment-only or heartbeat frames carry nothing; keep scanning.
            if data.is_empty() && event == "message" {
                continue;
            }

            return Some(SseFrame {
                event,
                data: data.join("\n"),
            });
        }
        None
    }
}

/// The open SSE stream plus its decoder.
struct EventStream {
    chunks: Pin<Box<dyn futures_util::Stream<Item = Result<Vec<u8>, McpError>> + Send>>,
    decoder: SseDecoder,
}

impl EventStream {
    fn from_response(resp: reqwest::Response) -> EventStream {
        let chunks = resp
            .bytes_stream()
            .map(|r| r.map(|b| b.to_vec()).map_err(|e| McpError::Connect(e.to_string())));
        EventStream {
            chunks: Box::pin(chunks),
            decoder: SseDecoder::new(),
        }
    }

    /// Next complete frame; `Ok(None)` when the server closed the stream.
    async fn next_frame(&mut self) -> Result<Option<SseFrame>, McpError> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(Some(frame));
            }
            match self.chunks.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
    }
}

/* ---- Session State Machine ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingEndpoint,
    Ready,
    AwaitingResponse,
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Connecting => "connecting",
            SessionState::AwaitingEndpoint => "awaiting-endpoint",
            SessionState::Ready => "ready",
            SessionState::AwaitingResponse => "awaiting-response",
            SessionState::Done => "done",
        };
        f.write_str(s)
    }
}

/// One tool-call session over an open SSE stream.
pub struct Session {
    client: reqwest::Client,
    base: Url,
    events: EventStream,
    callback: Option<Url>,
    state: SessionState,
}

impl Session {
    /// Open the SSE stream. State: Connecting -> AwaitingEndpoint.
    pub async fn connect(endpoint: &str) -> Result<Session, McpError> {
        let base = Url::parse(endpoint).map_err(|e| McpError::Connect(e.to_string()))?;
        let client = reqwest::Client::new();

        log_debug!("session {}: {}", SessionState::Connecting, endpoint);
        let resp = client
            .get(base.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::Connect(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(McpError::Connect(format!("HTTP {}", resp.status())));
        }

        Ok(Session {
            client,
            base,
            events: EventStream::from_response(resp),
            callback: None,
            state: SessionState::AwaitingEndpoint,
        })
    }

    /// Wait for the `endpoint` event and resolve the session callback URL.
    /// State: AwaitingEndpoint -> Ready.
    pub async fn await_endpoint(&mut self) -> Result<(), McpError> {
        debug_assert_eq!(self.state, SessionState::AwaitingEndpoint);

        loop {
            match self.events.next_frame().await? {
                Some(frame) if frame.event == "endpoint" => {
                    let callback = self
                        .base
                        .join(&frame.data)
                        .map_err(|_| McpError::BadEndpoint(frame.data.clone()))?;
                    log_debug!("session {}: callback {}", self.state, callback);
                    self.callback = Some(callback);
                    self.state = SessionState::Ready;
                    return Ok(());
                }
                // Anything arriving before the rendezvous is noise.
                Some(_) => continue,
                None => return Err(McpError::NoEndpoint),
            }
        }
    }

    /// Send `initialize` then `tools/call`. State: Ready -> AwaitingResponse.
    pub async fn invoke(
        &mut self,
        name: &str,
        arguments: &serde_json::Map<String, Value>,
    ) -> Result<(), McpError> {
        debug_assert_eq!(self.state, SessionState::Ready);

        self.post_rpc(
            INITIALIZE_ID,
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "pi-bridge", "version": "1.0.0" }
            }),
        )
        .await?;

        self.post_rpc(
            CALL_ID,
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )
        .await?;

        self.state = SessionState::AwaitingResponse;
        Ok(())
    }

    /// Read frames until the id-2 reply arrives. State: AwaitingResponse -> Done.
    pub async fn await_response(&mut self) -> Result<CallOutcome, McpError> {
        debug_assert_eq!(self.state, SessionState::AwaitingResponse);

        loop {
            match self.events.next_frame().await? {
                Some(frame) => {
                    if let Some(outcome) = correlate(&frame.data) {
                        log_debug!("session {}: id {} matched", self.state, CALL_ID);
                        self.state = SessionState::Done;
                        return Ok(outcome);
                    }
                    log_debug!("session {}: frame ignored", self.state);
                }
                None => return Err(McpError::StreamClosed),
            }
        }
    }

    async fn post_rpc(&self, id: u64, method: &'static str, params: Value) -> Result<(), McpError> {
        // await_endpoint runs first, so the callback is always set here.
        let url = self.callback.clone().ok_or(McpError::NoEndpoint)?;

        log_debug!("POST {} (id {})", method, id);
        let resp = self
            .client
            .post(url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| McpError::Request {
                method,
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(McpError::Request {
                method,
                detail: format!("HTTP {status}: {body}"),
            });
        }
        Ok(())
    }
}

/// Decide whether an SSE message frame is the id-2 reply.
///
/// Non-JSON frames and frames with any other id return None and are
/// silently dropped by the caller.
pub fn correlate(data: &str) -> Option<CallOutcome> {
    let msg: Value = serde_json::from_str(data).ok()?;
    if msg.get("id").and_then(Value::as_u64) != Some(CALL_ID) {
        return None;
    }

    if let Some(content) = msg
        .get("result")
        .and_then(|r| r.get("content"))
        .and_then(Value::as_array)
    {
        let text = content
            .iter()
            .filter_map(|c| c.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        return Some(CallOutcome::Text(text));
    }

    if let Some(err) = msg.get("error") {
        return Some(CallOutcome::ToolError(err.clone()));
    }

    Some(CallOutcome::Other(msg))
}

/// Run one complete tool call under the 30-second budget.
///
/// The timeout wraps the entire session future, so a late frame can never
/// race a fired timer: `timeout` resolves exactly once.
pub async fn call_tool(
    name: &str,
    arguments: &serde_json::Map<String, Value>,
) -> Result<CallOutcome, McpError> {
    tokio::time::timeout(RESPONSE_TIMEOUT, async {
        let mut session = Session::connect(MCP_ENDPOINT).await?;
        session.await_endpoint().await?;
        session.invoke(name, arguments).await?;
        session.await_response().await
    })
    .await
    .map_err(|_| McpError::Timeout)?
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_splits_frames_and_defaults_event_name() {
        let mut dec = SseDecoder::new();
        dec.push(b"event: endpoint\ndata: /messages?session=abc\n\ndata: {\"id\":1}\n\n");

        let first = dec.next_frame().unwrap();
        assert_eq!(first.event, "endpoint");
        assert_eq!(first.data, "/messages?session=abc");

        let second = dec.next_frame().unwrap();
        assert_eq!(second.event, "message");
        assert_eq!(second.data, "{\"id\":1}");

        assert!(dec.next_frame().is_none());
    }

    #[test]
    fn decoder_handles_chunk_boundaries_and_crlf() {
        let mut dec = SseDecoder::new();
        dec.push(b"data: par");
        assert!(dec.next_frame().is_none(), "incomplete frame must not emit");
        dec.push(b"tial\r\n\r");
        dec.push(b"\n");
        let frame = dec.next_frame().unwrap();
        assert_eq!(frame.data, "partial");
    }

    #[test]
    fn decoder_joins_multiline_data_and_skips_comments() {
        let mut dec = SseDecoder::new();
        dec.push(b": keepalive\n\ndata: a\ndata: b\n\n");
        let frame = dec.next_frame().unwrap();
        assert_eq!(frame.data, "a\nb");
        assert!(dec.next_frame().is_none());
    }

    #[test]
    fn only_id_two_correlates() {
        assert_eq!(correlate(r#"{"id":1,"result":{}}"#), None);
        assert_eq!(correlate("not json at all"), None);

        let out =
            correlate(r#"{"id":2,"result":{"content":[{"text":"A"},{"text":"B"}]}}"#).unwrap();
        assert_eq!(out, CallOutcome::Text("A\nB".into()));
    }

    #[test]
    fn rpc_error_surfaces_as_tool_error() {
        let out = correlate(r#"{"id":2,"error":{"code":-32602,"message":"bad args"}}"#).unwrap();
        match out {
            CallOutcome::ToolError(e) => {
                assert_eq!(e.get("code").and_then(Value::as_i64), Some(-32602));
            }
            other => panic!("expected ToolError, got {other:?}"),
        }
    }

    #[test]
    fn contentless_success_is_surfaced_raw() {
        let out = correlate(r#"{"id":2,"result":{"ok":true}}"#).unwrap();
        assert!(matches!(out, CallOutcome::Other(_)));
    }

    /// Session wired to a synthetic SSE stream, already past the handshake.
    fn session_with_stream(
        chunks: Pin<Box<dyn futures_util::Stream<Item = Result<Vec<u8>, McpError>> + Send>>,
    ) -> Session {
        Session {
            client: reqwest::Client::new(),
            base: Url::parse(MCP_ENDPOINT).unwrap(),
            events: EventStream {
                chunks,
                decoder: SseDecoder::new(),
            },
            callback: None,
            state: SessionState::AwaitingResponse,
        }
    }

    #[tokio::test]
    async fn await_response_skips_id_one_and_resolves_on_id_two() {
        let frames = [
            "data: {\"id\":1,\"result\":{}}\n\n".as_bytes().to_vec(),
            "data: garbage\n\n".as_bytes().to_vec(),
            "data: {\"id\":2,\"result\":{\"content\":[{\"text\":\"A\"},{\"text\":\"B\"}]}}\n\n"
                .as_bytes()
                .to_vec(),
        ];
        let stream = futures_util::stream::iter(frames.into_iter().map(Ok));
        let mut session = session_with_stream(Box::pin(stream));

        let outcome = session.await_response().await.unwrap();
        assert_eq!(outcome, CallOutcome::Text("A\nB".into()));
        assert_eq!(session.state, SessionState::Done);
    }

    #[tokio::test]
    async fn stream_close_without_reply_is_an_error() {
        let stream = futures_util::stream::iter(
            ["data: {\"id\":1}\n\n".as_bytes().to_vec()].into_iter().map(Ok),
        );
        let mut session = session_with_stream(Box::pin(stream));
        assert!(matches!(
            session.await_response().await,
            Err(McpError::StreamClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_wins_when_no_frame_ever_arrives() {
        let mut session = session_with_stream(Box::pin(futures_util::stream::pending()));

        let result = tokio::time::timeout(RESPONSE_TIMEOUT, session.await_response())
            .await
            .map_err(|_| McpError::Timeout);

        assert!(matches!(result, Err(McpError::Timeout)));
        // The session never reached a terminal state, so no success output
        // could have been printed alongside the timeout.
        assert_eq!(session.state, SessionState::AwaitingResponse);
    }

    #[test]
    fn endpoint_path_resolves_against_base() {
        let base = Url::parse(MCP_ENDPOINT).unwrap();
        let resolved = base.join("/messages?sessionId=xyz").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://mcp.deepwiki.com/messages?sessionId=xyz"
        );
    }
}
