//! OpenAI-compatible chat completions client.

use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ChatModel;
use crate::history::ChatMessage;

const DATA_PREFIX: &str = "data: ";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("the completions endpoint returned {status} {reason}")]
    Status { status: u16, reason: String, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to read response stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response payload: {0}")]
    Parse(String),
}

/// How a streamed completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: Vec<RequestMessage<'a>>,
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> CompletionRequest<'a> {
    fn new(model: &'a ChatModel, messages: &'a [ChatMessage], stream: bool) -> Self {
        Self {
            messages: messages
                .iter()
                .map(|m| RequestMessage { role: m.role.as_str(), content: &m.content })
                .collect(),
            model: &model.model.name,
            temperature: model.model.temperature,
            max_tokens: model.model.max_tokens,
            top_p: model.model.top_p,
            stream,
        }
    }
}

pub struct InferenceClient {
    http: Client,
}

impl InferenceClient {
    /// A client whose requests never time out once connected. Models can go
    /// quiet for minutes between deltas while they reason.
    pub fn new() -> Result<Self, InferenceError> {
        Self::with_timeout(None)
    }

    /// `timeout` bounds each request, body reads included; `None` disables it.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Streams a completion, handing each text delta to `on_delta`.
    ///
    /// `cancel` is checked before every line; once set, reading stops and
    /// `StreamOutcome::Cancelled` is returned.
    pub fn stream_completion(
        &self,
        model: &ChatModel,
        messages: &[ChatMessage],
        cancel: &AtomicBool,
        mut on_delta: impl FnMut(&str),
    ) -> Result<StreamOutcome, InferenceError> {
        let response = self.send(model, messages, true)?;
        let reader = BufReader::new(response);

        for line in reader.lines() {
            if cancel.load(Ordering::SeqCst) {
                tracing::info!("completion stream cancelled");
                return Ok(StreamOutcome::Cancelled);
            }
            if let Some(delta) = parse_stream_line(&line?)? {
                on_delta(&delta);
            }
        }

        if cancel.load(Ordering::SeqCst) {
            return Ok(StreamOutcome::Cancelled);
        }
        Ok(StreamOutcome::Completed)
    }

    /// Requests a whole completion and returns the assistant text.
    pub fn next_message(
        &self,
        model: &ChatModel,
        messages: &[ChatMessage],
    ) -> Result<String, InferenceError> {
        let response = self.send(model, messages, false)?;
        let body: Value = response.json()?;
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| InferenceError::Parse("missing choices[0].message.content".into()))
    }

    fn send(
        &self,
        model: &ChatModel,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::blocking::Response, InferenceError> {
        let request = CompletionRequest::new(model, messages, stream);
        tracing::debug!(
            endpoint = %model.endpoint_url,
            model = %model.model.name,
            messages = messages.len(),
            stream,
            "sending completion request"
        );

        let response = self
            .http
            .post(&model.endpoint_url)
            .headers(build_headers(model.api_key.as_deref(), stream))
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("").to_string();
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Status { status: status.as_u16(), reason, body });
        }
        Ok(response)
    }
}

fn build_headers(api_key: Option<&str>, stream: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(key) = api_key {
        match HeaderValue::from_str(&format!("Bearer {key}")) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("api key contains characters not allowed in a header"),
        }
    }
    let accept = if stream { "text/event-stream" } else { "application/json" };
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Extracts the text delta from one line of an event stream.
///
/// Only `data: {…}` lines carry payloads; everything else, including
/// `data: [DONE]`, yields `None`.
pub fn parse_stream_line(line: &str) -> Result<Option<String>, InferenceError> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    if !payload.starts_with('{') {
        return Ok(None);
    }
    let value: Value =
        serde_json::from_str(payload).map_err(|err| InferenceError::Parse(err.to_string()))?;
    Ok(value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Rough token estimate: about four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
