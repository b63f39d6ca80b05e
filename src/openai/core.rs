use std::time::Duration;

use futures::stream::BoxStream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::core::{ChatError, Result};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// The final result of a non-streaming completion.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<ResponseChoice>,
    usage: Option<Usage>,
}

fn completions_url(api_base_url: &str) -> String {
    format!("{}/chat/completions", api_base_url.trim_end_matches('/'))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = ChatError::from_status(status.as_u16(), &body);
    tracing::warn!("Chat completion request failed: {}", err);
    Err(err)
}

pub async fn completion(
    request: &CompletionRequest,
    api_base_url: &str,
    api_key: &str,
) -> Result<Completion> {
    tracing::debug!(
        "Completion request: model={} messages={}",
        request.model,
        request.messages.len()
    );
    let response = reqwest::Client::new()
        .post(completions_url(api_base_url))
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 10))
        .json(request)
        .send()
        .await?;
    let body = check_status(response).await?.text().await?;
    let resp: CompletionResponse = serde_json::from_str(&body)?;

    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ChatError::EmptyResponse(body.clone()))?;
    let usage = resp.usage.unwrap_or_default();
    tracing::debug!("Completion usage: {:?}", usage);

    Ok(Completion { content, usage })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Reasoning { reasoning: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    // Some servers send the final chunk with only a finish reason
    #[serde(default)]
    delta: Option<Delta>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChunkChoice>,
}

/// Accumulates raw bytes from the response body and hands back one
/// complete SSE event at a time. Events can be split across network
/// frames (and so can multi-byte characters) so nothing is decoded
/// until the blank line that ends an event has arrived.
#[derive(Default)]
pub(crate) struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().filter(|b| **b != b'\r'));
    }

    /// The `data:` payload of the next complete event, if any. Events
    /// without data (comments, keep-alives) are skipped.
    pub(crate) fn next_data(&mut self) -> Option<String> {
        while let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buf.drain(..end + 2).collect();
            let event = String::from_utf8_lossy(&event[..end]);
            let data = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n");
            // Data can sometimes be empty
            if !data.is_empty() {
                return Some(data);
            }
        }
        None
    }
}

/// The text fragment carried by one stream chunk, if any.
fn chunk_content(data: &str) -> Result<Option<String>> {
    let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
        tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
    })?;
    // Usage-only chunks have no choices
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };
    match choice.delta {
        Some(Delta::Content { content }) if !content.is_empty() => Ok(Some(content)),
        Some(Delta::Reasoning { .. } | Delta::Content { .. } | Delta::Stop {}) | None => Ok(None),
    }
}

/// Streams the next response as text fragments in arrival order. The
/// request is only sent once the stream is polled and dropping the
/// stream stops delivery. Fragment boundaries are whatever the server
/// sends.
pub fn completion_stream(
    request: &CompletionRequest,
    api_base_url: &str,
    api_key: &str,
) -> BoxStream<'static, Result<String>> {
    let url = completions_url(api_base_url);
    let api_key = api_key.to_string();
    let mut payload = serde_json::json!(request);
    payload["stream"] = serde_json::json!(true);

    Box::pin(async_stream::try_stream! {
        tracing::debug!("Streaming completion request to {}", url);
        let response = reqwest::Client::new()
            .post(url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60 * 5))
            .json(&payload)
            .send()
            .await?;
        let mut stream = check_status(response).await?.bytes_stream();
        let mut buffer = SseBuffer::default();

        'outer: while let Some(chunk) = stream.next().await {
            buffer.push(&chunk?);

            while let Some(data) = buffer.next_data() {
                // Handle the end of the stream
                if data == "[DONE]" {
                    break 'outer;
                }
                if let Some(content) = chunk_content(&data)? {
                    yield content;
                }
            }
        }
    })
}
