use futures::stream::BoxStream;

use super::backend::{BoxedChatBackend, OpenAiBackend};
use crate::core::{AppConfig, Result};
use crate::openai::{Completion, CompletionRequest, Message, Role};

/// Per-call overrides for the client defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl RequestOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: None,
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
        }
    }

    pub fn max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_tokens: u64,
}

impl UsageStats {
    pub fn average_tokens_per_request(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_tokens as f64 / self.total_requests as f64
    }
}

/// Thin wrapper over a chat backend that fills in the default model
/// and sampling settings and keeps running usage totals.
pub struct ChatClient {
    backend: BoxedChatBackend,
    model: String,
    max_tokens: u32,
    temperature: f32,
    stats: UsageStats,
}

impl ChatClient {
    pub fn new(backend: BoxedChatBackend, config: &AppConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stats: UsageStats::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Box::new(OpenAiBackend::from_config(config)), config)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: &str) {
        self.model = model.to_string();
    }

    pub fn stats(&self) -> UsageStats {
        self.stats
    }

    pub fn request(&self, messages: Vec<Message>, opts: &RequestOptions) -> CompletionRequest {
        CompletionRequest {
            model: opts.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            max_tokens: opts.max_tokens.unwrap_or(self.max_tokens),
            temperature: opts.temperature.unwrap_or(self.temperature),
        }
    }

    pub async fn complete(
        &mut self,
        messages: Vec<Message>,
        opts: &RequestOptions,
    ) -> Result<Completion> {
        let request = self.request(messages, opts);
        let completion = self.backend.complete(&request).await?;
        self.stats.total_requests += 1;
        self.stats.total_tokens += completion.usage.total_tokens;
        Ok(completion)
    }

    pub async fn chat(&mut self, message: &str, system_prompt: Option<&str>) -> Result<String> {
        self.chat_with(message, system_prompt, &RequestOptions::default())
            .await
    }

    pub async fn chat_with(
        &mut self,
        message: &str,
        system_prompt: Option<&str>,
        opts: &RequestOptions,
    ) -> Result<String> {
        let messages = single_turn(message, system_prompt);
        Ok(self.complete(messages, opts).await?.content)
    }

    /// The stream doesn't borrow the client, so nothing is counted here.
    /// Call `record_stream` once it has been read to the end.
    pub fn stream(
        &self,
        messages: Vec<Message>,
        opts: &RequestOptions,
    ) -> BoxStream<'static, Result<String>> {
        let request = self.request(messages, opts);
        self.backend.stream(&request)
    }

    /// Count a stream that finished without error. Streaming responses
    /// carry no usage so only the request count moves.
    pub fn record_stream(&mut self) {
        self.stats.total_requests += 1;
    }

    pub fn chat_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
        opts: &RequestOptions,
    ) -> BoxStream<'static, Result<String>> {
        self.stream(single_turn(message, system_prompt), opts)
    }
}

fn single_turn(message: &str, system_prompt: Option<&str>) -> Vec<Message> {
    let mut messages = Vec::new();
    if let Some(system_prompt) = system_prompt {
        messages.push(Message::new(Role::System, system_prompt));
    }
    messages.push(Message::new(Role::User, message));
    messages
}
