use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::core::{AppConfig, Result};
use crate::openai::{Completion, CompletionRequest, completion, completion_stream};

/// Anything that can answer a chat completion request. The HTTP
/// implementation talks to an OpenAI compatible API; tests swap in a
/// scripted one.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
    fn stream(&self, request: &CompletionRequest) -> BoxStream<'static, Result<String>>;
}

pub type BoxedChatBackend = Box<dyn ChatBackend + Send + Sync + 'static>;

#[derive(Clone, Debug)]
pub struct OpenAiBackend {
    api_base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_base_url: &str, api_key: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_base_url, &config.api_key)
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        completion(request, &self.api_base_url, &self.api_key).await
    }

    fn stream(&self, request: &CompletionRequest) -> BoxStream<'static, Result<String>> {
        completion_stream(request, &self.api_base_url, &self.api_key)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use futures::stream;

    use super::*;
    use crate::core::ChatError;
    use crate::openai::Usage;

    /// Replies with canned responses in order and records every
    /// request it receives. Once the replies run out every call fails
    /// with an API error.
    #[derive(Clone, Default)]
    pub(crate) struct FakeBackend {
        replies: Arc<Mutex<VecDeque<String>>>,
        pub(crate) requests: Arc<Mutex<Vec<CompletionRequest>>>,
        pub(crate) tokens_per_call: u64,
    }

    impl FakeBackend {
        pub(crate) fn new(replies: &[&str]) -> Self {
            Self {
                replies: Arc::new(Mutex::new(
                    replies.iter().map(|r| r.to_string()).collect(),
                )),
                requests: Arc::new(Mutex::new(Vec::new())),
                tokens_per_call: 10,
            }
        }

        pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn next_reply(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ChatError::Api {
                    status: 500,
                    message: "no more replies".to_string(),
                })
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            let content = self.next_reply(request)?;
            Ok(Completion {
                content,
                usage: Usage {
                    prompt_tokens: self.tokens_per_call / 2,
                    completion_tokens: self.tokens_per_call - self.tokens_per_call / 2,
                    total_tokens: self.tokens_per_call,
                },
            })
        }

        fn stream(&self, request: &CompletionRequest) -> BoxStream<'static, Result<String>> {
            match self.next_reply(request) {
                Ok(reply) => {
                    // Three characters per fragment
                    let chars: Vec<char> = reply.chars().collect();
                    let fragments: Vec<Result<String>> = chars
                        .chunks(3)
                        .map(|c| Ok(c.iter().collect()))
                        .collect();
                    Box::pin(stream::iter(fragments))
                }
                Err(e) => Box::pin(stream::iter(vec![Err(e)])),
            }
        }
    }
}
