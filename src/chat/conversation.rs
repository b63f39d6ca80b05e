use std::path::Path;

use futures_util::StreamExt;

use super::client::{ChatClient, RequestOptions};
use super::history::ConversationHistory;
use crate::core::Result;
use crate::openai::Role;

/// A multi-turn chat. Each turn sends the (trimmed) history as context
/// and records the reply.
///
/// A turn is staged on a copy of the history and only committed once
/// the reply arrives, so a failed request leaves the history as it was
/// and the next turn can go ahead.
pub struct Conversation {
    client: ChatClient,
    history: ConversationHistory,
    opts: RequestOptions,
}

impl Conversation {
    pub fn new(client: ChatClient, system_prompt: Option<&str>, max_history: usize) -> Self {
        let history = match system_prompt {
            Some(prompt) => ConversationHistory::with_system_prompt(max_history, prompt),
            None => ConversationHistory::new(max_history),
        };
        Self {
            client,
            history,
            opts: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: RequestOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ChatClient {
        &mut self.client
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn add_message(&mut self, role: Role, content: &str) {
        self.history.append(role, content);
    }

    pub async fn send(&mut self, message: &str) -> Result<String> {
        let mut staged = self.history.clone();
        staged.append(Role::User, message);

        let completion = self.client.complete(staged.snapshot(), &self.opts).await?;

        staged.append(Role::Assistant, &completion.content);
        self.history = staged;
        Ok(completion.content)
    }

    /// Like `send` but hands each fragment to `on_fragment` as it
    /// arrives. The full reply is recorded only if the stream finishes
    /// without an error.
    pub async fn send_stream<F>(&mut self, message: &str, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let mut staged = self.history.clone();
        staged.append(Role::User, message);

        let mut stream = self.client.stream(staged.snapshot(), &self.opts);
        let mut reply = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            reply.push_str(&fragment);
        }

        self.client.record_stream();
        staged.append(Role::Assistant, &reply);
        self.history = staged;
        Ok(reply)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn save(&self, destination: &Path) -> Result<()> {
        self.history.save(destination)
    }

    pub fn load(&mut self, source: &Path) -> Result<()> {
        self.history.load(source)
    }
}
