//! Talking to the chat completion API: a backend seam, a client that
//! tracks usage, a bounded history and a multi-turn conversation on
//! top of both.
pub mod backend;
pub mod client;
pub mod conversation;
pub mod history;

pub use backend::{BoxedChatBackend, ChatBackend, OpenAiBackend};
pub use client::{ChatClient, RequestOptions, UsageStats};
pub use conversation::Conversation;
pub use history::{ConversationHistory, Transcript, trim_messages};
