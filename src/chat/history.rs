//! A bounded conversation transcript. System messages are kept no
//! matter what and only the most recent `max_history` user/assistant
//! messages are retained.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{ChatError, Result};
use crate::openai::{Message, Role};

/// Partition `messages` into system and non-system messages, keep only
/// the last `max_history` non-system messages and put the system
/// messages first. Relative order within each partition is preserved,
/// but a system message added mid-conversation moves ahead of every
/// user/assistant message.
pub fn trim_messages(messages: Vec<Message>, max_history: usize) -> Vec<Message> {
    let (mut kept, others): (Vec<Message>, Vec<Message>) =
        messages.into_iter().partition(Message::is_system);
    let skip = others.len().saturating_sub(max_history);
    kept.extend(others.into_iter().skip(skip));
    kept
}

/// The on-disk layout of a saved conversation.
#[derive(Serialize, Deserialize, Debug)]
pub struct Transcript {
    pub timestamp: String,
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    max_history: usize,
}

impl ConversationHistory {
    pub fn new(max_history: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_history,
        }
    }

    pub fn with_system_prompt(max_history: usize, system_prompt: &str) -> Self {
        Self {
            messages: vec![Message::new(Role::System, system_prompt)],
            max_history,
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn append(&mut self, role: Role, content: &str) {
        self.messages.push(Message::new(role, content));
        self.trim();
    }

    pub fn trim(&mut self) {
        let messages = std::mem::take(&mut self.messages);
        self.messages = trim_messages(messages, self.max_history);
    }

    /// Drop every user and assistant message.
    pub fn clear(&mut self) {
        self.messages.retain(Message::is_system);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn non_system_len(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_system()).count()
    }

    pub fn save(&self, destination: &Path) -> Result<()> {
        let transcript = Transcript {
            timestamp: chrono::Local::now().to_rfc3339(),
            messages: self.messages.clone(),
        };
        let data = serde_json::to_string_pretty(&transcript)?;
        fs::write(destination, data)?;
        tracing::debug!(
            "Saved {} messages to {}",
            self.messages.len(),
            destination.display()
        );
        Ok(())
    }

    /// Replace the in-memory messages with the ones in `source`. The
    /// current messages are only touched once the whole file has been
    /// read and parsed.
    pub fn load(&mut self, source: &Path) -> Result<()> {
        let data = fs::read_to_string(source)?;
        let transcript: Transcript = serde_json::from_str(&data)
            .map_err(|e| ChatError::Transcript(format!("{}: {}", source.display(), e)))?;
        self.messages = transcript.messages;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn msg(role: Role, content: &str) -> Message {
        Message::new(role, content)
    }

    #[test]
    fn test_trim_keeps_latest_non_system() {
        let mut history = ConversationHistory::new(2);
        history.append(Role::System, "S");
        history.append(Role::User, "a");
        history.append(Role::Assistant, "b");
        history.append(Role::User, "c");
        history.append(Role::Assistant, "d");
        history.append(Role::User, "e");

        assert_eq!(
            history.snapshot(),
            vec![
                msg(Role::System, "S"),
                msg(Role::Assistant, "d"),
                msg(Role::User, "e"),
            ]
        );
    }

    #[test]
    fn test_trim_moves_late_system_message_first() {
        let mut history = ConversationHistory::new(3);
        history.append(Role::User, "a");
        history.append(Role::Assistant, "b");
        history.append(Role::System, "late");

        assert_eq!(
            history.snapshot(),
            vec![
                msg(Role::System, "late"),
                msg(Role::User, "a"),
                msg(Role::Assistant, "b"),
            ]
        );
    }

    #[test]
    fn test_trim_messages_is_partition_not_truncation() {
        let messages = vec![
            msg(Role::User, "1"),
            msg(Role::System, "s1"),
            msg(Role::Assistant, "2"),
            msg(Role::User, "3"),
            msg(Role::System, "s2"),
        ];
        assert_eq!(
            trim_messages(messages, 1),
            vec![
                msg(Role::System, "s1"),
                msg(Role::System, "s2"),
                msg(Role::User, "3"),
            ]
        );
    }

    #[test]
    fn test_trim_messages_zero_history() {
        let messages = vec![msg(Role::System, "s"), msg(Role::User, "u")];
        assert_eq!(trim_messages(messages, 0), vec![msg(Role::System, "s")]);
    }

    #[test]
    fn test_non_system_count_never_exceeds_max() {
        let mut history = ConversationHistory::with_system_prompt(5, "sys");
        for i in 0..50 {
            let role = match i % 7 {
                0 => Role::System,
                n if n % 2 == 0 => Role::User,
                _ => Role::Assistant,
            };
            history.append(role, &i.to_string());
            assert!(history.non_system_len() <= 5);
        }
        // 1 initial system message plus the 8 appended (i = 0, 7, ..., 49)
        let system_count = history.iter().filter(|m| m.is_system()).count();
        assert_eq!(system_count, 9);
        assert_eq!(history.len(), 14);
    }

    #[test]
    fn test_clear_keeps_system_messages() {
        let mut history = ConversationHistory::new(20);
        history.append(Role::System, "sys");
        history.clear();
        assert_eq!(history.snapshot(), vec![msg(Role::System, "sys")]);

        history.append(Role::User, "hi");
        history.append(Role::Assistant, "hello");
        history.append(Role::System, "sys2");
        history.clear();
        assert_eq!(
            history.snapshot(),
            vec![msg(Role::System, "sys"), msg(Role::System, "sys2")]
        );
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut history = ConversationHistory::new(20);
        history.append(Role::User, "hi");

        let mut snapshot = history.snapshot();
        snapshot.push(msg(Role::Assistant, "injected"));
        snapshot[0].content = "changed".to_string();

        assert_eq!(history.snapshot(), vec![msg(Role::User, "hi")]);
    }

    #[test]
    fn test_empty_content_is_allowed() {
        let mut history = ConversationHistory::new(20);
        history.append(Role::User, "");
        assert_eq!(history.snapshot(), vec![msg(Role::User, "")]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");

        let mut history = ConversationHistory::with_system_prompt(20, "You are terse.");
        history.append(Role::User, "什么是装饰器？");
        history.append(Role::Assistant, "A function that wraps \"another\" one.");
        history.save(&path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(saved["timestamp"].is_string());
        assert_eq!(saved["messages"][1]["role"], "user");
        assert_eq!(saved["messages"][1]["content"], "什么是装饰器？");

        let mut loaded = ConversationHistory::new(20);
        loaded.load(&path).unwrap();
        assert_eq!(loaded.snapshot(), history.snapshot());
    }

    #[test]
    fn test_load_missing_messages_key_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"timestamp": "2025-01-01T00:00:00"}"#).unwrap();

        let mut history = ConversationHistory::new(20);
        history.append(Role::User, "keep me");

        let result = history.load(&path);
        assert!(matches!(result, Err(ChatError::Transcript(_))));
        assert_eq!(history.snapshot(), vec![msg(Role::User, "keep me")]);
    }

    #[test]
    fn test_load_invalid_json_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let mut history = ConversationHistory::new(20);
        history.append(Role::Assistant, "keep me");

        assert!(history.load(&path).is_err());
        assert_eq!(history.snapshot(), vec![msg(Role::Assistant, "keep me")]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = ConversationHistory::new(20);
        let result = history.load(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ChatError::Io(_))));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let history = ConversationHistory::new(20);
        let result = history.save(&dir.path().join("missing").join("c.json"));
        assert!(matches!(result, Err(ChatError::Io(_))));
    }
}
