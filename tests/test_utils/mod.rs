//! Test utilities for integration tests
use serde_json::json;

use relaychat::core::AppConfig;

/// Config pointed at a mock server. The base URL carries the `/v1`
/// prefix the same way a real relay URL does.
pub fn test_config(server: &mockito::ServerGuard) -> AppConfig {
    AppConfig::new("test-key", &format!("{}/v1", server.url()))
}

/// A non-streaming chat completion response body.
pub fn completion_body(content: &str, total_tokens: u64) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "claude-sonnet-4-5",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": total_tokens / 2,
            "completion_tokens": total_tokens - total_tokens / 2,
            "total_tokens": total_tokens
        }
    })
    .to_string()
}

/// A server-sent events body that streams `fragments` in order and
/// then signals the end of the stream.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = json!({"choices": [{"index": 0, "delta": {"content": fragment}}]});
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
