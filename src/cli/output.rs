use std::io::{self, Write};

use futures::stream::BoxStream;
use futures_util::StreamExt;

use crate::core::Result;

const RULE_WIDTH: usize = 60;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn banner(title: &str) {
    println!("\n{}", rule());
    println!("{}", title);
    println!("{}\n", rule());
}

/// Prints fragments as they arrive and returns the full reply.
pub async fn stream_to_stdout(mut stream: BoxStream<'static, Result<String>>) -> Result<String> {
    let mut reply = String::new();
    let mut stdout = io::stdout();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        print!("{}", fragment);
        stdout.flush()?;
        reply.push_str(&fragment);
    }
    println!();
    Ok(reply)
}

/// First `max_chars` characters of `text`, with an ellipsis if cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("hello", 5), "hello");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("hello world", 5), "hello...");
        assert_eq!(preview("贵州茅台股份", 4), "贵州茅台...");
    }

    #[test]
    fn test_rule_width() {
        assert_eq!(rule().len(), 60);
    }
}
