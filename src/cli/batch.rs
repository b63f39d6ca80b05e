use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::output::{banner, preview};
use crate::chat::{ChatClient, RequestOptions};
use crate::core::AppConfig;

/// One question per non-empty line, surrounding whitespace removed.
pub fn parse_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub async fn run(config: &AppConfig, path: &Path, max_tokens: u32) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let questions = parse_questions(&content);
    if questions.is_empty() {
        anyhow::bail!("No questions found in {}", path.display());
    }

    let mut client = ChatClient::from_config(config);
    let opts = RequestOptions::max_tokens(max_tokens);
    let mut answers = Vec::with_capacity(questions.len());
    for (i, question) in questions.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, questions.len(), question);
        let answer = client
            .chat_with(question, config.system_message.as_deref(), &opts)
            .await
            .with_context(|| format!("Question {} failed", i + 1))?;
        answers.push(answer);
    }

    banner("Batch results");
    for (i, (question, answer)) in questions.iter().zip(&answers).enumerate() {
        println!("{}. Q: {}", i + 1, question);
        println!("   A: {}\n", preview(answer, 100));
    }

    let stats = client.stats();
    println!("Requests: {}", stats.total_requests);
    println!("Total tokens: {}", stats.total_tokens);
    println!(
        "Average tokens per request: {:.1}",
        stats.average_tokens_per_request()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_skips_blank_lines() {
        let questions = parse_questions("What is Rust?\n\n  What is Python?  \n\t\nWhat is Go?");
        assert_eq!(
            questions,
            vec!["What is Rust?", "What is Python?", "What is Go?"]
        );
    }

    #[test]
    fn test_parse_questions_empty() {
        assert!(parse_questions("\n \n").is_empty());
    }
}
