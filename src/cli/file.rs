use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::output::{banner, stream_to_stdout};
use crate::ai::prompt::{
    CODE_REVIEWER_SYSTEM_PROMPT, analyze_file_prompt, code_review_prompt, complexity_prompt,
};
use crate::chat::{ChatClient, RequestOptions};
use crate::core::AppConfig;

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Used to tag the fenced code block in the review prompt.
fn language_hint(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

pub async fn analyze(config: &AppConfig, path: &Path, question: Option<&str>) -> Result<()> {
    let content = read_file(path)?;
    let prompt = analyze_file_prompt(&path.display().to_string(), &content, question)?;
    let mut client = ChatClient::from_config(config);

    banner(&format!("Analyzing {}", path.display()));
    let fragments = client.chat_stream(
        &prompt,
        config.system_message.as_deref(),
        &RequestOptions::default(),
    );
    stream_to_stdout(fragments).await?;
    client.record_stream();
    Ok(())
}

/// Reviews the file, or with `complexity` analyzes its time and space
/// complexity instead. Both use the reviewer persona.
pub async fn review(config: &AppConfig, path: &Path, complexity: bool) -> Result<()> {
    let code = read_file(path)?;
    let display = path.display().to_string();
    let (title, prompt) = if complexity {
        (
            "Complexity analysis",
            complexity_prompt(&display, language_hint(path), &code)?,
        )
    } else {
        (
            "Code review",
            code_review_prompt(&display, language_hint(path), &code)?,
        )
    };
    let mut client = ChatClient::from_config(config);

    banner(&format!("{}: {}", title, display));
    let fragments = client.chat_stream(
        &prompt,
        Some(CODE_REVIEWER_SYSTEM_PROMPT),
        &RequestOptions::default(),
    );
    stream_to_stdout(fragments).await?;
    client.record_stream();
    Ok(())
}
