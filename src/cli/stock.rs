use anyhow::Result;

use super::output::{banner, stream_to_stdout};
use crate::ai::prompt::{STOCK_ANALYST_SYSTEM_PROMPT, stock_overview_prompt};
use crate::chat::{ChatClient, RequestOptions};
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, code: &str) -> Result<()> {
    let mut client = ChatClient::from_config(config);
    let prompt = stock_overview_prompt(code)?;

    banner(&format!("Stock overview: {}", code));
    let fragments = client.chat_stream(
        &prompt,
        Some(STOCK_ANALYST_SYSTEM_PROMPT),
        &RequestOptions::default(),
    );
    stream_to_stdout(fragments).await?;
    client.record_stream();
    Ok(())
}
