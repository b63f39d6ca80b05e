use anyhow::Result;

use super::output::banner;
use crate::chat::{ChatClient, RequestOptions};
use crate::core::{AppConfig, ModelAlias};
use crate::openai::{Message, Role};

const PROBE: &str = "Hello, please introduce yourself in one sentence.";

/// Sends one small request to confirm the key, base URL and model all
/// work together.
pub async fn run(config: &AppConfig) -> Result<()> {
    banner("Connection check");
    println!("Base URL: {}", config.api_base_url);
    println!("API key:  {}", config.masked_api_key());
    println!("Model:    {}", config.model);

    println!("\nAvailable models:");
    for (i, alias) in ModelAlias::ALL.iter().enumerate() {
        println!("  {}. {:<7} {} - {}", i + 1, alias, alias.id(), alias.description());
    }

    println!("\nSending probe request...");
    let mut client = ChatClient::from_config(config);
    let messages = vec![Message::new(Role::User, PROBE)];
    match client.complete(messages, &RequestOptions::max_tokens(100)).await {
        Ok(completion) => {
            println!("\nReply: {}", completion.content);
            println!(
                "Tokens: {} prompt + {} completion = {} total",
                completion.usage.prompt_tokens,
                completion.usage.completion_tokens,
                completion.usage.total_tokens
            );
            println!("\nEverything looks good.");
            Ok(())
        }
        Err(e) => {
            println!("\nRequest failed: {}", e);
            println!("\nTroubleshooting:");
            println!("  1. Check that OPENAI_API_KEY is correct");
            println!("  2. Check that OPENAI_BASE_URL is reachable and ends in /v1");
            println!("  3. Check that the model name is supported by the relay");
            println!("  4. Check your network connection and account balance");
            anyhow::bail!("Connection check failed")
        }
    }
}
